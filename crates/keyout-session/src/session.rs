//! Per-upload session state.

use crate::connection::{ConnectionState, SessionConnection};

/// One upload plus its processing channel.
///
/// Created when a file is selected, replaced by the next selection.
/// Only the orchestrator mutates it.
#[derive(Debug)]
pub struct ProcessingSession {
    pub(crate) connection: SessionConnection,
    pub(crate) pending_response: bool,
    pub(crate) requests_sent: u64,
    pub(crate) results_received: u64,
}

impl ProcessingSession {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            connection: SessionConnection::new(generation),
            pending_response: false,
            requests_sent: 0,
            results_received: 0,
        }
    }

    /// Generation number distinguishing this session from its predecessors.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.connection.generation()
    }

    #[must_use]
    pub const fn upload_complete(&self) -> bool {
        self.connection.upload_complete()
    }

    #[must_use]
    pub const fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether at least one request is awaiting a result.
    #[must_use]
    pub const fn pending_response(&self) -> bool {
        self.pending_response
    }

    /// Requests dispatched in this session. The number of the latest
    /// request is this count.
    #[must_use]
    pub const fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Result payloads received in this session.
    #[must_use]
    pub const fn results_received(&self) -> u64 {
        self.results_received
    }
}
