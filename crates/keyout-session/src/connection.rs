//! The upload step and the persistent processing channel, as a state
//! machine.
//!
//! [`SessionConnection`] does no I/O. Each transition that needs the
//! outside world returns a [`Command`] for the driver to execute, and
//! the driver reports completions back (`upload_acknowledged`,
//! `opened`, `fail`, `deliver`). Every command carries the session
//! generation so completions from a torn-down session can be dropped.

use crate::notify::{Notifier, SubscriptionId};
use crate::wire::ProcessingRequest;

/// Lifecycle of the processing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
    Errored,
}

/// Work for the I/O driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// POST `bytes` as multipart field `file` to the upload endpoint.
    Upload {
        generation: u64,
        file_name: String,
        bytes: Vec<u8>,
    },
    /// Open the processing channel.
    Open { generation: u64 },
    /// Send one text frame on the channel.
    Send { generation: u64, payload: String },
    /// Close the channel (normal closure).
    Close { generation: u64 },
}

impl Command {
    /// The session generation this command belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::Upload { generation, .. }
            | Self::Open { generation }
            | Self::Send { generation, .. }
            | Self::Close { generation } => *generation,
        }
    }
}

/// The upload request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// The request never produced a response.
    #[error("upload failed: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("upload rejected with HTTP {0}")]
    Status(u16),
}

/// Errors on the processing channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The channel could not be established.
    #[error("could not open processing channel: {0}")]
    Handshake(String),

    /// The open channel reported an error.
    #[error("processing channel error: {0}")]
    Channel(String),

    /// The service closed the channel.
    #[error("processing channel closed (code {code}): {reason}")]
    Closed { code: u16, reason: String },

    /// A frame could not be written.
    #[error("failed to send request: {0}")]
    Send(String),

    /// A send was attempted while the channel was not open.
    #[error("processing channel is not open")]
    NotOpen,

    /// The request could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),
}

/// One session's upload-then-channel connection.
#[derive(Debug)]
pub struct SessionConnection {
    generation: u64,
    upload_complete: bool,
    state: ConnectionState,
    results: Notifier<[u8]>,
}

impl SessionConnection {
    /// A closed connection for session `generation`.
    #[must_use]
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            upload_complete: false,
            state: ConnectionState::Closed,
            results: Notifier::new(),
        }
    }

    /// The session generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the service acknowledged the upload.
    #[must_use]
    pub const fn upload_complete(&self) -> bool {
        self.upload_complete
    }

    /// Current channel state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// The upload command for `bytes`.
    #[must_use]
    pub fn start_upload(&self, file_name: &str, bytes: Vec<u8>) -> Command {
        log::info!("uploading {file_name} ({} bytes)", bytes.len());
        Command::Upload {
            generation: self.generation,
            file_name: file_name.to_owned(),
            bytes,
        }
    }

    /// Record a successful upload.
    pub const fn upload_acknowledged(&mut self) {
        self.upload_complete = true;
    }

    /// Begin opening the channel. Only valid from `Closed`.
    pub fn open(&mut self) -> Option<Command> {
        if self.state != ConnectionState::Closed {
            log::debug!("open ignored in state {:?}", self.state);
            return None;
        }
        self.state = ConnectionState::Connecting;
        Some(Command::Open {
            generation: self.generation,
        })
    }

    /// The driver finished the handshake.
    pub fn opened(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
            log::info!("processing channel open (session {})", self.generation);
        }
    }

    /// Build the send command for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotOpen`] unless the channel is open,
    /// and [`ConnectionError::Encode`] if the request cannot be
    /// serialized.
    pub fn send(&self, request: &ProcessingRequest) -> Result<Command, ConnectionError> {
        if self.state != ConnectionState::Open {
            return Err(ConnectionError::NotOpen);
        }
        let payload = request
            .to_json()
            .map_err(|e| ConnectionError::Encode(e.to_string()))?;
        log::debug!("sending {payload}");
        Ok(Command::Send {
            generation: self.generation,
            payload,
        })
    }

    /// Listen for inbound result payloads.
    pub fn on_result(&mut self, listener: impl FnMut(&[u8]) + 'static) -> SubscriptionId {
        self.results.subscribe(listener)
    }

    /// Stop listening for results.
    pub fn remove_result_listener(&mut self, id: SubscriptionId) -> bool {
        self.results.unsubscribe(id)
    }

    /// Hand an inbound binary frame to listeners. Frames are dropped
    /// unless the channel is open. Returns whether it was delivered.
    pub fn deliver(&mut self, payload: &[u8]) -> bool {
        if self.state != ConnectionState::Open {
            log::debug!("dropping {} byte frame in state {:?}", payload.len(), self.state);
            return false;
        }
        self.results.emit(payload);
        true
    }

    /// The channel errored or was closed by the peer.
    pub fn fail(&mut self, error: &ConnectionError) {
        log::warn!("session {}: {error}", self.generation);
        self.state = ConnectionState::Errored;
    }

    /// Close the channel. Idempotent: only the first call from an open
    /// or connecting state yields a command.
    pub fn close(&mut self) -> Option<Command> {
        let was = std::mem::replace(&mut self.state, ConnectionState::Closed);
        match was {
            ConnectionState::Open | ConnectionState::Connecting => Some(Command::Close {
                generation: self.generation,
            }),
            ConnectionState::Closed | ConnectionState::Errored => None,
        }
    }
}
