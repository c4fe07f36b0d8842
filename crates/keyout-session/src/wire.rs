//! Outbound message format for the processing channel.
//!
//! Each request is one UTF-8 JSON text frame:
//!
//! ```json
//! {"tolerance":30,"blur_radius":2.0,"mode":"simple","refine":false,"color":"12,200,44"}
//! ```
//!
//! `blur_radius` is always written as a real number. `color` is the
//! comma-joined decimal RGB triple. Field order is fixed by declaration
//! order.

use serde::{Deserialize, Serialize};

use crate::types::{Mode, ProcessingParameters};

/// One processing request as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    pub tolerance: u8,
    pub blur_radius: f64,
    pub mode: Mode,
    pub refine: bool,
    pub color: String,
}

impl ProcessingRequest {
    /// Build the request for a parameter snapshot.
    ///
    /// Returns `None` while no seed color has been chosen: a request is
    /// never sent without one.
    #[must_use]
    pub fn from_parameters(params: &ProcessingParameters) -> Option<Self> {
        let color = params.color?;
        Some(Self {
            tolerance: params.tolerance,
            blur_radius: params.blur_radius,
            mode: params.mode,
            refine: params.refine_edges,
            color: color.to_string(),
        })
    }

    /// Serialize to the JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails (for
    /// example a non-finite `blur_radius`).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
