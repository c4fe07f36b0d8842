//! keyout-session: Interactive processing-session orchestrator (sans-IO).
//!
//! Turns local UI events (file selection, pixel click, parameter edits)
//! into an ordered stream of processing requests for a remote
//! background-removal service, and reconciles the binary results it
//! sends back into a single displayed result:
//! file -> decode -> upload -> open channel -> sample seed color ->
//! send parameters -> present result.
//!
//! This crate has **no I/O dependencies**. Network work is expressed as
//! [`Command`]s drained from the [`SessionOrchestrator`], and display
//! handles are produced through the [`DisplaySurface`] trait. All
//! browser interaction lives in `keyout-io`.

pub mod config;
pub mod connection;
pub mod decode;
pub mod notify;
pub mod orchestrator;
pub mod params;
pub mod results;
pub mod sample;
pub mod session;
pub mod surface;
pub mod types;
pub mod wire;

pub use config::ServiceEndpoints;
pub use connection::{Command, ConnectionError, ConnectionState, SessionConnection, UploadError};
pub use decode::{DecodeError, ImageAsset, ImageDecoder};
pub use notify::{Notifier, SubscriptionId};
pub use orchestrator::{FailureKind, FailureNotice, SessionError, SessionOrchestrator, SessionState};
pub use params::{ParameterChange, ParameterStore};
pub use results::ResultResourceManager;
pub use sample::{ColorSampler, OutOfBoundsError, PointerPosition, RenderedBounds};
pub use session::ProcessingSession;
pub use surface::{DisplayError, DisplaySurface, MemoryHandle, MemorySurface};
pub use types::{Dimensions, Mode, ProcessingParameters, SeedColor};
pub use wire::ProcessingRequest;
