//! keyout-io: Browser I/O and Dioxus component library.
//!
//! Executes the commands produced by `keyout-session` against real
//! browser APIs (multipart `fetch` upload, WebSocket processing channel,
//! Blob URLs for display) and provides the UI components of the keyout
//! web application.

pub mod blob;
pub mod channel;
pub mod components;
pub mod download;
pub mod driver;
pub mod location;
pub mod upload;

pub use blob::{BlobSurface, BlobUrl};
pub use components::{FilePicker, ParameterControls, ResultPreview, SampleCanvas, StatusLine};
pub use driver::{SessionDriver, SessionView};
