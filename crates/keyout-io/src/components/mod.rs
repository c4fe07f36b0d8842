//! Dioxus UI components for keyout.
//!
//! Provides the file picker with drag-and-drop, the click-to-sample
//! source view, the parameter controls, the result preview with its
//! save action, and the status line.

mod file_picker;
mod parameter_controls;
mod result_preview;
mod sample_canvas;
mod status_line;

pub use file_picker::FilePicker;
pub use parameter_controls::ParameterControls;
pub use result_preview::ResultPreview;
pub use sample_canvas::SampleCanvas;
pub use status_line::StatusLine;
