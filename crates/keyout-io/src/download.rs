//! File download via Blob URLs.
//!
//! Dioxus has no built-in file download API. This module triggers
//! downloads by creating a `Blob`, generating an object URL, and
//! programmatically clicking a temporary `<a>` element.

use wasm_bindgen::JsCast;

use crate::blob::{BlobError, bytes_to_blob_url, revoke_blob_url};

/// Trigger a browser download of `data` as `filename`.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if any browser API call fails.
pub fn trigger_download(data: &[u8], filename: &str, mime_type: &str) -> Result<(), BlobError> {
    let window = web_sys::window().ok_or_else(|| BlobError::JsError("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| BlobError::JsError("no document".into()))?;

    let url = bytes_to_blob_url(data, mime_type)?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| BlobError::JsError(format!("failed to cast element: {e:?}")))?;
    anchor.set_href(&url);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| BlobError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();

    // The download has started; cleanup failures are not download failures.
    let _ = body.remove_child(&anchor);
    revoke_blob_url(&url);

    log::info!("downloaded {filename} ({} bytes)", data.len());
    Ok(())
}
