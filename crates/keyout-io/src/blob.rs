//! Blob URL creation for source images and results.
//!
//! Wraps encoded image bytes in a `Blob` and hands out an object URL
//! usable as `<img src>`. [`BlobSurface`] is the browser
//! [`DisplaySurface`]: every URL it creates is revoked when the core
//! releases the handle.

use std::fmt;

use keyout_session::{DisplayError, DisplaySurface};
use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// Errors that can occur while creating a Blob or its URL.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for BlobError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

impl From<BlobError> for DisplayError {
    fn from(err: BlobError) -> Self {
        Self::Acquire(err.to_string())
    }
}

/// Wrap `bytes` in a `Blob` of type `mime`.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if the Blob cannot be constructed.
pub fn bytes_to_blob(bytes: &[u8], mime: &str) -> Result<web_sys::Blob, BlobError> {
    let uint8_array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&uint8_array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime);
    Ok(web_sys::Blob::new_with_u8_array_sequence_and_options(
        &parts, &opts,
    )?)
}

/// Encode `bytes` as a Blob URL.
///
/// The returned URL must be revoked via [`revoke_blob_url`] when no
/// longer needed.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if Blob or URL creation fails.
pub fn bytes_to_blob_url(bytes: &[u8], mime: &str) -> Result<String, BlobError> {
    let blob = bytes_to_blob(bytes, mime)?;
    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Revoke a Blob URL created by [`bytes_to_blob_url`].
///
/// Best-effort: the URL may already have been revoked.
pub fn revoke_blob_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

/// An object URL owned by a [`BlobSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUrl(String);

impl BlobUrl {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browser display surface backed by object URLs.
#[derive(Debug, Default)]
pub struct BlobSurface {
    live: usize,
}

impl BlobSurface {
    #[must_use]
    pub const fn new() -> Self {
        Self { live: 0 }
    }

    /// URLs created and not yet revoked.
    #[must_use]
    pub const fn live_urls(&self) -> usize {
        self.live
    }
}

impl DisplaySurface for BlobSurface {
    type Handle = BlobUrl;

    fn acquire(&mut self, bytes: &[u8], mime: &str) -> Result<BlobUrl, DisplayError> {
        let url = bytes_to_blob_url(bytes, mime)?;
        self.live += 1;
        log::debug!("created {url} ({mime}, {} bytes, {} live)", bytes.len(), self.live);
        Ok(BlobUrl(url))
    }

    fn release(&mut self, handle: BlobUrl) {
        revoke_blob_url(&handle.0);
        self.live = self.live.saturating_sub(1);
        log::debug!("revoked {handle} ({} live)", self.live);
    }
}
