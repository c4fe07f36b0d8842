//! Multipart upload of the selected file.
//!
//! Posts the raw bytes as the `file` field of a `multipart/form-data`
//! body. Any 2xx status counts as acknowledgement; the response body is
//! not read.

use keyout_session::UploadError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::blob::bytes_to_blob;

/// Multipart field name the service reads the image from.
pub const FILE_FIELD: &str = "file";

fn network(value: &JsValue) -> UploadError {
    UploadError::Network(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

/// Upload `bytes` to `url` as `file_name`.
///
/// # Errors
///
/// Returns [`UploadError::Network`] if the request could not be built or
/// sent, and [`UploadError::Status`] for a non-2xx response.
#[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
pub async fn upload_file(url: &str, file_name: &str, bytes: &[u8]) -> Result<(), UploadError> {
    let window = web_sys::window().ok_or_else(|| UploadError::Network("no global window".into()))?;

    let blob = bytes_to_blob(bytes, "application/octet-stream")
        .map_err(|e| UploadError::Network(e.to_string()))?;
    let form = web_sys::FormData::new().map_err(|e| network(&e))?;
    form.append_with_blob_and_filename(FILE_FIELD, &blob, file_name)
        .map_err(|e| network(&e))?;

    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    init.set_body(&form);
    let request =
        web_sys::Request::new_with_str_and_init(url, &init).map_err(|e| network(&e))?;

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| network(&e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|e| UploadError::Network(format!("unexpected fetch result: {e:?}")))?;

    if response.ok() {
        log::info!("uploaded {file_name} to {url}");
        Ok(())
    } else {
        Err(UploadError::Status(response.status()))
    }
}
