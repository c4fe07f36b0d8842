//! Service endpoint selection from the page URL.

use keyout_session::ServiceEndpoints;

/// Query parameter overriding the service base URL.
pub const SERVICE_PARAM: &str = "service";

/// Endpoints from `?service=<base>` on the current page, or the default.
#[must_use]
pub fn endpoints_from_location() -> ServiceEndpoints {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    endpoints_from_query(&search)
}

/// Endpoints from a `location.search` string such as `?service=https://x`.
#[must_use]
pub fn endpoints_from_query(search: &str) -> ServiceEndpoints {
    let base = web_sys::UrlSearchParams::new_with_str(search)
        .ok()
        .and_then(|params| params.get(SERVICE_PARAM))
        .filter(|base| !base.trim().is_empty());

    match base {
        Some(base) => {
            log::info!("using processing service at {base}");
            ServiceEndpoints::new(base.trim())
        }
        None => ServiceEndpoints::default(),
    }
}
