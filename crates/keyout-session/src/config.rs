//! Where the processing service lives.

use serde::{Deserialize, Serialize};

/// Service base used when no override is supplied.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Upload and channel endpoints derived from one base URL.
///
/// The upload endpoint is `<base>/upload/`. The channel endpoint is the
/// same host with `http` mapped to `ws` (and `https` to `wss`) at
/// `<base>/ws`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    base_url: String,
}

impl ServiceEndpoints {
    /// Endpoints rooted at `base_url`. A trailing `/` is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// The configured base.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Multipart upload target.
    #[must_use]
    pub fn upload_url(&self) -> String {
        format!("{}/upload/", self.base_url)
    }

    /// Persistent processing channel target.
    #[must_use]
    pub fn channel_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/ws")
    }
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_localhost() {
        let endpoints = ServiceEndpoints::default();
        assert_eq!(endpoints.upload_url(), "http://localhost:8000/upload/");
        assert_eq!(endpoints.channel_url(), "ws://localhost:8000/ws");
    }

    #[test]
    fn https_maps_to_wss() {
        let endpoints = ServiceEndpoints::new("https://keyout.example.com/api/");
        assert_eq!(endpoints.base_url(), "https://keyout.example.com/api");
        assert_eq!(
            endpoints.upload_url(),
            "https://keyout.example.com/api/upload/"
        );
        assert_eq!(endpoints.channel_url(), "wss://keyout.example.com/api/ws");
    }

    #[test]
    fn websocket_base_is_kept() {
        let endpoints = ServiceEndpoints::new("ws://10.0.0.2:9000");
        assert_eq!(endpoints.channel_url(), "ws://10.0.0.2:9000/ws");
    }
}
