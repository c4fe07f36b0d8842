//! Display handles for decoded sources and received results.
//!
//! A [`DisplaySurface`] turns encoded image bytes into an opaque handle
//! the rendering layer can paint (a Blob URL in the browser), and takes
//! it back when the image is replaced. Every `acquire` must eventually
//! be matched by exactly one `release`.

use std::collections::HashMap;

/// Errors raised while creating a display handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    /// The rendering layer refused to wrap the bytes.
    #[error("failed to create display handle: {0}")]
    Acquire(String),
}

/// Producer of display handles.
pub trait DisplaySurface {
    /// The opaque handle type handed to the renderer.
    type Handle;

    /// Wrap `bytes` (an encoded image of type `mime`) as a paintable handle.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Acquire`] if the rendering layer cannot
    /// create the resource.
    fn acquire(&mut self, bytes: &[u8], mime: &str) -> Result<Self::Handle, DisplayError>;

    /// Give a handle back. The handle must not be painted afterwards.
    fn release(&mut self, handle: Self::Handle);
}

/// Handle issued by [`MemorySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryHandle(u64);

/// In-memory [`DisplaySurface`] that tracks live handles.
///
/// Used for headless sessions and to verify the single-live-handle
/// discipline in tests.
#[derive(Debug, Default)]
pub struct MemorySurface {
    next_id: u64,
    live: HashMap<MemoryHandle, String>,
    released: u64,
}

impl MemorySurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles acquired and not yet released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// Whether `handle` is still live.
    #[must_use]
    pub fn is_live(&self, handle: MemoryHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// MIME type a live handle was acquired with.
    #[must_use]
    pub fn mime_of(&self, handle: MemoryHandle) -> Option<&str> {
        self.live.get(&handle).map(String::as_str)
    }

    /// Total handles ever acquired.
    #[must_use]
    pub const fn acquired_total(&self) -> u64 {
        self.next_id
    }

    /// Total handles ever released.
    #[must_use]
    pub const fn released_total(&self) -> u64 {
        self.released
    }
}

impl DisplaySurface for MemorySurface {
    type Handle = MemoryHandle;

    fn acquire(&mut self, _bytes: &[u8], mime: &str) -> Result<MemoryHandle, DisplayError> {
        let handle = MemoryHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(handle, mime.to_owned());
        Ok(handle)
    }

    fn release(&mut self, handle: MemoryHandle) {
        if self.live.remove(&handle).is_some() {
            self.released += 1;
        } else {
            log::warn!("release of unknown display handle {handle:?}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_balance() {
        let mut surface = MemorySurface::new();
        let a = surface.acquire(b"a", "image/png").unwrap();
        let b = surface.acquire(b"b", "image/jpeg").unwrap();
        assert_eq!(surface.live_handles(), 2);
        assert_eq!(surface.mime_of(b), Some("image/jpeg"));

        surface.release(a);
        assert!(!surface.is_live(a));
        assert!(surface.is_live(b));
        assert_eq!(surface.acquired_total(), 2);
        assert_eq!(surface.released_total(), 1);
    }

    #[test]
    fn double_release_is_counted_once() {
        let mut surface = MemorySurface::new();
        let a = surface.acquire(b"a", "image/png").unwrap();
        surface.release(a);
        surface.release(a);
        assert_eq!(surface.released_total(), 1);
        assert_eq!(surface.live_handles(), 0);
    }
}
