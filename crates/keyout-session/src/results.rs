//! Ownership of the displayed result image.
//!
//! At most one result handle is live at a time. A new payload gets its
//! handle before the previous one is released, so the preview never
//! flashes empty between frames.

use crate::surface::{DisplayError, DisplaySurface};

/// MIME type of every result payload.
pub const RESULT_MIME: &str = "image/png";

/// Holds the current result handle and its bytes.
#[derive(Debug)]
pub struct ResultResourceManager<H> {
    current: Option<(H, Vec<u8>)>,
    presented: u64,
}

impl<H> ResultResourceManager<H> {
    /// A manager with no result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: None,
            presented: 0,
        }
    }

    /// Make `payload` the displayed result.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] if the surface cannot wrap the payload.
    /// The previous result stays displayed in that case.
    pub fn present<S>(&mut self, surface: &mut S, payload: Vec<u8>) -> Result<&H, DisplayError>
    where
        S: DisplaySurface<Handle = H>,
    {
        let handle = surface.acquire(&payload, RESULT_MIME)?;
        self.presented += 1;
        log::debug!(
            "presenting result #{} ({} bytes)",
            self.presented,
            payload.len()
        );

        let previous = self.current.take();
        let (handle, _) = self.current.insert((handle, payload));
        if let Some((old, _)) = previous {
            surface.release(old);
        }
        Ok(&*handle)
    }

    /// Release the current result, if any.
    pub fn clear<S>(&mut self, surface: &mut S)
    where
        S: DisplaySurface<Handle = H>,
    {
        if let Some((handle, _)) = self.current.take() {
            surface.release(handle);
        }
    }

    /// The displayed result handle.
    #[must_use]
    pub fn handle(&self) -> Option<&H> {
        self.current.as_ref().map(|(handle, _)| handle)
    }

    /// The displayed result's encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, bytes)| bytes.as_slice())
    }

    /// Results presented over the manager's lifetime.
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }
}

impl<H> Default for ResultResourceManager<H> {
    fn default() -> Self {
        Self::new()
    }
}
