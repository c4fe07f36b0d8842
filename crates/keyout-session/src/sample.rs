//! Seed color sampling from pointer clicks.
//!
//! The pointer arrives in client coordinates. It is translated relative
//! to the rendered element's bounding box, scaled from rendered size to
//! the buffer's natural size, and floored to an integer pixel. The color
//! is read from that exact pixel with no interpolation; alpha is ignored.

use image::RgbaImage;

use crate::notify::{Notifier, SubscriptionId};
use crate::types::{Dimensions, SeedColor};

/// A pointer position in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

/// The bounding box of the rendered source image, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedBounds {
    /// Bounds of an image rendered at its natural size at the origin.
    #[must_use]
    pub fn natural(dimensions: Dimensions) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: f64::from(dimensions.width),
            height: f64::from(dimensions.height),
        }
    }
}

/// The pointer fell outside the rendered image.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("pointer ({x}, {y}) is outside the rendered image")]
pub struct OutOfBoundsError {
    pub x: f64,
    pub y: f64,
}

/// Map a client position to a buffer pixel.
///
/// # Errors
///
/// Returns [`OutOfBoundsError`] if the position is not strictly inside
/// `bounds`, or if either the bounds or the buffer is empty.
pub fn pixel_at(
    position: PointerPosition,
    bounds: RenderedBounds,
    dimensions: Dimensions,
) -> Result<(u32, u32), OutOfBoundsError> {
    let local_x = position.x - bounds.left;
    let local_y = position.y - bounds.top;

    // Written so NaN coordinates fall through to the error.
    let inside = local_x >= 0.0
        && local_y >= 0.0
        && local_x < bounds.width
        && local_y < bounds.height
        && dimensions.width > 0
        && dimensions.height > 0;
    if !inside {
        return Err(OutOfBoundsError {
            x: position.x,
            y: position.y,
        });
    }

    let scaled_x = (local_x * f64::from(dimensions.width) / bounds.width).floor();
    let scaled_y = (local_y * f64::from(dimensions.height) / bounds.height).floor();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x, y) = (scaled_x as u32, scaled_y as u32);

    Ok((x.min(dimensions.width - 1), y.min(dimensions.height - 1)))
}

/// Publishes a new [`SeedColor`] for every click inside the image.
#[derive(Debug, Default)]
pub struct ColorSampler {
    current: Option<SeedColor>,
    published: Notifier<SeedColor>,
}

impl ColorSampler {
    /// Create a sampler with no seed color.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: None,
            published: Notifier::new(),
        }
    }

    /// Sample the pixel under `position` and publish it as the seed color.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundsError`] if the click missed the rendered
    /// image. Nothing is published in that case.
    pub fn sample_at(
        &mut self,
        pixels: &RgbaImage,
        position: PointerPosition,
        bounds: RenderedBounds,
    ) -> Result<SeedColor, OutOfBoundsError> {
        let dimensions = Dimensions {
            width: pixels.width(),
            height: pixels.height(),
        };
        let (x, y) = pixel_at(position, bounds, dimensions)?;
        let [r, g, b, _] = pixels.get_pixel(x, y).0;
        let color = SeedColor::new(r, g, b);

        log::debug!("sampled {color} at pixel ({x}, {y})");
        self.current = Some(color);
        self.published.emit(&color);
        Ok(color)
    }

    /// The most recently published seed color.
    #[must_use]
    pub const fn current(&self) -> Option<SeedColor> {
        self.current
    }

    /// Forget the current seed color without publishing.
    pub const fn reset(&mut self) {
        self.current = None;
    }

    /// Listen for published seed colors.
    pub fn subscribe(&mut self, listener: impl FnMut(&SeedColor) + 'static) -> SubscriptionId {
        self.published.subscribe(listener)
    }

    /// Stop listening.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.published.unsubscribe(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// A 400x300 image whose pixel (x, y) encodes its own coordinates.
    fn coordinate_image() -> RgbaImage {
        RgbaImage::from_fn(400, 300, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, (x / 256) as u8, 7])
        })
    }

    #[test]
    fn samples_exact_pixel_at_natural_size() {
        let pixels = coordinate_image();
        let mut sampler = ColorSampler::new();
        let bounds = RenderedBounds {
            left: 100.0,
            top: 50.0,
            width: 400.0,
            height: 300.0,
        };

        let color = sampler
            .sample_at(&pixels, PointerPosition { x: 110.7, y: 60.2 }, bounds)
            .unwrap();
        assert_eq!(color, SeedColor::new(10, 10, 0));
        assert_eq!(sampler.current(), Some(color));
    }

    #[test]
    fn scales_from_rendered_size_to_buffer() {
        let pixels = coordinate_image();
        let mut sampler = ColorSampler::new();
        // Rendered at half size.
        let bounds = RenderedBounds {
            left: 0.0,
            top: 0.0,
            width: 200.0,
            height: 150.0,
        };

        let color = sampler
            .sample_at(&pixels, PointerPosition { x: 150.0, y: 20.9 }, bounds)
            .unwrap();
        // (150 * 2, floor(20.9 * 2)) = (300, 41)
        assert_eq!(color, SeedColor::new(44, 41, 1));
    }

    #[test]
    fn last_row_and_column_are_reachable() {
        let dims = Dimensions {
            width: 400,
            height: 300,
        };
        let bounds = RenderedBounds::natural(dims);
        let pixel = pixel_at(PointerPosition { x: 399.99, y: 299.99 }, bounds, dims).unwrap();
        assert_eq!(pixel, (399, 299));
    }

    #[test]
    fn outside_bounds_is_an_error() {
        let dims = Dimensions {
            width: 10,
            height: 10,
        };
        let bounds = RenderedBounds::natural(dims);
        for (x, y) in [(-0.5, 5.0), (5.0, -0.1), (10.0, 5.0), (5.0, 10.0), (f64::NAN, 1.0)] {
            assert!(
                pixel_at(PointerPosition { x, y }, bounds, dims).is_err(),
                "({x}, {y}) should be out of bounds"
            );
        }
    }

    #[test]
    fn zero_sized_render_is_out_of_bounds() {
        let dims = Dimensions {
            width: 10,
            height: 10,
        };
        let bounds = RenderedBounds {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
        };
        assert!(pixel_at(PointerPosition { x: 0.0, y: 0.0 }, bounds, dims).is_err());
    }

    #[test]
    fn miss_does_not_publish_or_change_current() {
        let pixels = coordinate_image();
        let mut sampler = ColorSampler::new();
        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&published);
        sampler.subscribe(move |c| sink.borrow_mut().push(*c));

        let bounds = RenderedBounds::natural(Dimensions {
            width: 400,
            height: 300,
        });
        sampler
            .sample_at(&pixels, PointerPosition { x: 1.0, y: 2.0 }, bounds)
            .unwrap();
        assert!(
            sampler
                .sample_at(&pixels, PointerPosition { x: 401.0, y: 2.0 }, bounds)
                .is_err()
        );

        assert_eq!(*published.borrow(), vec![SeedColor::new(1, 2, 0)]);
        assert_eq!(sampler.current(), Some(SeedColor::new(1, 2, 0)));
    }
}
