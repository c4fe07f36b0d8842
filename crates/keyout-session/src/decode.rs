//! Source image decoding.
//!
//! Accepts the raw bytes of a selected file (PNG, JPEG, BMP, WebP, GIF:
//! the formats a browser can paint) and produces an RGBA pixel buffer
//! for sampling plus a display handle for painting.

use image::{ImageFormat, RgbaImage};

use crate::surface::{DisplayError, DisplaySurface};
use crate::types::Dimensions;

/// Errors that can occur while loading a source image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The selected file was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The bytes are not a supported, well-formed image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// The decoded image could not be handed to the renderer.
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// The locally loaded source image.
#[derive(Debug)]
pub struct ImageAsset<H> {
    pixels: RgbaImage,
    format: ImageFormat,
    file_name: String,
    display: H,
}

impl<H> ImageAsset<H> {
    /// Decoded RGBA pixels at the image's natural size.
    #[must_use]
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Natural dimensions of the image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    /// Detected container format.
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Name of the file the image came from.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without its extension, e.g. `photo` for `photo.png`.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map_or(self.file_name.as_str(), |(stem, _)| stem)
    }

    /// The handle the renderer paints.
    #[must_use]
    pub const fn display(&self) -> &H {
        &self.display
    }

    /// Give up the asset, keeping only its display handle for release.
    #[must_use]
    pub fn into_display(self) -> H {
        self.display
    }
}

/// Decode raw image bytes into an RGBA buffer.
///
/// The format is sniffed from the bytes, not taken from the file name.
///
/// # Errors
///
/// Returns [`DecodeError::EmptyInput`] if `bytes` is empty.
/// Returns [`DecodeError::Image`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<(RgbaImage, ImageFormat), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;
    Ok((img.to_rgba8(), format))
}

/// Owner of the currently displayed source image.
#[derive(Debug)]
pub struct ImageDecoder<H> {
    current: Option<ImageAsset<H>>,
}

impl<H> ImageDecoder<H> {
    /// Create a decoder with nothing loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Decode `bytes`, acquire a display handle for them, and make the
    /// result the current image.
    ///
    /// The previous image's display handle is released only once the new
    /// one exists; on failure the previous image stays current.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes cannot be decoded or the
    /// surface cannot create a handle.
    pub fn load<S>(
        &mut self,
        surface: &mut S,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<&ImageAsset<H>, DecodeError>
    where
        S: DisplaySurface<Handle = H>,
    {
        let (pixels, format) = decode_rgba(bytes)?;
        let display = surface.acquire(bytes, format.to_mime_type())?;

        log::info!(
            "decoded {file_name}: {}x{} {format:?}",
            pixels.width(),
            pixels.height()
        );

        let previous = self.current.take();
        let asset = self.current.insert(ImageAsset {
            pixels,
            format,
            file_name: file_name.to_owned(),
            display,
        });
        if let Some(previous) = previous {
            surface.release(previous.display);
        }

        Ok(&*asset)
    }

    /// The currently displayed image, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&ImageAsset<H>> {
        self.current.as_ref()
    }

    /// Remove the current image. The caller releases its handle.
    pub const fn take(&mut self) -> Option<ImageAsset<H>> {
        self.current.take()
    }
}

impl<H> Default for ImageDecoder<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    /// Encode an RGBA image as PNG bytes.
    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .ok();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode_rgba(&[]), Err(DecodeError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_return_image_error() {
        let result = decode_rgba(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(DecodeError::Image(_))));
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbaImage::from_fn(17, 31, |_, _| image::Rgba([128, 64, 32, 255]));
        let (pixels, format) = decode_rgba(&encode_png(&img)).unwrap();
        assert_eq!(pixels.dimensions(), (17, 31));
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn load_acquires_handle_with_sniffed_mime() {
        let mut surface = MemorySurface::new();
        let mut decoder = ImageDecoder::new();
        let img = RgbaImage::from_fn(4, 3, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));

        let asset = decoder.load(&mut surface, "photo.jpg", &encode_png(&img)).unwrap();
        assert_eq!(asset.dimensions(), Dimensions { width: 4, height: 3 });
        assert_eq!(asset.file_stem(), "photo");
        assert_eq!(surface.mime_of(*asset.display()), Some("image/png"));
    }

    #[test]
    fn replacing_image_releases_previous_handle() {
        let mut surface = MemorySurface::new();
        let mut decoder = ImageDecoder::new();
        let png = encode_png(&RgbaImage::new(2, 2));

        let first = *decoder.load(&mut surface, "a.png", &png).unwrap().display();
        let second = *decoder.load(&mut surface, "b.png", &png).unwrap().display();

        assert!(!surface.is_live(first));
        assert!(surface.is_live(second));
        assert_eq!(surface.live_handles(), 1);
    }

    #[test]
    fn failed_load_keeps_previous_image() {
        let mut surface = MemorySurface::new();
        let mut decoder = ImageDecoder::new();
        let png = encode_png(&RgbaImage::new(2, 2));
        decoder.load(&mut surface, "good.png", &png).unwrap();

        assert!(decoder.load(&mut surface, "bad.png", b"not an image").is_err());

        assert_eq!(decoder.current().unwrap().file_name(), "good.png");
        assert_eq!(surface.live_handles(), 1);
    }

    #[test]
    fn file_stem_without_extension_is_whole_name() {
        let mut surface = MemorySurface::new();
        let mut decoder = ImageDecoder::new();
        let png = encode_png(&RgbaImage::new(1, 1));
        let asset = decoder.load(&mut surface, "snapshot", &png).unwrap();
        assert_eq!(asset.file_stem(), "snapshot");
    }
}
