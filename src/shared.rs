use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::path::Path;

use image::{DynamicImage, ImageBuffer};
use libwebp_sys::WebPFree;

/// This struct represents a safe wrapper around memory owned by libwebp.
/// Its data contents can be read through the Deref trait.
pub struct WebPMemory(pub(crate) *mut u8, pub(crate) usize);

impl Debug for WebPMemory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPMemory").field("len", &self.1).finish()
    }
}

impl Drop for WebPMemory {
    fn drop(&mut self) {
        unsafe { WebPFree(self.0 as _) }
    }
}

impl Deref for WebPMemory {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        unsafe { std::slice::from_raw_parts(self.0, self.1) }
    }
}

/// Describes the pixel layout of a bitmap.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    /// Number of bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// A decoded, 8-bit-per-channel image held in memory.
///
/// Produced by a decode or thumbnail step and consumed by the next stage of
/// the pipeline. Its data contents can be accessed through the Deref trait.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<u8>,
    layout: PixelLayout,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// Wraps raw pixel data. Returns `None` if the buffer length does not match
    /// `width * height * bytes_per_pixel`.
    pub fn new(data: Vec<u8>, layout: PixelLayout, width: u32, height: u32) -> Option<Self> {
        let expected = width as usize * height as usize * layout.bytes_per_pixel();
        if data.len() != expected {
            return None;
        }
        Some(Self { data, layout, width, height })
    }

    /// Converts an `image` crate image, keeping alpha only if the source has it.
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        if image.color().has_alpha() {
            Self { data: image.into_rgba8().into_raw(), layout: PixelLayout::Rgba, width, height }
        } else {
            Self { data: image.into_rgb8().into_raw(), layout: PixelLayout::Rgb, width, height }
        }
    }

    /// Creates a DynamicImage from this bitmap.
    pub fn into_image(self) -> DynamicImage {
        // Length was checked on construction.
        match self.layout {
            PixelLayout::Rgba => DynamicImage::ImageRgba8(
                ImageBuffer::from_raw(self.width, self.height, self.data)
                    .expect("ImageBuffer couldn't be created"),
            ),
            PixelLayout::Rgb => DynamicImage::ImageRgb8(
                ImageBuffer::from_raw(self.width, self.height, self.data)
                    .expect("ImageBuffer couldn't be created"),
            ),
        }
    }

    /// Returns the width of the bitmap in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the bitmap in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }
}

impl Debug for Bitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Deref for Bitmap {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// The encodings this crate reads and writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Format {
    WebP,
    Jpeg,
    Png,
}

impl Format {
    /// Guesses the format from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webp" => Some(Format::WebP),
            "jpg" | "jpeg" => Some(Format::Jpeg),
            "png" => Some(Format::Png),
            _ => None,
        }
    }

    /// Guesses the format from the extension of a path or URL.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Format::WebP => image::ImageFormat::WebP,
            Format::Jpeg => image::ImageFormat::Jpeg,
            Format::Png => image::ImageFormat::Png,
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::WebP => "WebP",
            Format::Jpeg => "JPEG",
            Format::Png => "PNG",
        })
    }
}
