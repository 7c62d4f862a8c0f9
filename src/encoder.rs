use libwebp_sys::*;

use crate::error::{Error, Result};
use crate::shared::*;

/// An encoder for WebP images. It uses the default configuration of libwebp.
pub struct Encoder<'a> {
    image: &'a [u8],
    layout: PixelLayout,
    width: u32,
    height: u32,
}

impl<'a> Encoder<'a> {
    /// Creates a new encoder from the given image data.
    /// The image data must be in the pixel layout of the color parameter.
    pub fn new(image: &'a [u8], layout: PixelLayout, width: u32, height: u32) -> Self {
        Self { image, layout, width, height }
    }

    /// Creates a new encoder from a decoded bitmap.
    pub fn from_bitmap(bitmap: &'a Bitmap) -> Self {
        Self::new(bitmap, bitmap.layout(), bitmap.width(), bitmap.height())
    }

    /// Creates a new encoder from the given image data in the RGB pixel layout.
    pub fn from_rgb(image: &'a [u8], width: u32, height: u32) -> Self {
        Self::new(image, PixelLayout::Rgb, width, height)
    }

    /// Creates a new encoder from the given image data in the RGBA pixel layout.
    pub fn from_rgba(image: &'a [u8], width: u32, height: u32) -> Self {
        Self::new(image, PixelLayout::Rgba, width, height)
    }

    /// Encode the image with the given quality.
    /// The image quality must be between 0.0 and 100.0 inclusive for minimal and maximal quality respectively.
    pub fn encode(&self, quality: f32) -> Result<WebPMemory> {
        self.check()?;
        let quality = quality.clamp(0.0, 100.0);
        unsafe { encode(self.image, self.layout, self.width, self.height, Some(quality)) }
    }

    /// Encode the image losslessly.
    pub fn encode_lossless(&self) -> Result<WebPMemory> {
        self.check()?;
        unsafe { encode(self.image, self.layout, self.width, self.height, None) }
    }

    fn check(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize * self.layout.bytes_per_pixel();
        if self.width == 0 || self.height == 0 || self.image.len() != expected {
            return Err(Error::encode(
                Format::WebP,
                format!(
                    "{}x{} {:?} image needs {expected} bytes, got {}",
                    self.width,
                    self.height,
                    self.layout,
                    self.image.len()
                ),
            ));
        }
        Ok(())
    }
}

/// `quality` of `None` selects the lossless encoder.
unsafe fn encode(
    image: &[u8],
    layout: PixelLayout,
    width: u32,
    height: u32,
    quality: Option<f32>,
) -> Result<WebPMemory> {
    let stride = (width as usize * layout.bytes_per_pixel()) as _;
    let width = width as _;
    let height = height as _;

    let mut buffer = std::ptr::null_mut::<u8>();

    let len = unsafe {
        match (layout, quality) {
            (PixelLayout::Rgb, None) => {
                WebPEncodeLosslessRGB(image.as_ptr(), width, height, stride, &mut buffer as *mut _)
            }
            (PixelLayout::Rgb, Some(quality)) => {
                WebPEncodeRGB(image.as_ptr(), width, height, stride, quality, &mut buffer as *mut _)
            }
            (PixelLayout::Rgba, None) => {
                WebPEncodeLosslessRGBA(image.as_ptr(), width, height, stride, &mut buffer as *mut _)
            }
            (PixelLayout::Rgba, Some(quality)) => {
                WebPEncodeRGBA(image.as_ptr(), width, height, stride, quality, &mut buffer as *mut _)
            }
        }
    };

    if len == 0 || buffer.is_null() {
        if !buffer.is_null() {
            unsafe { WebPFree(buffer as _) };
        }
        return Err(Error::encode(Format::WebP, "libwebp returned an empty buffer"));
    }

    Ok(WebPMemory(buffer, len))
}
