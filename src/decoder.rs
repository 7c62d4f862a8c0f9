use std::fmt::{self, Debug, Formatter};

use libwebp_sys::*;
use log::trace;

use crate::error::{Error, Result};
use crate::request::ResizeStrategy;
use crate::shared::{Bitmap, Format, PixelLayout};

/// Largest width or height a WebP image can have (`WEBP_MAX_DIMENSION`).
pub const MAX_DIMENSION: u32 = 16383;

/// A decoder for WebP images.
/// Animated images are not supported.
///
/// Besides a plain decode, the decoder can rescale while decoding, which is
/// how thumbnails are produced: libwebp only offers that on WebP input.
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder from the given image data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Decodes the image at its native size.
    pub fn decode(&self) -> Result<Bitmap> {
        self.decode_with(None, ResizeStrategy::Quality)
    }

    /// Decodes the image rescaled to exactly `width` x `height`, each of which
    /// must lie in `1..=MAX_DIMENSION`.
    ///
    /// [`ResizeStrategy::Fast`] bypasses the in-loop filter and uses plain
    /// upsampling of the chroma planes; [`ResizeStrategy::Quality`] keeps both.
    pub fn thumbnail(&self, width: u32, height: u32, strategy: ResizeStrategy) -> Result<Bitmap> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::decode(Format::WebP, format!("invalid thumbnail size {width}x{height}")));
        }
        self.decode_with(Some((width, height)), strategy)
    }

    fn decode_with(&self, scale: Option<(u32, u32)>, strategy: ResizeStrategy) -> Result<Bitmap> {
        let features = BitstreamFeatures::new(self.data)
            .ok_or_else(|| Error::decode(Format::WebP, "not a WebP bit-stream"))?;

        trace!("decoding {features:?}");
        if features.has_animation() {
            return Err(Error::decode(Format::WebP, "animated images are not supported"));
        }

        let (width, height) = scale.unwrap_or((features.width(), features.height()));
        let layout = if features.has_alpha() { PixelLayout::Rgba } else { PixelLayout::Rgb };
        let (stride, len) = buffer_size(width, height, layout)
            .ok_or_else(|| Error::decode(Format::WebP, format!("output size {width}x{height} is too large")))?;
        let mut pixels = vec![0u8; len];

        let status = unsafe {
            let mut config: WebPDecoderConfig = std::mem::zeroed();
            if WebPInitDecoderConfigInternal(&mut config, WEBP_DECODER_ABI_VERSION as _) == 0 {
                return Err(Error::decode(Format::WebP, "libwebp version mismatch"));
            }

            if scale.is_some() {
                config.options.use_scaling = 1;
                // Both fit in a C int: thumbnail() caps them at MAX_DIMENSION.
                config.options.scaled_width = width as _;
                config.options.scaled_height = height as _;
            }
            if strategy == ResizeStrategy::Fast {
                config.options.bypass_filtering = 1;
                config.options.no_fancy_upsampling = 1;
            }
            config.options.use_threads = 1;

            config.output.colorspace = match layout {
                PixelLayout::Rgba => WEBP_CSP_MODE::MODE_RGBA,
                PixelLayout::Rgb => WEBP_CSP_MODE::MODE_RGB,
            };
            // Decode straight into `pixels`.
            config.output.is_external_memory = 1;
            config.output.u.RGBA = WebPRGBABuffer {
                rgba: pixels.as_mut_ptr(),
                stride: stride as _,
                size: pixels.len(),
            };

            let status = WebPDecode(self.data.as_ptr(), self.data.len(), &mut config);
            WebPFreeDecBuffer(&mut config.output);
            status
        };

        if status != VP8StatusCode::VP8_STATUS_OK {
            return Err(Error::decode(Format::WebP, format!("libwebp status {status:?}")));
        }

        Bitmap::new(pixels, layout, width, height)
            .ok_or_else(|| Error::decode(Format::WebP, "decoded buffer has the wrong size"))
    }
}

/// Row stride and total length of an output buffer, or `None` on overflow.
fn buffer_size(width: u32, height: u32, layout: PixelLayout) -> Option<(usize, usize)> {
    let stride = usize::try_from(width).ok()?.checked_mul(layout.bytes_per_pixel())?;
    if stride > i32::MAX as usize {
        // libwebp takes the stride as a C int.
        return None;
    }
    let len = stride.checked_mul(usize::try_from(height).ok()?)?;
    Some((stride, len))
}

/// A wrapper around libwebp-sys::WebPBitstreamFeatures which allows to get information about the image.
pub struct BitstreamFeatures(WebPBitstreamFeatures);

impl BitstreamFeatures {
    pub fn new(data: &[u8]) -> Option<Self> {
        unsafe {
            let mut features: WebPBitstreamFeatures = std::mem::zeroed();

            let result = WebPGetFeatures(data.as_ptr(), data.len(), &mut features as *mut _);

            if result == VP8StatusCode::VP8_STATUS_OK {
                return Some(Self(features));
            }
        }

        None
    }

    /// Returns the width of the image as described by the bitstream in pixels.
    pub fn width(&self) -> u32 {
        self.0.width as u32
    }

    /// Returns the height of the image as described by the bitstream in pixels.
    pub fn height(&self) -> u32 {
        self.0.height as u32
    }

    /// Returns true if the image as described by the bitstream has an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.0.has_alpha == 1
    }

    /// Returns true if the image as described by the bitstream is animated.
    pub fn has_animation(&self) -> bool {
        self.0.has_animation == 1
    }

    /// Returns true if the bitstream is VP8L, libwebp's lossless format.
    pub fn is_lossless(&self) -> bool {
        self.0.format == 2
    }
}

impl Debug for BitstreamFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitstreamFeatures")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("has_alpha", &self.has_alpha())
            .field("has_animation", &self.has_animation())
            .field("lossless", &self.is_lossless())
            .finish()
    }
}
