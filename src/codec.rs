//! Codec Adapter: per-format decode and encode, plus the two thumbnailing tiers.
//!
//! | Capability | WebP | JPEG / PNG |
//! |---|---|---|
//! | decode | libwebp [`Decoder`] | `image` crate decoders |
//! | encode | libwebp [`Encoder`] at a quality | `image` encoders (JPEG takes the quality, PNG ignores it) |
//! | encode_lossless | libwebp lossless | n/a |
//! | thumbnail | libwebp scaled decode | n/a |
//!
//! Thumbnailing only accepts WebP bytes, so callers holding a JPEG or PNG
//! bitmap go through [`Codec::encode_lossless`] first.

use std::io::Cursor;
use std::marker::PhantomData;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::ImageEncoder;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::request::{Quality, ResizeStrategy};
use crate::shared::{Bitmap, Format, PixelLayout};

/// The operations the conversion pipeline needs from an image codec.
pub trait Codec {
    /// Decodes encoded bytes of the given format.
    fn decode(&self, bytes: &[u8], format: Format) -> Result<Bitmap>;

    /// Encodes to lossless WebP, the input format of the thumbnail functions.
    fn encode_lossless(&self, bitmap: &Bitmap) -> Result<Vec<u8>>;

    /// Final encode into `format`.
    fn encode(&self, bitmap: &Bitmap, format: Format, quality: Quality) -> Result<Vec<u8>>;

    /// Speed-optimized resize of WebP bytes.
    fn thumbnail_fast(&self, webp: &[u8], width: u32, height: u32) -> Result<Bitmap>;

    /// Fidelity-optimized resize of WebP bytes.
    fn thumbnail_quality(&self, webp: &[u8], width: u32, height: u32) -> Result<Bitmap>;

    fn thumbnail(&self, webp: &[u8], width: u32, height: u32, strategy: ResizeStrategy) -> Result<Bitmap> {
        match strategy {
            ResizeStrategy::Fast => self.thumbnail_fast(webp, width, height),
            ResizeStrategy::Quality => self.thumbnail_quality(webp, width, height),
        }
    }
}

/// [`Codec`] backed by libwebp for WebP and the `image` crate for JPEG and PNG.
///
/// Not `Send` or `Sync`: take one per conversion.
#[derive(Debug, Default)]
pub struct WebPCodec {
    _not_thread_safe: PhantomData<*const ()>,
}

impl WebPCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for WebPCodec {
    fn decode(&self, bytes: &[u8], format: Format) -> Result<Bitmap> {
        match format {
            Format::WebP => Decoder::new(bytes).decode(),
            Format::Jpeg | Format::Png => image::load_from_memory_with_format(bytes, format.image_format())
                .map(Bitmap::from_image)
                .map_err(|source| Error::DecodeImage { format, source }),
        }
    }

    fn encode_lossless(&self, bitmap: &Bitmap) -> Result<Vec<u8>> {
        Ok(Encoder::from_bitmap(bitmap).encode_lossless()?.to_vec())
    }

    fn encode(&self, bitmap: &Bitmap, format: Format, quality: Quality) -> Result<Vec<u8>> {
        match format {
            Format::WebP => Ok(Encoder::from_bitmap(bitmap).encode(f32::from(quality.value()))?.to_vec()),
            Format::Jpeg => encode_jpeg(bitmap, quality),
            Format::Png => encode_png(bitmap),
        }
    }

    fn thumbnail_fast(&self, webp: &[u8], width: u32, height: u32) -> Result<Bitmap> {
        Decoder::new(webp).thumbnail(width, height, ResizeStrategy::Fast)
    }

    fn thumbnail_quality(&self, webp: &[u8], width: u32, height: u32) -> Result<Bitmap> {
        Decoder::new(webp).thumbnail(width, height, ResizeStrategy::Quality)
    }
}

/// JPEG has no alpha channel, so RGBA input is flattened to RGB.
fn encode_jpeg(bitmap: &Bitmap, quality: Quality) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value());

    let result = match bitmap.layout() {
        PixelLayout::Rgb => encoder.write_image(bitmap, bitmap.width(), bitmap.height(), image::ExtendedColorType::Rgb8),
        PixelLayout::Rgba => {
            let rgb = bitmap.clone().into_image().into_rgb8();
            encoder.write_image(&rgb, rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|source| Error::EncodeImage { format: Format::Jpeg, source })?;

    Ok(buffer.into_inner())
}

fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let color = match bitmap.layout() {
        PixelLayout::Rgb => image::ExtendedColorType::Rgb8,
        PixelLayout::Rgba => image::ExtendedColorType::Rgba8,
    };

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(bitmap, bitmap.width(), bitmap.height(), color)
        .map_err(|source| Error::EncodeImage { format: Format::Png, source })?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> Bitmap {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 120, 255])
        });
        Bitmap::from_image(DynamicImage::ImageRgba8(image))
    }

    #[test]
    fn png_roundtrip_keeps_pixels() {
        let codec = WebPCodec::new();
        let bitmap = gradient(9, 5);
        let png = codec.encode(&bitmap, Format::Png, Quality::MAX).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = codec.decode(&png, Format::Png).unwrap();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let codec = WebPCodec::new();
        let jpeg = codec.encode(&gradient(16, 8), Format::Jpeg, Quality::new(90)).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let decoded = codec.decode(&jpeg, Format::Jpeg).unwrap();
        assert_eq!(decoded.layout(), PixelLayout::Rgb);
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn webp_lossless_is_pixel_exact() {
        let codec = WebPCodec::new();
        let bitmap = gradient(7, 7);
        let webp = codec.encode_lossless(&bitmap).unwrap();
        let decoded = codec.decode(&webp, Format::WebP).unwrap();
        // Alpha is fully opaque, which libwebp is free to drop.
        let rgba = decoded.into_image().to_rgba8();
        assert_eq!(rgba.as_raw(), &bitmap.clone().into_image().to_rgba8().into_raw());
    }

    #[test]
    fn thumbnail_dispatches_on_strategy() {
        let codec = WebPCodec::new();
        let webp = codec.encode_lossless(&gradient(40, 20)).unwrap();
        let fast = codec.thumbnail(&webp, 10, 5, ResizeStrategy::Fast).unwrap();
        let quality = codec.thumbnail(&webp, 10, 5, ResizeStrategy::Quality).unwrap();
        assert_eq!((fast.width(), fast.height()), (10, 5));
        assert_eq!((quality.width(), quality.height()), (10, 5));
    }

    #[test]
    fn decode_garbage_names_format() {
        let codec = WebPCodec::new();
        let err = codec.decode(b"definitely not an image", Format::WebP).unwrap_err();
        assert!(matches!(err, Error::Decode { format: Format::WebP, .. }));

        for format in [Format::Jpeg, Format::Png] {
            let err = codec.decode(b"definitely not an image", format).unwrap_err();
            assert!(matches!(err, Error::DecodeImage { format: f, .. } if f == format));
        }
    }

    #[test]
    fn image_decode_error_keeps_its_source() {
        use std::error::Error as _;

        let err = WebPCodec::new().decode(b"\x89PNG\r\n\x1a\n garbage", Format::Png).unwrap_err();
        let source = err.source().expect("decode error should carry the image error");
        assert!(source.downcast_ref::<image::ImageError>().is_some());
        assert_eq!(err.to_string(), "failed to decode PNG image");
    }

    #[test]
    fn jpeg_encode_error_keeps_its_source() {
        use std::error::Error as _;

        // The JPEG encoder refuses images wider than 65535 pixels.
        let wide = Bitmap::new(vec![0; 70_000 * 3], PixelLayout::Rgb, 70_000, 1).unwrap();
        let err = WebPCodec::new().encode(&wide, Format::Jpeg, Quality::MAX).unwrap_err();
        assert!(matches!(err, Error::EncodeImage { format: Format::Jpeg, .. }), "{err:?}");
        assert!(err.source().is_some());
    }

    #[test]
    fn webp_encode_keeps_dimensions() {
        let codec = WebPCodec::new();
        let webp = codec.encode(&gradient(12, 3), Format::WebP, Quality::new(50)).unwrap();
        let decoded = codec.decode(&webp, Format::WebP).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 3));
    }
}
