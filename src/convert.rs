//! Conversion Orchestrator.
//!
//! Every public operation is one [`ConversionRequest`] run through
//! [`Converter::run`], which goes through four strictly sequential stages:
//!
//! 1. validate the request, returning `Ok(false)` before any I/O if it is rejected;
//! 2. acquire the source bytes from disk or network;
//! 3. transform: decode, optionally thumbnail, encode;
//! 4. persist the encoded bytes to the destination path.
//!
//! Faults in stages 2 to 4 are returned as `Err` untouched. A fault during
//! persist can leave a partial destination file behind.

use std::path::Path;

use log::{debug, info, warn};

use crate::codec::{Codec, WebPCodec};
use crate::error::{Error, Result};
use crate::request::{ConversionRequest, Quality, ResizeStrategy};
use crate::shared::{Bitmap, Format};
use crate::source::{self, Locator};

/// Drives one or more conversions through a [`Codec`].
pub struct Converter<C = WebPCodec> {
    codec: C,
}

impl Converter<WebPCodec> {
    pub fn new() -> Self {
        Self::with_codec(WebPCodec::new())
    }
}

impl Default for Converter<WebPCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> Converter<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Runs a request end to end.
    ///
    /// Returns `Ok(true)` once the destination is fully written and
    /// `Ok(false)` if the request was rejected without touching anything.
    pub fn run(&self, request: &ConversionRequest) -> Result<bool> {
        if let Some(reason) = request.rejection() {
            warn!("rejected conversion to {}: {reason}", request.destination.display());
            return Ok(false);
        }

        let raw = source::fetch(&request.locator)?;
        let encoded = self.transform(request, &raw)?;
        persist(&request.destination, &encoded)?;

        info!(
            "converted {} {} -> {} {}",
            request.source_format,
            describe(&request.locator),
            request.target_format,
            request.destination.display()
        );
        Ok(true)
    }

    /// Turns source bytes into destination bytes.
    fn transform(&self, request: &ConversionRequest, raw: &[u8]) -> Result<Vec<u8>> {
        let bitmap = match request.size {
            Some((width, height)) => {
                debug!(
                    "resizing {} to {width}x{height} ({:?})",
                    request.source_format, request.strategy
                );
                self.resize(raw, request.source_format, width, height, request.strategy)?
            }
            None => {
                debug!("decoding {} at native size", request.source_format);
                self.codec.decode(raw, request.source_format)?
            }
        };

        debug!(
            "encoding {}x{} bitmap as {} at quality {}",
            bitmap.width(),
            bitmap.height(),
            request.target_format,
            request.quality.value()
        );
        self.codec.encode(&bitmap, request.target_format, request.quality)
    }

    /// WebP bytes go straight to the thumbnailer; anything else is first
    /// decoded and re-encoded as lossless WebP.
    fn resize(
        &self,
        raw: &[u8],
        format: Format,
        width: u32,
        height: u32,
        strategy: ResizeStrategy,
    ) -> Result<Bitmap> {
        match format {
            Format::WebP => self.codec.thumbnail(raw, width, height, strategy),
            Format::Jpeg | Format::Png => {
                let decoded = self.codec.decode(raw, format)?;
                let intermediate = self.codec.encode_lossless(&decoded)?;
                self.codec.thumbnail(&intermediate, width, height, strategy)
            }
        }
    }
}

fn persist(destination: &Path, bytes: &[u8]) -> Result<()> {
    debug!("writing {} bytes to {}", bytes.len(), destination.display());
    std::fs::write(destination, bytes).map_err(|source| Error::Write { path: destination.to_path_buf(), source })
}

fn describe(locator: &Locator) -> String {
    match locator {
        Locator::Local(path) => path.display().to_string(),
        Locator::Remote(url) => url.clone(),
    }
}

/// Resizes an image, keeping its format.
pub fn resize(
    format: Format,
    locator: Locator,
    destination: impl AsRef<Path>,
    width: u32,
    height: u32,
    strategy: ResizeStrategy,
) -> Result<bool> {
    let request = ConversionRequest::new(format, format, locator, destination.as_ref())
        .size(width, height)
        .strategy(strategy);
    Converter::new().run(&request)
}

/// Converts an image to another format at its native size.
pub fn convert(
    source_format: Format,
    target_format: Format,
    locator: Locator,
    destination: impl AsRef<Path>,
    quality: impl Into<Quality>,
) -> Result<bool> {
    let request = ConversionRequest::new(source_format, target_format, locator, destination.as_ref())
        .quality(quality);
    Converter::new().run(&request)
}

/// Converts an image to another format, resizing it on the way.
///
/// Resizing always uses [`ResizeStrategy::Quality`]. To resize with
/// [`ResizeStrategy::Fast`], build a [`ConversionRequest`] with
/// [`ConversionRequest::strategy`] and hand it to [`Converter::run`].
pub fn convert_resized(
    source_format: Format,
    target_format: Format,
    locator: Locator,
    destination: impl AsRef<Path>,
    width: u32,
    height: u32,
    quality: impl Into<Quality>,
) -> Result<bool> {
    let request = ConversionRequest::new(source_format, target_format, locator, destination.as_ref())
        .size(width, height)
        .quality(quality);
    Converter::new().run(&request)
}
