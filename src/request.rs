use std::path::{Path, PathBuf};

use crate::shared::Format;
use crate::source::Locator;

/// Encoding quality in `1..=100`.
///
/// Anything outside that range, including zero and negative values, is
/// normalized to 100.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: Quality = Quality(100);

    pub fn new(value: i32) -> Self {
        match u8::try_from(value) {
            Ok(q @ 1..=100) => Quality(q),
            _ => Quality::MAX,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::MAX
    }
}

impl From<i32> for Quality {
    fn from(value: i32) -> Self {
        Quality::new(value)
    }
}

/// Which libwebp rescaling path a resize goes through.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ResizeStrategy {
    /// Favors speed over fidelity.
    Fast,
    /// Favors fidelity over speed.
    #[default]
    Quality,
}

/// Everything one conversion call needs.
///
/// Built with [`ConversionRequest::new`] and the chained setters; a request
/// without a size converts at the source's native dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source_format: Format,
    pub target_format: Format,
    pub locator: Locator,
    pub destination: PathBuf,
    pub size: Option<(u32, u32)>,
    pub quality: Quality,
    pub strategy: ResizeStrategy,
}

impl ConversionRequest {
    pub fn new(
        source_format: Format,
        target_format: Format,
        locator: Locator,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_format,
            target_format,
            locator,
            destination: destination.into(),
            size: None,
            quality: Quality::default(),
            strategy: ResizeStrategy::default(),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn quality(mut self, quality: impl Into<Quality>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn strategy(mut self, strategy: ResizeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns the reason the request must be rejected, if any.
    pub fn rejection(&self) -> Option<&'static str> {
        if self.locator.is_empty() {
            return Some("empty source locator");
        }
        if self.destination.as_os_str().is_empty() {
            return Some("empty destination path");
        }
        match self.size {
            Some((width, height)) if width == 0 || height == 0 => Some("non-positive dimensions"),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rejection().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(locator: Locator, dest: &str) -> ConversionRequest {
        ConversionRequest::new(Format::Png, Format::WebP, locator, dest)
    }

    #[test]
    fn quality_out_of_range_is_max() {
        for value in [0, -1, -100, 101, 255, 256, i32::MIN, i32::MAX] {
            assert_eq!(Quality::new(value).value(), 100, "{value}");
        }
    }

    #[test]
    fn quality_in_range_is_kept() {
        assert_eq!(Quality::new(1).value(), 1);
        assert_eq!(Quality::new(42).value(), 42);
        assert_eq!(Quality::new(100).value(), 100);
        assert_eq!(Quality::default(), Quality::MAX);
    }

    #[test]
    fn defaults() {
        let req = request(Locator::local("in.png"), "out.webp");
        assert_eq!(req.size, None);
        assert_eq!(req.quality.value(), 100);
        assert_eq!(req.strategy, ResizeStrategy::Quality);
        assert!(req.is_valid());
    }

    #[test]
    fn builder_sets_fields() {
        let req = request(Locator::remote("https://example.com/a.png"), "out.webp")
            .size(100, 50)
            .quality(80)
            .strategy(ResizeStrategy::Fast);
        assert_eq!(req.size, Some((100, 50)));
        assert_eq!(req.quality.value(), 80);
        assert_eq!(req.strategy, ResizeStrategy::Fast);
        assert_eq!(req.destination(), Path::new("out.webp"));
    }

    #[test]
    fn rejects_empty_identifiers() {
        assert_eq!(request(Locator::local(""), "out.webp").rejection(), Some("empty source locator"));
        assert_eq!(request(Locator::remote(""), "out.webp").rejection(), Some("empty source locator"));
        assert_eq!(request(Locator::local("in.png"), "").rejection(), Some("empty destination path"));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let base = request(Locator::local("in.png"), "out.webp");
        assert!(!base.clone().size(0, 10).is_valid());
        assert!(!base.clone().size(10, 0).is_valid());
        assert!(!base.clone().size(0, 0).is_valid());
        assert!(base.size(1, 1).is_valid());
    }
}
