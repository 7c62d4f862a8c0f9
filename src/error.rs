use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::Format;

/// Faults raised while acquiring, transcoding or persisting an image.
///
/// Rejected requests are not errors; they surface as `Ok(false)` from the
/// conversion functions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("request to `{url}` failed")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from `{url}`")]
    Download {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot fetch `{url}`: built without the `remote` feature")]
    RemoteDisabled { url: String },

    #[error("failed to decode {format} image: {reason}")]
    Decode { format: Format, reason: String },

    #[error("failed to encode {format} image: {reason}")]
    Encode { format: Format, reason: String },

    #[error("failed to decode {format} image")]
    DecodeImage {
        format: Format,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {format} image")]
    EncodeImage {
        format: Format,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn decode(format: Format, reason: impl Into<String>) -> Self {
        Error::Decode { format, reason: reason.into() }
    }

    pub(crate) fn encode(format: Format, reason: impl Into<String>) -> Self {
        Error::Encode { format, reason: reason.into() }
    }
}
