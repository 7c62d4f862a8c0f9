//! Convert and resize images between WebP, JPEG and PNG.
//!
//! ```no_run
//! use webp_convert::{convert_resized, Format, Locator};
//!
//! let written = convert_resized(Format::Png, Format::WebP, Locator::local("test.png"), "webp.webp", 440, 200, 100)?;
//! assert!(written);
//! # Ok::<(), webp_convert::Error>(())
//! ```

pub mod codec;
pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod request;
pub mod shared;
pub mod source;

pub use convert::{convert, convert_resized, resize, Converter};
pub use error::{Error, Result};
pub use request::{ConversionRequest, Quality, ResizeStrategy};
pub use shared::Format;
pub use source::Locator;

#[doc(hidden)]
pub mod prelude {
    pub use crate::codec::*;
    pub use crate::convert::*;
    pub use crate::decoder::*;
    pub use crate::encoder::*;
    pub use crate::request::*;
    pub use crate::shared::*;
    pub use crate::source::*;
}
