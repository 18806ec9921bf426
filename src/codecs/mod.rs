//! Codec adapters for format-specific implementations.
//!
//! Each module provides a thin adapter between the unified API and one
//! backend: a codec crate, the hand-rolled BMP reader/writer, or the
//! external XCF converter.

#[cfg(feature = "bmp")]
pub(crate) mod bmp;

#[cfg(feature = "jpeg")]
pub(crate) mod jpeg;

#[cfg(feature = "png")]
pub(crate) mod png;

#[cfg(feature = "tiff")]
pub(crate) mod tiff;

#[cfg(feature = "lsm")]
pub(crate) mod lsm;

#[cfg(feature = "webp")]
pub(crate) mod webp;

#[cfg(feature = "xcf")]
pub(crate) mod xcf;
