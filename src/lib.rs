//! # zenraster
//!
//! Raster image reading and writing with content-based format detection.
//!
//! Supported formats: BMP, JPEG, PNG, TIFF (including multi-page), WebP,
//! Zeiss LSM microscopy stacks, and GIMP XCF (read via an external
//! converter). Each codec is feature-gated. Enable only what you need:
//!
//! ```toml
//! [dependencies]
//! zenraster = { version = "0.1", features = ["png", "tiff", "lsm"] }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zenraster::{ImageFormat, ReadRequest, WriteRequest};
//!
//! // Detect and read
//! let data: &[u8] = &[]; // your image bytes
//! let format = ImageFormat::detect(data);
//! let decoded = ReadRequest::from_bytes(data)
//!     .with_metadata(true)
//!     .read()?;
//!
//! // Write to a different format
//! WriteRequest::new(&decoded.pixels)
//!     .with_format(ImageFormat::Png)
//!     .write("out.png")?;
//! # Ok::<(), zenraster::Error>(())
//! ```
//!
//! For quick one-off calls there are free functions: [`read`],
//! [`read_multi`], [`write`], [`write_multi`], and [`detect_format`].

#![forbid(unsafe_code)]

mod codecs;
mod config;
mod error;
mod format;
mod frames;
mod limits;
mod metadata;
pub mod pixel;
mod probe;
mod read;
mod registry;
mod write;

pub use config::CodecConfig;
#[cfg(feature = "tiff")]
pub use config::TiffCompression;
pub use error::Error;
pub use format::ImageFormat;
pub use frames::FrameSequence;
pub use limits::Limits;
pub use metadata::{MetaValue, Metadata};
pub use pixel::PixelData;
pub use probe::ProbeResult;
pub use read::{
    DecodeOutput, ReadRequest, detect_format, detect_format_from_blob, read, read_from_blob,
    read_multi, supports_format,
};
pub use registry::CodecRegistry;
pub use write::{WriteRequest, write, write_multi};
