//! Unified error types for detection, decode, and encode operations.

use crate::format::ImageFormat;

/// Unified error for everything this crate does.
///
/// Codecs report the most specific variant they can determine. The
/// dispatch layer may attach context but never replaces a specific
/// variant with a more generic one.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Content matched no known signature and no usable name hint was given.
    #[error("could not determine image format from content or name")]
    UnknownFormat,

    /// Format recognized but no codec for it is available here, either
    /// because support was compiled out or a registry excluded it.
    #[error("{format} is not supported in this configuration: {detail}")]
    UnsupportedFormat { format: ImageFormat, detail: String },

    /// The data claims to be `format` but violates its structure.
    #[error("corrupt {format} data: {detail}")]
    CorruptData { format: ImageFormat, detail: String },

    /// Well-formed data using a capability of the format this codec
    /// does not handle (an exotic compression scheme, say).
    #[error("unsupported {format} variant: {detail}")]
    UnsupportedVariant { format: ImageFormat, detail: String },

    /// The pixel data cannot be expressed in the requested output format.
    #[error("cannot represent image as {format}: {detail}")]
    UnrepresentableData { format: ImageFormat, detail: String },

    /// A codec that shells out to a helper program could not run it.
    #[error("external tool `{tool}` failed: {detail}")]
    ExternalToolUnavailable { tool: String, detail: String },

    /// Image dimensions or memory requirements exceed the configured limits.
    #[error("limit exceeded: {detail}")]
    LimitExceeded { detail: String },

    /// An underlying I/O operation failed.
    #[error("i/o error while {op}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn unsupported(format: ImageFormat, detail: impl Into<String>) -> Self {
        Error::UnsupportedFormat {
            format,
            detail: detail.into(),
        }
    }

    pub(crate) fn corrupt(format: ImageFormat, detail: impl Into<String>) -> Self {
        Error::CorruptData {
            format,
            detail: detail.into(),
        }
    }

    pub(crate) fn variant(format: ImageFormat, detail: impl Into<String>) -> Self {
        Error::UnsupportedVariant {
            format,
            detail: detail.into(),
        }
    }

    pub(crate) fn unrepresentable(format: ImageFormat, detail: impl Into<String>) -> Self {
        Error::UnrepresentableData {
            format,
            detail: detail.into(),
        }
    }

    pub(crate) fn limit(detail: impl Into<String>) -> Self {
        Error::LimitExceeded {
            detail: detail.into(),
        }
    }

    pub(crate) fn io(op: &'static str, source: std::io::Error) -> Self {
        Error::Io { op, source }
    }

    /// The format this error is about, when one was identified.
    pub fn format(&self) -> Option<ImageFormat> {
        match self {
            Error::UnsupportedFormat { format, .. }
            | Error::CorruptData { format, .. }
            | Error::UnsupportedVariant { format, .. }
            | Error::UnrepresentableData { format, .. } => Some(*format),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_includes_format_and_detail() {
        let e = Error::corrupt(ImageFormat::Png, "bad chunk crc");
        assert_eq!(e.to_string(), "corrupt PNG data: bad chunk crc");
        assert_eq!(e.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn io_error_preserves_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e = Error::io("opening input", inner);
        assert!(e.to_string().contains("opening input"));
        assert!(e.source().is_some());
        assert_eq!(e.format(), None);
    }

    #[test]
    fn unknown_format_has_no_format() {
        assert_eq!(Error::UnknownFormat.format(), None);
    }
}
