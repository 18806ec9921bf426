//! Image format identification and capability metadata.

use core::fmt;

/// Default converter binary for XCF input.
pub(crate) const XCF_TOOL: &str = "xcf2png";

/// Image formats this crate can identify.
///
/// Identification does not imply an available codec; see
/// [`CodecRegistry`](crate::registry::CodecRegistry) for what the current
/// build and configuration can actually decode or encode.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Jpeg,
    Png,
    Tiff,
    /// Zeiss LSM microscopy stack. Stored inside a TIFF container, so
    /// content sniffing alone reports [`ImageFormat::Tiff`]; LSM is
    /// selected by name hint or file extension.
    Lsm,
    WebP,
    /// GIMP XCF, decoded through an external converter.
    Xcf,
}

impl ImageFormat {
    /// Detect format from magic bytes. Returns None if unrecognized.
    ///
    /// Signatures are tried in a fixed order and the first exact match
    /// wins. BMP's two-byte signature is checked last because any ASCII
    /// text starting with "BM" would satisfy it. A slice shorter than a
    /// signature simply does not match that signature; no length is
    /// required up front.
    pub fn detect(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.len() >= 8
            && data[0] == 0x89
            && data[1] == 0x50
            && data[2] == 0x4E
            && data[3] == 0x47
            && data[4] == 0x0D
            && data[5] == 0x0A
            && data[6] == 0x1A
            && data[7] == 0x0A
        {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
            return Some(ImageFormat::Jpeg);
        }

        // TIFF: "II" 2A 00 (little-endian) or "MM" 00 2A (big-endian).
        // LSM files also land here; they are plain TIFF containers.
        if data.len() >= 4
            && ((data[0] == b'I' && data[1] == b'I' && data[2] == 0x2A && data[3] == 0x00)
                || (data[0] == b'M' && data[1] == b'M' && data[2] == 0x00 && data[3] == 0x2A))
        {
            return Some(ImageFormat::Tiff);
        }

        // WebP: "RIFF" at 0 and "WEBP" at 8; the chunk size between is free.
        if data.len() >= 12
            && data[0] == b'R'
            && data[1] == b'I'
            && data[2] == b'F'
            && data[3] == b'F'
            && data[8] == b'W'
            && data[9] == b'E'
            && data[10] == b'B'
            && data[11] == b'P'
        {
            return Some(ImageFormat::WebP);
        }

        // XCF: "gimp xcf " followed by a version tag
        if data.len() >= 9 && &data[..9] == b"gimp xcf " {
            return Some(ImageFormat::Xcf);
        }

        // BMP: "BM"
        if data.len() >= 2 && data[0] == b'B' && data[1] == b'M' {
            return Some(ImageFormat::Bmp);
        }

        None
    }

    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bmp" | "dib" => Some(ImageFormat::Bmp),
            "jpg" | "jpeg" | "jpe" | "jfif" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            // MetaMorph .stk stacks are ordinary multi-page TIFF
            "tif" | "tiff" | "stk" => Some(ImageFormat::Tiff),
            "lsm" => Some(ImageFormat::Lsm),
            "webp" => Some(ImageFormat::WebP),
            "xcf" => Some(ImageFormat::Xcf),
            _ => None,
        }
    }

    /// Resolve a format from a user-supplied name such as `"png"` or
    /// `"tiff"`. Accepts the same spellings as [`Self::from_extension`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_extension(name)
    }

    /// MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Tiff | ImageFormat::Lsm => "image/tiff",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Xcf => "image/x-xcf",
        }
    }

    /// Common file extensions, primary first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Bmp => &["bmp", "dib"],
            ImageFormat::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            ImageFormat::Png => &["png"],
            ImageFormat::Tiff => &["tif", "tiff", "stk"],
            ImageFormat::Lsm => &["lsm"],
            ImageFormat::WebP => &["webp"],
            ImageFormat::Xcf => &["xcf"],
        }
    }

    /// Whether this crate can produce files in this format.
    pub fn writable(self) -> bool {
        match self {
            ImageFormat::Bmp => true,
            ImageFormat::Jpeg => true,
            ImageFormat::Png => true,
            ImageFormat::Tiff => true,
            ImageFormat::Lsm => false,
            ImageFormat::WebP => true,
            ImageFormat::Xcf => false,
        }
    }

    /// Whether a single file can hold more than one frame.
    pub fn multi_frame(self) -> bool {
        match self {
            ImageFormat::Tiff | ImageFormat::Lsm => true,
            _ => false,
        }
    }

    /// The external helper program decoding runs through, if any.
    pub fn external_tool(self) -> Option<&'static str> {
        match self {
            ImageFormat::Xcf => Some(XCF_TOOL),
            _ => None,
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        match self {
            ImageFormat::Bmp => true,
            ImageFormat::Jpeg => false,
            ImageFormat::Png => true,
            ImageFormat::Tiff | ImageFormat::Lsm => true,
            ImageFormat::WebP => true,
            ImageFormat::Xcf => true,
        }
    }

    /// Whether the format can carry more than 8 bits per sample.
    pub fn supports_high_bit_depth(self) -> bool {
        matches!(
            self,
            ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Lsm
        )
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Bmp => "BMP",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Lsm => "LSM",
            ImageFormat::WebP => "WebP",
            ImageFormat::Xcf => "XCF",
        };
        f.write_str(name)
    }
}
