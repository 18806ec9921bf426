//! Per-format codec configuration.
//!
//! [`CodecConfig`] bundles every format-specific override into a single
//! value that can be handed to a read or write request. Unset fields fall
//! back to each codec's defaults.

/// TIFF compression schemes the encoder can produce.
#[cfg(feature = "tiff")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TiffCompression {
    /// No compression.
    None,
    #[default]
    Lzw,
    Deflate,
    Packbits,
}

/// Format-specific configuration overrides.
///
/// # Example
///
/// ```ignore
/// use zenraster::{CodecConfig, WriteRequest};
///
/// let config = CodecConfig::default().with_jpeg_quality(92);
/// let request = WriteRequest::new(&pixels).with_config(&config);
/// ```
#[derive(Clone, Default)]
#[non_exhaustive]
pub struct CodecConfig {
    /// JPEG quality 1..=100. Defaults to 75, matching libjpeg.
    #[cfg(feature = "jpeg")]
    pub jpeg_quality: Option<u8>,

    /// PNG compression level 0..=9 (zlib convention, 0 = fastest).
    #[cfg(feature = "png")]
    pub png_compression: Option<u8>,

    /// TIFF compression scheme. Defaults to LZW.
    #[cfg(feature = "tiff")]
    pub tiff_compression: Option<TiffCompression>,

    /// Free-form description stored as the TIFF ImageDescription tag.
    #[cfg(feature = "tiff")]
    pub description: Option<String>,

    /// External converter binary for XCF input. Defaults to `xcf2png`.
    #[cfg(feature = "xcf")]
    pub xcf_tool: Option<String>,

    /// Drop the alpha channel before encoding.
    pub strip_alpha: bool,
}

impl CodecConfig {
    /// Set JPEG quality (1..=100).
    #[cfg(feature = "jpeg")]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    /// Set PNG compression level (0..=9).
    #[cfg(feature = "png")]
    pub fn with_png_compression(mut self, level: u8) -> Self {
        self.png_compression = Some(level);
        self
    }

    /// Set the TIFF compression scheme.
    #[cfg(feature = "tiff")]
    pub fn with_tiff_compression(mut self, compression: TiffCompression) -> Self {
        self.tiff_compression = Some(compression);
        self
    }

    /// Set the description written to TIFF output.
    #[cfg(feature = "tiff")]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the external converter used for XCF input.
    #[cfg(feature = "xcf")]
    pub fn with_xcf_tool(mut self, tool: impl Into<String>) -> Self {
        self.xcf_tool = Some(tool.into());
        self
    }

    /// Drop the alpha channel before encoding.
    pub fn with_strip_alpha(mut self, strip: bool) -> Self {
        self.strip_alpha = strip;
        self
    }
}

impl core::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut d = f.debug_struct("CodecConfig");

        #[cfg(feature = "jpeg")]
        d.field("jpeg_quality", &self.jpeg_quality);
        #[cfg(feature = "png")]
        d.field("png_compression", &self.png_compression);
        #[cfg(feature = "tiff")]
        {
            d.field("tiff_compression", &self.tiff_compression);
            d.field("description", &self.description);
        }
        #[cfg(feature = "xcf")]
        d.field("xcf_tool", &self.xcf_tool);
        d.field("strip_alpha", &self.strip_alpha);

        d.finish()
    }
}
