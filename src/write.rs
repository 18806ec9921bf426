//! Image writing: target resolution and codec dispatch.

use std::fs;
use std::path::Path;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::format::ImageFormat;
use crate::pixel::PixelData;
use crate::registry::CodecRegistry;

/// Image write request builder.
///
/// # Example
///
/// ```no_run
/// use zenraster::{PixelData, WriteRequest};
///
/// let pixels = PixelData::from_u8(vec![255, 0, 0], 1, 1, 3).unwrap();
/// WriteRequest::new(&pixels).write("red.png")?;
/// # Ok::<(), zenraster::Error>(())
/// ```
pub struct WriteRequest<'a> {
    pixels: &'a PixelData,
    format: Option<ImageFormat>,
    registry: Option<&'a CodecRegistry>,
    config: Option<&'a CodecConfig>,
}

impl<'a> WriteRequest<'a> {
    /// Create a write request for one image.
    ///
    /// The target format comes from [`with_format`](Self::with_format) or,
    /// failing that, the destination path's extension.
    pub fn new(pixels: &'a PixelData) -> Self {
        Self {
            pixels,
            format: None,
            registry: None,
            config: None,
        }
    }

    /// Set the target format explicitly.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Like [`with_format`](Self::with_format), from a name such as
    /// `"png"`. Unknown names are ignored.
    pub fn with_format_name(mut self, name: &str) -> Self {
        if let Some(format) = ImageFormat::from_name(name) {
            self.format = Some(format);
        }
        self
    }

    /// Set a codec registry to control which formats are enabled.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set format-specific codec configuration (quality, compression,
    /// alpha stripping).
    pub fn with_config(mut self, config: &'a CodecConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Encode and write to `path`.
    pub fn write(self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let format = self.resolve_format(Some(path))?;
        let bytes = self.encode_as(format)?;
        fs::write(path, bytes).map_err(|e| Error::io("writing output file", e))
    }

    /// Encode into a buffer. Requires an explicit format, since there is
    /// no destination extension to resolve one from.
    pub fn to_vec(self) -> Result<Vec<u8>, Error> {
        let format = self.resolve_format(None)?;
        self.encode_as(format)
    }

    /// Write several frames into one multi-page container at `path`.
    ///
    /// Exactly the images in `frames` are written, in order; the image
    /// this request was created with takes no part. Only multi-frame
    /// formats accept more than one image per file.
    pub fn write_multi(self, path: impl AsRef<Path>, frames: &[PixelData]) -> Result<(), Error> {
        write_frames(path.as_ref(), frames, self.format, self.registry, self.config)
    }

    /// Explicit format, then the destination extension.
    fn resolve_format(&self, destination: Option<&Path>) -> Result<ImageFormat, Error> {
        resolve_target(self.format, destination)
    }

    fn encode_as(&self, format: ImageFormat) -> Result<Vec<u8>, Error> {
        let default_registry = CodecRegistry::all();
        let registry = self.registry.unwrap_or(&default_registry);
        check_writable(registry, format)?;

        let default_config = CodecConfig::default();
        let config = self.config.unwrap_or(&default_config);
        log::debug!("encoding {:?} as {format}", self.pixels);

        let stripped;
        let pixels = if config.strip_alpha && self.pixels.has_alpha() {
            stripped = self.pixels.clone().strip_alpha();
            &stripped
        } else {
            self.pixels
        };
        dispatch_encode(format, pixels, config)
    }
}

fn resolve_target(
    hint: Option<ImageFormat>,
    destination: Option<&Path>,
) -> Result<ImageFormat, Error> {
    if let Some(format) = hint {
        return Ok(format);
    }
    destination
        .and_then(Path::extension)
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .and_then(|ext| ImageFormat::from_extension(&ext))
        .ok_or(Error::UnknownFormat)
}

fn check_writable(registry: &CodecRegistry, format: ImageFormat) -> Result<(), Error> {
    if registry.can_write(format) {
        return Ok(());
    }
    let detail = if !format.writable() {
        "it is a read-only format"
    } else if crate::registry::write_compiled(format) {
        "writing is disabled by the registry"
    } else {
        "support is not compiled in"
    };
    Err(Error::unsupported(format, detail))
}

/// Dispatch to the format's encoder.
fn dispatch_encode(
    format: ImageFormat,
    pixels: &PixelData,
    config: &CodecConfig,
) -> Result<Vec<u8>, Error> {
    match format {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => crate::codecs::bmp::encode(pixels, config),
        #[cfg(not(feature = "bmp"))]
        ImageFormat::Bmp => Err(Error::unsupported(format, "support is not compiled in")),

        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => crate::codecs::jpeg::encode(pixels, config),
        #[cfg(not(feature = "jpeg"))]
        ImageFormat::Jpeg => Err(Error::unsupported(format, "support is not compiled in")),

        #[cfg(feature = "png")]
        ImageFormat::Png => crate::codecs::png::encode(pixels, config),
        #[cfg(not(feature = "png"))]
        ImageFormat::Png => Err(Error::unsupported(format, "support is not compiled in")),

        #[cfg(feature = "tiff")]
        ImageFormat::Tiff => crate::codecs::tiff::encode(pixels, config),
        #[cfg(not(feature = "tiff"))]
        ImageFormat::Tiff => Err(Error::unsupported(format, "support is not compiled in")),

        #[cfg(feature = "webp")]
        ImageFormat::WebP => crate::codecs::webp::encode(pixels, config),
        #[cfg(not(feature = "webp"))]
        ImageFormat::WebP => Err(Error::unsupported(format, "support is not compiled in")),

        ImageFormat::Lsm => Err(Error::unsupported(format, "it is a read-only format")),
        ImageFormat::Xcf => Err(Error::unsupported(format, "it is a read-only format")),
    }
}

fn write_frames(
    path: &Path,
    frames: &[PixelData],
    hint: Option<ImageFormat>,
    registry: Option<&CodecRegistry>,
    config: Option<&CodecConfig>,
) -> Result<(), Error> {
    let format = resolve_target(hint, Some(path))?;

    let default_registry = CodecRegistry::all();
    let registry = registry.unwrap_or(&default_registry);
    check_writable(registry, format)?;

    if frames.is_empty() {
        return Err(Error::unrepresentable(format, "no frames to write"));
    }
    log::debug!("encoding {} frames as {format}", frames.len());

    let bytes = match format {
        #[cfg(feature = "tiff")]
        ImageFormat::Tiff => {
            let default_config = CodecConfig::default();
            let config = config.unwrap_or(&default_config);
            let prepared: Vec<PixelData>;
            let frames = if config.strip_alpha && frames.iter().any(|f| f.has_alpha()) {
                prepared = frames
                    .iter()
                    .map(|f| {
                        if f.has_alpha() {
                            f.clone().strip_alpha()
                        } else {
                            f.clone()
                        }
                    })
                    .collect();
                &prepared[..]
            } else {
                frames
            };
            crate::codecs::tiff::encode_frames(frames, config)?
        }
        #[cfg(not(feature = "tiff"))]
        ImageFormat::Tiff => {
            let _ = config;
            return Err(Error::unsupported(format, "support is not compiled in"));
        }
        _ => {
            return Err(Error::unsupported(
                format,
                "it cannot store more than one frame per file",
            ));
        }
    };
    fs::write(path, bytes).map_err(|e| Error::io("writing output file", e))
}

/// Write a single image to `path`, resolving the format from its extension.
pub fn write(path: impl AsRef<Path>, pixels: &PixelData) -> Result<(), Error> {
    WriteRequest::new(pixels).write(path)
}

/// Write several frames into one multi-page container at `path`.
pub fn write_multi(path: impl AsRef<Path>, frames: &[PixelData]) -> Result<(), Error> {
    write_frames(path.as_ref(), frames, None, None, None)
}
