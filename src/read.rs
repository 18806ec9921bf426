//! Image reading: format resolution and codec dispatch.

use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::format::ImageFormat;
use crate::frames::FrameSequence;
use crate::limits::Limits;
use crate::metadata::Metadata;
use crate::pixel::PixelData;
use crate::registry::CodecRegistry;

/// Decoded image output.
#[derive(Debug)]
pub struct DecodeOutput {
    /// Decoded pixel data in a typed buffer.
    pub pixels: PixelData,
    /// Container metadata, present only when requested.
    pub metadata: Option<Metadata>,
}

impl DecodeOutput {
    /// Image width in pixels (convenience accessor).
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Image height in pixels (convenience accessor).
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

enum Source<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Image read request builder.
///
/// # Example
///
/// ```no_run
/// use zenraster::ReadRequest;
///
/// let output = ReadRequest::from_path("photo.jpg").read()?;
/// println!("{}x{}", output.width(), output.height());
/// # Ok::<(), zenraster::Error>(())
/// ```
pub struct ReadRequest<'a> {
    source: Source<'a>,
    format: Option<ImageFormat>,
    registry: Option<&'a CodecRegistry>,
    limits: Option<&'a Limits>,
    config: Option<&'a CodecConfig>,
    want_metadata: bool,
    gray: bool,
}

impl<'a> ReadRequest<'a> {
    /// Read from a file on disk.
    ///
    /// Format is resolved from the content, with the file extension as a
    /// fallback for data no signature matches.
    pub fn from_path(path: &'a (impl AsRef<Path> + ?Sized)) -> Self {
        Self::with_source(Source::Path(path.as_ref()))
    }

    /// Read from bytes already in memory.
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::with_source(Source::Bytes(data))
    }

    fn with_source(source: Source<'a>) -> Self {
        Self {
            source,
            format: None,
            registry: None,
            limits: None,
            config: None,
            want_metadata: false,
            gray: false,
        }
    }

    /// Skip detection and treat the source as `format`.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Like [`with_format`](Self::with_format), from a name such as
    /// `"png"`. Unknown names are ignored and detection proceeds as usual.
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

    /// Set resource limits enforced during decoding.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set format-specific codec configuration, such as the external
    /// converter an XCF read runs.
    pub fn with_config(mut self, config: &'a CodecConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Also extract container metadata.
    pub fn with_metadata(mut self, want: bool) -> Self {
        self.want_metadata = want;
        self
    }

    /// Convert the decoded image to single-channel grayscale.
    pub fn with_gray(mut self, gray: bool) -> Self {
        self.gray = gray;
        self
    }

    /// Decode a single image.
    ///
    /// Multi-page containers yield their first page; for LSM stacks, the
    /// first full-resolution page.
    pub fn read(self) -> Result<DecodeOutput, Error> {
        let default_registry = CodecRegistry::all();
        let registry = self.registry.unwrap_or(&default_registry);

        let data = self.load()?;
        let format = self.resolve_format(&data)?;
        check_readable(registry, format)?;
        log::debug!("decoding {format} from {} bytes", data.len());

        let mut output = self.dispatch(format, &data, self.want_metadata)?;
        if self.gray {
            output.pixels = output.pixels.to_gray();
        }
        Ok(output)
    }

    /// Open the source as a sequence of lazily decoded frames.
    ///
    /// Single-frame formats come back as a one-element sequence. Frames
    /// are yielded as stored; grayscale conversion and metadata requests
    /// apply to [`read`](Self::read) only.
    pub fn read_multi(self) -> Result<FrameSequence, Error> {
        let default_registry = CodecRegistry::all();
        let registry = self.registry.unwrap_or(&default_registry);

        let data = self.load()?;
        let format = self.resolve_format(&data)?;
        check_readable(registry, format)?;
        log::debug!("opening {format} frame sequence from {} bytes", data.len());

        match format {
            #[cfg(feature = "tiff")]
            ImageFormat::Tiff => {
                let reader =
                    crate::codecs::tiff::TiffFrameReader::new(data.into_owned(), self.limits)?;
                Ok(FrameSequence::from_tiff(reader))
            }
            #[cfg(feature = "lsm")]
            ImageFormat::Lsm => {
                let reader =
                    crate::codecs::lsm::LsmFrameReader::new(data.into_owned(), self.limits)?;
                Ok(FrameSequence::from_lsm(reader))
            }
            _ => {
                let output = self.dispatch(format, &data, false)?;
                Ok(FrameSequence::single(output.pixels))
            }
        }
    }

    fn load(&self) -> Result<Cow<'a, [u8]>, Error> {
        match self.source {
            Source::Path(p) => fs::read(p)
                .map(Cow::Owned)
                .map_err(|e| Error::io("reading input file", e)),
            Source::Bytes(b) => Ok(Cow::Borrowed(b)),
        }
    }

    fn path(&self) -> Option<&Path> {
        match self.source {
            Source::Path(p) => Some(p),
            Source::Bytes(_) => None,
        }
    }

    fn extension(&self) -> Option<String> {
        match self.source {
            Source::Path(p) => p.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()),
            Source::Bytes(_) => None,
        }
    }

    /// Explicit hint, then content, then extension.
    fn resolve_format(&self, data: &[u8]) -> Result<ImageFormat, Error> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let extension = self.extension();
        if let Some(detected) = ImageFormat::detect(data) {
            // An .lsm stack is TIFF on disk; its extension picks the
            // microscopy reader over the plain TIFF one.
            if detected == ImageFormat::Tiff && extension.as_deref() == Some("lsm") {
                return Ok(ImageFormat::Lsm);
            }
            return Ok(detected);
        }
        extension
            .and_then(|ext| ImageFormat::from_extension(&ext))
            .ok_or(Error::UnknownFormat)
    }

    /// Dispatch to the format's decoder.
    fn dispatch(
        &self,
        format: ImageFormat,
        data: &[u8],
        want_metadata: bool,
    ) -> Result<DecodeOutput, Error> {
        match format {
            #[cfg(feature = "bmp")]
            ImageFormat::Bmp => crate::codecs::bmp::decode(data, self.limits, want_metadata),
            #[cfg(not(feature = "bmp"))]
            ImageFormat::Bmp => Err(Error::unsupported(format, "support is not compiled in")),

            #[cfg(feature = "jpeg")]
            ImageFormat::Jpeg => crate::codecs::jpeg::decode(data, self.limits, want_metadata),
            #[cfg(not(feature = "jpeg"))]
            ImageFormat::Jpeg => Err(Error::unsupported(format, "support is not compiled in")),

            #[cfg(feature = "png")]
            ImageFormat::Png => crate::codecs::png::decode(data, self.limits, want_metadata),
            #[cfg(not(feature = "png"))]
            ImageFormat::Png => Err(Error::unsupported(format, "support is not compiled in")),

            #[cfg(feature = "tiff")]
            ImageFormat::Tiff => crate::codecs::tiff::decode(data, self.limits, want_metadata),
            #[cfg(not(feature = "tiff"))]
            ImageFormat::Tiff => Err(Error::unsupported(format, "support is not compiled in")),

            #[cfg(feature = "lsm")]
            ImageFormat::Lsm => crate::codecs::lsm::decode(data, self.limits, want_metadata),
            #[cfg(not(feature = "lsm"))]
            ImageFormat::Lsm => Err(Error::unsupported(format, "support is not compiled in")),

            #[cfg(feature = "webp")]
            ImageFormat::WebP => crate::codecs::webp::decode(data, self.limits, want_metadata),
            #[cfg(not(feature = "webp"))]
            ImageFormat::WebP => Err(Error::unsupported(format, "support is not compiled in")),

            #[cfg(feature = "xcf")]
            ImageFormat::Xcf => {
                let default_config = CodecConfig::default();
                let config = self.config.unwrap_or(&default_config);
                // The converter wants a real file; only blob input needs
                // a temporary one.
                match self.path() {
                    Some(p) => crate::codecs::xcf::decode_path(p, config, self.limits, want_metadata),
                    None => crate::codecs::xcf::decode_blob(data, config, self.limits, want_metadata),
                }
            }
            #[cfg(not(feature = "xcf"))]
            ImageFormat::Xcf => Err(Error::unsupported(format, "support is not compiled in")),
        }
    }
}

fn check_readable(registry: &CodecRegistry, format: ImageFormat) -> Result<(), Error> {
    if registry.can_read(format) {
        return Ok(());
    }
    let detail = if crate::registry::read_compiled(format) {
        "reading is disabled by the registry"
    } else {
        "support is not compiled in"
    };
    Err(Error::unsupported(format, detail))
}

/// Read a single image from a file, detecting its format.
pub fn read(path: impl AsRef<Path>) -> Result<PixelData, Error> {
    Ok(ReadRequest::from_path(path.as_ref()).read()?.pixels)
}

/// Read a single image from an in-memory buffer.
pub fn read_from_blob(data: &[u8]) -> Result<PixelData, Error> {
    Ok(ReadRequest::from_bytes(data).read()?.pixels)
}

/// Open every frame of a container file.
pub fn read_multi(path: impl AsRef<Path>) -> Result<FrameSequence, Error> {
    ReadRequest::from_path(path.as_ref()).read_multi()
}

/// Identify a file's format from its leading bytes.
///
/// Detection is purely content-based, so a file and a blob of the same
/// bytes always agree and a misleading extension changes nothing.
pub fn detect_format(path: impl AsRef<Path>) -> Result<ImageFormat, Error> {
    let file = fs::File::open(path.as_ref()).map_err(|e| Error::io("opening input file", e))?;
    let mut head = Vec::with_capacity(64);
    file.take(64)
        .read_to_end(&mut head)
        .map_err(|e| Error::io("reading input file", e))?;
    detect_format_from_blob(&head)
}

/// Identify a format from in-memory bytes.
pub fn detect_format_from_blob(data: &[u8]) -> Result<ImageFormat, Error> {
    ImageFormat::detect(data).ok_or(Error::UnknownFormat)
}

/// Whether `name` names a format with at least one compiled-in codec.
///
/// Never fails; unknown names are simply unsupported.
pub fn supports_format(name: &str) -> bool {
    ImageFormat::from_name(name).is_some_and(|f| CodecRegistry::all().is_supported(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_stores_hint() {
        let request = ReadRequest::from_bytes(b"test").with_format(ImageFormat::Jpeg);
        assert_eq!(request.format, Some(ImageFormat::Jpeg));

        let request = ReadRequest::from_bytes(b"test").with_format_name("no such format");
        assert_eq!(request.format, None);
    }

    #[test]
    fn unrecognized_blob_is_unknown_format() {
        let err = ReadRequest::from_bytes(b"plainly not an image")
            .read()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ReadRequest::from_path("/no/such/file.png").read().unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn supports_format_never_fails() {
        assert!(!supports_format("definitely-not-a-format"));
        #[cfg(feature = "png")]
        assert!(supports_format("png"));
    }

    #[cfg(feature = "png")]
    fn sample_png() -> Vec<u8> {
        let pixels = PixelData::from_u8(
            vec![200, 30, 30, 200, 30, 30, 10, 10, 10, 10, 10, 10],
            2,
            2,
            3,
        )
        .unwrap();
        crate::codecs::png::encode(&pixels, &CodecConfig::default()).unwrap()
    }

    #[cfg(feature = "png")]
    #[test]
    fn reads_png_from_blob() {
        let output = ReadRequest::from_bytes(&sample_png()).read().unwrap();
        assert_eq!((output.width(), output.height()), (2, 2));
        assert!(output.metadata.is_none());
    }

    #[cfg(feature = "png")]
    #[test]
    fn file_and_blob_reads_agree() {
        let data = sample_png();
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(file.path(), &data).unwrap();

        let from_file = ReadRequest::from_path(file.path()).read().unwrap();
        let from_blob = ReadRequest::from_bytes(&data).read().unwrap();
        assert_eq!(from_file.pixels.as_bytes(), from_blob.pixels.as_bytes());
    }

    #[cfg(feature = "png")]
    #[test]
    fn content_beats_a_lying_extension() {
        let file = tempfile::Builder::new().suffix(".bmp").tempfile().unwrap();
        std::fs::write(file.path(), sample_png()).unwrap();

        // Sniffing runs before the extension is consulted, so this
        // decodes as PNG even with a BMP name.
        let output = ReadRequest::from_path(file.path()).read().unwrap();
        assert_eq!((output.width(), output.height()), (2, 2));
    }

    #[cfg(all(feature = "png", feature = "bmp"))]
    #[test]
    fn explicit_hint_overrides_content() {
        let err = ReadRequest::from_bytes(&sample_png())
            .with_format(ImageFormat::Bmp)
            .read()
            .unwrap_err();
        // The hint routed the data to the BMP codec, which rejected it.
        assert_eq!(err.format(), Some(ImageFormat::Bmp));
    }

    #[cfg(feature = "png")]
    #[test]
    fn registry_can_disable_reading() {
        let registry = CodecRegistry::none();
        let err = ReadRequest::from_bytes(&sample_png())
            .with_registry(&registry)
            .read()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFormat {
                format: ImageFormat::Png,
                ..
            }
        ));
        assert!(err.to_string().contains("disabled"));
    }

    #[cfg(feature = "png")]
    #[test]
    fn extension_rescues_unsniffable_content() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(file.path(), b"definitely not a png").unwrap();

        // No signature matches, so resolution falls back to the extension
        // and the PNG codec reports the corruption.
        let err = ReadRequest::from_path(file.path()).read().unwrap_err();
        assert_eq!(err.format(), Some(ImageFormat::Png));
    }

    #[cfg(feature = "png")]
    #[test]
    fn detection_agrees_between_file_and_blob() {
        let data = sample_png();
        let file = tempfile::Builder::new().suffix(".dat").tempfile().unwrap();
        std::fs::write(file.path(), &data).unwrap();

        assert_eq!(
            detect_format(file.path()).unwrap(),
            detect_format_from_blob(&data).unwrap()
        );
    }

    #[cfg(feature = "png")]
    #[test]
    fn gray_conversion_applies_after_decode() {
        let output = ReadRequest::from_bytes(&sample_png())
            .with_gray(true)
            .read()
            .unwrap();
        assert!(matches!(output.pixels, PixelData::GrayF32(_)));
    }

    #[cfg(feature = "png")]
    #[test]
    fn single_frame_format_yields_one_frame() {
        let mut frames = ReadRequest::from_bytes(&sample_png()).read_multi().unwrap();
        assert!(frames.next().unwrap().is_ok());
        assert!(frames.next().is_none());
    }

    #[cfg(feature = "png")]
    #[test]
    fn codecs_run_from_parallel_threads() {
        use rayon::prelude::*;

        let data = sample_png();
        (0..32).into_par_iter().for_each(|_| {
            let output = ReadRequest::from_bytes(&data).read().unwrap();
            assert_eq!(output.width(), 2);
        });
    }

    #[cfg(feature = "tiff")]
    #[test]
    fn multipage_tiff_yields_every_page() {
        let pages = [
            PixelData::from_u8(vec![1; 12], 2, 2, 3).unwrap(),
            PixelData::from_u8(vec![2; 12], 2, 2, 3).unwrap(),
            PixelData::from_u8(vec![3; 12], 2, 2, 3).unwrap(),
        ];
        let data = crate::codecs::tiff::encode_frames(&pages, &CodecConfig::default()).unwrap();

        let frames: Vec<_> = ReadRequest::from_bytes(&data)
            .read_multi()
            .unwrap()
            .collect();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.is_ok()));
    }

    #[cfg(feature = "tiff")]
    #[test]
    fn metadata_is_extracted_only_on_request() {
        let pixels = PixelData::from_u8(vec![9; 12], 2, 2, 3).unwrap();
        let config = CodecConfig::default().with_description("stage 4 capture");
        let data = crate::codecs::tiff::encode(&pixels, &config).unwrap();

        let plain = ReadRequest::from_bytes(&data).read().unwrap();
        assert!(plain.metadata.is_none());

        let with_meta = ReadRequest::from_bytes(&data)
            .with_metadata(true)
            .read()
            .unwrap();
        assert!(with_meta.metadata.unwrap().get("ImageDescription").is_some());
    }

    #[cfg(feature = "lsm")]
    #[test]
    fn lsm_extension_routes_past_thumbnails() {
        use std::io::Cursor;
        use tiff::encoder::{TiffEncoder, colortype};
        use tiff::tags::Tag;

        // Thumbnail directory first, then the full-resolution page.
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).unwrap();
            for (size, subfile) in [(1u32, 1u32), (4, 0)] {
                let mut image = encoder.new_image::<colortype::Gray8>(size, size).unwrap();
                image
                    .encoder()
                    .write_tag(Tag::NewSubfileType, subfile)
                    .unwrap();
                image.write_data(&vec![0u8; (size * size) as usize]).unwrap();
            }
        }
        let data = buf.into_inner();

        let file = tempfile::Builder::new().suffix(".lsm").tempfile().unwrap();
        std::fs::write(file.path(), &data).unwrap();

        // Content detection alone says TIFF.
        assert_eq!(detect_format(file.path()).unwrap(), ImageFormat::Tiff);

        // Reading through the path routes to the microscopy codec, which
        // skips the thumbnail.
        let output = ReadRequest::from_path(file.path()).read().unwrap();
        assert_eq!(output.width(), 4);

        // The same bytes read as plain TIFF give the first directory.
        let as_tiff = ReadRequest::from_bytes(&data).read().unwrap();
        assert_eq!(as_tiff.width(), 1);
    }
}
