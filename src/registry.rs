//! Runtime codec registry for enabling/disabling formats.

use crate::ImageFormat;

/// Set of image formats represented as bitflags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FormatSet(u8);

impl FormatSet {
    const EMPTY: Self = FormatSet(0);
    const BMP: u8 = 1 << 0;
    const JPEG: u8 = 1 << 1;
    const PNG: u8 = 1 << 2;
    const TIFF: u8 = 1 << 3;
    const LSM: u8 = 1 << 4;
    const WEBP: u8 = 1 << 5;
    const XCF: u8 = 1 << 6;

    #[allow(unused_mut)]
    fn all_compiled_read() -> Self {
        let mut bits = 0u8;

        #[cfg(feature = "bmp")]
        {
            bits |= Self::BMP;
        }
        #[cfg(feature = "jpeg")]
        {
            bits |= Self::JPEG;
        }
        #[cfg(feature = "png")]
        {
            bits |= Self::PNG;
        }
        #[cfg(feature = "tiff")]
        {
            bits |= Self::TIFF;
        }
        #[cfg(feature = "lsm")]
        {
            bits |= Self::LSM;
        }
        #[cfg(feature = "webp")]
        {
            bits |= Self::WEBP;
        }
        #[cfg(feature = "xcf")]
        {
            bits |= Self::XCF;
        }

        FormatSet(bits)
    }

    fn all_compiled_write() -> Self {
        let read = Self::all_compiled_read();
        // LSM and XCF are read-only formats
        FormatSet(read.0 & !(Self::LSM | Self::XCF))
    }

    fn bit(format: ImageFormat) -> u8 {
        match format {
            ImageFormat::Bmp => Self::BMP,
            ImageFormat::Jpeg => Self::JPEG,
            ImageFormat::Png => Self::PNG,
            ImageFormat::Tiff => Self::TIFF,
            ImageFormat::Lsm => Self::LSM,
            ImageFormat::WebP => Self::WEBP,
            ImageFormat::Xcf => Self::XCF,
        }
    }

    fn contains(self, format: ImageFormat) -> bool {
        (self.0 & Self::bit(format)) != 0
    }

    fn insert(&mut self, format: ImageFormat) {
        self.0 |= Self::bit(format);
    }

    fn remove(&mut self, format: ImageFormat) {
        self.0 &= !Self::bit(format);
    }

    fn iter(self) -> impl Iterator<Item = ImageFormat> {
        const ALL_FORMATS: [ImageFormat; 7] = [
            ImageFormat::Bmp,
            ImageFormat::Jpeg,
            ImageFormat::Png,
            ImageFormat::Tiff,
            ImageFormat::Lsm,
            ImageFormat::WebP,
            ImageFormat::Xcf,
        ];

        ALL_FORMATS.into_iter().filter(move |&f| self.contains(f))
    }
}

/// Whether decode support for a format was compiled into this build.
pub(crate) fn read_compiled(format: ImageFormat) -> bool {
    match format {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => true,
        #[cfg(not(feature = "bmp"))]
        ImageFormat::Bmp => false,

        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => true,
        #[cfg(not(feature = "jpeg"))]
        ImageFormat::Jpeg => false,

        #[cfg(feature = "png")]
        ImageFormat::Png => true,
        #[cfg(not(feature = "png"))]
        ImageFormat::Png => false,

        #[cfg(feature = "tiff")]
        ImageFormat::Tiff => true,
        #[cfg(not(feature = "tiff"))]
        ImageFormat::Tiff => false,

        #[cfg(feature = "lsm")]
        ImageFormat::Lsm => true,
        #[cfg(not(feature = "lsm"))]
        ImageFormat::Lsm => false,

        #[cfg(feature = "webp")]
        ImageFormat::WebP => true,
        #[cfg(not(feature = "webp"))]
        ImageFormat::WebP => false,

        #[cfg(feature = "xcf")]
        ImageFormat::Xcf => true,
        #[cfg(not(feature = "xcf"))]
        ImageFormat::Xcf => false,
    }
}

/// Whether encode support for a format was compiled into this build.
pub(crate) fn write_compiled(format: ImageFormat) -> bool {
    format.writable() && read_compiled(format)
}

/// Runtime codec registry.
///
/// Controls which codecs are enabled for a given operation. Compile-time
/// features determine which codecs are *available*, while the registry
/// controls which are *enabled* at runtime.
///
/// Registries are plain values passed by reference into requests; there
/// is no process-global registry to mutate.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    read_enabled: FormatSet,
    write_enabled: FormatSet,
}

impl CodecRegistry {
    /// All compiled-in codecs enabled.
    pub fn all() -> Self {
        Self {
            read_enabled: FormatSet::all_compiled_read(),
            write_enabled: FormatSet::all_compiled_write(),
        }
    }

    /// Nothing enabled; caller must opt in.
    pub fn none() -> Self {
        Self {
            read_enabled: FormatSet::EMPTY,
            write_enabled: FormatSet::EMPTY,
        }
    }

    /// Enable or disable decoding for a format.
    pub fn with_read(mut self, format: ImageFormat, enabled: bool) -> Self {
        if enabled {
            self.read_enabled.insert(format);
        } else {
            self.read_enabled.remove(format);
        }
        self
    }

    /// Enable or disable encoding for a format.
    pub fn with_write(mut self, format: ImageFormat, enabled: bool) -> Self {
        if enabled {
            self.write_enabled.insert(format);
        } else {
            self.write_enabled.remove(format);
        }
        self
    }

    /// Is this format available (compiled in) AND enabled for decoding?
    pub fn can_read(&self, format: ImageFormat) -> bool {
        self.read_enabled.contains(format) && read_compiled(format)
    }

    /// Is this format available, writable, AND enabled for encoding?
    pub fn can_write(&self, format: ImageFormat) -> bool {
        self.write_enabled.contains(format) && write_compiled(format)
    }

    /// Is this format usable in either direction?
    pub fn is_supported(&self, format: ImageFormat) -> bool {
        self.can_read(format) || self.can_write(format)
    }

    /// Formats that are both compiled in and enabled for decoding.
    pub fn readable_formats(&self) -> impl Iterator<Item = ImageFormat> {
        self.read_enabled
            .iter()
            .filter(|&f| self.can_read(f))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Formats that are both compiled in and enabled for encoding.
    pub fn writable_formats(&self) -> impl Iterator<Item = ImageFormat> {
        self.write_enabled
            .iter()
            .filter(|&f| self.can_write(f))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_registry() {
        let registry = CodecRegistry::all();

        #[cfg(feature = "png")]
        assert!(registry.can_read(ImageFormat::Png));
        #[cfg(feature = "tiff")]
        assert!(registry.can_write(ImageFormat::Tiff));
    }

    #[test]
    fn none_registry() {
        let registry = CodecRegistry::none();

        assert!(!registry.can_read(ImageFormat::Png));
        assert!(!registry.can_write(ImageFormat::Png));
        assert!(!registry.is_supported(ImageFormat::Png));
        assert_eq!(registry.readable_formats().count(), 0);
    }

    #[test]
    fn read_only_formats_never_encode() {
        let registry = CodecRegistry::all()
            .with_write(ImageFormat::Lsm, true)
            .with_write(ImageFormat::Xcf, true);

        // Enabling the bit cannot grant what the codec can't do
        assert!(!registry.can_write(ImageFormat::Lsm));
        assert!(!registry.can_write(ImageFormat::Xcf));

        #[cfg(feature = "lsm")]
        assert!(registry.can_read(ImageFormat::Lsm));
    }

    #[test]
    fn selective_enable() {
        let registry = CodecRegistry::none()
            .with_read(ImageFormat::Jpeg, true)
            .with_write(ImageFormat::WebP, true);

        #[cfg(feature = "jpeg")]
        assert!(registry.can_read(ImageFormat::Jpeg));
        #[cfg(feature = "webp")]
        assert!(registry.can_write(ImageFormat::WebP));

        assert!(!registry.can_read(ImageFormat::Png));
        assert!(!registry.can_write(ImageFormat::Jpeg));
    }

    #[test]
    fn toggle_format() {
        let registry = CodecRegistry::all().with_read(ImageFormat::Tiff, false);

        assert!(!registry.can_read(ImageFormat::Tiff));
        #[cfg(feature = "webp")]
        assert!(registry.is_supported(ImageFormat::WebP));
    }
}
