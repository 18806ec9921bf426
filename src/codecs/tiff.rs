//! TIFF codec adapter built on the `tiff` crate.
//!
//! Handles single and multi-page files, 8/16-bit integer and 32-bit
//! float samples, and the common descriptive tags. The multi-page
//! surface is [`TiffFrameReader`], which walks IFDs one directory at a
//! time; the LSM codec shares the per-directory decode path.

use std::io::{Cursor, Read, Seek, Write};

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype;
use tiff::encoder::{Compression, DeflateLevel, ImageEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

use crate::config::{CodecConfig, TiffCompression};
use crate::error::Error;
use crate::limits::{self, Limits};
use crate::metadata::{MetaValue, Metadata};
use crate::pixel::PixelData;
use crate::read::DecodeOutput;
use crate::ImageFormat;

pub(crate) fn map_decode_err(format: ImageFormat, e: tiff::TiffError) -> Error {
    match e {
        tiff::TiffError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Error::corrupt(format, "unexpected end of data")
        }
        tiff::TiffError::IoError(e) => Error::io("decoding TIFF container", e),
        tiff::TiffError::UnsupportedError(e) => Error::variant(format, e.to_string()),
        other => Error::corrupt(format, other.to_string()),
    }
}

fn map_encode_err(e: tiff::TiffError) -> Error {
    match e {
        tiff::TiffError::IoError(e) => Error::io("encoding TIFF", e),
        other => Error::unrepresentable(ImageFormat::Tiff, other.to_string()),
    }
}

/// Decode the directory the decoder is currently positioned on.
///
/// Shared with the LSM codec, which reports errors under its own format.
pub(crate) fn read_frame<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    format: ImageFormat,
    limits: Option<&Limits>,
) -> Result<PixelData, Error> {
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| map_decode_err(format, e))?;
    let color = decoder.colortype().map_err(|e| map_decode_err(format, e))?;

    let (channels, bits) = match color {
        ColorType::Gray(b) => (1u8, b),
        ColorType::GrayA(b) => (2, b),
        ColorType::RGB(b) => (3, b),
        ColorType::RGBA(b) => (4, b),
        other => {
            return Err(Error::variant(format, format!("{:?} color model", other)));
        }
    };

    if let Some(limits) = limits {
        limits
            .check_dimensions(u64::from(width), u64::from(height))
            .map_err(Error::limit)?;
        let sample_bytes = u64::from(bits.div_ceil(8).max(1)) * u64::from(channels);
        let bytes = limits::buffer_size(u64::from(width), u64::from(height), sample_bytes)
            .ok_or_else(|| Error::corrupt(format, "image dimensions overflow"))?;
        limits.check_memory(bytes).map_err(Error::limit)?;
    }

    let result = decoder.read_image().map_err(|e| map_decode_err(format, e))?;

    let (w, h) = (width as usize, height as usize);
    let pixels = match result {
        DecodingResult::U8(buf) => PixelData::from_u8(buf, w, h, channels),
        DecodingResult::U16(buf) => PixelData::from_u16(buf, w, h, channels),
        DecodingResult::F32(buf) => {
            if channels == 2 {
                return Err(Error::variant(format, "32-bit float gray+alpha"));
            }
            PixelData::from_f32(buf, w, h, channels)
        }
        _ => return Err(Error::variant(format, "unsupported sample format")),
    }
    .ok_or_else(|| Error::corrupt(format, "decoded buffer shape mismatch"))?;

    Ok(pixels)
}

fn tag_text<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag, key: &str, meta: &mut Metadata) {
    if let Ok(Some(value)) = decoder.find_tag(tag) {
        if let Ok(text) = value.into_string() {
            meta.push(key, MetaValue::Text(text));
        }
    }
}

fn tag_int<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag, key: &str, meta: &mut Metadata) {
    if let Ok(Some(value)) = decoder.find_tag(tag) {
        if let Ok(v) = value.into_u16() {
            meta.push(key, MetaValue::Int(i64::from(v)));
        }
    }
}

fn tag_float<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag, key: &str, meta: &mut Metadata) {
    if let Ok(Some(value)) = decoder.find_tag(tag) {
        if let Ok(v) = value.into_f64() {
            meta.push(key, MetaValue::Float(v));
        }
    }
}

fn standard_tags<R: Read + Seek>(decoder: &mut Decoder<R>) -> Metadata {
    let mut meta = Metadata::new();
    tag_text(decoder, Tag::ImageDescription, "ImageDescription", &mut meta);
    tag_int(decoder, Tag::Compression, "Compression", &mut meta);
    tag_float(decoder, Tag::XResolution, "XResolution", &mut meta);
    tag_float(decoder, Tag::YResolution, "YResolution", &mut meta);
    tag_int(decoder, Tag::ResolutionUnit, "ResolutionUnit", &mut meta);
    tag_text(decoder, Tag::Software, "Software", &mut meta);
    tag_text(decoder, Tag::DateTime, "DateTime", &mut meta);
    meta
}

/// Decode the first directory of a TIFF.
pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let mut decoder = Decoder::new(Cursor::new(data))
        .map_err(|e| map_decode_err(ImageFormat::Tiff, e))?;
    let pixels = read_frame(&mut decoder, ImageFormat::Tiff, limits)?;
    let metadata = want_metadata.then(|| standard_tags(&mut decoder));
    Ok(DecodeOutput { pixels, metadata })
}

/// Directory-at-a-time reader over an owned TIFF blob.
///
/// Yields one frame per IFD in file order. Any error is terminal; the
/// reader will not attempt to resynchronize past a bad directory.
pub(crate) struct TiffFrameReader {
    decoder: Decoder<Cursor<Vec<u8>>>,
    limits: Option<Limits>,
    first: bool,
    done: bool,
}

impl TiffFrameReader {
    pub(crate) fn new(data: Vec<u8>, limits: Option<&Limits>) -> Result<Self, Error> {
        let decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| map_decode_err(ImageFormat::Tiff, e))?;
        Ok(TiffFrameReader {
            decoder,
            limits: limits.cloned(),
            first: true,
            done: false,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Option<Result<PixelData, Error>> {
        if self.done {
            return None;
        }
        if self.first {
            self.first = false;
        } else {
            if !self.decoder.more_images() {
                self.done = true;
                return None;
            }
            if let Err(e) = self.decoder.next_image() {
                self.done = true;
                return Some(Err(map_decode_err(ImageFormat::Tiff, e)));
            }
        }
        let result = read_frame(&mut self.decoder, ImageFormat::Tiff, self.limits.as_ref());
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

fn compression_for(compression: TiffCompression) -> Compression {
    match compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::Deflate => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::Packbits => Compression::Packbits,
    }
}

fn apply_description<W, C, K>(
    image: &mut ImageEncoder<'_, W, C, K>,
    description: Option<&str>,
) -> Result<(), Error>
where
    W: Write + Seek,
    C: colortype::ColorType,
    K: TiffKind,
{
    if let Some(text) = description {
        image
            .encoder()
            .write_tag(Tag::ImageDescription, text)
            .map_err(map_encode_err)?;
    }
    Ok(())
}

fn write_frame<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    pixels: &PixelData,
    description: Option<&str>,
) -> Result<(), Error> {
    let width = pixels.width();
    let height = pixels.height();

    match pixels {
        PixelData::Gray8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            let mut image = encoder
                .new_image::<colortype::Gray8>(width, height)
                .map_err(map_encode_err)?;
            apply_description(&mut image, description)?;
            image
                .write_data(bytemuck::cast_slice(buf.as_ref()))
                .map_err(map_encode_err)?;
        }
        PixelData::Rgb8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            let mut image = encoder
                .new_image::<colortype::RGB8>(width, height)
                .map_err(map_encode_err)?;
            apply_description(&mut image, description)?;
            image
                .write_data(bytemuck::cast_slice(buf.as_ref()))
                .map_err(map_encode_err)?;
        }
        PixelData::Rgba8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            let mut image = encoder
                .new_image::<colortype::RGBA8>(width, height)
                .map_err(map_encode_err)?;
            apply_description(&mut image, description)?;
            image
                .write_data(bytemuck::cast_slice(buf.as_ref()))
                .map_err(map_encode_err)?;
        }
        PixelData::Gray16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            let mut image = encoder
                .new_image::<colortype::Gray16>(width, height)
                .map_err(map_encode_err)?;
            apply_description(&mut image, description)?;
            image
                .write_data(bytemuck::cast_slice(buf.as_ref()))
                .map_err(map_encode_err)?;
        }
        PixelData::Rgb16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            let mut image = encoder
                .new_image::<colortype::RGB16>(width, height)
                .map_err(map_encode_err)?;
            apply_description(&mut image, description)?;
            image
                .write_data(bytemuck::cast_slice(buf.as_ref()))
                .map_err(map_encode_err)?;
        }
        PixelData::Rgba16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            let mut image = encoder
                .new_image::<colortype::RGBA16>(width, height)
                .map_err(map_encode_err)?;
            apply_description(&mut image, description)?;
            image
                .write_data(bytemuck::cast_slice(buf.as_ref()))
                .map_err(map_encode_err)?;
        }
        PixelData::GrayA8(_) | PixelData::GrayA16(_) => {
            return Err(Error::unrepresentable(
                ImageFormat::Tiff,
                "gray+alpha; strip the alpha channel or expand to RGBA first",
            ));
        }
        other => {
            return Err(Error::unrepresentable(
                ImageFormat::Tiff,
                format!("{:?} pixels; the writer stores 8 or 16 bit integers", other),
            ));
        }
    }

    Ok(())
}

/// Encode a single-page TIFF.
pub(crate) fn encode(pixels: &PixelData, config: &CodecConfig) -> Result<Vec<u8>, Error> {
    encode_frames(std::slice::from_ref(pixels), config)
}

/// Encode one page per element of `frames`, in order.
pub(crate) fn encode_frames(frames: &[PixelData], config: &CodecConfig) -> Result<Vec<u8>, Error> {
    let compression = compression_for(config.tiff_compression.unwrap_or_default());
    let description = config.description.as_deref();

    let mut output = Cursor::new(Vec::new());
    {
        let encoder = TiffEncoder::new(&mut output).map_err(map_encode_err)?;
        let mut encoder = encoder.with_compression(compression);
        for pixels in frames {
            write_frame(&mut encoder, pixels, description)?;
        }
    }
    Ok(output.into_inner())
}
