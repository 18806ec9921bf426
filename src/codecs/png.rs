//! PNG codec adapter using the png crate.

use std::io::Cursor;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::limits::Limits;
use crate::pixel::PixelData;
use crate::read::DecodeOutput;
use crate::{ImageFormat, MetaValue, Metadata};

fn map_decode_err(e: png::DecodingError) -> Error {
    match e {
        png::DecodingError::IoError(e) => Error::io("decoding PNG", e),
        png::DecodingError::LimitsExceeded => Error::limit("png decoder limit"),
        other => Error::corrupt(ImageFormat::Png, other.to_string()),
    }
}

fn map_encode_err(e: png::EncodingError) -> Error {
    match e {
        png::EncodingError::IoError(e) => Error::io("encoding PNG", e),
        other => Error::unrepresentable(ImageFormat::Png, other.to_string()),
    }
}

/// Decode PNG to pixels.
///
/// Indexed images are expanded to RGB(A) and sub-byte gray depths are
/// widened to 8 bits. 16-bit channels come out in host byte order.
pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let cursor = Cursor::new(data);
    let mut decoder = png::Decoder::new(cursor);
    decoder.set_transformations(png::Transformations::EXPAND);

    let mut reader = decoder.read_info().map_err(map_decode_err)?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    let icc_profile = info.icc_profile.as_ref().map(|p| p.to_vec());
    let gamma = info.source_gamma.map(|g| g.into_value());

    if let Some(limits) = limits {
        limits
            .check_dimensions(u64::from(width), u64::from(height))
            .map_err(Error::limit)?;
    }

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| Error::corrupt(ImageFormat::Png, "output buffer size overflows"))?;
    if let Some(limits) = limits {
        limits
            .check_memory(buffer_size as u64)
            .map_err(Error::limit)?;
    }

    let mut raw_pixels = vec![0u8; buffer_size];
    let output_info = reader.next_frame(&mut raw_pixels).map_err(map_decode_err)?;
    raw_pixels.truncate(output_info.buffer_size());

    let (color_type, bit_depth) = reader.output_color_type();
    let channels = match color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        // EXPAND replaces indexed output with RGB(A)
        png::ColorType::Indexed => {
            return Err(Error::corrupt(
                ImageFormat::Png,
                "indexed output survived palette expansion",
            ));
        }
    };

    let w = width as usize;
    let h = height as usize;
    let pixels = match bit_depth {
        png::BitDepth::Sixteen => {
            // 16-bit samples are big-endian on the wire
            let words: Vec<u16> = raw_pixels
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            PixelData::from_u16(words, w, h, channels)
        }
        _ => PixelData::from_u8(raw_pixels, w, h, channels),
    }
    .ok_or_else(|| Error::corrupt(ImageFormat::Png, "decoded buffer shape mismatch"))?;

    let metadata = want_metadata.then(|| {
        let mut meta = Metadata::new();
        if let Some(gamma) = gamma {
            meta.push("gamma", MetaValue::Float(f64::from(gamma)));
        }
        if let Some(icc) = icc_profile {
            meta.push("icc_profile", MetaValue::Bytes(icc));
        }
        meta
    });

    Ok(DecodeOutput { pixels, metadata })
}

fn compression_for(level: u8) -> png::Compression {
    match level {
        0..=2 => png::Compression::Fast,
        3..=6 => png::Compression::Balanced,
        _ => png::Compression::High,
    }
}

fn be_bytes(samples: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        out.extend_from_slice(&s.to_be_bytes());
    }
    out
}

/// Encode pixels to PNG. All integer variants are representable;
/// float data is not.
pub(crate) fn encode(pixels: &PixelData, config: &CodecConfig) -> Result<Vec<u8>, Error> {
    use png::{BitDepth, ColorType};

    let (color, depth, bytes) = match pixels {
        PixelData::Gray8(_) => (ColorType::Grayscale, BitDepth::Eight, pixels.as_bytes()),
        PixelData::GrayA8(_) => (
            ColorType::GrayscaleAlpha,
            BitDepth::Eight,
            pixels.as_bytes(),
        ),
        PixelData::Rgb8(_) => (ColorType::Rgb, BitDepth::Eight, pixels.as_bytes()),
        PixelData::Rgba8(_) => (ColorType::Rgba, BitDepth::Eight, pixels.as_bytes()),
        PixelData::Gray16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            (
                ColorType::Grayscale,
                BitDepth::Sixteen,
                be_bytes(bytemuck::cast_slice(buf.as_ref())),
            )
        }
        PixelData::GrayA16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            (
                ColorType::GrayscaleAlpha,
                BitDepth::Sixteen,
                be_bytes(bytemuck::cast_slice(buf.as_ref())),
            )
        }
        PixelData::Rgb16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            (
                ColorType::Rgb,
                BitDepth::Sixteen,
                be_bytes(bytemuck::cast_slice(buf.as_ref())),
            )
        }
        PixelData::Rgba16(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            (
                ColorType::Rgba,
                BitDepth::Sixteen,
                be_bytes(bytemuck::cast_slice(buf.as_ref())),
            )
        }
        other => {
            return Err(Error::unrepresentable(
                ImageFormat::Png,
                format!("{:?} pixels; PNG stores 8 or 16 bit integers", other),
            ));
        }
    };

    let mut output = Vec::new();
    let mut encoder = png::Encoder::new(&mut output, pixels.width(), pixels.height());
    encoder.set_color(color);
    encoder.set_depth(depth);
    if let Some(level) = config.png_compression {
        encoder.set_compression(compression_for(level));
    }

    let mut writer = encoder.write_header().map_err(map_encode_err)?;
    writer.write_image_data(&bytes).map_err(map_encode_err)?;
    writer.finish().map_err(map_encode_err)?;

    Ok(output)
}
