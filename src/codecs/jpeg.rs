//! JPEG codec adapter over jpeg-decoder and jpeg-encoder.

use std::io::Cursor;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::limits::Limits;
use crate::pixel::PixelData;
use crate::read::DecodeOutput;
use crate::{ImageFormat, Metadata};

/// Baseline libjpeg default.
const DEFAULT_QUALITY: u8 = 75;

fn map_decode_err(e: jpeg_decoder::Error) -> Error {
    match e {
        jpeg_decoder::Error::Format(detail) => Error::corrupt(ImageFormat::Jpeg, detail),
        jpeg_decoder::Error::Unsupported(feature) => {
            Error::variant(ImageFormat::Jpeg, format!("{:?}", feature))
        }
        jpeg_decoder::Error::Io(e) => Error::io("decoding JPEG", e),
        other => Error::corrupt(ImageFormat::Jpeg, other.to_string()),
    }
}

/// Decode JPEG to pixels. CMYK input is folded to RGB.
pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(data));
    decoder.read_info().map_err(map_decode_err)?;

    let info = decoder
        .info()
        .ok_or_else(|| Error::corrupt(ImageFormat::Jpeg, "no frame header"))?;
    let w = usize::from(info.width);
    let h = usize::from(info.height);

    if let Some(limits) = limits {
        limits
            .check_dimensions(w as u64, h as u64)
            .map_err(Error::limit)?;
        let bytes_per_pixel = match info.pixel_format {
            jpeg_decoder::PixelFormat::L8 => 1u64,
            jpeg_decoder::PixelFormat::L16 => 2,
            jpeg_decoder::PixelFormat::RGB24 => 3,
            jpeg_decoder::PixelFormat::CMYK32 => 4,
        };
        let bytes = crate::limits::buffer_size(w as u64, h as u64, bytes_per_pixel)
            .ok_or_else(|| Error::limit("pixel buffer size overflows"))?;
        limits.check_memory(bytes).map_err(Error::limit)?;
    }

    let raw = decoder.decode().map_err(map_decode_err)?;

    let pixels = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => PixelData::from_u8(raw, w, h, 1),
        jpeg_decoder::PixelFormat::RGB24 => PixelData::from_u8(raw, w, h, 3),
        jpeg_decoder::PixelFormat::CMYK32 => {
            // Samples are ink coverage, 0 = none: r = (255-c)(255-k)/255
            let mut rgb = Vec::with_capacity(w * h * 3);
            for px in raw.chunks_exact(4) {
                let k = 255 - u16::from(px[3]);
                rgb.push(((255 - u16::from(px[0])) * k / 255) as u8);
                rgb.push(((255 - u16::from(px[1])) * k / 255) as u8);
                rgb.push(((255 - u16::from(px[2])) * k / 255) as u8);
            }
            PixelData::from_u8(rgb, w, h, 3)
        }
        jpeg_decoder::PixelFormat::L16 => {
            return Err(Error::variant(ImageFormat::Jpeg, "16-bit luma"));
        }
    }
    .ok_or_else(|| Error::corrupt(ImageFormat::Jpeg, "decoded buffer shape mismatch"))?;

    let metadata = want_metadata.then(Metadata::new);

    Ok(DecodeOutput { pixels, metadata })
}

/// Encode pixels to JPEG.
///
/// Only 8-bit gray and RGB are representable. Alpha must be stripped
/// by the caller first; quality outside 1..=100 is clamped.
pub(crate) fn encode(pixels: &PixelData, config: &CodecConfig) -> Result<Vec<u8>, Error> {
    let (color, bytes) = match pixels {
        PixelData::Gray8(_) => (jpeg_encoder::ColorType::Luma, pixels.as_bytes()),
        PixelData::Rgb8(_) => (jpeg_encoder::ColorType::Rgb, pixels.as_bytes()),
        PixelData::GrayA8(_) | PixelData::Rgba8(_) => {
            return Err(Error::unrepresentable(
                ImageFormat::Jpeg,
                "alpha channel; strip it before encoding",
            ));
        }
        other => {
            return Err(Error::unrepresentable(
                ImageFormat::Jpeg,
                format!("{:?} pixels; JPEG stores 8-bit gray or RGB", other),
            ));
        }
    };

    let width = u16::try_from(pixels.width())
        .map_err(|_| Error::unrepresentable(ImageFormat::Jpeg, "width exceeds 65535"))?;
    let height = u16::try_from(pixels.height())
        .map_err(|_| Error::unrepresentable(ImageFormat::Jpeg, "height exceeds 65535"))?;

    let quality = config.jpeg_quality.unwrap_or(DEFAULT_QUALITY).clamp(1, 100);

    let mut output = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut output, quality);
    encoder
        .encode(&bytes, width, height, color)
        .map_err(|e| Error::unrepresentable(ImageFormat::Jpeg, e.to_string()))?;

    Ok(output)
}
