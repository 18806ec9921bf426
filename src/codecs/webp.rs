//! WebP codec adapter using image-webp.
//!
//! Decodes lossy and lossless stills; output is always 8-bit RGB or
//! RGBA because that is what the wire format carries. Encoding is
//! lossless VP8L.

use std::io::Cursor;

use crate::config::CodecConfig;
use crate::error::Error;
use crate::limits::Limits;
use crate::pixel::PixelData;
use crate::read::DecodeOutput;
use crate::{ImageFormat, Metadata};

fn map_decode_err(e: image_webp::DecodingError) -> Error {
    match e {
        image_webp::DecodingError::IoError(e) => Error::io("decoding WebP", e),
        other => Error::corrupt(ImageFormat::WebP, other.to_string()),
    }
}

/// Decode a WebP still to pixels.
pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let mut decoder = image_webp::WebPDecoder::new(Cursor::new(data)).map_err(map_decode_err)?;

    if decoder.is_animated() {
        return Err(Error::variant(ImageFormat::WebP, "animated WebP"));
    }

    let (width, height) = decoder.dimensions();
    if let Some(limits) = limits {
        limits
            .check_dimensions(u64::from(width), u64::from(height))
            .map_err(Error::limit)?;
    }

    let buffer_size = decoder
        .output_buffer_size()
        .ok_or_else(|| Error::corrupt(ImageFormat::WebP, "output buffer size overflows"))?;
    if let Some(limits) = limits {
        limits
            .check_memory(buffer_size as u64)
            .map_err(Error::limit)?;
    }

    let mut raw = vec![0u8; buffer_size];
    decoder.read_image(&mut raw).map_err(map_decode_err)?;

    let channels = if decoder.has_alpha() { 4 } else { 3 };
    let pixels = PixelData::from_u8(raw, width as usize, height as usize, channels)
        .ok_or_else(|| Error::corrupt(ImageFormat::WebP, "decoded buffer shape mismatch"))?;

    let metadata = want_metadata.then(Metadata::new);

    Ok(DecodeOutput { pixels, metadata })
}

/// Encode pixels to lossless WebP. Only 8-bit layouts are representable.
pub(crate) fn encode(pixels: &PixelData, _config: &CodecConfig) -> Result<Vec<u8>, Error> {
    let (color, bytes) = match pixels {
        PixelData::Gray8(_) => (image_webp::ColorType::L8, pixels.as_bytes()),
        PixelData::GrayA8(_) => (image_webp::ColorType::La8, pixels.as_bytes()),
        PixelData::Rgb8(_) => (image_webp::ColorType::Rgb8, pixels.as_bytes()),
        PixelData::Rgba8(_) => (image_webp::ColorType::Rgba8, pixels.as_bytes()),
        other => {
            return Err(Error::unrepresentable(
                ImageFormat::WebP,
                format!("{:?} pixels; WebP stores 8-bit samples", other),
            ));
        }
    };

    let mut output = Vec::new();
    image_webp::WebPEncoder::new(&mut output)
        .encode(&bytes, pixels.width(), pixels.height(), color)
        .map_err(|e| Error::unrepresentable(ImageFormat::WebP, e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{GrayAlpha, ImgVec, Rgb, Rgba};

    #[test]
    fn lossless_roundtrip_rgb8_is_exact() {
        let img = ImgVec::new(
            vec![
                Rgb { r: 255, g: 0, b: 0 },
                Rgb { r: 0, g: 255, b: 0 },
                Rgb { r: 0, g: 0, b: 255 },
                Rgb {
                    r: 17,
                    g: 34,
                    b: 51,
                },
            ],
            2,
            2,
        );
        let original = PixelData::Rgb8(img);
        let encoded = encode(&original, &CodecConfig::default()).unwrap();
        assert_eq!(&encoded[..4], b"RIFF");
        assert_eq!(&encoded[8..12], b"WEBP");

        let decoded = decode(&encoded, None, false).unwrap();
        match decoded.pixels {
            PixelData::Rgb8(img) => assert_eq!(img.buf(), original.to_rgb8().buf()),
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn alpha_survives_roundtrip() {
        let img = ImgVec::new(
            vec![Rgba {
                r: 1,
                g: 2,
                b: 3,
                a: 77,
            }],
            1,
            1,
        );
        let encoded = encode(&PixelData::Rgba8(img), &CodecConfig::default()).unwrap();
        let decoded = decode(&encoded, None, false).unwrap();
        match decoded.pixels {
            PixelData::Rgba8(img) => {
                assert_eq!(
                    img.buf()[0],
                    Rgba {
                        r: 1,
                        g: 2,
                        b: 3,
                        a: 77
                    }
                );
            }
            other => panic!("expected Rgba8, got {:?}", other),
        }
    }

    #[test]
    fn gray_alpha_comes_back_as_rgba() {
        // The wire format has no gray layout; L8/La8 input is stored as
        // RGB(A) with equal channels
        let img = ImgVec::new(vec![GrayAlpha(90u8, 180u8)], 1, 1);
        let encoded = encode(&PixelData::GrayA8(img), &CodecConfig::default()).unwrap();
        let decoded = decode(&encoded, None, false).unwrap();
        match decoded.pixels {
            PixelData::Rgba8(img) => {
                assert_eq!(
                    img.buf()[0],
                    Rgba {
                        r: 90,
                        g: 90,
                        b: 90,
                        a: 180
                    }
                );
            }
            other => panic!("expected Rgba8, got {:?}", other),
        }
    }

    #[test]
    fn sixteen_bit_is_unrepresentable() {
        let img = ImgVec::new(vec![Rgb { r: 1u16, g: 2, b: 3 }], 1, 1);
        match encode(&PixelData::Rgb16(img), &CodecConfig::default()) {
            Err(Error::UnrepresentableData { format, .. }) => {
                assert_eq!(format, ImageFormat::WebP);
            }
            other => panic!("expected UnrepresentableData, got {:?}", other),
        }
    }

    #[test]
    fn garbage_after_signature_is_corrupt() {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF\x20\x00\x00\x00WEBP");
        data.extend_from_slice(&[0u8; 32]);
        match decode(&data, None, false) {
            Err(Error::CorruptData { format, .. }) => assert_eq!(format, ImageFormat::WebP),
            other => panic!("expected CorruptData, got {:?}", other),
        }
    }

    #[test]
    fn limits_stop_oversized_decode() {
        let img = ImgVec::new(vec![Rgb { r: 0u8, g: 0, b: 0 }; 64], 8, 8);
        let encoded = encode(&PixelData::Rgb8(img), &CodecConfig::default()).unwrap();
        let limits = Limits {
            max_pixels: Some(9),
            ..Default::default()
        };
        match decode(&encoded, Some(&limits), false) {
            Err(Error::LimitExceeded { .. }) => {}
            other => panic!("expected LimitExceeded, got {:?}", other),
        }
    }
}
