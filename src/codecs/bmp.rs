//! BMP codec, implemented directly over the uncompressed DIB layout.
//!
//! Reads 1/4/8-bit palette and 24/32-bit direct color files with
//! BITMAPINFOHEADER or newer headers. RLE and bitfield variants are
//! rejected as unsupported. Writes 8-bit paletted gray, 24-bit BGR,
//! or 32-bit BGRA.

use crate::config::CodecConfig;
use crate::error::Error;
use crate::limits::{self, Limits};
use crate::pixel::PixelData;
use crate::read::DecodeOutput;
use crate::{ImageFormat, Metadata};

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: usize = 40;

const BI_RGB: u32 = 0;
const BI_RLE8: u32 = 1;
const BI_RLE4: u32 = 2;
const BI_BITFIELDS: u32 = 3;

fn u16_le(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn u32_le(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn i32_le(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

struct Header {
    width: usize,
    height: usize,
    top_down: bool,
    bit_count: u16,
    data_offset: usize,
    palette_offset: usize,
    palette_len: usize,
    ppm_x: i32,
    ppm_y: i32,
}

fn parse_header(data: &[u8]) -> Result<Header, Error> {
    let err = |detail: &str| Error::corrupt(ImageFormat::Bmp, detail);

    if data.len() < FILE_HEADER_LEN + 4 {
        return Err(err("truncated file header"));
    }
    if &data[0..2] != b"BM" {
        return Err(err("missing BM signature"));
    }

    let data_offset = u32_le(data, 10) as usize;
    let header_size = u32_le(data, 14) as usize;
    if header_size < INFO_HEADER_LEN {
        // 12-byte BITMAPCOREHEADER from OS/2
        return Err(Error::variant(ImageFormat::Bmp, "core header bitmap"));
    }
    if data.len() < FILE_HEADER_LEN + INFO_HEADER_LEN {
        return Err(err("truncated info header"));
    }

    let width = i32_le(data, 18);
    let raw_height = i32_le(data, 22);
    let planes = u16_le(data, 26);
    let bit_count = u16_le(data, 28);
    let compression = u32_le(data, 30);
    let ppm_x = i32_le(data, 38);
    let ppm_y = i32_le(data, 42);
    let clr_used = u32_le(data, 46) as usize;

    if planes != 1 {
        return Err(err("plane count must be 1"));
    }
    if width <= 0 || raw_height == 0 {
        return Err(err("non-positive dimensions"));
    }
    match compression {
        BI_RGB => {}
        BI_RLE8 | BI_RLE4 => {
            return Err(Error::variant(ImageFormat::Bmp, "RLE compression"));
        }
        BI_BITFIELDS => {
            return Err(Error::variant(ImageFormat::Bmp, "bitfield masks"));
        }
        other => {
            return Err(Error::corrupt(
                ImageFormat::Bmp,
                format!("unknown compression {}", other),
            ));
        }
    }

    let palette_len = match bit_count {
        1 | 4 | 8 => {
            if clr_used > 0 {
                clr_used
            } else {
                1usize << bit_count
            }
        }
        24 | 32 => 0,
        16 => return Err(Error::variant(ImageFormat::Bmp, "16-bit pixels")),
        other => {
            return Err(Error::corrupt(
                ImageFormat::Bmp,
                format!("invalid bit count {}", other),
            ));
        }
    };

    Ok(Header {
        width: width as usize,
        height: raw_height.unsigned_abs() as usize,
        top_down: raw_height < 0,
        bit_count,
        data_offset,
        palette_offset: FILE_HEADER_LEN + header_size,
        palette_len,
        ppm_x,
        ppm_y,
    })
}

/// Bytes per row including the mandatory 4-byte alignment padding.
fn row_stride(width: usize, bit_count: u16) -> usize {
    (width * usize::from(bit_count)).div_ceil(32) * 4
}

pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let header = parse_header(data)?;
    let w = header.width;
    let h = header.height;

    if let Some(limits) = limits {
        limits
            .check_dimensions(w as u64, h as u64)
            .map_err(Error::limit)?;
        let out_bpp = if header.bit_count == 32 { 4 } else { 3 };
        let bytes = limits::buffer_size(w as u64, h as u64, out_bpp)
            .ok_or_else(|| Error::limit("pixel buffer size overflows"))?;
        limits.check_memory(bytes).map_err(Error::limit)?;
    }

    // Palette entries are stored as BGRA quads after the info header
    let palette: &[u8] = if header.palette_len > 0 {
        let end = header
            .palette_len
            .checked_mul(4)
            .and_then(|len| header.palette_offset.checked_add(len))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| Error::corrupt(ImageFormat::Bmp, "truncated palette"))?;
        &data[header.palette_offset..end]
    } else {
        &[]
    };

    let stride = row_stride(w, header.bit_count);
    let pixel_end = stride
        .checked_mul(h)
        .and_then(|len| header.data_offset.checked_add(len))
        .ok_or_else(|| Error::corrupt(ImageFormat::Bmp, "pixel data size overflows"))?;
    if pixel_end > data.len() {
        return Err(Error::corrupt(ImageFormat::Bmp, "truncated pixel data"));
    }

    // Rows are stored bottom-up unless the height was negative
    let row_range = |row: usize| {
        let src_row = if header.top_down { row } else { h - 1 - row };
        let start = header.data_offset + src_row * stride;
        start..start + stride
    };

    let channels: u8 = if header.bit_count == 32 { 4 } else { 3 };
    let mut samples = Vec::with_capacity(w * h * usize::from(channels));

    for row in 0..h {
        let src = &data[row_range(row)];
        match header.bit_count {
            24 => {
                for px in src[..w * 3].chunks_exact(3) {
                    samples.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            32 => {
                for px in src[..w * 4].chunks_exact(4) {
                    samples.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
            8 => {
                for &index in &src[..w] {
                    push_palette(&mut samples, palette, usize::from(index))?;
                }
            }
            4 => {
                for x in 0..w {
                    let byte = src[x / 2];
                    let index = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                    push_palette(&mut samples, palette, usize::from(index))?;
                }
            }
            1 => {
                for x in 0..w {
                    let byte = src[x / 8];
                    let index = (byte >> (7 - (x % 8))) & 1;
                    push_palette(&mut samples, palette, usize::from(index))?;
                }
            }
            _ => unreachable!("parse_header rejects other depths"),
        }
    }

    let pixels = PixelData::from_u8(samples, w, h, channels)
        .ok_or_else(|| Error::corrupt(ImageFormat::Bmp, "pixel buffer shape mismatch"))?;

    let metadata = want_metadata.then(|| {
        let mut meta = Metadata::new();
        if header.ppm_x != 0 {
            meta.push(
                "XPelsPerMeter",
                crate::MetaValue::Int(i64::from(header.ppm_x)),
            );
        }
        if header.ppm_y != 0 {
            meta.push(
                "YPelsPerMeter",
                crate::MetaValue::Int(i64::from(header.ppm_y)),
            );
        }
        meta
    });

    Ok(DecodeOutput { pixels, metadata })
}

fn push_palette(samples: &mut Vec<u8>, palette: &[u8], index: usize) -> Result<(), Error> {
    let at = index * 4;
    if at + 4 > palette.len() {
        return Err(Error::corrupt(
            ImageFormat::Bmp,
            "palette index out of range",
        ));
    }
    samples.extend_from_slice(&[palette[at + 2], palette[at + 1], palette[at]]);
    Ok(())
}

pub(crate) fn encode(pixels: &PixelData, _config: &CodecConfig) -> Result<Vec<u8>, Error> {
    let w = pixels.width() as usize;
    let h = pixels.height() as usize;

    match pixels {
        PixelData::Gray8(img) => {
            // 8-bit indexed with a grayscale ramp; the sample value is
            // its own palette index
            let mut ramp = Vec::with_capacity(256 * 4);
            for value in 0..=255u8 {
                ramp.extend_from_slice(&[value, value, value, 0]);
            }
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            write_bmp(w, h, &ramp, buf.iter().map(|p| [p.value()]))
        }
        PixelData::Rgb8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            write_bmp(w, h, &[], buf.iter().map(|p| [p.b, p.g, p.r]))
        }
        PixelData::Rgba8(img) => {
            let (buf, _, _) = img.as_ref().to_contiguous_buf();
            write_bmp(w, h, &[], buf.iter().map(|p| [p.b, p.g, p.r, p.a]))
        }
        other => Err(Error::unrepresentable(
            ImageFormat::Bmp,
            format!("{:?} pixels; BMP output is 8-bit gray, RGB, or RGBA", other),
        )),
    }
}

/// Assemble headers, an optional palette, and bottom-up padded rows from
/// per-pixel index or BGR(A) groups.
fn write_bmp<const N: usize>(
    w: usize,
    h: usize,
    palette: &[u8],
    pixels: impl Iterator<Item = [u8; N]>,
) -> Result<Vec<u8>, Error> {
    let bit_count = (N * 8) as u16;
    let stride = row_stride(w, bit_count);
    let image_len = stride * h;
    let data_offset = FILE_HEADER_LEN + INFO_HEADER_LEN + palette.len();
    let file_len = data_offset + image_len;
    let file_len_u32 = u32::try_from(file_len)
        .map_err(|_| Error::unrepresentable(ImageFormat::Bmp, "file exceeds 4 GiB"))?;
    let (w_u32, h_u32) = (w as u32, h as u32);
    if i32::try_from(w_u32).is_err() || i32::try_from(h_u32).is_err() {
        return Err(Error::unrepresentable(
            ImageFormat::Bmp,
            "dimensions exceed BMP header range",
        ));
    }

    let mut out = Vec::with_capacity(file_len);

    // BITMAPFILEHEADER
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&file_len_u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(data_offset as u32).to_le_bytes());

    // BITMAPINFOHEADER, 72 DPI resolution
    out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
    out.extend_from_slice(&(w_u32 as i32).to_le_bytes());
    out.extend_from_slice(&(h_u32 as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bit_count.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&(image_len as u32).to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&((palette.len() / 4) as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    out.extend_from_slice(palette);

    // Interleave into bottom-up rows, padding each to 4 bytes
    let mut rows: Vec<Vec<u8>> = Vec::with_capacity(h);
    let mut current = Vec::with_capacity(stride);
    for (i, group) in pixels.enumerate() {
        current.extend_from_slice(&group);
        if (i + 1) % w == 0 {
            current.resize(stride, 0);
            rows.push(core::mem::replace(&mut current, Vec::with_capacity(stride)));
        }
    }
    for row in rows.iter().rev() {
        out.extend_from_slice(row);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{ImgVec, Rgb, Rgba};

    /// 2x2 24-bit bottom-up: red green / blue white reading top to bottom.
    fn sample_24bit() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&70u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&54u32.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 24]); // compression through clr_important
        // Bottom row first: blue, white. Row stride 8 (6 data + 2 pad).
        data.extend_from_slice(&[255, 0, 0, 255, 255, 255, 0, 0]);
        // Top row: red, green
        data.extend_from_slice(&[0, 0, 255, 0, 255, 0, 0, 0]);
        data
    }

    #[test]
    fn decode_24bit_bottom_up() {
        let out = decode(&sample_24bit(), None, false).unwrap();
        match out.pixels {
            PixelData::Rgb8(img) => {
                assert_eq!((img.width(), img.height()), (2, 2));
                let buf = img.buf();
                assert_eq!(buf[0], Rgb { r: 255, g: 0, b: 0 });
                assert_eq!(buf[1], Rgb { r: 0, g: 255, b: 0 });
                assert_eq!(buf[2], Rgb { r: 0, g: 0, b: 255 });
                assert_eq!(
                    buf[3],
                    Rgb {
                        r: 255,
                        g: 255,
                        b: 255
                    }
                );
            }
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn decode_8bit_palette_expands() {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&66u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&62u32.to_le_bytes()); // 54 + 2 palette entries
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
        data.extend_from_slice(&[0u8; 12]); // size + resolution
        data.extend_from_slice(&2u32.to_le_bytes()); // clr_used
        data.extend_from_slice(&0u32.to_le_bytes());
        // Palette: entry 0 = orange (BGR), entry 1 = teal
        data.extend_from_slice(&[0, 128, 255, 0]);
        data.extend_from_slice(&[128, 128, 0, 0]);
        // Single row, indices 1 0, padded to 4
        data.extend_from_slice(&[1, 0, 0, 0]);

        let out = decode(&data, None, false).unwrap();
        match out.pixels {
            PixelData::Rgb8(img) => {
                assert_eq!(
                    img.buf()[0],
                    Rgb {
                        r: 0,
                        g: 128,
                        b: 128
                    }
                );
                assert_eq!(
                    img.buf()[1],
                    Rgb {
                        r: 255,
                        g: 128,
                        b: 0
                    }
                );
            }
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn top_down_height_negative() {
        let mut data = sample_24bit();
        // Flip height to -2: rows are now stored top-first
        data[22..26].copy_from_slice(&(-2i32).to_le_bytes());
        let out = decode(&data, None, false).unwrap();
        match out.pixels {
            PixelData::Rgb8(img) => {
                // What used to be the bottom row now comes out on top
                assert_eq!(img.buf()[0], Rgb { r: 0, g: 0, b: 255 });
            }
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn truncated_pixels_is_corrupt() {
        let mut data = sample_24bit();
        data.truncate(60);
        match decode(&data, None, false) {
            Err(Error::CorruptData { format, .. }) => assert_eq!(format, ImageFormat::Bmp),
            other => panic!("expected CorruptData, got {:?}", other),
        }
    }

    #[test]
    fn rle_is_unsupported_variant() {
        let mut data = sample_24bit();
        data[28..30].copy_from_slice(&8u16.to_le_bytes());
        data[30..34].copy_from_slice(&BI_RLE8.to_le_bytes());
        match decode(&data, None, false) {
            Err(Error::UnsupportedVariant { detail, .. }) => {
                assert!(detail.contains("RLE"));
            }
            other => panic!("expected UnsupportedVariant, got {:?}", other),
        }
    }

    #[test]
    fn limits_reject_before_decode() {
        let limits = Limits {
            max_width: Some(1),
            ..Default::default()
        };
        match decode(&sample_24bit(), Some(&limits), false) {
            Err(Error::LimitExceeded { .. }) => {}
            other => panic!("expected LimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn roundtrip_rgb8() {
        let img = ImgVec::new(
            vec![
                Rgb { r: 255, g: 0, b: 0 },
                Rgb { r: 0, g: 255, b: 0 },
                Rgb { r: 0, g: 0, b: 255 },
                Rgb {
                    r: 10,
                    g: 20,
                    b: 30,
                },
            ],
            2,
            2,
        );
        let original = PixelData::Rgb8(img);
        let encoded = encode(&original, &CodecConfig::default()).unwrap();
        assert_eq!(&encoded[..2], b"BM");

        let decoded = decode(&encoded, None, false).unwrap();
        match decoded.pixels {
            PixelData::Rgb8(img) => {
                assert_eq!(img.buf(), original.to_rgb8().buf());
            }
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn roundtrip_rgba8_keeps_alpha() {
        let img = ImgVec::new(
            vec![Rgba {
                r: 9,
                g: 8,
                b: 7,
                a: 129,
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
                        r: 9,
                        g: 8,
                        b: 7,
                        a: 129
                    }
                );
            }
            other => panic!("expected Rgba8, got {:?}", other),
        }
    }

    #[test]
    fn gray_writes_palette_and_decodes_to_rgb() {
        let pixels = PixelData::from_u8(vec![0, 255, 17, 90], 2, 2, 1).unwrap();
        let encoded = encode(&pixels, &CodecConfig::default()).unwrap();
        assert_eq!(u16_le(&encoded, 28), 8);

        // Palette expansion always yields direct color on the way back
        let decoded = decode(&encoded, None, false).unwrap();
        match decoded.pixels {
            PixelData::Rgb8(img) => {
                assert_eq!(img.buf()[1], Rgb { r: 255, g: 255, b: 255 });
                assert_eq!(img.buf()[2], Rgb { r: 17, g: 17, b: 17 });
            }
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn float_input_unrepresentable() {
        let img = ImgVec::new(vec![Rgb { r: 0.5f32, g: 0.5, b: 0.5 }], 1, 1);
        match encode(&PixelData::RgbF32(img), &CodecConfig::default()) {
            Err(Error::UnrepresentableData { format, .. }) => {
                assert_eq!(format, ImageFormat::Bmp);
            }
            other => panic!("expected UnrepresentableData, got {:?}", other),
        }
    }
}
