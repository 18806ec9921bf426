//! Partial-data image probing.
//!
//! Extracts dimensions, bit depth, and frame count from the leading bytes of
//! an image file without decoding it. Each format has its own header
//! structure and minimum byte requirements.
//!
//! All parsers are pure byte parsing with no codec crate involvement, so
//! probing works even for formats whose codec feature is compiled out.

use crate::error::Error;
use crate::format::ImageFormat;

/// IFD chains longer than this are treated as malformed.
const MAX_IFD_CHAIN: u32 = 4096;

/// What a header probe could learn from the bytes it was given.
///
/// All fields except `format` are `Option`, since partial data may not
/// contain enough bytes for dimensions or other properties.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct ProbeResult {
    /// The format the data was probed as.
    pub format: ImageFormat,
    /// Image width in pixels.
    pub width: Option<u32>,
    /// Image height in pixels.
    pub height: Option<u32>,
    /// Bits per channel as declared by the header (1, 4, 8, 16, 32).
    pub bit_depth: Option<u8>,
    /// Whether the image carries an alpha channel.
    pub has_alpha: Option<bool>,
    /// Number of frames, when the container declares or implies it.
    pub frame_count: Option<u32>,
    /// Number of bytes examined from the input.
    pub bytes_examined: usize,
}

impl ProbeResult {
    /// Probes `data`, detecting the format from its content first.
    ///
    /// Content detection reports `.lsm` microscopy stacks as TIFF, which
    /// on disk they are; callers holding a path can refine with
    /// [`ProbeResult::for_format`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let format = ImageFormat::detect(data).ok_or(Error::UnknownFormat)?;
        Ok(Self::for_format(data, format))
    }

    /// Probes `data` as a specific format.
    ///
    /// Dispatches to the format's header parser. Magic bytes are not
    /// re-verified; a mismatched format simply yields empty fields.
    pub fn for_format(data: &[u8], format: ImageFormat) -> Self {
        match format {
            ImageFormat::Bmp => probe_bmp(data),
            ImageFormat::Jpeg => probe_jpeg(data),
            ImageFormat::Png => probe_png(data),
            ImageFormat::Tiff => probe_tiff_like(data, ImageFormat::Tiff),
            ImageFormat::Lsm => probe_tiff_like(data, ImageFormat::Lsm),
            ImageFormat::WebP => probe_webp(data),
            ImageFormat::Xcf => probe_xcf(data),
        }
    }
}

// ---------------------------------------------------------------------------
// BMP: 14-byte file header + BITMAPINFOHEADER
// Dimensions at offsets 18/22 (signed LE), bit count at 28
// ---------------------------------------------------------------------------

fn probe_bmp(data: &[u8]) -> ProbeResult {
    let mut result = ProbeResult {
        format: ImageFormat::Bmp,
        width: None,
        height: None,
        bit_depth: None,
        has_alpha: None,
        frame_count: Some(1),
        bytes_examined: data.len().min(30),
    };

    if data.len() < 26 {
        return result;
    }

    // BITMAPCOREHEADER (size 12) uses 16-bit dimensions; only the common
    // 40-byte-and-up info headers are parsed here.
    let header_size = u32::from_le_bytes([data[14], data[15], data[16], data[17]]);
    if header_size < 40 {
        return result;
    }

    let width = i32::from_le_bytes([data[18], data[19], data[20], data[21]]);
    // Negative height means top-down row order.
    let height = i32::from_le_bytes([data[22], data[23], data[24], data[25]]);
    result.width = Some(width.unsigned_abs());
    result.height = Some(height.unsigned_abs());

    if data.len() >= 30 {
        let bit_count = u16::from_le_bytes([data[28], data[29]]);
        result.bit_depth = match bit_count {
            1 | 4 | 8 => Some(bit_count as u8),
            24 | 32 => Some(8),
            _ => None,
        };
        result.has_alpha = Some(bit_count == 32);
    }

    result
}

// ---------------------------------------------------------------------------
// PNG: 8-byte signature + 25-byte IHDR (4 len + 4 type + 13 data + 4 CRC)
// Total: 33 bytes for full dimension + color type info
// ---------------------------------------------------------------------------

fn probe_png(data: &[u8]) -> ProbeResult {
    let mut result = ProbeResult {
        format: ImageFormat::Png,
        width: None,
        height: None,
        bit_depth: None,
        has_alpha: None,
        frame_count: Some(1),
        bytes_examined: data.len().min(33),
    };

    if data.len() < 33 || &data[12..16] != b"IHDR" {
        return result;
    }

    result.width = Some(u32::from_be_bytes([data[16], data[17], data[18], data[19]]));
    result.height = Some(u32::from_be_bytes([data[20], data[21], data[22], data[23]]));
    result.bit_depth = Some(data[24]);

    // Color type 4 is gray+alpha, 6 is RGBA.
    let color_type = data[25];
    result.has_alpha = Some(color_type == 4 || color_type == 6);

    result
}

// ---------------------------------------------------------------------------
// JPEG: scan marker segments for SOF (start of frame)
//
// SOI (FF D8), then marker segments (FF xx, 2-byte BE length, payload).
// SOF0-SOF15 carry precision, height, width. SOS starts entropy-coded data,
// past which markers cannot be scanned for.
// ---------------------------------------------------------------------------

fn probe_jpeg(data: &[u8]) -> ProbeResult {
    let mut result = ProbeResult {
        format: ImageFormat::Jpeg,
        width: None,
        height: None,
        bit_depth: None,
        has_alpha: Some(false),
        frame_count: Some(1),
        bytes_examined: data.len(),
    };

    if data.len() < 4 {
        return result;
    }

    let mut pos = 2; // past SOI
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            // Lost marker sync.
            break;
        }
        // Fill bytes before a marker are FF.
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            break;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Standalone markers carry no length field; SOS and EOI end the scan.
        if marker == 0x00 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        if pos + 2 > data.len() {
            break;
        }
        let seg_len = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;

        let is_sof = matches!(
            marker,
            0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE
                | 0xCF
        );
        if is_sof {
            // SOF payload: length (2) + precision (1) + height (2) + width (2).
            if pos + 7 < data.len() {
                result.bit_depth = Some(data[pos + 2]);
                result.height = Some(u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32);
                result.width = Some(u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32);
                result.bytes_examined = pos + 8;
            }
            return result;
        }

        if seg_len < 2 {
            break;
        }
        pos += seg_len;
    }

    result.bytes_examined = pos.min(data.len());
    result
}

// ---------------------------------------------------------------------------
// WebP: RIFF header (12 bytes) + first chunk, which names the sub-format
//
// - VP8X (extended): feature flags at byte 20, canvas size at 24..30
//   (24-bit LE, stored minus one)
// - VP8 (lossy): keyframe signature 9D 01 2A at 23, dimensions at 26..30
//   (LE u16, low 14 bits)
// - VP8L (lossless): signature 2F at 20, then a u32 at 21..25 packing
//   14-bit dimensions, the alpha_is_used flag, and a 3-bit version
// ---------------------------------------------------------------------------

fn probe_webp(data: &[u8]) -> ProbeResult {
    let mut result = ProbeResult {
        format: ImageFormat::WebP,
        width: None,
        height: None,
        bit_depth: None,
        has_alpha: None,
        frame_count: None,
        bytes_examined: data.len().min(30),
    };

    if data.len() < 16 {
        return result;
    }

    let chunk = &data[12..16];
    if chunk == b"VP8X" {
        if data.len() < 30 {
            return result;
        }
        let flags = data[20];
        result.has_alpha = Some(flags & 0x10 != 0);
        // The frame count of an animation is not in the header; a still
        // image is exactly one frame.
        result.frame_count = if flags & 0x02 != 0 { None } else { Some(1) };

        let w = (data[24] as u32) | ((data[25] as u32) << 8) | ((data[26] as u32) << 16);
        let h = (data[27] as u32) | ((data[28] as u32) << 8) | ((data[29] as u32) << 16);
        result.width = Some(w + 1);
        result.height = Some(h + 1);
        result.bit_depth = Some(8);
    } else if chunk == b"VP8 " {
        // Chunk data starts at 20: 3-byte frame tag, then the keyframe
        // signature, then 14-bit dimensions.
        if data.len() >= 30 && data[23..26] == [0x9D, 0x01, 0x2A] {
            result.width = Some((u16::from_le_bytes([data[26], data[27]]) & 0x3FFF) as u32);
            result.height = Some((u16::from_le_bytes([data[28], data[29]]) & 0x3FFF) as u32);
            result.has_alpha = Some(false);
            result.frame_count = Some(1);
            result.bit_depth = Some(8);
        }
    } else if chunk == b"VP8L" && data.len() >= 25 && data[20] == 0x2F {
        let bits = u32::from_le_bytes([data[21], data[22], data[23], data[24]]);
        result.width = Some((bits & 0x3FFF) + 1);
        result.height = Some(((bits >> 14) & 0x3FFF) + 1);
        // alpha_is_used flag sits above the two 14-bit dimensions
        result.has_alpha = Some((bits >> 28) & 1 == 1);
        result.frame_count = Some(1);
        result.bit_depth = Some(8);
    }

    result
}

// ---------------------------------------------------------------------------
// TIFF and LSM: endian-aware IFD chain walk
//
// Header names the byte order (II or MM) and the offset of the first image
// file directory. Each directory is a 2-byte entry count, 12-byte entries,
// and a 4-byte offset to the next directory (zero ends the chain). Tags of
// interest: 254 NewSubfileType, 256 ImageWidth, 257 ImageLength,
// 258 BitsPerSample. For LSM, directories flagged as reduced-resolution
// thumbnails are not counted as frames.
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum ByteOrder {
    Le,
    Be,
}

impl ByteOrder {
    fn u16_at(self, data: &[u8], pos: usize) -> Option<u16> {
        let bytes: [u8; 2] = data.get(pos..pos + 2)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Le => u16::from_le_bytes(bytes),
            ByteOrder::Be => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(self, data: &[u8], pos: usize) -> Option<u32> {
        let bytes: [u8; 4] = data.get(pos..pos + 4)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Le => u32::from_le_bytes(bytes),
            ByteOrder::Be => u32::from_be_bytes(bytes),
        })
    }
}

/// Reads one directory entry and returns its tag and first numeric value.
///
/// Handles BYTE, SHORT, and LONG entries. Values that do not fit in the
/// four inline bytes are followed to their offset.
fn ifd_first_value(data: &[u8], order: ByteOrder, entry_pos: usize) -> Option<(u16, u32)> {
    let tag = order.u16_at(data, entry_pos)?;
    let field_type = order.u16_at(data, entry_pos + 2)?;
    let count = order.u32_at(data, entry_pos + 4)?;
    if count == 0 {
        return None;
    }
    let value_pos = entry_pos + 8;
    let value = match field_type {
        1 => {
            if count <= 4 {
                *data.get(value_pos)? as u32
            } else {
                *data.get(order.u32_at(data, value_pos)? as usize)? as u32
            }
        }
        3 => {
            if count <= 2 {
                order.u16_at(data, value_pos)? as u32
            } else {
                order.u16_at(data, order.u32_at(data, value_pos)? as usize)? as u32
            }
        }
        4 => {
            if count == 1 {
                order.u32_at(data, value_pos)?
            } else {
                order.u32_at(data, order.u32_at(data, value_pos)? as usize)?
            }
        }
        _ => return None,
    };
    Some((tag, value))
}

fn probe_tiff_like(data: &[u8], format: ImageFormat) -> ProbeResult {
    let mut result = ProbeResult {
        format,
        width: None,
        height: None,
        bit_depth: None,
        has_alpha: None,
        frame_count: None,
        bytes_examined: data.len().min(8),
    };

    let order = match data.get(..4) {
        Some([0x49, 0x49, 0x2A, 0x00]) => ByteOrder::Le,
        Some([0x4D, 0x4D, 0x00, 0x2A]) => ByteOrder::Be,
        _ => return result,
    };
    let Some(first) = order.u32_at(data, 4) else {
        return result;
    };

    let skip_thumbnails = format == ImageFormat::Lsm;
    let mut pos = first as usize;
    let mut frames = 0u32;
    let mut walked = 0u32;
    loop {
        if pos == 0 {
            // End of chain reached, so the count is exact.
            result.frame_count = Some(frames);
            break;
        }
        walked += 1;
        if walked > MAX_IFD_CHAIN {
            break;
        }

        // A directory is used only when it is fully in range, its
        // next-directory pointer included.
        let Some(entry_count) = order.u16_at(data, pos) else {
            break;
        };
        let after_entries = pos + 2 + entry_count as usize * 12;
        let Some(next) = order.u32_at(data, after_entries) else {
            break;
        };
        result.bytes_examined = result.bytes_examined.max((after_entries + 4).min(data.len()));

        let mut width = None;
        let mut height = None;
        let mut bits = None;
        let mut subfile_type = 0u32;
        for i in 0..entry_count as usize {
            match ifd_first_value(data, order, pos + 2 + i * 12) {
                Some((254, v)) => subfile_type = v,
                Some((256, v)) => width = Some(v),
                Some((257, v)) => height = Some(v),
                Some((258, v)) => bits = u8::try_from(v).ok(),
                _ => {}
            }
        }

        let is_thumbnail = subfile_type & 1 != 0;
        if !(skip_thumbnails && is_thumbnail) {
            frames += 1;
            if result.width.is_none() {
                result.width = width;
                result.height = height;
                result.bit_depth = bits;
            }
        }

        pos = next as usize;
    }

    result
}

// ---------------------------------------------------------------------------
// XCF: "gimp xcf " + 4-byte version + NUL, then big-endian canvas fields
//
// Width at 14, height at 18, base type at 22. Files of version 4 and later
// add a precision field at 26.
// ---------------------------------------------------------------------------

fn probe_xcf(data: &[u8]) -> ProbeResult {
    let mut result = ProbeResult {
        format: ImageFormat::Xcf,
        width: None,
        height: None,
        bit_depth: None,
        has_alpha: None,
        frame_count: Some(1),
        bytes_examined: data.len().min(30),
    };

    if data.len() < 22 {
        return result;
    }

    result.width = Some(u32::from_be_bytes([data[14], data[15], data[16], data[17]]));
    result.height = Some(u32::from_be_bytes([data[18], data[19], data[20], data[21]]));

    // Version "file" is the original 8-bit format; "v001" through "v003"
    // are as well. Later versions declare sample precision explicitly.
    let version_bytes = &data[9..13];
    let version = if version_bytes == b"file" {
        0
    } else if version_bytes[0] == b'v' {
        let digits = std::str::from_utf8(&version_bytes[1..]).ok();
        match digits.and_then(|s| s.parse::<u32>().ok()) {
            Some(v) => v,
            None => return result,
        }
    } else {
        return result;
    };
    if version < 4 {
        result.bit_depth = Some(8);
    } else if data.len() >= 30 {
        // Precision constants group by hundreds: 1xx is 8-bit integer,
        // 2xx 16-bit integer, 3xx 32-bit integer, 5xx half float,
        // 6xx 32-bit float. Pre-v7 files use a different small enum and
        // are left unreported.
        let precision = u32::from_be_bytes([data[26], data[27], data[28], data[29]]);
        result.bit_depth = match precision / 100 {
            1 => Some(8),
            2 => Some(16),
            3 => Some(32),
            5 => Some(16),
            6 => Some(32),
            _ => None,
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- BMP ----

    fn bmp_header(width: i32, height: i32, bit_count: u16) -> Vec<u8> {
        let mut data = vec![0u8; 30];
        data[..2].copy_from_slice(b"BM");
        data[14..18].copy_from_slice(&40u32.to_le_bytes());
        data[18..22].copy_from_slice(&width.to_le_bytes());
        data[22..26].copy_from_slice(&height.to_le_bytes());
        data[28..30].copy_from_slice(&bit_count.to_le_bytes());
        data
    }

    #[test]
    fn bmp_reports_header_fields() {
        let result = probe_bmp(&bmp_header(64, -48, 32));
        assert_eq!(result.width, Some(64));
        assert_eq!(result.height, Some(48));
        assert_eq!(result.bit_depth, Some(8));
        assert_eq!(result.has_alpha, Some(true));
        assert_eq!(result.frame_count, Some(1));
    }

    #[test]
    fn bmp_palette_depth_is_raw() {
        let result = probe_bmp(&bmp_header(10, 10, 4));
        assert_eq!(result.bit_depth, Some(4));
        assert_eq!(result.has_alpha, Some(false));
    }

    #[test]
    fn bmp_too_short_for_dimensions() {
        let result = probe_bmp(&bmp_header(64, 48, 24)[..20]);
        assert_eq!(result.width, None);
        assert_eq!(result.format, ImageFormat::Bmp);
    }

    // ---- PNG ----

    fn png_header(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
        let mut data = vec![0u8; 33];
        data[..8].copy_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
        data[8..12].copy_from_slice(&13u32.to_be_bytes());
        data[12..16].copy_from_slice(b"IHDR");
        data[16..20].copy_from_slice(&width.to_be_bytes());
        data[20..24].copy_from_slice(&height.to_be_bytes());
        data[24] = bit_depth;
        data[25] = color_type;
        data
    }

    #[test]
    fn png_full_header() {
        let result = probe_png(&png_header(100, 50, 8, 6));
        assert_eq!(result.width, Some(100));
        assert_eq!(result.height, Some(50));
        assert_eq!(result.bit_depth, Some(8));
        assert_eq!(result.has_alpha, Some(true));
    }

    #[test]
    fn png_rgb_sixteen_bit() {
        let result = probe_png(&png_header(1920, 1080, 16, 2));
        assert_eq!(result.bit_depth, Some(16));
        assert_eq!(result.has_alpha, Some(false));
    }

    #[test]
    fn png_signature_alone_has_no_dimensions() {
        let result = probe_png(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
        assert_eq!(result.width, None);
        assert_eq!(result.format, ImageFormat::Png);
    }

    // ---- JPEG ----

    #[test]
    fn jpeg_finds_sof_after_app_segment() {
        let mut data = vec![0u8; 30];
        data[0] = 0xFF;
        data[1] = 0xD8;
        // APP0, length 16.
        data[2] = 0xFF;
        data[3] = 0xE0;
        data[4] = 0x00;
        data[5] = 0x10;
        // SOF0 at 20: length 11, precision 8, 480x640.
        data[20] = 0xFF;
        data[21] = 0xC0;
        data[22] = 0x00;
        data[23] = 0x0B;
        data[24] = 8;
        data[25..27].copy_from_slice(&480u16.to_be_bytes());
        data[27..29].copy_from_slice(&640u16.to_be_bytes());

        let result = probe_jpeg(&data);
        assert_eq!(result.width, Some(640));
        assert_eq!(result.height, Some(480));
        assert_eq!(result.bit_depth, Some(8));
        assert_eq!(result.has_alpha, Some(false));
    }

    #[test]
    fn jpeg_truncated_before_sof() {
        let mut data = vec![0u8; 20];
        data[0] = 0xFF;
        data[1] = 0xD8;
        data[2] = 0xFF;
        data[3] = 0xE0;
        // Segment length runs past the available bytes.
        data[4] = 0x03;
        data[5] = 0xE8;

        let result = probe_jpeg(&data);
        assert_eq!(result.width, None);
        assert_eq!(result.height, None);
    }

    // ---- WebP ----

    fn webp_shell(chunk: &[u8; 4], len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        data[..4].copy_from_slice(b"RIFF");
        data[8..12].copy_from_slice(b"WEBP");
        data[12..16].copy_from_slice(chunk);
        data
    }

    #[test]
    fn webp_vp8x_canvas_and_flags() {
        let mut data = webp_shell(b"VP8X", 30);
        data[20] = 0x10; // alpha, no animation
        data[24..27].copy_from_slice(&639u32.to_le_bytes()[..3]);
        data[27..30].copy_from_slice(&479u32.to_le_bytes()[..3]);

        let result = probe_webp(&data);
        assert_eq!(result.width, Some(640));
        assert_eq!(result.height, Some(480));
        assert_eq!(result.has_alpha, Some(true));
        assert_eq!(result.frame_count, Some(1));
    }

    #[test]
    fn webp_vp8x_animated_frame_count_is_unknown() {
        let mut data = webp_shell(b"VP8X", 30);
        data[20] = 0x02;
        let result = probe_webp(&data);
        assert_eq!(result.frame_count, None);
    }

    #[test]
    fn webp_vp8_lossy_dimensions() {
        let mut data = webp_shell(b"VP8 ", 30);
        data[23..26].copy_from_slice(&[0x9D, 0x01, 0x2A]);
        data[26..28].copy_from_slice(&800u16.to_le_bytes());
        data[28..30].copy_from_slice(&600u16.to_le_bytes());

        let result = probe_webp(&data);
        assert_eq!(result.width, Some(800));
        assert_eq!(result.height, Some(600));
        assert_eq!(result.has_alpha, Some(false));
    }

    #[test]
    fn webp_vp8l_bit_packed_dimensions() {
        let mut data = webp_shell(b"VP8L", 25);
        data[20] = 0x2F;
        let bits: u32 = 254 | (126 << 14);
        data[21..25].copy_from_slice(&bits.to_le_bytes());

        let result = probe_webp(&data);
        assert_eq!(result.width, Some(255));
        assert_eq!(result.height, Some(127));
        assert_eq!(result.has_alpha, Some(false));
    }

    #[test]
    fn webp_vp8l_alpha_flag() {
        let mut data = webp_shell(b"VP8L", 25);
        data[20] = 0x2F;
        let bits: u32 = 254 | (126 << 14) | (1 << 28);
        data[21..25].copy_from_slice(&bits.to_le_bytes());

        let result = probe_webp(&data);
        assert_eq!(result.has_alpha, Some(true));
        assert_eq!(result.width, Some(255));
    }

    // ---- TIFF ----

    /// One-page little-endian TIFF: 2x3, 8 bits per sample.
    fn minimal_tiff() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x49, 0x49, 0x2A, 0x00]);
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());
        for (tag, value) in [(256u16, 2u16), (257, 3), (258, 8)] {
            data.extend_from_slice(&tag.to_le_bytes());
            data.extend_from_slice(&3u16.to_le_bytes()); // SHORT
            data.extend_from_slice(&1u32.to_le_bytes());
            data.extend_from_slice(&(value as u32).to_le_bytes());
        }
        data.extend_from_slice(&0u32.to_le_bytes());
        data
    }

    #[test]
    fn tiff_single_directory() {
        let result = probe_tiff_like(&minimal_tiff(), ImageFormat::Tiff);
        assert_eq!(result.width, Some(2));
        assert_eq!(result.height, Some(3));
        assert_eq!(result.bit_depth, Some(8));
        assert_eq!(result.frame_count, Some(1));
    }

    #[test]
    fn tiff_truncated_chain_leaves_count_unknown() {
        let data = minimal_tiff();
        let result = probe_tiff_like(&data[..30], ImageFormat::Tiff);
        assert_eq!(result.frame_count, None);
        assert_eq!(result.width, None);
    }

    #[test]
    fn tiff_like_probes_never_panic_on_any_prefix() {
        let data = minimal_tiff();
        for len in 0..data.len() {
            let _ = probe_tiff_like(&data[..len], ImageFormat::Tiff);
            let _ = probe_tiff_like(&data[..len], ImageFormat::Lsm);
        }
    }

    #[cfg(feature = "tiff")]
    #[test]
    fn multipage_tiff_counts_every_directory() {
        use crate::config::CodecConfig;
        use crate::pixel::PixelData;

        let pages = [
            PixelData::from_u8(vec![1; 12], 2, 2, 3).unwrap(),
            PixelData::from_u8(vec![2; 12], 2, 2, 3).unwrap(),
            PixelData::from_u8(vec![3; 12], 2, 2, 3).unwrap(),
        ];
        let data = crate::codecs::tiff::encode_frames(&pages, &CodecConfig::default()).unwrap();

        let result = ProbeResult::from_bytes(&data).unwrap();
        assert_eq!(result.format, ImageFormat::Tiff);
        assert_eq!(result.frame_count, Some(3));
        assert_eq!(result.width, Some(2));
        assert_eq!(result.bit_depth, Some(8));
    }

    #[cfg(feature = "tiff")]
    #[test]
    fn lsm_probe_skips_thumbnail_directories() {
        use std::io::Cursor;
        use tiff::encoder::{TiffEncoder, colortype};
        use tiff::tags::Tag;

        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).unwrap();
            for (w, h, subfile) in [(4u32, 4u32, 0u32), (1, 1, 1), (4, 4, 0)] {
                let mut image = encoder
                    .new_image::<colortype::Gray8>(w, h)
                    .unwrap();
                image
                    .encoder()
                    .write_tag(Tag::NewSubfileType, subfile)
                    .unwrap();
                image.write_data(&vec![0u8; (w * h) as usize]).unwrap();
            }
        }
        let data = buf.into_inner();

        let as_lsm = probe_tiff_like(&data, ImageFormat::Lsm);
        assert_eq!(as_lsm.frame_count, Some(2));
        let as_tiff = probe_tiff_like(&data, ImageFormat::Tiff);
        assert_eq!(as_tiff.frame_count, Some(3));
    }

    // ---- XCF ----

    fn xcf_header(version: &[u8; 4], width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0u8; 30];
        data[..9].copy_from_slice(b"gimp xcf ");
        data[9..13].copy_from_slice(version);
        data[14..18].copy_from_slice(&width.to_be_bytes());
        data[18..22].copy_from_slice(&height.to_be_bytes());
        data
    }

    #[test]
    fn xcf_original_version_is_eight_bit() {
        let result = probe_xcf(&xcf_header(b"file", 320, 200));
        assert_eq!(result.width, Some(320));
        assert_eq!(result.height, Some(200));
        assert_eq!(result.bit_depth, Some(8));
        assert_eq!(result.frame_count, Some(1));
    }

    #[test]
    fn xcf_modern_version_reads_precision() {
        let mut data = xcf_header(b"v011", 64, 64);
        data[26..30].copy_from_slice(&250u32.to_be_bytes());
        let result = probe_xcf(&data);
        assert_eq!(result.bit_depth, Some(16));
    }

    // ---- dispatch ----

    #[test]
    fn from_bytes_detects_then_probes() {
        let result = ProbeResult::from_bytes(&png_header(12, 34, 8, 2)).unwrap();
        assert_eq!(result.format, ImageFormat::Png);
        assert_eq!(result.width, Some(12));
        assert_eq!(result.height, Some(34));
    }

    #[test]
    fn from_bytes_rejects_unrecognized_content() {
        let err = ProbeResult::from_bytes(b"not an image at all").unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }

    // ---- probes against real encoder output ----

    #[cfg(feature = "png")]
    #[test]
    fn real_png_probe_matches_encode_input() {
        use crate::config::CodecConfig;
        use crate::pixel::PixelData;

        let pixels = PixelData::from_u8(vec![77; 64 * 48 * 3], 64, 48, 3).unwrap();
        let encoded = crate::codecs::png::encode(&pixels, &CodecConfig::default()).unwrap();

        let result = probe_png(&encoded);
        assert_eq!(result.width, Some(64));
        assert_eq!(result.height, Some(48));
        assert_eq!(result.bit_depth, Some(8));
        assert_eq!(result.has_alpha, Some(false));

        for len in (0..encoded.len().min(200)).step_by(7) {
            let _ = probe_png(&encoded[..len]);
        }
    }

    #[cfg(feature = "jpeg")]
    #[test]
    fn real_jpeg_probe_finds_dimensions() {
        use crate::config::CodecConfig;
        use crate::pixel::PixelData;

        let pixels = PixelData::from_u8(vec![128; 40 * 30 * 3], 40, 30, 3).unwrap();
        let encoded = crate::codecs::jpeg::encode(&pixels, &CodecConfig::default()).unwrap();

        let result = probe_jpeg(&encoded);
        assert_eq!(result.width, Some(40));
        assert_eq!(result.height, Some(30));
        assert_eq!(result.bit_depth, Some(8));
    }
}
