//! Zeiss LSM microscopy reader.
//!
//! LSM is a TIFF container: image directories interleaved with
//! reduced-resolution thumbnail directories (NewSubfileType bit 0 set),
//! plus a private CZ_LSMINFO tag in the first directory describing the
//! acquisition (stack dimensions, channel and time counts, voxel
//! sizes). Decoding rides on the shared TIFF directory reader; this
//! module adds thumbnail skipping and the CZ_LSMINFO parse. Read-only.

use std::io::{Cursor, Read, Seek};

use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::codecs::tiff::{map_decode_err, read_frame};
use crate::error::Error;
use crate::limits::Limits;
use crate::metadata::{MetaValue, Metadata};
use crate::pixel::PixelData;
use crate::read::DecodeOutput;
use crate::ImageFormat;

/// Private Zeiss tag holding the acquisition block.
const CZ_LSM_INFO: u16 = 34412;

/// Accepted CZ_LSMINFO magic numbers (format versions 3 and 4).
const LSM_MAGIC: [u32; 2] = [0x0030_0494, 0x0040_0494];

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_i32(data: &[u8], offset: usize) -> Option<i32> {
    read_u32(data, offset).map(|v| v as i32)
}

fn read_f64(data: &[u8], offset: usize) -> Option<f64> {
    let bytes = data.get(offset..offset + 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(f64::from_le_bytes(raw))
}

/// Parse the little-endian CZ_LSMINFO block into metadata entries.
///
/// Fields past the end of a short block are simply absent; the magic
/// number must be present and recognized.
fn parse_cz_info(raw: &[u8]) -> Result<Metadata, Error> {
    let magic = read_u32(raw, 0)
        .ok_or_else(|| Error::corrupt(ImageFormat::Lsm, "CZ_LSMINFO block too short"))?;
    if !LSM_MAGIC.contains(&magic) {
        return Err(Error::corrupt(
            ImageFormat::Lsm,
            format!("bad CZ_LSMINFO magic 0x{magic:08x}"),
        ));
    }

    let mut meta = Metadata::new();
    for (key, offset) in [
        ("DimensionX", 8),
        ("DimensionY", 12),
        ("DimensionZ", 16),
        ("DimensionChannels", 20),
        ("DimensionTime", 24),
        ("DataType", 28),
    ] {
        if let Some(v) = read_i32(raw, offset) {
            meta.push(key, MetaValue::Int(i64::from(v)));
        }
    }
    for (key, offset) in [("VoxelSizeX", 40), ("VoxelSizeY", 48), ("VoxelSizeZ", 56)] {
        if let Some(v) = read_f64(raw, offset) {
            meta.push(key, MetaValue::Float(v));
        }
    }
    Ok(meta)
}

fn lsm_info<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Metadata, Error> {
    let value = decoder
        .find_tag(Tag::Unknown(CZ_LSM_INFO))
        .map_err(|e| map_decode_err(ImageFormat::Lsm, e))?
        .ok_or_else(|| Error::corrupt(ImageFormat::Lsm, "missing CZ_LSMINFO tag"))?;
    let raw = value
        .into_u8_vec()
        .map_err(|e| map_decode_err(ImageFormat::Lsm, e))?;
    parse_cz_info(&raw)
}

fn is_thumbnail<R: Read + Seek>(decoder: &mut Decoder<R>) -> bool {
    match decoder.find_tag(Tag::NewSubfileType) {
        Ok(Some(value)) => value.into_u32().map(|v| v & 1 != 0).unwrap_or(false),
        _ => false,
    }
}

fn decode_current<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    limits: Option<&Limits>,
) -> Result<PixelData, Error> {
    let pixels = read_frame(decoder, ImageFormat::Lsm, limits)?;
    match pixels.channels() {
        1 | 3 => Ok(pixels),
        n => Err(Error::variant(
            ImageFormat::Lsm,
            format!("{n}-channel data"),
        )),
    }
}

/// Full-resolution directory reader over an owned LSM blob.
///
/// Thumbnail directories are skipped, not counted as frames.
pub(crate) struct LsmFrameReader {
    decoder: Decoder<Cursor<Vec<u8>>>,
    limits: Option<Limits>,
    first: bool,
    done: bool,
}

impl LsmFrameReader {
    pub(crate) fn new(data: Vec<u8>, limits: Option<&Limits>) -> Result<Self, Error> {
        let decoder =
            Decoder::new(Cursor::new(data)).map_err(|e| map_decode_err(ImageFormat::Lsm, e))?;
        Ok(LsmFrameReader {
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
        loop {
            if self.first {
                self.first = false;
            } else {
                if !self.decoder.more_images() {
                    self.done = true;
                    return None;
                }
                if let Err(e) = self.decoder.next_image() {
                    self.done = true;
                    return Some(Err(map_decode_err(ImageFormat::Lsm, e)));
                }
            }
            if is_thumbnail(&mut self.decoder) {
                log::debug!("skipping LSM thumbnail directory");
                continue;
            }
            let result = decode_current(&mut self.decoder, self.limits.as_ref());
            if result.is_err() {
                self.done = true;
            }
            return Some(result);
        }
    }
}

/// Decode the first full-resolution directory.
pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    want_metadata: bool,
) -> Result<DecodeOutput, Error> {
    let mut reader = LsmFrameReader::new(data.to_vec(), limits)?;
    // CZ_LSMINFO lives in the first directory, before any repositioning.
    let metadata = if want_metadata {
        Some(lsm_info(&mut reader.decoder)?)
    } else {
        None
    };
    let pixels = match reader.next_frame() {
        Some(result) => result?,
        None => {
            return Err(Error::corrupt(
                ImageFormat::Lsm,
                "no full-resolution directories",
            ));
        }
    };
    Ok(DecodeOutput { pixels, metadata })
}
