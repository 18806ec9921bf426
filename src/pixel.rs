//! Typed pixel buffer definitions.
//!
//! Uses `imgref::ImgVec` for 2D pixel data with typed pixels from the `rgb`
//! crate. Every decoder normalizes into one of these variants: palette
//! images arrive expanded, sub-byte depths arrive widened to 8 bits, and
//! multi-byte samples are in host byte order.

pub use imgref::{Img, ImgRef, ImgRefMut, ImgVec};
pub use rgb::alt::GrayAlpha;
pub use rgb::{Gray, Rgb, Rgba};

/// Grayscale conversion weights, applied to R, G, B in that order.
const LUMA_WEIGHTS: [f32; 3] = [0.30, 0.59, 0.11];

/// Decoded pixel data in a typed buffer.
///
/// The variant determines both the channel layout and precision.
/// Width and height are embedded in the `ImgVec`.
#[derive(Clone)]
#[non_exhaustive]
pub enum PixelData {
    Gray8(ImgVec<Gray<u8>>),
    GrayA8(ImgVec<GrayAlpha<u8>>),
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
    Gray16(ImgVec<Gray<u16>>),
    GrayA16(ImgVec<GrayAlpha<u16>>),
    Rgb16(ImgVec<Rgb<u16>>),
    Rgba16(ImgVec<Rgba<u16>>),
    GrayF32(ImgVec<Gray<f32>>),
    RgbF32(ImgVec<Rgb<f32>>),
    RgbaF32(ImgVec<Rgba<f32>>),
}

impl PixelData {
    /// Build from interleaved 8-bit samples.
    ///
    /// Returns None if the channel count is not 1..=4 or the buffer
    /// length does not equal `width * height * channels`.
    pub fn from_u8(samples: Vec<u8>, width: usize, height: usize, channels: u8) -> Option<Self> {
        let expected = width
            .checked_mul(height)?
            .checked_mul(usize::from(channels))?;
        if samples.len() != expected {
            return None;
        }
        let data = match channels {
            1 => PixelData::Gray8(ImgVec::new(
                bytemuck::cast_slice::<u8, Gray<u8>>(&samples).to_vec(),
                width,
                height,
            )),
            2 => PixelData::GrayA8(ImgVec::new(
                bytemuck::cast_slice::<u8, GrayAlpha<u8>>(&samples).to_vec(),
                width,
                height,
            )),
            3 => PixelData::Rgb8(ImgVec::new(
                bytemuck::cast_slice::<u8, Rgb<u8>>(&samples).to_vec(),
                width,
                height,
            )),
            4 => PixelData::Rgba8(ImgVec::new(
                bytemuck::cast_slice::<u8, Rgba<u8>>(&samples).to_vec(),
                width,
                height,
            )),
            _ => return None,
        };
        Some(data)
    }

    /// Build from interleaved 16-bit samples in host byte order.
    pub fn from_u16(samples: Vec<u16>, width: usize, height: usize, channels: u8) -> Option<Self> {
        let expected = width
            .checked_mul(height)?
            .checked_mul(usize::from(channels))?;
        if samples.len() != expected {
            return None;
        }
        let data = match channels {
            1 => PixelData::Gray16(ImgVec::new(
                bytemuck::cast_slice::<u16, Gray<u16>>(&samples).to_vec(),
                width,
                height,
            )),
            2 => PixelData::GrayA16(ImgVec::new(
                bytemuck::cast_slice::<u16, GrayAlpha<u16>>(&samples).to_vec(),
                width,
                height,
            )),
            3 => PixelData::Rgb16(ImgVec::new(
                bytemuck::cast_slice::<u16, Rgb<u16>>(&samples).to_vec(),
                width,
                height,
            )),
            4 => PixelData::Rgba16(ImgVec::new(
                bytemuck::cast_slice::<u16, Rgba<u16>>(&samples).to_vec(),
                width,
                height,
            )),
            _ => return None,
        };
        Some(data)
    }

    /// Build from interleaved 32-bit float samples.
    ///
    /// Only 1, 3, and 4 channels exist for float data; there is no
    /// float gray+alpha layout.
    pub fn from_f32(samples: Vec<f32>, width: usize, height: usize, channels: u8) -> Option<Self> {
        let expected = width
            .checked_mul(height)?
            .checked_mul(usize::from(channels))?;
        if samples.len() != expected {
            return None;
        }
        let data = match channels {
            1 => PixelData::GrayF32(ImgVec::new(
                bytemuck::cast_slice::<f32, Gray<f32>>(&samples).to_vec(),
                width,
                height,
            )),
            3 => PixelData::RgbF32(ImgVec::new(
                bytemuck::cast_slice::<f32, Rgb<f32>>(&samples).to_vec(),
                width,
                height,
            )),
            4 => PixelData::RgbaF32(ImgVec::new(
                bytemuck::cast_slice::<f32, Rgba<f32>>(&samples).to_vec(),
                width,
                height,
            )),
            _ => return None,
        };
        Some(data)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            PixelData::Gray8(img) => img.width() as u32,
            PixelData::GrayA8(img) => img.width() as u32,
            PixelData::Rgb8(img) => img.width() as u32,
            PixelData::Rgba8(img) => img.width() as u32,
            PixelData::Gray16(img) => img.width() as u32,
            PixelData::GrayA16(img) => img.width() as u32,
            PixelData::Rgb16(img) => img.width() as u32,
            PixelData::Rgba16(img) => img.width() as u32,
            PixelData::GrayF32(img) => img.width() as u32,
            PixelData::RgbF32(img) => img.width() as u32,
            PixelData::RgbaF32(img) => img.width() as u32,
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            PixelData::Gray8(img) => img.height() as u32,
            PixelData::GrayA8(img) => img.height() as u32,
            PixelData::Rgb8(img) => img.height() as u32,
            PixelData::Rgba8(img) => img.height() as u32,
            PixelData::Gray16(img) => img.height() as u32,
            PixelData::GrayA16(img) => img.height() as u32,
            PixelData::Rgb16(img) => img.height() as u32,
            PixelData::Rgba16(img) => img.height() as u32,
            PixelData::GrayF32(img) => img.height() as u32,
            PixelData::RgbF32(img) => img.height() as u32,
            PixelData::RgbaF32(img) => img.height() as u32,
        }
    }

    /// Number of channels per pixel.
    pub fn channels(&self) -> u8 {
        match self {
            PixelData::Gray8(_) | PixelData::Gray16(_) | PixelData::GrayF32(_) => 1,
            PixelData::GrayA8(_) | PixelData::GrayA16(_) => 2,
            PixelData::Rgb8(_) | PixelData::Rgb16(_) | PixelData::RgbF32(_) => 3,
            PixelData::Rgba8(_) | PixelData::Rgba16(_) | PixelData::RgbaF32(_) => 4,
        }
    }

    /// Bits per sample (8, 16, or 32).
    pub fn bit_depth(&self) -> u8 {
        match self {
            PixelData::Gray8(_)
            | PixelData::GrayA8(_)
            | PixelData::Rgb8(_)
            | PixelData::Rgba8(_) => 8,
            PixelData::Gray16(_)
            | PixelData::GrayA16(_)
            | PixelData::Rgb16(_)
            | PixelData::Rgba16(_) => 16,
            PixelData::GrayF32(_) | PixelData::RgbF32(_) | PixelData::RgbaF32(_) => 32,
        }
    }

    /// Whether samples are floating point.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            PixelData::GrayF32(_) | PixelData::RgbF32(_) | PixelData::RgbaF32(_)
        )
    }

    /// Whether this pixel data has an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(
            self,
            PixelData::GrayA8(_)
                | PixelData::GrayA16(_)
                | PixelData::Rgba8(_)
                | PixelData::Rgba16(_)
                | PixelData::RgbaF32(_)
        )
    }

    /// Convert to grayscale using luma weights 0.30, 0.59, 0.11.
    ///
    /// Color variants produce float grayscale in the source's native
    /// value range (0..=255 for 8-bit sources, 0..=65535 for 16-bit).
    /// Alpha is ignored. Already-gray data passes through at its
    /// original precision, with alpha dropped.
    pub fn to_gray(&self) -> PixelData {
        let [wr, wg, wb] = LUMA_WEIGHTS;
        match self {
            PixelData::Gray8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                PixelData::Gray8(ImgVec::new(buf.into_owned(), w, h))
            }
            PixelData::Gray16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                PixelData::Gray16(ImgVec::new(buf.into_owned(), w, h))
            }
            PixelData::GrayF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                PixelData::GrayF32(ImgVec::new(buf.into_owned(), w, h))
            }
            PixelData::GrayA8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<u8>> = buf.iter().map(|p| Gray(p.0)).collect();
                PixelData::Gray8(ImgVec::new(gray, w, h))
            }
            PixelData::GrayA16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<u16>> = buf.iter().map(|p| Gray(p.0)).collect();
                PixelData::Gray16(ImgVec::new(gray, w, h))
            }
            PixelData::Rgb8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<f32>> = buf
                    .iter()
                    .map(|p| Gray(wr * f32::from(p.r) + wg * f32::from(p.g) + wb * f32::from(p.b)))
                    .collect();
                PixelData::GrayF32(ImgVec::new(gray, w, h))
            }
            PixelData::Rgba8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<f32>> = buf
                    .iter()
                    .map(|p| Gray(wr * f32::from(p.r) + wg * f32::from(p.g) + wb * f32::from(p.b)))
                    .collect();
                PixelData::GrayF32(ImgVec::new(gray, w, h))
            }
            PixelData::Rgb16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<f32>> = buf
                    .iter()
                    .map(|p| Gray(wr * f32::from(p.r) + wg * f32::from(p.g) + wb * f32::from(p.b)))
                    .collect();
                PixelData::GrayF32(ImgVec::new(gray, w, h))
            }
            PixelData::Rgba16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<f32>> = buf
                    .iter()
                    .map(|p| Gray(wr * f32::from(p.r) + wg * f32::from(p.g) + wb * f32::from(p.b)))
                    .collect();
                PixelData::GrayF32(ImgVec::new(gray, w, h))
            }
            PixelData::RgbF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<f32>> = buf
                    .iter()
                    .map(|p| Gray(wr * p.r + wg * p.g + wb * p.b))
                    .collect();
                PixelData::GrayF32(ImgVec::new(gray, w, h))
            }
            PixelData::RgbaF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<f32>> = buf
                    .iter()
                    .map(|p| Gray(wr * p.r + wg * p.g + wb * p.b))
                    .collect();
                PixelData::GrayF32(ImgVec::new(gray, w, h))
            }
        }
    }

    /// Drop the alpha channel, consuming self.
    ///
    /// Variants without alpha pass through untouched.
    pub fn strip_alpha(self) -> PixelData {
        match self {
            PixelData::GrayA8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<u8>> = buf.iter().map(|p| Gray(p.0)).collect();
                PixelData::Gray8(ImgVec::new(gray, w, h))
            }
            PixelData::GrayA16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let gray: Vec<Gray<u16>> = buf.iter().map(|p| Gray(p.0)).collect();
                PixelData::Gray16(ImgVec::new(gray, w, h))
            }
            PixelData::Rgba8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                    })
                    .collect();
                PixelData::Rgb8(ImgVec::new(rgb, w, h))
            }
            PixelData::Rgba16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u16>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                    })
                    .collect();
                PixelData::Rgb16(ImgVec::new(rgb, w, h))
            }
            PixelData::RgbaF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<f32>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                    })
                    .collect();
                PixelData::RgbF32(ImgVec::new(rgb, w, h))
            }
            other => other,
        }
    }

    /// Convert to RGB8 by reference, allocating a new buffer.
    ///
    /// Gray is expanded to R=G=B, alpha is discarded, 16-bit samples
    /// are truncated to their high byte, and floats are treated as
    /// normalized 0..=1 and clamped.
    pub fn to_rgb8(&self) -> ImgVec<Rgb<u8>> {
        match self {
            PixelData::Rgb8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                ImgVec::new(buf.into_owned(), w, h)
            }
            PixelData::Rgba8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::Gray8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = p.value();
                        Rgb { r: v, g: v, b: v }
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::GrayA8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = p.0;
                        Rgb { r: v, g: v, b: v }
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::Gray16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = (p.value() >> 8) as u8;
                        Rgb { r: v, g: v, b: v }
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::GrayA16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = (p.0 >> 8) as u8;
                        Rgb { r: v, g: v, b: v }
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::Rgb16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: (p.r >> 8) as u8,
                        g: (p.g >> 8) as u8,
                        b: (p.b >> 8) as u8,
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::Rgba16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: (p.r >> 8) as u8,
                        g: (p.g >> 8) as u8,
                        b: (p.b >> 8) as u8,
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::GrayF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = (p.value().clamp(0.0, 1.0) * 255.0) as u8;
                        Rgb { r: v, g: v, b: v }
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::RgbF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: (p.r.clamp(0.0, 1.0) * 255.0) as u8,
                        g: (p.g.clamp(0.0, 1.0) * 255.0) as u8,
                        b: (p.b.clamp(0.0, 1.0) * 255.0) as u8,
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
            PixelData::RgbaF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgb: Vec<Rgb<u8>> = buf
                    .iter()
                    .map(|p| Rgb {
                        r: (p.r.clamp(0.0, 1.0) * 255.0) as u8,
                        g: (p.g.clamp(0.0, 1.0) * 255.0) as u8,
                        b: (p.b.clamp(0.0, 1.0) * 255.0) as u8,
                    })
                    .collect();
                ImgVec::new(rgb, w, h)
            }
        }
    }

    /// Convert to RGBA8 by reference, allocating a new buffer.
    ///
    /// Same rules as [`Self::to_rgb8`]; variants without alpha get A=255.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                ImgVec::new(buf.into_owned(), w, h)
            }
            PixelData::GrayA8(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| Rgba {
                        r: p.0,
                        g: p.0,
                        b: p.0,
                        a: p.1,
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
            PixelData::GrayA16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| {
                        let v = (p.0 >> 8) as u8;
                        Rgba {
                            r: v,
                            g: v,
                            b: v,
                            a: (p.1 >> 8) as u8,
                        }
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
            PixelData::Rgba16(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| Rgba {
                        r: (p.r >> 8) as u8,
                        g: (p.g >> 8) as u8,
                        b: (p.b >> 8) as u8,
                        a: (p.a >> 8) as u8,
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
            PixelData::RgbaF32(img) => {
                let (buf, w, h) = img.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| Rgba {
                        r: (p.r.clamp(0.0, 1.0) * 255.0) as u8,
                        g: (p.g.clamp(0.0, 1.0) * 255.0) as u8,
                        b: (p.b.clamp(0.0, 1.0) * 255.0) as u8,
                        a: (p.a.clamp(0.0, 1.0) * 255.0) as u8,
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
            other => {
                let rgb = other.to_rgb8();
                let (buf, w, h) = rgb.as_ref().to_contiguous_buf();
                let rgba: Vec<Rgba<u8>> = buf
                    .iter()
                    .map(|p| Rgba {
                        r: p.r,
                        g: p.g,
                        b: p.b,
                        a: 255,
                    })
                    .collect();
                ImgVec::new(rgba, w, h)
            }
        }
    }

    /// Convert to RGB8, consuming self.
    ///
    /// Avoids a clone when the data is already Rgb8.
    pub fn into_rgb8(self) -> ImgVec<Rgb<u8>> {
        match self {
            PixelData::Rgb8(img) => img,
            other => other.to_rgb8(),
        }
    }

    /// Convert to RGBA8, consuming self.
    ///
    /// Avoids a clone when the data is already Rgba8.
    pub fn into_rgba8(self) -> ImgVec<Rgba<u8>> {
        match self {
            PixelData::Rgba8(img) => img,
            other => other.to_rgba8(),
        }
    }

    /// Raw interleaved samples as a byte vector, in host byte order.
    pub fn as_bytes(&self) -> Vec<u8> {
        use rgb::ComponentBytes;
        match self {
            PixelData::Gray8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::GrayA8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgb8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgba8(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Gray16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::GrayA16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgb16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::Rgba16(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::GrayF32(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::RgbF32(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
            PixelData::RgbaF32(img) => {
                let (buf, _, _) = img.as_ref().to_contiguous_buf();
                buf.as_bytes().to_vec()
            }
        }
    }
}

impl core::fmt::Debug for PixelData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let variant = match self {
            PixelData::Gray8(_) => "Gray8",
            PixelData::GrayA8(_) => "GrayA8",
            PixelData::Rgb8(_) => "Rgb8",
            PixelData::Rgba8(_) => "Rgba8",
            PixelData::Gray16(_) => "Gray16",
            PixelData::GrayA16(_) => "GrayA16",
            PixelData::Rgb16(_) => "Rgb16",
            PixelData::Rgba16(_) => "Rgba16",
            PixelData::GrayF32(_) => "GrayF32",
            PixelData::RgbF32(_) => "RgbF32",
            PixelData::RgbaF32(_) => "RgbaF32",
        };
        write!(
            f,
            "PixelData::{}({}x{})",
            variant,
            self.width(),
            self.height()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_and_alpha() {
        let img = ImgVec::new(vec![Rgb { r: 0u8, g: 0, b: 0 }; 100], 10, 10);
        let data = PixelData::Rgb8(img);
        assert_eq!(data.width(), 10);
        assert_eq!(data.height(), 10);
        assert_eq!(data.channels(), 3);
        assert_eq!(data.bit_depth(), 8);
        assert!(!data.has_alpha());
        assert!(!data.is_float());

        let img = ImgVec::new(vec![GrayAlpha(7u8, 255u8); 4], 2, 2);
        let data = PixelData::GrayA8(img);
        assert_eq!(data.channels(), 2);
        assert!(data.has_alpha());
    }

    #[test]
    fn from_u8_rejects_bad_shapes() {
        assert!(PixelData::from_u8(vec![0; 12], 2, 2, 3).is_some());
        assert!(PixelData::from_u8(vec![0; 11], 2, 2, 3).is_none());
        assert!(PixelData::from_u8(vec![0; 20], 2, 2, 5).is_none());
    }

    #[test]
    fn from_u8_preserves_sample_order() {
        let samples = vec![1u8, 2, 3, 4, 5, 6];
        let data = PixelData::from_u8(samples, 2, 1, 3).unwrap();
        match data {
            PixelData::Rgb8(img) => {
                assert_eq!(img.buf()[0], Rgb { r: 1, g: 2, b: 3 });
                assert_eq!(img.buf()[1], Rgb { r: 4, g: 5, b: 6 });
            }
            other => panic!("expected Rgb8, got {:?}", other),
        }
    }

    #[test]
    fn from_f32_has_no_two_channel_layout() {
        assert!(PixelData::from_f32(vec![0.0; 8], 2, 2, 2).is_none());
        assert!(PixelData::from_f32(vec![0.0; 4], 2, 2, 1).is_some());
    }

    #[test]
    fn to_gray_uses_luma_weights() {
        let img = ImgVec::new(
            vec![Rgb {
                r: 100u8,
                g: 200,
                b: 50,
            }],
            1,
            1,
        );
        let gray = PixelData::Rgb8(img).to_gray();
        match gray {
            PixelData::GrayF32(img) => {
                let expected = 0.30 * 100.0 + 0.59 * 200.0 + 0.11 * 50.0;
                assert!((img.buf()[0].value() - expected).abs() < 1e-4);
            }
            other => panic!("expected GrayF32, got {:?}", other),
        }
    }

    #[test]
    fn to_gray_passes_gray_through() {
        let img = ImgVec::new(vec![Gray::new(9000u16); 4], 2, 2);
        let gray = PixelData::Gray16(img).to_gray();
        match gray {
            PixelData::Gray16(img) => assert_eq!(img.buf()[0].value(), 9000),
            other => panic!("expected Gray16, got {:?}", other),
        }
    }

    #[test]
    fn to_gray_drops_alpha_at_source_depth() {
        let img = ImgVec::new(vec![GrayAlpha(40u8, 9u8)], 1, 1);
        match PixelData::GrayA8(img).to_gray() {
            PixelData::Gray8(img) => assert_eq!(img.buf()[0].value(), 40),
            other => panic!("expected Gray8, got {:?}", other),
        }

        let img = ImgVec::new(vec![GrayAlpha(700u16, 3u16)], 1, 1);
        match PixelData::GrayA16(img).to_gray() {
            PixelData::Gray16(img) => assert_eq!(img.buf()[0].value(), 700),
            other => panic!("expected Gray16, got {:?}", other),
        }
    }

    #[test]
    fn strip_alpha_variants() {
        let img = ImgVec::new(
            vec![Rgba {
                r: 1u8,
                g: 2,
                b: 3,
                a: 4,
            }],
            1,
            1,
        );
        match PixelData::Rgba8(img).strip_alpha() {
            PixelData::Rgb8(img) => assert_eq!(img.buf()[0], Rgb { r: 1, g: 2, b: 3 }),
            other => panic!("expected Rgb8, got {:?}", other),
        }

        let img = ImgVec::new(vec![GrayAlpha(5u16, 6u16)], 1, 1);
        match PixelData::GrayA16(img).strip_alpha() {
            PixelData::Gray16(img) => assert_eq!(img.buf()[0].value(), 5),
            other => panic!("expected Gray16, got {:?}", other),
        }

        let img = ImgVec::new(vec![Gray::new(8u8)], 1, 1);
        match PixelData::Gray8(img).strip_alpha() {
            PixelData::Gray8(_) => {}
            other => panic!("expected Gray8, got {:?}", other),
        }
    }

    #[test]
    fn into_rgb8_no_clone() {
        let pixels = vec![Rgb { r: 1u8, g: 2, b: 3 }; 6];
        let ptr = pixels.as_ptr();
        let img = ImgVec::new(pixels, 3, 2);
        let data = PixelData::Rgb8(img);
        let result = data.into_rgb8();
        // Same allocation, no clone happened.
        assert_eq!(result.buf().as_ptr(), ptr);
    }

    #[test]
    fn gray8_to_rgb8() {
        let img = ImgVec::new(vec![Gray::new(128u8); 4], 2, 2);
        let data = PixelData::Gray8(img);
        let rgb = data.to_rgb8();
        let px = &rgb.buf()[0];
        assert_eq!((px.r, px.g, px.b), (128, 128, 128));
    }

    #[test]
    fn f32_clamped() {
        let img = ImgVec::new(
            vec![
                Rgb {
                    r: -0.5f32,
                    g: 0.5,
                    b: 1.5,
                };
                1
            ],
            1,
            1,
        );
        let data = PixelData::RgbF32(img);
        let rgb = data.to_rgb8();
        let px = &rgb.buf()[0];
        assert_eq!((px.r, px.g, px.b), (0, 127, 255));
    }

    #[test]
    fn as_bytes_interleaves() {
        let img = ImgVec::new(vec![GrayAlpha(1u8, 2u8), GrayAlpha(3u8, 4u8)], 2, 1);
        assert_eq!(PixelData::GrayA8(img).as_bytes(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn debug_format() {
        let img = ImgVec::new(vec![Rgb { r: 0u8, g: 0, b: 0 }; 6], 3, 2);
        let data = PixelData::Rgb8(img);
        let s = format!("{:?}", data);
        assert_eq!(s, "PixelData::Rgb8(3x2)");
    }
}
