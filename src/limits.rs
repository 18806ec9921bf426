//! Resource limits for decode operations.

/// Caps on what a decode is allowed to produce.
///
/// Hostile files can declare absurd dimensions in a few header bytes;
/// these checks run before any pixel buffer is allocated. All limits
/// are optional.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u64>,
    /// Maximum image height in pixels.
    pub max_height: Option<u64>,
    /// Maximum total pixels (width x height).
    pub max_pixels: Option<u64>,
    /// Maximum decoded buffer size in bytes.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No restrictions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check declared dimensions against the limits.
    ///
    /// Returns `Err` with a description if any limit is exceeded.
    pub fn check_dimensions(&self, width: u64, height: u64) -> Result<(), &'static str> {
        if let Some(max_width) = self.max_width {
            if width > max_width {
                return Err("width exceeds limit");
            }
        }

        if let Some(max_height) = self.max_height {
            if height > max_height {
                return Err("height exceeds limit");
            }
        }

        if let Some(max_pixels) = self.max_pixels {
            let pixels = width.saturating_mul(height);
            if pixels > max_pixels {
                return Err("pixel count exceeds limit");
            }
        }

        Ok(())
    }

    /// Check a pending allocation against the memory limit.
    pub fn check_memory(&self, bytes: u64) -> Result<(), &'static str> {
        if let Some(max_memory) = self.max_memory_bytes {
            if bytes > max_memory {
                return Err("decoded size exceeds memory limit");
            }
        }
        Ok(())
    }
}

/// Byte size of a `width` x `height` buffer at `bytes_per_pixel`,
/// or None on arithmetic overflow.
pub(crate) fn buffer_size(width: u64, height: u64, bytes_per_pixel: u64) -> Option<u64> {
    width
        .checked_mul(height)
        .and_then(|p| p.checked_mul(bytes_per_pixel))
}
