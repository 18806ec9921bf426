//! Lazy iteration over the frames of a multi-page container.

use crate::error::Error;
use crate::pixel::PixelData;

/// Where a [`FrameSequence`] pulls its frames from.
///
/// One variant per container kind that can hold more than one frame,
/// plus a wrapper that presents a single decoded image as a one-element
/// sequence so callers can treat every format uniformly.
enum FrameSource {
    #[cfg(feature = "tiff")]
    Tiff(crate::codecs::tiff::TiffFrameReader),
    #[cfg(feature = "lsm")]
    Lsm(crate::codecs::lsm::LsmFrameReader),
    Single(Option<PixelData>),
    #[cfg(test)]
    Scripted(std::vec::IntoIter<Result<PixelData, Error>>),
}

/// A forward-only sequence of decoded frames from one container.
///
/// Yields `Result<PixelData, Error>` lazily: each call to `next`
/// decodes one more frame. A decode failure ends the sequence; the
/// error's detail names the zero-based index of the frame that failed,
/// and every later call returns `None`. Reaching the end of the
/// container also returns `None`, and keeps returning `None` on
/// repeated calls. The sequence cannot be rewound; reading again from
/// frame zero requires a fresh open.
///
/// Holding positional state, a `FrameSequence` is not meant to be
/// advanced from multiple threads.
pub struct FrameSequence {
    source: FrameSource,
    index: usize,
    done: bool,
}

impl FrameSequence {
    #[cfg(feature = "tiff")]
    pub(crate) fn from_tiff(reader: crate::codecs::tiff::TiffFrameReader) -> Self {
        FrameSequence::with_source(FrameSource::Tiff(reader))
    }

    #[cfg(feature = "lsm")]
    pub(crate) fn from_lsm(reader: crate::codecs::lsm::LsmFrameReader) -> Self {
        FrameSequence::with_source(FrameSource::Lsm(reader))
    }

    pub(crate) fn single(pixels: PixelData) -> Self {
        FrameSequence::with_source(FrameSource::Single(Some(pixels)))
    }

    #[cfg(test)]
    fn scripted(frames: Vec<Result<PixelData, Error>>) -> Self {
        FrameSequence::with_source(FrameSource::Scripted(frames.into_iter()))
    }

    fn with_source(source: FrameSource) -> Self {
        FrameSequence {
            source,
            index: 0,
            done: false,
        }
    }
}

impl Iterator for FrameSequence {
    type Item = Result<PixelData, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = match &mut self.source {
            #[cfg(feature = "tiff")]
            FrameSource::Tiff(reader) => reader.next_frame(),
            #[cfg(feature = "lsm")]
            FrameSource::Lsm(reader) => reader.next_frame(),
            FrameSource::Single(slot) => slot.take().map(Ok),
            #[cfg(test)]
            FrameSource::Scripted(frames) => frames.next(),
        };
        match step {
            Some(Ok(pixels)) => {
                log::debug!(
                    "frame {}: {}x{} decoded",
                    self.index,
                    pixels.width(),
                    pixels.height()
                );
                self.index += 1;
                Some(Ok(pixels))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(at_frame(e, self.index)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Tags an error's detail with the frame index it occurred at. The
/// error kind is kept as-is.
fn at_frame(err: Error, index: usize) -> Error {
    match err {
        Error::UnsupportedFormat { format, detail } => Error::UnsupportedFormat {
            format,
            detail: format!("frame {index}: {detail}"),
        },
        Error::CorruptData { format, detail } => Error::CorruptData {
            format,
            detail: format!("frame {index}: {detail}"),
        },
        Error::UnsupportedVariant { format, detail } => Error::UnsupportedVariant {
            format,
            detail: format!("frame {index}: {detail}"),
        },
        Error::UnrepresentableData { format, detail } => Error::UnrepresentableData {
            format,
            detail: format!("frame {index}: {detail}"),
        },
        Error::LimitExceeded { detail } => Error::LimitExceeded {
            detail: format!("frame {index}: {detail}"),
        },
        other => other,
    }
}
