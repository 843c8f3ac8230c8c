use std::time::Duration;

use crate::buffer::{frames_to_duration, CanonicalBuffer, Segment};
use crate::AudioSpliceError;

/// Fewest outputs a splice may produce.
pub const MIN_FILE_COUNT: usize = 2;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// `offset * index * sample_rate` in nanosecond-frames, or `None` on overflow.
fn scaled_offset(offset: Duration, index: usize, sample_rate: u32) -> Option<u128> {
    offset
        .as_nanos()
        .checked_mul(index as u128)?
        .checked_mul(u128::from(sample_rate))
}

/// First frame of the segment `index` offsets into the source (1-based).
///
/// Saturates at `usize::MAX` when the position is not representable.
pub fn start_frame(offset: Duration, index: usize, sample_rate: u32) -> usize {
    scaled_offset(offset, index, sample_rate)
        .and_then(|scaled| usize::try_from(scaled / NANOS_PER_SEC).ok())
        .unwrap_or(usize::MAX)
}

/// Check that `count` segments spaced `offset` apart all fit inside a
/// source of `frames` frames.
pub fn validate(
    frames: usize,
    sample_rate: u32,
    offset: Duration,
    count: usize,
) -> Result<(), AudioSpliceError> {
    if count < MIN_FILE_COUNT {
        return Err(AudioSpliceError::InsufficientFileCount { requested: count });
    }
    if offset.is_zero() {
        return Err(AudioSpliceError::InvalidOffset);
    }

    // duration <= offset * count, compared in exact integer nanoseconds.
    // An overflowing product can never fit inside the source.
    let source_nanos = frames as u128 * NANOS_PER_SEC;
    let too_short = scaled_offset(offset, count, sample_rate)
        .map_or(true, |required_nanos| source_nanos <= required_nanos);
    if too_short {
        return Err(AudioSpliceError::SourceTooShort {
            source_secs: frames_to_duration(frames, sample_rate).as_secs_f64(),
            required_secs: offset.as_secs_f64() * count as f64,
        });
    }

    Ok(())
}

/// Derive `count` views of `buffer`, the i-th starting `offset * i` into it.
///
/// Every view runs to the end of the buffer, so each one is strictly shorter
/// than the one before it.
pub fn segment(
    buffer: &CanonicalBuffer,
    sample_rate: u32,
    offset: Duration,
    count: usize,
) -> Result<Vec<Segment<'_>>, AudioSpliceError> {
    validate(buffer.frames(), sample_rate, offset, count)?;

    Ok((1..=count)
        .map(|index| buffer.suffix(start_frame(offset, index, sample_rate)))
        .collect())
}
