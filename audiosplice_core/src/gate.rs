//! Raised-cosine fade-in/fade-out applied to each output segment.

use std::f64::consts::PI;
use std::time::Duration;

use crate::buffer::{CanonicalBuffer, Segment};
use crate::AudioSpliceError;

/// Length of one side of the gate.
pub const RAMP_DURATION: Duration = Duration::from_millis(20);

/// Number of frames in a ramp of `ramp` at `sample_rate`, rounded down.
pub fn ramp_frames(ramp: Duration, sample_rate: u32) -> usize {
    let frames = ramp.as_nanos() * u128::from(sample_rate) / 1_000_000_000;
    usize::try_from(frames).unwrap_or(usize::MAX)
}

/// Rising half of the gate: `(cos(linspace(π, 2π, len)) + 1) / 2`.
///
/// Both end points are included, so the ramp starts at exactly 0 and, for
/// `len > 1`, ends at exactly 1.
pub fn rise(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = PI / (len - 1) as f64;
            (0..len)
                .map(|n| ((PI + step * n as f64).cos() + 1.0) / 2.0)
                .collect()
        }
    }
}

/// Full gain curve for `frames` frames: rise, unity sustain, then the
/// rise reversed.
pub fn envelope(frames: usize, ramp_frames: usize) -> Result<Vec<f64>, AudioSpliceError> {
    if frames <= ramp_frames.saturating_mul(2) {
        return Err(AudioSpliceError::SegmentTooShort {
            frames,
            ramp_frames,
        });
    }

    let rise = rise(ramp_frames);
    let mut envelope = Vec::with_capacity(frames);
    envelope.extend_from_slice(&rise);
    envelope.resize(frames - ramp_frames, 1.0);
    envelope.extend(rise.iter().rev());
    Ok(envelope)
}

/// Multiply every channel of `segment` by the same envelope.
pub fn gate(
    segment: &Segment<'_>,
    ramp: Duration,
    sample_rate: u32,
) -> Result<CanonicalBuffer, AudioSpliceError> {
    let envelope = envelope(segment.frames(), ramp_frames(ramp, sample_rate))?;

    let channels = segment
        .channels()
        .iter()
        .map(|channel| {
            channel
                .iter()
                .zip(&envelope)
                .map(|(sample, gain)| sample * gain)
                .collect()
        })
        .collect();

    Ok(CanonicalBuffer::from_channels_unchecked(channels))
}
