use std::time::Duration;

use crate::format::{NativeSample, SampleFormat};
use crate::AudioSpliceError;

/// Most channels a recording may carry.
pub const MAX_CHANNELS: usize = 2;

/// Channels-first samples in their native encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuffer {
    Float32(Vec<Vec<f32>>),
    Int32(Vec<Vec<i32>>),
    Int16(Vec<Vec<i16>>),
    UInt8(Vec<Vec<u8>>),
}

impl SampleBuffer {
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBuffer::Float32(_) => SampleFormat::Float32,
            SampleBuffer::Int32(_) => SampleFormat::Int32,
            SampleBuffer::Int16(_) => SampleFormat::Int16,
            SampleBuffer::UInt8(_) => SampleFormat::UInt8,
        }
    }

    pub fn channel_count(&self) -> usize {
        match self {
            SampleBuffer::Float32(channels) => channels.len(),
            SampleBuffer::Int32(channels) => channels.len(),
            SampleBuffer::Int16(channels) => channels.len(),
            SampleBuffer::UInt8(channels) => channels.len(),
        }
    }

    /// Number of frames, taken from the first channel.
    pub fn frames(&self) -> usize {
        fn first_len<T>(channels: &[Vec<T>]) -> usize {
            channels.first().map_or(0, Vec::len)
        }

        match self {
            SampleBuffer::Float32(channels) => first_len(channels),
            SampleBuffer::Int32(channels) => first_len(channels),
            SampleBuffer::Int16(channels) => first_len(channels),
            SampleBuffer::UInt8(channels) => first_len(channels),
        }
    }

    fn channel_lengths(&self) -> Vec<usize> {
        fn lengths<T>(channels: &[Vec<T>]) -> Vec<usize> {
            channels.iter().map(Vec::len).collect()
        }

        match self {
            SampleBuffer::Float32(channels) => lengths(channels),
            SampleBuffer::Int32(channels) => lengths(channels),
            SampleBuffer::Int16(channels) => lengths(channels),
            SampleBuffer::UInt8(channels) => lengths(channels),
        }
    }

    /// Interleave the channels frame by frame, as WAV stores them.
    pub fn interleaved<T: NativeSample>(channels: &[Vec<T>]) -> impl Iterator<Item = T> + '_ {
        let frames = channels.first().map_or(0, Vec::len);
        (0..frames).flat_map(move |frame| channels.iter().map(move |channel| channel[frame]))
    }
}

/// A decoded recording: sample rate plus native samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Recording {
    sample_rate: u32,
    samples: SampleBuffer,
}

impl Recording {
    /// Validate and wrap a buffer. Mono and stereo are accepted, and all
    /// channels must have the same length.
    pub fn new(sample_rate: u32, samples: SampleBuffer) -> Result<Self, AudioSpliceError> {
        if sample_rate == 0 {
            return Err(AudioSpliceError::InvalidSampleRate);
        }

        let lengths = samples.channel_lengths();
        if lengths.is_empty() || lengths.len() > MAX_CHANNELS {
            return Err(AudioSpliceError::UnsupportedChannelCount(lengths.len()));
        }
        if lengths.windows(2).any(|pair| pair[0] != pair[1]) {
            return Err(AudioSpliceError::ChannelLengthMismatch);
        }

        Ok(Self {
            sample_rate,
            samples,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn format(&self) -> SampleFormat {
        self.samples.format()
    }

    pub fn channel_count(&self) -> usize {
        self.samples.channel_count()
    }

    pub fn frames(&self) -> usize {
        self.samples.frames()
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }
}

pub(crate) fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    let nanos = frames as u128 * 1_000_000_000 / u128::from(sample_rate);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Channels-first `f64` samples scaled to [-1, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalBuffer {
    channels: Vec<Vec<f64>>,
}

impl CanonicalBuffer {
    /// Wrap channels that are already known to share one length.
    pub(crate) fn from_channels_unchecked(channels: Vec<Vec<f64>>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Borrow the whole buffer as a segment starting at frame zero.
    pub fn as_segment(&self) -> Segment<'_> {
        self.suffix(0)
    }

    /// Borrow the frames from `start` to the end. `start` is clamped to
    /// the buffer length.
    pub fn suffix(&self, start: usize) -> Segment<'_> {
        let start = start.min(self.frames());
        Segment {
            start,
            channels: self.channels.iter().map(|channel| &channel[start..]).collect(),
        }
    }
}

/// A borrowed, channels-first view into a [`CanonicalBuffer`].
#[derive(Clone, Debug, PartialEq)]
pub struct Segment<'a> {
    start: usize,
    channels: Vec<&'a [f64]>,
}

impl<'a> Segment<'a> {
    /// Frame in the source buffer at which this view begins.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, |channel| channel.len())
    }

    pub fn channels(&self) -> &[&'a [f64]] {
        &self.channels
    }

    /// Drop frames from the end so that at most `frames` remain.
    pub fn truncate(&mut self, frames: usize) {
        for channel in &mut self.channels {
            let end = frames.min(channel.len());
            *channel = &channel[..end];
        }
    }

    pub fn to_buffer(&self) -> CanonicalBuffer {
        CanonicalBuffer::from_channels_unchecked(
            self.channels.iter().map(|channel| channel.to_vec()).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_rejects_bad_shapes() {
        assert!(matches!(
            Recording::new(0, SampleBuffer::Int16(vec![vec![0; 4]])),
            Err(AudioSpliceError::InvalidSampleRate)
        ));
        assert!(matches!(
            Recording::new(8_000, SampleBuffer::Int16(Vec::new())),
            Err(AudioSpliceError::UnsupportedChannelCount(0))
        ));
        assert!(matches!(
            Recording::new(8_000, SampleBuffer::Int16(vec![vec![0; 4]; 3])),
            Err(AudioSpliceError::UnsupportedChannelCount(3))
        ));
        assert!(matches!(
            Recording::new(8_000, SampleBuffer::UInt8(vec![vec![0; 4], vec![0; 5]])),
            Err(AudioSpliceError::ChannelLengthMismatch)
        ));
    }

    #[test]
    fn recording_reports_duration() {
        let recording =
            Recording::new(8_000, SampleBuffer::Float32(vec![vec![0.0; 12_000]; 2])).unwrap();
        assert_eq!(recording.frames(), 12_000);
        assert_eq!(recording.channel_count(), 2);
        assert_eq!(recording.duration(), Duration::from_millis(1_500));
    }

    #[test]
    fn suffix_and_truncate_share_the_source() {
        let buffer =
            CanonicalBuffer::from_channels_unchecked(vec![vec![0.0, 0.1, 0.2, 0.3, 0.4]; 2]);
        let mut view = buffer.suffix(2);
        assert_eq!(view.start(), 2);
        assert_eq!(view.frames(), 3);
        view.truncate(2);
        assert_eq!(view.channels(), &[&[0.2, 0.3][..], &[0.2, 0.3][..]]);
        assert_eq!(buffer.suffix(99).frames(), 0);
    }

    #[test]
    fn interleaves_frame_by_frame() {
        let channels = vec![vec![1i16, 2, 3], vec![-1, -2, -3]];
        let interleaved: Vec<i16> = SampleBuffer::interleaved(&channels).collect();
        assert_eq!(interleaved, vec![1, -1, 2, -2, 3, -3]);
    }
}
