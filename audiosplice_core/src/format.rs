use std::fmt;
use std::str::FromStr;

use crate::buffer::{CanonicalBuffer, SampleBuffer};
use crate::AudioSpliceError;

/// Native sample encodings understood by the splicer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 32-bit IEEE float, already in [-1, 1].
    Float32,
    /// Signed 32-bit PCM.
    Int32,
    /// Signed 16-bit PCM.
    Int16,
    /// Unsigned 8-bit PCM.
    UInt8,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::Float32,
        SampleFormat::Int32,
        SampleFormat::Int16,
        SampleFormat::UInt8,
    ];

    /// Magnitude that maps to 1.0 in the canonical representation.
    pub const fn full_scale(self) -> f64 {
        match self {
            SampleFormat::Float32 => 1.0,
            SampleFormat::Int32 => 2_147_483_647.0,
            SampleFormat::Int16 => 32_767.0,
            SampleFormat::UInt8 => 255.0,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::Float32)
    }

    pub const fn bits_per_sample(self) -> u16 {
        match self {
            SampleFormat::Float32 | SampleFormat::Int32 => 32,
            SampleFormat::Int16 => 16,
            SampleFormat::UInt8 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SampleFormat::Float32 => "float32",
            SampleFormat::Int32 => "int32",
            SampleFormat::Int16 => "int16",
            SampleFormat::UInt8 => "uint8",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = AudioSpliceError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        SampleFormat::ALL
            .into_iter()
            .find(|format| format.name() == tag)
            .ok_or_else(|| AudioSpliceError::UnsupportedFormat(format!("sample type '{tag}'")))
    }
}

/// A primitive sample type with a fixed [`SampleFormat`].
pub trait NativeSample: Copy {
    const FORMAT: SampleFormat;

    fn to_canonical(self) -> f64;

    /// Convert a canonical value back, clipping to the type's range.
    fn from_canonical(value: f64) -> Self;
}

impl NativeSample for f32 {
    const FORMAT: SampleFormat = SampleFormat::Float32;

    fn to_canonical(self) -> f64 {
        f64::from(self)
    }

    fn from_canonical(value: f64) -> Self {
        value as f32
    }
}

macro_rules! integer_sample {
    ($ty:ty, $format:expr) => {
        impl NativeSample for $ty {
            const FORMAT: SampleFormat = $format;

            fn to_canonical(self) -> f64 {
                f64::from(self) / Self::FORMAT.full_scale()
            }

            fn from_canonical(value: f64) -> Self {
                let scaled = (value * Self::FORMAT.full_scale()).round();
                scaled.clamp(f64::from(<$ty>::MIN), f64::from(<$ty>::MAX)) as $ty
            }
        }
    };
}

integer_sample!(i32, SampleFormat::Int32);
integer_sample!(i16, SampleFormat::Int16);
integer_sample!(u8, SampleFormat::UInt8);

fn widen<T: NativeSample>(channels: &[Vec<T>]) -> Vec<Vec<f64>> {
    channels
        .iter()
        .map(|channel| channel.iter().map(|&sample| sample.to_canonical()).collect())
        .collect()
}

fn narrow<T: NativeSample>(buffer: &CanonicalBuffer) -> Vec<Vec<T>> {
    buffer
        .channels()
        .iter()
        .map(|channel| channel.iter().map(|&value| T::from_canonical(value)).collect())
        .collect()
}

/// Scale a native buffer into the canonical `f64` representation.
pub fn normalize(buffer: &SampleBuffer) -> CanonicalBuffer {
    let channels = match buffer {
        SampleBuffer::Float32(channels) => widen(channels),
        SampleBuffer::Int32(channels) => widen(channels),
        SampleBuffer::Int16(channels) => widen(channels),
        SampleBuffer::UInt8(channels) => widen(channels),
    };
    CanonicalBuffer::from_channels_unchecked(channels)
}

/// Scale a canonical buffer back into `format`.
///
/// Integer formats are rounded to the nearest step and clipped to the
/// representable range, so out-of-range values saturate instead of wrapping.
pub fn denormalize(buffer: &CanonicalBuffer, format: SampleFormat) -> SampleBuffer {
    match format {
        SampleFormat::Float32 => SampleBuffer::Float32(narrow(buffer)),
        SampleFormat::Int32 => SampleBuffer::Int32(narrow(buffer)),
        SampleFormat::Int16 => SampleBuffer::Int16(narrow(buffer)),
        SampleFormat::UInt8 => SampleBuffer::UInt8(narrow(buffer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_and_rejects_others() {
        for format in SampleFormat::ALL {
            assert_eq!(format.name().parse::<SampleFormat>().unwrap(), format);
        }
        let err = "int24".parse::<SampleFormat>().unwrap_err();
        assert!(matches!(err, AudioSpliceError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("int24"));
    }

    #[test]
    fn int16_round_trip_is_lossless() {
        let source = SampleBuffer::Int16(vec![vec![i16::MIN, -12_345, -1, 0, 1, 9_876, i16::MAX]]);
        let canonical = normalize(&source);
        assert!((canonical.channels()[0][6] - 1.0).abs() < f64::EPSILON);
        assert_eq!(denormalize(&canonical, SampleFormat::Int16), source);
    }

    #[test]
    fn int32_round_trip_stays_within_one_step() {
        let original = vec![i32::MIN, -1_000_000_007, -3, 0, 5, 2_000_000_001, i32::MAX];
        let canonical = normalize(&SampleBuffer::Int32(vec![original.clone()]));
        let SampleBuffer::Int32(restored) = denormalize(&canonical, SampleFormat::Int32) else {
            panic!("format changed during round trip");
        };
        for (before, after) in original.iter().zip(&restored[0]) {
            assert!((i64::from(*before) - i64::from(*after)).abs() <= 1);
        }
    }

    #[test]
    fn uint8_round_trip_is_lossless() {
        let source = SampleBuffer::UInt8(vec![(0..=255).collect(), (0..=255).rev().collect()]);
        let canonical = normalize(&source);
        assert_eq!(canonical.channels()[0][255], 1.0);
        assert_eq!(denormalize(&canonical, SampleFormat::UInt8), source);
    }

    #[test]
    fn float32_passes_through_exactly() {
        let source = SampleBuffer::Float32(vec![vec![-1.0, -0.123_456_79, 0.0, 1e-9, 0.75, 1.5]]);
        let canonical = normalize(&source);
        assert_eq!(canonical.channels()[0][5], 1.5);
        assert_eq!(denormalize(&canonical, SampleFormat::Float32), source);
    }

    #[test]
    fn out_of_range_values_clip_instead_of_wrapping() {
        let canonical =
            CanonicalBuffer::from_channels_unchecked(vec![vec![1.5, -1.5, 2.0, -0.2]]);
        assert_eq!(
            denormalize(&canonical, SampleFormat::Int16),
            SampleBuffer::Int16(vec![vec![i16::MAX, i16::MIN, i16::MAX, -6_553]])
        );
        assert_eq!(
            denormalize(&canonical, SampleFormat::UInt8),
            SampleBuffer::UInt8(vec![vec![255, 0, 255, 0]])
        );
    }
}
