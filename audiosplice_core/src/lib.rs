//! Split one recording into several time-shifted, equal-length WAV files.
//!
//! Output `i` (1-based) starts `offset * i` into the source. All outputs are
//! trimmed to the length of the shortest one and can be faded in and out
//! with a short raised-cosine ramp. The source's sample rate, sample format
//! and channel count are kept.

mod buffer;
mod codec;
mod equalize;
mod format;
mod gate;
mod segment;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

pub use buffer::{CanonicalBuffer, Recording, SampleBuffer, Segment, MAX_CHANNELS};
pub use codec::{AudioCodec, WavCodec};
pub use equalize::equalize;
pub use format::{denormalize, normalize, NativeSample, SampleFormat};
pub use gate::{envelope, gate, ramp_frames, rise, RAMP_DURATION};
pub use segment::{segment, start_frame, MIN_FILE_COUNT};

/// Errors that can occur while splicing audio files.
#[derive(Debug, Error)]
pub enum AudioSpliceError {
    /// The offset between successive files was zero.
    #[error("offset between files must be greater than zero")]
    InvalidOffset,

    /// Fewer than [`MIN_FILE_COUNT`] output files were requested.
    #[error("at least {min} output files are required, but {requested} were requested", min = MIN_FILE_COUNT)]
    InsufficientFileCount { requested: usize },

    /// The source does not outlast `offset * count`.
    #[error(
        "source is too short to splice: it lasts {source_secs:.3}s but the requested files need more than {required_secs:.3}s"
    )]
    SourceTooShort { source_secs: f64, required_secs: f64 },

    /// The equalized segments cannot hold a fade-in and a fade-out.
    #[error(
        "segments of {frames} frames are too short for two ramps of {ramp_frames} frames each"
    )]
    SegmentTooShort { frames: usize, ramp_frames: usize },

    /// The sample encoding is not one of the supported formats.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Only mono and stereo recordings are handled.
    #[error("unsupported channel count {0}; only mono and stereo are supported")]
    UnsupportedChannelCount(usize),

    /// Channels of one recording had different lengths.
    #[error("all channels of a recording must have the same length")]
    ChannelLengthMismatch,

    /// A recording declared a sample rate of zero.
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track")]
    MissingDefaultTrack,

    /// Error returned when the codec of the track cannot be handled.
    #[error("unsupported codec")]
    UnsupportedCodec,

    /// The destination directory disappeared after configuration.
    #[error("output directory does not exist: {}", .0.display())]
    MissingOutputDirectory(PathBuf),

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around errors produced by the hound WAV writer.
    #[error(transparent)]
    Wav(#[from] hound::Error),

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parameters of a splice that do not depend on where the audio lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpliceOptions {
    /// Number of output files.
    pub file_count: usize,
    /// Distance between the starts of successive outputs.
    pub offset: Duration,
    /// Fade length applied at both ends of every output, if any.
    pub ramp: Option<Duration>,
}

/// Configuration for the audio splicing operation.
#[derive(Clone, Debug)]
pub struct Config {
    /// Canonicalized path of the source file to splice.
    pub input_path: PathBuf,
    /// Canonicalized directory into which the output files will be written.
    pub output_dir: PathBuf,
    /// Number of output files to produce.
    pub file_count: usize,
    /// Offset between the starts of successive output files.
    pub offset: Duration,
    /// Whether to fade each output in and out over [`RAMP_DURATION`].
    pub ramps: bool,
}

/// Builder for [`Config`] that allows optional parameters to be customised.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    input_path: PathBuf,
    output_dir: PathBuf,
    file_count: usize,
    offset: Duration,
    ramps: bool,
}

impl ConfigBuilder {
    fn new(input_path: PathBuf, output_dir: PathBuf, file_count: usize, offset: Duration) -> Self {
        Self {
            input_path,
            output_dir,
            file_count,
            offset,
            ramps: true,
        }
    }

    /// Enable or disable the fade-in/fade-out ramps. Enabled by default.
    pub fn ramps(mut self, ramps: bool) -> Self {
        self.ramps = ramps;
        self
    }

    /// Validate the parameters and canonicalize both paths.
    pub fn build(self) -> Result<Config, AudioSpliceError> {
        if self.file_count < MIN_FILE_COUNT {
            return Err(AudioSpliceError::InsufficientFileCount {
                requested: self.file_count,
            });
        }
        if self.offset.is_zero() {
            return Err(AudioSpliceError::InvalidOffset);
        }

        let input_path = fs::canonicalize(&self.input_path)?;
        let output_dir = fs::canonicalize(&self.output_dir)?;

        Ok(Config {
            input_path,
            output_dir,
            file_count: self.file_count,
            offset: self.offset,
            ramps: self.ramps,
        })
    }
}

impl Config {
    /// Construct a new [`Config`] with ramps enabled.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        file_count: usize,
        offset: Duration,
    ) -> Result<Self, AudioSpliceError> {
        Self::builder(input, output, file_count, offset).build()
    }

    /// Start building a [`Config`].
    pub fn builder<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output: Q,
        file_count: usize,
        offset: Duration,
    ) -> ConfigBuilder {
        ConfigBuilder::new(
            input.as_ref().to_path_buf(),
            output.as_ref().to_path_buf(),
            file_count,
            offset,
        )
    }

    /// The audio-side parameters of this configuration.
    pub fn splice_options(&self) -> SpliceOptions {
        SpliceOptions {
            file_count: self.file_count,
            offset: self.offset,
            ramp: self.ramps.then_some(RAMP_DURATION),
        }
    }

    /// Path of the `index`-th output file (0-based), named `<index + 1>.wav`.
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("{}.wav", index + 1))
    }

    fn output_paths(&self) -> Vec<PathBuf> {
        (0..self.file_count).map(|index| self.output_path(index)).collect()
    }
}

/// Progress notifications emitted while the outputs are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Every output has been computed and writing is about to begin.
    Start {
        total_files: usize,
        frames_per_file: usize,
    },
    /// Emitted right before output `index` (1-based) is written.
    Writing { index: usize, path: PathBuf },
    /// Every output has been written.
    Finish { files_written: usize },
}

/// What a run would produce, computed without writing anything.
#[derive(Clone, Debug, PartialEq)]
pub struct SplicePlan {
    /// Sample rate shared by the source and every output.
    pub sample_rate: u32,
    /// Sample format shared by the source and every output.
    pub format: SampleFormat,
    /// Channel count of the source.
    pub channels: usize,
    /// Length of every output in frames.
    pub frames_per_file: usize,
    /// Paths that would be written, in order.
    pub outputs: Vec<PathBuf>,
}

impl SplicePlan {
    /// Length of every output as a duration.
    pub fn duration_per_file(&self) -> Duration {
        buffer::frames_to_duration(self.frames_per_file, self.sample_rate)
    }
}

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of files written.
    pub files_written: usize,
    /// Length of every written file in frames.
    pub frames_per_file: usize,
    /// Paths of the written files, in order.
    pub outputs: Vec<PathBuf>,
}

/// Cut `recording` into `options.file_count` offset, equal-length outputs.
///
/// The source is normalized once, segmented, equalized, gated when a ramp is
/// set, and converted back to the source's sample format. Every validation
/// happens here, so a caller that writes the result only afterwards never
/// leaves partial output behind on a rejected request.
pub fn splice(
    recording: &Recording,
    options: &SpliceOptions,
) -> Result<Vec<Recording>, AudioSpliceError> {
    let sample_rate = recording.sample_rate();
    let format = recording.format();
    let canonical = normalize(recording.samples());

    let segments = segment(&canonical, sample_rate, options.offset, options.file_count)?;
    let segments = equalize(segments);

    segments
        .iter()
        .map(|view| {
            let shaped = match options.ramp {
                Some(ramp) => gate(view, ramp, sample_rate)?,
                None => view.to_buffer(),
            };
            Recording::new(sample_rate, denormalize(&shaped, format))
        })
        .collect()
}

/// Decode the input and report what a run would write, without writing.
pub fn plan(config: &Config) -> Result<SplicePlan, AudioSpliceError> {
    plan_with_codec(config, &WavCodec)
}

/// [`plan`] with a caller-supplied codec.
pub fn plan_with_codec<C: AudioCodec>(
    config: &Config,
    codec: &C,
) -> Result<SplicePlan, AudioSpliceError> {
    let recording = codec.read(&config.input_path)?;
    let options = config.splice_options();
    segment::validate(
        recording.frames(),
        recording.sample_rate(),
        options.offset,
        options.file_count,
    )?;

    let frames_per_file = recording.frames()
        - start_frame(options.offset, options.file_count, recording.sample_rate());
    if let Some(ramp) = options.ramp {
        // Fails early with the same error `splice` would report.
        envelope(frames_per_file, ramp_frames(ramp, recording.sample_rate()))?;
    }

    Ok(SplicePlan {
        sample_rate: recording.sample_rate(),
        format: recording.format(),
        channels: recording.channel_count(),
        frames_per_file,
        outputs: config.output_paths(),
    })
}

/// Perform the splicing operation using the supplied [`Config`].
pub fn run(config: Config) -> Result<RunSummary, AudioSpliceError> {
    run_with_progress(config, |_| {})
}

/// Perform the splicing operation, reporting progress to `progress`.
pub fn run_with_progress<F>(config: Config, progress: F) -> Result<RunSummary, AudioSpliceError>
where
    F: FnMut(ProgressEvent),
{
    run_with_codec(config, &WavCodec, progress)
}

/// Perform the splicing operation with a caller-supplied codec.
///
/// Files already written stay on disk if a later write fails.
pub fn run_with_codec<C, F>(
    config: Config,
    codec: &C,
    mut progress: F,
) -> Result<RunSummary, AudioSpliceError>
where
    C: AudioCodec,
    F: FnMut(ProgressEvent),
{
    if !config.output_dir.is_dir() {
        return Err(AudioSpliceError::MissingOutputDirectory(
            config.output_dir.clone(),
        ));
    }

    let recording = codec.read(&config.input_path)?;
    info!(
        "decoded '{}': {} Hz, {}, {} channel(s), {} frames",
        config.input_path.display(),
        recording.sample_rate(),
        recording.format(),
        recording.channel_count(),
        recording.frames()
    );

    let options = config.splice_options();
    let outputs = splice(&recording, &options)?;
    drop(recording);

    let frames_per_file = outputs.first().map_or(0, Recording::frames);
    info!(
        "writing {} file(s) offset by {:?}, {} frames each, ramps {}",
        outputs.len(),
        options.offset,
        frames_per_file,
        if options.ramp.is_some() { "on" } else { "off" }
    );

    progress(ProgressEvent::Start {
        total_files: outputs.len(),
        frames_per_file,
    });

    let mut written = Vec::with_capacity(outputs.len());
    for (index, output) in outputs.iter().enumerate() {
        let path = config.output_path(index);
        progress(ProgressEvent::Writing {
            index: index + 1,
            path: path.clone(),
        });
        codec.write(&path, output)?;
        debug!("wrote '{}'", path.display());
        written.push(path);
    }

    progress(ProgressEvent::Finish {
        files_written: written.len(),
    });
    info!("created {} file(s) in '{}'", written.len(), config.output_dir.display());

    Ok(RunSummary {
        files_written: written.len(),
        frames_per_file,
        outputs: written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_i16(seconds: usize, sample_rate: u32) -> Recording {
        let frames = seconds * sample_rate as usize;
        let samples = (0..frames)
            .map(|n| {
                let t = n as f64 / f64::from(sample_rate);
                ((t * 440.0 * std::f64::consts::TAU).sin() * 20_000.0) as i16
            })
            .collect();
        Recording::new(sample_rate, SampleBuffer::Int16(vec![samples])).unwrap()
    }

    fn options(file_count: usize, offset_secs: u64, ramp: bool) -> SpliceOptions {
        SpliceOptions {
            file_count,
            offset: Duration::from_secs(offset_secs),
            ramp: ramp.then_some(RAMP_DURATION),
        }
    }

    #[test]
    fn mono_int16_yields_equal_length_outputs() {
        let source = tone_i16(10, 48_000);
        let outputs = splice(&source, &options(3, 2, true)).unwrap();

        assert_eq!(outputs.len(), 3);
        for output in &outputs {
            assert_eq!(output.frames(), 192_000);
            assert_eq!(output.format(), SampleFormat::Int16);
            assert_eq!(output.sample_rate(), 48_000);
            assert_eq!(output.channel_count(), 1);
        }
    }

    #[test]
    fn outputs_without_ramps_are_exact_source_slices() {
        let source = tone_i16(10, 8_000);
        let outputs = splice(&source, &options(4, 2, false)).unwrap();
        let SampleBuffer::Int16(original) = source.samples() else {
            unreachable!()
        };

        for (index, output) in outputs.iter().enumerate() {
            let start = 2 * 8_000 * (index + 1);
            let SampleBuffer::Int16(channels) = output.samples() else {
                panic!("output changed format");
            };
            assert_eq!(channels[0].len(), 16_000);
            assert_eq!(channels[0][..], original[0][start..start + 16_000]);
        }
    }

    #[test]
    fn single_file_is_rejected() {
        let err = splice(&tone_i16(10, 48_000), &options(1, 2, true)).unwrap_err();
        assert!(matches!(
            err,
            AudioSpliceError::InsufficientFileCount { requested: 1 }
        ));
    }

    #[test]
    fn short_source_is_rejected() {
        let err = splice(&tone_i16(5, 48_000), &options(3, 2, true)).unwrap_err();
        assert!(matches!(err, AudioSpliceError::SourceTooShort { .. }));
        assert!(err.to_string().contains("5.000s"));
    }

    #[test]
    fn ramps_need_room_after_equalization() {
        // Outputs of 10 frames cannot hold two 20 ms ramps at 1 kHz.
        let source =
            Recording::new(1_000, SampleBuffer::Float32(vec![vec![0.5; 2_010]])).unwrap();
        let err = splice(&source, &options(2, 1, true)).unwrap_err();
        assert!(matches!(
            err,
            AudioSpliceError::SegmentTooShort {
                frames: 10,
                ramp_frames: 20
            }
        ));
        assert!(splice(&source, &options(2, 1, false)).is_ok());
    }

    #[test]
    fn stereo_float32_channels_share_the_envelope() {
        let frames = 4 * 8_000;
        let left: Vec<f32> = (0..frames).map(|n| ((n % 100) as f32 / 100.0) - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|sample| sample * -0.5).collect();
        let source =
            Recording::new(8_000, SampleBuffer::Float32(vec![left, right])).unwrap();

        let outputs = splice(&source, &options(3, 1, true)).unwrap();

        for output in &outputs {
            let SampleBuffer::Float32(channels) = output.samples() else {
                panic!("output changed format");
            };
            assert_eq!(channels.len(), 2);
            assert_eq!(channels[0].len(), 8_000);
            assert_eq!(channels[1].len(), 8_000);
            assert_eq!(channels[0][0], 0.0);
            for (l, r) in channels[0].iter().zip(&channels[1]) {
                assert!((l * -0.5 - r).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn output_paths_are_numbered_from_one() {
        let config = Config {
            input_path: PathBuf::from("/in/source.wav"),
            output_dir: PathBuf::from("/out"),
            file_count: 3,
            offset: Duration::from_secs(1),
            ramps: true,
        };
        assert_eq!(
            config.output_paths(),
            vec![
                PathBuf::from("/out/1.wav"),
                PathBuf::from("/out/2.wav"),
                PathBuf::from("/out/3.wav"),
            ]
        );
        assert_eq!(config.splice_options().ramp, Some(RAMP_DURATION));
    }
}
