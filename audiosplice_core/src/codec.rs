use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use hound::{WavSpec, WavWriter};
use log::debug;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::default::{get_codecs, get_probe};

use crate::buffer::{Recording, SampleBuffer, MAX_CHANNELS};
use crate::format::{NativeSample, SampleFormat};
use crate::AudioSpliceError;

/// Reads and writes whole recordings.
///
/// Each call blocks until the file has been fully read or written, or
/// fails before returning.
pub trait AudioCodec {
    fn read(&self, path: &Path) -> Result<Recording, AudioSpliceError>;

    fn write(&self, path: &Path, recording: &Recording) -> Result<(), AudioSpliceError>;
}

/// WAV codec: symphonia decodes, hound encodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn read(&self, path: &Path) -> Result<Recording, AudioSpliceError> {
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|err| match err {
                SymphoniaError::Unsupported(what) => {
                    AudioSpliceError::UnsupportedFormat(what.to_owned())
                }
                other => AudioSpliceError::from(other),
            })?;
        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or(AudioSpliceError::MissingDefaultTrack)?;
        if track.codec_params.codec == CODEC_TYPE_NULL {
            return Err(AudioSpliceError::UnsupportedCodec);
        }
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(AudioSpliceError::MissingSampleRate)?;
        let capacity = track
            .codec_params
            .n_frames
            .and_then(|frames| usize::try_from(frames).ok())
            .unwrap_or(0);

        let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;
        let mut samples: Option<SampleBuffer> = None;

        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => {
                    break
                }
                Err(err) => return Err(err.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => append_decoded(&mut samples, decoded, capacity)?,
                Err(SymphoniaError::DecodeError(reason)) => {
                    debug!("skipping undecodable packet: {reason}");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let samples = samples.ok_or_else(|| {
            AudioSpliceError::UnsupportedFormat(String::from("stream contains no audio frames"))
        })?;
        Recording::new(sample_rate, samples)
    }

    fn write(&self, path: &Path, recording: &Recording) -> Result<(), AudioSpliceError> {
        let format = recording.format();
        let spec = WavSpec {
            channels: recording.channel_count() as u16,
            sample_rate: recording.sample_rate(),
            bits_per_sample: format.bits_per_sample(),
            sample_format: if format.is_float() {
                hound::SampleFormat::Float
            } else {
                hound::SampleFormat::Int
            },
        };

        let mut writer = WavWriter::create(path, spec)?;
        match recording.samples() {
            SampleBuffer::Float32(channels) => {
                for sample in SampleBuffer::interleaved(channels) {
                    writer.write_sample(sample)?;
                }
            }
            SampleBuffer::Int32(channels) => {
                for sample in SampleBuffer::interleaved(channels) {
                    writer.write_sample(sample)?;
                }
            }
            SampleBuffer::Int16(channels) => {
                for sample in SampleBuffer::interleaved(channels) {
                    writer.write_sample(sample)?;
                }
            }
            SampleBuffer::UInt8(channels) => {
                // hound takes 8-bit samples as i8 and stores them offset by 128.
                for sample in SampleBuffer::interleaved(channels) {
                    writer.write_sample((i16::from(sample) - 128) as i8)?;
                }
            }
        }
        writer.finalize()?;
        Ok(())
    }
}

fn append_decoded(
    samples: &mut Option<SampleBuffer>,
    decoded: AudioBufferRef<'_>,
    capacity: usize,
) -> Result<(), AudioSpliceError> {
    let channel_count = decoded.spec().channels.count();
    if channel_count == 0 || channel_count > MAX_CHANNELS {
        return Err(AudioSpliceError::UnsupportedChannelCount(channel_count));
    }

    match decoded {
        AudioBufferRef::F32(buf) => {
            let target = samples.get_or_insert_with(|| {
                SampleBuffer::Float32(with_capacity(channel_count, capacity))
            });
            match target {
                SampleBuffer::Float32(channels) => extend_planes(channels, &buf),
                other => return Err(format_changed(other.format(), SampleFormat::Float32)),
            }
        }
        AudioBufferRef::S32(buf) => {
            let target = samples
                .get_or_insert_with(|| SampleBuffer::Int32(with_capacity(channel_count, capacity)));
            match target {
                SampleBuffer::Int32(channels) => extend_planes(channels, &buf),
                other => return Err(format_changed(other.format(), SampleFormat::Int32)),
            }
        }
        AudioBufferRef::S16(buf) => {
            let target = samples
                .get_or_insert_with(|| SampleBuffer::Int16(with_capacity(channel_count, capacity)));
            match target {
                SampleBuffer::Int16(channels) => extend_planes(channels, &buf),
                other => return Err(format_changed(other.format(), SampleFormat::Int16)),
            }
        }
        AudioBufferRef::U8(buf) => {
            let target = samples
                .get_or_insert_with(|| SampleBuffer::UInt8(with_capacity(channel_count, capacity)));
            match target {
                SampleBuffer::UInt8(channels) => extend_planes(channels, &buf),
                other => return Err(format_changed(other.format(), SampleFormat::UInt8)),
            }
        }
        AudioBufferRef::U16(_) => return Err(unsupported("uint16")),
        AudioBufferRef::U24(_) => return Err(unsupported("uint24")),
        AudioBufferRef::U32(_) => return Err(unsupported("uint32")),
        AudioBufferRef::S8(_) => return Err(unsupported("int8")),
        AudioBufferRef::S24(_) => return Err(unsupported("int24")),
        AudioBufferRef::F64(_) => return Err(unsupported("float64")),
    }

    Ok(())
}

fn with_capacity<T>(channels: usize, frames: usize) -> Vec<Vec<T>> {
    (0..channels).map(|_| Vec::with_capacity(frames)).collect()
}

fn extend_planes<T>(channels: &mut [Vec<T>], decoded: &AudioBuffer<T>)
where
    T: Sample + NativeSample,
{
    for (index, channel) in channels.iter_mut().enumerate() {
        channel.extend_from_slice(decoded.chan(index));
    }
}

fn unsupported(sample_type: &str) -> AudioSpliceError {
    AudioSpliceError::UnsupportedFormat(format!("sample type '{sample_type}'"))
}

fn format_changed(first: SampleFormat, later: SampleFormat) -> AudioSpliceError {
    AudioSpliceError::UnsupportedFormat(format!(
        "sample type changed mid-stream from '{first}' to '{later}'"
    ))
}
