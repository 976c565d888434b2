//! Audio decoding using symphonia
//!
//! Two views of a file: a mono buffer at the analysis rate for the DSP stages,
//! and a full-fidelity [`Track`] at its native rate for mixing and stem writing.
//! Resampling goes through rubato.

use crate::error::{RagamError, Result};
use crate::types::{AudioBuffer, Track};
use rubato::{FftFixedInOut, Resampler};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Analysis sample rate (22050 Hz)
///
/// Pitch content of interest sits well below 11 kHz.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22050;

/// Maximum file size we'll attempt to decode (2GB)
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Interleaved samples straight out of the codec
struct RawAudio {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

/// Decode to mono at [`ANALYSIS_SAMPLE_RATE`], reading at most `max_secs` seconds
pub fn decode_mono(path: &Path, max_secs: Option<f64>) -> Result<AudioBuffer> {
    let raw = decode_raw(path, max_secs)?;
    let mono = to_mono(&raw.samples, raw.channels);

    let samples = if raw.sample_rate != ANALYSIS_SAMPLE_RATE {
        resample(&mono, raw.sample_rate, ANALYSIS_SAMPLE_RATE)
    } else {
        mono
    };

    debug!(
        "Decoded {} mono samples ({:.2}s) from {}",
        samples.len(),
        samples.len() as f64 / ANALYSIS_SAMPLE_RATE as f64,
        path.display()
    );

    Ok(AudioBuffer::new(samples, ANALYSIS_SAMPLE_RATE))
}

/// Decode the whole file keeping its native rate and channel layout
pub fn decode_track(path: &Path) -> Result<Track> {
    let raw = decode_raw(path, None)?;
    if raw.channels == 0 || raw.channels > u16::MAX as usize {
        return Err(RagamError::decode_error(
            path,
            format!("Unsupported channel count: {}", raw.channels),
        ));
    }
    Ok(Track::new(raw.channels as u16, raw.sample_rate, raw.samples))
}

fn decode_raw(path: &Path, max_secs: Option<f64>) -> Result<RawAudio> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RagamError::decode_error(path, format!("Failed to read file metadata: {}", e)))?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(RagamError::decode_error(
            path,
            format!(
                "File too large ({:.1} GB). Maximum supported size is 2 GB.",
                metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
            ),
        ));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| RagamError::decode_error(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| RagamError::decode_error(path, format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| RagamError::decode_error(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params.sample_rate.unwrap_or(44100);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

    debug!("Decoding: {} @ {}Hz, {} channels", path.display(), sample_rate, channels);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| RagamError::decode_error(path, format!("Failed to create decoder: {}", e)))?;

    let max_frames = max_secs.map(|s| (s.max(0.0) * sample_rate as f64) as usize);
    let mut samples: Vec<f32> = Vec::new();

    loop {
        if let (Some(limit), true) = (max_frames, channels > 0) {
            if samples.len() / channels >= limit {
                samples.truncate(limit * channels);
                break;
            }
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(RagamError::decode_error(path, format!("Failed to read packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => {
                return Err(RagamError::decode_error(path, format!("Decode error: {}", e)));
            }
        };

        let spec = *decoded.spec();
        // Some containers only report the layout once the first packet decodes
        channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if let (Some(limit), true) = (max_frames, channels > 0) {
        samples.truncate(limit * channels);
    }

    Ok(RawAudio {
        samples,
        channels: channels.max(1),
        sample_rate,
    })
}

/// Convert interleaved multi-channel audio to mono
pub fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample one channel with rubato's FFT resampler
///
/// Falls back to linear interpolation when rubato rejects the rate pair.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    const CHUNK_SIZE: usize = 1024;

    let mut resampler = match FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1) {
        Ok(r) => r,
        Err(e) => {
            debug!("Rubato initialization failed ({}), using fallback", e);
            return resample_linear_fallback(samples, from_rate, to_rate);
        }
    };

    let input_frames_per_chunk = resampler.input_frames_next();
    let output_frames_per_chunk = resampler.output_frames_next();

    let ratio = to_rate as f64 / from_rate as f64;
    let mut output = Vec::with_capacity((samples.len() as f64 * ratio).ceil() as usize);

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + input_frames_per_chunk).min(samples.len());
        let mut chunk = samples[pos..end].to_vec();
        if chunk.len() < input_frames_per_chunk {
            chunk.resize(input_frames_per_chunk, 0.0);
        }

        match resampler.process(&[chunk], None) {
            Ok(resampled) => {
                if let Some(channel) = resampled.first() {
                    // The padded tail only contributes its share of real input
                    let valid = if pos + input_frames_per_chunk > samples.len() {
                        let input_valid = samples.len() - pos;
                        ((input_valid as f64 * ratio).ceil() as usize).min(output_frames_per_chunk)
                    } else {
                        output_frames_per_chunk
                    };
                    output.extend_from_slice(&channel[..valid.min(channel.len())]);
                }
            }
            Err(e) => {
                debug!("Rubato processing error ({}), using fallback for remaining", e);
                output.extend(resample_linear_fallback(&samples[pos..], from_rate, to_rate));
                break;
            }
        }

        pos += input_frames_per_chunk;
    }

    output
}

/// Resample every channel of a track to `to_rate`
pub fn resample_track(track: &Track, to_rate: u32) -> Track {
    if track.sample_rate == to_rate {
        return track.clone();
    }
    let channels: Vec<Vec<f32>> = (0..track.channels as usize)
        .map(|c| resample(&track.channel(c), track.sample_rate, to_rate))
        .collect();
    Track::from_channels(&channels, to_rate)
}

fn resample_linear_fallback(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio) as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let src_idx = src_pos as usize;
            let frac = (src_pos - src_idx as f64) as f32;
            if src_idx + 1 < samples.len() {
                samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
            } else {
                samples[src_idx.min(samples.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mono_averages_frames() {
        let stereo = vec![0.5, 0.3, 0.8, 0.2, 1.0, 0.0];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[2] - 0.5).abs() < 0.001);
        assert_eq!(to_mono(&mono, 1), mono);
    }

    #[test]
    fn test_resample_identity_and_empty() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 44100, 44100), samples);
        assert!(resample(&[], 44100, 22050).is_empty());
    }

    #[test]
    fn test_resample_halves_length() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let result = resample(&samples, 44100, 22050);
        assert!((result.len() as f64 - 500.0).abs() < 2.0);
    }

    #[test]
    fn test_resample_keeps_sine_amplitude() {
        use std::f32::consts::PI;
        let samples: Vec<f32> = (0..4000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        let result = resample(&samples, 48000, 44100);
        let max_val = result.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(max_val > 0.9, "peak {} should survive resampling", max_val);
    }

    #[test]
    fn test_resample_track_all_channels() {
        let track = Track::from_channels(&[vec![0.25; 2000], vec![-0.25; 2000]], 22050);
        let out = resample_track(&track, 44100);
        assert_eq!(out.channels, 2);
        assert_eq!(out.sample_rate, 44100);
        assert!((out.frames() as f64 - 4000.0).abs() < 10.0);
    }

    #[test]
    fn test_linear_fallback_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let result = resample_linear_fallback(&samples, 44100, 22050);
        assert!((result.len() as f64 - 50.0).abs() < 2.0);
    }
}
