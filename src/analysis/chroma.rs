//! Chroma extraction from a short-time Fourier transform
//!
//! Hann-windowed frames (centered, zero padded) are folded into 12 pitch
//! classes by mapping every bin between C1 and C8 to its nearest semitone.
//! Each frame is scaled so its strongest class is 1.

use super::traits::ChromaExtractor;
use crate::types::{AudioBuffer, ChromaVector};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

pub const DEFAULT_N_FFT: usize = 4096;
pub const DEFAULT_HOP: usize = 512;

/// C1 and C8 in Hz
const MIN_FREQ: f32 = 32.703;
const MAX_FREQ: f32 = 4186.01;

/// Frames whose total energy falls below this stay all-zero
const SILENCE_FLOOR: f32 = 1e-10;

/// STFT-based chroma extractor
#[derive(Debug, Clone)]
pub struct StftChroma {
    n_fft: usize,
    hop: usize,
}

impl StftChroma {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        Self {
            n_fft: n_fft.max(2),
            hop: hop.max(1),
        }
    }

    /// Pitch class for each positive-frequency bin, `None` outside C1..C8
    fn bin_classes(&self, sample_rate: u32) -> Vec<Option<usize>> {
        (0..=self.n_fft / 2)
            .map(|k| {
                let freq = k as f32 * sample_rate as f32 / self.n_fft as f32;
                if !(MIN_FREQ..=MAX_FREQ).contains(&freq) {
                    return None;
                }
                let midi = 69.0 + 12.0 * (freq / 440.0).log2();
                Some((midi.round() as i64).rem_euclid(12) as usize)
            })
            .collect()
    }
}

impl Default for StftChroma {
    fn default() -> Self {
        Self::new(DEFAULT_N_FFT, DEFAULT_HOP)
    }
}

impl ChromaExtractor for StftChroma {
    fn chromagram(&self, buffer: &AudioBuffer) -> Vec<ChromaVector> {
        if buffer.is_empty() || buffer.sample_rate == 0 {
            return Vec::new();
        }

        let n_fft = self.n_fft;
        let pad = n_fft / 2;
        let mut padded = vec![0.0f32; pad];
        padded.extend_from_slice(&buffer.samples);
        padded.resize(padded.len() + pad, 0.0);

        let window: Vec<f32> = (0..n_fft)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n_fft as f32).cos())
            .collect();
        let classes = self.bin_classes(buffer.sample_rate);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

        let n_frames = 1 + buffer.len() / self.hop;
        let mut frames = Vec::with_capacity(n_frames);
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); n_fft];

        for f in 0..n_frames {
            let start = f * self.hop;
            for (i, slot) in spectrum.iter_mut().enumerate() {
                let sample = padded.get(start + i).copied().unwrap_or(0.0);
                *slot = Complex::new(sample * window[i], 0.0);
            }
            fft.process(&mut spectrum);

            let mut chroma = [0.0f32; 12];
            for (bin, class) in classes.iter().enumerate() {
                if let Some(pc) = class {
                    chroma[*pc] += spectrum[bin].norm_sqr();
                }
            }

            let total: f32 = chroma.iter().sum();
            let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
            if total > SILENCE_FLOOR && peak > 0.0 {
                for c in chroma.iter_mut() {
                    *c /= peak;
                }
            } else {
                chroma = [0.0; 12];
            }
            frames.push(ChromaVector(chroma));
        }

        frames
    }

    fn hop_length(&self) -> usize {
        self.hop
    }

    fn name(&self) -> &'static str {
        "stft-chroma"
    }
}

/// Time in seconds of frame `index`
pub fn frames_to_time(index: usize, hop: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (index * hop) as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freqs: &[f32], secs: f32, sr: u32) -> AudioBuffer {
        let n = (secs * sr as f32) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sr as f32;
                freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum::<f32>() / freqs.len() as f32
            })
            .collect();
        AudioBuffer::new(samples, sr)
    }

    #[test]
    fn test_a440_peaks_at_a() {
        let chroma = StftChroma::default().chromagram(&tone(&[440.0], 1.0, 22050));
        let mean = ChromaVector::mean(&chroma);
        assert_eq!(mean.argmax(), 9);
    }

    #[test]
    fn test_frames_are_peak_normalized() {
        let chroma = StftChroma::default().chromagram(&tone(&[261.63, 329.63, 392.0], 1.0, 22050));
        let mid = &chroma[chroma.len() / 2];
        assert!((mid.max() - 1.0).abs() < 1e-5);
        for pc in [0, 4, 7] {
            assert!(mid.0[pc] > 0.3, "pitch class {} too weak: {:?}", pc, mid.0);
        }
    }

    #[test]
    fn test_silence_yields_zero_frames() {
        let chroma = StftChroma::default().chromagram(&AudioBuffer::new(vec![0.0; 22050], 22050));
        assert_eq!(chroma.len(), 1 + 22050 / DEFAULT_HOP);
        assert!(chroma.iter().all(|c| c.max() == 0.0));
        assert!(StftChroma::default().chromagram(&AudioBuffer::new(vec![], 22050)).is_empty());
    }

    #[test]
    fn test_frames_to_time() {
        assert!((frames_to_time(43, 512, 22050) - 0.998458).abs() < 1e-5);
        assert_eq!(frames_to_time(0, 512, 22050), 0.0);
    }
}
