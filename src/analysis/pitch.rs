//! Probabilistic YIN pitch tracking
//!
//! Per frame: the YIN cumulative-mean-normalized difference function is
//! computed through an FFT cross-correlation, then a Beta(2, 18) distribution
//! over absolute thresholds assigns probability mass to the first trough below
//! each threshold (the pYIN observation model). The trough holding the most
//! mass gives the period; the total assigned mass is the voicing probability.

use super::chroma::frames_to_time;
use super::traits::{PitchFrame, PitchTracker};
use crate::types::AudioBuffer;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// C2 and C7 in Hz
pub const FMIN_C2: f32 = 65.406;
pub const FMAX_C7: f32 = 2093.0;

pub const DEFAULT_FRAME_LENGTH: usize = 2048;
pub const DEFAULT_HOP: usize = 512;

/// Number of discrete thresholds in the prior
const N_THRESHOLDS: usize = 100;

/// Frames below this mean energy are treated as silence
const ENERGY_FLOOR: f32 = 1e-8;

/// Voicing probability needed to call a frame voiced
pub const VOICING_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct ProbabilisticYin {
    fmin: f32,
    fmax: f32,
    frame_length: usize,
    hop: usize,
    prior: Vec<(f32, f32)>,
}

impl ProbabilisticYin {
    pub fn new(fmin: f32, fmax: f32, frame_length: usize, hop: usize) -> Self {
        Self {
            fmin,
            fmax,
            frame_length: frame_length.max(64),
            hop: hop.max(1),
            prior: beta_prior(N_THRESHOLDS, 2.0, 18.0),
        }
    }

    /// Vocal-range tracker (C2..C7) with 2048-sample frames
    pub fn vocal_range() -> Self {
        Self::new(FMIN_C2, FMAX_C7, DEFAULT_FRAME_LENGTH, DEFAULT_HOP)
    }

    pub fn hop_length(&self) -> usize {
        self.hop
    }

    /// Estimate (f0, voicing probability) for one frame of `frame_length` samples
    fn analyze_frame(&self, frame: &[f32], sample_rate: u32, fft: &FftContext) -> (f32, f32) {
        let win = self.frame_length / 2;
        let tau_min = ((sample_rate as f32 / self.fmax).floor() as usize).max(1);
        let tau_max = ((sample_rate as f32 / self.fmin).ceil() as usize).min(self.frame_length - win - 1);
        if tau_min + 1 >= tau_max {
            return (f32::NAN, 0.0);
        }

        let energy: f32 = frame[..win].iter().map(|s| s * s).sum::<f32>() / win as f32;
        if energy < ENERGY_FLOOR {
            return (f32::NAN, 0.0);
        }

        let cmnd = cumulative_mean_normalized_difference(frame, win, tau_max, fft);

        // Local minima inside the search band
        let troughs: Vec<usize> = (tau_min.max(1)..tau_max)
            .filter(|&t| cmnd[t] < cmnd[t - 1] && cmnd[t] <= cmnd[t + 1])
            .collect();
        if troughs.is_empty() {
            return (f32::NAN, 0.0);
        }

        let mut mass = vec![0.0f32; troughs.len()];
        for &(threshold, weight) in &self.prior {
            if let Some(i) = troughs.iter().position(|&t| cmnd[t] < threshold) {
                mass[i] += weight;
            }
        }

        let voiced_prob: f32 = mass.iter().sum();
        let mut best = 0;
        for (i, &m) in mass.iter().enumerate() {
            if m > mass[best] {
                best = i;
            }
        }
        if mass[best] <= 0.0 {
            return (f32::NAN, voiced_prob);
        }

        let period = parabolic_peak(&cmnd, troughs[best]);
        let f0 = sample_rate as f32 / period;
        if !(self.fmin..=self.fmax).contains(&f0) {
            return (f32::NAN, 0.0);
        }
        (f0, voiced_prob.min(1.0))
    }
}

impl Default for ProbabilisticYin {
    fn default() -> Self {
        Self::vocal_range()
    }
}

impl PitchTracker for ProbabilisticYin {
    fn track(&self, buffer: &AudioBuffer) -> Vec<PitchFrame> {
        if buffer.is_empty() || buffer.sample_rate == 0 {
            return Vec::new();
        }

        let pad = self.frame_length / 2;
        let mut padded = vec![0.0f32; pad];
        padded.extend_from_slice(&buffer.samples);
        padded.resize(padded.len() + pad, 0.0);

        let fft = FftContext::new(self.frame_length + self.frame_length / 2);
        let n_frames = 1 + buffer.len() / self.hop;

        (0..n_frames)
            .map(|i| {
                let start = i * self.hop;
                let end = (start + self.frame_length).min(padded.len());
                let mut frame = padded[start..end].to_vec();
                frame.resize(self.frame_length, 0.0);

                let (f0, voiced_prob) = self.analyze_frame(&frame, buffer.sample_rate, &fft);
                let voiced = f0.is_finite() && voiced_prob >= VOICING_THRESHOLD;
                PitchFrame {
                    time: frames_to_time(i, self.hop, buffer.sample_rate),
                    f0: if voiced { f0 } else { f32::NAN },
                    voiced,
                    voiced_prob,
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "pyin"
    }
}

/// Nearest MIDI note for a frequency, `None` for NaN or out of MIDI range
pub fn hz_to_midi(f0: f32) -> Option<u8> {
    if !f0.is_finite() || f0 <= 0.0 {
        return None;
    }
    let midi = (69.0 + 12.0 * (f0 / 440.0).log2()).round();
    if (0.0..=127.0).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// Forward/inverse FFT pair sized for one correlation
struct FftContext {
    size: usize,
    forward: std::sync::Arc<dyn rustfft::Fft<f32>>,
    inverse: std::sync::Arc<dyn rustfft::Fft<f32>>,
}

impl FftContext {
    fn new(min_size: usize) -> Self {
        let size = min_size.next_power_of_two();
        let mut planner = FftPlanner::<f32>::new();
        Self {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        }
    }

    /// r[tau] = sum_{j < win} x[j] * x[j + tau]
    fn cross_correlation(&self, frame: &[f32], win: usize, max_lag: usize) -> Vec<f32> {
        let mut a: Vec<Complex<f32>> = frame.iter().map(|&s| Complex::new(s, 0.0)).collect();
        a.resize(self.size, Complex::new(0.0, 0.0));
        let mut b: Vec<Complex<f32>> = frame[..win].iter().map(|&s| Complex::new(s, 0.0)).collect();
        b.resize(self.size, Complex::new(0.0, 0.0));

        self.forward.process(&mut a);
        self.forward.process(&mut b);
        let mut c: Vec<Complex<f32>> = a.iter().zip(&b).map(|(x, y)| x * y.conj()).collect();
        self.inverse.process(&mut c);

        let scale = 1.0 / self.size as f32;
        c.iter().take(max_lag + 1).map(|v| v.re * scale).collect()
    }
}

fn cumulative_mean_normalized_difference(frame: &[f32], win: usize, tau_max: usize, fft: &FftContext) -> Vec<f32> {
    let r = fft.cross_correlation(frame, win, tau_max + 1);

    let mut prefix = Vec::with_capacity(frame.len() + 1);
    prefix.push(0.0f32);
    for s in frame {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + s * s);
    }
    let energy_at = |tau: usize| prefix[tau + win] - prefix[tau];

    let e0 = energy_at(0);
    let diff: Vec<f32> = (0..=tau_max + 1)
        .map(|tau| (e0 + energy_at(tau) - 2.0 * r[tau]).max(0.0))
        .collect();

    let mut cmnd = vec![1.0f32; diff.len()];
    let mut running = 0.0f32;
    for tau in 1..diff.len() {
        running += diff[tau];
        cmnd[tau] = if running > 0.0 {
            diff[tau] * tau as f32 / running
        } else {
            1.0
        };
    }
    cmnd
}

/// Sub-sample minimum position around `tau`
fn parabolic_peak(values: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= values.len() {
        return tau as f32;
    }
    let (a, b, c) = (values[tau - 1], values[tau], values[tau + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return tau as f32;
    }
    let shift = 0.5 * (a - c) / denom;
    tau as f32 + shift.clamp(-1.0, 1.0)
}

/// Discretized Beta(alpha, beta) over thresholds in (0, 1); weights sum to 1
fn beta_prior(n: usize, alpha: f32, beta: f32) -> Vec<(f32, f32)> {
    let points: Vec<(f32, f32)> = (0..n)
        .map(|i| {
            let x = (i as f32 + 0.5) / n as f32;
            (x, x.powf(alpha - 1.0) * (1.0 - x).powf(beta - 1.0))
        })
        .collect();
    let total: f32 = points.iter().map(|(_, w)| w).sum();
    points.into_iter().map(|(x, w)| (x, w / total)).collect()
}
