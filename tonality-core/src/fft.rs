//! # Spectral Analyzer
//!
//! Turns analysis frames into magnitude spectra: a periodic Hann window, a
//! forward FFT through RustFFT, and the magnitudes of the non-negative
//! frequency bins (`window_size / 2 + 1` of them, as a real FFT returns).
//!
//! Spectra are normalized against the loudest bin of the whole recording, so
//! the driver makes one pass to find that maximum before any note detection.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Builds a periodic Hann window of length `n` (the endpoint is not repeated).
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Magnitudes of the non-negative frequency bins of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeSpectrum {
    /// One magnitude per bin, bin 0 at 0 Hz.
    pub magnitudes: Vec<f32>,
    /// Width of one bin in Hz (`sample_rate / window_size`).
    pub bin_width: f32,
}

impl MagnitudeSpectrum {
    /// Centre frequency of `bin` in Hz.
    pub fn frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_width
    }

    /// Loudest magnitude in the spectrum, 0 for an empty one.
    pub fn max_magnitude(&self) -> f32 {
        self.magnitudes.iter().cloned().fold(0.0, f32::max)
    }

    /// Scales every magnitude by `1 / max`.
    ///
    /// A non-positive `max` (a silent recording) zeroes the spectrum instead
    /// of producing NaN or infinities.
    pub fn normalize(&mut self, max: f32) {
        if max > 0.0 {
            for magnitude in self.magnitudes.iter_mut() {
                *magnitude /= max;
            }
        } else {
            self.magnitudes.iter_mut().for_each(|m| *m = 0.0);
        }
    }
}

/// Windowed FFT for frames of one fixed size.
///
/// The FFT plan, window and scratch buffer are created once and reused for
/// every frame of a recording.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    bin_width: f32,
}

impl SpectrumAnalyzer {
    /// Plans an FFT of `window_size` samples for audio at `sample_rate`.
    pub fn new(window_size: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);

        Self {
            fft,
            window: hann_window(window_size),
            buffer: vec![Complex { re: 0.0, im: 0.0 }; window_size],
            bin_width: sample_rate as f32 / window_size as f32,
        }
    }

    /// Computes the raw (unnormalized) magnitude spectrum of `frame`.
    ///
    /// `frame` must hold exactly `window_size` samples; the frame sampler
    /// guarantees this.
    pub fn analyze(&mut self, frame: &[f32]) -> MagnitudeSpectrum {
        debug_assert_eq!(frame.len(), self.window.len());

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex { re: sample * w, im: 0.0 };
        }
        self.fft.process(&mut self.buffer);

        let magnitudes = self
            .buffer
            .iter()
            .take(self.window.len() / 2 + 1)
            .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
            .collect();

        MagnitudeSpectrum {
            magnitudes,
            bin_width: self.bin_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn hann_window_is_periodic() {
        let window = hann_window(8);
        assert_eq!(window.len(), 8);
        assert_relative_eq!(window[0], 0.0);
        assert_relative_eq!(window[4], 1.0, epsilon = 1e-6);
        // Periodic: the last sample is not a repeat of the first
        assert!(window[7] > 0.1);
        assert_relative_eq!(window[1], window[7], epsilon = 1e-6);
    }

    #[test]
    fn spectrum_has_real_fft_length() {
        let mut analyzer = SpectrumAnalyzer::new(1000, 8000);
        let spectrum = analyzer.analyze(&vec![0.0; 1000]);
        assert_eq!(spectrum.magnitudes.len(), 501);
        assert_relative_eq!(spectrum.bin_width, 8.0);

        let mut odd = SpectrumAnalyzer::new(11_025, 44_100);
        assert_eq!(odd.analyze(&vec![0.0; 11_025]).magnitudes.len(), 5_513);
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let sample_rate = 8000;
        let mut analyzer = SpectrumAnalyzer::new(1000, sample_rate);
        let spectrum = analyzer.analyze(&sine(440.0, sample_rate, 1000));

        let (peak_bin, _) = spectrum
            .magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(peak_bin, 55);
        assert_relative_eq!(spectrum.frequency(peak_bin), 440.0);
    }

    #[test]
    fn normalize_scales_and_guards_silence() {
        let mut spectrum = MagnitudeSpectrum {
            magnitudes: vec![1.0, 4.0, 2.0],
            bin_width: 1.0,
        };
        spectrum.normalize(4.0);
        assert_eq!(spectrum.magnitudes, vec![0.25, 1.0, 0.5]);

        spectrum.normalize(0.0);
        assert!(spectrum.magnitudes.iter().all(|m| *m == 0.0));
        assert_eq!(spectrum.max_magnitude(), 0.0);
    }
}
