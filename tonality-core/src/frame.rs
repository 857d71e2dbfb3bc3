//! # Frame Sampler
//!
//! Slices fixed-length analysis windows out of a fully buffered recording.
//! A window ends at `frame_index * frame_offset`; windows that would start
//! before the recording are zero-padded on the left.

use crate::config::AnalysisConfig;
use crate::error::{Result, TonalityError};

/// Extracts the analysis frame that ends at `frame_index * frame_offset`.
///
/// The returned frame always holds exactly `window_size` samples:
/// - frame 0 is all zeros
/// - a window reaching before the first sample is left-padded with zeros
/// - otherwise the samples are copied verbatim
pub fn extract_sample(
    buffer: &[f32],
    frame_index: usize,
    window_size: usize,
    frame_offset: usize,
) -> Vec<f32> {
    let mut frame = vec![0.0; window_size];
    let end = frame_index * frame_offset;
    if end == 0 {
        return frame;
    }

    let begin = end.saturating_sub(window_size);
    let available = &buffer[begin.min(buffer.len())..end.min(buffer.len())];
    let start = window_size - (end - begin);
    frame[start..start + available.len()].copy_from_slice(available);
    frame
}

/// How a recording is cut into frames for a given configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    /// Samples per analysis window.
    pub window_size: usize,
    /// Number of frames the recording is divided into.
    pub frame_count: usize,
    /// Samples between the ends of consecutive frames.
    pub frame_offset: usize,
    /// Width of one spectrum bin in Hz.
    pub bin_width: f32,
}

impl FramePlan {
    /// Derives the frame layout of a recording of `len` samples.
    ///
    /// Fails if the recording is too short to yield a single frame or the
    /// window would hold fewer than two samples.
    pub fn new(len: usize, sample_rate: u32, config: &AnalysisConfig) -> Result<Self> {
        if sample_rate == 0 {
            return Err(TonalityError::InvalidInput("sample rate must be positive".to_string()));
        }

        let window_size = (sample_rate as f64 * config.fft_window_seconds) as usize;
        if window_size < 2 {
            return Err(TonalityError::InvalidInput(format!(
                "FFT window of {} s holds fewer than two samples at {} Hz",
                config.fft_window_seconds, sample_rate
            )));
        }

        let duration = len as f64 / sample_rate as f64;
        let frame_count = (duration * config.frames_per_second as f64) as usize;
        if frame_count == 0 {
            return Err(TonalityError::InvalidInput(format!(
                "recording of {:.3} s is shorter than one frame at {} fps",
                duration, config.frames_per_second
            )));
        }

        Ok(Self {
            window_size,
            frame_count,
            frame_offset: len / frame_count,
            bin_width: sample_rate as f32 / window_size as f32,
        })
    }

    /// The frame at `frame_index` of `buffer`.
    pub fn frame(&self, buffer: &[f32], frame_index: usize) -> Vec<f32> {
        extract_sample(buffer, frame_index, self.window_size, self.frame_offset)
    }
}
