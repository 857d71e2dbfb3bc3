//! # Analysis Pipeline
//!
//! Drives a recording through the frame sampler, spectral analyzer, note
//! detector and tonality predictor.
//!
//! Runs in two sequential passes over the frames:
//! 1. compute the loudest spectrum bin of the whole recording
//! 2. normalize each frame's spectrum by it, detect notes and accumulate the
//!    histogram, in increasing frame order

use crate::config::AnalysisConfig;
use crate::detector::{NoteCandidate, NoteDetector};
use crate::error::{Result, TonalityError};
use crate::fft::SpectrumAnalyzer;
use crate::frame::FramePlan;
use crate::histogram::NoteHistogram;
use crate::tonality::{self, Prediction};
use crate::vocal::{self, VocalRangeReport};
use crate::SampleBuffer;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, trace};

/// Candidate notes detected in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameNotes {
    pub frame: usize,
    /// Frame start time in seconds (`frame / frames_per_second`).
    pub time_seconds: f32,
    pub notes: Vec<NoteCandidate>,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub plan: FramePlan,
    /// Loudest raw spectrum magnitude over all frames; the normalization constant.
    pub max_magnitude: f32,
    pub histogram: NoteHistogram,
    pub tonalities: Prediction,
    pub vocal_range: VocalRangeReport,
    pub frames: Vec<FrameNotes>,
}

/// Runs the full analysis over a buffered recording.
///
/// # Errors
/// * `InvalidConfig` if `config` fails validation
/// * `InvalidInput` for an empty buffer, a zero sample rate, or a recording
///   shorter than one frame
pub fn analyze(buffer: &SampleBuffer, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    if buffer.is_empty() {
        return Err(TonalityError::InvalidInput("empty sample buffer".to_string()));
    }

    let plan = FramePlan::new(buffer.len(), buffer.sample_rate, config)?;
    info!(
        "Audio duration: {:.2} s, frames to process: {}",
        buffer.duration_seconds(),
        plan.frame_count
    );
    debug!(
        "Window {} samples, frame offset {}, bin width {:.3} Hz",
        plan.window_size, plan.frame_offset, plan.bin_width
    );

    let mut analyzer = SpectrumAnalyzer::new(plan.window_size, buffer.sample_rate);

    // Pass 1: global maximum magnitude
    let mut max_magnitude: f32 = 0.0;
    for frame_index in 0..plan.frame_count {
        let frame = plan.frame(&buffer.samples, frame_index);
        max_magnitude = max_magnitude.max(analyzer.analyze(&frame).max_magnitude());
    }
    info!("Maximum magnitude: {}", max_magnitude);

    // Pass 2: normalized detection
    let detector = NoteDetector::from_config(config);
    let mut histogram = NoteHistogram::new();
    let mut frames = Vec::with_capacity(plan.frame_count);
    for frame_index in 0..plan.frame_count {
        let frame = plan.frame(&buffer.samples, frame_index);
        let mut spectrum = analyzer.analyze(&frame);
        spectrum.normalize(max_magnitude);

        let notes = detector.find_top_notes(&spectrum, &mut histogram);
        trace!("Frame {}: {} candidate(s)", frame_index, notes.len());
        frames.push(FrameNotes {
            frame: frame_index,
            time_seconds: frame_index as f32 / config.frames_per_second as f32,
            notes,
        });
    }

    let tonalities = tonality::predict_histogram(&histogram);
    info!(
        "Detected tonalities (score {}): {}",
        tonalities.best_score,
        tonalities.names().join(", ")
    );

    let vocal_range = vocal::classify(&histogram, config);
    info!("Predominant vocal range: {}", vocal_range.range);

    Ok(AnalysisReport {
        plan,
        max_magnitude,
        histogram,
        tonalities,
        vocal_range,
        frames,
    })
}

/// Serializes `value` as pretty-printed JSON to `path`.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

impl AnalysisReport {
    /// Writes `notes.json`, `tonalities.json` and `vocal_range.json` into
    /// `dir`, plus `frames.json` if `include_frames`.
    ///
    /// Creates `dir` if needed.
    pub fn write_to_dir(&self, dir: &Path, include_frames: bool) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        save_json(&self.histogram, &dir.join("notes.json"))?;
        save_json(&self.tonalities, &dir.join("tonalities.json"))?;
        save_json(&self.vocal_range, &dir.join("vocal_range.json"))?;
        if include_frames {
            save_json(&self.frames, &dir.join("frames.json"))?;
        }
        info!("Saved analysis to {}", dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, seconds: f32, sample_rate: u32) -> SampleBuffer {
        let len = (seconds * sample_rate as f32) as usize;
        let samples = (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        SampleBuffer::new(samples, sample_rate)
    }

    #[test]
    fn rejects_empty_buffer() {
        let buffer = SampleBuffer::new(vec![], 44_100);
        assert!(matches!(
            analyze(&buffer, &AnalysisConfig::default()),
            Err(TonalityError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_invalid_config() {
        let buffer = sine(440.0, 1.0, 8_000);
        let config = AnalysisConfig { max_notes: 0, ..Default::default() };
        assert!(matches!(analyze(&buffer, &config), Err(TonalityError::InvalidConfig(_))));
    }

    #[test]
    fn silence_leaves_histogram_empty() {
        let buffer = SampleBuffer::new(vec![0.0; 8_000], 8_000);
        let report = analyze(&buffer, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.max_magnitude, 0.0);
        assert!(report.histogram.is_empty());
        assert!(report.frames.iter().all(|f| f.notes.is_empty()));
        assert_eq!(report.tonalities.scales.len(), 24);
        assert_eq!(report.vocal_range.range, crate::vocal::VocalRange::Bass);
        assert!(report.vocal_range.notes.is_empty());
    }

    #[test]
    fn steady_tone_dominates_histogram() {
        // 4 Hz bins at 8 kHz with a 0.25 s window; 440 Hz sits on bin 110
        let buffer = sine(440.0, 1.0, 8_000);
        let report = analyze(&buffer, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.plan.frame_count, 30);
        assert_eq!(report.frames.len(), 30);
        // Frame 0 is all zeros; the first padded frames hold too little of
        // the tone to clear the noise floor
        assert!(report.frames[0].notes.is_empty());
        let a4 = report.histogram.get("A4").unwrap();
        assert!(a4.count >= 25, "A4 dominated only {} frames", a4.count);
        assert_eq!(a4.frequency, 440.0);
        assert!((a4.magnitude - 1.0).abs() < 1e-6);
        assert_eq!(report.histogram.total_count(), a4.count);
        assert_eq!(report.histogram.len(), 1);
    }
}
