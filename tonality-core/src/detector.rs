//! # Note Detector
//!
//! Picks candidate notes out of a normalized magnitude spectrum and merges the
//! frame's dominant note into the [`NoteHistogram`].
//!
//! Bins are visited loudest first. A bin becomes a candidate when it is louder
//! than the acceptance threshold, or when it is the loudest bin seen so far for
//! its note name. Bins below the noise floor and bins without a defined note
//! (0 Hz) are skipped.

use crate::config::AnalysisConfig;
use crate::fft::MagnitudeSpectrum;
use crate::histogram::NoteHistogram;
use crate::tuning;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A spectrum bin accepted as a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteCandidate {
    /// Bin frequency in Hz.
    pub frequency: f32,
    /// Nearest note name, e.g. "A4".
    pub note_name: String,
    /// Normalized magnitude in [0, 1].
    pub magnitude: f32,
}

/// Thresholds used to pick notes from a spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteDetector {
    pub max_notes: usize,
    pub acceptance_threshold: f32,
    pub noise_floor: f32,
    pub silence_floor: f32,
}

impl Default for NoteDetector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl NoteDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_notes: config.max_notes,
            acceptance_threshold: config.acceptance_threshold,
            noise_floor: config.noise_floor,
            silence_floor: config.silence_floor,
        }
    }

    /// Finds up to `max_notes` candidate notes in a normalized spectrum.
    ///
    /// The loudest qualifying bin of the frame is merged into `histogram`,
    /// so each call touches at most one histogram entry. A spectrum whose
    /// loudest bin is under the silence floor yields no candidates and leaves
    /// the histogram alone.
    pub fn find_top_notes(
        &self,
        spectrum: &MagnitudeSpectrum,
        histogram: &mut NoteHistogram,
    ) -> Vec<NoteCandidate> {
        if !(spectrum.max_magnitude() >= self.silence_floor) {
            return Vec::new();
        }

        // Stable sort: equal magnitudes keep ascending bin order
        let mut bins: Vec<(usize, f32)> = spectrum.magnitudes.iter().cloned().enumerate().collect();
        bins.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut found: Vec<NoteCandidate> = Vec::with_capacity(self.max_notes);
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut dominant: Option<NoteCandidate> = None;

        for (bin, magnitude) in bins {
            if found.len() >= self.max_notes {
                break;
            }

            let frequency = spectrum.frequency(bin);
            let Some((_, name)) = tuning::nearest_note(frequency) else {
                continue;
            };
            if magnitude < self.noise_floor {
                continue;
            }

            let accepted = magnitude > self.acceptance_threshold || !seen_names.contains(&name);
            if !accepted {
                continue;
            }

            seen_names.insert(name.clone());
            let candidate = NoteCandidate {
                frequency,
                note_name: name,
                magnitude,
            };
            if dominant.as_ref().is_none_or(|d| magnitude > d.magnitude) {
                dominant = Some(candidate.clone());
            }
            found.push(candidate);
        }

        if let Some(dominant) = dominant {
            histogram.record(&dominant.note_name, dominant.frequency, dominant.magnitude);
        }

        found
    }
}
