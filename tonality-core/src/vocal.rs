//! Vocal range classification from the frequencies stored in a note histogram.

use crate::config::AnalysisConfig;
use crate::histogram::NoteHistogram;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VocalRange {
    Bass,
    Baritone,
    Tenor,
    Countertenor,
    MezzoSoprano,
    Soprano,
    Contralto,
}

impl VocalRange {
    /// Ranges in tie-breaking order.
    pub const ALL: [VocalRange; 7] = [
        VocalRange::Bass,
        VocalRange::Baritone,
        VocalRange::Tenor,
        VocalRange::Countertenor,
        VocalRange::MezzoSoprano,
        VocalRange::Soprano,
        VocalRange::Contralto,
    ];

    /// Inclusive (low, high) bounds in Hz.
    pub fn bounds(self) -> (f32, f32) {
        match self {
            VocalRange::Bass => (82.41, 349.23),          // E2 to F4
            VocalRange::Baritone => (110.00, 440.00),     // A2 to A4
            VocalRange::Tenor => (130.81, 493.88),        // C3 to B4
            VocalRange::Countertenor => (164.81, 659.26), // E3 to E5
            VocalRange::MezzoSoprano => (220.00, 880.00), // A3 to A5
            VocalRange::Soprano => (261.63, 1046.50),     // C4 to C6
            VocalRange::Contralto => (174.61, 698.46),    // F3 to F5
        }
    }

    pub fn contains(self, frequency: f32) -> bool {
        let (low, high) = self.bounds();
        (low..=high).contains(&frequency)
    }

    pub fn center(self) -> f32 {
        let (low, high) = self.bounds();
        (low + high) / 2.0
    }

    /// A sixth of the range width; notes within one sigma of the centre are central.
    pub fn sigma(self) -> f32 {
        let (low, high) = self.bounds();
        (high - low) / 6.0
    }

    pub fn name(self) -> &'static str {
        match self {
            VocalRange::Bass => "bass",
            VocalRange::Baritone => "baritone",
            VocalRange::Tenor => "tenor",
            VocalRange::Countertenor => "countertenor",
            VocalRange::MezzoSoprano => "mezzo-soprano",
            VocalRange::Soprano => "soprano",
            VocalRange::Contralto => "contralto",
        }
    }
}

impl fmt::Display for VocalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A histogram note that falls inside the predominant range.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RangeNote {
    pub note: String,
    pub frequency: f32,
    /// Within one sigma of the range centre.
    pub central: bool,
}

/// The range holding the most notes, with the notes it holds sorted by frequency.
///
/// Serializes as `{ "<range>": [ {"note", "frequency", "central"}, ... ] }`.
#[derive(Debug, Clone, PartialEq)]
pub struct VocalRangeReport {
    pub range: VocalRange,
    /// Histogram notes counted towards each range, in [`VocalRange::ALL`] order.
    pub note_counts: [usize; 7],
    pub notes: Vec<RangeNote>,
}

impl Serialize for VocalRangeReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.range.name(), &self.notes)?;
        map.end()
    }
}

/// Picks the predominant vocal range of a histogram.
///
/// Each range counts the histogram notes whose stored frequency lies inside
/// both the range and the configured `[min_frequency, max_frequency]` band.
/// Ties go to the range listed first in [`VocalRange::ALL`], so an empty
/// histogram reports bass with no notes.
pub fn classify(histogram: &NoteHistogram, config: &AnalysisConfig) -> VocalRangeReport {
    let in_band = |f: f32| (config.min_frequency..=config.max_frequency).contains(&f);

    let mut note_counts = [0usize; 7];
    for (slot, range) in note_counts.iter_mut().zip(VocalRange::ALL) {
        *slot = histogram
            .iter()
            .filter(|(_, stats)| range.contains(stats.frequency) && in_band(stats.frequency))
            .count();
    }

    let mut best = 0;
    for (i, &count) in note_counts.iter().enumerate() {
        if count > note_counts[best] {
            best = i;
        }
    }
    let range = VocalRange::ALL[best];

    let (center, sigma) = (range.center(), range.sigma());
    let mut notes: Vec<RangeNote> = histogram
        .iter()
        .filter(|(_, stats)| range.contains(stats.frequency))
        .map(|(name, stats)| RangeNote {
            note: name.to_string(),
            frequency: stats.frequency,
            central: (stats.frequency - center).abs() <= sigma,
        })
        .collect();
    notes.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));

    VocalRangeReport {
        range,
        note_counts,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_of(notes: &[(&str, f32)]) -> NoteHistogram {
        let mut histogram = NoteHistogram::new();
        for &(name, freq) in notes {
            histogram.record(name, freq, 1.0);
        }
        histogram
    }

    #[test]
    fn empty_histogram_falls_back_to_bass() {
        let report = classify(&NoteHistogram::new(), &AnalysisConfig::default());
        assert_eq!(report.range, VocalRange::Bass);
        assert_eq!(report.note_counts, [0; 7]);
        assert!(report.notes.is_empty());
        assert_eq!(serde_json::to_value(&report).unwrap(), serde_json::json!({ "bass": [] }));
    }

    #[test]
    fn low_notes_classify_as_bass() {
        let histogram = histogram_of(&[("E2", 82.41), ("A2", 110.0), ("C3", 130.81)]);
        let report = classify(&histogram, &AnalysisConfig::default());
        assert_eq!(report.range, VocalRange::Bass);
        assert_eq!(report.note_counts[0], 3);
        assert_eq!(report.notes.len(), 3);
    }

    #[test]
    fn high_notes_classify_as_soprano() {
        let histogram = histogram_of(&[("C5", 523.25), ("E5", 659.26), ("A5", 880.0), ("C6", 1046.5)]);
        let report = classify(&histogram, &AnalysisConfig::default());
        assert_eq!(report.range, VocalRange::Soprano);
        let freqs: Vec<_> = report.notes.iter().map(|n| n.frequency).collect();
        assert_eq!(freqs, vec![523.25, 659.26, 880.0, 1046.5]);
    }

    #[test]
    fn ties_go_to_the_first_range() {
        // A4 sits in every range but bass
        let histogram = histogram_of(&[("A4", 440.0)]);
        let report = classify(&histogram, &AnalysisConfig::default());
        assert_eq!(report.range, VocalRange::Baritone);
    }

    #[test]
    fn notes_outside_the_band_do_not_count() {
        let config = AnalysisConfig {
            min_frequency: 200.0,
            ..Default::default()
        };
        let histogram = histogram_of(&[("E2", 82.41), ("A2", 110.0), ("A3", 220.0)]);
        let report = classify(&histogram, &config);
        assert_eq!(report.note_counts[0], 1);
        assert_eq!(report.range, VocalRange::Bass);
        // Listing is by range bounds only
        assert_eq!(report.notes.len(), 3);
    }

    #[test]
    fn central_flag_and_json_shape() {
        let histogram = histogram_of(&[("E2", 82.41), ("A3", 220.0)]);
        let report = classify(&histogram, &AnalysisConfig::default());
        assert_eq!(report.range, VocalRange::Bass);
        assert!(!report.notes[0].central);
        assert!(report.notes[1].central);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["bass"][1]["note"], "A3");
        assert_eq!(json["bass"][1]["central"], true);
    }
}
