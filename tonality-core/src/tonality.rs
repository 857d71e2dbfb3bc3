//! # Tonality Predictor
//!
//! Ranks the 24 major and minor keys against a note distribution. Every
//! scale scores the summed weight of the pitch classes it contains; all
//! scales sharing the best score are reported, in generation order
//! (C Major, C Minor, C# Major, ..., B Minor).

use crate::histogram::NoteHistogram;
use crate::tuning::PitchClass;
use once_cell::sync::Lazy;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Whole/half step pattern of the major scale, in semitones.
pub const MAJOR_INTERVALS: [usize; 7] = [2, 2, 1, 2, 2, 2, 1];

/// Whole/half step pattern of the natural minor scale, in semitones.
pub const MINOR_INTERVALS: [usize; 7] = [2, 1, 2, 2, 1, 2, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn intervals(self) -> &'static [usize; 7] {
        match self {
            Mode::Major => &MAJOR_INTERVALS,
            Mode::Minor => &MINOR_INTERVALS,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("Major"),
            Mode::Minor => f.write_str("Minor"),
        }
    }
}

/// Walks `intervals` up from `root`, wrapping around the 12 pitch classes.
///
/// The result starts with the root and, for diatonic patterns that sum to an
/// octave, ends on it again.
pub fn generate_scale(root: PitchClass, intervals: &[usize; 7]) -> [PitchClass; 8] {
    let mut scale = [root; 8];
    let mut index = root.index();
    for (slot, step) in scale.iter_mut().skip(1).zip(intervals) {
        index = (index + step) % 12;
        *slot = PitchClass::from_index(index);
    }
    scale
}

/// A diatonic scale: its root, mode and the eight generated notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pub root: PitchClass,
    pub mode: Mode,
    pub notes: [PitchClass; 8],
}

impl Scale {
    pub fn new(root: PitchClass, mode: Mode) -> Self {
        Self {
            root,
            mode,
            notes: generate_scale(root, mode.intervals()),
        }
    }

    /// Display name, e.g. "C Major" or "F# Minor".
    pub fn name(&self) -> String {
        format!("{} {}", self.root, self.mode)
    }

    pub fn contains(&self, pitch_class: PitchClass) -> bool {
        self.notes.contains(&pitch_class)
    }

    /// Sum of the weights of every pitch class in the scale. The repeated
    /// root is counted once.
    pub fn score(&self, weights: &[u64; 12]) -> u64 {
        PitchClass::ALL
            .iter()
            .filter(|pc| self.contains(**pc))
            .map(|pc| weights[pc.index()])
            .sum()
    }
}

/// All 24 scales: a major then a minor scale for every root from C to B.
pub static SCALES: Lazy<Vec<Scale>> = Lazy::new(|| {
    PitchClass::ALL
        .iter()
        .flat_map(|&root| [Scale::new(root, Mode::Major), Scale::new(root, Mode::Minor)])
        .collect()
});

/// The best-scoring scales of a prediction.
///
/// Serializes as `{ "<scale name>": ["<note>", ...x8], ... }` in ranking order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub best_score: u64,
    pub scales: Vec<Scale>,
}

impl Prediction {
    pub fn names(&self) -> Vec<String> {
        self.scales.iter().map(Scale::name).collect()
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scales.len()))?;
        for scale in &self.scales {
            map.serialize_entry(&scale.name(), &scale.notes)?;
        }
        map.end()
    }
}

/// Ranks all 24 scales against per-pitch-class weights.
///
/// A strictly higher score replaces the current winners, an equal score
/// joins them. With all-zero weights every scale ties at 0 and all 24 are
/// returned.
pub fn predict(weights: &[u64; 12]) -> Prediction {
    let mut best_score: Option<u64> = None;
    let mut winners: Vec<Scale> = Vec::new();

    for scale in SCALES.iter() {
        let score = scale.score(weights);
        match best_score {
            Some(best) if score < best => {}
            Some(best) if score == best => winners.push(scale.clone()),
            _ => {
                best_score = Some(score);
                winners.clear();
                winners.push(scale.clone());
            }
        }
    }

    Prediction {
        best_score: best_score.unwrap_or(0),
        scales: winners,
    }
}

/// Ranks scales against a note-name to weight mapping.
///
/// Names may carry an octave suffix ("A4") or not ("A"); weights of the same
/// pitch class are summed. Unparseable names are skipped with a warning.
pub fn predict_from_names<'a, I>(weights: I) -> Prediction
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut folded = [0u64; 12];
    for (name, weight) in weights {
        match PitchClass::parse(name) {
            Some(pc) => folded[pc.index()] += weight,
            None => tracing::warn!("Ignoring unrecognised note name '{}'", name),
        }
    }
    predict(&folded)
}

/// Ranks scales against the counts of a note histogram.
pub fn predict_histogram(histogram: &NoteHistogram) -> Prediction {
    predict(&histogram.pitch_class_weights())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::PitchClass::*;

    #[test]
    fn c_major_scale() {
        assert_eq!(
            generate_scale(C, &MAJOR_INTERVALS),
            [C, D, E, F, G, A, B, C]
        );
    }

    #[test]
    fn a_minor_scale() {
        assert_eq!(
            generate_scale(A, &MINOR_INTERVALS),
            [A, B, C, D, E, F, G, A]
        );
    }

    #[test]
    fn scales_wrap_around_the_octave() {
        assert_eq!(
            generate_scale(FSharp, &MAJOR_INTERVALS),
            [FSharp, GSharp, ASharp, B, CSharp, DSharp, F, FSharp]
        );
    }

    #[test]
    fn every_scale_has_eight_notes_starting_and_ending_on_root() {
        assert_eq!(SCALES.len(), 24);
        for scale in SCALES.iter() {
            assert_eq!(scale.notes.len(), 8);
            assert_eq!(scale.notes[0], scale.root);
            assert_eq!(scale.notes[7], scale.root);
        }
        assert_eq!(SCALES[0].name(), "C Major");
        assert_eq!(SCALES[1].name(), "C Minor");
        assert_eq!(SCALES[23].name(), "B Minor");
    }

    #[test]
    fn c_e_g_weights_rank_c_major_on_top() {
        let prediction = predict_from_names([("C", 10), ("E", 5), ("G", 3)]);
        assert_eq!(prediction.best_score, 18);
        assert_eq!(
            prediction.names(),
            vec!["C Major", "D Minor", "E Minor", "F Major", "G Major", "A Minor"]
        );

        let weights = {
            let mut w = [0u64; 12];
            w[C.index()] = 10;
            w[E.index()] = 5;
            w[G.index()] = 3;
            w
        };
        let c_major = SCALES[0].score(&weights);
        for scale in SCALES.iter() {
            if !(scale.contains(C) && scale.contains(E) && scale.contains(G)) {
                assert!(scale.score(&weights) < c_major, "{} outranks C Major", scale.name());
            }
        }
    }

    #[test]
    fn empty_weights_tie_all_scales() {
        let prediction = predict(&[0; 12]);
        assert_eq!(prediction.best_score, 0);
        assert_eq!(prediction.scales.len(), 24);

        let from_names = predict_from_names(std::iter::empty());
        assert_eq!(from_names, prediction);
    }

    #[test]
    fn octave_suffixes_are_folded() {
        let with_octaves = predict_from_names([("C4", 6), ("C5", 4), ("E4", 5), ("G3", 3)]);
        let bare = predict_from_names([("C", 10), ("E", 5), ("G", 3)]);
        assert_eq!(with_octaves, bare);
    }

    #[test]
    fn histogram_prediction_uses_counts() {
        let mut histogram = NoteHistogram::new();
        for (name, freq) in [("A3", 220.0), ("C4", 261.6), ("E4", 329.6), ("A4", 440.0)] {
            histogram.record(name, freq, 1.0);
        }
        histogram.record("A4", 440.0, 1.0);
        histogram.record("B3", 246.9, 1.0);
        histogram.record("D4", 293.7, 1.0);

        let prediction = predict_histogram(&histogram);
        assert!(prediction.names().contains(&"A Minor".to_string()));
        assert!(prediction.names().contains(&"C Major".to_string()));
    }

    #[test]
    fn prediction_serializes_scale_notes() {
        let prediction = predict_from_names([("C", 1), ("D", 1), ("E", 1), ("F", 1), ("G", 1), ("A", 1), ("B", 1)]);
        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(
            json["C Major"],
            serde_json::json!(["C", "D", "E", "F", "G", "A", "B", "C"])
        );
        assert_eq!(
            json["A Minor"],
            serde_json::json!(["A", "B", "C", "D", "E", "F", "G", "A"])
        );
    }
}
