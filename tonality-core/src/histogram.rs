//! # Note Histogram
//!
//! Aggregates the dominant note of every analyzed frame. Owned by the
//! pipeline driver for one run: created empty before the frame loop, updated
//! once per frame by the note detector, read after the loop completes.

use crate::tuning::PitchClass;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Aggregated statistics for one note name.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, Deserialize)]
#[serde(default)]
pub struct NoteStats {
    /// Frames in which this note was dominant.
    pub count: u64,
    /// Peak normalized magnitude seen for this note.
    pub magnitude: f32,
    /// Frequency of the most recent dominant occurrence, in Hz.
    pub frequency: f32,
}

/// Note name ("A4") to [`NoteStats`], in first-seen order.
///
/// Counts only ever grow. Serializes as a JSON object sorted by count,
/// descending, with ties kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteHistogram {
    entries: Vec<(String, NoteStats)>,
    index: HashMap<String, usize>,
}

impl NoteHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `name`, inserting a zeroed one on first access.
    pub fn entry_or_default(&mut self, name: &str) -> &mut NoteStats {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => {
                self.entries.push((name.to_string(), NoteStats::default()));
                self.index.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot].1
    }

    /// Merges one dominant occurrence into the histogram.
    ///
    /// The count grows by one, the magnitude keeps its peak, and the stored
    /// frequency is always replaced by this occurrence's.
    pub fn record(&mut self, name: &str, frequency: f32, magnitude: f32) {
        let stats = self.entry_or_default(name);
        stats.count += 1;
        stats.magnitude = stats.magnitude.max(magnitude);
        stats.frequency = frequency;
    }

    pub fn get(&self, name: &str) -> Option<&NoteStats> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, i.e. the number of frames that produced a note.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|(_, stats)| stats.count).sum()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NoteStats)> {
        self.entries.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    /// Entries sorted by count, descending. The sort is stable, so equal
    /// counts stay in first-seen order.
    pub fn sorted_by_count(&self) -> Vec<(&str, &NoteStats)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        sorted
    }

    /// Folds counts over octaves into one weight per pitch class.
    ///
    /// Names that do not parse as a note are skipped.
    pub fn pitch_class_weights(&self) -> [u64; 12] {
        let mut weights = [0u64; 12];
        for (name, stats) in self.iter() {
            match PitchClass::parse(name) {
                Some(pc) => weights[pc.index()] += stats.count,
                None => tracing::warn!("Ignoring unrecognised note name '{}'", name),
            }
        }
        weights
    }
}

impl FromIterator<(String, NoteStats)> for NoteHistogram {
    fn from_iter<I: IntoIterator<Item = (String, NoteStats)>>(iter: I) -> Self {
        let mut histogram = NoteHistogram::new();
        for (name, stats) in iter {
            *histogram.entry_or_default(&name) = stats;
        }
        histogram
    }
}

impl Serialize for NoteHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted = self.sorted_by_count();
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (name, stats) in sorted {
            map.serialize_entry(name, stats)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NoteHistogram {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, NoteStats>::deserialize(deserializer)?;
        let mut entries: Vec<_> = entries.into_iter().collect();
        // Restore the saved ordering as far as the counts allow
        entries.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        Ok(entries.into_iter().collect())
    }
}
