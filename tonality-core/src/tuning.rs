//! # Musical Tuning Module
//!
//! Note naming and frequency conversions in twelve-tone equal temperament with
//! A4 = 440 Hz (MIDI note 69).
//!
//! Pitch classes are an explicit enumeration indexed 0..12 starting at C, so
//! scale membership and histogram folding work on integer indices instead of
//! note-name strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference pitch for A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_NOTE_NUMBER: i32 = 69;

/// Pitch class names in index order, C = 0.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the 12 note names, ignoring octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in cycle order starting at C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Position in the 12-pitch-class cycle (C = 0, B = 11).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch class at `index`, wrapping modulo 12.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Pitch class of a MIDI note number. Negative numbers wrap as well.
    pub fn from_note_number(n: i32) -> Self {
        Self::ALL[n.rem_euclid(12) as usize]
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    /// Parses a note name with or without an octave suffix ("A", "C#4", "G#-1").
    ///
    /// Flats are accepted as their enharmonic sharp ("Bb3" is A#).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let mut chars = name.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let base = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = chars.as_str();
        let (offset, octave) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (11, &rest[1..]),
            _ => (0, rest),
        };

        if !octave.is_empty() && octave.parse::<i32>().is_err() {
            return None;
        }
        Some(Self::from_index(base + offset))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts a frequency to a fractional MIDI note number.
///
/// Returns `None` for non-positive frequencies, where the note is undefined.
pub fn freq_to_number(freq: f32) -> Option<f32> {
    if freq <= 0.0 {
        return None;
    }
    Some(A4_NOTE_NUMBER as f32 + 12.0 * (freq / A4_FREQUENCY).log2())
}

/// Converts a (possibly fractional) MIDI note number to its frequency in Hz.
pub fn number_to_freq(n: f32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((n - A4_NOTE_NUMBER as f32) / 12.0)
}

/// Name of a MIDI note number, pitch class plus octave ("A4" for 69, "C-1" for 0).
///
/// The octave is `n / 12 - 1` truncated toward zero, so sub-audio note
/// numbers between -11 and -1 still land in octave -1 ("G-1" for -5).
pub fn note_name(n: i32) -> String {
    let octave = (n as f64 / 12.0 - 1.0) as i32;
    format!("{}{}", PitchClass::from_note_number(n), octave)
}

/// Quantizes a frequency to the nearest semitone.
///
/// Exact half-semitone values round to the even note number. Returns the
/// note number and its name, or `None` if the frequency is not positive.
pub fn nearest_note(freq: f32) -> Option<(i32, String)> {
    let n = freq_to_number(freq)?;
    if !n.is_finite() {
        return None;
    }
    let n0 = n.round_ties_even() as i32;
    Some((n0, note_name(n0)))
}
