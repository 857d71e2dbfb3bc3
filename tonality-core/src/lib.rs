// tonality-core/src/lib.rs

//! The core logic for the tonality analyzer.
//! This crate detects pitches in a recorded monophonic signal, aggregates
//! them into a note histogram and ranks the 24 major/minor keys against it.
//! It is completely headless: recordings come in as sample buffers and
//! results go out as JSON-serializable structures.

pub mod audio;
pub mod config;
pub mod detector;
pub mod error;
pub mod fft;
pub mod frame;
pub mod histogram;
pub mod pipeline;
pub mod tonality;
pub mod tuning;
pub mod vocal;
pub mod wav;

pub use config::AnalysisConfig;
pub use error::{Result, TonalityError};
pub use histogram::{NoteHistogram, NoteStats};
pub use pipeline::{analyze, AnalysisReport, FrameNotes};
pub use tonality::Prediction;

/// A fully buffered mono recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Amplitudes in recording order.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the recording in seconds; 0 for a zero sample rate.
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
