//! Command-line arguments.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tonality_core::AnalysisConfig;

/// tonality - detect the notes of a sung recording and infer its key
///
/// Detects the dominant pitch of every analysis frame, aggregates them into a
/// note histogram and ranks the 24 major/minor keys against it.
#[derive(Parser, Debug)]
#[command(name = "tonality")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, default_value = "false", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a WAV recording and write notes/tonalities/vocal range JSON
    Analyze {
        /// WAV file to analyze
        #[arg(value_name = "WAV")]
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        tuning: ConfigArgs,
    },

    /// Record from the default microphone until Enter is pressed
    Record {
        /// Where to save the recording
        #[arg(short, long, value_name = "WAV", default_value = "records/record.wav")]
        output: PathBuf,

        /// Analyze the recording once it is saved
        #[arg(long, default_value = "false")]
        analyze: bool,

        #[command(flatten)]
        results: OutputArgs,

        #[command(flatten)]
        tuning: ConfigArgs,
    },

    /// Predict the key from a saved notes.json histogram
    Predict {
        /// Histogram JSON written by `analyze`
        #[arg(value_name = "NOTES_JSON")]
        notes: PathBuf,

        /// Also write the winning scales to this JSON file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Directory for the JSON results
    #[arg(long = "out-dir", value_name = "DIR", default_value = "record_data")]
    pub out_dir: PathBuf,

    /// Also write the per-frame candidate notes (frames.json)
    #[arg(long, default_value = "false")]
    pub frames: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// JSON file with analysis parameters; missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Analysis frames per second
    #[arg(long, value_name = "N")]
    pub fps: Option<u32>,

    /// FFT window length in seconds
    #[arg(long, value_name = "SECONDS")]
    pub window_seconds: Option<f64>,

    /// Maximum candidate notes per frame
    #[arg(long, value_name = "N")]
    pub max_notes: Option<usize>,
}

impl ConfigArgs {
    /// Loads the config file (or defaults) and applies flag overrides.
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(fps) = self.fps {
            config.frames_per_second = fps;
        }
        if let Some(seconds) = self.window_seconds {
            config.fft_window_seconds = seconds;
        }
        if let Some(max_notes) = self.max_notes {
            config.max_notes = max_notes;
        }

        config.validate().context("Invalid analysis parameters")?;
        Ok(config)
    }
}
