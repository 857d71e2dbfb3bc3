//! Tunable parameters for the analysis pipeline.

use crate::error::{Result, TonalityError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Analysis configuration parameters.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analysis frames per second of audio (default: 30).
    /// Drives the hop between consecutive frames.
    pub frames_per_second: u32,

    /// Length of each FFT window in seconds (default: 0.25)
    pub fft_window_seconds: f64,

    /// Lowest frequency considered part of the voice (default: 50 Hz)
    pub min_frequency: f32,

    /// Highest frequency considered part of the voice (default: 1100 Hz)
    pub max_frequency: f32,

    /// Maximum candidate notes reported per frame (default: 5)
    pub max_notes: usize,

    /// Normalized magnitude above which a bin is always accepted, even when
    /// its note name was already seen in the frame (default: 0.6)
    pub acceptance_threshold: f32,

    /// Normalized magnitude below which a bin is ignored (default: 0.05)
    pub noise_floor: f32,

    /// A frame whose loudest bin is below this is treated as silence (default: 0.001)
    pub silence_floor: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30,
            fft_window_seconds: 0.25,
            min_frequency: 50.0,
            max_frequency: 1100.0,
            max_notes: 5,
            acceptance_threshold: 0.6,
            noise_floor: 0.05,
            silence_floor: 0.001,
        }
    }
}

impl AnalysisConfig {
    /// Loads a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable by the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.frames_per_second == 0 {
            return Err(TonalityError::InvalidConfig(
                "frames_per_second must be positive".to_string(),
            ));
        }
        if !(self.fft_window_seconds > 0.0) {
            return Err(TonalityError::InvalidConfig(format!(
                "fft_window_seconds must be positive, got {}",
                self.fft_window_seconds
            )));
        }
        if !(self.min_frequency >= 0.0 && self.min_frequency < self.max_frequency) {
            return Err(TonalityError::InvalidConfig(format!(
                "frequency bounds must satisfy 0 <= min < max, got {}..{}",
                self.min_frequency, self.max_frequency
            )));
        }
        if self.max_notes == 0 {
            return Err(TonalityError::InvalidConfig(
                "max_notes must be at least 1".to_string(),
            ));
        }

        let thresholds = [
            ("silence_floor", self.silence_floor),
            ("noise_floor", self.noise_floor),
            ("acceptance_threshold", self.acceptance_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(TonalityError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.silence_floor > self.noise_floor || self.noise_floor > self.acceptance_threshold {
            return Err(TonalityError::InvalidConfig(format!(
                "thresholds must be ordered silence_floor <= noise_floor <= acceptance_threshold, got {} / {} / {}",
                self.silence_floor, self.noise_floor, self.acceptance_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frames_per_second, 30);
        assert_eq!(config.max_notes, 5);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "frames_per_second": 10, "max_notes": 3 }"#).unwrap();
        assert_eq!(config.frames_per_second, 10);
        assert_eq!(config.max_notes, 3);
        assert_eq!(config.fft_window_seconds, 0.25);
        assert_eq!(config.acceptance_threshold, 0.6);
    }

    #[test]
    fn rejects_bad_values() {
        let zero_fps = AnalysisConfig { frames_per_second: 0, ..Default::default() };
        assert!(zero_fps.validate().is_err());

        let inverted = AnalysisConfig {
            min_frequency: 1100.0,
            max_frequency: 50.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let unordered = AnalysisConfig { noise_floor: 0.9, ..Default::default() };
        assert!(matches!(unordered.validate(), Err(TonalityError::InvalidConfig(_))));

        let no_notes = AnalysisConfig { max_notes: 0, ..Default::default() };
        assert!(no_notes.validate().is_err());
    }

    #[test]
    fn loads_partial_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{ "fft_window_seconds": 0.5, "max_notes": 3 }"#);

        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.fft_window_seconds, 0.5);
        assert_eq!(config.max_notes, 3);
        assert_eq!(config.frames_per_second, 30);
        assert_eq!(config.noise_floor, 0.05);
    }

    #[test]
    fn config_file_with_invalid_value_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{ "noise_floor": 0.9 }"#);
        assert!(matches!(
            AnalysisConfig::from_json_file(&path),
            Err(TonalityError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unreadable_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AnalysisConfig::from_json_file(&dir.path().join("missing.json")),
            Err(TonalityError::Io(_))
        ));

        let path = write_config(&dir, "{ not json");
        assert!(matches!(
            AnalysisConfig::from_json_file(&path),
            Err(TonalityError::Json(_))
        ));
    }
}
