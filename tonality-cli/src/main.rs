//! # tonality - command-line front end
//!
//! Records or loads a monophonic take, runs the tonality pipeline and writes
//! the note histogram, winning keys and vocal range as JSON.
//!
//! ## Architecture
//! - **Main Thread**: argument parsing, recording loop, analysis
//! - **Control Thread**: waits for Enter and sends the stop signal while recording
//! - **Communication**: crossbeam channels between the two

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, OutputArgs};
use crossbeam_channel::Sender;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;
use std::thread;
use tonality_core::{audio, pipeline, tonality, wav, AnalysisConfig, NoteHistogram, Prediction, SampleBuffer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze { input, output, tuning } => {
            let config = tuning.resolve()?;
            let buffer = wav::read_wav(&input)
                .with_context(|| format!("Failed to read audio file '{}'", input.display()))?;
            analyze_and_save(&buffer, &config, &output)
        }
        Command::Record {
            output,
            analyze,
            results,
            tuning,
        } => {
            // Resolve parameters first so a bad flag fails before recording
            let config = if analyze { Some(tuning.resolve()?) } else { None };
            let buffer = record(&output)?;
            match config {
                Some(config) => analyze_and_save(&buffer, &config, &results),
                None => Ok(()),
            }
        }
        Command::Predict { notes, output } => predict(&notes, output.as_deref()),
    }
}

/// Records until Enter is pressed on a separate control thread, then saves the take.
fn record(path: &Path) -> Result<SampleBuffer> {
    let (stop_sender, stop_receiver) = crossbeam_channel::bounded::<()>(1);
    spawn_stop_listener(stop_sender);

    println!("Recording! Press Enter to stop...");
    let buffer = audio::record_until(&stop_receiver).context("Recording failed")?;

    wav::write_wav(path, &buffer)
        .with_context(|| format!("Failed to save recording to '{}'", path.display()))?;
    println!("Recording saved to: {}", path.display());
    Ok(buffer)
}

/// Sends the stop signal once a line (or EOF) arrives on stdin. The thread is
/// left detached; it ends with the process if capture fails first.
fn spawn_stop_listener(stop: Sender<()>) {
    thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut line) {
            error!("Failed to read from stdin: {}", e);
        }
        let _ = stop.send(());
    });
}

fn analyze_and_save(buffer: &SampleBuffer, config: &AnalysisConfig, output: &OutputArgs) -> Result<()> {
    println!("Audio duration: {:.2} seconds", buffer.duration_seconds());

    let report = pipeline::analyze(buffer, config).context("Analysis failed")?;
    report
        .write_to_dir(&output.out_dir, output.frames)
        .with_context(|| format!("Failed to write results to '{}'", output.out_dir.display()))?;

    println!("Frames processed: {}", report.plan.frame_count);
    println!("Maximum magnitude: {}", report.max_magnitude);
    for (name, stats) in report.histogram.sorted_by_count().into_iter().take(12) {
        println!("  {:<5} x{:<5} {:>8.2} Hz  peak {:.3}", name, stats.count, stats.frequency, stats.magnitude);
    }
    println!("Tonalities: {}", report.tonalities.names().join(", "));
    println!("Vocal range: {}", report.vocal_range.range);
    println!("Results saved in: {}", output.out_dir.display());
    Ok(())
}

/// Loads a saved histogram and ranks the keys against it.
fn predict(notes_path: &Path, output: Option<&Path>) -> Result<()> {
    let prediction = load_prediction(notes_path)?;
    println!("Tonalities: {}", prediction.names().join(", "));

    if let Some(path) = output {
        pipeline::save_json(&prediction, path)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        println!("Saved to: {}", path.display());
    }
    Ok(())
}

/// Ranks the keys against a `notes.json` histogram or a plain
/// `{"note": count}` map.
fn load_prediction(path: &Path) -> Result<Prediction> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    if let Ok(histogram) = serde_json::from_str::<NoteHistogram>(&data) {
        info!("Loaded {} note(s) from {}", histogram.len(), path.display());
        return Ok(tonality::predict_histogram(&histogram));
    }

    let counts: BTreeMap<String, u64> = serde_json::from_str(&data)
        .with_context(|| format!("'{}' is not a notes histogram", path.display()))?;
    info!("Loaded {} note count(s) from {}", counts.len(), path.display());
    Ok(tonality::predict_from_names(
        counts.iter().map(|(name, &count)| (name.as_str(), count)),
    ))
}
