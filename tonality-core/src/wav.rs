//! WAV reading and writing through `hound`.

use crate::error::{Result, TonalityError};
use crate::SampleBuffer;
use std::path::Path;
use tracing::debug;

/// Reads a WAV file into a mono [`SampleBuffer`].
///
/// Integer PCM is scaled to [-1, 1]; float PCM is kept as is. Only the first
/// channel of a multi-channel file is kept.
pub fn read_wav(path: &Path) -> Result<SampleBuffer> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let samples: Vec<f32> = interleaved.into_iter().step_by(channels).collect();
    debug!(
        "Read {} ({} Hz, {} channel(s), {} frames)",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );

    if samples.is_empty() {
        return Err(TonalityError::InvalidInput(format!(
            "'{}' contains no samples",
            path.display()
        )));
    }
    Ok(SampleBuffer::new(samples, spec.sample_rate))
}

/// Writes a buffer as a mono 32-bit float WAV file, creating parent directories.
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
