//! # Audio Capture Module
//!
//! Records a take from the default input device using CPAL (Cross-Platform
//! Audio Library). The stream callback forwards blocks of samples over a
//! channel; the recording loop gathers them until a stop signal arrives from
//! a separate control thread.
//!
//! Only the first channel of multi-channel devices is kept, so the result is
//! always a mono [`SampleBuffer`].

use crate::error::{Result, TonalityError};
use crate::SampleBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

/// Preferred capture sample rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

fn audio_error(err: impl std::fmt::Display) -> TonalityError {
    TonalityError::Audio(err.to_string())
}

/// Starts audio capture from the default input device.
///
/// Every callback block is reduced to its first channel and sent to
/// `sender`. The capture runs until the returned stream is dropped or paused.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and sample rate
/// * `Err(e)` - No input device, no f32 input format, or the stream failed to start
pub fn start_audio_capture(sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| audio_error("No input device available"))?;

    info!("Using audio input device: {}", device.name().map_err(audio_error)?);

    let configs = device
        .supported_input_configs()
        .map_err(audio_error)?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| audio_error("No suitable f32 input format found"))?;

    let config = if supported_config.min_sample_rate().0 <= TARGET_SAMPLE_RATE
        && TARGET_SAMPLE_RATE <= supported_config.max_sample_rate().0
    {
        supported_config.with_sample_rate(cpal::SampleRate(TARGET_SAMPLE_RATE))
    } else {
        supported_config.with_max_sample_rate()
    };

    let sample_rate = config.sample_rate().0;
    let channels = config.channels().max(1) as usize;
    let config: cpal::StreamConfig = config.into();

    info!("Selected sample rate: {} Hz, {} channel(s)", sample_rate, channels);

    let err_fn = |err| warn!("An error occurred on the audio stream: {}", err);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let block: Vec<f32> = data.iter().step_by(channels).copied().collect();
                // The receiver is gone once recording stopped
                let _ = sender.send(block);
            },
            err_fn,
            None,
        )
        .map_err(audio_error)?;

    stream.play().map_err(audio_error)?;

    Ok((stream, sample_rate))
}

/// Records from the default input device until a message (or disconnect)
/// arrives on `stop`.
///
/// Fails if the device cannot be opened or nothing was captured.
pub fn record_until(stop: &Receiver<()>) -> Result<SampleBuffer> {
    let (sender, receiver) = crossbeam_channel::unbounded::<Vec<f32>>();
    let (stream, sample_rate) = start_audio_capture(sender)?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        crossbeam_channel::select! {
            recv(receiver) -> block => match block {
                Ok(block) => samples.extend_from_slice(&block),
                Err(_) => {
                    warn!("Audio stream closed before the stop signal");
                    break;
                }
            },
            recv(stop) -> _ => break,
        }
    }

    if let Err(e) = stream.pause() {
        debug!("Error pausing stream: {}", e);
    }
    drop(stream);
    samples.extend(receiver.try_iter().flatten());

    if samples.is_empty() {
        return Err(TonalityError::InvalidInput("recording too short".to_string()));
    }

    info!(
        "Captured {} samples ({:.2} s)",
        samples.len(),
        samples.len() as f32 / sample_rate as f32
    );
    Ok(SampleBuffer::new(samples, sample_rate))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float formats qualify. Mono configurations are preferred,
/// then the one whose rate range lies closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_distance = if c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0 {
                0
            } else {
                let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
                let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
                min_diff.min(max_diff)
            };
            (c.channels() != 1, rate_distance)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize};

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn prefers_mono_float_covering_target_rate() {
        let configs = vec![
            range(2, 8_000, 96_000, SampleFormat::F32),
            range(1, 8_000, 96_000, SampleFormat::I16),
            range(1, 48_000, 48_000, SampleFormat::F32),
            range(1, 44_100, 48_000, SampleFormat::F32),
        ];
        let chosen = find_supported_config(configs, 44_100).unwrap();
        assert_eq!(chosen.channels(), 1);
        assert_eq!(chosen.min_sample_rate().0, 44_100);
    }

    #[test]
    fn falls_back_to_stereo_float() {
        let configs = vec![
            range(2, 48_000, 48_000, SampleFormat::F32),
            range(1, 44_100, 44_100, SampleFormat::I16),
        ];
        let chosen = find_supported_config(configs, 44_100).unwrap();
        assert_eq!(chosen.channels(), 2);
        assert!(find_supported_config(vec![], 44_100).is_none());
    }
}
