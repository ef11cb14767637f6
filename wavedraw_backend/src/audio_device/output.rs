use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig, SupportedBufferSize};
use log::info;

/// What the application would like from the output device. Everything here
/// is a preference, not a hard requirement: an unsupported rate falls back
/// to the device default, the buffer size is clamped into the device's
/// supported range, and the channel count defaults to the device layout.
#[derive(Debug, Clone)]
pub struct OutputRequest {
    pub sample_rate: u32,
    pub channels: Option<u16>,
    /// Frames per callback. Smaller means lower latency between a drawn
    /// edit and hearing it.
    pub buffer_frames: u32,
}

impl Default for OutputRequest {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: None,
            buffer_frames: 64,
        }
    }
}

/// A device plus the concrete f32 stream configuration negotiated for it.
pub struct SelectedOutput {
    pub device: cpal::Device,
    pub device_name: String,
    pub config: StreamConfig,
}

pub type OutputResult<T> = Result<T, OutputError>;

#[derive(Debug)]
pub enum OutputError {
    NoOutputDevice,
    QueryFailed(String),
    NoF32Config,
    BuildFailed(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOutputDevice => write!(f, "no default audio output device"),
            Self::QueryFailed(msg) => write!(f, "output device query failed: {}", msg),
            Self::NoF32Config => write!(f, "device offers no f32 output configuration"),
            Self::BuildFailed(msg) => write!(f, "output stream build failed: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}

/// Picks the default output device of the default host and negotiates an
/// f32 stream config for it per `request`.
pub fn select_output(request: &OutputRequest) -> OutputResult<SelectedOutput> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(OutputError::NoOutputDevice)?;
    let device_name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());

    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| OutputError::QueryFailed(e.to_string()))?
        .filter(|range| range.sample_format() == SampleFormat::F32)
        .collect();

    // Prefer a range that covers the requested rate (and channel count, if
    // one was asked for); otherwise take any f32 range at the device's
    // default rate.
    let requested_rate = SampleRate(request.sample_rate);
    let chosen = ranges
        .iter()
        .find(|range| {
            range.min_sample_rate() <= requested_rate
                && requested_rate <= range.max_sample_rate()
                && request.channels.is_none_or(|ch| range.channels() == ch)
        })
        .map(|range| range.clone().with_sample_rate(requested_rate));

    let supported = match chosen {
        Some(config) => config,
        None => {
            let fallback = device
                .default_output_config()
                .map_err(|e| OutputError::QueryFailed(e.to_string()))?;
            if fallback.sample_format() != SampleFormat::F32 {
                return Err(OutputError::NoF32Config);
            }
            fallback
        }
    };

    let buffer_size = match supported.buffer_size() {
        SupportedBufferSize::Range { min, max } => {
            BufferSize::Fixed(request.buffer_frames.clamp(*min, *max))
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    };

    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size,
    };
    info!(
        "output: {} [{}ch @ {}Hz, buffer {:?}]",
        device_name,
        config.channels,
        config.sample_rate.0,
        config.buffer_size
    );

    Ok(SelectedOutput {
        device,
        device_name,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_targets_cd_rate_small_buffer() {
        let request = OutputRequest::default();
        assert_eq!(request.sample_rate, 44_100);
        assert_eq!(request.buffer_frames, 64);
        assert_eq!(request.channels, None);
    }

    #[test]
    fn errors_render_human_readable() {
        assert_eq!(
            OutputError::NoOutputDevice.to_string(),
            "no default audio output device"
        );
        assert!(
            OutputError::QueryFailed("backend gone".into())
                .to_string()
                .contains("backend gone")
        );
    }
}
