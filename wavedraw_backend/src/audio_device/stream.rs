use std::sync::Arc;

use cpal::traits::DeviceTrait;
use cpal::{Stream, StreamConfig};
use log::warn;

use crate::audio_device::output::{OutputError, OutputResult, SelectedOutput};
use crate::rt_processing::callback::{AudioCallback, EngineSlot};

/// Builds the output stream whose data callback is the slot's realtime
/// entry point. The returned stream is paused; the caller owns its
/// lifecycle (`play`, drop).
///
/// Device-level runtime errors land in the error callback and are logged;
/// there is no recovery path here, the stream simply keeps being invoked or
/// not as the device decides.
pub fn open_output<E: AudioCallback>(
    selected: &SelectedOutput,
    slot: Arc<EngineSlot<E>>,
) -> OutputResult<Stream> {
    let config: StreamConfig = selected.config.clone();
    let device_name = selected.device_name.clone();
    selected
        .device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                slot.process_realtime(data);
            },
            move |err| {
                warn!("output stream error on {}: {}", device_name, err);
            },
            None,
        )
        .map_err(|e| OutputError::BuildFailed(e.to_string()))
}
