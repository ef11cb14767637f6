//! Audio device plumbing for wavedraw: output-device selection, stream
//! construction, and the realtime engine slot that bridges the cpal
//! callback to the core oscillator.

pub mod audio_device;
pub mod rt_processing;

pub use audio_device::output::{OutputError, OutputRequest, SelectedOutput, select_output};
pub use audio_device::stream::open_output;
pub use rt_processing::callback::{AudioCallback, EngineSlot};
pub use rt_processing::engine::OscillatorEngine;
