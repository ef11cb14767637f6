//! Adapts the mono core oscillator to the device's interleaved layout.

use wavedraw_core::{WavedrawError, WavetableOscillator};

use crate::rt_processing::callback::AudioCallback;

/// Realtime engine: renders one mono block from the oscillator, then fans
/// each frame out across the device channels with an output gain.
pub struct OscillatorEngine {
    osc: WavetableOscillator,
    gain: f32,
    /// Mono scratch block. Grown only when the device hands a larger block
    /// than any seen before.
    mono: Vec<f32>,
}

impl OscillatorEngine {
    pub fn new(osc: WavetableOscillator, gain: f32) -> Self {
        Self {
            osc,
            gain: gain.clamp(0.0, 1.0),
            mono: Vec::new(),
        }
    }

    /// Preallocates the scratch block so steady-state callbacks never touch
    /// the allocator.
    pub fn with_block_capacity(mut self, frames: usize) -> Self {
        self.mono.resize(frames, 0.0);
        self
    }

    pub fn set_frequency(&mut self, hz: f32) -> Result<(), WavedrawError> {
        self.osc.set_frequency(hz)
    }

    pub fn frequency(&self) -> f32 {
        self.osc.frequency()
    }
}

impl AudioCallback for OscillatorEngine {
    fn process(&mut self, output: &mut [f32], _sample_rate: f32, channels: usize, frames: usize) {
        if self.mono.len() < frames {
            self.mono.resize(frames, 0.0);
        }
        self.osc.fill(&mut self.mono[..frames]);

        for frame in 0..frames {
            let sample = self.mono[frame] * self.gain;
            let start = frame * channels;
            for out in &mut output[start..start + channels] {
                *out = sample;
            }
        }
    }
}
