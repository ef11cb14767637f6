//! Lock-conscious slot between the audio callback and the rest of the app.
//!
//! The audio thread must never take an OS mutex or allocate, but the UI
//! thread still needs a way to poke the engine (frequency changes). The
//! slot holds the engine behind a `spin::Mutex`: the audio side try-locks
//! and falls back to silence if the UI happens to be inside the engine at
//! that instant, the UI side spins for at most one callback's duration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

/// One engine invocation per device callback. Implementations fill the
/// interleaved buffer and must not block or allocate on the hot path.
pub trait AudioCallback: Send + 'static {
    /// Fill `output` (length `frames * channels`, interleaved f32) with
    /// audio for this callback.
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize);
}

/// Shared holder for the engine plus realtime-safe counters.
pub struct EngineSlot<E: AudioCallback> {
    engine: Mutex<E>,
    /// Frames handed to the device so far. Relaxed; monitoring only.
    frame_clock: AtomicU64,
    /// Callbacks that went out as silence because the engine was held by
    /// the non-realtime side.
    starved: AtomicU64,
    sample_rate: f32,
    channels: usize,
}

impl<E: AudioCallback> EngineSlot<E> {
    pub fn new(engine: E, sample_rate: f32, channels: usize) -> Arc<Self> {
        Arc::new(Self {
            engine: Mutex::new(engine),
            frame_clock: AtomicU64::new(0),
            starved: AtomicU64::new(0),
            sample_rate,
            channels,
        })
    }

    /// Entry point for the device's data callback. Try-locks the engine;
    /// on contention outputs silence rather than waiting, and counts the
    /// miss. Returns whether the engine actually ran.
    ///
    /// No allocation happens here regardless of outcome.
    pub fn process_realtime(&self, output: &mut [f32]) -> bool {
        let frames = output.len() / self.channels;
        if frames == 0 {
            return false;
        }
        self.frame_clock.fetch_add(frames as u64, Ordering::Relaxed);

        if let Some(mut engine) = self.engine.try_lock() {
            engine.process(output, self.sample_rate, self.channels, frames);
            true
        } else {
            output.fill(0.0);
            self.starved.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Mutates the engine in place from the non-realtime side. Spins until
    /// the audio callback releases the engine, so the wait is bounded by a
    /// single callback. Never call this from the audio thread.
    pub fn with_engine_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut E) -> R,
    {
        let mut engine = self.engine.lock();
        f(&mut engine)
    }

    /// Frames processed so far (silence fallbacks included).
    pub fn frame_count(&self) -> u64 {
        self.frame_clock.load(Ordering::Relaxed)
    }

    /// Playback position in seconds.
    pub fn playback_time(&self) -> f32 {
        self.frame_clock.load(Ordering::Relaxed) as f32 / self.sample_rate
    }

    /// Callbacks that produced silence because the engine was contended.
    pub fn starved_callbacks(&self) -> u64 {
        self.starved.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dc(f32);

    impl AudioCallback for Dc {
        fn process(&mut self, output: &mut [f32], _: f32, _: usize, _: usize) {
            output.fill(self.0);
        }
    }

    #[test]
    fn runs_engine_and_advances_frame_clock() {
        let slot = EngineSlot::new(Dc(0.25), 48000.0, 2);
        let mut buf = [0.0f32; 8];
        assert!(slot.process_realtime(&mut buf));
        assert_eq!(buf, [0.25; 8]);
        assert_eq!(slot.frame_count(), 4);
        assert_eq!(slot.starved_callbacks(), 0);
    }

    #[test]
    fn empty_buffer_is_a_no_op() {
        let slot = EngineSlot::new(Dc(1.0), 48000.0, 2);
        let mut buf = [0.0f32; 1]; // less than one stereo frame
        assert!(!slot.process_realtime(&mut buf));
        assert_eq!(slot.frame_count(), 0);
    }

    #[test]
    fn contended_engine_falls_back_to_silence() {
        let slot = EngineSlot::new(Dc(1.0), 48000.0, 1);
        let held = slot.engine.lock();
        let mut buf = [9.0f32; 4];
        assert!(!slot.process_realtime(&mut buf));
        assert_eq!(buf, [0.0; 4]);
        assert_eq!(slot.starved_callbacks(), 1);
        drop(held);
        assert!(slot.process_realtime(&mut buf));
        assert_eq!(buf, [1.0; 4]);
    }

    #[test]
    fn playback_time_follows_the_frame_clock() {
        let slot = EngineSlot::new(Dc(0.0), 100.0, 2);
        let mut buf = [0.0f32; 200]; // 100 frames at 100 Hz: one second
        assert!(slot.process_realtime(&mut buf));
        assert!((slot.playback_time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn with_engine_mut_sees_engine_state() {
        let slot = EngineSlot::new(Dc(0.0), 44100.0, 1);
        slot.with_engine_mut(|e| e.0 = -0.5);
        let mut buf = [0.0f32; 2];
        slot.process_realtime(&mut buf);
        assert_eq!(buf, [-0.5; 2]);
    }
}
