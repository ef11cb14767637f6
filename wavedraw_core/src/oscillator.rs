//! Phase-accumulating wavetable playback.

use crossbeam::atomic::AtomicCell;

use crate::error::WavedrawError;
use crate::table::TableReader;

/// Plays the shared table's play buffer as one period of a waveform.
///
/// The phase runs in table-index units `[0, len)` and advances by
/// `frequency * len / sample_rate` per output sample. Lookup is a plain
/// floor read; the drawn table itself is the dense data, there is no
/// inter-sample filter.
pub struct WavetableOscillator {
    table: TableReader,
    sample_rate: f32,
    frequency: f32,
    step: f32,
    phase: AtomicCell<f32>,
}

impl WavetableOscillator {
    pub fn new(
        table: TableReader,
        sample_rate: f32,
        frequency: f32,
    ) -> Result<Self, WavedrawError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(WavedrawError::InvalidSampleRate(sample_rate));
        }
        let mut osc = Self {
            table,
            sample_rate,
            frequency: 0.0,
            step: 0.0,
            phase: AtomicCell::new(0.0),
        };
        osc.set_frequency(frequency)?;
        Ok(osc)
    }

    /// Sets the playback frequency in Hz and recomputes the phase step.
    ///
    /// Callers on the UI side reach this through the backend's engine slot,
    /// which already holds the oscillator exclusively for the duration of
    /// the call, so the step never changes underneath a running callback.
    pub fn set_frequency(&mut self, hz: f32) -> Result<(), WavedrawError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(WavedrawError::InvalidFrequency(hz));
        }
        let len = self.table.len() as f32;
        let step = hz * len / self.sample_rate;
        if !step.is_finite() {
            return Err(WavedrawError::InvalidFrequency(hz));
        }
        self.frequency = hz;
        // A step of k*len + r lands on the same phase positions as r alone,
        // so fold it here once (fmod is exact) and the per-sample wrap in
        // `fill` needs at most one subtraction.
        self.step = step % len;
        Ok(())
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Renders one mono block, one sample per output element.
    ///
    /// Takes a single read window over the play buffer for the whole block,
    /// so the table copy yields to this call at element granularity and
    /// resumes after it. No allocation and no unbounded looping: the step
    /// is already folded into `[0, len)`, so the subtraction wrap runs at
    /// most once per sample.
    pub fn fill(&mut self, out: &mut [f32]) {
        let len = self.table.len() as f32;
        let guard = self.table.read();
        let mut phase = self.phase.load();
        for sample in out.iter_mut() {
            *sample = guard.get(phase as usize);
            phase += self.step;
            while phase >= len {
                phase -= len;
            }
        }
        self.phase.store(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::shared_table;

    /// Table of `len` distinct values already committed to the play side.
    fn ramp_osc(len: usize, sample_rate: f32, frequency: f32) -> WavetableOscillator {
        let (mut writer, reader) = shared_table(len).unwrap();
        for i in 0..len {
            writer.write(i, i as f32);
        }
        writer.commit();
        WavetableOscillator::new(reader, sample_rate, frequency).unwrap()
    }

    #[test]
    fn rejects_bad_construction_parameters() {
        let (_, reader) = shared_table(8).unwrap();
        assert!(matches!(
            WavetableOscillator::new(reader, 0.0, 440.0),
            Err(WavedrawError::InvalidSampleRate(_))
        ));
        let (_, reader) = shared_table(8).unwrap();
        assert!(matches!(
            WavetableOscillator::new(reader, 44100.0, -1.0),
            Err(WavedrawError::InvalidFrequency(_))
        ));
    }

    #[test]
    fn set_frequency_rejects_nonpositive() {
        let mut osc = ramp_osc(8, 8.0, 1.0);
        assert_eq!(osc.sample_rate(), 8.0);
        assert!(osc.set_frequency(0.0).is_err());
        assert!(osc.set_frequency(f32::NAN).is_err());
        // Failed calls leave the old frequency in place.
        assert_eq!(osc.frequency(), 1.0);
    }

    #[test]
    fn unit_step_walks_the_table_in_order() {
        // sample_rate == len and 1 Hz give a step of exactly 1.0.
        let mut osc = ramp_osc(8, 8.0, 1.0);
        let mut out = [0.0f32; 8];
        osc.fill(&mut out);
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn phase_wraps_exactly_after_one_period() {
        let mut osc = ramp_osc(8, 8.0, 1.0);
        let mut out = [0.0f32; 8];
        osc.fill(&mut out);
        assert_eq!(osc.phase.load(), 0.0);
        // Second period reproduces the first bit for bit.
        let mut again = [0.0f32; 8];
        osc.fill(&mut again);
        assert_eq!(out, again);
    }

    #[test]
    fn integer_step_skips_evenly() {
        let mut osc = ramp_osc(8, 8.0, 2.0);
        let mut out = [0.0f32; 8];
        osc.fill(&mut out);
        assert_eq!(out, [0.0, 2.0, 4.0, 6.0, 0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn step_larger_than_table_still_wraps() {
        // 3 Hz at sample_rate 2 over 8 samples: raw step 12 folds to 4.
        let mut osc = ramp_osc(8, 2.0, 3.0);
        let mut out = [0.0f32; 4];
        osc.fill(&mut out);
        assert_eq!(out, [0.0, 4.0, 0.0, 4.0]);
    }

    #[test]
    fn rejects_non_finite_frequency() {
        let mut osc = ramp_osc(8, 8.0, 1.0);
        assert!(matches!(
            osc.set_frequency(f32::INFINITY),
            Err(WavedrawError::InvalidFrequency(_))
        ));
        assert!(matches!(
            osc.set_frequency(f32::NEG_INFINITY),
            Err(WavedrawError::InvalidFrequency(_))
        ));
        assert_eq!(osc.frequency(), 1.0);

        let (_, reader) = shared_table(8).unwrap();
        assert!(matches!(
            WavetableOscillator::new(reader, f32::INFINITY, 440.0),
            Err(WavedrawError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn extreme_finite_frequency_renders_in_bounded_time() {
        let mut osc = ramp_osc(8, 8.0, 1.0);
        osc.set_frequency(1.0e9).unwrap();
        let mut out = [0.0f32; 64];
        osc.fill(&mut out);
        // Phase stays inside the table and every output came from it.
        assert!(osc.phase.load() < 8.0);
        assert!(out.iter().all(|s| (0.0..8.0).contains(s)));
    }

    #[test]
    fn fill_reflects_committed_edits_between_blocks() {
        let (mut writer, reader) = shared_table(4).unwrap();
        let mut osc = WavetableOscillator::new(reader, 4.0, 1.0).unwrap();
        let mut out = [0.0f32; 4];
        osc.fill(&mut out);
        assert_eq!(out, [0.0; 4]);

        for i in 0..4 {
            writer.write(i, 0.5);
        }
        writer.commit();
        osc.fill(&mut out);
        assert_eq!(out, [0.5; 4]);
    }
}
