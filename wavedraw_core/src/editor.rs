//! Turns a stream of pointer positions into dense wavetable edits.
//!
//! Pointer events arrive once per frame, so a fast horizontal drag can skip
//! dozens of table indices between two events. Writing only the sampled
//! positions would leave stale values (audible steps) in the gaps, so every
//! index the pointer crossed is filled by linear interpolation between the
//! previous point and the current one.

use crate::table::TableWriter;

/// Edit-side front end over a [`TableWriter`]: interpolating drag writes
/// plus gesture lifecycle. One instance per table, owned by the UI thread.
pub struct WaveformEditor {
    table: TableWriter,
    /// Previous point of the active gesture; `None` between gestures.
    last: Option<(usize, f32)>,
}

impl WaveformEditor {
    pub fn new(table: TableWriter) -> Self {
        Self { table, last: None }
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Read-only view of the edit buffer, one sample per index, for the
    /// display to render as a polyline.
    pub fn samples(&self) -> &[f32] {
        self.table.samples()
    }

    /// Handles one pointer sample of an active drag. `index` must already be
    /// clamped to `[0, len)` by the input boundary; `value` is taken as-is,
    /// out-of-range amplitudes are allowed and simply played back.
    ///
    /// The first point of a gesture is written directly. Every later point
    /// fills the full span back to the previous point, endpoints inclusive
    /// (rewriting the shared endpoint is idempotent), walking left or right
    /// as the pointer moved. Each call ends with a commit attempt so the
    /// play buffer starts converging immediately.
    pub fn on_drag(&mut self, index: usize, value: f32) {
        match self.last {
            None => self.table.write(index, value),
            Some((last_index, last_value)) => {
                let di = index as isize - last_index as isize;
                if di == 0 {
                    self.table.write(index, value);
                } else {
                    let dv = value - last_value;
                    let step = di.signum();
                    let mut k = 0isize;
                    loop {
                        // k/di stays in [0, 1] for either sign of di.
                        let frac = k as f32 / di as f32;
                        self.table
                            .write((last_index as isize + k) as usize, last_value + frac * dv);
                        if k == di {
                            break;
                        }
                        k += step;
                    }
                }
            }
        }
        self.last = Some((index, value));
        self.table.commit();
    }

    /// Ends the gesture: the next drag starts a fresh stroke instead of
    /// interpolating from the old endpoint. Commits once more to flush
    /// anything a contended pass left behind.
    pub fn on_release(&mut self) {
        self.last = None;
        self.table.commit();
    }
}
