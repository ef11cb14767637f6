//! Double-buffered sample table shared between the edit thread and the
//! audio callback.
//!
//! Design goals:
//! - The audio-side reader must never wait longer than one element copy.
//! - The edit-side writer must never block at all.
//! - No OS mutex anywhere near the hot path.
//!
//! Instead of a lock, the copy from the edit buffer to the play buffer is
//! chunked at single-element granularity: before every element the writer
//! checks whether the reader is active and, if so, parks its cursor and
//! returns. The reader announces itself, then spins only until the writer
//! has finished the element it was on. Convergence of the play buffer is
//! therefore eventual, not atomic: under constant contention a pass may
//! advance by as little as one element per attempt, which is the accepted
//! trade-off for the bounded reader wait.

use std::cell::UnsafeCell;
use std::hint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::WavedrawError;

/// State shared between the two table halves. The play buffer is only ever
/// touched under the flag protocol below, never through a lock.
struct Shared {
    /// Table length; fixed at construction.
    len: usize,
    play: UnsafeCell<Box<[f32]>>,
    /// True while a `ReadGuard` is alive on the audio side.
    reading: AtomicBool,
    /// True while `commit` is inside a copy pass.
    copying: AtomicBool,
    /// Resume position for an interrupted pass. Only the writer thread
    /// stores or loads it.
    cursor: AtomicUsize,
}

// SAFETY: `play` is accessed from two threads, but never concurrently. The
// writer stores `copying` and then loads `reading` before every element; the
// reader stores `reading` and then loads `copying` before every access. Both
// sides use SeqCst so the two store-then-load handshakes cannot both miss
// the other's store, which means either the writer sees the reader and
// aborts before touching the buffer, or the reader sees the in-progress pass
// and spins until `copying` clears.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

/// Creates the two halves of a shared wavetable, both buffers zero-filled.
/// The writer half belongs to the edit thread, the reader half to the audio
/// callback; neither is `Clone`, so the single-producer/single-consumer
/// shape is enforced by ownership.
pub fn shared_table(len: usize) -> Result<(TableWriter, TableReader), WavedrawError> {
    if len < 2 {
        return Err(WavedrawError::TableTooShort(len));
    }
    let shared = Arc::new(Shared {
        len,
        play: UnsafeCell::new(vec![0.0; len].into_boxed_slice()),
        reading: AtomicBool::new(false),
        copying: AtomicBool::new(false),
        cursor: AtomicUsize::new(0),
    });
    let writer = TableWriter {
        edit: vec![0.0; len].into_boxed_slice(),
        shared: Arc::clone(&shared),
    };
    let reader = TableReader { shared };
    Ok((writer, reader))
}

/// Edit-side half: owns the edit buffer outright and drives the chunked
/// copy into the play buffer.
pub struct TableWriter {
    edit: Box<[f32]>,
    shared: Arc<Shared>,
}

impl TableWriter {
    pub fn len(&self) -> usize {
        self.edit.len()
    }

    /// Stores one sample into the edit buffer. Panics if `index` is out of
    /// range; the input boundary clamps indices before calling in.
    pub fn write(&mut self, index: usize, value: f32) {
        self.edit[index] = value;
    }

    /// Read-only view of the edit buffer, for display rendering.
    pub fn samples(&self) -> &[f32] {
        &self.edit
    }

    /// Attempts to propagate the edit buffer into the play buffer, resuming
    /// from wherever the previous attempt left off and wrapping circularly
    /// through the whole table exactly once.
    ///
    /// Never blocks: the reader flag is checked before every single element,
    /// and contention aborts the pass immediately with the position saved
    /// for the next attempt. A completed pass resets the cursor to zero.
    pub fn commit(&mut self) {
        let shared = &*self.shared;
        let n = self.edit.len();

        shared.copying.store(true, Ordering::SeqCst);
        let start = shared.cursor.load(Ordering::Relaxed);
        let play = shared.play.get();

        for k in 0..n {
            let i = (start + k) % n;
            if shared.reading.load(Ordering::SeqCst) {
                shared.cursor.store(i, Ordering::Relaxed);
                shared.copying.store(false, Ordering::SeqCst);
                return;
            }
            // SAFETY: the reader was observed inactive after `copying` was
            // raised; if it activates now it will spin on `copying` and not
            // touch the buffer until this pass aborts or completes.
            unsafe {
                (*play)[i] = self.edit[i];
            }
        }

        shared.cursor.store(0, Ordering::Relaxed);
        shared.copying.store(false, Ordering::SeqCst);
    }
}

/// Audio-side half: grants access to the play buffer through an RAII guard.
pub struct TableReader {
    shared: Arc<Shared>,
}

impl TableReader {
    pub fn len(&self) -> usize {
        self.shared.len
    }

    /// Announces the reader and waits out any in-flight element copy.
    ///
    /// The spin here is bounded by the cost of copying *one* element, not
    /// the table, because `commit` re-checks the reader flag between every
    /// element. The flag clears when the guard drops.
    ///
    /// Takes `&mut self` so the guard's borrow excludes a second window:
    /// the flag protocol assumes exactly one reader, and an overlapping
    /// guard would clear `reading` while the other window is still open.
    pub fn read(&mut self) -> ReadGuard<'_> {
        self.shared.reading.store(true, Ordering::SeqCst);
        while self.shared.copying.load(Ordering::SeqCst) {
            hint::spin_loop();
        }
        ReadGuard { shared: &self.shared }
    }
}

/// Exclusive read window over the play buffer. The copy pass stays parked
/// while this is alive.
pub struct ReadGuard<'a> {
    shared: &'a Shared,
}

impl ReadGuard<'_> {
    pub fn len(&self) -> usize {
        self.shared.len
    }

    /// Play-buffer sample at `index`. Panics if out of range.
    pub fn get(&self, index: usize) -> f32 {
        // SAFETY: `reading` is set and `copying` was observed clear when the
        // guard was taken, so no copy pass writes while we read.
        unsafe { (*self.shared.play.get())[index] }
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.shared.reading.store(false, Ordering::SeqCst);
    }
}
