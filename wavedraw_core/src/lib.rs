//! Drawable wavetable core: a double-buffered sample table with a chunked,
//! reader-yielding copy protocol, a pointer-gesture editor that fills the
//! table by linear interpolation, and a phase-accumulating oscillator that
//! plays the table back.
//!
//! The table is split into two halves at construction: the edit half lives
//! on the UI/main thread, the play half inside the audio callback. Nothing
//! in this crate touches an audio device or a window; see the backend and
//! app crates for those.

pub mod editor;
pub mod error;
pub mod oscillator;
pub mod table;

pub use editor::WaveformEditor;
pub use error::WavedrawError;
pub use oscillator::WavetableOscillator;
pub use table::{ReadGuard, TableReader, TableWriter, shared_table};
