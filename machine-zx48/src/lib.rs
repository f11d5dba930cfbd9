//! ZX Spectrum 48K machine.
//!
//! Wires the Z80 to the Spectrum bus and runs them in lockstep under the
//! frame clock: 69,888 T-states per frame, one maskable interrupt per
//! frame, audio samples averaged on a fixed cycle cadence.

mod audio;
mod bus;
mod input;
mod memory;
mod snapshot;
mod spectrum;

pub use audio::{CircularBuffer, Sampler, SAMPLE_INTERVAL_TSTATES};
pub use bus::{Zx48Bus, PIXEL_BUFFER_LEN};
pub use input::{InputState, Key};
pub use memory::{Memory, ROM_END};
pub use snapshot::{load_sna, load_sna_file, save_sna, save_sna_file, SnapshotError, SNA_LEN};
pub use spectrum::{Spectrum, TSTATES_PER_FRAME};
