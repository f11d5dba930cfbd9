//! Audio sample production and the hand-off buffer to the playback
//! thread.
//!
//! The emulation thread produces one averaged byte sample every
//! [`SAMPLE_INTERVAL_TSTATES`] cycles and pushes a frame's worth at a time
//! into a bounded circular buffer. Both ends are non-blocking and report
//! how many bytes actually moved, so a slow consumer can never stall the
//! 20 ms frame cadence; on overrun the newest data is dropped.

use std::sync::Mutex;

/// Cycles per audio sample.
pub const SAMPLE_INTERVAL_TSTATES: u32 = 76;

/// Circular buffer capacity in bytes.
const BUFFER_CAPACITY: usize = 4 * 8192;

struct BufferState {
    data: Box<[u8; BUFFER_CAPACITY]>,
    read: usize,
    write: usize,
    occupied: usize,
}

/// Bounded single-producer/single-consumer byte buffer.
///
/// Constructed explicitly by the machine and handed to the audio consumer
/// by reference at startup; both sides share it behind an `Arc`.
pub struct CircularBuffer {
    state: Mutex<BufferState>,
}

impl CircularBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BufferState {
                data: Box::new([0; BUFFER_CAPACITY]),
                read: 0,
                write: 0,
                occupied: 0,
            }),
        }
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        BUFFER_CAPACITY
    }

    /// Bytes currently queued.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.state.lock().map_or(0, |state| state.occupied)
    }

    /// Copy as much of `src` as fits and return the number of bytes
    /// accepted; anything beyond a full buffer is dropped.
    pub fn put(&self, src: &[u8]) -> usize {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };

        let mut moved = 0;
        for &byte in src {
            if state.occupied == BUFFER_CAPACITY {
                break;
            }
            let write = state.write;
            state.data[write] = byte;
            state.write = (write + 1) % BUFFER_CAPACITY;
            state.occupied += 1;
            moved += 1;
        }
        moved
    }

    /// Fill as much of `dst` as the queue allows and return the number of
    /// bytes delivered.
    pub fn get(&self, dst: &mut [u8]) -> usize {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };

        let mut moved = 0;
        for slot in dst {
            if state.occupied == 0 {
                break;
            }
            let read = state.read;
            *slot = state.data[read];
            state.read = (read + 1) % BUFFER_CAPACITY;
            state.occupied -= 1;
            moved += 1;
        }
        moved
    }
}

impl Default for CircularBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative moving average.
fn cumulative_average(previous: f32, sample: f32, count: u32) -> f32 {
    (sample + (count - 1) as f32 * previous) / count as f32
}

/// Averages the EAR output level into byte samples, one every
/// [`SAMPLE_INTERVAL_TSTATES`] cycles.
///
/// A sample left unfinished at a frame boundary carries into the next
/// frame rather than being lost.
pub struct Sampler {
    elapsed: u32,
    average: f32,
    samples: Vec<u8>,
}

impl Sampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            elapsed: 0,
            average: 0.0,
            samples: Vec::new(),
        }
    }

    /// Account one cycle at the given output level (0 or 1).
    pub fn tick(&mut self, level: u8) {
        let sample = if level == 0 { 0.0 } else { 255.0 };
        self.elapsed += 1;
        self.average = cumulative_average(self.average, sample, self.elapsed);

        if self.elapsed == SAMPLE_INTERVAL_TSTATES {
            self.samples.push(self.average.round() as u8);
            self.elapsed = 0;
            self.average = 0.0;
        }
    }

    /// Account `count` cycles at a constant level.
    pub fn tick_n(&mut self, count: u32, level: u8) {
        for _ in 0..count {
            self.tick(level);
        }
    }

    /// Drain the finished samples.
    pub fn take_frame(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.samples)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
