//! The assembled machine and its frame loop.
//!
//! One frame is 69,888 T-states (about 20 ms at the nominal 3.5 MHz
//! clock). The driver steps the CPU until the budget is met, carries any
//! overshoot into the next frame so the long-run cadence stays exact,
//! raises the maskable interrupt once, and hands the frame's audio
//! samples to the circular buffer.

use std::sync::Arc;

use cpu_z80::Z80;
use emu_core::Clock;

use crate::audio::{CircularBuffer, Sampler};
use crate::bus::{Zx48Bus, PIXEL_BUFFER_LEN};
use crate::input::InputState;

/// T-states per 50 Hz frame.
pub const TSTATES_PER_FRAME: u32 = 69_888;

/// ZX Spectrum 48K.
pub struct Spectrum {
    cpu: Z80,
    bus: Zx48Bus,
    clock: Clock,
    sampler: Sampler,
    audio: Arc<CircularBuffer>,
    input: Arc<InputState>,
    /// T-states consumed inside the current frame (may start nonzero
    /// from the previous frame's overshoot).
    frame_tstates: u32,
    frame_count: u64,
}

impl Spectrum {
    #[must_use]
    pub fn new() -> Self {
        let input = Arc::new(InputState::new());
        Self {
            cpu: Z80::new(),
            bus: Zx48Bus::new(Arc::clone(&input)),
            clock: Clock::new(),
            sampler: Sampler::new(),
            audio: Arc::new(CircularBuffer::new()),
            input,
            frame_tstates: 0,
            frame_count: 0,
        }
    }

    /// Load a ROM image at address 0 through the unrestricted path.
    pub fn load_rom(&mut self, rom: &[u8]) {
        self.bus.load(0x0000, rom);
    }

    /// Execute one instruction, account its cycles, feed the sampler.
    pub fn step(&mut self) -> u32 {
        let tstates = self.cpu.step(&mut self.bus);
        self.clock.advance(tstates);
        self.sampler.tick_n(tstates, self.bus.ear_out());
        self.frame_tstates += tstates;
        tstates
    }

    /// Run instructions until the frame budget is met, then raise INT and
    /// publish the frame's audio samples.
    ///
    /// Returns the T-states consumed by this call. Overshoot past the
    /// budget is carried into the next frame, so a stream of fixed-cost
    /// instructions sees the interrupt every 69,888 T-states exactly.
    pub fn run_frame(&mut self) -> u32 {
        let mut consumed = 0;
        while self.frame_tstates < TSTATES_PER_FRAME {
            consumed += self.step();
        }
        self.frame_tstates -= TSTATES_PER_FRAME;

        self.cpu.interrupt();

        let samples = self.sampler.take_frame();
        self.audio.put(&samples);

        self.frame_count += 1;
        consumed
    }

    /// Reset CPU and bus; memory is zeroed by its owner.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        self.sampler = Sampler::new();
        self.frame_tstates = 0;
        self.frame_count = 0;
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &Zx48Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Zx48Bus {
        &mut self.bus
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Shared input state for capture threads.
    #[must_use]
    pub fn input(&self) -> Arc<InputState> {
        Arc::clone(&self.input)
    }

    /// Shared audio buffer for the playback thread.
    #[must_use]
    pub fn audio(&self) -> Arc<CircularBuffer> {
        Arc::clone(&self.audio)
    }

    /// The linear pixel buffer for the screen decoder.
    #[must_use]
    pub fn pixels(&self) -> &[u8; PIXEL_BUFFER_LEN] {
        self.bus.pixels()
    }

    /// Current border colour.
    #[must_use]
    pub fn border(&self) -> u8 {
        self.bus.border()
    }

    /// Completed frames; the screen decoder keys flash phase off this.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for Spectrum {
    fn default() -> Self {
        Self::new()
    }
}
