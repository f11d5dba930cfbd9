//! CPU-visible register state.

use crate::cpu::InterruptMode;
use crate::flags::{CF, HF, NF, PF, SF, ZF};

/// All CPU-visible state: the main and alternate 8-bit sets, the index
/// and control registers, and the interrupt flip-flops.
///
/// Every 8-bit field holds a value in [0, 255] and every 16-bit field a
/// value in [0, 65535] by construction; all arithmetic on them wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    /// Index registers.
    pub ix: u16,
    pub iy: u16,

    /// Interrupt vector (high byte of the IM 2 pointer).
    pub i: u8,
    /// Memory refresh: low 7 bits count opcode fetches, bit 7 is sticky.
    pub r: u8,

    pub pc: u16,
    pub sp: u16,

    /// Interrupt enable flip-flop and its backup (restored by RETN).
    pub iff1: bool,
    pub iff2: bool,
    /// Current interrupt mode.
    pub im: InterruptMode,

    /// Set by HALT; cleared when an interrupt wakes the CPU.
    pub halted: bool,
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_alt: 0,
            f_alt: 0,
            b_alt: 0,
            c_alt: 0,
            d_alt: 0,
            e_alt: 0,
            h_alt: 0,
            l_alt: 0,
            ix: 0,
            iy: 0,
            i: 0,
            r: 0,
            pc: 0,
            sp: 0,
            iff1: false,
            iff2: false,
            im: InterruptMode::Im0,
            halted: false,
        }
    }

    // --- register pairs -------------------------------------------------

    #[must_use]
    pub fn af(&self) -> u16 {
        (u16::from(self.a) << 8) | u16::from(self.f)
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    #[must_use]
    pub fn bc(&self) -> u16 {
        (u16::from(self.b) << 8) | u16::from(self.c)
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    #[must_use]
    pub fn de(&self) -> u16 {
        (u16::from(self.d) << 8) | u16::from(self.e)
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    #[must_use]
    pub fn hl(&self) -> u16 {
        (u16::from(self.h) << 8) | u16::from(self.l)
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    #[must_use]
    pub fn af_alt(&self) -> u16 {
        (u16::from(self.a_alt) << 8) | u16::from(self.f_alt)
    }

    pub fn set_af_alt(&mut self, value: u16) {
        self.a_alt = (value >> 8) as u8;
        self.f_alt = value as u8;
    }

    #[must_use]
    pub fn bc_alt(&self) -> u16 {
        (u16::from(self.b_alt) << 8) | u16::from(self.c_alt)
    }

    pub fn set_bc_alt(&mut self, value: u16) {
        self.b_alt = (value >> 8) as u8;
        self.c_alt = value as u8;
    }

    #[must_use]
    pub fn de_alt(&self) -> u16 {
        (u16::from(self.d_alt) << 8) | u16::from(self.e_alt)
    }

    pub fn set_de_alt(&mut self, value: u16) {
        self.d_alt = (value >> 8) as u8;
        self.e_alt = value as u8;
    }

    #[must_use]
    pub fn hl_alt(&self) -> u16 {
        (u16::from(self.h_alt) << 8) | u16::from(self.l_alt)
    }

    pub fn set_hl_alt(&mut self, value: u16) {
        self.h_alt = (value >> 8) as u8;
        self.l_alt = value as u8;
    }

    // --- register-code lookup -------------------------------------------

    /// Read a register by its 3-bit opcode field.
    ///
    /// Codes: 0=B 1=C 2=D 3=E 4=H 5=L 7=A. Code 6 addresses memory via
    /// (HL) and is the caller's responsibility.
    ///
    /// # Panics
    ///
    /// Panics on code 6 or codes above 7.
    #[must_use]
    pub fn reg8(&self, code: u8) -> u8 {
        match code {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => panic!("register code {code} is not a simple register"),
        }
    }

    /// Write a register by its 3-bit opcode field. See [`Registers::reg8`].
    ///
    /// # Panics
    ///
    /// Panics on code 6 or codes above 7.
    pub fn set_reg8(&mut self, code: u8, value: u8) {
        match code {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            7 => self.a = value,
            _ => panic!("register code {code} is not a simple register"),
        }
    }

    // --- flag accessors -------------------------------------------------

    #[must_use]
    pub fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    pub fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    #[must_use]
    pub fn sign(&self) -> bool {
        self.flag(SF)
    }

    pub fn set_sign(&mut self, value: bool) {
        self.set_flag(SF, value);
    }

    #[must_use]
    pub fn zero(&self) -> bool {
        self.flag(ZF)
    }

    pub fn set_zero(&mut self, value: bool) {
        self.set_flag(ZF, value);
    }

    #[must_use]
    pub fn half_carry(&self) -> bool {
        self.flag(HF)
    }

    pub fn set_half_carry(&mut self, value: bool) {
        self.set_flag(HF, value);
    }

    #[must_use]
    pub fn parity_overflow(&self) -> bool {
        self.flag(PF)
    }

    pub fn set_parity_overflow(&mut self, value: bool) {
        self.set_flag(PF, value);
    }

    #[must_use]
    pub fn subtract(&self) -> bool {
        self.flag(NF)
    }

    pub fn set_subtract(&mut self, value: bool) {
        self.set_flag(NF, value);
    }

    #[must_use]
    pub fn carry(&self) -> bool {
        self.flag(CF)
    }

    pub fn set_carry(&mut self, value: bool) {
        self.set_flag(CF, value);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
