//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The CPU reaches memory and peripherals exclusively through this trait;
/// it never holds the backing storage itself. Addresses are masked to
/// 16 bits by implementations, so out-of-range access is defined
/// behaviour, never an error.
pub trait Bus {
    /// Read a byte from the given memory address.
    fn read_byte(&mut self, address: u16) -> u8;

    /// Write a byte to the given memory address.
    fn write_byte(&mut self, address: u16, value: u8);

    /// Read a little-endian word: low byte at `address`, high byte at
    /// `address + 1`, wrapping at the 64K boundary.
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read_byte(address);
        let hi = self.read_byte(address.wrapping_add(1));
        u16::from(lo) | (u16::from(hi) << 8)
    }

    /// Write a little-endian word, wrapping at the 64K boundary.
    fn write_word(&mut self, address: u16, value: u16) {
        self.write_byte(address, value as u8);
        self.write_byte(address.wrapping_add(1), (value >> 8) as u8);
    }

    /// Read a byte from the given I/O port.
    fn io_read_byte(&mut self, address: u16) -> u8;

    /// Write a byte to the given I/O port.
    fn io_write_byte(&mut self, address: u16, value: u8);

    /// Data placed on the bus by an interrupting device.
    ///
    /// Consulted when servicing a maskable interrupt: in IM 2 it supplies
    /// the low byte of the vector-table pointer, in IM 0 the instruction
    /// to execute. `None` leaves the bus floating (reads as 0xFF).
    fn irq_data(&mut self) -> Option<u8> {
        None
    }
}
