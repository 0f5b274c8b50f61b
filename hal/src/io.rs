//! I/O space register access
//!
//! The eZ80 maps its on-chip peripherals into a separate 8-bit I/O address
//! space reached through dedicated `IN0`/`OUT0` instructions. Everything in
//! this crate goes through [`IoBus`] so the same register logic runs against
//! real silicon, a simulator, or a test double.

/// Byte-wide access to the on-chip I/O register space.
///
/// Reads take `&mut self` because some registers have read side effects
/// (reading a timer control register acknowledges its interrupt).
pub trait IoBus {
    /// Read the register at `reg`.
    fn read(&mut self, reg: u8) -> u8;

    /// Write `value` to the register at `reg`.
    fn write(&mut self, reg: u8, value: u8);

    /// Read-modify-write: clear the `clear` bits, then set the `set` bits.
    fn modify(&mut self, reg: u8, clear: u8, set: u8) {
        let value = self.read(reg);
        self.write(reg, (value & !clear) | set);
    }
}

impl<B: IoBus + ?Sized> IoBus for &mut B {
    fn read(&mut self, reg: u8) -> u8 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: u8, value: u8) {
        (**self).write(reg, value)
    }
}
