//! GPIO (General Purpose Input/Output) abstraction

use crate::error::{HalError, HalResult};
use crate::io::IoBus;

/// Number of pins on one GPIO port
pub const PINS_PER_PORT: u8 = 8;

/// Data register of port B; C and D follow at 4-byte strides.
const PB_DR: u8 = 0x9A;
const DDR_OFFSET: u8 = 1;
const ALT1_OFFSET: u8 = 2;
const ALT2_OFFSET: u8 = 3;

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Low level (0V)
    Low,
    /// High level (VCC)
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Controllable GPIO ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    B = 0,
    C = 1,
    D = 2,
}

impl Port {
    fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Port::B),
            1 => Some(Port::C),
            2 => Some(Port::D),
            _ => None,
        }
    }

    /// Data register address for this port
    pub const fn data_register(self) -> u8 {
        PB_DR + (self as u8) * 4
    }
}

/// Board pin number packing a port and a pin index as `port << 3 | pin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    /// Create a pin number from its port and index within the port
    pub const fn new(port: Port, index: u8) -> Self {
        Pin(((port as u8) << 3) | (index & 0x07))
    }

    /// Interpret a raw board pin number
    pub const fn from_raw(raw: u8) -> Self {
        Pin(raw)
    }

    /// Get the raw board pin number
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Port this pin belongs to, `None` for numbers past port D
    pub fn port(self) -> Option<Port> {
        Port::from_index(self.0 >> 3)
    }

    /// Pin index within its port (0..8)
    pub const fn index(self) -> u8 {
        self.0 & 0x07
    }
}

/// One 8-bit output port
pub trait OutputPort {
    /// Put `pin` into push-pull output mode
    fn configure_output(&mut self, pin: u8) -> HalResult<()>;

    /// Drive `pin` to `level`
    fn set_output(&mut self, pin: u8, level: Level) -> HalResult<()>;

    /// Update the whole data register: `DR = (DR & !clear) | set`
    fn modify(&mut self, set: u8, clear: u8);

    /// Current data register value
    fn output(&mut self) -> u8;
}

/// Register-level output port on an [`IoBus`]
pub struct GpioPort<B> {
    bus: B,
    port: Port,
}

impl<B: IoBus> GpioPort<B> {
    pub fn new(bus: B, port: Port) -> Self {
        Self { bus, port }
    }

    pub fn port(&self) -> Port {
        self.port
    }

    /// Release the underlying bus
    pub fn free(self) -> B {
        self.bus
    }

    fn mask(pin: u8) -> HalResult<u8> {
        if pin >= PINS_PER_PORT {
            return Err(HalError::InvalidPin);
        }
        Ok(1 << pin)
    }
}

impl<B: IoBus> OutputPort for GpioPort<B> {
    fn configure_output(&mut self, pin: u8) -> HalResult<()> {
        let mask = Self::mask(pin)?;
        let dr = self.port.data_register();
        // Output push-pull: DDR, ALT1 and ALT2 bits all cleared
        self.bus.modify(dr + ALT1_OFFSET, mask, 0);
        self.bus.modify(dr + ALT2_OFFSET, mask, 0);
        self.bus.modify(dr + DDR_OFFSET, mask, 0);
        Ok(())
    }

    fn set_output(&mut self, pin: u8, level: Level) -> HalResult<()> {
        let mask = Self::mask(pin)?;
        let dr = self.port.data_register();
        match level {
            Level::High => self.bus.modify(dr, 0, mask),
            Level::Low => self.bus.modify(dr, mask, 0),
        }
        Ok(())
    }

    fn modify(&mut self, set: u8, clear: u8) {
        let dr = self.port.data_register();
        self.bus.modify(dr, clear, set);
    }

    fn output(&mut self) -> u8 {
        self.bus.read(self.port.data_register())
    }
}
