//! Programmable reload timer abstraction

use crate::error::{HalError, HalResult};
use crate::io::IoBus;

/// Control register of timer 0; timers 1..=5 follow at 3-byte strides.
const TMR0_CTL: u8 = 0x80;
/// Reload register (write) / data register (read), low byte
const RR_L_OFFSET: u8 = 1;
/// Reload register (write) / data register (read), high byte
const RR_H_OFFSET: u8 = 2;
/// Input source select, two bits per timer (00 = system clock)
const TMR_ISS: u8 = 0x92;

/// Number of programmable reload timers on the chip
pub const TIMER_COUNT: u8 = 6;

/// Bit masks for the timer control register
pub mod ctl {
    /// Enable timer
    pub const PRT_EN: u8 = 1 << 0;
    /// Force a reload from the reload register when written
    pub const RST_EN: u8 = 1 << 1;
    /// Clock divider field (bits 2..=3)
    pub const CLKDIV_MASK: u8 = 0b11 << 2;
    /// Continuous mode (single pass when clear)
    pub const MODE_CONT: u8 = 1 << 4;
    /// Interrupt enable
    pub const IRQ_EN: u8 = 1 << 6;
    /// End of count reached; cleared by reading the register
    pub const PRT_IRQ: u8 = 1 << 7;
}

/// System clock prescaler in front of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivider {
    Div4,
    Div16,
    Div64,
    Div256,
}

impl ClockDivider {
    /// Division factor
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div4 => 4,
            Self::Div16 => 16,
            Self::Div64 => 64,
            Self::Div256 => 256,
        }
    }

    /// Encoding in the control register
    pub const fn bits(self) -> u8 {
        match self {
            Self::Div4 => 0 << 2,
            Self::Div16 => 1 << 2,
            Self::Div64 => 2 << 2,
            Self::Div256 => 3 << 2,
        }
    }
}

/// Timer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    /// Count down once and stop; restarted with [`CountdownTimer::rearm`]
    OneShot,
    /// Reload automatically at the end of every count
    Periodic,
}

/// Down-counting hardware timer with an end-of-count interrupt
pub trait CountdownTimer {
    /// Load `reload`, select prescaler and mode, enable the interrupt and start counting
    fn start(&mut self, reload: u16, divider: ClockDivider, mode: TimerMode) -> HalResult<()>;

    /// Restart the count from `reload`, keeping prescaler and mode
    fn rearm(&mut self, reload: u16) -> HalResult<()>;

    /// Stop timer
    fn stop(&mut self);

    /// Whether the timer has been started and not stopped since
    fn is_running(&mut self) -> bool;

    /// Instantaneous down-counter value
    fn counter(&mut self) -> u16;

    /// Clear the pending end-of-count condition, returning whether one was pending
    fn acknowledge(&mut self) -> bool;
}

/// Register-level programmable reload timer on an [`IoBus`]
pub struct PrtTimer<B> {
    bus: B,
    base: u8,
    index: u8,
    /// Last value written to the control register (reading it has side effects)
    ctl: u8,
}

impl<B: IoBus> PrtTimer<B> {
    /// Bind timer `index` (0..6)
    pub fn new(bus: B, index: u8) -> HalResult<Self> {
        if index >= TIMER_COUNT {
            return Err(HalError::InvalidTimer);
        }
        Ok(Self {
            bus,
            base: TMR0_CTL + index * 3,
            index,
            ctl: 0,
        })
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Release the underlying bus
    pub fn free(self) -> B {
        self.bus
    }

    fn write_reload(&mut self, reload: u16) {
        let [low, high] = reload.to_le_bytes();
        self.bus.write(self.base + RR_L_OFFSET, low);
        self.bus.write(self.base + RR_H_OFFSET, high);
    }

    fn write_ctl(&mut self, value: u8) {
        self.ctl = value & !ctl::RST_EN;
        self.bus.write(self.base, value);
    }
}

impl<B: IoBus> CountdownTimer for PrtTimer<B> {
    fn start(&mut self, reload: u16, divider: ClockDivider, mode: TimerMode) -> HalResult<()> {
        if reload == 0 {
            return Err(HalError::ZeroReload);
        }
        self.write_ctl(0);
        self.write_reload(reload);
        let source_bits = 0b11 << (self.index * 2);
        self.bus.modify(TMR_ISS, source_bits, 0);

        let mode_bits = match mode {
            TimerMode::OneShot => 0,
            TimerMode::Periodic => ctl::MODE_CONT,
        };
        self.write_ctl(ctl::RST_EN | divider.bits() | mode_bits | ctl::IRQ_EN | ctl::PRT_EN);
        Ok(())
    }

    fn rearm(&mut self, reload: u16) -> HalResult<()> {
        if reload == 0 {
            return Err(HalError::ZeroReload);
        }
        if self.ctl & ctl::IRQ_EN == 0 {
            return Err(HalError::NotStarted);
        }
        self.write_reload(reload);
        self.write_ctl(self.ctl | ctl::RST_EN | ctl::PRT_EN);
        Ok(())
    }

    fn stop(&mut self) {
        self.write_ctl(0);
    }

    fn is_running(&mut self) -> bool {
        self.ctl & ctl::PRT_EN != 0
    }

    fn counter(&mut self) -> u16 {
        // Low byte first: reading it latches the high byte
        let low = self.bus.read(self.base + RR_L_OFFSET);
        let high = self.bus.read(self.base + RR_H_OFFSET);
        u16::from_le_bytes([low, high])
    }

    fn acknowledge(&mut self) -> bool {
        self.bus.read(self.base) & ctl::PRT_IRQ != 0
    }
}
