//! Interrupt vector abstraction

/// Interrupt service routine installed in the vector table
pub type Handler = fn();

/// Maskable interrupt vectors used by the runtime core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vector {
    Prt0 = 0x0A,
    Prt1 = 0x0C,
    Prt2 = 0x0E,
    Prt3 = 0x10,
    Prt4 = 0x12,
    Prt5 = 0x14,
}

impl Vector {
    /// Vector table offset
    pub const fn offset(self) -> u8 {
        self as u8
    }

    /// Vector of programmable reload timer `index`
    pub const fn prt(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Prt0),
            1 => Some(Self::Prt1),
            2 => Some(Self::Prt2),
            3 => Some(Self::Prt3),
            4 => Some(Self::Prt4),
            5 => Some(Self::Prt5),
            _ => None,
        }
    }
}

/// Interrupt vector table and global interrupt enable
pub trait VectorTable {
    /// Install `handler` at `vector`, returning the handler it replaces
    fn install(&mut self, vector: Vector, handler: Handler) -> Option<Handler>;

    /// Globally enable maskable interrupts (`EI`)
    fn enable_interrupts(&mut self);

    /// Globally disable maskable interrupts (`DI`)
    fn disable_interrupts(&mut self);
}

impl<V: VectorTable + ?Sized> VectorTable for &mut V {
    fn install(&mut self, vector: Vector, handler: Handler) -> Option<Handler> {
        (**self).install(vector, handler)
    }

    fn enable_interrupts(&mut self) {
        (**self).enable_interrupts()
    }

    fn disable_interrupts(&mut self) {
        (**self).disable_interrupts()
    }
}
