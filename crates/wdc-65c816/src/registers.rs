//! CPU register model.
//!
//! Every register is one 16-bit cell with a byte view and a word view.
//! A, X and Y recompute Zero/Negative on each write; instead of the
//! register reaching into the status register, the write returns an
//! [`NzDelta`] that the CPU applies where the instruction calls for it.

use std::fmt;

/// N/Z recomputation produced by a register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NzDelta {
    pub n: bool,
    pub z: bool,
}

impl NzDelta {
    #[must_use]
    pub const fn of_byte(b: u8) -> Self {
        Self {
            n: b & 0x80 != 0,
            z: b == 0,
        }
    }

    #[must_use]
    pub const fn of_word(w: u16) -> Self {
        Self {
            n: w & 0x8000 != 0,
            z: w == 0,
        }
    }
}

/// Current display width of a register.
///
/// REP/SEP/XCE switch A and the index registers between 8 and 16 bit;
/// the width only affects diagnostic rendering, not storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Eight,
    Sixteen,
}

/// A CPU register.
///
/// `set_byte` stores the byte and clears the high byte so the word view
/// stays consistent; `set_word` stores the word and the byte view is
/// its low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    value: u16,
    initial: u16,
    width: Width,
}

impl Register {
    #[must_use]
    pub const fn new(initial: u16) -> Self {
        Self {
            value: initial,
            initial,
            width: Width::Eight,
        }
    }

    #[must_use]
    pub const fn with_width(initial: u16, width: Width) -> Self {
        Self {
            value: initial,
            initial,
            width,
        }
    }

    #[must_use]
    pub const fn byte(&self) -> u8 {
        self.value as u8
    }

    #[must_use]
    pub const fn word(&self) -> u16 {
        self.value
    }

    pub fn set_byte(&mut self, b: u8) -> NzDelta {
        self.value = u16::from(b);
        NzDelta::of_byte(b)
    }

    pub fn set_word(&mut self, w: u16) -> NzDelta {
        self.value = w;
        NzDelta::of_word(w)
    }

    /// Restore the configured initial value.
    pub fn reset(&mut self) {
        self.value = self.initial;
    }

    #[must_use]
    pub const fn width(&self) -> Width {
        self.width
    }

    pub fn set_width(&mut self, width: Width) {
        self.width = width;
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width {
            Width::Eight => write!(f, "{:02X}", self.byte()),
            Width::Sixteen => write!(f, "{:04X}", self.word()),
        }
    }
}

/// The full 65C816 register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Program counter. Starts at the reset vector address.
    pub pc: Register,
    /// Program bank register.
    pub pbr: Register,
    /// Data bank register.
    pub dbr: Register,
    /// Direct page register.
    pub dp: Register,
    /// Accumulator.
    pub a: Register,
    /// X index register.
    pub x: Register,
    /// Y index register.
    pub y: Register,
    /// Stack pointer (page 1 in emulation mode).
    pub s: Register,
}

impl Registers {
    #[must_use]
    pub const fn new(stack_init: u16) -> Self {
        Self {
            pc: Register::with_width(0xFFFC, Width::Sixteen),
            pbr: Register::new(0),
            dbr: Register::new(0),
            dp: Register::with_width(0, Width::Sixteen),
            a: Register::new(0),
            x: Register::new(0),
            y: Register::new(0),
            s: Register::with_width(stack_init, Width::Sixteen),
        }
    }

    /// Restore all registers to their initial values and 8-bit widths.
    pub fn reset(&mut self) {
        self.pc.reset();
        self.pbr.reset();
        self.dbr.reset();
        self.dp.reset();
        self.a.reset();
        self.x.reset();
        self.y.reset();
        self.s.reset();
        self.a.set_width(Width::Eight);
        self.x.set_width(Width::Eight);
        self.y.set_width(Width::Eight);
    }
}
