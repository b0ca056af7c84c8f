//! 65C816 processor status register (P).

use crate::registers::NzDelta;

/// Carry flag - set if operation resulted in carry/borrow.
pub const C: u8 = 0x01;

/// Zero flag - set if result is zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ interrupts are ignored.
pub const I: u8 = 0x04;

/// Decimal mode - selects BCD arithmetic for ADC/SBC.
pub const D: u8 = 0x08;

/// Index register width - when set, X and Y are 8-bit.
/// In emulation mode this bit position is the Break flag.
pub const X: u8 = 0x10;

/// Accumulator width - when set, A is 8-bit.
pub const M: u8 = 0x20;

/// Overflow flag - set if signed arithmetic overflowed.
pub const V: u8 = 0x40;

/// Negative flag - set if result has its top bit set.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Status after reset: 8-bit widths, interrupts disabled, zero set.
    #[must_use]
    pub const fn reset() -> Self {
        Self(M | X | I | Z)
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set a flag.
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clear a flag.
    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from an 8-bit result.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }

    /// Update N and Z from a 16-bit result.
    pub fn update_nz_word(&mut self, value: u16) {
        self.set_if(N, value & 0x8000 != 0);
        self.set_if(Z, value == 0);
    }

    /// Apply the N/Z delta produced by a register write.
    pub fn apply(&mut self, delta: NzDelta) {
        self.set_if(N, delta.n);
        self.set_if(Z, delta.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let p = Status::reset();
        assert!(p.is_set(M));
        assert!(p.is_set(X));
        assert!(p.is_set(I));
        assert!(p.is_set(Z));
        assert!(!p.is_set(C));
        assert!(!p.is_set(N));
    }

    #[test]
    fn update_nz_byte_and_word() {
        let mut p = Status::default();
        p.update_nz(0x00);
        assert!(p.is_set(Z) && !p.is_set(N));
        p.update_nz(0xEF);
        assert!(!p.is_set(Z) && p.is_set(N));
        p.update_nz_word(0x8000);
        assert!(!p.is_set(Z) && p.is_set(N));
        p.update_nz_word(0x0000);
        assert!(p.is_set(Z) && !p.is_set(N));
    }
}
