//! WDC 65C816 CPU emulation.
//!
//! The 65C816 is the 16-bit extension of the 6502: a 24-bit address
//! space split into 64 KiB banks, an emulation mode that behaves like a
//! 6502, and width flags (M for the accumulator, X for the index
//! registers) that switch A, X and Y between 8 and 16 bit in native
//! mode.
//!
//! [`Cpu::step`] executes one whole instruction per call against any
//! [`emu_core::Bus`] implementation, and reports the consumed cycle
//! delta to the bus so peripherals can advance in lockstep.

mod cpu;
mod dispatch;
mod modes;
mod ops;
mod registers;
pub mod status;

pub use cpu::{CallFrame, Cpu, CpuError, RESET_VECTOR};
pub use registers::{NzDelta, Register, Registers, Width};
pub use status::Status;

/// Opcodes an embedder needs to recognise for stepping policy
/// (step-over and step-out track calls and returns).
pub mod opcodes {
    /// JSR absolute.
    pub const JSR_ABS: u8 = 0x20;
    /// JSL absolute long.
    pub const JSL: u8 = 0x22;
    /// JSR absolute indexed indirect.
    pub const JSR_ABS_X_IND: u8 = 0xFC;
    /// RTS.
    pub const RTS: u8 = 0x60;
    /// RTL.
    pub const RTL: u8 = 0x6B;
    /// WAI - wait for interrupt.
    pub const WAI: u8 = 0xCB;
    /// STP - stop the processor.
    pub const STP: u8 = 0xDB;
}

/// Compose a 24-bit address from a bank byte and a 16-bit offset.
///
/// Bank and offset wrap independently: incrementing an offset past
/// 0xFFFF never changes the bank.
#[must_use]
pub const fn addr24(bank: u8, offset: u16) -> u32 {
    (bank as u32) << 16 | offset as u32
}

#[cfg(test)]
pub(crate) mod test_bus {
    use emu_core::{Bus, BusResult};

    /// Flat memory covering banks 0 and 1, plus probes for phi2 and
    /// the interrupt line.
    pub struct TestBus {
        pub mem: Vec<u8>,
        pub irq: bool,
        pub phi2_calls: Vec<u64>,
    }

    impl TestBus {
        pub fn new() -> Self {
            Self {
                mem: vec![0; 0x2_0000],
                irq: false,
                phi2_calls: Vec::new(),
            }
        }

        pub fn load(&mut self, addr: u32, bytes: &[u8]) {
            let start = addr as usize;
            self.mem[start..start + bytes.len()].copy_from_slice(bytes);
        }

        pub fn peek(&self, addr: u32) -> u8 {
            self.mem.get(addr as usize).copied().unwrap_or(0)
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, addr: u32) -> BusResult<u8> {
            Ok(self.peek(addr))
        }

        fn write(&mut self, addr: u32, value: u8) -> BusResult<()> {
            if let Some(slot) = self.mem.get_mut(addr as usize) {
                *slot = value;
            }
            Ok(())
        }

        fn phi2(&mut self, cycles: u64) {
            self.phi2_calls.push(cycles);
        }

        fn irq_pending(&self) -> bool {
            self.irq
        }
    }
}
