//! Read-only memory device.

use emu_core::{Bus, BusError, BusResult};

use crate::bus::ROM_START;

/// ROM image mapped at a base address.
///
/// Every write is rejected with `ReadOnlyViolation`, leaving the
/// faulting instruction's state to the caller. Reads outside the image
/// return 0, matching the RAM device's minimal-bus behavior.
pub struct Rom {
    base: u32,
    data: Vec<u8>,
}

impl Rom {
    #[must_use]
    pub fn new(base: u32, data: Vec<u8>) -> Self {
        Self { base, data }
    }

    /// Build a 16 KiB ROM image at `ROM_START` containing `program`,
    /// with the reset vector pointing at the program's first byte.
    ///
    /// Convenience for tests and small standalone programs.
    #[must_use]
    pub fn with_program(program: &[u8]) -> Self {
        let mut data = vec![0; 0x4000];
        let len = program.len().min(data.len());
        data[..len].copy_from_slice(&program[..len]);
        // Reset vector at 0xFFFC -> image offset 0x3FFC.
        data[0x3FFC] = (ROM_START & 0xFF) as u8;
        data[0x3FFD] = (ROM_START >> 8) as u8;
        Self::new(ROM_START, data)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn index(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(self.base)? as usize;
        (offset < self.data.len()).then_some(offset)
    }
}

impl Bus for Rom {
    fn read(&mut self, addr: u32) -> BusResult<u8> {
        Ok(self.index(addr).map_or(0, |i| self.data[i]))
    }

    fn write(&mut self, addr: u32, _value: u8) -> BusResult<()> {
        Err(BusError::ReadOnlyViolation { addr })
    }
}
