//! Memory and I/O bus interface.

use thiserror::Error;

/// Fatal bus access failures.
///
/// Neither of these is recoverable at the instruction level: an
/// unmapped access means an address-decode bug (in the emulated
/// program or the memory map), and a ROM write means the program is
/// corrupting what it thinks is RAM. Execution must stop rather than
/// continue on silently-wrong state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No device owns the address.
    #[error("no device mapped at {addr:#08X}")]
    UnmappedAddress { addr: u32 },

    /// Write attempted on a read-only device.
    #[error("write to read-only address {addr:#08X}")]
    ReadOnlyViolation { addr: u32 },
}

pub type BusResult<T> = Result<T, BusError>;

/// Memory and I/O bus interface.
///
/// Implemented both by individual devices (RAM, ROM, the VIA) and by
/// the address decoder that routes between them. Addresses are 24-bit:
/// an 8-bit bank in bits 16-23 and a 16-bit offset below. Multi-byte
/// accesses are little-endian and do not wrap at the offset boundary —
/// the device simply sees `addr + 1`.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, addr: u32) -> BusResult<u8>;

    /// Write a byte to the given address.
    fn write(&mut self, addr: u32, value: u8) -> BusResult<()>;

    /// Read a little-endian word.
    fn read_word(&mut self, addr: u32) -> BusResult<u16> {
        let lo = self.read(addr)?;
        let hi = self.read(addr + 1)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Read a 24-bit value: little-endian word plus a bank byte above it.
    fn read_long(&mut self, addr: u32) -> BusResult<u32> {
        let word = self.read_word(addr)?;
        let bank = self.read(addr + 2)?;
        Ok(u32::from(bank) << 16 | u32::from(word))
    }

    /// Write a little-endian word.
    fn write_word(&mut self, addr: u32, value: u16) -> BusResult<()> {
        let [lo, hi] = value.to_le_bytes();
        self.write(addr, lo)?;
        self.write(addr + 1, hi)
    }

    /// Read a block of bytes (debugger memory view).
    fn read_slice(&mut self, addr: u32, len: usize) -> BusResult<Vec<u8>> {
        (0..len as u32).map(|i| self.read(addr + i)).collect()
    }

    /// Write a block of bytes (program load, debugger poke).
    fn write_slice(&mut self, addr: u32, data: &[u8]) -> BusResult<()> {
        for (i, &b) in data.iter().enumerate() {
            self.write(addr + i as u32, b)?;
        }
        Ok(())
    }

    /// Advance clock-sensitive peripherals by the cycle count one
    /// instruction just consumed. Called exactly once per CPU step,
    /// after the instruction has fully executed.
    fn phi2(&mut self, _cycles: u64) {}

    /// True while a peripheral is asserting its interrupt line.
    fn irq_pending(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat64k {
        mem: Vec<u8>,
    }

    impl Bus for Flat64k {
        fn read(&mut self, addr: u32) -> BusResult<u8> {
            Ok(self.mem.get(addr as usize).copied().unwrap_or(0))
        }

        fn write(&mut self, addr: u32, value: u8) -> BusResult<()> {
            if let Some(slot) = self.mem.get_mut(addr as usize) {
                *slot = value;
            }
            Ok(())
        }
    }

    #[test]
    fn word_and_long_are_little_endian() {
        let mut bus = Flat64k { mem: vec![0; 16] };
        bus.write_slice(0, &[0x34, 0x12, 0x7F]).unwrap();
        assert_eq!(bus.read_word(0).unwrap(), 0x1234);
        assert_eq!(bus.read_long(0).unwrap(), 0x7F_1234);
    }

    #[test]
    fn slice_round_trip() {
        let mut bus = Flat64k { mem: vec![0; 16] };
        bus.write_slice(4, &[1, 2, 3]).unwrap();
        assert_eq!(bus.read_slice(4, 3).unwrap(), vec![1, 2, 3]);
    }
}
