//! RAM with last-access tracking for the debugger's memory view.

use emu_core::{Bus, BusResult};

/// Width of the most recent access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Word,
}

/// Direction of the most recent access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// The most recent RAM access, recorded per system step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub addr: u32,
    pub size: AccessSize,
    pub kind: AccessKind,
}

/// Flat RAM over a configured address range.
///
/// Accesses outside the backing range are tolerated rather than
/// faulted (reads return 0, writes are dropped) so the device can be
/// used standalone as a minimal bus in tests. Address decoding errors
/// are the bus's job, not the device's.
pub struct Ram {
    base: u32,
    data: Vec<u8>,
    last_access: Option<Access>,
}

impl Ram {
    #[must_use]
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            data: vec![0; size],
            last_access: None,
        }
    }

    /// The most recent access since `clear_access`, if any.
    #[must_use]
    pub fn last_access(&self) -> Option<Access> {
        self.last_access
    }

    /// Forget the recorded access. The system calls this once per step
    /// so the record always describes the latest instruction only.
    pub fn clear_access(&mut self) {
        self.last_access = None;
    }

    fn index(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(self.base)? as usize;
        (offset < self.data.len()).then_some(offset)
    }

    fn peek(&self, addr: u32) -> u8 {
        self.index(addr)
            .map_or(0, |i| self.data[i])
    }

    fn poke(&mut self, addr: u32, value: u8) {
        if let Some(i) = self.index(addr) {
            self.data[i] = value;
        }
    }

    fn record(&mut self, addr: u32, size: AccessSize, kind: AccessKind) {
        self.last_access = Some(Access { addr, size, kind });
    }
}

impl Bus for Ram {
    fn read(&mut self, addr: u32) -> BusResult<u8> {
        self.record(addr, AccessSize::Byte, AccessKind::Read);
        Ok(self.peek(addr))
    }

    fn write(&mut self, addr: u32, value: u8) -> BusResult<()> {
        self.record(addr, AccessSize::Byte, AccessKind::Write);
        self.poke(addr, value);
        Ok(())
    }

    // Word overrides keep the access record at word granularity
    // instead of leaving a byte record at addr + 1.

    fn read_word(&mut self, addr: u32) -> BusResult<u16> {
        let value = u16::from_le_bytes([self.peek(addr), self.peek(addr + 1)]);
        self.record(addr, AccessSize::Word, AccessKind::Read);
        Ok(value)
    }

    fn write_word(&mut self, addr: u32, value: u16) -> BusResult<()> {
        let [lo, hi] = value.to_le_bytes();
        self.poke(addr, lo);
        self.poke(addr + 1, hi);
        self.record(addr, AccessSize::Word, AccessKind::Write);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_round_trip() {
        let mut ram = Ram::new(0, 0x100);
        ram.write(0x10, 0xAB).unwrap();
        assert_eq!(ram.read(0x10).unwrap(), 0xAB);
    }

    #[test]
    fn out_of_range_reads_zero_and_writes_drop() {
        let mut ram = Ram::new(0x1000, 0x100);
        assert_eq!(ram.read(0x0FFF).unwrap(), 0);
        ram.write(0x2000, 0xFF).unwrap();
        assert_eq!(ram.read(0x2000).unwrap(), 0);
    }

    #[test]
    fn access_tracking_has_word_granularity() {
        let mut ram = Ram::new(0, 0x100);
        ram.write_word(0x20, 0x1234).unwrap();
        assert_eq!(
            ram.last_access(),
            Some(Access {
                addr: 0x20,
                size: AccessSize::Word,
                kind: AccessKind::Write
            })
        );
        ram.clear_access();
        assert_eq!(ram.last_access(), None);

        let _ = ram.read(0x20).unwrap();
        assert_eq!(
            ram.last_access(),
            Some(Access {
                addr: 0x20,
                size: AccessSize::Byte,
                kind: AccessKind::Read
            })
        );
    }
}
