//! Address decoding for the single-board machine.

use emu_core::{Bus, BusError, BusResult};
use log::debug;
use mos_via_6522::Via6522;

use crate::ram::Ram;
use crate::rom::Rom;

/// RAM occupies the bottom of bank 0.
pub const RAM_START: u32 = 0x0000;
pub const RAM_END: u32 = 0xAFFF;

/// The VIA's 16 registers.
pub const VIA_START: u32 = 0xBF00;
pub const VIA_END: u32 = 0xBF0F;

/// ROM occupies the top 16 KiB, including the vectors.
pub const ROM_START: u32 = 0xC000;
pub const ROM_END: u32 = 0xFFFF;

/// Device owning one bank-0 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Ram,
    Rom,
    Via,
    Unmapped,
}

/// The machine's memory bus.
///
/// A flat 65 536-entry table maps every bank-0 address to its owning
/// device in O(1). Addresses outside bank 0 are unmapped; the 65C816's
/// long addressing modes can form them, but this board decodes only
/// the bottom bank.
pub struct SbcBus {
    pub ram: Ram,
    pub rom: Rom,
    pub via: Via6522,
    slots: Vec<Slot>,
}

impl SbcBus {
    #[must_use]
    pub fn new() -> Self {
        let mut bus = Self {
            ram: Ram::new(RAM_START, (RAM_END - RAM_START + 1) as usize),
            rom: Rom::new(ROM_START, Vec::new()),
            via: Via6522::new(),
            slots: Vec::new(),
        };
        bus.rebuild_slots();
        bus
    }

    /// Swap in a ROM image and rebuild the decode table.
    pub fn load_rom(&mut self, rom: Rom) {
        debug!("loading ROM: {} bytes at {ROM_START:#06X}", rom.len());
        self.rom = rom;
        self.rebuild_slots();
    }

    fn rebuild_slots(&mut self) {
        let mut slots = vec![Slot::Unmapped; 0x1_0000];
        for slot in &mut slots[RAM_START as usize..=RAM_END as usize] {
            *slot = Slot::Ram;
        }
        for slot in &mut slots[VIA_START as usize..=VIA_END as usize] {
            *slot = Slot::Via;
        }
        for slot in &mut slots[ROM_START as usize..=ROM_END as usize] {
            *slot = Slot::Rom;
        }
        self.slots = slots;
    }

    fn slot(&self, addr: u32) -> BusResult<Slot> {
        let slot = self
            .slots
            .get(addr as usize)
            .copied()
            .unwrap_or(Slot::Unmapped);
        match slot {
            Slot::Unmapped => Err(BusError::UnmappedAddress { addr }),
            owned => Ok(owned),
        }
    }
}

impl Default for SbcBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SbcBus {
    fn read(&mut self, addr: u32) -> BusResult<u8> {
        match self.slot(addr)? {
            Slot::Ram => self.ram.read(addr),
            Slot::Rom => self.rom.read(addr),
            Slot::Via => Ok(self.via.read((addr & 0x0F) as u8)),
            Slot::Unmapped => unreachable!(),
        }
    }

    fn write(&mut self, addr: u32, value: u8) -> BusResult<()> {
        match self.slot(addr)? {
            Slot::Ram => self.ram.write(addr, value),
            Slot::Rom => self.rom.write(addr, value),
            Slot::Via => {
                self.via.write((addr & 0x0F) as u8, value);
                Ok(())
            }
            Slot::Unmapped => unreachable!(),
        }
    }

    // Word accesses that fall wholly inside RAM go to the device so it
    // records them at word granularity; everything else composes bytes.

    fn read_word(&mut self, addr: u32) -> BusResult<u16> {
        if self.slot(addr)? == Slot::Ram && self.slot(addr + 1) == Ok(Slot::Ram) {
            return self.ram.read_word(addr);
        }
        let lo = self.read(addr)?;
        let hi = self.read(addr + 1)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn write_word(&mut self, addr: u32, value: u16) -> BusResult<()> {
        if self.slot(addr)? == Slot::Ram && self.slot(addr + 1) == Ok(Slot::Ram) {
            return self.ram.write_word(addr, value);
        }
        let [lo, hi] = value.to_le_bytes();
        self.write(addr, lo)?;
        self.write(addr + 1, hi)
    }

    fn phi2(&mut self, cycles: u64) {
        self.via.phi2(cycles);
    }

    fn irq_pending(&self) -> bool {
        self.via.irq_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ram_via_and_rom() {
        let mut bus = SbcBus::new();
        bus.load_rom(Rom::with_program(&[0xEA]));

        bus.write(0x1000, 0x55).unwrap();
        assert_eq!(bus.read(0x1000).unwrap(), 0x55);

        assert_eq!(bus.read(ROM_START).unwrap(), 0xEA);

        // IER reads with bit 7 set: confirms the VIA is decoded.
        assert_eq!(bus.read(0xBF0E).unwrap(), 0x80);
    }

    #[test]
    fn rom_write_surfaces_the_violation() {
        let mut bus = SbcBus::new();
        bus.load_rom(Rom::with_program(&[]));
        assert_eq!(
            bus.write(0xD000, 1).unwrap_err(),
            BusError::ReadOnlyViolation { addr: 0xD000 }
        );
    }

    #[test]
    fn gaps_and_other_banks_are_unmapped() {
        let mut bus = SbcBus::new();
        assert_eq!(
            bus.read(0xB000).unwrap_err(),
            BusError::UnmappedAddress { addr: 0xB000 }
        );
        assert_eq!(
            bus.read(0x01_0000).unwrap_err(),
            BusError::UnmappedAddress { addr: 0x01_0000 }
        );
        assert_eq!(
            bus.write(0xBF10, 0).unwrap_err(),
            BusError::UnmappedAddress { addr: 0xBF10 }
        );
    }

    #[test]
    fn via_registers_alias_on_the_low_nibble() {
        let mut bus = SbcBus::new();
        bus.write(0xBF0E, 0x80 | 0x40).unwrap(); // enable T1 interrupt
        assert_eq!(bus.read(0xBF0E).unwrap(), 0xC0);
    }

    #[test]
    fn irq_line_follows_the_via() {
        let mut bus = SbcBus::new();
        assert!(!bus.irq_pending());
        bus.write(0xBF0E, 0x80 | 0x40).unwrap(); // IER: T1
        bus.write(0xBF04, 2).unwrap(); // T1 latch low
        bus.write(0xBF05, 0).unwrap(); // start
        bus.phi2(4); // counts through underflow
        assert!(bus.irq_pending());
    }
}
