//! Addressing-mode resolution.
//!
//! Each resolver consumes its operand bytes, adds its own cycle cost
//! and returns the 24-bit effective address. Immediate resolvers
//! return the operand's own location and advance PC past it. Direct
//! page and stack addressing stay in bank 0 with 16-bit offset wrap;
//! indexed absolute and long modes add the index across the full
//! 24-bit address.

use emu_core::Bus;

use crate::addr24;
use crate::cpu::{Cpu, CpuError};

const ADDR_MASK: u32 = 0x00FF_FFFF;

impl Cpu {
    /// Location of the next operand byte, PBR:PC.
    fn operand_addr(&self) -> u32 {
        addr24(self.regs.pbr.byte(), self.regs.pc.word())
    }

    fn dp_offset(&self, offset: u32) -> u32 {
        addr24(0, (u32::from(self.regs.dp.word()) + offset) as u16)
    }

    /// Absolute - a
    pub(crate) fn am_absolute<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ptr = bus.read_word(self.operand_addr())?;
        self.advance_pc(2);
        self.cycles += 2;
        Ok(addr24(self.regs.dbr.byte(), ptr))
    }

    /// Absolute indexed X - a,X
    pub(crate) fn am_absolute_x<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ptr = bus.read_word(self.operand_addr())?;
        self.advance_pc(2);
        self.cycles += 2;
        Ok((addr24(self.regs.dbr.byte(), ptr) + u32::from(self.regs.x.word())) & ADDR_MASK)
    }

    /// Absolute indexed Y - a,Y
    pub(crate) fn am_absolute_y<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ptr = bus.read_word(self.operand_addr())?;
        self.advance_pc(2);
        self.cycles += 2;
        Ok((addr24(self.regs.dbr.byte(), ptr) + u32::from(self.regs.y.word())) & ADDR_MASK)
    }

    /// Absolute indirect - (a)
    pub(crate) fn am_absolute_indirect<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ptr = bus.read_word(self.operand_addr())?;
        self.advance_pc(2);
        self.cycles += 4;
        let target = bus.read_word(addr24(self.regs.pbr.byte(), ptr))?;
        Ok(addr24(0, target))
    }

    /// Absolute indexed indirect - (a,X)
    pub(crate) fn am_absolute_x_indirect<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ptr = bus.read_word(self.operand_addr())?;
        self.advance_pc(2);
        self.cycles += 4;
        let ptr = (addr24(0, ptr) + u32::from(self.regs.x.word())) & ADDR_MASK;
        let target = bus.read_word(ptr)?;
        Ok(addr24(0, target))
    }

    /// Absolute indirect long - [a]
    pub(crate) fn am_absolute_indirect_long<B: Bus>(
        &mut self,
        bus: &mut B,
    ) -> Result<u32, CpuError> {
        let ptr = bus.read_word(self.operand_addr())?;
        self.advance_pc(2);
        self.cycles += 5;
        Ok(bus.read_long(addr24(0, ptr))?)
    }

    /// Absolute long - >a
    pub(crate) fn am_absolute_long<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ea = bus.read_long(self.operand_addr())?;
        self.advance_pc(3);
        self.cycles += 3;
        Ok(ea)
    }

    /// Absolute long indexed - >a,X
    pub(crate) fn am_absolute_long_x<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let ea = bus.read_long(self.operand_addr())?;
        self.advance_pc(3);
        self.cycles += 3;
        Ok((ea + u32::from(self.regs.x.word())) & ADDR_MASK)
    }

    /// Direct page - d
    pub(crate) fn am_direct<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 1;
        Ok(self.dp_offset(u32::from(offset)))
    }

    /// Direct page indexed X - d,X
    pub(crate) fn am_direct_x<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = u32::from(bus.read(self.operand_addr())?) + u32::from(self.regs.x.word());
        self.advance_pc(1);
        self.cycles += 1;
        Ok(self.dp_offset(offset))
    }

    /// Direct page indexed Y - d,Y
    pub(crate) fn am_direct_y<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = u32::from(bus.read(self.operand_addr())?) + u32::from(self.regs.y.word());
        self.advance_pc(1);
        self.cycles += 1;
        Ok(self.dp_offset(offset))
    }

    /// Direct page indirect - (d)
    pub(crate) fn am_direct_indirect<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 3;
        let ptr = bus.read_word(self.dp_offset(u32::from(offset)))?;
        Ok(addr24(self.regs.dbr.byte(), ptr))
    }

    /// Direct page indexed indirect X - (d,X)
    pub(crate) fn am_direct_x_indirect<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = u32::from(bus.read(self.operand_addr())?) + u32::from(self.regs.x.word());
        self.advance_pc(1);
        self.cycles += 3;
        let ptr = bus.read_word(self.dp_offset(offset))?;
        Ok(addr24(self.regs.dbr.byte(), ptr))
    }

    /// Direct page indirect indexed Y - (d),Y
    pub(crate) fn am_direct_indirect_y<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 3;
        let ptr = bus.read_word(self.dp_offset(u32::from(offset)))?;
        Ok((addr24(self.regs.dbr.byte(), ptr) + u32::from(self.regs.y.word())) & ADDR_MASK)
    }

    /// Direct page indirect long - [d]
    pub(crate) fn am_direct_indirect_long<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let offset = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 4;
        Ok(bus.read_long(self.dp_offset(u32::from(offset)))?)
    }

    /// Direct page indirect long indexed - [d],Y
    pub(crate) fn am_direct_indirect_long_y<B: Bus>(
        &mut self,
        bus: &mut B,
    ) -> Result<u32, CpuError> {
        let offset = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 4;
        let base = bus.read_long(self.dp_offset(u32::from(offset)))?;
        Ok((base + u32::from(self.regs.y.word())) & ADDR_MASK)
    }

    /// Immediate byte (REP/SEP mask, BRK/COP signature).
    pub(crate) fn am_immediate_byte(&mut self) -> u32 {
        let ea = self.operand_addr();
        self.advance_pc(1);
        ea
    }

    /// Immediate word (PEA, MVN/MVP bank pair).
    pub(crate) fn am_immediate_word(&mut self) -> u32 {
        let ea = self.operand_addr();
        self.advance_pc(2);
        self.cycles += 1;
        ea
    }

    /// Immediate sized by the accumulator width.
    pub(crate) fn am_immediate_m(&mut self) -> u32 {
        let ea = self.operand_addr();
        let size: u16 = if self.a_is_byte() { 1 } else { 2 };
        self.advance_pc(size);
        self.cycles += u64::from(size) - 1;
        ea
    }

    /// Immediate sized by the index width.
    pub(crate) fn am_immediate_x(&mut self) -> u32 {
        let ea = self.operand_addr();
        let size: u16 = if self.index_is_byte() { 1 } else { 2 };
        self.advance_pc(size);
        self.cycles += u64::from(size) - 1;
        ea
    }

    /// Relative - 8-bit signed branch target.
    pub(crate) fn am_relative<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let disp = bus.read(self.operand_addr())? as i8;
        self.advance_pc(1);
        self.cycles += 1;
        let target = self.regs.pc.word().wrapping_add_signed(i16::from(disp));
        Ok(addr24(self.regs.pbr.byte(), target))
    }

    /// Long relative - 16-bit signed target (BRL, PER).
    pub(crate) fn am_relative_long<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let disp = bus.read_word(self.operand_addr())? as i16;
        self.advance_pc(2);
        self.cycles += 2;
        let target = self.regs.pc.word().wrapping_add_signed(disp);
        Ok(addr24(self.regs.pbr.byte(), target))
    }

    fn stack_offset(&self, disp: u8) -> u32 {
        if self.e {
            // Page 1 fixed, displacement wraps within the low byte.
            let low = self.regs.s.byte().wrapping_add(disp);
            let high = (self.regs.s.word() >> 8) as u8;
            addr24(0, u16::from_le_bytes([low, high]))
        } else {
            addr24(0, self.regs.s.word().wrapping_add(u16::from(disp)))
        }
    }

    /// Stack relative - d,S
    pub(crate) fn am_stack_relative<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let disp = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 1;
        Ok(self.stack_offset(disp))
    }

    /// Stack relative indirect indexed Y - (d,S),Y
    pub(crate) fn am_stack_relative_indirect_y<B: Bus>(
        &mut self,
        bus: &mut B,
    ) -> Result<u32, CpuError> {
        let disp = bus.read(self.operand_addr())?;
        self.advance_pc(1);
        self.cycles += 3;
        let ptr = bus.read_word(self.stack_offset(disp))?;
        Ok(addr24(
            self.regs.dbr.byte(),
            ptr.wrapping_add(self.regs.y.word()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::RESET_VECTOR;
    use crate::test_bus::TestBus;
    use crate::Cpu;

    fn boot(program: &[u8]) -> (Cpu, TestBus) {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        bus.load(0xC000, program);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        (cpu, bus)
    }

    #[test]
    fn direct_page_wraps_at_offset_boundary() {
        let (mut cpu, mut bus) = boot(&[]);
        cpu.regs.dp.set_word(0xFFF0);
        bus.load(0xC000, &[0x20]); // displacement byte
        let ea = cpu.am_direct(&mut bus).unwrap();
        // 0xFFF0 + 0x20 wraps within bank 0.
        assert_eq!(ea, 0x0000_0010);
    }

    #[test]
    fn absolute_indexing_can_carry_into_the_bank() {
        let (mut cpu, mut bus) = boot(&[0xFF, 0xFF]);
        cpu.regs.x.set_word(0x0002);
        let ea = cpu.am_absolute_x(&mut bus).unwrap();
        assert_eq!(ea, 0x0001_0001);
    }

    #[test]
    fn immediate_width_follows_the_m_flag() {
        let (mut cpu, _bus) = boot(&[0x11, 0x22]);
        let pc0 = cpu.regs.pc.word();
        cpu.am_immediate_m();
        assert_eq!(cpu.regs.pc.word(), pc0 + 1);

        cpu.e = false;
        cpu.p.clear(crate::status::M);
        let pc1 = cpu.regs.pc.word();
        let cycles = cpu.cycles;
        cpu.am_immediate_m();
        assert_eq!(cpu.regs.pc.word(), pc1 + 2);
        assert_eq!(cpu.cycles, cycles + 1);
    }

    #[test]
    fn relative_target_is_signed() {
        let (mut cpu, mut bus) = boot(&[0xFE]); // -2
        let ea = cpu.am_relative(&mut bus).unwrap();
        // PC advanced past the displacement byte to 0xC001, minus 2.
        assert_eq!(ea, 0x0000_BFFF);
    }

    #[test]
    fn long_pointer_modes_read_bank_byte() {
        let (mut cpu, mut bus) = boot(&[0x80]);
        cpu.regs.dp.set_word(0x0000);
        bus.load(0x0080, &[0x34, 0x12, 0x05]); // pointer 0x05:1234
        cpu.regs.y.set_word(0x0001);
        let ea = cpu.am_direct_indirect_long_y(&mut bus).unwrap();
        assert_eq!(ea, 0x0005_1235);
    }

    #[test]
    fn stack_relative_clamps_to_page_one_in_emulation() {
        let (mut cpu, mut bus) = boot(&[0x10]);
        cpu.regs.s.set_word(0x01F8);
        let ea = cpu.am_stack_relative(&mut bus).unwrap();
        // 0xF8 + 0x10 wraps in the low byte, page stays 0x01.
        assert_eq!(ea, 0x0000_0108);
    }
}
