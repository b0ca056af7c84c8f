//! Operation semantics.
//!
//! One handler per mnemonic. Handlers receive the effective address an
//! addressing-mode resolver produced and add the operation's own cycle
//! cost on top of the resolver's. Width checks happen at the top of
//! every A/X/Y operation: 8-bit if emulation mode or the relevant
//! width flag is set.

use emu_core::Bus;

use crate::addr24;
use crate::cpu::{Cpu, CpuError};
use crate::registers::Width;
use crate::status::{C, D, I, M, N, V, X, Z};

impl Cpu {
    // --- Loads and stores ---

    pub(crate) fn op_lda<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let v = bus.read(ea)?;
            let d = self.regs.a.set_byte(v);
            self.p.apply(d);
            self.cycles += 2;
        } else {
            let v = bus.read_word(ea)?;
            let d = self.regs.a.set_word(v);
            self.p.apply(d);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_ldx<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.index_is_byte() {
            let v = bus.read(ea)?;
            let d = self.regs.x.set_byte(v);
            self.p.apply(d);
            self.cycles += 2;
        } else {
            let v = bus.read_word(ea)?;
            let d = self.regs.x.set_word(v);
            self.p.apply(d);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_ldy<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.index_is_byte() {
            let v = bus.read(ea)?;
            let d = self.regs.y.set_byte(v);
            self.p.apply(d);
            self.cycles += 2;
        } else {
            let v = bus.read_word(ea)?;
            let d = self.regs.y.set_word(v);
            self.p.apply(d);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_sta<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            bus.write(ea, self.regs.a.byte())?;
            self.cycles += 2;
        } else {
            bus.write_word(ea, self.regs.a.word())?;
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_stx<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.index_is_byte() {
            bus.write(ea, self.regs.x.byte())?;
            self.cycles += 2;
        } else {
            bus.write_word(ea, self.regs.x.word())?;
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_sty<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.index_is_byte() {
            bus.write(ea, self.regs.y.byte())?;
            self.cycles += 2;
        } else {
            bus.write_word(ea, self.regs.y.word())?;
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_stz<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            bus.write(ea, 0)?;
            self.cycles += 2;
        } else {
            bus.write_word(ea, 0)?;
            self.cycles += 3;
        }
        Ok(())
    }

    // --- Arithmetic ---

    pub(crate) fn op_adc<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.p.is_set(D) {
            return Err(CpuError::Unimplemented { name: "decimal ADC" });
        }
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            let a = self.regs.a.byte();
            let sum = u16::from(a) + u16::from(n) + u16::from(self.p.is_set(C));
            self.p.set_if(C, sum & 0x100 != 0);
            self.p.set_if(V, !(a ^ n) & (a ^ sum as u8) & 0x80 != 0);
            let d = self.regs.a.set_byte(sum as u8);
            self.p.apply(d);
        } else {
            let n = bus.read_word(ea)?;
            let a = self.regs.a.word();
            let sum = u32::from(a) + u32::from(n) + u32::from(self.p.is_set(C));
            self.p.set_if(C, sum & 0x1_0000 != 0);
            self.p.set_if(V, !(a ^ n) & (a ^ sum as u16) & 0x8000 != 0);
            let d = self.regs.a.set_word(sum as u16);
            self.p.apply(d);
        }
        self.cycles += 2;
        Ok(())
    }

    /// Binary subtract with borrow: A + !operand + C.
    pub(crate) fn op_sbc<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.p.is_set(D) {
            return Err(CpuError::Unimplemented { name: "decimal SBC" });
        }
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            let a = self.regs.a.byte();
            let sum = u16::from(a) + u16::from(!n) + u16::from(self.p.is_set(C));
            self.p.set_if(C, sum & 0x100 != 0);
            self.p.set_if(V, (a ^ n) & (a ^ sum as u8) & 0x80 != 0);
            let d = self.regs.a.set_byte(sum as u8);
            self.p.apply(d);
        } else {
            let n = bus.read_word(ea)?;
            let a = self.regs.a.word();
            let sum = u32::from(a) + u32::from(!n) + u32::from(self.p.is_set(C));
            self.p.set_if(C, sum & 0x1_0000 != 0);
            self.p.set_if(V, (a ^ n) & (a ^ sum as u16) & 0x8000 != 0);
            let d = self.regs.a.set_word(sum as u16);
            self.p.apply(d);
        }
        self.cycles += 2;
        Ok(())
    }

    fn compare_byte(&mut self, reg: u8, data: u8) {
        self.p.set_if(C, reg >= data);
        self.p.update_nz(reg.wrapping_sub(data));
    }

    fn compare_word(&mut self, reg: u16, data: u16) {
        self.p.set_if(C, reg >= data);
        self.p.update_nz_word(reg.wrapping_sub(data));
    }

    pub(crate) fn op_cmp<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let data = bus.read(ea)?;
            let a = self.regs.a.byte();
            self.compare_byte(a, data);
            self.cycles += 2;
        } else {
            let data = bus.read_word(ea)?;
            let a = self.regs.a.word();
            self.compare_word(a, data);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_cpx<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.index_is_byte() {
            let data = bus.read(ea)?;
            let x = self.regs.x.byte();
            self.compare_byte(x, data);
            self.cycles += 2;
        } else {
            let data = bus.read_word(ea)?;
            let x = self.regs.x.word();
            self.compare_word(x, data);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_cpy<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.index_is_byte() {
            let data = bus.read(ea)?;
            let y = self.regs.y.byte();
            self.compare_byte(y, data);
            self.cycles += 2;
        } else {
            let data = bus.read_word(ea)?;
            let y = self.regs.y.word();
            self.compare_word(y, data);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_inc<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let r = bus.read(ea)?.wrapping_add(1);
            bus.write(ea, r)?;
            self.p.update_nz(r);
            self.cycles += 4;
        } else {
            let r = bus.read_word(ea)?.wrapping_add(1);
            bus.write_word(ea, r)?;
            self.p.update_nz_word(r);
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_dec<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let r = bus.read(ea)?.wrapping_sub(1);
            bus.write(ea, r)?;
            self.p.update_nz(r);
            self.cycles += 4;
        } else {
            let r = bus.read_word(ea)?.wrapping_sub(1);
            bus.write_word(ea, r)?;
            self.p.update_nz_word(r);
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_inc_a(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            self.regs.a.set_byte(self.regs.a.byte().wrapping_add(1))
        } else {
            self.regs.a.set_word(self.regs.a.word().wrapping_add(1))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_dec_a(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            self.regs.a.set_byte(self.regs.a.byte().wrapping_sub(1))
        } else {
            self.regs.a.set_word(self.regs.a.word().wrapping_sub(1))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_inx(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.x.set_byte(self.regs.x.byte().wrapping_add(1))
        } else {
            self.regs.x.set_word(self.regs.x.word().wrapping_add(1))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_iny(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.y.set_byte(self.regs.y.byte().wrapping_add(1))
        } else {
            self.regs.y.set_word(self.regs.y.word().wrapping_add(1))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_dex(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.x.set_byte(self.regs.x.byte().wrapping_sub(1))
        } else {
            self.regs.x.set_word(self.regs.x.word().wrapping_sub(1))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_dey(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.y.set_byte(self.regs.y.byte().wrapping_sub(1))
        } else {
            self.regs.y.set_word(self.regs.y.word().wrapping_sub(1))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    // --- Logic ---

    pub(crate) fn op_and<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            let d = self.regs.a.set_byte(self.regs.a.byte() & n);
            self.p.apply(d);
            self.cycles += 2;
        } else {
            let n = bus.read_word(ea)?;
            let d = self.regs.a.set_word(self.regs.a.word() & n);
            self.p.apply(d);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_ora<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            let d = self.regs.a.set_byte(self.regs.a.byte() | n);
            self.p.apply(d);
            self.cycles += 2;
        } else {
            let n = bus.read_word(ea)?;
            let d = self.regs.a.set_word(self.regs.a.word() | n);
            self.p.apply(d);
            self.cycles += 3;
        }
        Ok(())
    }

    pub(crate) fn op_eor<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            let d = self.regs.a.set_byte(self.regs.a.byte() ^ n);
            self.p.apply(d);
            self.cycles += 2;
        } else {
            let n = bus.read_word(ea)?;
            let d = self.regs.a.set_word(self.regs.a.word() ^ n);
            self.p.apply(d);
            self.cycles += 3;
        }
        Ok(())
    }

    /// BIT: Z from A & operand, N and V copied from the operand's top bits.
    pub(crate) fn op_bit<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            self.p.set_if(Z, self.regs.a.byte() & n == 0);
            self.p.set_if(N, n & 0x80 != 0);
            self.p.set_if(V, n & 0x40 != 0);
            self.cycles += 2;
        } else {
            let n = bus.read_word(ea)?;
            self.p.set_if(Z, self.regs.a.word() & n == 0);
            self.p.set_if(N, n & 0x8000 != 0);
            self.p.set_if(V, n & 0x4000 != 0);
            self.cycles += 3;
        }
        Ok(())
    }

    /// BIT immediate only affects Z.
    pub(crate) fn op_bit_imm<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            self.p.set_if(Z, self.regs.a.byte() & n == 0);
        } else {
            let n = bus.read_word(ea)?;
            self.p.set_if(Z, self.regs.a.word() & n == 0);
        }
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tsb<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            bus.write(ea, n | self.regs.a.byte())?;
            self.p.set_if(Z, n & self.regs.a.byte() == 0);
            self.cycles += 4;
        } else {
            let n = bus.read_word(ea)?;
            bus.write_word(ea, n | self.regs.a.word())?;
            self.p.set_if(Z, n & self.regs.a.word() == 0);
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_trb<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            bus.write(ea, n & !self.regs.a.byte())?;
            self.p.set_if(Z, n & self.regs.a.byte() == 0);
            self.cycles += 4;
        } else {
            let n = bus.read_word(ea)?;
            bus.write_word(ea, n & !self.regs.a.word())?;
            self.p.set_if(Z, n & self.regs.a.word() == 0);
            self.cycles += 5;
        }
        Ok(())
    }

    // --- Shifts and rotates ---

    pub(crate) fn op_asl<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            self.p.set_if(C, n & 0x80 != 0);
            let r = n << 1;
            self.p.update_nz(r);
            bus.write(ea, r)?;
            self.cycles += 4;
        } else {
            let n = bus.read_word(ea)?;
            self.p.set_if(C, n & 0x8000 != 0);
            let r = n << 1;
            self.p.update_nz_word(r);
            bus.write_word(ea, r)?;
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_asl_a(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            let a = self.regs.a.byte();
            self.p.set_if(C, a & 0x80 != 0);
            self.regs.a.set_byte(a << 1)
        } else {
            let a = self.regs.a.word();
            self.p.set_if(C, a & 0x8000 != 0);
            self.regs.a.set_word(a << 1)
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_lsr<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            self.p.set_if(C, n & 0x01 != 0);
            let r = n >> 1;
            self.p.update_nz(r);
            bus.write(ea, r)?;
            self.cycles += 4;
        } else {
            let n = bus.read_word(ea)?;
            self.p.set_if(C, n & 0x0001 != 0);
            let r = n >> 1;
            self.p.update_nz_word(r);
            bus.write_word(ea, r)?;
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_lsr_a(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            let a = self.regs.a.byte();
            self.p.set_if(C, a & 0x01 != 0);
            self.regs.a.set_byte(a >> 1)
        } else {
            let a = self.regs.a.word();
            self.p.set_if(C, a & 0x0001 != 0);
            self.regs.a.set_word(a >> 1)
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_rol<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        let carry_in = u16::from(self.p.is_set(C));
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            self.p.set_if(C, n & 0x80 != 0);
            let r = (n << 1) | carry_in as u8;
            self.p.update_nz(r);
            bus.write(ea, r)?;
            self.cycles += 4;
        } else {
            let n = bus.read_word(ea)?;
            self.p.set_if(C, n & 0x8000 != 0);
            let r = (n << 1) | carry_in;
            self.p.update_nz_word(r);
            bus.write_word(ea, r)?;
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_rol_a(&mut self) -> Result<(), CpuError> {
        let carry_in = u16::from(self.p.is_set(C));
        let d = if self.a_is_byte() {
            let a = self.regs.a.byte();
            self.p.set_if(C, a & 0x80 != 0);
            self.regs.a.set_byte((a << 1) | carry_in as u8)
        } else {
            let a = self.regs.a.word();
            self.p.set_if(C, a & 0x8000 != 0);
            self.regs.a.set_word((a << 1) | carry_in)
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    /// ROR rotates carry into the top bit; bit 0 moves to carry.
    pub(crate) fn op_ror<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        let carry_in = self.p.is_set(C);
        if self.a_is_byte() {
            let n = bus.read(ea)?;
            self.p.set_if(C, n & 0x01 != 0);
            let r = (n >> 1) | (u8::from(carry_in) << 7);
            self.p.update_nz(r);
            bus.write(ea, r)?;
            self.cycles += 4;
        } else {
            let n = bus.read_word(ea)?;
            self.p.set_if(C, n & 0x0001 != 0);
            let r = (n >> 1) | (u16::from(carry_in) << 15);
            self.p.update_nz_word(r);
            bus.write_word(ea, r)?;
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_ror_a(&mut self) -> Result<(), CpuError> {
        let carry_in = self.p.is_set(C);
        let d = if self.a_is_byte() {
            let a = self.regs.a.byte();
            self.p.set_if(C, a & 0x01 != 0);
            self.regs.a.set_byte((a >> 1) | (u8::from(carry_in) << 7))
        } else {
            let a = self.regs.a.word();
            self.p.set_if(C, a & 0x0001 != 0);
            self.regs.a.set_word((a >> 1) | (u16::from(carry_in) << 15))
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    // --- Branches and jumps ---

    /// Conditional branch. Taken branches cost one extra cycle, plus
    /// one more in emulation mode when the target is on another page.
    pub(crate) fn op_branch(&mut self, target: u32, taken: bool) -> Result<(), CpuError> {
        if taken {
            if self.e && (self.regs.pc.word() ^ target as u16) & 0xFF00 != 0 {
                self.cycles += 1;
            }
            self.regs.pc.set_word(target as u16);
            self.cycles += 3;
        } else {
            self.cycles += 2;
        }
        Ok(())
    }

    pub(crate) fn op_jmp(&mut self, target: u32) -> Result<(), CpuError> {
        self.regs.pc.set_word(target as u16);
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_jsr<B: Bus>(&mut self, bus: &mut B, target: u32) -> Result<(), CpuError> {
        let pc = self.regs.pc.word();
        let pbr = self.regs.pbr.byte();
        self.set_call_exit(addr24(pbr, pc.wrapping_sub(3)));
        self.push_call(addr24(pbr, target as u16));
        self.push_word(bus, pc.wrapping_sub(1))?;
        self.regs.pc.set_word(target as u16);
        self.cycles += 4;
        Ok(())
    }

    pub(crate) fn op_jsl<B: Bus>(&mut self, bus: &mut B, target: u32) -> Result<(), CpuError> {
        let pc = self.regs.pc.word();
        let pbr = self.regs.pbr.byte();
        self.set_call_exit(addr24(pbr, pc.wrapping_sub(4)));
        self.push_call(target);
        self.push_byte(bus, pbr)?;
        self.push_word(bus, pc.wrapping_sub(1))?;
        self.regs.pbr.set_byte((target >> 16) as u8);
        self.regs.pc.set_word(target as u16);
        self.cycles += 4;
        Ok(())
    }

    pub(crate) fn op_rts<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.pop_call();
        let ret = self.pull_word(bus)?;
        self.regs.pc.set_word(ret.wrapping_add(1));
        self.cycles += 6;
        Ok(())
    }

    pub(crate) fn op_rtl<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.pop_call();
        let ret = self.pull_word(bus)?;
        self.regs.pc.set_word(ret.wrapping_add(1));
        let pbr = self.pull_byte(bus)?;
        self.regs.pbr.set_byte(pbr);
        self.cycles += 6;
        Ok(())
    }

    pub(crate) fn op_rti(&mut self) -> Result<(), CpuError> {
        Err(CpuError::Unimplemented { name: "RTI" })
    }

    // --- Stack operations ---

    pub(crate) fn op_pha<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.a_is_byte() {
            self.push_byte(bus, self.regs.a.byte())?;
            self.cycles += 3;
        } else {
            self.push_word(bus, self.regs.a.word())?;
            self.cycles += 4;
        }
        Ok(())
    }

    pub(crate) fn op_phx<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.index_is_byte() {
            self.push_byte(bus, self.regs.x.byte())?;
            self.cycles += 3;
        } else {
            self.push_word(bus, self.regs.x.word())?;
            self.cycles += 4;
        }
        Ok(())
    }

    pub(crate) fn op_phy<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.index_is_byte() {
            self.push_byte(bus, self.regs.y.byte())?;
            self.cycles += 3;
        } else {
            self.push_word(bus, self.regs.y.word())?;
            self.cycles += 4;
        }
        Ok(())
    }

    pub(crate) fn op_phb<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.push_byte(bus, self.regs.dbr.byte())?;
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_phd<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.push_word(bus, self.regs.dp.word())?;
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_phk<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.push_byte(bus, self.regs.pbr.byte())?;
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_php<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.push_byte(bus, self.p.0)?;
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_pla<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.a_is_byte() {
            let v = self.pull_byte(bus)?;
            let d = self.regs.a.set_byte(v);
            self.p.apply(d);
            self.cycles += 4;
        } else {
            let v = self.pull_word(bus)?;
            let d = self.regs.a.set_word(v);
            self.p.apply(d);
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_plx<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.index_is_byte() {
            let v = self.pull_byte(bus)?;
            let d = self.regs.x.set_byte(v);
            self.p.apply(d);
            self.cycles += 4;
        } else {
            let v = self.pull_word(bus)?;
            let d = self.regs.x.set_word(v);
            self.p.apply(d);
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_ply<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.index_is_byte() {
            let v = self.pull_byte(bus)?;
            let d = self.regs.y.set_byte(v);
            self.p.apply(d);
            self.cycles += 4;
        } else {
            let v = self.pull_word(bus)?;
            let d = self.regs.y.set_word(v);
            self.p.apply(d);
            self.cycles += 5;
        }
        Ok(())
    }

    pub(crate) fn op_plb<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let v = self.pull_byte(bus)?;
        self.regs.dbr.set_byte(v);
        self.p.update_nz(v);
        self.cycles += 4;
        Ok(())
    }

    pub(crate) fn op_pld<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let v = self.pull_word(bus)?;
        self.regs.dp.set_word(v);
        self.p.update_nz_word(v);
        self.cycles += 5;
        Ok(())
    }

    pub(crate) fn op_plp<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let v = self.pull_byte(bus)?;
        self.p.0 = v;
        if self.e {
            self.p.set(M | X);
        }
        if self.p.is_set(X) {
            self.truncate_index_registers();
        }
        self.sync_widths();
        self.cycles += 4;
        Ok(())
    }

    pub(crate) fn op_pea<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        let v = bus.read_word(ea)?;
        self.push_word(bus, v)?;
        self.cycles += 5;
        Ok(())
    }

    pub(crate) fn op_pei<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        let v = bus.read_word(ea)?;
        self.push_word(bus, v)?;
        self.cycles += 6;
        Ok(())
    }

    pub(crate) fn op_per<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        self.push_word(bus, ea as u16)?;
        self.cycles += 6;
        Ok(())
    }

    // --- Flag operations ---

    pub(crate) fn op_set_flag(&mut self, flag: u8, value: bool) -> Result<(), CpuError> {
        self.p.set_if(flag, value);
        self.cycles += 2;
        Ok(())
    }

    /// REP clears the masked flags. In emulation mode the width bits
    /// stay forced, so REP #$20 there is a no-op on widths.
    pub(crate) fn op_rep<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        let mask = bus.read(ea)?;
        self.p.0 &= !mask;
        if self.e {
            self.p.set(M | X);
        }
        self.sync_widths();
        self.cycles += 3;
        Ok(())
    }

    /// SEP sets the masked flags. Narrowing the index width truncates
    /// X and Y to their low byte.
    pub(crate) fn op_sep<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        let mask = bus.read(ea)?;
        self.p.0 |= mask;
        if self.e {
            self.p.set(M | X);
        }
        if self.p.is_set(X) {
            self.truncate_index_registers();
        }
        self.sync_widths();
        self.cycles += 3;
        Ok(())
    }

    // --- Transfers ---

    pub(crate) fn op_tax(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.x.set_byte(self.regs.a.byte())
        } else {
            self.regs.x.set_word(self.regs.a.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tay(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.y.set_byte(self.regs.a.byte())
        } else {
            self.regs.y.set_word(self.regs.a.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_txa(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            self.regs.a.set_byte(self.regs.x.byte())
        } else {
            self.regs.a.set_word(self.regs.x.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tya(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            self.regs.a.set_byte(self.regs.y.byte())
        } else {
            self.regs.a.set_word(self.regs.y.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_txy(&mut self) -> Result<(), CpuError> {
        let d = self.regs.y.set_word(self.regs.x.word());
        if self.index_is_byte() {
            self.p.update_nz(self.regs.y.byte());
        } else {
            self.p.apply(d);
        }
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tyx(&mut self) -> Result<(), CpuError> {
        let d = self.regs.x.set_word(self.regs.y.word());
        if self.index_is_byte() {
            self.p.update_nz(self.regs.x.byte());
        } else {
            self.p.apply(d);
        }
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tsx(&mut self) -> Result<(), CpuError> {
        let d = if self.index_is_byte() {
            self.regs.x.set_byte(self.regs.s.byte())
        } else {
            self.regs.x.set_word(self.regs.s.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    /// TXS never touches flags.
    pub(crate) fn op_txs(&mut self) -> Result<(), CpuError> {
        let v = if self.e {
            0x0100 | u16::from(self.regs.x.byte())
        } else {
            self.regs.x.word()
        };
        self.regs.s.set_word(v);
        self.cycles += 2;
        Ok(())
    }

    /// TCS never touches flags.
    pub(crate) fn op_tcs(&mut self) -> Result<(), CpuError> {
        let v = if self.e {
            0x0100 | u16::from(self.regs.a.byte())
        } else {
            self.regs.a.word()
        };
        self.regs.s.set_word(v);
        self.cycles += 2;
        Ok(())
    }

    /// TCD never touches flags.
    pub(crate) fn op_tcd(&mut self) -> Result<(), CpuError> {
        self.regs.dp.set_word(self.regs.a.word());
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tdc(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            self.regs.a.set_byte(self.regs.dp.byte())
        } else {
            self.regs.a.set_word(self.regs.dp.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    pub(crate) fn op_tsc(&mut self) -> Result<(), CpuError> {
        let d = if self.a_is_byte() {
            self.regs.a.set_byte(self.regs.s.byte())
        } else {
            self.regs.a.set_word(self.regs.s.word())
        };
        self.p.apply(d);
        self.cycles += 2;
        Ok(())
    }

    // --- System ---

    pub(crate) fn op_nop(&mut self) -> Result<(), CpuError> {
        self.cycles += 2;
        Ok(())
    }

    /// XBA swaps the accumulator's bytes.
    pub(crate) fn op_xba(&mut self) -> Result<(), CpuError> {
        let d = self.regs.a.set_word(self.regs.a.word().rotate_left(8));
        self.p.apply(d);
        self.cycles += 3;
        Ok(())
    }

    /// XCE swaps carry with the emulation flag. Entering emulation
    /// forces 8-bit widths, clears the direct page and clamps the
    /// stack to page 1.
    pub(crate) fn op_xce(&mut self) -> Result<(), CpuError> {
        let carry = self.p.is_set(C);
        self.p.set_if(C, self.e);
        self.e = carry;
        if self.e {
            self.p.set(M | X);
            self.regs.dp.set_word(0);
            let low = self.regs.s.byte();
            self.regs.s.set_word(0x0100 | u16::from(low));
            self.truncate_index_registers();
        }
        self.sync_widths();
        self.cycles += 2;
        Ok(())
    }

    /// Software interrupt. Pushes return state, jumps through the BRK
    /// vector contents (0xFFFE in emulation mode, 0xFFE6 in native).
    pub(crate) fn op_brk<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.e {
            let pc = self.regs.pc.word();
            self.push_word(bus, pc)?;
            // Bit 4 reads as Break when pushed by BRK in emulation mode.
            self.push_byte(bus, self.p.0 | 0x10)?;
            self.p.set(I);
            self.p.clear(D);
            self.regs.pbr.set_byte(0);
            let vector = bus.read_word(0x00_FFFE)?;
            self.regs.pc.set_word(vector);
            self.cycles += 7;
        } else {
            let pbr = self.regs.pbr.byte();
            let pc = self.regs.pc.word();
            self.push_byte(bus, pbr)?;
            self.push_word(bus, pc)?;
            self.push_byte(bus, self.p.0)?;
            self.p.set(I);
            self.p.clear(D);
            self.regs.pbr.set_byte(0);
            let vector = bus.read_word(0x00_FFE6)?;
            self.regs.pc.set_word(vector);
            self.cycles += 8;
        }
        Ok(())
    }

    /// Coprocessor interrupt, vectors 0xFFF4 (emulation) / 0xFFE4 (native).
    pub(crate) fn op_cop<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.e {
            let pc = self.regs.pc.word();
            self.push_word(bus, pc)?;
            self.push_byte(bus, self.p.0)?;
            self.p.set(I);
            self.p.clear(D);
            self.regs.pbr.set_byte(0);
            let vector = bus.read_word(0x00_FFF4)?;
            self.regs.pc.set_word(vector);
            self.cycles += 7;
        } else {
            let pbr = self.regs.pbr.byte();
            let pc = self.regs.pc.word();
            self.push_byte(bus, pbr)?;
            self.push_word(bus, pc)?;
            self.push_byte(bus, self.p.0)?;
            self.p.set(I);
            self.p.clear(D);
            self.regs.pbr.set_byte(0);
            let vector = bus.read_word(0x00_FFE4)?;
            self.regs.pc.set_word(vector);
            self.cycles += 8;
        }
        Ok(())
    }

    pub(crate) fn op_wai(&mut self) -> Result<(), CpuError> {
        self.enter_wait();
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_stp(&mut self) -> Result<(), CpuError> {
        self.enter_stop();
        self.cycles += 3;
        Ok(())
    }

    pub(crate) fn op_mvn<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        self.block_move(bus, ea, true)
    }

    pub(crate) fn op_mvp<B: Bus>(&mut self, bus: &mut B, ea: u32) -> Result<(), CpuError> {
        self.block_move(bus, ea, false)
    }

    /// Block move. Operand bytes are destination bank then source bank;
    /// X/Y address source/destination, A holds count-1. The whole block
    /// moves within one step at 7 cycles per byte, flags untouched,
    /// A left at 0xFFFF and DBR at the destination bank.
    fn block_move<B: Bus>(&mut self, bus: &mut B, ea: u32, forward: bool) -> Result<(), CpuError> {
        let dst_bank = bus.read(ea)?;
        let src_bank = bus.read(ea + 1)?;
        let count = u32::from(self.regs.a.word()) + 1;
        let mut x = self.regs.x.word();
        let mut y = self.regs.y.word();
        for _ in 0..count {
            let b = bus.read(addr24(src_bank, x))?;
            bus.write(addr24(dst_bank, y), b)?;
            if forward {
                x = x.wrapping_add(1);
                y = y.wrapping_add(1);
            } else {
                x = x.wrapping_sub(1);
                y = y.wrapping_sub(1);
            }
            self.cycles += 7;
        }
        if self.index_is_byte() {
            x &= 0x00FF;
            y &= 0x00FF;
        }
        self.regs.x.set_word(x);
        self.regs.y.set_word(y);
        self.regs.a.set_word(0xFFFF);
        self.regs.dbr.set_byte(dst_bank);
        Ok(())
    }

    // --- Width bookkeeping ---

    fn sync_widths(&mut self) {
        let a = if self.a_is_byte() {
            Width::Eight
        } else {
            Width::Sixteen
        };
        let i = if self.index_is_byte() {
            Width::Eight
        } else {
            Width::Sixteen
        };
        self.regs.a.set_width(a);
        self.regs.x.set_width(i);
        self.regs.y.set_width(i);
    }

    fn truncate_index_registers(&mut self) {
        let x = u16::from(self.regs.x.byte());
        let y = u16::from(self.regs.y.byte());
        self.regs.x.set_word(x);
        self.regs.y.set_word(y);
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::{CpuError, RESET_VECTOR};
    use crate::status::{C, D, M, N, V, X, Z};
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

    fn native_16(cpu: &mut Cpu) {
        cpu.e = false;
        cpu.p.clear(M);
        cpu.p.clear(X);
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        let (mut cpu, mut bus) = boot(&[0x69, 0x50]); // ADC #$50
        cpu.regs.a.set_byte(0x50);
        cpu.step(&mut bus).unwrap();
        // 0x50 + 0x50 = 0xA0: signed overflow, no carry.
        assert_eq!(cpu.regs.a.byte(), 0xA0);
        assert!(cpu.p.is_set(V));
        assert!(!cpu.p.is_set(C));
        assert!(cpu.p.is_set(N));
    }

    #[test]
    fn adc_word_carries_at_bit_sixteen() {
        let (mut cpu, mut bus) = boot(&[0x69, 0x01, 0x00]); // ADC #$0001
        native_16(&mut cpu);
        cpu.regs.a.set_word(0xFFFF);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a.word(), 0x0000);
        assert!(cpu.p.is_set(C));
        assert!(cpu.p.is_set(Z));
        assert!(!cpu.p.is_set(V));
    }

    #[test]
    fn sbc_without_borrow() {
        let (mut cpu, mut bus) = boot(&[0xE9, 0x30]); // SBC #$30
        cpu.regs.a.set_byte(0x50);
        cpu.p.set(C); // no incoming borrow
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a.byte(), 0x20);
        assert!(cpu.p.is_set(C)); // no borrow out
        assert!(!cpu.p.is_set(V));
    }

    #[test]
    fn sbc_with_borrow_out() {
        let (mut cpu, mut bus) = boot(&[0xE9, 0x60]); // SBC #$60
        cpu.regs.a.set_byte(0x50);
        cpu.p.set(C);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a.byte(), 0xF0);
        assert!(!cpu.p.is_set(C));
        assert!(cpu.p.is_set(N));
    }

    #[test]
    fn decimal_mode_arithmetic_fails_loudly() {
        let (mut cpu, mut bus) = boot(&[0x69, 0x01]);
        cpu.p.set(D);
        assert_eq!(
            cpu.step(&mut bus).unwrap_err(),
            CpuError::Unimplemented {
                name: "decimal ADC"
            }
        );
    }

    #[test]
    fn compare_sets_carry_on_greater_or_equal() {
        let (mut cpu, mut bus) = boot(&[0xC9, 0x40, 0xC9, 0x40, 0xC9, 0x41]);
        cpu.regs.a.set_byte(0x40);
        cpu.step(&mut bus).unwrap(); // A == operand
        assert!(cpu.p.is_set(C) && cpu.p.is_set(Z));
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(C));
        cpu.step(&mut bus).unwrap(); // A < operand
        assert!(!cpu.p.is_set(C) && !cpu.p.is_set(Z));
    }

    #[test]
    fn cpx_compares_x_not_a() {
        let (mut cpu, mut bus) = boot(&[0xE0, 0x10]); // CPX #$10
        cpu.regs.a.set_byte(0x00);
        cpu.regs.x.set_byte(0x10);
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(C) && cpu.p.is_set(Z));
    }

    #[test]
    fn ror_rotates_carry_into_top_bit() {
        let (mut cpu, mut bus) = boot(&[0x6A]); // ROR A
        cpu.regs.a.set_byte(0x01);
        cpu.p.set(C);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a.byte(), 0x80);
        assert!(cpu.p.is_set(C)); // old bit 0
        assert!(cpu.p.is_set(N));
    }

    #[test]
    fn rol_rotates_carry_into_bit_zero() {
        let (mut cpu, mut bus) = boot(&[0x2A]); // ROL A
        cpu.regs.a.set_byte(0x80);
        cpu.p.clear(C);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a.byte(), 0x00);
        assert!(cpu.p.is_set(C));
        assert!(cpu.p.is_set(Z));
    }

    #[test]
    fn asl_memory_costs_four_cycles_byte_wide() {
        let (mut cpu, mut bus) = boot(&[0x06, 0x10]); // ASL $10
        bus.load(0x0010, &[0xC0]);
        let cycles = cpu.cycles;
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.peek(0x0010), 0x80);
        assert!(cpu.p.is_set(C));
        // 1 for direct page resolution + 4 for the read-modify-write.
        assert_eq!(cpu.cycles - cycles, 5);
    }

    #[test]
    fn bit_copies_operand_top_bits() {
        let (mut cpu, mut bus) = boot(&[0x24, 0x20]); // BIT $20
        bus.load(0x0020, &[0xC0]);
        cpu.regs.a.set_byte(0x01);
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(Z));
        assert!(cpu.p.is_set(N));
        assert!(cpu.p.is_set(V));
    }

    #[test]
    fn tsb_trb_set_and_clear_bits() {
        let (mut cpu, mut bus) = boot(&[0x04, 0x30, 0x14, 0x30]); // TSB $30; TRB $30
        bus.load(0x0030, &[0x0F]);
        cpu.regs.a.set_byte(0xF0);
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.peek(0x0030), 0xFF);
        assert!(cpu.p.is_set(Z)); // A & old == 0
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.peek(0x0030), 0x0F);
        assert!(cpu.p.is_set(Z));
    }

    #[test]
    fn branch_taken_page_cross_costs_extra_in_emulation() {
        // BRA -16 from 0xC002 lands on 0xBFF2, crossing a page.
        let (mut cpu, mut bus) = boot(&[0x80, 0xF0]);
        let cycles = cpu.cycles;
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc.word(), 0xBFF2);
        assert_eq!(cpu.cycles - cycles, 5); // 1 resolver + 3 taken + 1 cross
    }

    #[test]
    fn branch_not_taken_costs_two_plus_resolver() {
        let (mut cpu, mut bus) = boot(&[0xD0, 0x10]); // BNE with Z set
        let cycles = cpu.cycles;
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc.word(), 0xC002);
        assert_eq!(cpu.cycles - cycles, 3);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR $C010; ...; at $C010: RTS
        let (mut cpu, mut bus) = boot(&[0x20, 0x10, 0xC0]);
        bus.load(0xC010, &[0x60]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc.word(), 0xC010);
        assert_eq!(cpu.call_depth(), 2);
        assert_eq!(cpu.call_trace()[1].entry, 0xC010);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc.word(), 0xC003);
        assert_eq!(cpu.call_depth(), 1);
        assert_eq!(cpu.call_trace()[0].exit, None);
    }

    #[test]
    fn jsl_rtl_cross_bank() {
        let (mut cpu, mut bus) = boot(&[0x22, 0x00, 0x80, 0x01]); // JSL $01:8000
        bus.load(0x0001_8000, &[0x6B]); // RTL
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pbr.byte(), 0x01);
        assert_eq!(cpu.regs.pc.word(), 0x8000);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pbr.byte(), 0x00);
        assert_eq!(cpu.regs.pc.word(), 0xC004);
    }

    #[test]
    fn rep_is_a_width_noop_in_emulation_mode() {
        let (mut cpu, mut bus) = boot(&[0xC2, 0x30]); // REP #$30
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(M));
        assert!(cpu.p.is_set(X));
    }

    #[test]
    fn rep_clears_other_flags_even_in_emulation() {
        let (mut cpu, mut bus) = boot(&[0xC2, 0x04]); // REP #$04 clears I
        cpu.step(&mut bus).unwrap();
        assert!(!cpu.p.is_set(crate::status::I));
    }

    #[test]
    fn sep_narrowing_truncates_index_registers() {
        let (mut cpu, mut bus) = boot(&[0xE2, 0x10]); // SEP #$10
        native_16(&mut cpu);
        cpu.regs.x.set_word(0x1234);
        cpu.regs.y.set_word(0xBEEF);
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(X));
        assert_eq!(cpu.regs.x.word(), 0x0034);
        assert_eq!(cpu.regs.y.word(), 0x00EF);
    }

    #[test]
    fn sep_is_idempotent_on_accumulator_width() {
        let (mut cpu, mut bus) = boot(&[0xE2, 0x20, 0xE2, 0x20]);
        native_16(&mut cpu);
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(M));
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(M));
    }

    #[test]
    fn xce_enters_native_mode() {
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB]); // CLC; XCE
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert!(!cpu.e);
        assert!(cpu.p.is_set(C)); // old E
        assert!(cpu.p.is_set(M)); // widths still 8-bit until REP
    }

    #[test]
    fn xce_back_to_emulation_clamps_stack_and_dp() {
        let (mut cpu, mut bus) = boot(&[0x18, 0xFB, 0x38, 0xFB]); // to native, back
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        cpu.regs.dp.set_word(0x2000);
        cpu.regs.s.set_word(0x33F0);
        cpu.step(&mut bus).unwrap(); // SEC
        cpu.step(&mut bus).unwrap(); // XCE
        assert!(cpu.e);
        assert_eq!(cpu.regs.dp.word(), 0);
        assert_eq!(cpu.regs.s.word(), 0x01F0);
    }

    #[test]
    fn brk_jumps_through_vector_contents() {
        let (mut cpu, mut bus) = boot(&[0x00, 0x00]); // BRK + signature
        bus.load(0x00_FFFE, &[0x00, 0x90]); // handler at 0x9000
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.pc.word(), 0x9000);
        assert!(cpu.p.is_set(crate::status::I));
        assert!(!cpu.p.is_set(D));
        // Pushed status has the break bit set.
        let pushed = bus.peek(u32::from(cpu.regs.s.word()) + 1);
        assert_ne!(pushed & 0x10, 0);
    }

    #[test]
    fn mvn_moves_a_block_forward() {
        // MVN with dst bank 0, src bank 1.
        let (mut cpu, mut bus) = boot(&[0x54, 0x00, 0x01]);
        bus.load(0x0001_2000, &[0xAA, 0xBB, 0xCC]);
        cpu.regs.a.set_word(0x0002); // 3 bytes
        cpu.regs.x.set_word(0x2000);
        cpu.regs.y.set_word(0x4000);
        cpu.e = false;
        cpu.p.clear(X);
        let cycles = cpu.cycles;
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.peek(0x4000), 0xAA);
        assert_eq!(bus.peek(0x4002), 0xCC);
        assert_eq!(cpu.regs.a.word(), 0xFFFF);
        assert_eq!(cpu.regs.x.word(), 0x2003);
        assert_eq!(cpu.regs.y.word(), 0x4003);
        assert_eq!(cpu.regs.dbr.byte(), 0x00);
        // immw resolver 1 + 7 per byte.
        assert_eq!(cpu.cycles - cycles, 1 + 21);
    }

    #[test]
    fn mvp_moves_backwards() {
        let (mut cpu, mut bus) = boot(&[0x44, 0x00, 0x00]); // MVP within bank 0
        bus.load(0x3000, &[0x11, 0x22]);
        cpu.regs.a.set_word(0x0001);
        cpu.regs.x.set_word(0x3001); // end of source
        cpu.regs.y.set_word(0x5001);
        cpu.e = false;
        cpu.p.clear(X);
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.peek(0x5000), 0x11);
        assert_eq!(bus.peek(0x5001), 0x22);
        assert_eq!(cpu.regs.x.word(), 0x2FFF);
    }

    #[test]
    fn plp_forces_widths_in_emulation() {
        let (mut cpu, mut bus) = boot(&[0x28]); // PLP
        // Pre-load a pulled status with M and X clear.
        cpu.push_byte(&mut bus, 0x00).unwrap();
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(M));
        assert!(cpu.p.is_set(X));
    }

    #[test]
    fn rti_is_unimplemented_by_design() {
        let (mut cpu, mut bus) = boot(&[0x40]);
        assert_eq!(
            cpu.step(&mut bus).unwrap_err(),
            CpuError::Unimplemented { name: "RTI" }
        );
    }

    #[test]
    fn xba_swaps_accumulator_bytes() {
        let (mut cpu, mut bus) = boot(&[0xEB]);
        cpu.regs.a.set_word(0x1234);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.regs.a.word(), 0x3412);
    }

    #[test]
    fn transfers_update_nz() {
        let (mut cpu, mut bus) = boot(&[0xAA]); // TAX
        cpu.regs.a.set_byte(0x00);
        cpu.p.clear(Z);
        cpu.step(&mut bus).unwrap();
        assert!(cpu.p.is_set(Z));
        assert_eq!(cpu.regs.x.word(), 0);
    }

    #[test]
    fn txs_does_not_touch_flags() {
        let (mut cpu, mut bus) = boot(&[0x9A]); // TXS
        cpu.regs.x.set_byte(0x00);
        cpu.p.clear(Z);
        cpu.step(&mut bus).unwrap();
        assert!(!cpu.p.is_set(Z));
        assert_eq!(cpu.regs.s.word(), 0x0100);
    }
}
