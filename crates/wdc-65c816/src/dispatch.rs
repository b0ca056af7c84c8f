//! Opcode dispatch.
//!
//! A 256-entry table of function pointers, one per opcode, built at
//! compile time. Each entry runs the addressing-mode resolver and then
//! the operation handler. The single absent entry is 0x42 (WDM, the
//! reserved expansion opcode); hitting it surfaces as an unknown-opcode
//! error rather than silently executing as a two-byte NOP.

use std::marker::PhantomData;

use emu_core::Bus;

use crate::cpu::{Cpu, CpuError};
use crate::status::{C, D, I, N, V, Z};

pub(crate) type Handler<B> = fn(&mut Cpu, &mut B) -> Result<(), CpuError>;

pub(crate) struct Dispatch<B>(PhantomData<B>);

impl<B: Bus> Dispatch<B> {
    pub(crate) const TABLE: [Option<Handler<B>>; 256] = {
        let mut t: [Option<Handler<B>>; 256] = [None; 256];

        // 0x00 - 0x0F
        t[0x00] = Some(|c, b| {
            c.am_immediate_byte();
            c.op_brk(b)
        });
        t[0x01] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_ora(b, ea)
        });
        t[0x02] = Some(|c, b| {
            c.am_immediate_byte();
            c.op_cop(b)
        });
        t[0x03] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_ora(b, ea)
        });
        t[0x04] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_tsb(b, ea)
        });
        t[0x05] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_ora(b, ea)
        });
        t[0x06] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_asl(b, ea)
        });
        t[0x07] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_ora(b, ea)
        });
        t[0x08] = Some(|c, b| c.op_php(b));
        t[0x09] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_ora(b, ea)
        });
        t[0x0A] = Some(|c, _| c.op_asl_a());
        t[0x0B] = Some(|c, b| c.op_phd(b));
        t[0x0C] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_tsb(b, ea)
        });
        t[0x0D] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_ora(b, ea)
        });
        t[0x0E] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_asl(b, ea)
        });
        t[0x0F] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_ora(b, ea)
        });

        // 0x10 - 0x1F
        t[0x10] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, !c.p.is_set(N))
        });
        t[0x11] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_ora(b, ea)
        });
        t[0x12] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_ora(b, ea)
        });
        t[0x13] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_ora(b, ea)
        });
        t[0x14] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_trb(b, ea)
        });
        t[0x15] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_ora(b, ea)
        });
        t[0x16] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_asl(b, ea)
        });
        t[0x17] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_ora(b, ea)
        });
        t[0x18] = Some(|c, _| c.op_set_flag(C, false));
        t[0x19] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_ora(b, ea)
        });
        t[0x1A] = Some(|c, _| c.op_inc_a());
        t[0x1B] = Some(|c, _| c.op_tcs());
        t[0x1C] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_trb(b, ea)
        });
        t[0x1D] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_ora(b, ea)
        });
        t[0x1E] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_asl(b, ea)
        });
        t[0x1F] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_ora(b, ea)
        });

        // 0x20 - 0x2F
        t[0x20] = Some(|c, b| {
            let tgt = c.am_absolute(b)?;
            c.op_jsr(b, tgt)
        });
        t[0x21] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_and(b, ea)
        });
        t[0x22] = Some(|c, b| {
            let tgt = c.am_absolute_long(b)?;
            c.op_jsl(b, tgt)
        });
        t[0x23] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_and(b, ea)
        });
        t[0x24] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_bit(b, ea)
        });
        t[0x25] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_and(b, ea)
        });
        t[0x26] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_rol(b, ea)
        });
        t[0x27] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_and(b, ea)
        });
        t[0x28] = Some(|c, b| c.op_plp(b));
        t[0x29] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_and(b, ea)
        });
        t[0x2A] = Some(|c, _| c.op_rol_a());
        t[0x2B] = Some(|c, b| c.op_pld(b));
        t[0x2C] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_bit(b, ea)
        });
        t[0x2D] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_and(b, ea)
        });
        t[0x2E] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_rol(b, ea)
        });
        t[0x2F] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_and(b, ea)
        });

        // 0x30 - 0x3F
        t[0x30] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, c.p.is_set(N))
        });
        t[0x31] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_and(b, ea)
        });
        t[0x32] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_and(b, ea)
        });
        t[0x33] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_and(b, ea)
        });
        t[0x34] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_bit(b, ea)
        });
        t[0x35] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_and(b, ea)
        });
        t[0x36] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_rol(b, ea)
        });
        t[0x37] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_and(b, ea)
        });
        t[0x38] = Some(|c, _| c.op_set_flag(C, true));
        t[0x39] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_and(b, ea)
        });
        t[0x3A] = Some(|c, _| c.op_dec_a());
        t[0x3B] = Some(|c, _| c.op_tsc());
        t[0x3C] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_bit(b, ea)
        });
        t[0x3D] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_and(b, ea)
        });
        t[0x3E] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_rol(b, ea)
        });
        t[0x3F] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_and(b, ea)
        });

        // 0x40 - 0x4F
        t[0x40] = Some(|c, _| c.op_rti());
        t[0x41] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_eor(b, ea)
        });
        // 0x42 (WDM) stays empty.
        t[0x43] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_eor(b, ea)
        });
        t[0x44] = Some(|c, b| {
            let ea = c.am_immediate_word();
            c.op_mvp(b, ea)
        });
        t[0x45] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_eor(b, ea)
        });
        t[0x46] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_lsr(b, ea)
        });
        t[0x47] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_eor(b, ea)
        });
        t[0x48] = Some(|c, b| c.op_pha(b));
        t[0x49] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_eor(b, ea)
        });
        t[0x4A] = Some(|c, _| c.op_lsr_a());
        t[0x4B] = Some(|c, b| c.op_phk(b));
        t[0x4C] = Some(|c, b| {
            let tgt = c.am_absolute(b)?;
            c.op_jmp(tgt)
        });
        t[0x4D] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_eor(b, ea)
        });
        t[0x4E] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_lsr(b, ea)
        });
        t[0x4F] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_eor(b, ea)
        });

        // 0x50 - 0x5F
        t[0x50] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, !c.p.is_set(V))
        });
        t[0x51] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_eor(b, ea)
        });
        t[0x52] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_eor(b, ea)
        });
        t[0x53] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_eor(b, ea)
        });
        t[0x54] = Some(|c, b| {
            let ea = c.am_immediate_word();
            c.op_mvn(b, ea)
        });
        t[0x55] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_eor(b, ea)
        });
        t[0x56] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_lsr(b, ea)
        });
        t[0x57] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_eor(b, ea)
        });
        t[0x58] = Some(|c, _| c.op_set_flag(I, false));
        t[0x59] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_eor(b, ea)
        });
        t[0x5A] = Some(|c, b| c.op_phy(b));
        t[0x5B] = Some(|c, _| c.op_tcd());
        t[0x5C] = Some(|c, b| {
            let tgt = c.am_absolute_long(b)?;
            c.op_jmp(tgt)
        });
        t[0x5D] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_eor(b, ea)
        });
        t[0x5E] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_lsr(b, ea)
        });
        t[0x5F] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_eor(b, ea)
        });

        // 0x60 - 0x6F
        t[0x60] = Some(|c, b| c.op_rts(b));
        t[0x61] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_adc(b, ea)
        });
        t[0x62] = Some(|c, b| {
            let ea = c.am_relative_long(b)?;
            c.op_per(b, ea)
        });
        t[0x63] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_adc(b, ea)
        });
        t[0x64] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_stz(b, ea)
        });
        t[0x65] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_adc(b, ea)
        });
        t[0x66] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_ror(b, ea)
        });
        t[0x67] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_adc(b, ea)
        });
        t[0x68] = Some(|c, b| c.op_pla(b));
        t[0x69] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_adc(b, ea)
        });
        t[0x6A] = Some(|c, _| c.op_ror_a());
        t[0x6B] = Some(|c, b| c.op_rtl(b));
        t[0x6C] = Some(|c, b| {
            let tgt = c.am_absolute_indirect(b)?;
            c.op_jmp(tgt)
        });
        t[0x6D] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_adc(b, ea)
        });
        t[0x6E] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_ror(b, ea)
        });
        t[0x6F] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_adc(b, ea)
        });

        // 0x70 - 0x7F
        t[0x70] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, c.p.is_set(V))
        });
        t[0x71] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_adc(b, ea)
        });
        t[0x72] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_adc(b, ea)
        });
        t[0x73] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_adc(b, ea)
        });
        t[0x74] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_stz(b, ea)
        });
        t[0x75] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_adc(b, ea)
        });
        t[0x76] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_ror(b, ea)
        });
        t[0x77] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_adc(b, ea)
        });
        t[0x78] = Some(|c, _| c.op_set_flag(I, true));
        t[0x79] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_adc(b, ea)
        });
        t[0x7A] = Some(|c, b| c.op_ply(b));
        t[0x7B] = Some(|c, _| c.op_tdc());
        t[0x7C] = Some(|c, b| {
            let tgt = c.am_absolute_x_indirect(b)?;
            c.op_jmp(tgt)
        });
        t[0x7D] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_adc(b, ea)
        });
        t[0x7E] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_ror(b, ea)
        });
        t[0x7F] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_adc(b, ea)
        });

        // 0x80 - 0x8F
        t[0x80] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, true)
        });
        t[0x81] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_sta(b, ea)
        });
        t[0x82] = Some(|c, b| {
            let tgt = c.am_relative_long(b)?;
            c.op_jmp(tgt)
        });
        t[0x83] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_sta(b, ea)
        });
        t[0x84] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_sty(b, ea)
        });
        t[0x85] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_sta(b, ea)
        });
        t[0x86] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_stx(b, ea)
        });
        t[0x87] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_sta(b, ea)
        });
        t[0x88] = Some(|c, _| c.op_dey());
        t[0x89] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_bit_imm(b, ea)
        });
        t[0x8A] = Some(|c, _| c.op_txa());
        t[0x8B] = Some(|c, b| c.op_phb(b));
        t[0x8C] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_sty(b, ea)
        });
        t[0x8D] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_sta(b, ea)
        });
        t[0x8E] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_stx(b, ea)
        });
        t[0x8F] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_sta(b, ea)
        });

        // 0x90 - 0x9F
        t[0x90] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, !c.p.is_set(C))
        });
        t[0x91] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_sta(b, ea)
        });
        t[0x92] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_sta(b, ea)
        });
        t[0x93] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_sta(b, ea)
        });
        t[0x94] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_sty(b, ea)
        });
        t[0x95] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_sta(b, ea)
        });
        t[0x96] = Some(|c, b| {
            let ea = c.am_direct_y(b)?;
            c.op_stx(b, ea)
        });
        t[0x97] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_sta(b, ea)
        });
        t[0x98] = Some(|c, _| c.op_tya());
        t[0x99] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_sta(b, ea)
        });
        t[0x9A] = Some(|c, _| c.op_txs());
        t[0x9B] = Some(|c, _| c.op_txy());
        t[0x9C] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_stz(b, ea)
        });
        t[0x9D] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_sta(b, ea)
        });
        t[0x9E] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_stz(b, ea)
        });
        t[0x9F] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_sta(b, ea)
        });

        // 0xA0 - 0xAF
        t[0xA0] = Some(|c, b| {
            let ea = c.am_immediate_x();
            c.op_ldy(b, ea)
        });
        t[0xA1] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_lda(b, ea)
        });
        t[0xA2] = Some(|c, b| {
            let ea = c.am_immediate_x();
            c.op_ldx(b, ea)
        });
        t[0xA3] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_lda(b, ea)
        });
        t[0xA4] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_ldy(b, ea)
        });
        t[0xA5] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_lda(b, ea)
        });
        t[0xA6] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_ldx(b, ea)
        });
        t[0xA7] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_lda(b, ea)
        });
        t[0xA8] = Some(|c, _| c.op_tay());
        t[0xA9] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_lda(b, ea)
        });
        t[0xAA] = Some(|c, _| c.op_tax());
        t[0xAB] = Some(|c, b| c.op_plb(b));
        t[0xAC] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_ldy(b, ea)
        });
        t[0xAD] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_lda(b, ea)
        });
        t[0xAE] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_ldx(b, ea)
        });
        t[0xAF] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_lda(b, ea)
        });

        // 0xB0 - 0xBF
        t[0xB0] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, c.p.is_set(C))
        });
        t[0xB1] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_lda(b, ea)
        });
        t[0xB2] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_lda(b, ea)
        });
        t[0xB3] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_lda(b, ea)
        });
        t[0xB4] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_ldy(b, ea)
        });
        t[0xB5] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_lda(b, ea)
        });
        t[0xB6] = Some(|c, b| {
            let ea = c.am_direct_y(b)?;
            c.op_ldx(b, ea)
        });
        t[0xB7] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_lda(b, ea)
        });
        t[0xB8] = Some(|c, _| c.op_set_flag(V, false));
        t[0xB9] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_lda(b, ea)
        });
        t[0xBA] = Some(|c, _| c.op_tsx());
        t[0xBB] = Some(|c, _| c.op_tyx());
        t[0xBC] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_ldy(b, ea)
        });
        t[0xBD] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_lda(b, ea)
        });
        t[0xBE] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_ldx(b, ea)
        });
        t[0xBF] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_lda(b, ea)
        });

        // 0xC0 - 0xCF
        t[0xC0] = Some(|c, b| {
            let ea = c.am_immediate_x();
            c.op_cpy(b, ea)
        });
        t[0xC1] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_cmp(b, ea)
        });
        t[0xC2] = Some(|c, b| {
            let ea = c.am_immediate_byte();
            c.op_rep(b, ea)
        });
        t[0xC3] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_cmp(b, ea)
        });
        t[0xC4] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_cpy(b, ea)
        });
        t[0xC5] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_cmp(b, ea)
        });
        t[0xC6] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_dec(b, ea)
        });
        t[0xC7] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_cmp(b, ea)
        });
        t[0xC8] = Some(|c, _| c.op_iny());
        t[0xC9] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_cmp(b, ea)
        });
        t[0xCA] = Some(|c, _| c.op_dex());
        t[0xCB] = Some(|c, _| c.op_wai());
        t[0xCC] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_cpy(b, ea)
        });
        t[0xCD] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_cmp(b, ea)
        });
        t[0xCE] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_dec(b, ea)
        });
        t[0xCF] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_cmp(b, ea)
        });

        // 0xD0 - 0xDF
        t[0xD0] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, !c.p.is_set(Z))
        });
        t[0xD1] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_cmp(b, ea)
        });
        t[0xD2] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_cmp(b, ea)
        });
        t[0xD3] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_cmp(b, ea)
        });
        t[0xD4] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_pei(b, ea)
        });
        t[0xD5] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_cmp(b, ea)
        });
        t[0xD6] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_dec(b, ea)
        });
        t[0xD7] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_cmp(b, ea)
        });
        t[0xD8] = Some(|c, _| c.op_set_flag(D, false));
        t[0xD9] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_cmp(b, ea)
        });
        t[0xDA] = Some(|c, b| c.op_phx(b));
        t[0xDB] = Some(|c, _| c.op_stp());
        t[0xDC] = Some(|c, b| {
            let tgt = c.am_absolute_indirect_long(b)?;
            c.op_jmp(tgt)
        });
        t[0xDD] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_cmp(b, ea)
        });
        t[0xDE] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_dec(b, ea)
        });
        t[0xDF] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_cmp(b, ea)
        });

        // 0xE0 - 0xEF
        t[0xE0] = Some(|c, b| {
            let ea = c.am_immediate_x();
            c.op_cpx(b, ea)
        });
        t[0xE1] = Some(|c, b| {
            let ea = c.am_direct_x_indirect(b)?;
            c.op_sbc(b, ea)
        });
        t[0xE2] = Some(|c, b| {
            let ea = c.am_immediate_byte();
            c.op_sep(b, ea)
        });
        t[0xE3] = Some(|c, b| {
            let ea = c.am_stack_relative(b)?;
            c.op_sbc(b, ea)
        });
        t[0xE4] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_cpx(b, ea)
        });
        t[0xE5] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_sbc(b, ea)
        });
        t[0xE6] = Some(|c, b| {
            let ea = c.am_direct(b)?;
            c.op_inc(b, ea)
        });
        t[0xE7] = Some(|c, b| {
            let ea = c.am_direct_indirect_long(b)?;
            c.op_sbc(b, ea)
        });
        t[0xE8] = Some(|c, _| c.op_inx());
        t[0xE9] = Some(|c, b| {
            let ea = c.am_immediate_m();
            c.op_sbc(b, ea)
        });
        t[0xEA] = Some(|c, _| c.op_nop());
        t[0xEB] = Some(|c, _| c.op_xba());
        t[0xEC] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_cpx(b, ea)
        });
        t[0xED] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_sbc(b, ea)
        });
        t[0xEE] = Some(|c, b| {
            let ea = c.am_absolute(b)?;
            c.op_inc(b, ea)
        });
        t[0xEF] = Some(|c, b| {
            let ea = c.am_absolute_long(b)?;
            c.op_sbc(b, ea)
        });

        // 0xF0 - 0xFF
        t[0xF0] = Some(|c, b| {
            let tgt = c.am_relative(b)?;
            c.op_branch(tgt, c.p.is_set(Z))
        });
        t[0xF1] = Some(|c, b| {
            let ea = c.am_direct_indirect_y(b)?;
            c.op_sbc(b, ea)
        });
        t[0xF2] = Some(|c, b| {
            let ea = c.am_direct_indirect(b)?;
            c.op_sbc(b, ea)
        });
        t[0xF3] = Some(|c, b| {
            let ea = c.am_stack_relative_indirect_y(b)?;
            c.op_sbc(b, ea)
        });
        t[0xF4] = Some(|c, b| {
            let ea = c.am_immediate_word();
            c.op_pea(b, ea)
        });
        t[0xF5] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_sbc(b, ea)
        });
        t[0xF6] = Some(|c, b| {
            let ea = c.am_direct_x(b)?;
            c.op_inc(b, ea)
        });
        t[0xF7] = Some(|c, b| {
            let ea = c.am_direct_indirect_long_y(b)?;
            c.op_sbc(b, ea)
        });
        t[0xF8] = Some(|c, _| c.op_set_flag(D, true));
        t[0xF9] = Some(|c, b| {
            let ea = c.am_absolute_y(b)?;
            c.op_sbc(b, ea)
        });
        t[0xFA] = Some(|c, b| c.op_plx(b));
        t[0xFB] = Some(|c, _| c.op_xce());
        t[0xFC] = Some(|c, b| {
            let tgt = c.am_absolute_x_indirect(b)?;
            c.op_jsr(b, tgt)
        });
        t[0xFD] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_sbc(b, ea)
        });
        t[0xFE] = Some(|c, b| {
            let ea = c.am_absolute_x(b)?;
            c.op_inc(b, ea)
        });
        t[0xFF] = Some(|c, b| {
            let ea = c.am_absolute_long_x(b)?;
            c.op_sbc(b, ea)
        });

        t
    };
}

#[cfg(test)]
mod tests {
    use super::Dispatch;
    use crate::test_bus::TestBus;

    #[test]
    fn only_wdm_is_unassigned() {
        let table = &Dispatch::<TestBus>::TABLE;
        for (opcode, entry) in table.iter().enumerate() {
            if opcode == 0x42 {
                assert!(entry.is_none());
            } else {
                assert!(entry.is_some(), "opcode {opcode:#04X} missing");
            }
        }
    }
}
