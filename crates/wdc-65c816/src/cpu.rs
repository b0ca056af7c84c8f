//! CPU state and the instruction stepping loop.

use emu_core::{Bus, BusError, Observable, Value};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::addr24;
use crate::dispatch::Dispatch;
use crate::registers::Registers;
use crate::status::{self, Status};

/// Address of the reset vector (low byte; high byte follows).
pub const RESET_VECTOR: u32 = 0x00_FFFC;

/// Fatal execution failures.
///
/// None of these is recoverable at the instruction level. The run loop
/// must stop rather than skip the faulting instruction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// Bus access failed (unmapped address or ROM write).
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Opcode byte has no defined handler.
    #[error("unknown opcode {opcode:#04X} at {pc:#08X}")]
    UnknownOpcode { opcode: u8, pc: u32 },

    /// Decode succeeded but the operation is deliberately unimplemented.
    #[error("unimplemented operation: {name}")]
    Unimplemented { name: &'static str },
}

/// One subroutine-call record, pushed on JSR/JSL and popped on RTS/RTL.
///
/// Maintained for external stack-trace reconstruction only; execution
/// never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// Address the subroutine was entered at.
    pub entry: u32,
    /// Address of the pending call site, while a nested call is live.
    pub exit: Option<u32>,
}

/// The WDC 65C816 CPU.
///
/// `step()` executes exactly one instruction: fetch the opcode at
/// PBR:PC, dispatch, resolve the addressing mode, perform the
/// operation, then hand the consumed cycle delta to the bus via
/// `phi2` and latch the bus interrupt line.
#[derive(Debug)]
pub struct Cpu {
    /// Register file.
    pub regs: Registers,

    /// Processor status flags.
    pub p: Status,

    /// Emulation mode flag. True after reset; XCE swaps it with carry.
    pub e: bool,

    /// Total cycles consumed since reset.
    pub cycles: u64,

    /// Interrupt line state latched from the bus after the last step.
    irq_pending: bool,

    /// WAI latch - the CPU idles until the bus asserts an interrupt.
    waiting: bool,

    /// STP latch - the CPU is halted until reset.
    stopped: bool,

    call_trace: Vec<CallFrame>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Create a CPU with a fixed stack pointer (fully deterministic).
    #[must_use]
    pub fn new() -> Self {
        Self::with_stack_init(0x01FD)
    }

    /// Create a CPU with a seeded random stack pointer low byte.
    ///
    /// Randomizing S flushes out code that uses the stack before
    /// initializing it; the seed keeps test runs reproducible.
    #[must_use]
    pub fn with_stack_seed(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let low: u16 = rng.gen_range(0..=0xFF);
        Self::with_stack_init(0x0100 | low)
    }

    fn with_stack_init(stack_init: u16) -> Self {
        Self {
            regs: Registers::new(stack_init),
            p: Status::reset(),
            e: true,
            cycles: 0,
            irq_pending: false,
            waiting: false,
            stopped: false,
            call_trace: Vec::new(),
        }
    }

    /// Reset the CPU and load PC from the reset vector.
    ///
    /// Registers, flags and the cycle counter are reinitialized; memory
    /// is left untouched.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.cycles = 0;
        self.regs.reset();
        self.p = Status::reset();
        self.e = true;
        self.irq_pending = false;
        self.waiting = false;
        self.stopped = false;

        self.cycles += 7;
        let vector = bus.read_word(RESET_VECTOR)?;
        self.regs.pc.set_word(vector);
        self.call_trace.clear();
        self.call_trace.push(CallFrame {
            entry: u32::from(vector),
            exit: None,
        });
        Ok(())
    }

    /// Execute one instruction. Returns the opcode that was executed.
    ///
    /// After the handler runs, the bus is clocked once with the cycle
    /// delta attributable to this instruction, so peripheral side
    /// effects become visible to the next instruction.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u8, CpuError> {
        if self.stopped {
            return Ok(crate::opcodes::STP);
        }
        if self.waiting {
            if bus.irq_pending() {
                self.waiting = false;
            } else {
                self.cycles += 1;
                bus.phi2(1);
                self.irq_pending = bus.irq_pending();
                return Ok(crate::opcodes::WAI);
            }
        }

        let pc = addr24(self.regs.pbr.byte(), self.regs.pc.word());
        let opcode = bus.read(pc)?;
        self.advance_pc(1);

        let before = self.cycles;
        match Dispatch::<B>::TABLE[opcode as usize] {
            Some(handler) => handler(self, bus)?,
            None => return Err(CpuError::UnknownOpcode { opcode, pc }),
        }

        bus.phi2(self.cycles - before);
        self.irq_pending = bus.irq_pending();
        Ok(opcode)
    }

    /// Interrupt line state after the most recent step.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// True while the CPU is parked on a WAI instruction.
    #[must_use]
    pub fn waiting(&self) -> bool {
        self.waiting
    }

    /// True after STP; only reset() clears it.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// The current subroutine-call trace, outermost frame first.
    #[must_use]
    pub fn call_trace(&self) -> &[CallFrame] {
        &self.call_trace
    }

    /// Current call nesting depth.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.call_trace.len()
    }

    // --- Width rules ---

    pub(crate) fn a_is_byte(&self) -> bool {
        self.e || self.p.is_set(status::M)
    }

    pub(crate) fn index_is_byte(&self) -> bool {
        self.e || self.p.is_set(status::X)
    }

    pub(crate) fn advance_pc(&mut self, n: u16) {
        let pc = self.regs.pc.word().wrapping_add(n);
        self.regs.pc.set_word(pc);
    }

    // --- Stack discipline ---
    //
    // Push/pull always target bank 0. In emulation mode S wraps within
    // the low byte (page 1 fixed); in native mode it wraps as a full
    // 16-bit value.

    pub(crate) fn push_byte<B: Bus>(&mut self, bus: &mut B, value: u8) -> Result<(), CpuError> {
        bus.write(addr24(0, self.regs.s.word()), value)?;
        if self.e {
            let low = self.regs.s.byte().wrapping_sub(1);
            let high = (self.regs.s.word() >> 8) as u8;
            self.regs.s.set_word(u16::from_le_bytes([low, high]));
        } else {
            let s = self.regs.s.word().wrapping_sub(1);
            self.regs.s.set_word(s);
        }
        Ok(())
    }

    pub(crate) fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) -> Result<(), CpuError> {
        self.push_byte(bus, (value >> 8) as u8)?;
        self.push_byte(bus, value as u8)
    }

    pub(crate) fn pull_byte<B: Bus>(&mut self, bus: &mut B) -> Result<u8, CpuError> {
        if self.e {
            let low = self.regs.s.byte().wrapping_add(1);
            let high = (self.regs.s.word() >> 8) as u8;
            self.regs.s.set_word(u16::from_le_bytes([low, high]));
        } else {
            let s = self.regs.s.word().wrapping_add(1);
            self.regs.s.set_word(s);
        }
        Ok(bus.read(addr24(0, self.regs.s.word()))?)
    }

    pub(crate) fn pull_word<B: Bus>(&mut self, bus: &mut B) -> Result<u16, CpuError> {
        let low = self.pull_byte(bus)?;
        let high = self.pull_byte(bus)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    // --- Call trace maintenance ---

    pub(crate) fn set_call_exit(&mut self, addr: u32) {
        if let Some(frame) = self.call_trace.last_mut() {
            frame.exit = Some(addr);
        }
    }

    pub(crate) fn push_call(&mut self, entry: u32) {
        self.call_trace.push(CallFrame { entry, exit: None });
    }

    pub(crate) fn pop_call(&mut self) {
        self.call_trace.pop();
        if let Some(frame) = self.call_trace.last_mut() {
            frame.exit = None;
        }
    }

    // --- WAI/STP latches (set by the operation handlers) ---

    pub(crate) fn enter_wait(&mut self) {
        self.waiting = true;
    }

    pub(crate) fn enter_stop(&mut self) {
        self.stopped = true;
    }
}

impl Observable for Cpu {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.word().into()),
            "pbr" => Some(self.regs.pbr.byte().into()),
            "dbr" => Some(self.regs.dbr.byte().into()),
            "dp" => Some(self.regs.dp.word().into()),
            "s" => Some(self.regs.s.word().into()),
            "a.byte" => Some(self.regs.a.byte().into()),
            "a.word" => Some(self.regs.a.word().into()),
            "x.byte" => Some(self.regs.x.byte().into()),
            "x.word" => Some(self.regs.x.word().into()),
            "y.byte" => Some(self.regs.y.byte().into()),
            "y.word" => Some(self.regs.y.word().into()),
            "p" => Some(self.p.0.into()),
            "p.c" => Some(self.p.is_set(status::C).into()),
            "p.z" => Some(self.p.is_set(status::Z).into()),
            "p.i" => Some(self.p.is_set(status::I).into()),
            "p.d" => Some(self.p.is_set(status::D).into()),
            "p.x" => Some(self.p.is_set(status::X).into()),
            "p.m" => Some(self.p.is_set(status::M).into()),
            "p.v" => Some(self.p.is_set(status::V).into()),
            "p.n" => Some(self.p.is_set(status::N).into()),
            "e" => Some(self.e.into()),
            "cycles" => Some(self.cycles.into()),
            "irq_pending" => Some(self.irq_pending.into()),
            "waiting" => Some(self.waiting.into()),
            "stopped" => Some(self.stopped.into()),
            "call_depth" => Some((self.call_depth() as u64).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "pbr",
            "dbr",
            "dp",
            "s",
            "a.byte",
            "a.word",
            "x.byte",
            "x.word",
            "y.byte",
            "y.word",
            "p",
            "p.c",
            "p.z",
            "p.i",
            "p.d",
            "p.x",
            "p.m",
            "p.v",
            "p.n",
            "e",
            "cycles",
            "irq_pending",
            "waiting",
            "stopped",
            "call_depth",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_bus::TestBus;

    #[test]
    fn reset_loads_vector_and_state() {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();

        assert_eq!(cpu.regs.pc.word(), 0xC000);
        assert!(cpu.e);
        assert!(cpu.p.is_set(status::M));
        assert!(cpu.p.is_set(status::X));
        assert!(cpu.p.is_set(status::Z));
        assert!(!cpu.p.is_set(status::C));
        assert_eq!(cpu.cycles, 7);
        assert_eq!(cpu.call_depth(), 1);
        assert_eq!(cpu.call_trace()[0].entry, 0xC000);
    }

    #[test]
    fn stack_round_trip_restores_s() {
        let mut bus = TestBus::new();
        let mut cpu = Cpu::new();
        let s0 = cpu.regs.s.word();
        cpu.push_byte(&mut bus, 0x5A).unwrap();
        assert_eq!(cpu.pull_byte(&mut bus).unwrap(), 0x5A);
        assert_eq!(cpu.regs.s.word(), s0);
    }

    #[test]
    fn word_push_is_high_then_low() {
        let mut bus = TestBus::new();
        let mut cpu = Cpu::new();
        let s0 = cpu.regs.s.word();
        cpu.push_word(&mut bus, 0x1234).unwrap();
        // High byte lands at the original S, low byte below it.
        assert_eq!(bus.peek(u32::from(s0)), 0x12);
        assert_eq!(bus.peek(u32::from(s0) - 1), 0x34);
        assert_eq!(cpu.pull_word(&mut bus).unwrap(), 0x1234);
    }

    #[test]
    fn emulation_stack_wraps_within_page_one() {
        let mut bus = TestBus::new();
        let mut cpu = Cpu::new();
        cpu.regs.s.set_word(0x0100);
        cpu.push_byte(&mut bus, 0xAA).unwrap();
        assert_eq!(cpu.regs.s.word(), 0x01FF);
        assert_eq!(cpu.pull_byte(&mut bus).unwrap(), 0xAA);
        assert_eq!(cpu.regs.s.word(), 0x0100);
    }

    #[test]
    fn seeded_stack_pointer_is_reproducible() {
        let a = Cpu::with_stack_seed(7);
        let b = Cpu::with_stack_seed(7);
        assert_eq!(a.regs.s.word(), b.regs.s.word());
        assert_eq!(a.regs.s.word() & 0xFF00, 0x0100);
    }

    #[test]
    fn unknown_opcode_is_fatal() {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        bus.load(0xC000, &[0x42]); // WDM - reserved, no handler
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        let err = cpu.step(&mut bus).unwrap_err();
        assert_eq!(
            err,
            CpuError::UnknownOpcode {
                opcode: 0x42,
                pc: 0xC000
            }
        );
    }

    #[test]
    fn stopped_cpu_steps_without_side_effects() {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        bus.load(0xC000, &[0xDB]); // STP
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert!(cpu.stopped());
        let cycles = cpu.cycles;
        let pc = cpu.regs.pc.word();
        assert_eq!(cpu.step(&mut bus).unwrap(), 0xDB);
        assert_eq!(cpu.cycles, cycles);
        assert_eq!(cpu.regs.pc.word(), pc);
    }

    #[test]
    fn wai_idles_until_interrupt() {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        bus.load(0xC000, &[0xCB, 0xEA]); // WAI; NOP
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert!(cpu.waiting());

        // Idle step consumes one cycle and clocks the bus.
        let cycles = cpu.cycles;
        assert_eq!(cpu.step(&mut bus).unwrap(), 0xCB);
        assert_eq!(cpu.cycles, cycles + 1);
        assert!(cpu.waiting());

        // Interrupt wakes it; the next step executes the NOP.
        bus.irq = true;
        assert_eq!(cpu.step(&mut bus).unwrap(), 0xEA);
        assert!(!cpu.waiting());
    }

    #[test]
    fn phi2_fires_once_per_instruction_with_the_cycle_delta() {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        bus.load(0xC000, &[0xA9, 0x42]); // LDA #$42
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.phi2_calls, vec![2]);
    }

    #[test]
    fn query_reflects_register_state() {
        let mut bus = TestBus::new();
        bus.load(RESET_VECTOR, &[0x00, 0xC0]);
        bus.load(0xC000, &[0xA9, 0x42]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.query("a.byte"), Some(Value::U8(0x42)));
        assert_eq!(cpu.query("p.z"), Some(Value::Bool(false)));
        assert_eq!(cpu.query("bogus"), None);
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "path {path} must resolve");
        }
    }
}
