//! Machine front end: reset, stepping policy, breakpoints, observer.

use std::collections::HashSet;

use log::{debug, trace};
use wdc_65c816::{Cpu, CpuError, addr24, opcodes};

use crate::bus::SbcBus;
use crate::fifo::SharedFifo;
use crate::rom::Rom;

/// Why `run` returned before consuming the whole budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Execution reached a breakpoint address.
    Breakpoint(u32),
    /// The instruction budget ran out with the machine still live.
    BudgetExhausted,
    /// The CPU executed STP.
    Halted,
}

/// State observer, called once per public stepping call.
pub type Observer = Box<dyn FnMut(&Cpu)>;

/// The assembled machine.
///
/// Owns the CPU and bus, and layers debugger policy on top of raw
/// stepping: breakpoints, step-over/step-out, an observer callback,
/// and host access to the FIFO attached to the VIA's port A.
pub struct System {
    pub bus: SbcBus,
    pub cpu: Cpu,
    breakpoints: HashSet<u32>,
    observer: Option<Observer>,
    fifo: SharedFifo,
}

impl System {
    #[must_use]
    pub fn new() -> Self {
        Self::build(Cpu::new())
    }

    /// A system whose CPU starts with a seeded random stack pointer.
    #[must_use]
    pub fn with_stack_seed(seed: u64) -> Self {
        Self::build(Cpu::with_stack_seed(seed))
    }

    fn build(cpu: Cpu) -> Self {
        let mut bus = SbcBus::new();
        let fifo = SharedFifo::new();
        bus.via.attach_port_a(Box::new(fifo.clone()));
        Self {
            bus,
            cpu,
            breakpoints: HashSet::new(),
            observer: None,
            fifo,
        }
    }

    /// Host side of the FIFO on the VIA's port A.
    #[must_use]
    pub fn fifo(&self) -> &SharedFifo {
        &self.fifo
    }

    pub fn load_rom(&mut self, rom: Rom) {
        self.bus.load_rom(rom);
    }

    /// Reset the CPU through the vector in the current ROM.
    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.cpu.reset(&mut self.bus)?;
        debug!("reset: pc={:04X}", self.cpu.regs.pc.word());
        self.notify();
        Ok(())
    }

    /// Execute one instruction and notify the observer.
    pub fn step(&mut self) -> Result<u8, CpuError> {
        let opcode = self.step_quiet()?;
        self.notify();
        Ok(opcode)
    }

    /// Execute up to `n` instructions; the observer fires once at the
    /// end, not per instruction.
    pub fn step_n(&mut self, n: u64) -> Result<(), CpuError> {
        let result = (0..n).try_for_each(|_| self.step_quiet().map(|_| ()));
        self.notify();
        result
    }

    /// Run until a breakpoint, STP, or `budget` instructions.
    pub fn run(&mut self, budget: u64) -> Result<StopReason, CpuError> {
        let result = self.run_quiet(budget);
        self.notify();
        result
    }

    fn run_quiet(&mut self, budget: u64) -> Result<StopReason, CpuError> {
        for _ in 0..budget {
            self.step_quiet()?;
            if self.cpu.stopped() {
                debug!("halted at pc={:04X}", self.cpu.regs.pc.word());
                return Ok(StopReason::Halted);
            }
            let pc = self.pc24();
            if self.breakpoints.contains(&pc) {
                debug!("breakpoint hit at {pc:#06X}");
                return Ok(StopReason::Breakpoint(pc));
            }
        }
        Ok(StopReason::BudgetExhausted)
    }

    /// Step one instruction, treating a subroutine call as one unit:
    /// after JSR/JSL the machine runs on until the call returns.
    pub fn step_over(&mut self) -> Result<(), CpuError> {
        let depth = self.cpu.call_depth();
        let opcode = self.step_quiet()?;
        let is_call = matches!(
            opcode,
            opcodes::JSR_ABS | opcodes::JSL | opcodes::JSR_ABS_X_IND
        );
        if is_call {
            while self.cpu.call_depth() > depth && !self.cpu.stopped() {
                self.step_quiet()?;
            }
        }
        self.notify();
        Ok(())
    }

    /// Run until the current subroutine returns.
    ///
    /// At the outermost frame this is a single step.
    pub fn step_out(&mut self) -> Result<(), CpuError> {
        let depth = self.cpu.call_depth();
        self.step_quiet()?;
        if depth > 1 {
            while self.cpu.call_depth() >= depth && !self.cpu.stopped() {
                self.step_quiet()?;
            }
        }
        self.notify();
        Ok(())
    }

    pub fn add_breakpoint(&mut self, addr: u32) {
        self.breakpoints.insert(addr);
    }

    pub fn remove_breakpoint(&mut self, addr: u32) {
        self.breakpoints.remove(&addr);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    #[must_use]
    pub fn breakpoints(&self) -> &HashSet<u32> {
        &self.breakpoints
    }

    pub fn set_observer(&mut self, observer: Observer) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn pc24(&self) -> u32 {
        addr24(self.cpu.regs.pbr.byte(), self.cpu.regs.pc.word())
    }

    fn step_quiet(&mut self) -> Result<u8, CpuError> {
        // One access record per instruction.
        self.bus.ram.clear_access();
        let opcode = self.cpu.step(&mut self.bus)?;
        trace!(
            "step: op={opcode:02X} pc={:04X} cycles={}",
            self.cpu.regs.pc.word(),
            self.cpu.cycles
        );
        Ok(opcode)
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.cpu);
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn booted(program: &[u8]) -> System {
        let mut system = System::new();
        system.load_rom(Rom::with_program(program));
        system.reset().unwrap();
        system
    }

    #[test]
    fn run_stops_at_a_breakpoint() {
        // NOP; NOP; NOP
        let mut system = booted(&[0xEA, 0xEA, 0xEA]);
        system.add_breakpoint(0xC002);
        let reason = system.run(100).unwrap();
        assert_eq!(reason, StopReason::Breakpoint(0xC002));
        assert_eq!(system.cpu.regs.pc.word(), 0xC002);
    }

    #[test]
    fn run_reports_halt_on_stp() {
        let mut system = booted(&[0xEA, 0xDB]);
        assert_eq!(system.run(100).unwrap(), StopReason::Halted);
    }

    #[test]
    fn run_exhausts_its_budget() {
        let mut system = booted(&[0xEA, 0xEA, 0xEA, 0xDB]);
        assert_eq!(system.run(2).unwrap(), StopReason::BudgetExhausted);
    }

    #[test]
    fn step_over_skips_the_subroutine_body() {
        // JSR $C010; STP ... $C010: INX; RTS
        let mut program = vec![0x20, 0x10, 0xC0, 0xDB];
        program.resize(0x10, 0xEA);
        program.extend_from_slice(&[0xE8, 0x60]);
        let mut system = booted(&program);

        system.step_over().unwrap();
        // Returned past the call; X was incremented inside.
        assert_eq!(system.cpu.regs.pc.word(), 0xC003);
        assert_eq!(system.cpu.regs.x.byte(), 1);
    }

    #[test]
    fn step_out_returns_to_the_caller() {
        // JSR $C010; STP ... $C010: INX; INX; RTS
        let mut program = vec![0x20, 0x10, 0xC0, 0xDB];
        program.resize(0x10, 0xEA);
        program.extend_from_slice(&[0xE8, 0xE8, 0x60]);
        let mut system = booted(&program);

        system.step().unwrap(); // into the subroutine
        assert_eq!(system.cpu.call_depth(), 2);
        system.step_out().unwrap();
        assert_eq!(system.cpu.call_depth(), 1);
        assert_eq!(system.cpu.regs.pc.word(), 0xC003);
    }

    #[test]
    fn observer_fires_once_per_call() {
        let mut system = booted(&[0xEA, 0xEA, 0xEA, 0xEA]);
        let count = Rc::new(Cell::new(0u32));
        let seen = count.clone();
        system.set_observer(Box::new(move |_| seen.set(seen.get() + 1)));

        system.step().unwrap();
        assert_eq!(count.get(), 1);
        system.step_n(3).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn access_record_reflects_only_the_last_instruction() {
        // LDA #$42; STA $10; NOP
        let mut system = booted(&[0xA9, 0x42, 0x85, 0x10, 0xEA]);
        system.step().unwrap();
        system.step().unwrap();
        let access = system.bus.ram.last_access().unwrap();
        assert_eq!(access.addr, 0x10);
        system.step().unwrap(); // NOP touches no RAM
        assert_eq!(system.bus.ram.last_access(), None);
    }
}
