//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports, two 16-bit down-counting
//! timers and an interrupt controller. Here it is the single interrupt
//! source of the board: Timer 1 drives periodic interrupts (one-shot or
//! free-running), and a byte-oriented peripheral attached to port A
//! signals incoming data through the CA1 line.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                              |
//! |-----|------|------------------------------------------|
//! | $0  | ORB  | Port B data (handshake on read)          |
//! | $1  | ORA  | Port A data (handshake on read)          |
//! | $2  | DDRB | Port B data direction (1 = output)       |
//! | $3  | DDRA | Port A data direction (1 = output)       |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1)   |
//! | $6  | T1LL | Timer 1 latch low                        |
//! | $7  | T1LH | Timer 1 latch high                       |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2)   |
//! | $A  | SR   | Shift register (storage only)            |
//! | $B  | ACR  | Auxiliary control register               |
//! | $C  | PCR  | Peripheral control register              |
//! | $D  | IFR  | Interrupt flag register                  |
//! | $E  | IER  | Interrupt enable register                |
//! | $F  | ORA  | Port A data (no handshake)               |

#![allow(clippy::cast_possible_truncation)]

use emu_core::HandshakeDevice;

/// MOS 6522 Versatile Interface Adapter.
pub struct Via6522 {
    /// Port A input latch, refreshed from the attached device.
    ira: u8,
    /// Port A output register.
    ora: u8,
    /// Port B output register.
    orb: u8,
    /// Port A data direction register (1 = output).
    ddr_a: u8,
    /// Port B data direction register (1 = output).
    ddr_b: u8,
    /// External input lines for port B (active-high, directly readable).
    pub external_b: u8,

    /// Timer 1 counter (16-bit, counts down).
    timer1_counter: u16,
    /// Timer 1 latch, reloaded into the counter on free-run underflow.
    timer1_latch: u16,
    /// Timer 1 is active. In one-shot mode, clears after first underflow.
    timer1_running: bool,

    /// Timer 2 counter (16-bit, counts down, always one-shot).
    timer2_counter: u16,
    /// Timer 2 latch low byte (only the low byte is latched).
    timer2_latch_lo: u8,
    /// Timer 2 is active.
    timer2_running: bool,

    /// Shift register. Stored and readable but never shifted.
    shift_register: u8,

    /// Auxiliary control register (ACR).
    /// Bit 6: T1 control (0 = one-shot, 1 = free-run)
    acr: u8,

    /// Peripheral control register (PCR).
    /// Bit 4: CB1 edge (0 = negative, 1 = positive)
    /// Bit 0: CA1 edge (0 = negative, 1 = positive)
    pcr: u8,

    /// Interrupt flag register (IFR). Bit 7 is computed on read.
    ifr: u8,

    /// Interrupt enable register (IER).
    /// Same bit layout as IFR (bit 7 = set/clear control on write).
    ier: u8,

    /// Previous CA1 input state (for edge detection).
    ca1_prev: bool,
    /// Previous CB1 input state (for edge detection).
    cb1_prev: bool,

    /// Byte device on port A. Its data-ready line feeds CA1.
    port_a: Option<Box<dyn HandshakeDevice>>,
}

impl Via6522 {
    /// Create a new VIA with all registers in their reset state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ira: 0,
            ora: 0,
            orb: 0,
            ddr_a: 0,
            ddr_b: 0,
            external_b: 0xFF,
            timer1_counter: 0xFFFF,
            timer1_latch: 0xFFFF,
            timer1_running: false,
            timer2_counter: 0xFFFF,
            timer2_latch_lo: 0xFF,
            timer2_running: false,
            shift_register: 0,
            acr: 0,
            pcr: 0,
            ifr: 0,
            ier: 0,
            ca1_prev: false,
            cb1_prev: false,
            port_a: None,
        }
    }

    /// Attach a byte device to port A.
    ///
    /// The device's data-ready line is sampled every tick and drives
    /// CA1; ORA handshake reads pull a byte from it, ORA writes push
    /// one to it.
    pub fn attach_port_a(&mut self, device: Box<dyn HandshakeDevice>) {
        self.port_a = Some(device);
    }

    /// Tick the VIA for one clock cycle.
    ///
    /// Counts down timers, sets interrupt flags on underflow, and
    /// samples the port A device's data-ready line into CA1.
    pub fn tick(&mut self) {
        self.tick_timer1();
        self.tick_timer2();
        let level = self.port_a.as_ref().map(|device| device.data_ready());
        if let Some(level) = level {
            self.set_ca1(level);
        }
    }

    /// Advance the VIA by a whole instruction's worth of cycles.
    pub fn phi2(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// Check if the VIA has an active (and enabled) interrupt.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        (self.ifr & self.ier & 0x7F) != 0
    }

    /// Read a VIA register.
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x0F {
            0x00 => {
                // ORB: Port B data (with handshake - clears CB1/CB2 flags)
                self.ifr &= !(IFR_CB1 | IFR_CB2);
                self.read_port_b()
            }
            0x01 => {
                // ORA: Port A data (with handshake - clears CA1/CA2
                // flags and accepts the pending device byte)
                self.ifr &= !(IFR_CA1 | IFR_CA2);
                if let Some(device) = self.port_a.as_mut() {
                    if device.data_ready() {
                        self.ira = device.read_byte();
                    }
                }
                self.ira
            }
            0x02 => self.ddr_b,
            0x03 => self.ddr_a,
            0x04 => {
                // T1C-L: read low byte AND clear T1 interrupt flag
                self.ifr &= !IFR_T1;
                self.timer1_counter as u8
            }
            0x05 => (self.timer1_counter >> 8) as u8,
            0x06 => self.timer1_latch as u8,
            0x07 => (self.timer1_latch >> 8) as u8,
            0x08 => {
                // T2C-L: read low byte AND clear T2 interrupt flag
                self.ifr &= !IFR_T2;
                self.timer2_counter as u8
            }
            0x09 => (self.timer2_counter >> 8) as u8,
            0x0A => self.shift_register,
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => {
                // IFR: bit 7 reflects whether any enabled interrupt is active
                let irq_any = if self.irq_active() { 0x80 } else { 0 };
                (self.ifr & 0x7F) | irq_any
            }
            0x0E => {
                // IER: bit 7 always reads as 1
                self.ier | 0x80
            }
            0x0F => {
                // ORA no-handshake: last accepted byte, flags untouched
                self.ira
            }
            _ => 0xFF,
        }
    }

    /// Write a VIA register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x0F {
            0x00 => {
                // ORB: Port B data (with handshake - clears CB1/CB2 flags)
                self.ifr &= !(IFR_CB1 | IFR_CB2);
                self.orb = value;
            }
            0x01 => {
                // ORA: Port A data (with handshake - clears CA1/CA2
                // flags and sends the byte to the attached device)
                self.ifr &= !(IFR_CA1 | IFR_CA2);
                self.ora = value;
                if let Some(device) = self.port_a.as_mut() {
                    device.write_byte(value);
                }
            }
            0x02 => self.ddr_b = value,
            0x03 => self.ddr_a = value,
            0x04 => {
                // T1L-L: write latch low byte
                self.timer1_latch = (self.timer1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                // T1C-H: write latch high byte, load counter from latch,
                // start timer, clear T1 interrupt flag.
                self.timer1_latch = (self.timer1_latch & 0x00FF) | (u16::from(value) << 8);
                self.timer1_counter = self.timer1_latch;
                self.timer1_running = true;
                self.ifr &= !IFR_T1;
            }
            0x06 => {
                self.timer1_latch = (self.timer1_latch & 0xFF00) | u16::from(value);
            }
            0x07 => {
                // T1L-H: write latch high byte only, clear T1 interrupt flag
                self.timer1_latch = (self.timer1_latch & 0x00FF) | (u16::from(value) << 8);
                self.ifr &= !IFR_T1;
            }
            0x08 => self.timer2_latch_lo = value,
            0x09 => {
                // T2C-H: load counter (high from value, low from latch),
                // start timer, clear T2 interrupt flag.
                self.timer2_counter = u16::from(self.timer2_latch_lo) | (u16::from(value) << 8);
                self.timer2_running = true;
                self.ifr &= !IFR_T2;
            }
            0x0A => self.shift_register = value,
            0x0B => self.acr = value,
            0x0C => self.pcr = value,
            0x0D => {
                // IFR: writing 1s clears the corresponding flags
                self.ifr &= !value;
            }
            0x0E => {
                // IER: bit 7 selects set (1) or clear (0) mode
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !(value & 0x7F);
                }
            }
            0x0F => {
                // ORA no-handshake: no flag clears, no device traffic
                self.ora = value;
            }
            _ => {}
        }
    }

    /// Set the CA1 input line. Triggers on the edge PCR bit 0 selects.
    pub fn set_ca1(&mut self, state: bool) {
        let positive_edge = self.pcr & 0x01 != 0;
        let triggered = if positive_edge {
            !self.ca1_prev && state
        } else {
            self.ca1_prev && !state
        };
        if triggered {
            self.ifr |= IFR_CA1;
        }
        self.ca1_prev = state;
    }

    /// Set the CB1 input line. Triggers on the edge PCR bit 4 selects.
    pub fn set_cb1(&mut self, state: bool) {
        let positive_edge = self.pcr & 0x10 != 0;
        let triggered = if positive_edge {
            !self.cb1_prev && state
        } else {
            self.cb1_prev && !state
        };
        if triggered {
            self.ifr |= IFR_CB1;
        }
        self.cb1_prev = state;
    }

    /// Current IFR value (diagnostic use; no side effects).
    #[must_use]
    pub fn ifr(&self) -> u8 {
        self.ifr
    }

    /// Current IER value (diagnostic use).
    #[must_use]
    pub fn ier(&self) -> u8 {
        self.ier
    }

    /// Timer 1 counter value.
    #[must_use]
    pub fn timer1_counter(&self) -> u16 {
        self.timer1_counter
    }

    /// Timer 2 counter value.
    #[must_use]
    pub fn timer2_counter(&self) -> u16 {
        self.timer2_counter
    }

    // --- Internal helpers ---

    fn read_port_b(&self) -> u8 {
        (self.orb & self.ddr_b) | (self.external_b & !self.ddr_b)
    }

    fn tick_timer1(&mut self) {
        if !self.timer1_running {
            return;
        }

        let (new_val, underflow) = self.timer1_counter.overflowing_sub(1);
        self.timer1_counter = new_val;

        if underflow {
            self.ifr |= IFR_T1;
            if self.acr & 0x40 != 0 {
                // Free-run: reload from latch and keep going
                self.timer1_counter = self.timer1_latch;
            } else {
                self.timer1_running = false;
            }
        }
    }

    fn tick_timer2(&mut self) {
        if !self.timer2_running {
            return;
        }

        let (new_val, underflow) = self.timer2_counter.overflowing_sub(1);
        self.timer2_counter = new_val;

        if underflow {
            // Timer 2 is always one-shot
            self.ifr |= IFR_T2;
            self.timer2_running = false;
        }
    }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

// IFR/IER bit masks
const IFR_CA2: u8 = 0x01;
const IFR_CA1: u8 = 0x02;
const IFR_CB2: u8 = 0x08;
const IFR_CB1: u8 = 0x10;
const IFR_T2: u8 = 0x20;
const IFR_T1: u8 = 0x40;
