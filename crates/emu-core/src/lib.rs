//! Core traits and types for 65C816 system emulation.
//!
//! Every component on the bus — RAM, ROM, peripherals, and the address
//! decoder itself — speaks the same [`Bus`] interface. Timing flows the
//! other way: after each instruction the CPU hands the consumed cycle
//! count back to the bus, which fans it out to clock-sensitive
//! peripherals via `phi2`.

mod bus;
mod handshake;
mod observable;

pub use bus::{Bus, BusError, BusResult};
pub use handshake::HandshakeDevice;
pub use observable::{Observable, Value};
