//! 65C816 single-board computer.
//!
//! Wires a [`wdc_65c816::Cpu`] to RAM, ROM and a [`mos_via_6522`] VIA
//! through an address-decoding bus, and exposes a debugger-oriented
//! [`System`] front end: reset, stepping (plain, step-over, step-out),
//! a cooperative run loop with breakpoints, and an observer hook.
//!
//! Memory map (bank 0 only):
//!
//! | Range           | Device        |
//! |-----------------|---------------|
//! | `$0000-$AFFF`   | RAM           |
//! | `$BF00-$BF0F`   | VIA           |
//! | `$C000-$FFFF`   | ROM + vectors |

pub mod bus;
pub mod fifo;
pub mod ram;
pub mod rom;
pub mod system;

pub use bus::{RAM_END, RAM_START, ROM_END, ROM_START, SbcBus, VIA_END, VIA_START};
pub use fifo::{ByteFifo, SharedFifo};
pub use ram::{Access, AccessKind, AccessSize, Ram};
pub use rom::Rom;
pub use system::{StopReason, System};
