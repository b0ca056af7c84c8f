//! Byte FIFO handshake device.
//!
//! Stands in for a serial console or host link on the VIA's port A:
//! the host queues bytes in, the emulated program reads them via ORA
//! handshake reads (CA1 signals availability), and bytes the program
//! writes accumulate for the host to collect.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use emu_core::HandshakeDevice;

/// Paired input queue and output log.
#[derive(Debug, Default)]
pub struct ByteFifo {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ByteFifo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a byte for the emulated program to read.
    pub fn push_byte(&mut self, value: u8) {
        self.input.push_back(value);
    }

    /// Collect everything the program has written so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl HandshakeDevice for ByteFifo {
    fn read_byte(&mut self) -> u8 {
        self.input.pop_front().unwrap_or(0)
    }

    fn write_byte(&mut self, value: u8) {
        self.output.push(value);
    }

    fn data_ready(&self) -> bool {
        !self.input.is_empty()
    }
}

/// Cloneable handle to a [`ByteFifo`].
///
/// One clone goes to the VIA as its port A device; the other side
/// stays with the host (or the `System`) for feeding input and
/// draining output while the machine runs.
#[derive(Debug, Clone, Default)]
pub struct SharedFifo(Rc<RefCell<ByteFifo>>);

impl SharedFifo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_byte(&self, value: u8) {
        self.0.borrow_mut().push_byte(value);
    }

    pub fn take_output(&self) -> Vec<u8> {
        self.0.borrow_mut().take_output()
    }

    #[must_use]
    pub fn data_ready(&self) -> bool {
        self.0.borrow().data_ready()
    }
}

impl HandshakeDevice for SharedFifo {
    fn read_byte(&mut self) -> u8 {
        self.0.borrow_mut().read_byte()
    }

    fn write_byte(&mut self, value: u8) {
        self.0.borrow_mut().write_byte(value);
    }

    fn data_ready(&self) -> bool {
        self.0.borrow().data_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_drains_in_order() {
        let mut fifo = ByteFifo::new();
        fifo.push_byte(1);
        fifo.push_byte(2);
        assert!(fifo.data_ready());
        assert_eq!(fifo.read_byte(), 1);
        assert_eq!(fifo.read_byte(), 2);
        assert!(!fifo.data_ready());
        assert_eq!(fifo.read_byte(), 0); // empty reads as 0
    }

    #[test]
    fn output_accumulates_until_taken() {
        let mut fifo = ByteFifo::new();
        fifo.write_byte(b'o');
        fifo.write_byte(b'k');
        assert_eq!(fifo.take_output(), b"ok");
        assert!(fifo.take_output().is_empty());
    }

    #[test]
    fn shared_handle_sees_both_sides() {
        let host = SharedFifo::new();
        let mut device: Box<dyn HandshakeDevice> = Box::new(host.clone());

        host.push_byte(0x41);
        assert!(device.data_ready());
        assert_eq!(device.read_byte(), 0x41);

        device.write_byte(0x58);
        assert_eq!(host.take_output(), vec![0x58]);
    }
}
