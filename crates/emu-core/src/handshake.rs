//! Byte-oriented handshake device interface.

/// A device exchanging bytes with a VIA port under handshake control.
///
/// The device never calls back into the VIA. Instead it exposes a
/// `data_ready` line that the VIA samples on its own clock and turns
/// into a CA1 edge, so ownership stays one-directional.
pub trait HandshakeDevice {
    /// Take the byte currently presented on the port.
    fn read_byte(&mut self) -> u8;

    /// Present a byte to the device.
    fn write_byte(&mut self, value: u8);

    /// True while the device has a byte waiting to be read.
    fn data_ready(&self) -> bool;
}
