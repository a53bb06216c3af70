//! Bidirectional serial passthrough.
//!
//! Diagnostic mode that wires the console UART straight through to the
//! WiReach UART so a host PC can talk to the adapter's own AT console.
//! This is the one place the firmware abandons cooperative scheduling
//! on purpose: the relay never returns, and only a hardware reset gets
//! the controller back to normal operation.

use crate::app::ports::SerialPort;

/// Relay bytes in both directions, forever.
pub fn run(console: &mut impl SerialPort, adapter: &mut impl SerialPort) -> ! {
    loop {
        if let Some(byte) = console.read_byte() {
            adapter.write_bytes(&[byte]);
        }
        if let Some(byte) = adapter.read_byte() {
            console.write_bytes(&[byte]);
        }
    }
}
