//! UART serial adapter.
//!
//! Implements [`SerialPort`] for the two hardware channels:
//!
//! - **Console** — UART0 (shared with the boot log / USB bridge).
//! - **WiReach** — UART1, wired to the adapter module.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF UART driver calls with a
//!   zero-timeout read so probes never block.
//! - **all other targets**: in-memory loopback buffers (`feed_rx` /
//!   `take_tx`) for host-side tests and simulation.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::SerialPort;
use crate::error::SerialError;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Which physical channel an adapter instance drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartChannel {
    Console,
    WiReach,
}

impl UartChannel {
    #[cfg(target_os = "espidf")]
    fn port(self) -> i32 {
        match self {
            Self::Console => 0,
            Self::WiReach => 1,
        }
    }
}

pub struct UartAdapter {
    channel: UartChannel,
    #[cfg(not(target_os = "espidf"))]
    rx: std::collections::VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

impl UartAdapter {
    /// Install and configure the UART driver for the channel.
    pub fn new(channel: UartChannel) -> Result<Self, SerialError> {
        #[cfg(target_os = "espidf")]
        {
            use crate::drivers::hw_init;

            let result = match channel {
                // Console stays on the default UART0 pins (-1 = no change).
                UartChannel::Console => {
                    hw_init::uart_init(channel.port(), -1, -1, pins::CONSOLE_BAUD)
                }
                UartChannel::WiReach => hw_init::uart_init(
                    channel.port(),
                    pins::WIREACH_TX_GPIO,
                    pins::WIREACH_RX_GPIO,
                    pins::WIREACH_BAUD,
                ),
            };
            if let Err(e) = result {
                warn!("UART{} init failed: {}", channel.port(), e);
                return Err(SerialError::InitFailed);
            }
            info!("UartAdapter: {:?} channel up", channel);
            Ok(Self { channel })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("UartAdapter: simulation backend for {:?}", channel);
            Ok(Self {
                channel,
                rx: std::collections::VecDeque::new(),
                tx: Vec::new(),
            })
        }
    }

    pub fn channel(&self) -> UartChannel {
        self.channel
    }

    // ── Simulation helpers (host tests) ───────────────────────

    /// Inject received bytes, as if the peer had transmitted them.
    #[cfg(not(target_os = "espidf"))]
    pub fn feed_rx(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Drain everything the firmware has transmitted so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn take_tx(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

impl SerialPort for UartAdapter {
    #[cfg(target_os = "espidf")]
    fn read_byte(&mut self) -> Option<u8> {
        use esp_idf_svc::sys::uart_read_bytes;

        let mut byte: u8 = 0;
        // SAFETY: driver was installed in new(); zero timeout keeps
        // this a non-blocking probe.
        let n = unsafe {
            uart_read_bytes(
                self.channel.port(),
                (&raw mut byte).cast(),
                1,
                0,
            )
        };
        (n == 1).then_some(byte)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    #[cfg(target_os = "espidf")]
    fn write_bytes(&mut self, data: &[u8]) {
        use esp_idf_svc::sys::uart_write_bytes;

        // SAFETY: driver was installed in new(); the call copies `data`
        // into the TX ring before returning.
        let written = unsafe {
            uart_write_bytes(self.channel.port(), data.as_ptr().cast(), data.len())
        };
        if written < 0 || written as usize != data.len() {
            warn!(
                "UART{} short write: {} of {} bytes",
                self.channel.port(),
                written,
                data.len()
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_bytes(&mut self, data: &[u8]) {
        self.tx.extend_from_slice(data);
    }
}
