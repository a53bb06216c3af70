//! WiReach CO2128 link layer — the AT-command protocol engine.
//!
//! ```text
//!  Console / periodic duties
//!          │ send_cmd()
//!          ▼
//!  ┌───────────────┐   idle    ┌────────────────────┐
//!  │ CommandQueue  │──────────▶│ LinkEngine         │──▶ SerialPort (UART1)
//!  │ (64, FIFO)    │   busy    │ one in-flight slot │◀── response lines
//!  └───────────────┘◀──────────└────────────────────┘
//! ```
//!
//! One command is on the wire at any time; everything else waits in the
//! ring. Responses, timeouts, and the WNXT parameter sync loop advance
//! the state machine from the cooperative `poll()` entry point.

pub mod engine;
pub mod provision;
pub mod queue;
pub mod response;
pub mod socket;

pub use engine::LinkEngine;

/// Every command is framed as `AT+i<payload><CR>` on the wire.
pub const CMD_PREFIX: &[u8] = b"AT+i";

/// Command terminator byte (CR).
pub const CMD_TERMINATOR: u8 = b'\r';

/// Maximum payload length of a single framed command.
pub const COMMAND_LEN: usize = 64;

/// Device id of the WiReach CO2128 on the message bus.
pub const WIREACH_DEVICE_ID: u16 = 0x2128;

/// Human-readable device name, as shown by the console `S` command.
pub const WIREACH_COMMON_NAME: &str = "WIFI (WiReach CO2128)";

/// Protocol engine states. `Idle` means no command is outstanding;
/// every other variant tags the kind of the single in-flight command so
/// the response line can be parsed against the right grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    /// A `name="value"` parameter write awaits its status reply.
    SetParam,
    /// A parameter query (`name?` or `WNXT`) awaits a `key="value"` line.
    GetParam,
    /// A `SSND%` socket payload awaits its status reply.
    SendSocket,
    /// The one-time `LTCP` listener start awaits its status reply.
    StartTcpListener,
    /// An `LSST` active-socket enumeration awaits the handle list.
    GetActiveSockets,
}
