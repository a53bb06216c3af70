//! Active socket bookkeeping and the `SSND%` payload formatter.

use core::fmt::Write;

use heapless::String;

use super::COMMAND_LEN;

/// Number of concurrently tracked sockets (WiReach firmware limit).
pub const MAX_SOCKETS: usize = 4;

/// Largest payload that still fits a framed `SSND%` command.
/// `SSND%:` + 3-digit socket + `,` + 3-digit length + `:` = 14 bytes of
/// framing inside the command budget.
pub const MAX_SOCKET_PAYLOAD: usize = COMMAND_LEN - 14;

/// Handles of the adapter's currently open sockets. Mutated only when a
/// confirmed enumeration response arrives, never speculatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocketTable {
    handles: [Option<u16>; MAX_SOCKETS],
}

impl SocketTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table from a confirmed enumeration. Returns `true`
    /// if anything actually changed.
    pub fn update(&mut self, handles: [Option<u16>; MAX_SOCKETS]) -> bool {
        if self.handles == handles {
            return false;
        }
        self.handles = handles;
        true
    }

    pub fn handles(&self) -> [Option<u16>; MAX_SOCKETS] {
        self.handles
    }

    pub fn active_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }
}

/// Build the length-prefixed socket send command:
/// `SSND%:<3-digit-socket>,<payload-length>:<payload>`.
///
/// The length field is the exact byte length of `payload`; a mismatch
/// is a caller bug, not a protocol-level error. Returns `None` when the
/// payload would not fit the command budget.
pub fn format_socket_send(socket: u16, payload: &str) -> Option<String<COMMAND_LEN>> {
    if payload.len() > MAX_SOCKET_PAYLOAD {
        return None;
    }

    let mut cmd = String::new();
    write!(cmd, "SSND%:{:03},{}:", socket, payload.len()).ok()?;
    cmd.push_str(payload).ok()?;
    Some(cmd)
}
