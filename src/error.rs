#![allow(dead_code)] // Error types reserved for future typed adapter returns

//! Unified error types for the VCULink firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every
//! subsystem can convert into, keeping the top-level loop's error
//! handling uniform. All variants are `Copy` so they can be cheaply
//! passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The WiReach link failed.
    Link(LinkError),
    /// A serial channel failed.
    Serial(SerialError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Serial(e) => write!(f, "serial: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The adapter never answered the in-flight command.
    ResponseTimeout,
    /// A response line did not match the in-flight state's grammar.
    MalformedResponse,
    /// The adapter reported an error status (`I/ERROR`).
    AdapterError,
    /// A queued command was evicted by queue overflow.
    CommandDropped,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseTimeout => write!(f, "response timeout"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::AdapterError => write!(f, "adapter error status"),
            Self::CommandDropped => write!(f, "command dropped"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Serial errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// UART driver install or configuration failed.
    InitFailed,
    /// A transmit call failed or wrote short.
    WriteFailed,
    /// RX FIFO overflowed and bytes were lost.
    Overrun,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "UART init failed"),
            Self::WriteFailed => write!(f, "UART write failed"),
            Self::Overrun => write!(f, "RX overrun"),
        }
    }
}

impl From<SerialError> for Error {
    fn from(e: SerialError) -> Self {
        Self::Serial(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
