//! Diagnostic serial console.
//!
//! Operator keystrokes accumulate into a bounded line buffer; complete
//! lines are either a single-character short command (help, output
//! banks, preference dump, adapter provisioning) or a `KEY=VALUE`
//! configuration assignment that is decoded and routed to local state,
//! persistent storage, or the WiReach link engine.
//!
//! The console never writes to the adapter UART directly — every
//! adapter-bound command goes through the [`LinkEngine`](crate::link)
//! so the one-in-flight invariant holds.

pub mod interpreter;
pub mod keys;
pub mod line;
pub mod passthrough;

pub use interpreter::{Console, ConsoleRequest};
