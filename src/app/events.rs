//! Outbound application events.
//!
//! The link engine and console emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — log to serial, raise a dashboard
//! flag, etc.

use heapless::String;

use crate::link::COMMAND_LEN;

/// Maximum length of a parameter name carried in an event.
pub const EVENT_KEY_LEN: usize = 16;
/// Maximum length of a parameter value carried in an event.
pub const EVENT_VALUE_LEN: usize = 32;

/// Structured events emitted by the domain core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A buffered command was evicted because the queue was full.
    /// Carries the running total of dropped commands since boot.
    CommandDropped { dropped_total: u32 },

    /// The in-flight command went unanswered through every retry and
    /// was abandoned.
    ResponseTimeout {
        cmd: String<COMMAND_LEN>,
        retries: u8,
    },

    /// The WiReach adapter reported a changed parameter (WNXT sync loop).
    ParamChanged {
        key: String<EVENT_KEY_LEN>,
        value: String<EVENT_VALUE_LEN>,
    },

    /// The active socket table was refreshed from the adapter.
    SocketsChanged { active: [Option<u16>; 4] },

    /// The factory provisioning script ran to completion.
    ProvisioningComplete,

    /// The operator entered serial passthrough mode. Emitted before the
    /// relay loop starts; nothing is emitted after (reset to exit).
    PassthroughEntered,
}
