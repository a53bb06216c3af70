//! Tick scheduler.
//!
//! Drives the cooperative polling entry points. The scheduler notifies
//! a [`TickDelegate`] when an entry fires; the main loop implements the
//! delegate by mapping fired labels onto `LinkEngine::poll`,
//! `Console::poll`, and the one-shot boot duties.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   TickScheduler                      │
//! │                                                      │
//! │  ┌────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │ console-   │  │ wireach-    │  │ param-load   │   │
//! │  │ poll (20ms)│  │ poll (100ms)│  │ (one-shot)   │   │
//! │  └─────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │        ▼                ▼                ▼           │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │                 TickDelegate                   │  │
//! │  │        (main loop calls the poll points)       │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::{TickDelegate, TickFiredKind};
use log::debug;

/// Maximum number of registered entries (stack-allocated).
const MAX_ENTRIES: usize = 8;

/// The kind of entry determines how and when it fires.
#[derive(Debug, Clone, Copy)]
pub enum TickKind {
    /// Fire every `interval_ms` milliseconds.
    Periodic { interval_ms: u32 },
    /// Fire once after `delay_ms`, then auto-remove.
    OneShot { delay_ms: u32 },
}

#[derive(Debug, Clone, Copy)]
struct TickEntry {
    label: &'static str,
    kind: TickKind,
    elapsed_ms: u32,
}

/// Fixed-capacity tick dispatcher.
///
/// Intentionally decoupled from everything it drives: when an entry
/// fires it invokes the [`TickDelegate`] callback rather than calling
/// into the link or console directly, which keeps it independently
/// testable.
pub struct TickScheduler {
    entries: [Option<TickEntry>; MAX_ENTRIES],
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            entries: [None; MAX_ENTRIES],
        }
    }

    /// Register an entry. Returns `false` when the table is full.
    pub fn add(&mut self, label: &'static str, kind: TickKind) -> bool {
        for slot in &mut self.entries {
            if slot.is_none() {
                *slot = Some(TickEntry {
                    label,
                    kind,
                    elapsed_ms: 0,
                });
                debug!("scheduler: registered '{}'", label);
                return true;
            }
        }
        false
    }

    /// Remove the entry with the given label, if present.
    pub fn cancel(&mut self, label: &str) {
        for slot in &mut self.entries {
            if slot.as_ref().is_some_and(|e| e.label == label) {
                *slot = None;
            }
        }
    }

    /// Advance all entries by `delta_ms` and fire the due ones through
    /// the delegate.
    pub fn tick(&mut self, delta_ms: u32, delegate: &mut impl TickDelegate) {
        for slot in &mut self.entries {
            let Some(entry) = slot else { continue };
            entry.elapsed_ms = entry.elapsed_ms.saturating_add(delta_ms);

            match entry.kind {
                TickKind::Periodic { interval_ms } => {
                    if entry.elapsed_ms >= interval_ms {
                        entry.elapsed_ms = 0;
                        delegate.on_tick_fired(entry.label, TickFiredKind::Periodic);
                    }
                }
                TickKind::OneShot { delay_ms } => {
                    if entry.elapsed_ms >= delay_ms {
                        let label = entry.label;
                        *slot = None;
                        delegate.on_tick_fired(label, TickFiredKind::OneShot);
                    }
                }
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}
