//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LinkEngine / Console (domain)
//! ```
//!
//! Driven adapters (UART, NVS, GPIO outputs, log sink) implement these
//! traits. The protocol engine and console consume them via generics at
//! call sites, so the domain core never touches hardware directly and
//! the whole crate tests on the host with in-memory mocks.
//!
//! Every port is used from the single cooperative tick context — no
//! locking is required anywhere behind these traits.

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: UART ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Byte-level serial channel. Two instances exist at run time: the
/// console UART (operator-facing) and the WiReach UART (adapter-facing).
///
/// Reads are non-blocking probes: `None` means "no byte waiting", never
/// "wait for one". Writes are fire-and-forget; adapters absorb and log
/// transmit errors rather than surfacing them into the protocol core.
pub trait SerialPort {
    /// Probe for one received byte. Returns `None` when the RX FIFO is empty.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue bytes for transmission.
    fn write_bytes(&mut self, data: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Digital output port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// The bank of numbered digital outputs (annunciators, relays).
/// Indices outside `0..NUM_OUTPUTS` are ignored by implementations.
pub trait OutputPort {
    /// Drive output `idx` high (`true`) or low (`false`).
    fn set(&mut self, idx: u8, on: bool);

    /// Read back the last commanded level of output `idx`.
    fn get(&self, idx: u8) -> bool;

    /// Drive every output to the same level.
    fn set_all(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, a
/// future CAN broadcast, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently
/// clamped — a bad value arriving over the adapter's web UI must not
/// be able to disable the link response timeout.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for raw preference bytes and the
/// per-device configuration slots.
///
/// Keys are namespaced to prevent collisions between subsystems.
/// Write operations MUST be atomic — no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively; the in-memory
/// simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// Visit every stored `(namespace, key, bytes)` triple, in
    /// unspecified order. Drives the console's `E` preference dump.
    fn for_each(&self, f: &mut dyn FnMut(&str, &str, &[u8]));
}

// ───────────────────────────────────────────────────────────────
// Tick delegate (decouples scheduler from the main loop)
// ───────────────────────────────────────────────────────────────

/// Callback trait the [`TickScheduler`](crate::scheduler::TickScheduler)
/// invokes when an entry fires.
///
/// The scheduler knows nothing about the link engine or the console;
/// the main loop implements this by mapping fired labels onto the
/// polling entry points.
pub trait TickDelegate {
    /// Called when a scheduler entry fires.
    ///
    /// * `label` — the label the entry was registered under.
    /// * `kind`  — whether it was a periodic or one-shot fire.
    fn on_tick_fired(&mut self, label: &str, kind: TickFiredKind);
}

/// Discriminant passed to [`TickDelegate::on_tick_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFiredKind {
    /// A recurring periodic entry fired.
    Periodic,
    /// A one-shot entry fired (auto-disables after).
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
