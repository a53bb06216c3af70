//! Mock port implementations for integration tests.
//!
//! Records every call so tests can assert on the full history without
//! touching real UARTs, GPIO, or NVS flash.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use vculink::app::events::AppEvent;
use vculink::app::ports::{
    ConfigError, ConfigPort, EventSink, OutputPort, SerialPort, StorageError, StoragePort,
};
use vculink::config::SystemConfig;

// ── Serial channel ────────────────────────────────────────────

/// In-memory serial channel: `feed` plays the peer's transmissions,
/// `take_tx` drains what the firmware wrote.
pub struct MockSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

#[allow(dead_code)]
impl MockSerial {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
        }
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// Drain TX as a lossy string, convenient for `contains` asserts.
    pub fn take_tx_string(&mut self) -> String {
        String::from_utf8_lossy(&self.take_tx()).into_owned()
    }

    pub fn tx_is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort for MockSerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_bytes(&mut self, data: &[u8]) {
        self.tx.extend_from_slice(data);
    }
}

// ── Preference store (StoragePort + ConfigPort) ───────────────

pub struct MockPrefs {
    store: RefCell<BTreeMap<String, Vec<u8>>>,
    saved: RefCell<Vec<SystemConfig>>,
}

#[allow(dead_code)]
impl MockPrefs {
    pub fn new() -> Self {
        Self {
            store: RefCell::new(BTreeMap::new()),
            saved: RefCell::new(Vec::new()),
        }
    }

    pub fn last_saved(&self) -> Option<SystemConfig> {
        self.saved.borrow().last().cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saved.borrow().len()
    }

    pub fn key_count(&self) -> usize {
        self.store.borrow().len()
    }

    fn composite(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl Default for MockPrefs {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MockPrefs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.borrow().get(&Self::composite(namespace, key)) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .insert(Self::composite(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.borrow_mut().remove(&Self::composite(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store
            .borrow()
            .contains_key(&Self::composite(namespace, key))
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, &str, &[u8])) {
        for (composite, bytes) in self.store.borrow().iter() {
            if let Some((ns, key)) = composite.split_once("::") {
                f(ns, key, bytes);
            }
        }
    }
}

impl ConfigPort for MockPrefs {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.last_saved().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        self.saved.borrow_mut().push(config.clone());
        Ok(())
    }
}

// ── Digital outputs ───────────────────────────────────────────

pub const MOCK_OUTPUTS: usize = 8;

#[derive(Default)]
pub struct MockOutputs {
    pub levels: [bool; MOCK_OUTPUTS],
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputPort for MockOutputs {
    fn set(&mut self, idx: u8, on: bool) {
        if let Some(level) = self.levels.get_mut(idx as usize) {
            *level = on;
        }
    }

    fn get(&self, idx: u8) -> bool {
        self.levels.get(idx as usize).copied().unwrap_or(false)
    }

    fn set_all(&mut self, on: bool) {
        self.levels = [on; MOCK_OUTPUTS];
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_matching(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
