//! System configuration parameters
//!
//! All tunable parameters for the VCULink module.
//! Values can be overridden via NVS (non-volatile storage) or the
//! adapter-hosted web UI (through the WNXT parameter sync loop).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Logging ---
    /// Log verbosity: 0=debug, 1=info, 2=warn, 3=error, 4=off
    pub log_level: u8,

    // --- Link protocol ---
    /// How long to wait for a WiReach response before retrying (milliseconds)
    pub response_timeout_ms: u32,
    /// How many times an unanswered command is re-sent before being dropped
    pub max_retries: u8,
    /// Idle link ticks between WNXT parameter sync sweeps
    pub param_sync_interval_ticks: u32,
    /// TCP port the adapter listens on for the dashboard socket
    pub tcp_listen_port: u16,
    /// Settle time after boot before the initial parameter load (milliseconds)
    pub param_load_delay_ms: u32,

    // --- Timing ---
    /// WiReach polling interval (milliseconds)
    pub link_tick_interval_ms: u32,
    /// Console polling interval (milliseconds)
    pub console_tick_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Logging
            log_level: 1, // info

            // Link protocol
            response_timeout_ms: 500,
            max_retries: 2,
            param_sync_interval_ticks: 50,
            tcp_listen_port: 2000,
            param_load_delay_ms: 5000,

            // Timing
            link_tick_interval_ms: 100, // 10 Hz
            console_tick_interval_ms: 20,
        }
    }
}

impl SystemConfig {
    /// Map the numeric `log_level` byte onto the `log` crate's filter.
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.log_level {
            0 => log::LevelFilter::Debug,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Error,
            _ => log::LevelFilter::Off,
        }
    }
}
