//! VCULink Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative tick loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartAdapter×2     LogEventSink   NvsAdapter    OutputBank     │
//! │  (SerialPort)      (EventSink)    (Config+KV)   (OutputPort)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  LinkEngine (protocol) · Console (interpreter)         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TickScheduler (delegate-driven) · passthrough escape hatch    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod pins;
mod scheduler;

pub mod app;
mod adapters;
mod console;
mod drivers;
pub mod link;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use adapters::log_sink::LogEventSink;
use adapters::nvs::NvsAdapter;
use adapters::outputs::OutputBank;
use adapters::time::Esp32TimeAdapter;
use adapters::uart::{UartAdapter, UartChannel};
use app::ports::{ConfigPort, TickDelegate, TickFiredKind};
use config::SystemConfig;
use console::{Console, ConsoleRequest};
use link::LinkEngine;
use scheduler::{TickKind, TickScheduler};

// ── Tick delegate ─────────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the link or the
// console) to the polling entry points. Fired labels are collected
// here and dispatched after the scheduler pass, so the scheduler never
// holds a borrow on the engine. No global queue, no statics.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollAction {
    ConsolePoll,
    LinkPoll,
    ParamLoad,
}

const LABEL_CONSOLE: &str = "console-poll";
const LABEL_LINK: &str = "wireach-poll";
const LABEL_PARAM_LOAD: &str = "param-load";

#[derive(Default)]
struct FiredActions {
    actions: heapless::Vec<PollAction, 8>,
}

impl TickDelegate for FiredActions {
    fn on_tick_fired(&mut self, label: &str, _kind: TickFiredKind) {
        let action = match label {
            LABEL_CONSOLE => PollAction::ConsolePoll,
            LABEL_LINK => PollAction::LinkPoll,
            LABEL_PARAM_LOAD => PollAction::ParamLoad,
            _ => return,
        };
        let _ = self.actions.push(action);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("VCULink v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Hardware bring-up ──────────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            // Continue without NVS — config will not be persisted this
            // session. On next reboot, NVS should self-heal.
            NvsAdapter::default()
        }
    };
    let mut config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    log::set_max_level(config.level_filter());

    // ── 4. Construct adapters ─────────────────────────────────
    let time = Esp32TimeAdapter::new();

    let mut console_uart = UartAdapter::new(UartChannel::Console)
        .map_err(|e| anyhow::anyhow!("console UART: {}", e))?;
    let mut wireach_uart = UartAdapter::new(UartChannel::WiReach)
        .map_err(|e| anyhow::anyhow!("WiReach UART: {}", e))?;

    let mut outputs = OutputBank::new();
    let mut sink = LogEventSink::new();

    // ── 5. Domain core ────────────────────────────────────────
    let mut engine = LinkEngine::new();
    let mut con = Console::new();

    // ── 6. Scheduler registration ─────────────────────────────
    let mut sched = TickScheduler::new();
    let mut fired = FiredActions::default();

    sched.add(
        LABEL_CONSOLE,
        TickKind::Periodic {
            interval_ms: config.console_tick_interval_ms,
        },
    );
    sched.add(
        LABEL_LINK,
        TickKind::Periodic {
            interval_ms: config.link_tick_interval_ms,
        },
    );
    // The adapter needs a settle window after power-on before it will
    // accept the initial parameter push.
    sched.add(
        LABEL_PARAM_LOAD,
        TickKind::OneShot {
            delay_ms: config.param_load_delay_ms,
        },
    );

    info!("System ready. Entering tick loop.");

    // ── 7. Tick loop ──────────────────────────────────────────
    let base_tick_ms = config.console_tick_interval_ms;

    loop {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(base_tick_ms)));
        sched.tick(base_tick_ms, &mut fired);

        let now_ms = time.uptime_ms();

        for action in fired.actions.iter().copied() {
            match action {
                PollAction::ConsolePoll => {
                    let request = con.poll(
                        now_ms,
                        &mut console_uart,
                        &mut wireach_uart,
                        &mut engine,
                        &mut outputs,
                        &mut nvs,
                        &mut config,
                        &mut sink,
                    );
                    if let Some(ConsoleRequest::Passthrough) = request {
                        // Deliberate non-return: only a hardware reset
                        // leaves passthrough mode.
                        console::passthrough::run(&mut console_uart, &mut wireach_uart);
                    }
                }

                PollAction::LinkPoll => {
                    engine.poll(
                        now_ms,
                        &mut wireach_uart,
                        &mut outputs,
                        &mut config,
                        &nvs,
                        &mut sink,
                    );
                }

                PollAction::ParamLoad => {
                    engine.load_parameters(&config, &outputs, now_ms, &mut wireach_uart, &mut sink);
                }
            }
        }
        fired.actions.clear();
    }
}
