//! Console command interpreter.
//!
//! Lines arrive from [`LineBuffer`]; a one-byte line hits the short
//! command table, anything longer is parsed as `KEY=VALUE`. Ports are
//! injected at the call site (same shape as the link engine) so the
//! interpreter runs unchanged against mocks.
//!
//! Console replies go out the console serial port; adapter-bound
//! commands go through the [`LinkEngine`] and its queue.

use core::fmt::Write as _;

use heapless::String;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConfigPort, EventSink, OutputPort, SerialPort, StoragePort};
use crate::config::SystemConfig;
use crate::link::{LinkEngine, LinkState, WIREACH_COMMON_NAME, WIREACH_DEVICE_ID, COMMAND_LEN};
use crate::pins::NUM_OUTPUTS;

use super::keys::{ConfigKey, parse_long};
use super::line::{Line, LineBuffer};

/// Namespace holding the per-device configuration slots.
const DEVICE_NAMESPACE: &str = "devcfg";
/// Number of device configuration slots the `NUKE` command wipes.
const DEVICE_SLOT_COUNT: usize = 64;

/// Longest uppercased config key the interpreter will resolve.
const KEY_LEN: usize = 16;

/// Requests the interpreter cannot satisfy itself and hands up to the
/// main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleRequest {
    /// Enter the bidirectional serial relay (reset to exit).
    Passthrough,
}

/// Write one reply line (CRLF-terminated) to the console serial port.
/// Formatting overflow truncates the tail rather than failing.
fn say(serial: &mut impl SerialPort, args: core::fmt::Arguments<'_>) {
    let mut buf = String::<120>::new();
    let _ = core::fmt::write(&mut buf, args);
    serial.write_bytes(buf.as_bytes());
    serial.write_bytes(b"\r\n");
}

macro_rules! cprintln {
    ($serial:expr, $($arg:tt)*) => {
        say($serial, format_args!($($arg)*))
    };
}

/// The diagnostic console.
pub struct Console {
    line: LineBuffer,
}

impl Console {
    pub fn new() -> Self {
        Self {
            line: LineBuffer::new(),
        }
    }

    /// One polling pass: drain pending console bytes, process any
    /// completed lines. Returns a [`ConsoleRequest`] when the operator
    /// asked for something only the main loop can do.
    ///
    /// `prefs` satisfies **both** [`StoragePort`] and [`ConfigPort`] —
    /// this avoids a double borrow of the NVS adapter while keeping the
    /// port boundary explicit.
    pub fn poll(
        &mut self,
        now_ms: u64,
        console_serial: &mut impl SerialPort,
        link_serial: &mut impl SerialPort,
        link: &mut LinkEngine,
        outputs: &mut impl OutputPort,
        prefs: &mut (impl StoragePort + ConfigPort),
        config: &mut SystemConfig,
        sink: &mut impl EventSink,
    ) -> Option<ConsoleRequest> {
        while let Some(byte) = console_serial.read_byte() {
            if let Some(line) = self.line.push(byte) {
                let request = self.handle_line(
                    &line,
                    now_ms,
                    console_serial,
                    link_serial,
                    link,
                    outputs,
                    prefs,
                    config,
                    sink,
                );
                if request.is_some() {
                    return request;
                }
            }
        }
        None
    }

    fn handle_line(
        &mut self,
        line: &Line,
        now_ms: u64,
        console_serial: &mut impl SerialPort,
        link_serial: &mut impl SerialPort,
        link: &mut LinkEngine,
        outputs: &mut impl OutputPort,
        prefs: &mut (impl StoragePort + ConfigPort),
        config: &mut SystemConfig,
        sink: &mut impl EventSink,
    ) -> Option<ConsoleRequest> {
        if line.len() == 1 {
            self.handle_short_cmd(
                line[0],
                now_ms,
                console_serial,
                link_serial,
                link,
                outputs,
                prefs,
                config,
                sink,
            )
        } else {
            self.handle_config_cmd(
                line,
                now_ms,
                console_serial,
                link_serial,
                link,
                outputs,
                prefs,
                config,
                sink,
            );
            None
        }
    }

    // ── Short commands ────────────────────────────────────────

    fn handle_short_cmd(
        &mut self,
        cmd: u8,
        now_ms: u64,
        console_serial: &mut impl SerialPort,
        link_serial: &mut impl SerialPort,
        link: &mut LinkEngine,
        outputs: &mut impl OutputPort,
        prefs: &mut (impl StoragePort + ConfigPort),
        config: &SystemConfig,
        sink: &mut impl EventSink,
    ) -> Option<ConsoleRequest> {
        match cmd {
            b'h' | b'?' | b'H' => self.print_menu(console_serial, config),

            b'K' => {
                outputs.set_all(true);
                cprintln!(console_serial, "all outputs: ON");
            }
            b'J' => {
                outputs.set_all(false);
                cprintln!(console_serial, "all outputs: OFF");
            }

            b'E' => {
                cprintln!(console_serial, "Stored preference values:");
                prefs.for_each(&mut |ns, key, bytes| {
                    let mut hex = String::<96>::new();
                    for b in bytes.iter().take(24) {
                        let _ = write!(hex, "{:02X} ", b);
                    }
                    if bytes.len() > 24 {
                        let _ = write!(hex, "({} bytes)", bytes.len());
                    }
                    cprintln!(console_serial, "{}/{}: {}", ns, key, hex);
                });
            }

            b'S' => {
                cprintln!(
                    console_serial,
                    "{} = {:X}",
                    WIREACH_COMMON_NAME,
                    WIREACH_DEVICE_ID
                );
            }

            b's' => {
                cprintln!(
                    console_serial,
                    "Finding and listing all nearby WiFi access points"
                );
                link.send_cmd("RP20", LinkState::SetParam, now_ms, link_serial, sink);
            }

            b'W' => {
                cprintln!(
                    console_serial,
                    "Setting adapter to WPS mode (press the WPS button on your router)"
                );
                link.send_cmd("AWPS", LinkState::SetParam, now_ms, link_serial, sink);
            }

            b'w' => {
                cprintln!(
                    console_serial,
                    "Resetting adapter to factory defaults and setting up the !VCULINK access point"
                );
                link.start_provisioning(now_ms);
            }

            b'p' => {
                cprintln!(
                    console_serial,
                    "PASSTHROUGH MODE - all traffic console <-> adapter (reset to resume normal operation)"
                );
                sink.emit(&AppEvent::PassthroughEntered);
                return Some(ConsoleRequest::Passthrough);
            }

            // Unknown short commands are silently ignored.
            _ => {}
        }
        None
    }

    // ── Config commands ───────────────────────────────────────

    fn handle_config_cmd(
        &mut self,
        line: &Line,
        now_ms: u64,
        console_serial: &mut impl SerialPort,
        link_serial: &mut impl SerialPort,
        link: &mut LinkEngine,
        outputs: &mut impl OutputPort,
        prefs: &mut (impl StoragePort + ConfigPort),
        config: &mut SystemConfig,
        sink: &mut impl EventSink,
    ) {
        // Shortest sensible assignment; anything below this is noise.
        if line.len() < 6 {
            return;
        }

        let (key_bytes, value_bytes) = match line.iter().position(|&b| b == b'=') {
            Some(eq) if eq + 1 < line.len() => (&line[..eq], &line[eq + 1..]),
            _ => {
                cprintln!(console_serial, "Command needs a value..ie LOGLEVEL=2");
                cprintln!(console_serial, "");
                return;
            }
        };

        let Ok(value) = core::str::from_utf8(value_bytes) else {
            cprintln!(console_serial, "Unknown command");
            return;
        };

        let mut key = String::<KEY_LEN>::new();
        for &b in key_bytes {
            if key.push(b.to_ascii_uppercase() as char).is_err() {
                break; // an over-long key cannot match the table anyway
            }
        }

        let new_value = parse_long(value);

        // Every recognized command that changes controller-visible state
        // concludes by reloading parameters into the adapter so the
        // dashboard re-reads them; keys marked below opt out (they take
        // the adapter down themselves).
        let mut update_wifi = true;

        match ConfigKey::lookup(&key) {
            Some(ConfigKey::LogLevel) => match new_value {
                0 => self.set_log_level(0, "debug", console_serial, prefs, config),
                1 => self.set_log_level(1, "info", console_serial, prefs, config),
                2 => self.set_log_level(2, "warning", console_serial, prefs, config),
                3 => self.set_log_level(3, "error", console_serial, prefs, config),
                4 => self.set_log_level(4, "off", console_serial, prefs, config),
                _ => cprintln!(console_serial, "log level must be 0-4"),
            },

            Some(ConfigKey::WiReach) => {
                link.send_cmd(value, LinkState::SetParam, now_ms, link_serial, sink);
                info!("sent \"AT+i{}\" to WiReach wireless LAN device", value);
                link.send_cmd("DOWN", LinkState::SetParam, now_ms, link_serial, sink);
                update_wifi = false;
            }

            Some(k @ (ConfigKey::Ssid
            | ConfigKey::Ip
            | ConfigKey::Channel
            | ConfigKey::Security
            | ConfigKey::Pwd)) => {
                let param = k.param_name().unwrap_or_default();
                let mut cmd = String::<COMMAND_LEN>::new();
                if write!(cmd, "{}={}", param, value).is_err() {
                    cprintln!(console_serial, "value too long");
                    return;
                }
                info!("Sent \"{}\" to WiReach wireless LAN device", cmd);
                link.send_cmd(&cmd, LinkState::SetParam, now_ms, link_serial, sink);
                link.send_cmd("DOWN", LinkState::SetParam, now_ms, link_serial, sink);
                update_wifi = false;
            }

            Some(ConfigKey::Output) if (0..NUM_OUTPUTS as i32).contains(&new_value) => {
                let idx = new_value as u8;
                let current = outputs.get(idx);
                cprintln!(console_serial, "DOUT{},  STATE: {}", idx, u8::from(current));
                outputs.set(idx, !current);

                let mut states = String::<96>::new();
                for i in 0..NUM_OUTPUTS as u8 {
                    let _ = write!(states, "DOUT{}:{}", i, u8::from(outputs.get(i)));
                    if (i as usize) < NUM_OUTPUTS - 1 {
                        let _ = write!(states, ", ");
                    }
                }
                cprintln!(console_serial, "{}", states);
            }

            Some(ConfigKey::Nuke) => {
                if new_value == 1 {
                    // Zero the checksum byte of every device slot so all
                    // of them reload defaults on next boot.
                    for slot in 0..DEVICE_SLOT_COUNT {
                        let mut slot_key = String::<12>::new();
                        let _ = write!(slot_key, "slot{:02}", slot);
                        if let Err(e) = prefs.write(DEVICE_NAMESPACE, &slot_key, &[0]) {
                            warn!("device slot {} wipe failed: {}", slot, e);
                        }
                    }
                    cprintln!(
                        console_serial,
                        "Device settings have been nuked. Reboot to reload default settings"
                    );
                }
            }

            // OUTPUT with an out-of-range index falls through here too,
            // matching the reference behaviour.
            _ => {
                cprintln!(console_serial, "Unknown command");
                update_wifi = false;
            }
        }

        if update_wifi {
            link.load_parameters(config, outputs, now_ms, link_serial, sink);
        }
    }

    fn set_log_level(
        &mut self,
        level: u8,
        name: &str,
        console_serial: &mut impl SerialPort,
        prefs: &impl ConfigPort,
        config: &mut SystemConfig,
    ) {
        cprintln!(console_serial, "setting loglevel to '{}'", name);
        config.log_level = level;
        log::set_max_level(config.level_filter());
        if let Err(e) = prefs.save(config) {
            warn!("config save failed: {}", e);
        }
    }

    // ── Help menu ─────────────────────────────────────────────

    fn print_menu(&self, serial: &mut impl SerialPort, config: &SystemConfig) {
        cprintln!(serial, "VCULink v{}", env!("CARGO_PKG_VERSION"));
        cprintln!(serial, "System Menu:");
        cprintln!(serial, "");
        cprintln!(serial, "Enable line endings of some sort (LF, CR, CRLF)");
        cprintln!(serial, "");
        cprintln!(serial, "Short Commands:");
        cprintln!(serial, "h = help (displays this message)");
        cprintln!(serial, "K = set all outputs high");
        cprintln!(serial, "J = set all outputs low");
        cprintln!(serial, "E = dump stored preference values");
        cprintln!(serial, "S = show known device IDs");
        cprintln!(serial, "s = scan WiFi for nearby access points");
        cprintln!(serial, "W = set adapter to WPS association mode");
        cprintln!(
            serial,
            "w = reset adapter to factory defaults, set up !VCULINK access point"
        );
        cprintln!(
            serial,
            "p = enable adapter passthrough (reset required to resume normal operation)"
        );
        cprintln!(serial, "");
        cprintln!(serial, "Config Commands (enter command=newvalue):");
        cprintln!(serial, "");
        cprintln!(
            serial,
            "LOGLEVEL={} - set log level (0=debug, 1=info, 2=warn, 3=error, 4=off)",
            config.log_level
        );
        cprintln!(serial, "SSID=name - set WiFi network name (takes adapter down)");
        cprintln!(serial, "IP=a.b.c.d - set static IP address (takes adapter down)");
        cprintln!(serial, "CHANNEL=n - set radio channel (takes adapter down)");
        cprintln!(serial, "SECURITY=phrase - set WPA passphrase (takes adapter down)");
        cprintln!(serial, "PWD=phrase - set web config password (takes adapter down)");
        cprintln!(serial, "OUTPUT=n - toggle digital output (0-{})", NUM_OUTPUTS - 1);
        cprintln!(serial, "WIREACH=cmd - send a raw AT+i command to the adapter");
        cprintln!(serial, "NUKE=1 - zero all stored device settings");
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
