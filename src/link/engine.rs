//! WiReach protocol engine — owns the single in-flight command slot.
//!
//! **Transport-decoupled**: the engine does not own a UART. Callers
//! inject the [`SerialPort`] (and the other ports) at every call site,
//! so the whole state machine runs against in-memory mocks on the host.
//!
//! The contract, in order of importance:
//!
//! 1. At most one command is on the wire; `send_cmd` while busy buffers.
//! 2. Buffered commands go out FIFO, each only after the previous
//!    response (or timeout) is observed.
//! 3. A silent adapter cannot wedge the engine: bounded timeout, bounded
//!    retries, then the command is dropped and the queue drains.
//! 4. Malformed or unexpected response lines never panic; they log and
//!    release the in-flight slot.

use core::fmt::Write as _;

use heapless::String;
use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConfigPort, EventSink, OutputPort, SerialPort};
use crate::config::SystemConfig;
use crate::pins::NUM_OUTPUTS;

use super::provision::Provisioner;
use super::queue::{CommandQueue, QueuedCommand};
use super::response::{ResponseLine, parse_line};
use super::socket::{SocketTable, format_socket_send};
use super::{CMD_PREFIX, CMD_TERMINATOR, COMMAND_LEN, LinkState};

/// Longest response line the engine will accumulate before discarding.
const RESPONSE_LINE_LEN: usize = 128;

/// The most recent transmission, kept for diagnostics and retry.
/// Overwritten on every send.
#[derive(Debug, Clone, Default)]
struct LastSent {
    cmd: String<COMMAND_LEN>,
    state: LinkState,
    sent_at_ms: u64,
    retries: u8,
}

/// Protocol state machine for the WiReach CO2128.
pub struct LinkEngine {
    state: LinkState,
    queue: CommandQueue,
    last_sent: LastSent,
    rx_line: heapless::Vec<u8, RESPONSE_LINE_LEN>,
    sockets: SocketTable,
    provisioner: Provisioner,
    idle_ticks: u32,
    did_param_load: bool,
    did_tcp_listener: bool,
}

impl LinkEngine {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
            queue: CommandQueue::new(),
            last_sent: LastSent::default(),
            rx_line: heapless::Vec::new(),
            sockets: SocketTable::new(),
            provisioner: Provisioner::new(),
            idle_ticks: 0,
            did_param_load: false,
            did_tcp_listener: false,
        }
    }

    // ── Command submission ────────────────────────────────────

    /// Send `cmd` now if the engine is idle, otherwise buffer it.
    /// `state` is the busy state entered when the command actually goes
    /// out on the wire.
    pub fn send_cmd(
        &mut self,
        cmd: &str,
        state: LinkState,
        now_ms: u64,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        let Ok(cmd) = String::<COMMAND_LEN>::try_from(cmd) else {
            warn!("command of {} bytes exceeds frame budget, discarded", cmd.len());
            return;
        };

        if self.state != LinkState::Idle {
            debug!("buffer cmd: {}", cmd);
            if let Some(total) = self.queue.push(QueuedCommand { cmd, state }) {
                warn!("command queue overflow, oldest entry dropped ({} total)", total);
                sink.emit(&AppEvent::CommandDropped {
                    dropped_total: total,
                });
            }
        } else {
            self.transmit(&cmd, state, now_ms, 0, serial);
        }
    }

    /// Write a parameter to adapter RAM: `NAME="value"`.
    pub fn set_param(
        &mut self,
        name: &str,
        value: impl core::fmt::Display,
        now_ms: u64,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        let mut cmd = String::<COMMAND_LEN>::new();
        if write!(cmd, "{}=\"{}\"", name, value).is_err() {
            warn!("parameter {} does not fit a command frame", name);
            return;
        }
        self.send_cmd(&cmd, LinkState::SetParam, now_ms, serial, sink);
    }

    /// Query one parameter by name (`NAME?`).
    pub fn get_param(
        &mut self,
        name: &str,
        now_ms: u64,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        let mut cmd = String::<COMMAND_LEN>::new();
        if write!(cmd, "{}?", name).is_err() {
            warn!("parameter {} does not fit a command frame", name);
            return;
        }
        self.send_cmd(&cmd, LinkState::GetParam, now_ms, serial, sink);
    }

    /// Ask the adapter for the next changed parameter (sync loop step).
    pub fn next_param(
        &mut self,
        now_ms: u64,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        self.send_cmd("WNXT", LinkState::GetParam, now_ms, serial, sink);
    }

    /// Submit a payload to an open socket.
    pub fn send_to_socket(
        &mut self,
        socket: u16,
        payload: &str,
        now_ms: u64,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        match format_socket_send(socket, payload) {
            Some(cmd) => self.send_cmd(&cmd, LinkState::SendSocket, now_ms, serial, sink),
            None => warn!(
                "socket {} payload of {} bytes exceeds frame budget",
                socket,
                payload.len()
            ),
        }
    }

    /// Push the controller-visible parameter set to adapter RAM so the
    /// adapter-hosted dashboard can render current state.
    pub fn load_parameters(
        &mut self,
        config: &SystemConfig,
        outputs: &impl OutputPort,
        now_ms: u64,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        info!("loading controller parameters into adapter RAM");
        self.set_param("LOGLEVEL", config.log_level, now_ms, serial, sink);
        self.set_param("TCPPORT", config.tcp_listen_port, now_ms, serial, sink);
        for idx in 0..NUM_OUTPUTS as u8 {
            let mut name = String::<8>::new();
            let _ = write!(name, "DOUT{}", idx);
            self.set_param(&name, u8::from(outputs.get(idx)), now_ms, serial, sink);
        }
        self.did_param_load = true;
    }

    /// Arm the factory provisioning script (console `w`).
    pub fn start_provisioning(&mut self, now_ms: u64) {
        info!("factory provisioning started");
        self.provisioner.start(now_ms);
    }

    // ── Cooperative poll entry point ──────────────────────────

    /// One polling pass: drain RX into response lines, enforce the
    /// response timeout, and run the periodic duties (provisioning
    /// steps, initial parameter load, TCP listener start, WNXT
    /// parameter sync, socket table refresh).
    pub fn poll(
        &mut self,
        now_ms: u64,
        serial: &mut impl SerialPort,
        outputs: &mut impl OutputPort,
        config: &mut SystemConfig,
        cfg_port: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Response bytes. The adapter terminates lines with CR (and
        //    sometimes CRLF); empty segments between terminators are
        //    skipped.
        while let Some(byte) = serial.read_byte() {
            if byte == b'\r' || byte == b'\n' {
                if !self.rx_line.is_empty() {
                    let mut buf = [0u8; RESPONSE_LINE_LEN];
                    let len = self.rx_line.len();
                    buf[..len].copy_from_slice(&self.rx_line);
                    self.rx_line.clear();

                    match core::str::from_utf8(&buf[..len]) {
                        Ok(line) => {
                            self.handle_response(line, now_ms, serial, outputs, config, cfg_port, sink);
                        }
                        Err(_) => warn!("non-ASCII response line discarded"),
                    }
                }
            } else if self.rx_line.push(byte).is_err() {
                warn!("response line exceeded {} bytes, discarded", RESPONSE_LINE_LEN);
                self.rx_line.clear();
            }
        }

        // 2. Response timeout. A silent adapter gets bounded retries,
        //    then the command is abandoned and the queue drains.
        if self.state != LinkState::Idle
            && now_ms.saturating_sub(self.last_sent.sent_at_ms)
                >= u64::from(config.response_timeout_ms)
        {
            if self.last_sent.retries < config.max_retries {
                let retries = self.last_sent.retries + 1;
                let cmd = self.last_sent.cmd.clone();
                debug!(
                    "no response to {} after {} ms, retry {}/{}",
                    cmd, config.response_timeout_ms, retries, config.max_retries
                );
                self.transmit(&cmd, self.state, now_ms, retries, serial);
            } else {
                warn!(
                    "{} unanswered after {} retries, dropping",
                    self.last_sent.cmd, self.last_sent.retries
                );
                sink.emit(&AppEvent::ResponseTimeout {
                    cmd: self.last_sent.cmd.clone(),
                    retries: self.last_sent.retries,
                });
                self.state = LinkState::Idle;
                self.drain_queue(now_ms, serial);
            }
        }

        // 3. Provisioning script steps (gated on idle + settle window).
        if let Some(cmd) = self.provisioner.next_due(now_ms, self.state == LinkState::Idle) {
            info!("provisioning: {}", cmd);
            self.send_cmd(cmd, LinkState::SetParam, now_ms, serial, sink);
        }
        if self.provisioner.take_finished() {
            info!("factory provisioning complete");
            sink.emit(&AppEvent::ProvisioningComplete);
            self.load_parameters(config, outputs, now_ms, serial, sink);
        }

        // 4. Periodic idle duties. Nothing runs until the boot one-shot
        //    has pushed the initial parameter set.
        if self.state == LinkState::Idle && !self.provisioner.is_active() && self.did_param_load {
            if !self.did_tcp_listener {
                let mut cmd = String::<COMMAND_LEN>::new();
                let _ = write!(cmd, "LTCP:{},4", config.tcp_listen_port);
                self.send_cmd(&cmd, LinkState::StartTcpListener, now_ms, serial, sink);
            } else {
                self.idle_ticks = self.idle_ticks.wrapping_add(1);
                let sync = config.param_sync_interval_ticks.max(1);
                if self.idle_ticks % (sync * 4) == 0 {
                    self.send_cmd("LSST:0", LinkState::GetActiveSockets, now_ms, serial, sink);
                } else if self.idle_ticks % sync == 0 {
                    self.next_param(now_ms, serial, sink);
                }
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────

    fn transmit(
        &mut self,
        cmd: &str,
        state: LinkState,
        now_ms: u64,
        retries: u8,
        serial: &mut impl SerialPort,
    ) {
        serial.write_bytes(CMD_PREFIX);
        serial.write_bytes(cmd.as_bytes());
        serial.write_bytes(&[CMD_TERMINATOR]);

        debug!("send to adapter: {}", cmd);
        self.state = state;
        self.last_sent = LastSent {
            cmd: String::try_from(cmd).unwrap_or_default(),
            state,
            sent_at_ms: now_ms,
            retries,
        };
    }

    fn drain_queue(&mut self, now_ms: u64, serial: &mut impl SerialPort) {
        if self.state != LinkState::Idle {
            return;
        }
        if let Some(next) = self.queue.pop() {
            self.transmit(&next.cmd, next.state, now_ms, 0, serial);
        }
    }

    fn handle_response(
        &mut self,
        line: &str,
        now_ms: u64,
        serial: &mut impl SerialPort,
        outputs: &mut impl OutputPort,
        config: &mut SystemConfig,
        cfg_port: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        let in_state = self.state;
        self.state = LinkState::Idle;

        match (in_state, parse_line(line)) {
            (LinkState::Idle, _) => {
                debug!("unsolicited from adapter: {}", line);
            }

            (LinkState::GetParam, ResponseLine::Param { key, value }) => {
                self.apply_param_change(key, value, outputs, config, cfg_port, sink);
                // Keep pulling until the adapter reports nothing changed.
                self.next_param(now_ms, serial, sink);
            }
            (LinkState::GetParam, _) => {
                debug!("parameter sync complete");
            }

            (LinkState::SetParam, ResponseLine::Ok) => {
                debug!("parameter accepted");
            }
            (LinkState::SetParam, ResponseLine::Error(code)) => {
                warn!("adapter rejected {} (code {:?})", self.last_sent.cmd, code);
            }
            (LinkState::SetParam, _) => {
                warn!("unexpected reply to {}: {}", self.last_sent.cmd, line);
            }

            (LinkState::SendSocket, ResponseLine::Ok) => {
                debug!("socket payload accepted");
            }
            (LinkState::SendSocket, _) => {
                warn!("socket send failed: {}", line);
            }

            (LinkState::StartTcpListener, ResponseLine::Ok) => {
                info!("TCP listener up on port {}", config.tcp_listen_port);
                self.did_tcp_listener = true;
            }
            (LinkState::StartTcpListener, _) => {
                // Flag stays clear so the next idle pass retries.
                warn!("TCP listener start refused: {}", line);
            }

            (LinkState::GetActiveSockets, ResponseLine::Sockets(handles)) => {
                if self.sockets.update(handles) {
                    info!("active sockets now {:?}", handles);
                    sink.emit(&AppEvent::SocketsChanged { active: handles });
                }
            }
            (LinkState::GetActiveSockets, _) => {
                warn!("malformed socket list: {}", line);
            }
        }

        self.drain_queue(now_ms, serial);
    }

    /// Apply one `key="value"` report from the WNXT sync loop: changes
    /// made on the adapter-hosted dashboard propagate back into the
    /// controller's configuration and outputs.
    fn apply_param_change(
        &mut self,
        key: &str,
        value: &str,
        outputs: &mut impl OutputPort,
        config: &mut SystemConfig,
        cfg_port: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        info!("adapter parameter change: {}=\"{}\"", key, value);

        if key == "LOGLEVEL" {
            match value.trim().parse::<u8>() {
                Ok(level) if level <= 4 => {
                    config.log_level = level;
                    log::set_max_level(config.level_filter());
                    if let Err(e) = cfg_port.save(config) {
                        warn!("config save failed: {}", e);
                    }
                }
                _ => warn!("LOGLEVEL out of range: {}", value),
            }
        } else if key == "TCPPORT" {
            match value.trim().parse::<u16>() {
                Ok(port) if port != 0 => {
                    config.tcp_listen_port = port;
                    if let Err(e) = cfg_port.save(config) {
                        warn!("config save failed: {}", e);
                    }
                }
                _ => warn!("TCPPORT out of range: {}", value),
            }
        } else if let Some(idx) = key.strip_prefix("DOUT").and_then(|s| s.parse::<u8>().ok()) {
            if (idx as usize) < NUM_OUTPUTS {
                outputs.set(idx, value.trim() != "0");
            }
        } else {
            debug!("parameter {} has no controller-side binding", key);
        }

        let (Ok(key), Ok(value)) = (
            String::<{ crate::app::events::EVENT_KEY_LEN }>::try_from(key),
            String::<{ crate::app::events::EVENT_VALUE_LEN }>::try_from(value),
        ) else {
            return; // oversized names are adapter garbage, already logged
        };
        sink.emit(&AppEvent::ParamChanged { key, value });
    }

    // ── Introspection (console + tests) ───────────────────────

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped_commands(&self) -> u32 {
        self.queue.dropped()
    }

    pub fn sockets(&self) -> &SocketTable {
        &self.sockets
    }

    /// The last command put on the wire, for diagnostics.
    pub fn last_sent_cmd(&self) -> &str {
        &self.last_sent.cmd
    }

    pub fn is_provisioning(&self) -> bool {
        self.provisioner.is_active()
    }
}

impl Default for LinkEngine {
    fn default() -> Self {
        Self::new()
    }
}
