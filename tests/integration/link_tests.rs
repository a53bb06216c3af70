//! Protocol engine integration tests: in-flight discipline, FIFO
//! buffering, timeout/retry bounds, the WNXT sync loop, and socket
//! handling.

use vculink::app::events::AppEvent;
use vculink::config::SystemConfig;
use vculink::link::{LinkEngine, LinkState};

use crate::mock_hw::{MockOutputs, MockPrefs, MockSerial, RecordingSink};

struct Rig {
    engine: LinkEngine,
    uart: MockSerial,
    outputs: MockOutputs,
    prefs: MockPrefs,
    config: SystemConfig,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self {
            engine: LinkEngine::new(),
            uart: MockSerial::new(),
            outputs: MockOutputs::new(),
            prefs: MockPrefs::new(),
            config: SystemConfig::default(),
            sink: RecordingSink::new(),
        }
    }

    fn send(&mut self, cmd: &str, state: LinkState, now_ms: u64) {
        self.engine
            .send_cmd(cmd, state, now_ms, &mut self.uart, &mut self.sink);
    }

    fn poll(&mut self, now_ms: u64) {
        self.engine.poll(
            now_ms,
            &mut self.uart,
            &mut self.outputs,
            &mut self.config,
            &self.prefs,
            &mut self.sink,
        );
    }

    fn reply(&mut self, line: &str, now_ms: u64) {
        self.uart.feed(line.as_bytes());
        self.uart.feed(b"\r\n");
        self.poll(now_ms);
    }
}

// ── In-flight discipline ──────────────────────────────────────

#[test]
fn second_send_while_busy_buffers_instead_of_transmitting() {
    let mut r = Rig::new();

    r.send("WLSI?", LinkState::GetParam, 0);
    assert_eq!(r.uart.take_tx_string(), "AT+iWLSI?\r");
    assert_eq!(r.engine.state(), LinkState::GetParam);

    r.send("WLCH?", LinkState::GetParam, 1);
    assert!(r.uart.tx_is_empty(), "busy engine must not transmit");
    assert_eq!(r.engine.queue_len(), 1);
}

#[test]
fn buffered_commands_drain_fifo_after_responses() {
    let mut r = Rig::new();

    r.send("A=\"1\"", LinkState::SetParam, 0);
    r.uart.take_tx();
    for cmd in ["B=\"2\"", "C=\"3\"", "D=\"4\""] {
        r.send(cmd, LinkState::SetParam, 0);
    }
    assert_eq!(r.engine.queue_len(), 3);

    r.reply("I/OK", 10);
    assert_eq!(r.uart.take_tx_string(), "AT+iB=\"2\"\r");
    r.reply("I/OK", 20);
    assert_eq!(r.uart.take_tx_string(), "AT+iC=\"3\"\r");
    r.reply("I/OK", 30);
    assert_eq!(r.uart.take_tx_string(), "AT+iD=\"4\"\r");
    assert_eq!(r.engine.state(), LinkState::SetParam);

    r.reply("I/OK", 40);
    assert_eq!(r.engine.state(), LinkState::Idle);
    assert_eq!(r.engine.queue_len(), 0);
}

#[test]
fn queue_overflow_evicts_exactly_one_oldest() {
    let mut r = Rig::new();

    // One in flight, then fill the 64-slot ring.
    r.send("INFLIGHT", LinkState::SetParam, 0);
    for i in 0..64 {
        r.send(&format!("Q{}", i), LinkState::SetParam, 0);
    }
    assert_eq!(r.engine.queue_len(), 64);
    assert_eq!(r.engine.dropped_commands(), 0);

    r.send("Q64", LinkState::SetParam, 0);
    assert_eq!(r.engine.queue_len(), 64, "length must hold at capacity");
    assert_eq!(r.engine.dropped_commands(), 1);
    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::CommandDropped { .. })),
        1
    );

    // Q0 was evicted; Q1 is the next to transmit.
    r.uart.take_tx();
    r.reply("I/OK", 10);
    assert_eq!(r.uart.take_tx_string(), "AT+iQ1\r");
}

// ── Timeout and retry ─────────────────────────────────────────

#[test]
fn silent_adapter_gets_bounded_retries_then_drop() {
    let mut r = Rig::new();
    // Defaults: 500 ms timeout, 2 retries.

    r.send("WLSI?", LinkState::GetParam, 0);
    r.send("NEXT=\"1\"", LinkState::SetParam, 0);
    r.uart.take_tx();

    // First timeout: retry 1.
    r.poll(500);
    assert_eq!(r.uart.take_tx_string(), "AT+iWLSI?\r");
    assert_eq!(r.engine.state(), LinkState::GetParam);

    // Second timeout: retry 2.
    r.poll(1000);
    assert_eq!(r.uart.take_tx_string(), "AT+iWLSI?\r");

    // Third timeout: out of retries — drop, emit, drain the queue.
    r.poll(1500);
    let wire = r.uart.take_tx_string();
    assert_eq!(wire, "AT+iNEXT=\"1\"\r", "queued command must go out");
    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::ResponseTimeout { .. })),
        1
    );
}

#[test]
fn response_before_timeout_resets_the_clock() {
    let mut r = Rig::new();

    r.send("WLCH?", LinkState::GetParam, 0);
    r.uart.take_tx();
    r.reply("I/OK", 400);
    assert_eq!(r.engine.state(), LinkState::Idle);

    // Well past the original deadline: no retry, nothing in flight.
    r.poll(2000);
    assert!(r.uart.tx_is_empty());
    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::ResponseTimeout { .. })),
        0
    );
}

// ── Parameter sync loop ───────────────────────────────────────

#[test]
fn wnxt_loop_pulls_until_adapter_is_drained() {
    let mut r = Rig::new();

    r.engine.next_param(0, &mut r.uart, &mut r.sink);
    assert_eq!(r.uart.take_tx_string(), "AT+iWNXT\r");

    // Each report immediately re-queries.
    r.reply("WLCH=\"9\"", 10);
    assert_eq!(r.uart.take_tx_string(), "AT+iWNXT\r");
    r.reply("DOUT3=\"1\"", 20);
    assert_eq!(r.uart.take_tx_string(), "AT+iWNXT\r");

    // A bare status ends the loop.
    r.reply("I/OK", 30);
    assert!(r.uart.tx_is_empty());
    assert_eq!(r.engine.state(), LinkState::Idle);

    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::ParamChanged { .. })),
        2
    );
    assert!(r.outputs.levels[3], "DOUT3 report must drive the output");
}

#[test]
fn get_param_queries_by_name() {
    let mut r = Rig::new();

    r.engine.get_param("WLSI", 0, &mut r.uart, &mut r.sink);
    assert_eq!(r.uart.take_tx_string(), "AT+iWLSI?\r");
    assert_eq!(r.engine.state(), LinkState::GetParam);

    // The answer flows through the same parameter-change path.
    r.reply("WLSI=\"CarNet\"", 10);
    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::ParamChanged { .. })),
        1
    );
}

#[test]
fn loglevel_report_updates_and_persists_config() {
    let mut r = Rig::new();

    r.engine.next_param(0, &mut r.uart, &mut r.sink);
    r.uart.take_tx();
    r.reply("LOGLEVEL=\"3\"", 10);

    assert_eq!(r.config.log_level, 3);
    assert_eq!(r.prefs.last_saved().unwrap().log_level, 3);
}

#[test]
fn malformed_param_report_ends_loop_without_crash() {
    let mut r = Rig::new();

    r.engine.next_param(0, &mut r.uart, &mut r.sink);
    r.uart.take_tx();
    r.reply("%%garbage%%", 10);

    assert_eq!(r.engine.state(), LinkState::Idle);
    assert!(r.uart.tx_is_empty());
}

// ── Sockets ───────────────────────────────────────────────────

#[test]
fn socket_send_formats_exactly() {
    let mut r = Rig::new();
    r.engine
        .send_to_socket(2, "hello", 0, &mut r.uart, &mut r.sink);
    assert_eq!(r.uart.take_tx_string(), "AT+iSSND%:002,5:hello\r");
    assert_eq!(r.engine.state(), LinkState::SendSocket);
}

#[test]
fn socket_list_response_updates_table_once() {
    let mut r = Rig::new();

    r.send("LSST:0", LinkState::GetActiveSockets, 0);
    r.uart.take_tx();
    r.reply("(000,001,-1,-1)", 10);

    assert_eq!(
        r.engine.sockets().handles(),
        [Some(0), Some(1), None, None]
    );
    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::SocketsChanged { .. })),
        1
    );

    // Same list again: no duplicate event.
    r.send("LSST:0", LinkState::GetActiveSockets, 20);
    r.uart.take_tx();
    r.reply("(000,001,-1,-1)", 30);
    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::SocketsChanged { .. })),
        1
    );
}

// ── Unsolicited data ──────────────────────────────────────────

#[test]
fn unsolicited_lines_while_idle_are_absorbed() {
    let mut r = Rig::new();

    r.uart.feed(b"i/Booting v3.2\r\nI/OK\r\n");
    r.poll(0);

    assert_eq!(r.engine.state(), LinkState::Idle);
    assert!(r.uart.tx_is_empty());
    assert!(r.sink.events.is_empty());
}

// ── Boot duties ───────────────────────────────────────────────

#[test]
fn parameter_load_pushes_the_whole_set() {
    let mut r = Rig::new();

    r.engine
        .load_parameters(&r.config, &r.outputs, 0, &mut r.uart, &mut r.sink);

    // First push transmits, the other nine (TCPPORT + 8 outputs) buffer.
    assert_eq!(r.uart.take_tx_string(), "AT+iLOGLEVEL=\"1\"\r");
    assert_eq!(r.engine.queue_len(), 9);

    // Drain and collect what actually reaches the wire.
    let mut wire = String::new();
    let mut now = 0;
    while r.engine.queue_len() > 0 || r.engine.state() != LinkState::Idle {
        now += 10;
        r.reply("I/OK", now);
        wire.push_str(&r.uart.take_tx_string());
    }
    assert!(wire.contains("TCPPORT=\"2000\""), "got: {wire}");
    assert!(wire.contains("DOUT0=\"0\""), "got: {wire}");
    assert!(wire.contains("DOUT7=\"0\""), "got: {wire}");
}

#[test]
fn tcp_listener_starts_after_parameter_load() {
    let mut r = Rig::new();

    r.engine
        .load_parameters(&r.config, &r.outputs, 0, &mut r.uart, &mut r.sink);

    // Drain the ten parameter pushes; the poll that observes the last
    // response immediately starts the listener.
    let mut now = 0;
    let mut wire = String::new();
    for _ in 0..10 {
        now += 10;
        r.reply("I/OK", now);
        wire.push_str(&r.uart.take_tx_string());
    }
    assert!(wire.ends_with("AT+iLTCP:2000,4\r"), "got: {wire}");

    now += 10;
    r.reply("I/OK", now);
    assert!(r.uart.tx_is_empty(), "listener confirm must not retransmit");

    // With the listener up, idle polls eventually kick the WNXT sweep.
    let mut wire = String::new();
    for i in 0..(r.config.param_sync_interval_ticks + 1) {
        r.poll(now + 10 + u64::from(i));
        wire.push_str(&r.uart.take_tx_string());
    }
    assert!(wire.contains("AT+iWNXT\r"), "got: {wire}");
}
