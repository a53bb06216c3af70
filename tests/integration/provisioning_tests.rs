//! Factory provisioning flow: the `w` script stepped cooperatively by
//! the engine, honoring settle windows, ending in a parameter reload.

use vculink::app::events::AppEvent;
use vculink::config::SystemConfig;
use vculink::link::provision::FACTORY_SCRIPT;
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

    fn reply_ok(&mut self, now_ms: u64) {
        self.uart.feed(b"I/OK\r");
        self.poll(now_ms);
    }
}

#[test]
fn first_step_goes_out_immediately() {
    let mut r = Rig::new();
    r.engine.start_provisioning(0);
    assert!(r.engine.is_provisioning());

    r.poll(0);
    assert_eq!(r.uart.take_tx_string(), "AT+iFD\r");
    assert_eq!(r.engine.state(), LinkState::SetParam);
}

#[test]
fn settle_window_gates_the_next_step() {
    let mut r = Rig::new();
    r.engine.start_provisioning(0);
    r.poll(0);
    r.uart.take_tx();

    // Response arrives fast, but the 2 s settle window still applies.
    r.reply_ok(100);
    assert!(r.uart.tx_is_empty());
    r.poll(1999);
    assert!(r.uart.tx_is_empty());

    r.poll(2000);
    assert_eq!(r.uart.take_tx_string(), "AT+iHIF=1\r");
}

#[test]
fn full_script_runs_in_order_and_reloads_parameters() {
    let mut r = Rig::new();
    r.engine.start_provisioning(0);

    // Walk simulated time; answer whenever something is in flight.
    let mut wire = Vec::new();
    let mut now = 0u64;
    while now < 60_000 {
        r.poll(now);
        let tx = r.uart.take_tx_string();
        if !tx.is_empty() {
            wire.push(tx);
            r.reply_ok(now + 50);
        }
        now += 100;
    }

    // Every scripted command went out, in order, before the reload.
    let sent: Vec<&str> = wire
        .iter()
        .map(|f| {
            f.trim_end_matches('\r')
                .trim_start_matches("AT+i")
        })
        .collect();
    let script: Vec<&str> = FACTORY_SCRIPT.iter().map(|s| s.cmd).collect();
    assert_eq!(&sent[..script.len()], &script[..], "script order");

    assert_eq!(
        r.sink
            .count_matching(|e| matches!(e, AppEvent::ProvisioningComplete)),
        1
    );
    assert!(!r.engine.is_provisioning());

    // The reload pushed the parameter set after the final settle.
    assert!(
        sent.iter().any(|c| c.starts_with("LOGLEVEL=")),
        "got: {sent:?}"
    );
}

#[test]
fn console_commands_queue_behind_provisioning_steps() {
    let mut r = Rig::new();
    r.engine.start_provisioning(0);
    r.poll(0);
    r.uart.take_tx();

    // An operator command arrives mid-script: buffered, not interleaved
    // into the wire ahead of the response.
    r.engine
        .send_cmd("RP20", LinkState::SetParam, 10, &mut r.uart, &mut r.sink);
    assert!(r.uart.tx_is_empty());
    assert_eq!(r.engine.queue_len(), 1);

    // Once the in-flight step completes, the buffered command drains
    // first; the next script step waits for its settle window anyway.
    r.reply_ok(100);
    assert_eq!(r.uart.take_tx_string(), "AT+iRP20\r");
}
