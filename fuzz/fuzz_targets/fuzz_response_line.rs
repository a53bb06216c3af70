//! Fuzz target: `response::parse_line`
//!
//! The WiReach is untrusted: whatever line noise or firmware banner it
//! emits must parse to *some* variant without panicking.
//!
//! cargo fuzz run fuzz_response_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use vculink::link::response::{ResponseLine, parse_line};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    match parse_line(line) {
        ResponseLine::Sockets(handles) => {
            // A parsed socket list always has exactly four entries by
            // construction; handles are in u16 range by type.
            assert_eq!(handles.len(), 4);
        }
        ResponseLine::Param { key, .. } => {
            assert!(!key.is_empty(), "param reports must carry a key");
        }
        _ => {}
    }
});
