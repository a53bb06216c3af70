//! Fuzz target: `keys::parse_long`
//!
//! The numeric value grammar must be total over operator input: never
//! panic, never overflow, and agree with itself on a decimal re-print.
//!
//! cargo fuzz run fuzz_numeric

#![no_main]

use libfuzzer_sys::fuzz_target;
use vculink::console::keys::parse_long;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = core::str::from_utf8(data) else {
        return;
    };

    let v = parse_long(s);

    // Fixed point: printing the parsed value in decimal and parsing it
    // again is stable.
    assert_eq!(parse_long(&v.to_string()), v);
});
