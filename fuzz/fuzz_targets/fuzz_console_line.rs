//! Fuzz target: `LineBuffer::push`
//!
//! Drives arbitrary byte sequences into the console line accumulator
//! and asserts that it never panics, never yields a line past the cap,
//! and never yields an empty line.
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use vculink::console::line::{LINE_LEN, LineBuffer};

fuzz_target!(|data: &[u8]| {
    let mut lb = LineBuffer::new();

    for &b in data {
        if let Some(line) = lb.push(b) {
            assert!(line.len() <= LINE_LEN, "line exceeds cap");
            assert!(!line.is_empty(), "accumulator must not yield empty lines");
        }
    }

    // Whatever was fed, the accumulator stays within bounds.
    assert!(lb.len() <= LINE_LEN);
});
