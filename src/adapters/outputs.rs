//! Digital output bank adapter.
//!
//! Implements [`OutputPort`] over the numbered GPIO outputs. The bank
//! mirrors the last commanded level in memory so `get` never touches
//! hardware; on ESP-IDF the level is also driven onto the pin via
//! `hw_init::gpio_write`. On host targets only the mirror exists.

use crate::app::ports::OutputPort;
use crate::drivers::hw_init;
use crate::pins::{NUM_OUTPUTS, OUTPUT_GPIOS};

pub struct OutputBank {
    levels: [bool; NUM_OUTPUTS],
}

impl OutputBank {
    /// All outputs start low (pins are driven low during hw_init).
    pub fn new() -> Self {
        Self {
            levels: [false; NUM_OUTPUTS],
        }
    }
}

impl OutputPort for OutputBank {
    fn set(&mut self, idx: u8, on: bool) {
        let Some(level) = self.levels.get_mut(idx as usize) else {
            return; // out-of-range indices are ignored by contract
        };
        *level = on;
        hw_init::gpio_write(OUTPUT_GPIOS[idx as usize], on);
    }

    fn get(&self, idx: u8) -> bool {
        self.levels.get(idx as usize).copied().unwrap_or(false)
    }

    fn set_all(&mut self, on: bool) {
        for idx in 0..NUM_OUTPUTS as u8 {
            self.set(idx, on);
        }
    }
}

impl Default for OutputBank {
    fn default() -> Self {
        Self::new()
    }
}
