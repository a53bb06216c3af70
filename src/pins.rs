//! GPIO / peripheral pin assignments for the VCULink carrier board.
//!
//! Single source of truth — every adapter references this module rather
//! than hard-coding pin numbers. Change a pin here and it propagates
//! everywhere.

// ---------------------------------------------------------------------------
// WiReach CO2128 module (UART1)
// ---------------------------------------------------------------------------

/// UART TX to the WiReach RX.
pub const WIREACH_TX_GPIO: i32 = 17;
/// UART RX from the WiReach TX.
pub const WIREACH_RX_GPIO: i32 = 18;
/// WiReach UART baud rate.
pub const WIREACH_BAUD: u32 = 115_200;
/// MSEL pin — held HIGH to select serial host mode.
pub const WIREACH_MSEL_GPIO: i32 = 8;
/// Active-low reset into the WiReach module.
pub const WIREACH_RESET_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Operator console (UART0 / USB-CDC)
// ---------------------------------------------------------------------------

/// Console UART baud rate.
pub const CONSOLE_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Digital output bank
// ---------------------------------------------------------------------------

/// Number of numbered digital outputs (annunciators, relays).
pub const NUM_OUTPUTS: usize = 8;

/// GPIO for each digital output, indexed 0..NUM_OUTPUTS.
pub const OUTPUT_GPIOS: [i32; NUM_OUTPUTS] = [4, 5, 6, 7, 15, 16, 35, 36];
