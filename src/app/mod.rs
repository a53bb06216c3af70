//! Application core plumbing — ports and events.
//!
//! The domain logic itself lives in [`crate::link`] (WiReach protocol
//! engine) and [`crate::console`] (diagnostic console). Both consume
//! hardware exclusively through the **port traits** defined in
//! [`ports`], keeping them fully testable without real peripherals.

pub mod events;
pub mod ports;
