//! Acquisition engine for a daisy-chained LTC6810-family battery-monitor
//! stack: PEC15-protected command/register framing, a daisy-chain SPI
//! transport, a mode-adaptive device driver, a generic state-machine
//! kernel, and the supervisor that wires them into a sleep/standby/
//! conversion/read cycle with per-device diagnostics.
//!
//! Downstream consumers (CAN publishers, balancing, calibration, firmware
//! bring-up) are not this crate's concern — see [`Supervisor::get_data`]
//! and [`Supervisor::get_diag`] for the surface they read from.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod device;
pub mod diagnostics;
pub mod driver;
pub mod kernel;
pub mod link;
pub mod pec;
pub mod supervisor;
pub mod transport;

pub use config::Config;
pub use device::FrontEnd;
pub use diagnostics::Diagnostics;
pub use driver::AdcMode;
pub use link::{HalLink, Link};
pub use supervisor::{AcqState, Supervisor};
