//! Host-side controller for the lickometer reward apparatus.
//!
//! The device — pumps, lick sensors and a status line behind a
//! microcontroller — speaks a small fixed binary protocol over a serial
//! link. This crate owns that protocol: the little-endian signed-integer
//! codec, the synchronous command/echo exchange discipline, the
//! partial-reinforcement reward scheduler, and the high-level command
//! facade experiments drive.
//!
//! Out of scope by design: port discovery, stimulus rendering, trial
//! orchestration and result logging. Those live in the experiment harness
//! and consume [`Lickometer`]'s operations.
//!
//! ```no_run
//! use lickometer::{ControllerConfig, Lickometer, Pump, Side};
//!
//! # fn main() -> lickometer::Result<()> {
//! let config = ControllerConfig::default();
//! let mut device = Lickometer::open("/dev/ttyACM0", &config)?;
//! device.calibrate(&[Pump::Left, Pump::Right], 0.02, 200)?;
//! device.set_response_timeout(5.0)?;
//! let licks = device.watch_for_lick()?;
//! if licks != "000" {
//!     device.reward(Side::Left, None)?;
//! }
//! device.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(unused_must_use)]

pub mod config;
pub mod controller;
pub mod protocol;
pub mod reward;
pub mod transport;

mod error;

pub use config::ControllerConfig;
pub use controller::{Lickometer, Pump, Side};
pub use error::{Error, Result};
pub use protocol::Order;
pub use reward::RewardScheduler;
pub use transport::{SerialTransport, Transport};
