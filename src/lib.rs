//! # mercury-probe - Mercury Pro switch diagnostics
//!
//! `mercury-probe` talks to the web interface of Mercury "Pro" web-managed
//! switches (SG105Pro, SG108Pro, SG116Pro). It detects the model, logs in,
//! and scrapes system identity, per-port statistics and 802.1Q VLAN
//! membership into one flat key-value snapshot.
//!
//! The `mercury-probe` binary wraps this in an interactive diagnostic that
//! prompts for credentials and prints a report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mercury_probe::device::{MercurySwitchConnector, SwitchApi};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut switch = MercurySwitchConnector::new("192.168.1.10", "admin", "password")?;
//!
//!     // Best effort: fixes the port count when the model is known.
//!     let _ = switch.autodetect_model().await;
//!
//!     let info = switch.switch_infos().await?;
//!     for (key, value) in info.iter() {
//!         println!("{key} = {value}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`device::SwitchApi`] - Operations the probe drives
//! - [`device::MercurySwitchConnector`] - HTTP implementation for real switches
//! - [`info::SwitchInfo`] - The flat telemetry snapshot
//! - [`templates`] - Known models and their detection rules
//! - [`probe`] - The interactive diagnostic run
//! - [`error::SwitchError`] - Error types and their [`error::ErrorKind`]

pub mod config;
pub mod device;
pub mod error;
pub mod info;
pub mod page;
pub mod probe;
pub mod session;
pub mod templates;
