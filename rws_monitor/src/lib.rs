//! Status monitor for ABB robot controllers over Robot Web Services.
//!
//! One poll cycle reads five RWS resources concurrently, pulls the scalar
//! values out of their HTML/JSON bodies, turns them into typed values and
//! display text, appends them to bounded histories and stores one row in
//! SQLite. [`poller::Poller`] runs that cycle on a timer.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rws_monitor::{MonitorConfig, Poller};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::from_env()?;
//! let poller = Arc::new(Poller::new(&config)?);
//! let mut reports = poller.subscribe();
//! poller.spawn(config.poll_interval);
//!
//! while let Ok(report) = reports.recv().await {
//!     println!("{:?}", report.readout);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod client;
pub mod config;
pub mod cycle;
pub mod errors;
pub mod extract;
pub mod history;
pub mod models;
pub mod normalize;
pub mod poller;
pub mod store;

pub use client::{Endpoint, RwsClient};
pub use config::{MonitorConfig, RwsClientConfig};
pub use errors::*;
pub use models::*;
pub use poller::{MonitorState, PollReport, Poller};
pub use store::MeasurementStore;
