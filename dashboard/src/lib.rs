//! Front ends for the RWS monitor: a ratatui dashboard (`dashboard`) and a
//! log-only monitor (`headless`). Both drive the same [`rws_monitor::Poller`].

pub mod logging;
pub mod ui;
