// Log-only RWS monitor: same polling and persistence as the dashboard,
// one log line per cycle. Stop with Ctrl-C.
// Run with: cargo run -p dashboard --bin headless

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use rws_monitor::{MonitorConfig, PollReport, Poller};

fn log_report(report: &PollReport) {
    let r = &report.readout;
    info!(
        "motors={} program={} gripper={} speed={} {} {} {}",
        r.motors, r.program, r.gripper, r.speed, r.pos_x, r.pos_y, r.pos_z
    );
    for issue in &report.issues {
        warn!("{}", issue);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = MonitorConfig::from_env()?;
    let poller = Arc::new(Poller::new(&config)?);
    if let Err(e) = poller.refresh_latest().await {
        warn!("Could not load stored measurements: {}", e);
    }

    let mut reports = poller.subscribe();
    let timer = poller.spawn(config.poll_interval);
    info!(
        "Polling {} every {:?}, storing to {}",
        config.client.base_url(),
        config.poll_interval,
        config.db_path.display()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            report = reports.recv() => match report {
                Ok(report) => log_report(&report),
                Err(RecvError::Lagged(n)) => warn!("Missed {} cycle reports", n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    timer.abort();
    info!("Stopped after {} cycles", poller.snapshot().await.cycles);
    Ok(())
}
