// Simulated ABB controller answering Robot Web Services status requests
// Run with: cargo run -p sim
// Then point the monitor at it: cargo run -p dashboard

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;

use sim::{serve, ControllerState};

const MOTION_TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("SIM_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8081);

    let state = Arc::new(RwLock::new(ControllerState::default()));

    let motion_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MOTION_TICK);
        loop {
            interval.tick().await;
            motion_state.write().await.advance(MOTION_TICK);
        }
    });

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("RWS simulator listening on http://{}", listener.local_addr()?);
    serve(listener, state).await?;
    Ok(())
}
