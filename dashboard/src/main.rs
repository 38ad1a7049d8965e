// Terminal dashboard for an ABB controller's Robot Web Services
// Run with: cargo run -p dashboard --bin dashboard
// Against the simulator: cargo run -p sim (defaults already match)

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use dashboard::{logging, ui};
use rws_monitor::{MonitorConfig, Poller};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitorConfig::from_env()?;
    logging::init_file(&logging::log_path(|var| std::env::var(var).ok()))?;

    let poller = Arc::new(Poller::new(&config)?);
    if let Err(e) = poller.refresh_latest().await {
        warn!("Could not load stored measurements: {}", e);
    }
    info!(
        "Polling {} every {:?}",
        config.client.base_url(),
        config.poll_interval
    );
    let timer = poller.spawn(config.poll_interval);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &poller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    timer.abort();
    if let Err(err) = res {
        println!("Error: {:?}", err);
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    poller: &Arc<Poller>,
) -> io::Result<()> {
    let state = poller.state();
    loop {
        {
            let snapshot = state.lock().await;
            let polling = poller.is_polling();
            terminal.draw(|f| ui::draw(f, &snapshot, polling))?;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('r') => {
                        if !poller.trigger() {
                            debug!("Refresh ignored, cycle in flight");
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    info!("Dashboard closed");
    Ok(())
}
