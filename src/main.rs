use std::sync::Arc;
use anyhow::Result;
use docchat_core::{Config, DocumentService, HttpDocumentService};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_create().unwrap_or_else(|err| {
        eprintln!("Ignoring unreadable config: {}", err);
        Config::new()
    });

    // Logging is best effort; the client runs without it
    let log_path = match logging::init(&config.log_filter()) {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("Logging disabled: {}", err);
            None
        }
    };

    let api_base = config.api_base();
    tracing::info!(%api_base, "starting docchat");

    let service: Arc<dyn DocumentService> = Arc::new(HttpDocumentService::new(&api_base));
    let mut app = App::new(service, api_base, &config);
    app.log_path = log_path;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    app.refresh_status();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    tracing::info!("docchat exited");
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
