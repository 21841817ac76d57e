use anyhow::Result;

mod app;
mod client;
mod config;
mod handler;
mod session;
mod tui;
mod ui;

use app::App;
use client::ChatClient;
use config::Config;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());
    let client = ChatClient::new(&config.service_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(client.clone());
    let mut events = EventHandler::new(client);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event)?;
        }

        // Settle a finished chat call; the 300ms tick guarantees this runs
        // shortly after the spawned task completes.
        app.poll_dispatch().await;
    }

    Ok(())
}
