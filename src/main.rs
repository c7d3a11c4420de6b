use anyhow::Result;

mod app;
mod config;
mod handler;
mod logging;
mod ollama;
mod reveal;
mod theme;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }

        // Join the generation task once it finishes. The transcript is
        // only ever touched here, on the event-loop task.
        if app
            .pending_reply
            .as_ref()
            .is_some_and(|task| task.is_finished())
        {
            if let Some(task) = app.pending_reply.take() {
                match task.await {
                    Ok(result) => app.finish_reply(result),
                    Err(err) if err.is_cancelled() => {}
                    Err(err) => app.fail_with(format!("Error: model task failed: {}", err)),
                }
            }
        }
    }

    Ok(())
}
