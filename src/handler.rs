use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, ChatMessage, ChatRole, InputMode, SYSTEM_PROMPT};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Ctrl+C quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    if app.show_model_picker {
        handle_model_picker(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await?,
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => app.select_model(),
        _ => {}
    }
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back into the input line
        KeyCode::Char('i') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.cursor = app.input.chars().count();
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        KeyCode::Char('t') => app.toggle_theme(),

        // Open model picker with whatever ollama reports locally
        KeyCode::Char('M') => {
            let models = app.client.list_models().await.unwrap_or_default();
            app.open_model_picker(models);
        }

        // Cancel an in-flight generation
        KeyCode::Esc => {
            if app.is_awaiting() {
                app.cancel_pending();
            }
        }

        _ => {}
    }
    Ok(())
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            if app.is_awaiting() {
                app.cancel_pending();
            } else {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Enter => send_message(app),
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Push the user's turn and spawn the generation task. A no-op while
/// a reply is already pending: one request in flight at a time.
pub fn send_message(app: &mut App) {
    let text = app.input.trim().to_string();
    if text.is_empty() || app.is_awaiting() {
        return;
    }

    app.push_user(text);
    let prompt = build_prompt(&app.bot_name, &app.transcript);

    app.input.clear();
    app.cursor = 0;
    app.scroll_to_bottom();

    let client = app.client.clone();
    let model = app.model.clone();
    app.pending_reply = Some(tokio::spawn(async move {
        client.generate(&model, &prompt).await
    }));
}

/// Full prompt for one generation: persona, every prior turn in order,
/// and a trailing speaker cue for the assistant.
pub fn build_prompt(bot_name: &str, transcript: &[ChatMessage]) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push('\n');

    for msg in transcript {
        match msg.role {
            ChatRole::User => {
                prompt.push_str("User: ");
            }
            ChatRole::Assistant => {
                prompt.push_str(bot_name);
                prompt.push_str(": ");
            }
        }
        prompt.push_str(&msg.content);
        prompt.push('\n');
    }

    prompt.push_str(bot_name);
    prompt.push(':');
    prompt
}
