use rand::seq::SliceRandom;
use ratatui::widgets::ListState;
use tracing::debug;

use crate::config::Config;
use crate::ollama::OllamaClient;
use crate::reveal::Reveal;
use crate::theme::Theme;

/// Compiled-in fallback; a saved default in the config file wins.
pub const DEFAULT_MODEL: &str = "deepseek-v3.1:671b-cloud";

pub const SYSTEM_PROMPT: &str = "You are a tech support agent.\n\
Your job:\n\
- Help users with technical issues they have.\n\
- If they have any questions about how to do something, tell them step by step how to do it.\n\
- Don't give any harmful or illegal advice.\n\
\n\
Format your response in plain text. Keep it short and conversational.\n";

const BOT_NAMES: &[&str] = &[
    "Elsa", "Alma", "Freja", "Linnea", "Klara", "Elin", "Axel", "Leo", "Emil", "Nils", "Erik",
    "Johan", "Robin", "Alex", "Sam", "Kim", "Mika", "Lukas", "Svea",
];

const WELCOME_MESSAGES: &[&str] = &[
    "👋 Hello there! I'm your Tech Support Assistant. How can I help you today?",
    "Hi! I'm here to help troubleshoot issues and answer your tech questions.",
    "Welcome! Need help fixing something or just have a quick tech question? I'm ready.",
    "Hi! I'm here to make tech support easy. What can I help you with today?",
];

/// Characters revealed per animation tick (ticks fire every 50ms, so
/// three per tick approximates the classic ~17ms/char typewriter).
const REVEAL_CHARS_PER_TICK: usize = 3;

/// Dots advance every Nth tick (250ms).
const DOTS_TICK_DIVISOR: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Where the reply pipeline currently is. Errors and cancellation
/// drop straight back to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
    Revealing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Transcript (append-only, process lifetime only)
    pub transcript: Vec<ChatMessage>,
    pub bot_name: String,

    // Input line state
    pub input: String,
    pub cursor: usize, // char index into input

    // Chat viewport
    pub scroll: u16,
    pub chat_height: u16, // set during render
    pub chat_width: u16,  // set during render

    // In-flight generation task; at most one at a time
    pub pending_reply: Option<tokio::task::JoinHandle<anyhow::Result<String>>>,

    // Reveal animation: (transcript index being revealed, animator)
    pub reveal: Option<(usize, Reveal)>,

    // Typing indicator
    pub tick_count: u64,
    pub typing_dots: u8, // 0..=3

    // Model picker
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    pub client: OllamaClient,
    pub model: String,
    pub theme: Theme,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let mut rng = rand::thread_rng();
        let bot_name = BOT_NAMES
            .choose(&mut rng)
            .copied()
            .unwrap_or("Sam")
            .to_string();
        let welcome = WELCOME_MESSAGES
            .choose(&mut rng)
            .copied()
            .unwrap_or(WELCOME_MESSAGES[0])
            .to_string();

        let model = config
            .default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let theme = config
            .theme
            .as_deref()
            .and_then(Theme::from_name)
            .unwrap_or_else(Theme::dark);

        let transcript = vec![ChatMessage {
            role: ChatRole::Assistant,
            content: welcome,
        }];

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            transcript,
            bot_name,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            pending_reply: None,
            reveal: None,
            tick_count: 0,
            typing_dots: 0,
            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),
            client: OllamaClient::new(),
            model,
            theme,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.pending_reply.is_some() {
            Phase::AwaitingReply
        } else if self.reveal.is_some() {
            Phase::Revealing
        } else {
            Phase::Idle
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.pending_reply.is_some()
    }

    pub fn push_user(&mut self, content: String) {
        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            content,
        });
    }

    /// Route the joined task result back into the transcript. Success
    /// appends the full assistant turn immediately (so follow-up
    /// prompts include it) and starts the reveal; failure appends
    /// exactly one plain-text error entry.
    pub fn finish_reply(&mut self, result: anyhow::Result<String>) {
        match result {
            Ok(text) => {
                let text = self.strip_bot_prefix(text);
                self.start_reveal(text);
            }
            Err(err) => self.fail_with(format!("Error: {}", err)),
        }
    }

    fn start_reveal(&mut self, text: String) {
        self.transcript.push(ChatMessage {
            role: ChatRole::Assistant,
            content: text.clone(),
        });
        let index = self.transcript.len() - 1;
        self.reveal = Some((index, Reveal::new(text)));
        self.typing_dots = 0;
        self.scroll_to_bottom();
    }

    pub fn fail_with(&mut self, message: String) {
        debug!(%message, "model call failed");
        self.transcript.push(ChatMessage {
            role: ChatRole::Assistant,
            content: message,
        });
        self.typing_dots = 0;
        self.scroll_to_bottom();
    }

    /// Some models echo the speaker cue back ("Elsa: ..."); drop it.
    /// Matched one character at a time: case folding can change byte
    /// lengths, so the tail offset must come from the original string.
    fn strip_bot_prefix(&self, text: String) -> String {
        let trimmed = text.trim();
        let cue = format!("{}:", self.bot_name);
        let mut rest = trimmed.char_indices();
        for expected in cue.chars() {
            match rest.next() {
                Some((_, c)) if c.to_lowercase().eq(expected.to_lowercase()) => {}
                _ => return trimmed.to_string(),
            }
        }
        let tail_start = rest.next().map(|(i, _)| i).unwrap_or(trimmed.len());
        trimmed[tail_start..].trim_start().to_string()
    }

    /// Abort the in-flight generation, if any. The child process is
    /// killed on drop.
    pub fn cancel_pending(&mut self) {
        if let Some(task) = self.pending_reply.take() {
            task.abort();
            self.typing_dots = 0;
            debug!("cancelled in-flight generation");
        }
    }

    /// Advance animations; called on every Tick event.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);

        if self.is_awaiting() && self.tick_count % DOTS_TICK_DIVISOR == 0 {
            self.typing_dots = (self.typing_dots + 1) % 4;
        }

        let mut reveal_done = false;
        if let Some((_, reveal)) = &mut self.reveal {
            reveal.advance(REVEAL_CHARS_PER_TICK);
            reveal_done = reveal.is_done();
        }
        if self.reveal.is_some() {
            self.scroll_to_bottom();
            if reveal_done {
                self.reveal = None;
            }
        }
    }

    // Viewport scrolling

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(1).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let total = self.transcript_line_count();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        total.saturating_sub(visible)
    }

    /// Wrapped line count of the rendered transcript. Works from the
    /// same styled lines the chat pane draws, so widened list prefixes
    /// and wide characters are counted at their display width. Word
    /// wrapping can still spill a line early; the count never exceeds
    /// what is drawn.
    fn transcript_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        crate::ui::transcript_lines(self)
            .iter()
            .map(|line| {
                let width = line.width();
                if width == 0 {
                    1
                } else {
                    width.div_ceil(wrap_width) as u16
                }
            })
            .sum()
    }

    // Model picker

    pub fn open_model_picker(&mut self, models: Vec<String>) {
        if models.is_empty() {
            return;
        }
        let current = models
            .iter()
            .position(|m| m == &self.model)
            .unwrap_or(0);
        self.available_models = models;
        self.model_picker_state.select(Some(current));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.available_models.get(i) {
                self.model = model.clone();
                self.show_model_picker = false;
                let _ = Config::save_default_model(&self.model);
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        let _ = Config::save_theme(self.theme.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(&Config::new())
    }

    #[test]
    fn test_starts_with_welcome_turn() {
        let app = test_app();
        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.transcript[0].role, ChatRole::Assistant);
        assert!(!app.transcript[0].content.is_empty());
        assert_eq!(app.phase(), Phase::Idle);
    }

    #[test]
    fn test_finish_reply_success_appends_turn_and_reveals() {
        let mut app = test_app();
        app.finish_reply(Ok("Hi there!".to_string()));

        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.transcript[1].role, ChatRole::Assistant);
        assert_eq!(app.transcript[1].content, "Hi there!");
        assert_eq!(app.phase(), Phase::Revealing);

        let (index, reveal) = app.reveal.as_ref().expect("reveal active");
        assert_eq!(*index, 1);
        assert_eq!(reveal.visible(), "");
    }

    #[test]
    fn test_finish_reply_error_appends_exactly_one_entry() {
        let mut app = test_app();
        let before = app.transcript.len();
        app.finish_reply(Err(anyhow::anyhow!("model returned no output")));

        assert_eq!(app.transcript.len(), before + 1);
        let last = app.transcript.last().expect("entry");
        assert_eq!(last.role, ChatRole::Assistant);
        assert!(last.content.starts_with("Error:"));
        // No reveal of a partial/garbled reply.
        assert!(app.reveal.is_none());
        assert_eq!(app.phase(), Phase::Idle);
    }

    #[test]
    fn test_strip_bot_prefix() {
        let mut app = test_app();
        app.bot_name = "Elsa".to_string();
        app.finish_reply(Ok("elsa: Sure, try rebooting.".to_string()));
        assert_eq!(
            app.transcript.last().expect("entry").content,
            "Sure, try rebooting."
        );
    }

    #[test]
    fn test_strip_bot_prefix_multibyte_case_fold() {
        let mut app = test_app();
        app.bot_name = "Erik".to_string();
        // U+212A KELVIN SIGN folds to 'k' but is three bytes long; the
        // cue must still strip without slicing mid-character.
        app.finish_reply(Ok("Eri\u{212A}: reboot the router".to_string()));
        assert_eq!(
            app.transcript.last().expect("entry").content,
            "reboot the router"
        );
    }

    #[test]
    fn test_strip_bot_prefix_requires_full_cue() {
        let mut app = test_app();
        app.bot_name = "Erik".to_string();
        app.finish_reply(Ok("Eriksson: hello".to_string()));
        assert_eq!(
            app.transcript.last().expect("entry").content,
            "Eriksson: hello"
        );
    }

    #[test]
    fn test_scroll_to_bottom_counts_exact_fit_lines() {
        let mut app = test_app();
        app.bot_name = "Sam".to_string();
        app.chat_width = 9;
        app.chat_height = 1;
        app.transcript = vec![ChatMessage {
            role: ChatRole::Assistant,
            content: "abcdefghi".to_string(),
        }];
        // Role line, one exactly-fitting content line, separator.
        app.scroll_to_bottom();
        assert_eq!(app.scroll, 2);
    }

    #[test]
    fn test_scroll_to_bottom_counts_widened_bullets() {
        let mut app = test_app();
        app.bot_name = "Sam".to_string();
        app.chat_width = 7;
        app.chat_height = 1;
        app.transcript = vec![ChatMessage {
            role: ChatRole::Assistant,
            content: "- abcd".to_string(),
        }];
        // "- abcd" renders as "  • abcd" (8 cells), wrapping to two
        // lines at width 7: role + 2 content + separator = 4 lines.
        app.scroll_to_bottom();
        assert_eq!(app.scroll, 3);
    }

    #[test]
    fn test_reveal_completes_through_ticks() {
        let mut app = test_app();
        app.finish_reply(Ok("Hi there!".to_string()));

        let mut guard = 0;
        while app.reveal.is_some() {
            app.tick();
            guard += 1;
            assert!(guard < 1000, "reveal must terminate");
        }
        assert_eq!(app.phase(), Phase::Idle);
        assert_eq!(app.transcript.last().expect("entry").content, "Hi there!");
    }

    #[test]
    fn test_typing_dots_cycle_only_while_awaiting() {
        let mut app = test_app();
        for _ in 0..20 {
            app.tick();
        }
        assert_eq!(app.typing_dots, 0);
    }

    #[test]
    fn test_model_picker_selection_bounds() {
        let mut app = test_app();
        app.open_model_picker(vec!["a".into(), "b".into()]);
        assert!(app.show_model_picker);

        app.model_picker_nav_up();
        assert_eq!(app.model_picker_state.selected(), Some(0));
        app.model_picker_nav_down();
        app.model_picker_nav_down();
        app.model_picker_nav_down();
        assert_eq!(app.model_picker_state.selected(), Some(1));
    }

    #[test]
    fn test_open_model_picker_with_no_models_is_noop() {
        let mut app = test_app();
        app.open_model_picker(Vec::new());
        assert!(!app.show_model_picker);
    }
}
