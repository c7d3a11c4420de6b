use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, ChatRole, InputMode};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            format!(" Tech Support — {} ", app.bot_name),
            Style::default().fg(app.theme.accent).bold(),
        ),
        Span::styled(
            format!("[{}] ", app.model),
            Style::default().fg(app.theme.dim),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(app.theme.dim),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim))
        .title(" Chat ");

    // Inner dimensions drive wrap and bottom-scroll calculations.
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat = Paragraph::new(Text::from(transcript_lines(app)))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

/// The styled chat lines in draw order. Scroll height math works from
/// the same lines, so wrapping and widened list prefixes count the way
/// they render.
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for (i, msg) in app.transcript.iter().enumerate() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default()
                        .fg(app.theme.user)
                        .add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", app.bot_name),
                    Style::default()
                        .fg(app.theme.bot)
                        .add_modifier(Modifier::BOLD),
                )));
                // While this turn is animating, show the revealed
                // prefix instead of the full reply.
                let content = match &app.reveal {
                    Some((index, reveal)) if *index == i => reveal.visible(),
                    _ => msg.content.as_str(),
                };
                lines.extend(markdown_lines(content));
            }
        }
        lines.push(Line::default());
    }

    if app.is_awaiting() {
        lines.push(Line::from(Span::styled(
            format!("{}:", app.bot_name),
            Style::default()
                .fg(app.theme.bot)
                .add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat(app.typing_dots as usize);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default()
                .fg(app.theme.dim)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing {
        app.theme.accent
    } else {
        app.theme.dim
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if app.is_awaiting() {
            " Waiting for reply… (Esc cancels) "
        } else {
            " Message (Enter to send) "
        });

    // Horizontal scroll keeps the cursor visible in a single-line box.
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(&app.input, app.cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(app.theme.user))
        .block(block);

    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Visible slice of the input line plus the cursor column, both in
/// display cells rather than chars so wide characters keep the
/// terminal cursor on the character being edited.
fn input_window(input: &str, cursor: usize, inner_width: usize) -> (String, u16) {
    let cursor_col: usize = input
        .chars()
        .take(cursor)
        .map(|c| c.width().unwrap_or(0))
        .sum();

    let scroll_cols = if inner_width == 0 {
        0
    } else if cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };

    let mut visible = String::new();
    let mut skipped = 0usize;
    let mut used = 0usize;
    for c in input.chars() {
        let w = c.width().unwrap_or(0);
        if skipped < scroll_cols {
            skipped += w;
            continue;
        }
        if used + w > inner_width {
            break;
        }
        visible.push(c);
        used += w;
    }

    let cursor_x = cursor_col.saturating_sub(skipped).min(inner_width) as u16;
    (visible, cursor_x)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.input_mode {
        InputMode::Editing => vec![
            ("Enter", "send"),
            ("Esc", "normal mode"),
            ("Ctrl+C", "quit"),
        ],
        InputMode::Normal => vec![
            ("i", "type"),
            ("j/k", "scroll"),
            ("t", "theme"),
            ("M", "models"),
            ("q", "quit"),
        ],
    };

    let mut spans: Vec<Span> = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(
            format!(" {} ", key),
            Style::default().fg(app.theme.accent).bold(),
        ));
        spans.push(Span::styled(
            format!("{} ", action),
            Style::default().fg(app.theme.dim),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(10).min(60);
    let height = (app.available_models.len() as u16 + 2).min(area.height.saturating_sub(4));
    let popup = centered_rect(width, height, area);

    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|m| ListItem::new(format!(" {} ", m)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.accent))
                .title(" Select model (Enter to confirm, Esc to close) "),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.accent)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup, &mut app.model_picker_state);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Render model output with light markdown: **bold**, *italic*,
/// `code`, and bullet / numbered list lines.
pub fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            let mut spans = vec![Span::raw("  • ")];
            spans.extend(parse_inline(rest));
            lines.push(Line::from(spans));
        } else if let Some((number, rest)) = split_ordered_item(trimmed) {
            let mut spans = vec![Span::raw(format!("  {} ", number))];
            spans.extend(parse_inline(rest));
            lines.push(Line::from(spans));
        } else {
            lines.push(Line::from(parse_inline(line)));
        }
    }

    lines
}

/// "3. take out the battery" -> ("3.", "take out the battery")
fn split_ordered_item(line: &str) -> Option<(&str, &str)> {
    let dot = line.find(". ")?;
    if dot == 0 || !line[..dot].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((&line[..dot + 1], &line[dot + 2..]))
}

fn parse_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut chars = text.chars().peekable();

    let flush = |plain: &mut String, spans: &mut Vec<Span<'static>>| {
        if !plain.is_empty() {
            spans.push(Span::raw(std::mem::take(plain)));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                let mut code = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '`' {
                        closed = true;
                        break;
                    }
                    code.push(inner);
                }
                if closed && !code.is_empty() {
                    flush(&mut plain, &mut spans);
                    spans.push(Span::styled(code, Style::default().fg(Color::Green)));
                } else {
                    plain.push('`');
                    plain.push_str(&code);
                }
            }
            '*' => {
                let bold = chars.peek() == Some(&'*');
                if bold {
                    chars.next();
                }
                let mut inner_text = String::new();
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if inner == '*' {
                        if bold {
                            if chars.peek() == Some(&'*') {
                                chars.next();
                                closed = true;
                                break;
                            }
                            inner_text.push('*');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        inner_text.push(inner);
                    }
                }
                if closed && !inner_text.is_empty() {
                    flush(&mut plain, &mut spans);
                    let modifier = if bold {
                        Modifier::BOLD
                    } else {
                        Modifier::ITALIC
                    };
                    spans.push(Span::styled(
                        inner_text,
                        Style::default().add_modifier(modifier),
                    ));
                } else {
                    // No closing marker: keep the literal text.
                    plain.push('*');
                    if bold {
                        plain.push('*');
                    }
                    plain.push_str(&inner_text);
                }
            }
            _ => plain.push(c),
        }
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parse_inline_bold() {
        let spans = parse_inline("a **bold** word");
        assert_eq!(joined(&spans), "a bold word");
        assert!(spans
            .iter()
            .any(|s| s.content == "bold" && s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_parse_inline_italic_and_code() {
        let spans = parse_inline("*soft* and `rm -rf`");
        assert_eq!(joined(&spans), "soft and rm -rf");
        assert!(spans
            .iter()
            .any(|s| s.content == "soft" && s.style.add_modifier.contains(Modifier::ITALIC)));
        assert!(spans
            .iter()
            .any(|s| s.content == "rm -rf" && s.style.fg == Some(Color::Green)));
    }

    #[test]
    fn test_parse_inline_unclosed_markers_stay_literal() {
        assert_eq!(joined(&parse_inline("2 * 3 = 6")), "2 * 3 = 6");
        assert_eq!(joined(&parse_inline("**oops")), "**oops");
        assert_eq!(joined(&parse_inline("`half open")), "`half open");
    }

    #[test]
    fn test_markdown_lines_bullets() {
        let lines = markdown_lines("intro\n- first\n* second\n1. third");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].spans[0].content.contains('•'));
        assert!(lines[2].spans[0].content.contains('•'));
        assert!(lines[3].spans[0].content.contains("1."));
    }

    #[test]
    fn test_markdown_lines_plain_text_unaltered() {
        let lines = markdown_lines("just a line");
        assert_eq!(lines.len(), 1);
        assert_eq!(joined(&lines[0].spans), "just a line");
    }

    #[test]
    fn test_input_window_fits_without_scrolling() {
        let (visible, cursor_x) = input_window("hello", 5, 10);
        assert_eq!(visible, "hello");
        assert_eq!(cursor_x, 5);
    }

    #[test]
    fn test_input_window_scrolls_to_keep_cursor_visible() {
        let (visible, cursor_x) = input_window("abcdefghij", 10, 4);
        assert_eq!(visible, "hij");
        assert_eq!(cursor_x, 3);
    }

    #[test]
    fn test_input_window_uses_display_cells_for_wide_chars() {
        // Each emoji occupies two display cells; the cursor column
        // must land after the last visible glyph, not at its middle.
        let (visible, cursor_x) = input_window("👋👋👋", 3, 4);
        assert_eq!(visible, "👋");
        assert_eq!(cursor_x, 2);

        let (visible, cursor_x) = input_window("ab👋", 3, 10);
        assert_eq!(visible, "ab👋");
        assert_eq!(cursor_x, 4);
    }

    #[test]
    fn test_split_ordered_item() {
        assert_eq!(
            split_ordered_item("12. step"),
            Some(("12.", "step"))
        );
        assert_eq!(split_ordered_item("no list"), None);
        assert_eq!(split_ordered_item(". broken"), None);
    }
}
