use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use advisory_chat::render::split_lines;
use advisory_chat::{AnswerView, Message, MessageContent, Role, KNOWN_MODELS};

use crate::app::{App, Overlay};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        match after.find("**") {
            Some(end) if end > 0 => {
                if start > 0 {
                    spans.push(Span::raw(rest[..start].to_string()));
                }
                spans.push(Span::styled(
                    after[..end].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after[end + 2..];
            }
            // No closing **, treat as literal
            _ => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn labelled(label: &str, value: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(label.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(value.to_string(), Style::default().fg(color)),
    ])
}

/// Styled lines for one transcript entry, heading included.
fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match message.role {
        Role::User => lines.push(Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))),
        Role::Assistant => lines.push(Line::from(Span::styled(
            "Advisor:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))),
    }

    match &message.content {
        MessageContent::Text(text) => {
            lines.extend(split_lines(text).into_iter().map(Line::from));
        }
        MessageContent::Answer(AnswerView::Maturity {
            domain,
            level,
            next_level,
            answer,
        }) => {
            lines.push(labelled("🌎 Domain: ", domain, Color::Blue));
            lines.push(labelled("📊 Current Maturity Level: ", level, Color::Green));
            if let Some(next) = next_level {
                lines.push(labelled("🔄 Next Maturity Level: ", next, Color::Red));
            }
            lines.push(Line::from(Span::styled(
                "💡 Answer:",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(answer.iter().map(|l| parse_markdown_line(l)));
        }
        MessageContent::Answer(AnswerView::Block { label, lines: body }) => {
            lines.push(Line::from(Span::styled(
                format!("{}:", label.title()),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )));
            lines.extend(body.iter().map(|l| parse_markdown_line(l)));
        }
    }

    lines.push(Line::default());
    lines
}

/// Rows the chat paragraph takes once word-wrapped to `width`.
fn wrapped_rows(chat: &Paragraph, width: u16) -> u16 {
    u16::try_from(chat.line_count(width)).unwrap_or(u16::MAX)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let attachment_height = if app.session.composer().has_file() { 1 } else { 0 };

    // Main layout: header, chat, attachment, input, footer
    let [header_area, chat_area, attachment_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(attachment_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if attachment_height > 0 {
        render_attachment(app, frame, attachment_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    match app.overlay.clone() {
        Overlay::None => {}
        Overlay::ModelPicker => render_model_picker(app, frame, area),
        Overlay::FilePrompt => render_file_prompt(app, frame, area),
        Overlay::Notice(text) => render_notice(&text, frame, area),
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" 💰 Customer Q&A Advisory Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!(" {} ", app.base_url), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Model: {} ", app.models.display_name()));

    let messages = app.visible_messages();

    let lines: Vec<Line> = if messages.is_empty() && !app.session.busy() {
        vec![Line::from(Span::styled(
            "Type your question, or press Ctrl+O to attach a text file...",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        let mut lines: Vec<Line> = messages.iter().flat_map(message_lines).collect();

        if app.session.busy() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("🔎 Finding relevant Bucket & support chat logs{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    };

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    // Inner size minus borders
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let total = wrapped_rows(&chat, inner_width);

    app.max_chat_scroll = total.saturating_sub(inner_height);
    if app.follow_tail || app.chat_scroll > app.max_chat_scroll {
        app.chat_scroll = app.max_chat_scroll;
    }

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_attachment(app: &App, frame: &mut Frame, area: Rect) {
    let composer = app.session.composer();
    let name = composer.file_name().unwrap_or("file");
    let line = Line::from(vec![
        Span::styled(" 📂 ", Style::default().fg(Color::Yellow)),
        Span::styled(name.to_string(), Style::default().fg(Color::Yellow).bold()),
        Span::styled(
            format!(" ({} bytes attached, Ctrl+X to remove)", composer.file_content().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.session.busy();
    let border_color = if busy { Color::DarkGray } else { Color::Yellow };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Type your question... ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let snapshot = app.session.snapshot();
    let cursor_pos = snapshot.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input
    let visible_text: String = snapshot
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if app.overlay == Overlay::None {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.session.busy() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
    ];
    if app.session.busy() {
        hints.extend(vec![
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" ^O ", key_style),
        Span::styled(" attach ", label_style),
        Span::styled(" ^P ", key_style),
        Span::styled(" model ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Centered popup rectangle, clamped to `area`.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 44, KNOWN_MODELS.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Choose Model (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = KNOWN_MODELS
        .iter()
        .map(|(id, name)| {
            let style = if *id == app.models.current() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ({}) ", name, id)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

fn render_file_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 70, 6);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Attach Text File ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Path to a .txt file. Enter to attach, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let width = input_area.width as usize;
    let len = app.file_prompt.chars().count();
    let skip = len.saturating_sub(width.saturating_sub(1));
    let visible: String = app.file_prompt.chars().skip(skip).collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (len - skip).min(width) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

fn render_notice(text: &str, frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Notice (press any key) ");

    let notice = Paragraph::new(text.to_string())
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(notice, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory_chat::BlockLabel;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("Move to **Level 3** next");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "Level 3");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));

        let line = parse_markdown_line("unclosed **bold");
        assert_eq!(plain(&line), "unclosed **bold");
    }

    #[test]
    fn test_maturity_lines_skip_missing_next_level() {
        let message = Message::assistant_answer(AnswerView::Maturity {
            domain: "X".to_string(),
            level: "2".to_string(),
            next_level: None,
            answer: vec!["line one".to_string(), String::new(), "line three".to_string()],
        });
        let lines: Vec<String> = message_lines(&message).iter().map(plain).collect();
        assert_eq!(lines[0], "Advisor:");
        assert_eq!(lines[1], "🌎 Domain: X");
        assert_eq!(lines[2], "📊 Current Maturity Level: 2");
        assert_eq!(lines[3], "💡 Answer:");
        assert_eq!(&lines[4..7], &["line one", "", "line three"]);
        assert!(!lines.iter().any(|l| l.contains("Next Maturity Level")));
    }

    #[test]
    fn test_text_lines_match_plain_output() {
        let message = Message::user("first\r\nsecond\n\nlast\n");
        let lines: Vec<String> = message_lines(&message).iter().map(plain).collect();
        let expected = message.content.display_lines();

        assert_eq!(expected, vec!["first", "second", "", "last"]);
        assert_eq!(lines[0], "You:");
        assert_eq!(&lines[1..lines.len() - 1], expected.as_slice());
    }

    #[test]
    fn test_block_lines_have_title() {
        let message = Message::assistant_answer(AnswerView::Block {
            label: BlockLabel::CurrentBucket,
            lines: vec!["L2".to_string()],
        });
        let lines: Vec<String> = message_lines(&message).iter().map(plain).collect();
        assert_eq!(&lines[..3], &["Advisor:", "Current Bucket:", "L2"]);
    }

    #[test]
    fn test_wrapped_rows_follow_word_wrap() {
        let rows = |lines: Vec<Line<'static>>, width| {
            wrapped_rows(&Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), width)
        };
        assert_eq!(rows(vec![Line::from("abcdefghij")], 10), 1);
        assert_eq!(rows(vec![Line::from("abcdefghijk")], 10), 2);
        // Word wrap needs a row more than the character count suggests
        assert_eq!(rows(vec![Line::from("abcd efgh ij")], 6), 3);
    }
}
