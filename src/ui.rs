use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{block::Title, Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use docchat_core::{Message, Sender};
use crate::app::{App, InputMode};

const SIDEBAR_WIDTH: u16 = 34;
const SPINNER: [&str; 3] = ["◐", "◓", "◑"];

/// Wrap text to fit within a given width (in terminal columns), returning multiple lines
/// Uses word boundaries for wrapping; words longer than the width are split.
/// Leading indentation is repeated on continuation lines and the spacing
/// between words on the same line is kept as written.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let text = text.replace('\t', "    ");
    let body = text.trim_start();
    let mut indent = &text[..text.len() - body.len()];
    // Indentation wider than half the row is dropped
    if indent.width() * 2 > width {
        indent = "";
    }
    let indent_width = indent.width();

    let mut lines = Vec::new();
    let mut current_line = indent.to_string();
    let mut current_width = indent_width;
    let mut gap = "";
    let mut rest = body;

    while !rest.is_empty() {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = &rest[..word_end];
        let after = &rest[word_end..];
        let next = after.trim_start();

        let word_width = word.width();
        let line_started = current_width > indent_width;

        if line_started && current_width + gap.width() + word_width <= width {
            current_line.push_str(gap);
            current_line.push_str(word);
            current_width += gap.width() + word_width;
        } else {
            if line_started {
                lines.push(std::mem::replace(&mut current_line, indent.to_string()));
                current_width = indent_width;
            }
            // Hard-split words that can never fit (URLs, hashes)
            for c in word.chars() {
                let char_width = c.width().unwrap_or(0);
                if current_width + char_width > width && current_width > indent_width {
                    lines.push(std::mem::replace(&mut current_line, indent.to_string()));
                    current_width = indent_width;
                }
                current_line.push(c);
                current_width += char_width;
            }
        }

        gap = &after[..after.len() - next.len()];
        rest = next;
    }

    if current_width > indent_width || lines.is_empty() {
        lines.push(current_line);
    }

    lines
}

/// Render `**bold**` runs; everything else is literal text
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

/// Lines for one transcript entry: a header with sender and time, the
/// wrapped body, and a blank separator.
fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let (label_color, alignment) = match message.sender() {
        Sender::User => (Color::Cyan, Alignment::Right),
        Sender::Assistant => (Color::Yellow, Alignment::Left),
    };

    lines.push(
        Line::from(vec![
            Span::styled(
                message.sender().label(),
                Style::default().fg(label_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                message.timestamp().format("%H:%M:%S").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ])
        .alignment(alignment),
    );

    for paragraph in message.content().lines() {
        for wrapped in wrap_text_to_width(paragraph, width) {
            let line = match message.sender() {
                Sender::User => Line::from(wrapped),
                Sender::Assistant => parse_markdown_line(&wrapped),
            };
            lines.push(line.alignment(alignment));
        }
    }
    lines.push(Line::default());
    lines
}

fn spinner(app: &App) -> &'static str {
    SPINNER[(app.animation_frame as usize) % SPINNER.len()]
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [sidebar_area, chat_area] = Layout::horizontal([
        Constraint::Length(SIDEBAR_WIDTH.min(body_area.width / 2)),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, sidebar_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);

    if app.input_mode == InputMode::FilePrompt {
        render_file_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Document AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Intelligent Document Assistant ", Style::default().fg(Color::Gray)),
    ];

    if let Some(status) = app.session.status() {
        let provider_color = if status.provider_connected { Color::Green } else { Color::Red };
        let (docs_color, docs_text) = if status.ready {
            (Color::Green, "Ready")
        } else {
            (Color::Yellow, "No Docs")
        };
        spans.extend(vec![
            Span::styled(" ● ", Style::default().fg(provider_color)),
            Span::raw("OpenAI"),
            Span::styled(" ● ", Style::default().fg(docs_color)),
            Span::raw(docs_text),
            Span::styled(" ● ", Style::default().fg(Color::Blue)),
            Span::raw(status.embedding_provider.clone()),
        ]);
    } else {
        spans.push(Span::styled(
            format!(" {} Checking status...", spinner(app)),
            Style::default().fg(Color::Gray),
        ));
    }

    spans.extend(vec![
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &App, frame: &mut Frame, area: Rect) {
    let [upload_area, status_area, quick_start_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Min(0),
    ])
    .areas(area);

    // Upload panel
    let upload_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Upload Document ");

    let selected = match app.session.pending_upload() {
        Some(file) => Line::from(vec![
            Span::styled("File: ", Style::default().fg(Color::Gray)),
            Span::styled(file.file_name.clone(), Style::default().fg(Color::Cyan)),
        ]),
        None => Line::from(Span::styled(
            "No file selected",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let button = if app.session.is_uploading() {
        Line::from(Span::styled(
            format!("{} Processing...", spinner(app)),
            Style::default().fg(Color::Yellow),
        ))
    } else if app.session.pending_upload().is_some() {
        Line::from(vec![
            Span::styled(" u ", Style::default().bg(Color::Blue).fg(Color::White)),
            Span::raw(" Upload PDF  "),
            Span::styled(" x ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" clear"),
        ])
    } else {
        Line::from(vec![
            Span::styled(" o ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::styled(" Choose a PDF", Style::default().fg(Color::DarkGray)),
        ])
    };

    let upload = Paragraph::new(vec![selected, Line::default(), button])
        .block(upload_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(upload, upload_area);

    // Status panel
    let status_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" System Status ");

    let status_lines = match app.session.status() {
        Some(status) => {
            let row = |label: &str, value: String, color: Color| {
                Line::from(vec![
                    Span::styled(format!("{:<12}", label), Style::default().fg(Color::Gray)),
                    Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                ])
            };
            vec![
                row("Server", "Online".to_string(), Color::Green),
                if status.provider_connected {
                    row("OpenAI API", "Connected".to_string(), Color::Green)
                } else {
                    row("OpenAI API", "Error".to_string(), Color::Red)
                },
                if status.ready {
                    row("Documents", "Ready".to_string(), Color::Green)
                } else {
                    row("Documents", "Empty".to_string(), Color::Yellow)
                },
                row("Provider", status.embedding_provider.clone(), Color::Blue),
                Line::from(Span::styled(app.api_base.clone(), Style::default().fg(Color::DarkGray))),
            ]
        }
        None => vec![
            Line::from(Span::styled(
                format!("{} Checking status...", spinner(app)),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(app.api_base.clone(), Style::default().fg(Color::DarkGray))),
        ],
    };

    frame.render_widget(Paragraph::new(status_lines).block(status_block), status_area);

    // Quick start
    let steps = [
        "Upload a PDF document",
        "Wait for processing to complete",
        "Ask questions about the content",
        "Get AI-powered answers!",
    ];
    let quick_start_lines: Vec<Line> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            Line::from(vec![
                Span::styled(
                    format!(" {} ", i + 1),
                    Style::default().bg(Color::Blue).fg(Color::White),
                ),
                Span::raw(format!(" {}", step)),
            ])
        })
        .collect();

    let quick_start = Paragraph::new(quick_start_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Quick Start "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(quick_start, quick_start_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let ready = app.session.is_ready();
    let hint_height = if ready { 0 } else { 1 };

    let [transcript_area, input_area, hint_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(hint_height),
    ])
    .areas(area);

    app.chat_area = Some(transcript_area);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat with your documents ");
    if app.has_messages() {
        block = block.title(Title::from(" C clear chat ").alignment(Alignment::Right));
    }

    let inner = block.inner(transcript_area);
    let width = inner.width as usize;

    if !app.has_messages() && !app.session.is_asking() {
        app.sync_scroll(0, inner.height);
        render_welcome(app, frame, block, transcript_area);
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for message in app.session.conversation().messages() {
            lines.extend(message_lines(message, width));
        }

        if app.session.is_asking() {
            lines.push(Line::from(Span::styled(
                Sender::Assistant.label(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("{} Thinking{}", spinner(app), dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        let total_lines = lines.len().min(u16::MAX as usize) as u16;
        app.sync_scroll(total_lines, inner.height);

        let transcript = Paragraph::new(Text::from(lines))
            .block(block)
            .scroll((app.scroll.offset(), 0));
        frame.render_widget(transcript, transcript_area);

        if app.scroll.show_jump_to_bottom() {
            render_jump_badge(frame, inner);
        }
    }

    render_input(app, frame, input_area);

    if hint_height > 0 {
        let hint = Paragraph::new(Line::from(vec![
            Span::styled(" ! ", Style::default().bg(Color::Yellow).fg(Color::Black)),
            Span::styled(
                " Please upload a PDF document to start chatting!",
                Style::default().fg(Color::Yellow),
            ),
        ]));
        frame.render_widget(hint, hint_area);
    }
}

fn render_welcome(app: &App, frame: &mut Frame, block: Block, area: Rect) {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut text = vec![
        Line::from(Span::styled(
            "Welcome to Document AI!",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Upload a PDF document and start asking questions about its content.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "I'll help you understand and analyze your documents.",
            Style::default().fg(Color::Gray),
        )),
    ];
    if let Some(path) = &app.log_path {
        text.push(Line::default());
        text.push(Line::from(Span::styled(
            format!("Logs: {}", path.display()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let top_padding = inner.height.saturating_sub(text.len() as u16) / 2;
    let [_, centered] = Layout::vertical([Constraint::Length(top_padding), Constraint::Min(0)]).areas(inner);

    let welcome = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(welcome, centered);
}

fn render_jump_badge(frame: &mut Frame, inner: Rect) {
    let label = " ↓ G new messages ";
    let width = (label.chars().count() as u16).min(inner.width);
    if width == 0 || inner.height == 0 {
        return;
    }
    let badge_area = Rect::new(
        inner.x + inner.width - width,
        inner.y + inner.height - 1,
        width,
        1,
    );
    frame.render_widget(Clear, badge_area);
    frame.render_widget(
        Paragraph::new(label).style(Style::default().bg(Color::Blue).fg(Color::White).bold()),
        badge_area,
    );
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let ready = app.session.is_ready();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if !ready {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let title = if app.session.is_asking() {
        format!(" {} Waiting for answer ", spinner(app))
    } else if app.can_send() {
        " Ask (Enter to send) ".to_string()
    } else {
        " Ask (i to type) ".to_string()
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() && !editing {
        Paragraph::new(Span::styled(
            "Ask a question about your document...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Line breaks show as a return symbol on the single-line input
        let visible_text: String = app
            .input
            .chars()
            .map(|c| if c == '\n' { '⏎' } else { c })
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let color = if ready { Color::Cyan } else { Color::DarkGray };
        Paragraph::new(visible_text).style(Style::default().fg(color))
    };

    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
        InputMode::FilePrompt => Style::default().bg(Color::Magenta).fg(Color::White),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " ASK ",
        InputMode::FilePrompt => " FILE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" ask ", label_style),
            Span::styled(" o ", key_style),
            Span::styled(" open ", label_style),
            Span::styled(" u ", key_style),
            Span::styled(" upload ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" status ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" C ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
        InputMode::FilePrompt => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
    };

    if let Some(notice) = &app.notice {
        hints.push(Span::styled(format!("  {}", notice), Style::default().fg(Color::Yellow)));
    }

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

fn render_file_prompt(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered, never larger than the frame)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height).intersection(area);
    if popup_area.is_empty() {
        return;
    }

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Select PDF ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [instructions_area, _, input_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let instructions = Paragraph::new("Type or paste the path to a .pdf file. Enter to select, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(instructions, instructions_area);

    let width = input_area.width as usize;
    if width == 0 || input_area.height == 0 {
        return;
    }
    let scroll_offset = if app.file_cursor >= width {
        app.file_cursor - width + 1
    } else {
        0
    };
    let visible: String = app.file_input.chars().skip(scroll_offset).take(width).collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (app.file_cursor - scroll_offset) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}
