use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppScreen, Panel, Prompt};
use crate::auth::{AuthField, AuthMode, AuthScreen};
use crate::channels;
use crate::input::TextInput;
use crate::models::initials;
use crate::profile::{ProfileField, ProfileOverlay};
use crate::session::TransportState;

pub fn draw(frame: &mut Frame, app: &App) {
    match &app.screen {
        AppScreen::Loading { message } => draw_loading(frame, message),
        AppScreen::Auth => draw_auth(frame, &app.auth),
        AppScreen::Chat => draw_chat(frame, app),
    }
}

fn draw_loading(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let block = Block::default()
        .title(" neonchat ")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(inner);

    let logo = Paragraph::new(vec![
        Line::from(Span::styled(
            "◆  N E O N C H A T",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Channels, in your terminal",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Yellow))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(logo, chunks[1]);
}

// ---- Auth ----

fn draw_auth(frame: &mut Frame, auth: &AuthScreen) {
    let area = frame.area();
    let height = match auth.mode {
        AuthMode::Login => 16,
        AuthMode::Register => 20,
    };
    let card = centered_rect(60, height, area);

    let title = match auth.mode {
        AuthMode::Login => " Sign in ",
        AuthMode::Register => " Create account ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let fields: Vec<(AuthField, &str, &TextInput)> = match auth.mode {
        AuthMode::Login => vec![
            (AuthField::Identifier, "Email or name", &auth.identifier),
            (AuthField::Password, "Password", &auth.password),
        ],
        AuthMode::Register => vec![
            (AuthField::FullName, "Full name", &auth.full_name),
            (AuthField::Email, "Email", &auth.email),
            (AuthField::NewPassword, "Password", &auth.new_password),
            (AuthField::ConfirmPassword, "Confirm password", &auth.confirm_password),
        ],
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "◆ IRC SIMPLE",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    let mut cursor = None;
    for (field, label, input) in &fields {
        let focused = auth.focus == *field;
        let label_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(*label, label_style)));
        if focused {
            cursor = Some((lines.len() as u16, input.cursor_column()));
        }
        lines.push(Line::from(vec![
            Span::styled("> ", label_style),
            Span::styled(input.display(), Style::default().fg(Color::White)),
        ]));
    }

    lines.push(Line::from(""));
    if !auth.error.is_empty() {
        lines.push(Line::from(Span::styled(
            auth.error.as_str(),
            Style::default().fg(Color::Red),
        )));
    }
    if !auth.message.is_empty() {
        lines.push(Line::from(Span::styled(
            auth.message.as_str(),
            Style::default().fg(Color::Green),
        )));
    }
    if auth.loading {
        let busy = match auth.mode {
            AuthMode::Login => "Signing in...",
            AuthMode::Register => "Creating account...",
        };
        lines.push(Line::from(Span::styled(busy, Style::default().fg(Color::Yellow))));
    }

    let toggle = match auth.mode {
        AuthMode::Login => "First time here? Ctrl+R: create account",
        AuthMode::Register => "Already have an account? Ctrl+R: back to sign in",
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab: next field │ Enter: submit │ Esc: quit",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        toggle,
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if let Some((row, col)) = cursor {
        frame.set_cursor_position((inner.x + 2 + col, inner.y + row));
    }
}

// ---- Chat shell ----

fn draw_chat(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    draw_body(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    if let Some(prompt) = app.prompt {
        draw_prompt(frame, app, prompt);
    }
    if let Some(ref profile) = app.profile {
        draw_profile(frame, profile);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let user_name = app.user_name();
    let connection = match app.session.state() {
        TransportState::Idle => ("", Color::DarkGray),
        TransportState::Connecting => ("● connecting", Color::Yellow),
        TransportState::Open => ("● live", Color::Green),
        TransportState::Closed => ("● offline", Color::Red),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " ◆ NEO_SERVER ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.active_channel_title(), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(connection.0, Style::default().fg(connection.1)),
        Span::raw("  "),
        Span::styled(
            format!("[{}] {} ", initials(user_name), user_name),
            Style::default().fg(Color::Green),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

fn draw_body(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(55),
            Constraint::Percentage(20),
        ])
        .split(area);

    draw_sidebar(frame, app, chunks[0]);
    if app.is_home() {
        draw_home(frame, app, chunks[1]);
    } else {
        draw_message_area(frame, app, chunks[1]);
    }
    draw_members(frame, app, chunks[2]);
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_panel == Panel::Sidebar;
    let border_color = if is_active { Color::Cyan } else { Color::DarkGray };

    let banner_height = if app.sidebar_error.is_empty() && app.sidebar_message.is_empty() {
        0
    } else {
        3
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(banner_height)])
        .split(area);

    let block = Block::default()
        .title(" Channels ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let me = app.user_name();
    let active = app.active_channel_id();
    let mut rows: Vec<(String, bool, bool)> = vec![(
        "Home".to_string(),
        active == Some(crate::models::HOME_CHANNEL_ID) || active.is_none(),
        false,
    )];
    for channel in app.channels.iter() {
        rows.push((
            channel.label(me),
            active == Some(channel.id),
            channel.is_owned_by(me),
        ));
    }

    let inner_height = block.inner(chunks[0]).height as usize;
    let scroll_start = if inner_height > 0 && app.sidebar_cursor >= inner_height {
        app.sidebar_cursor - inner_height + 1
    } else {
        0
    };

    let mut items: Vec<ListItem> = rows
        .into_iter()
        .enumerate()
        .skip(scroll_start)
        .take(inner_height.max(1))
        .map(|(i, (label, is_current, owned))| {
            let under_cursor = i == app.sidebar_cursor && is_active;
            let style = if is_current {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let indicator = if under_cursor { "▸ " } else { "  " };
            let mut spans = vec![Span::styled(indicator, style), Span::styled(label, style)];
            if owned {
                spans.push(Span::styled("  ×", Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    if app.channels.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "  No channels yet",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    frame.render_widget(List::new(items).block(block), chunks[0]);

    if banner_height > 0 {
        let (text, color) = if !app.sidebar_error.is_empty() {
            (app.sidebar_error.as_str(), Color::Red)
        } else {
            (app.sidebar_message.as_str(), Color::Green)
        };
        let banner = Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        frame.render_widget(banner, chunks[1]);
    }
}

fn draw_home(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_panel != Panel::Sidebar;
    let border_color = if is_active { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .title(" Home ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let me = app.user_name();
    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::from(Span::styled(format!("Welcome back, {}", me), heading)),
        Line::from(Span::styled(
            "Create or search for a channel to start chatting.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    if let Some(recent) = channels::recent(&app.channels, 1).first() {
        lines.push(Line::from(vec![
            Span::styled("e", heading),
            Span::styled(
                format!("  Enter most recent: {}", recent.label(me)),
                Style::default().fg(Color::White),
            ),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("c", heading),
        Span::styled("  Create a channel", Style::default().fg(Color::White)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("/", heading),
        Span::styled(
            "  Join with owner@channel",
            Style::default().fg(Color::White),
        ),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Your channels", heading)));
    let owned = channels::owned(&app.channels, me);
    if owned.is_empty() {
        lines.push(Line::from(Span::styled("  No channels yet", muted)));
    }
    for channel in owned.into_iter().take(5) {
        lines.push(Line::from(format!("  #{}", channel.name)));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Recently joined", heading)));
    let joined = channels::joined(&app.channels, me);
    if joined.is_empty() {
        lines.push(Line::from(Span::styled("  No joined channels yet", muted)));
    }
    for channel in joined.into_iter().take(5) {
        lines.push(Line::from(format!("  {}", channel.label(me))));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_message_area(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    draw_messages(frame, app, chunks[0]);
    draw_input(frame, app, chunks[1]);
}

fn draw_messages(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_panel == Panel::Messages;
    let border_color = if is_active { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .title(format!(" {} ", app.active_channel_title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let messages = app.session.messages();
    if messages.is_empty() {
        let empty = Paragraph::new("No messages yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let me = app.user_name();
    let mut lines: Vec<Line> = Vec::new();

    for msg in messages {
        let sender_style = if msg.is_from(me) {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        };

        lines.push(Line::from(vec![
            Span::styled(msg.sender.clone(), sender_style),
            Span::styled(
                format!("  {}", msg.formatted_time()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        for text_line in msg.content.lines() {
            lines.push(Line::from(Span::styled(
                format!("  {}", text_line),
                Style::default().fg(Color::White),
            )));
        }

        lines.push(Line::from(""));
    }

    let visible_height = inner.height as usize;
    let total_lines = lines.len();
    let max_scroll = total_lines.saturating_sub(visible_height);
    let scroll = max_scroll.saturating_sub(app.scroll_offset.min(max_scroll));

    let paragraph = Paragraph::new(Text::from(lines)).scroll((scroll as u16, 0));
    frame.render_widget(paragraph, inner);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.active_panel == Panel::Input;
    let border_color = if is_active { Color::Cyan } else { Color::DarkGray };

    let display_text = if app.chat_input.is_empty() {
        if !app.session.is_open() {
            "Not connected"
        } else if is_active {
            "Input text…"
        } else {
            "Press Tab to type"
        }
    } else {
        app.chat_input.as_str()
    };

    let style = if app.chat_input.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    let input = Paragraph::new(display_text).style(style).block(
        Block::default()
            .title(" Message ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    frame.render_widget(input, area);

    if is_active && app.prompt.is_none() && app.profile.is_none() {
        let cursor_pos = app.chat_input.cursor_column();
        frame.set_cursor_position((area.x + 1 + cursor_pos, area.y + 1));
    }
}

fn draw_members(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Members ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let members = app.session.members();
    let items: Vec<ListItem> = if members.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Not loaded",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        members
            .iter()
            .map(|m| {
                ListItem::new(Line::from(vec![
                    Span::styled("● ", Style::default().fg(Color::Cyan)),
                    Span::styled(m.name.clone(), Style::default().fg(Color::Cyan)),
                ]))
            })
            .collect()
    };
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let sep = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" Tab", key),
        Span::styled(" Switch │ ", sep),
        Span::styled("c", key),
        Span::styled(" Create │ ", sep),
        Span::styled("/", key),
        Span::styled(" Search │ ", sep),
        Span::styled("p", key),
        Span::styled(" Profile │ ", sep),
    ];
    if app.active_panel == Panel::Sidebar {
        spans.push(Span::styled("d", key));
        spans.push(Span::styled(" Delete │ ", sep));
    }
    spans.push(Span::styled("q", key));
    spans.push(Span::styled(" Quit ", sep));

    let bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(bar, area);
}

fn draw_prompt(frame: &mut Frame, app: &App, prompt: Prompt) {
    let area = frame.area();
    let popup = centered_rect(60, 7, area);
    frame.render_widget(Clear, popup);

    let (title, label, placeholder, input) = match prompt {
        Prompt::NewChannel => (
            " New Channel ",
            "Name:",
            "Channel name",
            &app.new_channel_name,
        ),
        Prompt::Search => (
            " Join Channel ",
            "Search:",
            "owner@channel",
            &app.search_query,
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let (text, style) = if input.is_empty() {
        (placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (input.display(), Style::default().fg(Color::White))
    };

    let lines = vec![
        Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::styled(text, style),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: confirm  │  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);

    frame.set_cursor_position((inner.x + 2 + input.cursor_column(), inner.y + 1));
}

fn draw_profile(frame: &mut Frame, profile: &ProfileOverlay) {
    let area = frame.area();
    let popup = centered_rect(60, 17, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Profile ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let fields = [
        (ProfileField::Name, "Name", &profile.name),
        (ProfileField::Email, "Email", &profile.email),
        (
            ProfileField::Password,
            "New password (leave empty to keep)",
            &profile.password,
        ),
    ];

    let mut lines = Vec::new();
    let mut cursor = None;
    for (field, label, input) in fields {
        let focused = profile.focus == field;
        let style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(label, style)));
        if focused {
            cursor = Some((lines.len() as u16, input.cursor_column()));
        }
        lines.push(Line::from(vec![
            Span::styled("> ", style),
            Span::styled(input.display(), Style::default().fg(Color::White)),
        ]));
    }

    lines.push(Line::from(""));
    if profile.loading {
        lines.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if !profile.error.is_empty() {
        lines.push(Line::from(Span::styled(
            profile.error.as_str(),
            Style::default().fg(Color::Red),
        )));
    }
    if !profile.message.is_empty() {
        lines.push(Line::from(Span::styled(
            profile.message.as_str(),
            Style::default().fg(Color::Green),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter: save │ Ctrl+L: log out │ Ctrl+D: delete account │ Esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if let Some((row, col)) = cursor {
        frame.set_cursor_position((inner.x + 2 + col, inner.y + row));
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(v[1])[1]
}
