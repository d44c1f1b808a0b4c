use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use murmur_core::tag::TAG_PALETTE;

use crate::app::{App, DeadlineChoice, Modal, SettingsState, TagManagerMode, TagManagerState, TagPickerState};

use super::centered_rect;
use super::theme::{Theme, hex_color};

pub fn render(frame: &mut Frame, app: &App, modal: &Modal, theme: &Theme) {
    match modal {
        Modal::ConfirmDeleteTask { title, .. } => {
            confirm(frame, theme, "Delete Task", &[
                "Are you sure you want to delete this task?".to_string(),
                String::new(),
                format!("  {title}"),
            ]);
        }
        Modal::ConfirmDeleteTag { name, .. } => {
            confirm(frame, theme, "Delete Tag", &[
                format!("Delete tag \"{name}\"?"),
                "This will remove the tag from all tasks.".to_string(),
            ]);
        }
        Modal::EditTitle { buffer, .. } => render_edit_title(frame, theme, buffer),
        Modal::DeadlinePicker { has_deadline, index, .. } => {
            render_deadline_picker(frame, theme, *has_deadline, *index);
        }
        Modal::TagManager(state) => render_tag_manager(frame, app, theme, state),
        Modal::TagPicker(state) => render_tag_picker(frame, app, theme, state),
        Modal::Settings(state) => render_settings(frame, theme, state),
    }
}

fn frame_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
}

fn hint_line(text: &str, theme: &Theme) -> Line<'static> {
    Line::styled(text.to_string(), Style::default().fg(theme.text_secondary))
}

fn confirm(frame: &mut Frame, theme: &Theme, title: &str, message: &[String]) {
    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = message
        .iter()
        .map(|text| Line::styled(text.clone(), Style::default().fg(theme.text)))
        .collect();
    lines.push(Line::raw(""));
    lines.push(hint_line("[Enter] Delete   [Esc] Cancel", theme));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(frame_block(title, theme));
    frame.render_widget(body, area);
}

fn render_edit_title(frame: &mut Frame, theme: &Theme, buffer: &str) {
    let area = centered_rect(60, 25, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::styled(format!("> {buffer}█"), Style::default().fg(theme.text)),
        Line::raw(""),
        hint_line("[Enter] Save   [Esc] Cancel", theme),
    ];
    let body = Paragraph::new(lines).block(frame_block("Edit Task", theme));
    frame.render_widget(body, area);
}

fn render_deadline_picker(frame: &mut Frame, theme: &Theme, has_deadline: bool, index: usize) {
    let area = centered_rect(40, 35, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::styled(
        "Choose when this task should be completed:",
        Style::default().fg(theme.text_secondary),
    )];
    for (i, choice) in DeadlineChoice::options(has_deadline).into_iter().enumerate() {
        let selected = i == index;
        let marker = if selected { "❯ " } else { "  " };
        let style = if selected {
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)
        } else if choice == DeadlineChoice::Remove {
            Style::default().fg(theme.error)
        } else {
            Style::default().fg(theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.primary)),
            Span::styled(choice.label(), style),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(hint_line("[Enter] Set   [Esc] Cancel", theme));

    let body = Paragraph::new(lines).block(frame_block("Set Deadline", theme));
    frame.render_widget(body, area);
}

fn palette_row(selected: usize, theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, swatch) in TAG_PALETTE.iter().enumerate() {
        let symbol = if i == selected { "[●]" } else { " ● " };
        spans.push(Span::styled(symbol, Style::default().fg(hex_color(swatch))));
    }
    spans.push(Span::styled(
        "  ←/→",
        Style::default().fg(theme.text_secondary),
    ));
    Line::from(spans)
}

fn render_tag_manager(frame: &mut Frame, app: &App, theme: &Theme, state: &TagManagerState) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();

    match state.mode {
        TagManagerMode::Create => {
            lines.push(Line::styled(
                format!("Name: {}█", state.name_buffer),
                Style::default().fg(theme.text),
            ));
            lines.push(palette_row(state.color_index, theme));
            lines.push(Line::raw(""));
            lines.push(hint_line("[Enter] Create   [Esc] Back", theme));
        }
        TagManagerMode::Rename => {
            lines.push(Line::styled(
                format!("New name: {}█", state.name_buffer),
                Style::default().fg(theme.text),
            ));
            lines.push(Line::raw(""));
            lines.push(hint_line("[Enter] Rename   [Esc] Back", theme));
        }
        TagManagerMode::Recolor => {
            lines.push(palette_row(state.color_index, theme));
            lines.push(Line::raw(""));
            lines.push(hint_line("[Enter] Recolor   [Esc] Back", theme));
        }
        TagManagerMode::List => {
            lines.push(hint_line(
                "[n] New   [e] Rename   [c] Recolor   [x] Delete   [Esc] Close",
                theme,
            ));
        }
    }
    lines.push(Line::raw(""));

    if app.tags.is_empty() {
        lines.push(Line::styled(
            "No tags yet. Create your first tag to organize tasks.",
            Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC),
        ));
    } else {
        for (i, tag) in app.tags.iter().enumerate() {
            let cursor = state.mode == TagManagerMode::List && i == state.selected;
            let marker = if cursor { "❯ " } else { "  " };
            let mut line = Line::from(vec![
                Span::styled(marker, Style::default().fg(theme.primary)),
                Span::styled("● ", Style::default().fg(hex_color(&tag.color))),
                Span::styled(tag.name.clone(), Style::default().fg(theme.text)),
            ]);
            if cursor {
                line = line.style(Style::default().bg(theme.surface));
            }
            lines.push(line);
        }
    }

    let body = Paragraph::new(lines).block(frame_block("Manage Tags", theme));
    frame.render_widget(body, area);
}

fn render_tag_picker(frame: &mut Frame, app: &App, theme: &Theme, state: &TagPickerState) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();

    match &state.chosen {
        None => lines.push(Line::styled(
            "Loading tags...",
            Style::default().fg(theme.text_secondary),
        )),
        Some(chosen) => {
            if app.tags.is_empty() {
                lines.push(Line::styled(
                    "No tags available. Create some tags first.",
                    Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC),
                ));
            }
            for (i, tag) in app.tags.iter().enumerate() {
                let cursor = i == state.selected;
                let marker = if cursor { "❯ " } else { "  " };
                let checkbox = if chosen.contains(&tag.id) { "[x] " } else { "[ ] " };
                let mut line = Line::from(vec![
                    Span::styled(marker, Style::default().fg(theme.primary)),
                    Span::raw(checkbox),
                    Span::styled("● ", Style::default().fg(hex_color(&tag.color))),
                    Span::styled(tag.name.clone(), Style::default().fg(theme.text)),
                ]);
                if cursor {
                    line = line.style(Style::default().bg(theme.surface));
                }
                lines.push(line);
            }
        }
    }

    lines.push(Line::raw(""));
    lines.push(hint_line("[Space] Toggle   [Enter] Apply   [Esc] Cancel", theme));

    let body = Paragraph::new(lines).block(frame_block("Select Tags", theme));
    frame.render_widget(body, area);
}

fn render_settings(frame: &mut Frame, theme: &Theme, state: &SettingsState) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);

    let key_display = if state.show_key {
        state.api_key_buffer.clone()
    } else {
        "•".repeat(state.api_key_buffer.len())
    };

    let row = |field: usize, label: String| -> Line<'static> {
        let cursor = state.field == field;
        let marker = if cursor { "❯ " } else { "  " };
        let mut line = Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.primary)),
            Span::styled(label, Style::default().fg(theme.text)),
        ]);
        if cursor {
            line = line.style(Style::default().bg(theme.surface));
        }
        line
    };

    let lines = vec![
        row(0, format!("API key: {key_display}█  (Tab reveals)")),
        row(1, format!("AI features: {}", on_off(state.ai_enabled))),
        row(2, format!("Theme: {}", if state.dark_theme { "dark" } else { "light" })),
        row(3, "[ Save ]".to_string()),
        Line::raw(""),
        hint_line("[↑/↓] Move   [Space] Toggle   [Enter] Apply   [Esc] Close", theme),
    ];

    let body = Paragraph::new(lines).block(frame_block("Settings", theme));
    frame.render_widget(body, area);
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Blocking failure alert, rendered above everything.
pub fn render_alert(frame: &mut Frame, message: &str, theme: &Theme) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::styled(message.to_string(), Style::default().fg(theme.text)),
        Line::raw(""),
        hint_line("[Enter] OK", theme),
    ];
    let block = Block::default()
        .title("Error")
        .title_style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.error));
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .block(block);
    frame.render_widget(body, area);
}
