use chrono::{DateTime, Duration, Local, Utc};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use murmur_core::filter::Selector;
use murmur_core::task::Task;

use crate::app::{App, InputMode};

use super::theme::Theme;

pub fn render_loading(frame: &mut Frame, theme: &Theme) {
    let area = super::centered_rect(40, 20, frame.area());
    let text = Paragraph::new("Loading...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme.text_secondary));
    frame.render_widget(text, area);
}

pub fn render_signed_out(frame: &mut Frame, theme: &Theme) {
    let area = super::centered_rect(60, 40, frame.area());
    let lines = vec![
        Line::styled(
            "Murmur",
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(
            "Please sign in to start capturing your tasks with voice and text.",
            Style::default().fg(theme.text_secondary),
        ),
        Line::styled(
            "Set auth_token in the config file or pass --set auth_token=...",
            Style::default().fg(theme.text_secondary),
        ),
        Line::raw(""),
        Line::styled("Press q to quit", Style::default().fg(theme.text_secondary)),
    ];
    let text = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(text, area);
}

pub fn render_main(frame: &mut Frame, app: &App, theme: &Theme) {
    let mut constraints = vec![Constraint::Length(2)];
    if app.banner_visible() {
        constraints.push(Constraint::Length(1));
    }
    if !app.tasks.is_empty() {
        constraints.push(Constraint::Length(4));
    }
    constraints.push(Constraint::Min(1));
    constraints.push(Constraint::Length(5));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let mut next = 0;
    render_header(frame, app, theme, chunks[next]);
    next += 1;

    if app.banner_visible() {
        render_banner(frame, theme, chunks[next]);
        next += 1;
    }
    if !app.tasks.is_empty() {
        render_stats(frame, app, theme, chunks[next]);
        next += 1;
    }

    render_list(frame, app, theme, chunks[next]);
    render_input(frame, app, theme, chunks[next + 1]);
}

fn render_header(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let name = app
        .auth
        .user
        .as_ref()
        .map(|user| user.display_name().to_string())
        .unwrap_or_else(|| "there".to_string());

    let mut subtitle = format!("Hey {name}! {} tasks pending", app.pending_count());
    if app.selector != Selector::All {
        subtitle.push_str(&format!("  ·  {}", app.selector.label()));
    }

    let lines = vec![
        Line::styled(
            "Murmur",
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        ),
        Line::styled(subtitle, Style::default().fg(theme.text_secondary)),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_banner(frame: &mut Frame, theme: &Theme, area: Rect) {
    let banner = Paragraph::new(Line::styled(
        "✓ Task created successfully!",
        Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(banner, area);
}

fn render_stats(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let entries = [
        (format!("{}%", app.completion_rate()), "Completion", theme.primary),
        (app.completed_count().to_string(), "Completed", theme.success),
        (app.pending_count().to_string(), "Pending", theme.warning),
    ];

    for (i, (value, label, accent)) in entries.into_iter().enumerate() {
        let lines = vec![
            Line::styled(value, Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            Line::styled(label, Style::default().fg(theme.text_secondary)),
        ];
        let card = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
        frame.render_widget(card, cards[i]);
    }
}

fn render_list(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    if app.tasks.is_empty() {
        let empty = Paragraph::new(vec![
            Line::raw(""),
            Line::styled(
                "No tasks yet",
                Style::default().fg(theme.text_secondary).add_modifier(Modifier::BOLD),
            ),
            Line::styled(
                "Use voice or text input below to create your first task",
                Style::default().fg(theme.text_secondary),
            ),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let rows = app.rows();
    let mut lines: Vec<Line> = Vec::new();

    if rows.is_empty() {
        lines.push(Line::styled(
            "Nothing matches this view",
            Style::default().fg(theme.text_secondary),
        ));
    }

    let now = Utc::now();
    let open_count = rows.iter().filter(|task| !task.is_completed()).count();
    let done_count = rows.len() - open_count;
    let mut row_index = 0;

    if open_count > 0 {
        lines.push(section_header(format!("To Do ({open_count})"), theme));
        for task in rows.iter().filter(|task| !task.is_completed()) {
            lines.push(task_line(app, theme, task, row_index, now));
            row_index += 1;
        }
    }
    if done_count > 0 {
        if open_count > 0 {
            lines.push(Line::raw(""));
        }
        lines.push(section_header(format!("Completed ({done_count})"), theme));
        for task in rows.iter().filter(|task| task.is_completed()) {
            lines.push(task_line(app, theme, task, row_index, now));
            row_index += 1;
        }
    }

    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(list, area);
}

fn section_header(title: String, theme: &Theme) -> Line<'static> {
    Line::styled(
        title,
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    )
}

fn task_line<'a>(
    app: &App,
    theme: &Theme,
    task: &'a Task,
    row_index: usize,
    now: DateTime<Utc>,
) -> Line<'a> {
    let busy = app.is_row_busy(task);
    let selected = app.selected == row_index;

    let mut title_style = Style::default().fg(theme.text);
    if task.is_completed() {
        title_style = Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    if busy {
        title_style = title_style.add_modifier(Modifier::DIM);
    }

    let marker = if selected { "❯ " } else { "  " };
    let checkbox = if task.is_completed() { "[✓] " } else { "[ ] " };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(theme.primary)),
        Span::styled(checkbox, Style::default().fg(theme.text_secondary)),
        Span::styled(task.title.as_str(), title_style),
    ];

    if let Some(deadline) = task.deadline {
        let chip_color = if task.is_overdue(now) { theme.error } else { theme.warning };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("⏰ {}", format_deadline(deadline, now)),
            Style::default().fg(chip_color),
        ));
    }
    if busy {
        spans.push(Span::styled("  …", Style::default().fg(theme.text_secondary)));
    }

    let mut line = Line::from(spans);
    if selected {
        line = line.style(Style::default().bg(theme.surface));
    }
    line
}

/// Today / Tomorrow / short date, like the original deadline chip.
pub fn format_deadline(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let deadline_local = deadline.with_timezone(&Local).date_naive();
    let today = now.with_timezone(&Local).date_naive();
    if deadline_local == today {
        "Today".to_string()
    } else if deadline_local == today + Duration::days(1) {
        "Tomorrow".to_string()
    } else {
        deadline_local.format("%b %d").to_string()
    }
}

fn render_input(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let voice_active = app.input_mode == InputMode::Voice;
    let active = Style::default().fg(theme.primary).add_modifier(Modifier::BOLD);
    let inactive = Style::default().fg(theme.text_secondary);

    let status = if app.transcribing {
        "Converting speech to text..."
    } else if app.creating {
        "Creating task..."
    } else if voice_active {
        "Enter the path of a recorded audio file"
    } else {
        ""
    };

    let mut mode_spans = vec![
        Span::styled("[ Voice ]", if voice_active { active } else { inactive }),
        Span::raw(" "),
        Span::styled("[ Text ]", if voice_active { inactive } else { active }),
    ];
    if !status.is_empty() {
        mode_spans.push(Span::raw("   "));
        mode_spans.push(Span::styled(status, Style::default().fg(theme.text_secondary)));
    }

    let placeholder = if voice_active {
        "Path to audio file..."
    } else {
        "Type a new task..."
    };
    let input_line = if app.input.is_empty() && !app.input_focused {
        Line::styled(format!("> {placeholder}"), Style::default().fg(theme.text_secondary))
    } else {
        let cursor = if app.input_focused { "█" } else { "" };
        Line::styled(
            format!("> {}{cursor}", app.input),
            Style::default().fg(theme.text),
        )
    };

    let hints = Line::styled(
        "i input · Tab mode · Space done · e edit · d due · t tags · x delete · m menu · g manage tags · s settings · r refresh · q quit",
        Style::default().fg(theme.text_secondary),
    );

    let body = vec![Line::from(mode_spans), input_line, hints];
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme.border));
    frame.render_widget(Paragraph::new(body).block(block), area);
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::format_deadline;

    #[test]
    fn deadline_chip_wording() {
        let now = Utc::now();
        assert_eq!(format_deadline(now, now), "Today");
        assert_eq!(format_deadline(now + Duration::days(1), now), "Tomorrow");
        let far = format_deadline(now + Duration::days(30), now);
        assert_ne!(far, "Today");
        assert_ne!(far, "Tomorrow");
    }
}
