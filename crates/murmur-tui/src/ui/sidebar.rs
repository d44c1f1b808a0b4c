use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use murmur_core::filter::Selector;

use crate::app::App;

use super::theme::{Theme, hex_color};

const NAV_COUNT: usize = 5;

/// Left overlay panel: the five navigation filters, then one entry per
/// tag with its color swatch.
pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = frame.area();
    let width = 32.min(area.width);
    let panel = Rect::new(area.x, area.y, width, area.height);

    frame.render_widget(Clear, panel);

    let entries = app.sidebar_entries();
    let mut lines: Vec<Line> = Vec::new();

    lines.push(section_title("Navigation", theme));
    for (i, selector) in entries.iter().take(NAV_COUNT).enumerate() {
        lines.push(entry_line(app, theme, selector, i, None));
    }

    lines.push(Line::raw(""));
    lines.push(section_title("Tags", theme));
    if app.tags.is_empty() {
        lines.push(Line::styled(
            "No tags yet. Create tags to",
            Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC),
        ));
        lines.push(Line::styled(
            "organize your tasks.",
            Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC),
        ));
    } else {
        for (offset, selector) in entries.iter().skip(NAV_COUNT).enumerate() {
            let color = app
                .tags
                .get(offset)
                .map(|tag| hex_color(&tag.color));
            lines.push(entry_line(app, theme, selector, NAV_COUNT + offset, color));
        }
    }

    let block = Block::default()
        .title("Murmur")
        .title_style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), panel);
}

fn section_title(title: &str, theme: &Theme) -> Line<'static> {
    Line::styled(
        title.to_uppercase(),
        Style::default().fg(theme.text_secondary).add_modifier(Modifier::BOLD),
    )
}

fn entry_line(
    app: &App,
    theme: &Theme,
    selector: &Selector,
    index: usize,
    swatch: Option<ratatui::style::Color>,
) -> Line<'static> {
    let cursor = app.sidebar_index == index;
    let active = *selector == app.selector;

    let mut style = Style::default().fg(if active { theme.primary } else { theme.text });
    if active {
        style = style.add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![Span::styled(
        if cursor { "❯ " } else { "  " },
        Style::default().fg(theme.primary),
    )];
    if let Some(color) = swatch {
        spans.push(Span::styled("● ", Style::default().fg(color)));
    }
    let label = match selector {
        Selector::Tag { name, .. } => name.clone(),
        other => other.label(),
    };
    spans.push(Span::styled(label, style));

    let mut line = Line::from(spans);
    if cursor {
        line = line.style(Style::default().bg(theme.surface));
    }
    line
}
