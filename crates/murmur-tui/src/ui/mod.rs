pub mod modals;
pub mod sidebar;
pub mod theme;
pub mod views;

use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::App;
use theme::Theme;

pub type Tui = ratatui::Terminal<CrosstermBackend<Stdout>>;

pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = ratatui::Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

pub fn render(frame: &mut Frame, app: &App) {
    let theme = Theme::from_settings(&app.settings);

    if app.auth.is_loading {
        views::render_loading(frame, &theme);
    } else if app.auth.user.is_none() {
        views::render_signed_out(frame, &theme);
    } else {
        views::render_main(frame, app, &theme);
        if app.sidebar_open {
            sidebar::render(frame, app, &theme);
        }
        if let Some(modal) = &app.modal {
            modals::render(frame, app, modal, &theme);
        }
    }

    if let Some(alert) = &app.alert {
        modals::render_alert(frame, alert, &theme);
    }
}

/// A centered overlay rect, sized as percentages of the frame.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
