//! Render functions for the TUI.
//!
//! Dispatches to the appropriate screen based on application state and draws
//! the transient overlays (the "Saved" popup) on top.

use crate::app::{App, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{compose, detail, feed, saved, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 50;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::Feed => feed::render(f, app, chunks[0]),
        View::Saved => saved::render(f, app, chunks[0]),
        View::Detail => detail::render(f, app, chunks[0]),
        View::Compose => compose::render(f, app, chunks[0]),
    }

    status::render(f, app, chunks[1]);

    // "Saved" popup rides above whichever screen is showing until it expires
    if let Some((recipe_name, _)) = &app.save_popup {
        render_saved_popup(f, recipe_name, chunks[0]);
    }
}

/// Render the auto-dismissing "Saved" popup along the bottom of the screen.
fn render_saved_popup(f: &mut Frame, recipe_name: &str, area: Rect) {
    let height = 3u16;
    if area.height <= height {
        return;
    }
    let overlay = Rect::new(
        area.x,
        area.y + area.height - height,
        area.width,
        height,
    );

    f.render_widget(Clear, overlay);

    let text = format!("Saved \"{}\"  ·  Go to Collection [2]", recipe_name);
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    f.render_widget(paragraph, overlay);
}
