use crate::app::{App, DetailMode, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Status bar needs at least 1 char width to be meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Use Cow to avoid allocations for static strings and borrowed status messages
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_str())
    } else {
        match app.view {
            View::Feed => {
                if app.feed_search_mode {
                    Cow::Borrowed("Type to search | ESC cancel | ENTER confirm")
                } else {
                    Cow::Borrowed(
                        "[Enter]open [s]ave [l]ike [/]search [n]ew recipe [Tab]collection [q]uit",
                    )
                }
            }
            View::Saved => {
                if app.saved_search_mode {
                    Cow::Borrowed("Type to search | ESC cancel | ENTER confirm")
                } else {
                    Cow::Borrowed("[Enter]open [d]remove [/]search [Esc]feed [q]uit")
                }
            }
            View::Detail => match app.detail_mode {
                DetailMode::Edit { .. } => {
                    Cow::Borrowed("Editing | ENTER commit (blank removes) | ESC cancel")
                }
                DetailMode::Comment { .. } => Cow::Borrowed("Comment | ENTER post | ESC cancel"),
                DetailMode::Rate => Cow::Borrowed("Rate 1-5 | ESC cancel"),
                DetailMode::View => Cow::Borrowed(
                    "[g]enerate [e]dit [a/A]add [d]el [c/C]lear [w]rite [r]ate [m]comment [Esc]back",
                ),
            },
            View::Compose => {
                Cow::Borrowed("[Tab]next field [Enter]new row [Ctrl+P]post [Esc]back")
            }
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}
