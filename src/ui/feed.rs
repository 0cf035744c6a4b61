use crate::app::{App, LikeState, SaveState};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the feed list panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = if app.feed.is_empty() {
        vec![ListItem::new("No matches found")]
    } else {
        app.feed
            .iter()
            .zip(app.feed_rows.iter())
            .enumerate()
            .map(|(i, (post, row))| {
                let mut spans = Vec::new();

                // Bookmark indicator
                if row.save == SaveState::Saved {
                    spans.push(Span::styled("★ ", Style::default().fg(Color::Yellow)));
                }

                let title_style = if i == app.selected_feed {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else if post.username == app.config.username {
                    // Own posts stand out
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                // Leave room for the author/time/likes tail
                let max_name = area.width.saturating_sub(30) as usize;
                let name = strip_control_chars(&post.recipe_name);
                let name = truncate_to_width(&name, max_name).into_owned();
                spans.push(Span::styled(name, title_style));

                spans.push(Span::styled(
                    format!("  {} · {}", strip_control_chars(&post.username), post.time),
                    Style::default().fg(Color::DarkGray),
                ));

                let heart_style = if row.like == LikeState::Liked {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("  ♥{}", post.likes), heart_style));

                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let title = if app.feed_search_mode {
        format!("Search Feed: {}_", app.feed_search)
    } else if app.feed_search.is_empty() {
        "Feed".to_string()
    } else {
        format!("Feed (filter: {})", app.feed_search)
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(list, area);
}
