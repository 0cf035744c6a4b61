use crate::app::App;
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the saved-collection panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = if app.saved_filtered.is_empty() {
        vec![ListItem::new("No matches found")]
    } else {
        app.saved_filtered
            .iter()
            .enumerate()
            .map(|(i, post)| {
                let style = if i == app.selected_saved {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else {
                    Style::default()
                };

                let max_name = area.width.saturating_sub(20) as usize;
                let name = strip_control_chars(&post.recipe_name);
                let name = truncate_to_width(&name, max_name).into_owned();

                let spans = vec![
                    Span::styled(name, style),
                    Span::styled(
                        format!("  {}", strip_control_chars(&post.username)),
                        Style::default().fg(Color::DarkGray),
                    ),
                ];

                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let title = if app.saved_search_mode {
        format!("Search My Collection: {}_", app.saved_search)
    } else if app.saved_search.is_empty() {
        "My Collection".to_string()
    } else {
        format!("My Collection (filter: {})", app.saved_search)
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(list, area);
}
