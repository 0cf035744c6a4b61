use crate::app::{App, DetailMode, RatingState};
use crate::util::strip_control_chars;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the recipe detail screen
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let Some(post) = &app.detail else {
        let empty = Paragraph::new("No recipe selected. Open one from the feed or collection.")
            .block(Block::default().borders(Borders::ALL).title("Recipe"));
        f.render_widget(empty, area);
        return;
    };

    let input_height = match app.detail_mode {
        DetailMode::Edit { .. } | DetailMode::Comment { .. } => 3,
        _ => 0,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(input_height),
        ])
        .split(area);

    // Header: name, author/time, engagement
    let rated = if app.detail_rating == RatingState::Rated {
        " (rated)"
    } else {
        ""
    };
    let header_lines = vec![
        Line::from(Span::styled(
            strip_control_chars(&post.recipe_name).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "by {} · {} · {}",
                strip_control_chars(&post.username),
                post.time,
                post.recipe_time
            ),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            format!(
                "rating {} ({}){} · ♥{} · [{}]",
                post.rating, post.rating_count, rated, post.likes, post.image
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(
        Paragraph::new(header_lines).block(Block::default().borders(Borders::BOTTOM)),
        chunks[0],
    );

    // Generator prompt box
    let prompt_text = if app.generating {
        "Generating missing recipe details...".to_string()
    } else {
        format!("{} [g]", app.detail_prompt)
    };
    f.render_widget(
        Paragraph::new(prompt_text)
            .style(Style::default().fg(Color::Green))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );

    // Body: ingredients, directions, comments
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_line = 0usize;

    lines.push(Line::from(Span::styled(
        "Ingredients",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if app.detail_ingredients.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (none)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, item) in app.detail_ingredients.iter().enumerate() {
        let selected = app.detail_cursor == i;
        if selected {
            cursor_line = lines.len();
        }
        lines.push(row_line(
            format!("• {}", strip_control_chars(item)),
            selected,
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Directions",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if app.detail_directions.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (none)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let ingredient_count = app.detail_ingredients.len();
    for (i, step) in app.detail_directions.iter().enumerate() {
        let selected = app.detail_cursor == ingredient_count + i;
        if selected {
            cursor_line = lines.len();
        }
        lines.push(row_line(
            format!("{}. {}", i + 1, strip_control_chars(step)),
            selected,
        ));
    }

    if !post.comments.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Comments",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for comment in &post.comments {
            lines.push(Line::from(Span::styled(
                format!(
                    "{}: {}",
                    strip_control_chars(&comment.username),
                    strip_control_chars(&comment.text)
                ),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    // Keep the cursor row in view
    let visible = chunks[2].height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(visible / 2).min(u16::MAX as usize) as u16;

    let title = if app.detail_dirty {
        "Recipe (unsaved changes, [w] to keep them)"
    } else {
        "Recipe"
    };
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((scroll, 0)),
        chunks[2],
    );

    // Mode-specific input line
    match &app.detail_mode {
        DetailMode::Edit { buffer } => {
            f.render_widget(
                Paragraph::new(format!("> {}_", buffer))
                    .block(Block::default().borders(Borders::ALL).title("Edit entry")),
                chunks[3],
            );
        }
        DetailMode::Comment { buffer } => {
            f.render_widget(
                Paragraph::new(format!("> {}_", buffer))
                    .block(Block::default().borders(Borders::ALL).title("Add comment")),
                chunks[3],
            );
        }
        _ => {}
    }
}

fn row_line(text: String, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    };
    Line::from(Span::styled(text, style))
}
