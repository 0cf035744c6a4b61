use crate::app::{App, ComposeField};
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the share-new-recipe form
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let draft = &app.compose.draft;
    let focus = app.compose.focus;

    let mut lines: Vec<Line> = Vec::new();

    lines.push(field_line(
        "Recipe Name",
        &draft.recipe_name,
        focus == ComposeField::Name,
    ));
    lines.push(field_line(
        "Cooking Time",
        &draft.recipe_time,
        focus == ComposeField::Time,
    ));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Ingredients",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (i, item) in draft.ingredients.iter().enumerate() {
        lines.push(entry_line(
            format!("• {}", strip_control_chars(item)),
            focus == ComposeField::Ingredient(i),
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Directions",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (i, step) in draft.directions.iter().enumerate() {
        lines.push(entry_line(
            format!("{}. {}", i + 1, strip_control_chars(step)),
            focus == ComposeField::Direction(i),
        ));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Share New Recipe"),
    );

    f.render_widget(paragraph, area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let value_style = if focused {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    };
    let value_text = if focused {
        format!("{}_", strip_control_chars(value))
    } else {
        strip_control_chars(value).into_owned()
    };
    Line::from(vec![
        Span::styled(
            format!("{}: ", label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(value_text, value_style),
    ])
}

fn entry_line(text: String, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    };
    let text = if focused { format!("{}_", text) } else { text };
    Line::from(Span::styled(text, style))
}
