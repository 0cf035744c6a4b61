//! Keyboard input handling, dispatched by screen and input mode.

use crate::app::{App, AppEvent, ComposeField, DetailMode, View};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::loop_runner::Action;

/// Maximum allowed search query length (UI layer validation)
const MAX_SEARCH_LENGTH: usize = 256;

pub async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Ctrl+C always quits, regardless of mode
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match app.view {
        View::Feed => handle_feed_input(app, code, event_tx).await,
        View::Saved => handle_saved_input(app, code).await,
        View::Detail => handle_detail_input(app, code, event_tx).await,
        View::Compose => handle_compose_input(app, code, modifiers).await,
    }
}

// ============================================================================
// Feed Screen
// ============================================================================

async fn handle_feed_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.feed_search_mode {
        match code {
            KeyCode::Esc => {
                // Cancel search: clear the query and restore the full feed
                app.feed_search.clear();
                app.feed_search_mode = false;
                app.apply_feed_filter();
            }
            KeyCode::Enter => app.feed_search_mode = false,
            KeyCode::Backspace => {
                app.feed_search.pop();
                app.apply_feed_filter();
            }
            KeyCode::Char(c) => {
                if app.feed_search.len() < MAX_SEARCH_LENGTH {
                    app.feed_search.push(c);
                    app.apply_feed_filter();
                }
            }
            _ => {}
        }
        return Ok(Action::Continue);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Tab | KeyCode::Char('2') => app.switch_view(View::Saved).await,
        KeyCode::Char('3') | KeyCode::Char('n') => app.switch_view(View::Compose).await,
        KeyCode::Char('/') => app.feed_search_mode = true,
        KeyCode::Char('j') | KeyCode::Down => {
            if app.selected_feed + 1 < app.feed.len() {
                app.selected_feed += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.selected_feed = app.selected_feed.saturating_sub(1);
        }
        KeyCode::Enter => app.open_feed_post().await,
        KeyCode::Char('s') => app.toggle_save_selected(event_tx),
        KeyCode::Char('l') => app.like_selected(),
        _ => {}
    }

    Ok(Action::Continue)
}

// ============================================================================
// Saved-Collection Screen
// ============================================================================

async fn handle_saved_input(app: &mut App, code: KeyCode) -> Result<Action> {
    if app.saved_search_mode {
        match code {
            KeyCode::Esc => {
                app.saved_search.clear();
                app.saved_search_mode = false;
                app.apply_saved_filter();
            }
            KeyCode::Enter => app.saved_search_mode = false,
            KeyCode::Backspace => {
                app.saved_search.pop();
                app.apply_saved_filter();
            }
            KeyCode::Char(c) => {
                if app.saved_search.len() < MAX_SEARCH_LENGTH {
                    app.saved_search.push(c);
                    app.apply_saved_filter();
                }
            }
            _ => {}
        }
        return Ok(Action::Continue);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Tab | KeyCode::Char('3') => app.switch_view(View::Compose).await,
        KeyCode::Esc | KeyCode::Char('1') => app.switch_view(View::Feed).await,
        KeyCode::Char('/') => app.saved_search_mode = true,
        KeyCode::Char('j') | KeyCode::Down => {
            if app.selected_saved + 1 < app.saved_filtered.len() {
                app.selected_saved += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.selected_saved = app.selected_saved.saturating_sub(1);
        }
        KeyCode::Enter => app.open_saved_post().await,
        KeyCode::Char('d') => app.remove_selected_saved().await,
        _ => {}
    }

    Ok(Action::Continue)
}

// ============================================================================
// Recipe Detail Screen
// ============================================================================

async fn handle_detail_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Text-entry modes first
    match &mut app.detail_mode {
        DetailMode::Edit { buffer } => {
            match code {
                KeyCode::Esc => app.detail_mode = DetailMode::View,
                KeyCode::Enter => {
                    let committed = std::mem::take(buffer);
                    commit_detail_edit(app, committed);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return Ok(Action::Continue);
        }
        DetailMode::Comment { buffer } => {
            match code {
                KeyCode::Esc => app.detail_mode = DetailMode::View,
                KeyCode::Enter => {
                    let text = std::mem::take(buffer);
                    app.detail_mode = DetailMode::View;
                    app.add_comment(text).await;
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return Ok(Action::Continue);
        }
        DetailMode::Rate => {
            match code {
                KeyCode::Esc => app.detail_mode = DetailMode::View,
                KeyCode::Char(c @ '1'..='5') => {
                    app.detail_mode = DetailMode::View;
                    app.apply_rating(c as u8 - b'0').await;
                }
                _ => {}
            }
            return Ok(Action::Continue);
        }
        DetailMode::View => {}
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Esc | KeyCode::Char('b') => {
            let back = app.detail_return;
            app.switch_view(back).await;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.detail_cursor + 1 < app.detail_row_count() {
                app.detail_cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.detail_cursor = app.detail_cursor.saturating_sub(1);
        }
        KeyCode::Char('g') => app.start_generate(event_tx),
        KeyCode::Char('c') => app.clear_detail_ingredients(),
        KeyCode::Char('C') => app.clear_detail_directions(),
        KeyCode::Char('e') => {
            let current = detail_row(app, app.detail_cursor).map(str::to_string);
            if let Some(buffer) = current {
                app.detail_mode = DetailMode::Edit { buffer };
            }
        }
        KeyCode::Char('a') => {
            // New ingredient row, edited immediately
            app.detail_ingredients.push(String::new());
            app.detail_cursor = app.detail_ingredients.len() - 1;
            app.detail_mode = DetailMode::Edit {
                buffer: String::new(),
            };
        }
        KeyCode::Char('A') => {
            app.detail_directions.push(String::new());
            app.detail_cursor = app.detail_row_count() - 1;
            app.detail_mode = DetailMode::Edit {
                buffer: String::new(),
            };
        }
        KeyCode::Char('d') => {
            remove_detail_row(app, app.detail_cursor);
        }
        KeyCode::Char('w') => app.save_detail_edits().await,
        KeyCode::Char('r') => {
            if app.detail.is_some() {
                app.detail_mode = DetailMode::Rate;
            }
        }
        KeyCode::Char('m') => {
            if app.detail.is_some() {
                app.detail_mode = DetailMode::Comment {
                    buffer: String::new(),
                };
            }
        }
        _ => {}
    }

    Ok(Action::Continue)
}

/// Row content at a combined ingredients-then-directions index.
fn detail_row(app: &App, index: usize) -> Option<&str> {
    let ingredients = app.detail_ingredients.len();
    if index < ingredients {
        app.detail_ingredients.get(index).map(String::as_str)
    } else {
        app.detail_directions
            .get(index - ingredients)
            .map(String::as_str)
    }
}

/// Commit an edit buffer into the row under the cursor. A blanked buffer
/// removes the row. Changes are display-only until the user writes them back.
fn commit_detail_edit(app: &mut App, text: String) {
    app.detail_mode = DetailMode::View;

    if text.trim().is_empty() {
        remove_detail_row(app, app.detail_cursor);
        return;
    }

    let ingredients = app.detail_ingredients.len();
    let index = app.detail_cursor;
    if index < ingredients {
        if let Some(slot) = app.detail_ingredients.get_mut(index) {
            *slot = text.trim().to_string();
        }
    } else if let Some(slot) = app.detail_directions.get_mut(index - ingredients) {
        *slot = text.trim().to_string();
    }
    app.detail_dirty = true;
    app.needs_redraw = true;
}

fn remove_detail_row(app: &mut App, index: usize) {
    let ingredients = app.detail_ingredients.len();
    if index < ingredients {
        app.detail_ingredients.remove(index);
    } else if index - ingredients < app.detail_directions.len() {
        app.detail_directions.remove(index - ingredients);
    } else {
        return;
    }
    app.detail_cursor = app
        .detail_cursor
        .min(app.detail_row_count().saturating_sub(1));
    app.detail_dirty = true;
    app.needs_redraw = true;
}

// ============================================================================
// Compose Screen
// ============================================================================

async fn handle_compose_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action> {
    // Post the draft
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('p') {
        app.submit_draft().await;
        return Ok(Action::Continue);
    }

    match code {
        KeyCode::Esc => {
            // Back to the feed; the draft survives for the next visit
            app.switch_view(View::Feed).await;
        }
        KeyCode::Tab => focus_next(app),
        KeyCode::BackTab => focus_prev(app),
        KeyCode::Enter => match app.compose.focus {
            ComposeField::Name => app.compose.focus = ComposeField::Time,
            ComposeField::Time => app.compose.focus = ComposeField::Ingredient(0),
            ComposeField::Ingredient(i) => {
                // New entry row after the current one, matching the
                // newline-splits-the-list editing of the original form
                app.compose.draft.ingredients.insert(i + 1, String::new());
                app.compose.focus = ComposeField::Ingredient(i + 1);
            }
            ComposeField::Direction(i) => {
                app.compose.draft.directions.insert(i + 1, String::new());
                app.compose.focus = ComposeField::Direction(i + 1);
            }
        },
        KeyCode::Backspace => handle_compose_backspace(app),
        KeyCode::Char(c) => focused_buffer(app).push(c),
        _ => {}
    }

    Ok(Action::Continue)
}

fn focused_buffer(app: &mut App) -> &mut String {
    match app.compose.focus {
        ComposeField::Name => &mut app.compose.draft.recipe_name,
        ComposeField::Time => &mut app.compose.draft.recipe_time,
        ComposeField::Ingredient(i) => &mut app.compose.draft.ingredients[i],
        ComposeField::Direction(i) => &mut app.compose.draft.directions[i],
    }
}

/// Backspace edits the focused field; deleting past the start of an empty
/// list row removes the row and moves focus up, as long as one row remains.
fn handle_compose_backspace(app: &mut App) {
    match app.compose.focus {
        ComposeField::Ingredient(i) => {
            let rows = &mut app.compose.draft.ingredients;
            if rows[i].is_empty() && rows.len() > 1 {
                rows.remove(i);
                app.compose.focus = ComposeField::Ingredient(i.saturating_sub(1));
            } else {
                rows[i].pop();
            }
        }
        ComposeField::Direction(i) => {
            let rows = &mut app.compose.draft.directions;
            if rows[i].is_empty() && rows.len() > 1 {
                rows.remove(i);
                app.compose.focus = ComposeField::Direction(i.saturating_sub(1));
            } else {
                rows[i].pop();
            }
        }
        _ => {
            focused_buffer(app).pop();
        }
    }
}

fn focus_next(app: &mut App) {
    let ingredients = app.compose.draft.ingredients.len();
    let directions = app.compose.draft.directions.len();
    app.compose.focus = match app.compose.focus {
        ComposeField::Name => ComposeField::Time,
        ComposeField::Time => ComposeField::Ingredient(0),
        ComposeField::Ingredient(i) if i + 1 < ingredients => ComposeField::Ingredient(i + 1),
        ComposeField::Ingredient(_) => ComposeField::Direction(0),
        ComposeField::Direction(i) if i + 1 < directions => ComposeField::Direction(i + 1),
        ComposeField::Direction(_) => ComposeField::Name,
    };
}

fn focus_prev(app: &mut App) {
    let ingredients = app.compose.draft.ingredients.len();
    let directions = app.compose.draft.directions.len();
    app.compose.focus = match app.compose.focus {
        ComposeField::Name => ComposeField::Direction(directions.saturating_sub(1)),
        ComposeField::Time => ComposeField::Name,
        ComposeField::Ingredient(0) => ComposeField::Time,
        ComposeField::Ingredient(i) => ComposeField::Ingredient(i - 1),
        ComposeField::Direction(0) => ComposeField::Ingredient(ingredients.saturating_sub(1)),
        ComposeField::Direction(i) => ComposeField::Direction(i - 1),
    };
}
