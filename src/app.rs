use crate::config::Config;
use crate::content::GeneratedRecipe;
use crate::feed::{build_feed, filter_by_name, seed_posts};
use crate::storage::{is_saved, Comment, Post, PostDraft, Store, ValidationError};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How long transient status messages stay on screen.
const STATUS_DURATION: Duration = Duration::from_secs(4);

/// Detail-screen prompt when the selected recipe has no body.
pub const PROMPT_MISSING: &str =
    "It looks like the recipe for this dish is either incomplete or missing. AI-generate one instead?";

/// Detail-screen prompt when a recipe body is present.
pub const PROMPT_DEFAULT: &str =
    "Not the recipe you're looking for? AI-generate a new one instead!";

// ============================================================================
// View and Row-State Enums
// ============================================================================

/// Current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Saved,
    Detail,
    Compose,
}

/// Heart state on a feed row. Transient display state; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Unliked,
    Liked,
}

/// Bookmark state on a feed row. Flips optimistically before the store write
/// completes; a failed write leaves it inconsistent until the next reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Unsaved,
    Saved,
}

/// Whether the user has already rated the selected recipe this session.
/// Rating is one-time per viewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingState {
    Unrated,
    Rated,
}

/// Per-row visual state for a feed entry. One of several mutually exclusive
/// states per concern, not loose booleans scattered across render code.
#[derive(Debug, Clone, Copy)]
pub struct PostRowState {
    pub like: LikeState,
    pub save: SaveState,
}

// ============================================================================
// Detail-Screen Modes
// ============================================================================

/// Input mode on the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailMode {
    View,
    /// Editing one ingredient/direction row in place.
    Edit { buffer: String },
    /// Composing a comment.
    Comment { buffer: String },
    /// Waiting for a 1-5 rating keypress.
    Rate,
}

// ============================================================================
// Compose-Screen State
// ============================================================================

/// Which compose field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    Name,
    Time,
    Ingredient(usize),
    Direction(usize),
}

/// Draft state for the share-new-recipe screen.
///
/// Ingredient/direction lists hold transient blank placeholder rows while
/// editing; they are filtered at creation time.
#[derive(Debug, Clone)]
pub struct ComposeState {
    pub draft: PostDraft,
    pub focus: ComposeField,
}

impl Default for ComposeState {
    fn default() -> Self {
        Self {
            draft: PostDraft {
                ingredients: vec![String::new()],
                directions: vec![String::new()],
                ..Default::default()
            },
            focus: ComposeField::Name,
        }
    }
}

// ============================================================================
// Background Task Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    SaveToggled {
        recipe_name: String,
        saved: bool,
    },
    SaveToggleFailed {
        recipe_name: String,
    },
    GenerateComplete {
        recipe_name: String,
        generation: u64,
        recipe: GeneratedRecipe,
    },
}

// ============================================================================
// Rating Math
// ============================================================================

/// Fold one 1-5 rating into a display average.
///
/// "N/A" (or any unparseable display value) counts as an empty history.
pub fn merge_rating(rating: &str, count: u32, value: u8) -> (String, u32) {
    let current: f64 = rating.parse().unwrap_or(0.0);
    let new_count = count + 1;
    let new_avg = (current * count as f64 + value as f64) / new_count as f64;
    (format!("{:.1}", new_avg), new_count)
}

// ============================================================================
// Application State
// ============================================================================

/// All mutable application state.
///
/// Screen state is a transient copy of durable store state; it goes stale the
/// moment a screen loses focus and is refreshed by the explicit `reload_*`
/// operations when the screen becomes visible again. The store is an injected
/// dependency; nothing here reaches for globals.
pub struct App {
    pub store: Store,
    pub client: reqwest::Client,
    pub config: Config,
    pub api_key: Option<Arc<SecretString>>,
    /// Completion API base override; `None` means the official endpoint.
    pub generator_base_url: Option<String>,

    pub view: View,
    pub needs_redraw: bool,
    pub status_message: Option<(String, Instant)>,

    // Feed screen
    pub seed: Vec<Post>,
    pub authored: Vec<Post>,
    pub feed: Vec<Post>,
    pub feed_rows: Vec<PostRowState>,
    pub feed_search: String,
    pub feed_search_mode: bool,
    pub selected_feed: usize,

    // Saved screen
    pub collection: Vec<Post>,
    /// Materialized filter over `collection`; recomputed explicitly whenever
    /// the collection or the query changes.
    pub saved_filtered: Vec<Post>,
    pub saved_search: String,
    pub saved_search_mode: bool,
    pub selected_saved: usize,

    // Detail screen
    /// Screen to return to when leaving the detail view; set by whichever
    /// list opened the recipe.
    pub detail_return: View,
    pub detail: Option<Post>,
    /// Display copies of the selected recipe's body. Clearing or generating
    /// only touches these; nothing persists without an explicit save.
    pub detail_ingredients: Vec<String>,
    pub detail_directions: Vec<String>,
    pub detail_prompt: &'static str,
    pub detail_mode: DetailMode,
    pub detail_cursor: usize,
    pub detail_dirty: bool,
    pub detail_rating: RatingState,
    pub generating: bool,
    pub generate_generation: u64,

    // Compose screen
    pub compose: ComposeState,

    /// "Saved" popup with auto-dismiss.
    pub save_popup: Option<(String, Instant)>,
}

impl App {
    pub fn new(store: Store, config: Config, api_key: Option<SecretString>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            store,
            client,
            config,
            api_key: api_key.map(Arc::new),
            generator_base_url: None,
            view: View::Feed,
            needs_redraw: true,
            status_message: None,
            seed: seed_posts(),
            authored: Vec::new(),
            feed: Vec::new(),
            feed_rows: Vec::new(),
            feed_search: String::new(),
            feed_search_mode: false,
            selected_feed: 0,
            collection: Vec::new(),
            saved_filtered: Vec::new(),
            saved_search: String::new(),
            saved_search_mode: false,
            selected_saved: 0,
            detail_return: View::Feed,
            detail: None,
            detail_ingredients: Vec::new(),
            detail_directions: Vec::new(),
            detail_prompt: PROMPT_DEFAULT,
            detail_mode: DetailMode::View,
            detail_cursor: 0,
            detail_dirty: false,
            detail_rating: RatingState::Unrated,
            generating: false,
            generate_generation: 0,
            compose: ComposeState::default(),
            save_popup: None,
        })
    }

    // ========================================================================
    // Status / Popup
    // ========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear the status message once it has been on screen long enough.
    /// Returns true if something was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        let mut cleared = false;

        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed() >= STATUS_DURATION {
                self.status_message = None;
                cleared = true;
            }
        }

        if let Some((_, shown_at)) = &self.save_popup {
            if shown_at.elapsed() >= Duration::from_secs(self.config.save_popup_seconds) {
                self.save_popup = None;
                cleared = true;
            }
        }

        cleared
    }

    // ========================================================================
    // Focus-Triggered Reloads
    // ========================================================================

    /// Switch screens, re-reading durable state for the incoming screen.
    /// In-memory copies are stale the moment a screen loses focus.
    pub async fn switch_view(&mut self, view: View) {
        self.view = view;
        self.needs_redraw = true;
        match view {
            View::Feed => self.reload_feed().await,
            View::Saved => self.reload_saved().await,
            View::Detail => self.reload_detail().await,
            View::Compose => {} // draft state is intentionally kept across visits
        }
    }

    /// Re-read the authored list and saved collection for the feed screen.
    ///
    /// Storage failures degrade to empty lists; corruption was already logged
    /// by the store and must not block the UI.
    pub async fn reload_feed(&mut self) {
        self.authored = match self.store.load_authored_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load authored posts");
                Vec::new()
            }
        };
        self.collection = match self.store.load_saved_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load saved collection");
                Vec::new()
            }
        };
        self.apply_feed_filter();
    }

    /// Rebuild the merged feed and its per-row view states.
    ///
    /// Row states reset to the durable truth: bookmark glyphs come from
    /// collection membership, hearts start unliked.
    pub fn apply_feed_filter(&mut self) {
        self.feed = build_feed(&self.authored, &self.seed, &self.feed_search);
        self.feed_rows = self
            .feed
            .iter()
            .map(|p| PostRowState {
                like: LikeState::Unliked,
                save: if is_saved(&self.collection, &p.recipe_name) {
                    SaveState::Saved
                } else {
                    SaveState::Unsaved
                },
            })
            .collect();
        if self.selected_feed >= self.feed.len() {
            self.selected_feed = self.feed.len().saturating_sub(1);
        }
        self.needs_redraw = true;
    }

    /// Re-read the saved collection for the collection screen.
    pub async fn reload_saved(&mut self) {
        self.collection = match self.store.load_saved_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load saved collection");
                Vec::new()
            }
        };
        self.apply_saved_filter();
    }

    /// Recompute the materialized saved-screen filter. Callers must invoke
    /// this after every collection or query change; the filtered list is
    /// not derived reactively.
    pub fn apply_saved_filter(&mut self) {
        self.saved_filtered = filter_by_name(&self.collection, &self.saved_search);
        if self.selected_saved >= self.saved_filtered.len() {
            self.selected_saved = self.saved_filtered.len().saturating_sub(1);
        }
        self.needs_redraw = true;
    }

    /// Re-read the selected-post slot for the detail screen.
    pub async fn reload_detail(&mut self) {
        self.detail = match self.store.selected_post().await {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load selected post");
                None
            }
        };

        match &self.detail {
            Some(post) => {
                self.detail_prompt = if post.ingredients.is_empty() || post.directions.is_empty() {
                    PROMPT_MISSING
                } else {
                    PROMPT_DEFAULT
                };
                self.detail_ingredients = post.ingredients.clone();
                self.detail_directions = post.directions.clone();
            }
            None => {
                self.detail_prompt = PROMPT_DEFAULT;
                self.detail_ingredients.clear();
                self.detail_directions.clear();
            }
        }
        self.detail_mode = DetailMode::View;
        self.detail_cursor = 0;
        self.detail_dirty = false;
        self.detail_rating = RatingState::Unrated;
        self.generating = false;
        self.needs_redraw = true;
    }

    // ========================================================================
    // Feed Actions
    // ========================================================================

    pub fn feed_post(&self) -> Option<&Post> {
        self.feed.get(self.selected_feed)
    }

    /// Toggle the heart on the selected feed row. Display-only engagement:
    /// the adjusted count lives in the row's post copy for this screen visit.
    pub fn like_selected(&mut self) {
        let idx = self.selected_feed;
        let (Some(row), Some(post)) = (self.feed_rows.get_mut(idx), self.feed.get_mut(idx)) else {
            return;
        };

        row.like = match row.like {
            LikeState::Unliked => {
                post.likes = post.likes.saturating_add(1);
                LikeState::Liked
            }
            LikeState::Liked => {
                post.likes = post.likes.saturating_sub(1);
                LikeState::Unliked
            }
        };
        self.needs_redraw = true;
    }

    /// Toggle saved state for the selected feed row.
    ///
    /// The bookmark flips optimistically before the store write completes;
    /// the write runs as a background task and reports back over the event
    /// channel. A failed write leaves the flag inconsistent with durable
    /// state until the next focus reload, deliberately not auto-corrected.
    pub fn toggle_save_selected(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        let idx = self.selected_feed;
        let (Some(row), Some(post)) = (self.feed_rows.get_mut(idx), self.feed.get(idx)) else {
            return;
        };

        row.save = match row.save {
            SaveState::Unsaved => {
                self.save_popup = Some((post.recipe_name.clone(), Instant::now()));
                SaveState::Saved
            }
            SaveState::Saved => SaveState::Unsaved,
        };
        self.needs_redraw = true;

        let store = self.store.clone();
        let snapshot = post.clone();
        let tx = event_tx.clone();
        tokio::spawn(async move {
            let event = match store.toggle_save(&snapshot).await {
                Ok(saved) => AppEvent::SaveToggled {
                    recipe_name: snapshot.recipe_name.clone(),
                    saved,
                },
                Err(e) => {
                    tracing::warn!(recipe = %snapshot.recipe_name, error = %e, "Save toggle failed");
                    AppEvent::SaveToggleFailed {
                        recipe_name: snapshot.recipe_name.clone(),
                    }
                }
            };
            if tx.send(event).await.is_err() {
                tracing::warn!("Failed to send save-toggle result (receiver dropped)");
            }
        });
    }

    /// Record the selected feed post into the clicked-post slot and open the
    /// detail screen.
    pub async fn open_feed_post(&mut self) {
        let Some(post) = self.feed_post().cloned() else {
            return;
        };
        if let Err(e) = self.store.select_post(&post).await {
            tracing::warn!(error = %e, "Failed to record selected post");
            self.set_status("Could not open recipe");
            return;
        }
        self.detail_return = View::Feed;
        self.switch_view(View::Detail).await;
    }

    // ========================================================================
    // Saved-Screen Actions
    // ========================================================================

    pub fn saved_post(&self) -> Option<&Post> {
        self.saved_filtered.get(self.selected_saved)
    }

    /// Remove the selected entry from the saved collection by name.
    pub async fn remove_selected_saved(&mut self) {
        let Some(name) = self.saved_post().map(|p| p.recipe_name.clone()) else {
            return;
        };
        if let Err(e) = self.store.remove_saved_by_name(&name).await {
            tracing::warn!(recipe = %name, error = %e, "Failed to remove saved recipe");
            self.set_status("Could not remove recipe");
            return;
        }
        self.set_status(format!("Removed \"{}\" from collection", name));
        self.reload_saved().await;
    }

    /// Open the selected collection entry on the detail screen.
    pub async fn open_saved_post(&mut self) {
        let Some(post) = self.saved_post().cloned() else {
            return;
        };
        if let Err(e) = self.store.select_post(&post).await {
            tracing::warn!(error = %e, "Failed to record selected post");
            self.set_status("Could not open recipe");
            return;
        }
        self.detail_return = View::Saved;
        self.switch_view(View::Detail).await;
    }

    // ========================================================================
    // Detail-Screen Actions
    // ========================================================================

    /// Total display rows: ingredients then directions.
    pub fn detail_row_count(&self) -> usize {
        self.detail_ingredients.len() + self.detail_directions.len()
    }

    /// Transient display reset; never persisted. Only re-selecting or
    /// regenerating brings the content back.
    pub fn clear_detail_ingredients(&mut self) {
        self.detail_ingredients.clear();
        self.detail_cursor = 0;
        self.needs_redraw = true;
    }

    pub fn clear_detail_directions(&mut self) {
        self.detail_directions.clear();
        self.detail_cursor = self.detail_cursor.min(self.detail_row_count().saturating_sub(1));
        self.needs_redraw = true;
    }

    /// Spawn a background generation task for the selected recipe.
    ///
    /// The generation counter discards results that arrive after the user
    /// has moved on to a different recipe.
    pub fn start_generate(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        let Some(post) = self.detail.clone() else {
            return;
        };
        if self.generating {
            return;
        }

        self.generating = true;
        self.generate_generation = self.generate_generation.wrapping_add(1);
        let generation = self.generate_generation;
        self.needs_redraw = true;

        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let model = self.config.generator_model.clone();
        let base_url = self.generator_base_url.clone();
        let tx = event_tx.clone();

        tracing::info!(recipe = %post.recipe_name, "Generating missing recipe details");
        tokio::spawn(async move {
            let recipe = crate::content::generate(
                &client,
                api_key.as_deref(),
                &model,
                &post.recipe_name,
                base_url.as_deref(),
            )
            .await;

            let event = AppEvent::GenerateComplete {
                recipe_name: post.recipe_name,
                generation,
                recipe,
            };
            if tx.send(event).await.is_err() {
                tracing::warn!("Failed to send generation result (receiver dropped)");
            }
        });
    }

    /// Overwrite (not merge) the displayed recipe body with generated
    /// content. Untrusted input: it replaces the display layer only and is
    /// persisted solely through the explicit save action.
    ///
    /// A failed generation arrives here as an empty recipe and empties the
    /// displayed lists; there is nothing worth writing back in that case.
    pub fn apply_generated(&mut self, recipe: GeneratedRecipe) {
        self.generating = false;
        self.detail_dirty = !recipe.is_empty();
        self.detail_prompt = if recipe.is_empty() {
            PROMPT_MISSING
        } else {
            PROMPT_DEFAULT
        };
        self.detail_ingredients = recipe.ingredients;
        self.detail_directions = recipe.directions;
        self.detail_cursor = 0;
        self.needs_redraw = true;
    }

    /// Explicitly write edited/generated content back.
    ///
    /// Updates the clicked-post slot and, when the recipe is an authored one,
    /// the authored list. Saved-collection snapshots are never updated;
    /// copy-on-save is the contract.
    pub async fn save_detail_edits(&mut self) {
        let Some(mut post) = self.detail.clone() else {
            return;
        };
        post.ingredients = self
            .detail_ingredients
            .iter()
            .filter(|i| !i.trim().is_empty())
            .cloned()
            .collect();
        post.directions = self
            .detail_directions
            .iter()
            .filter(|d| !d.trim().is_empty())
            .cloned()
            .collect();

        if let Err(e) = self.store.select_post(&post).await {
            tracing::warn!(error = %e, "Failed to update selected post");
            self.set_status("Could not save changes");
            return;
        }

        match self.store.update_authored_post(&post).await {
            Ok(true) => self.set_status("Saved changes"),
            Ok(false) => self.set_status("Saved for this view (not your post)"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to write back edited post");
                self.set_status("Could not save changes");
                return;
            }
        }

        self.detail = Some(post);
        self.detail_dirty = false;
        self.needs_redraw = true;
    }

    /// Append a comment to the selected recipe, attributed to the configured
    /// local user. Persisted into the authored list when the post is ours.
    pub async fn add_comment(&mut self, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let Some(mut post) = self.detail.clone() else {
            return;
        };

        post.comments.push(Comment {
            username: self.config.username.clone(),
            text,
        });

        if let Err(e) = self.store.select_post(&post).await {
            tracing::warn!(error = %e, "Failed to update selected post");
            self.set_status("Could not add comment");
            return;
        }
        if let Err(e) = self.store.update_authored_post(&post).await {
            tracing::warn!(error = %e, "Failed to persist comment");
        }

        self.detail = Some(post);
        self.set_status("Comment added");
    }

    /// Fold in a one-time 1-5 rating. Repeat ratings in the same viewing are
    /// rejected.
    pub async fn apply_rating(&mut self, value: u8) {
        if self.detail_rating == RatingState::Rated {
            self.set_status("Already rated");
            return;
        }
        let Some(mut post) = self.detail.clone() else {
            return;
        };

        let (rating, count) = merge_rating(&post.rating, post.rating_count, value);
        post.rating = rating;
        post.rating_count = count;

        if let Err(e) = self.store.select_post(&post).await {
            tracing::warn!(error = %e, "Failed to update selected post");
            self.set_status("Could not rate recipe");
            return;
        }
        if let Err(e) = self.store.update_authored_post(&post).await {
            tracing::warn!(error = %e, "Failed to persist rating");
        }

        self.detail_rating = RatingState::Rated;
        self.set_status(format!("Rated {} \u{2605}", value));
        self.detail = Some(post);
    }

    // ========================================================================
    // Compose Actions
    // ========================================================================

    /// Run the create flow on the current draft.
    ///
    /// Validation failure is surfaced as a blocking status with nothing
    /// written. On success the draft resets and the app returns to the feed.
    pub async fn submit_draft(&mut self) {
        let draft = self.compose.draft.clone();
        match self.store.create_post(draft, &self.config.username).await {
            Ok(post) => {
                self.compose = ComposeState::default();
                self.set_status(format!("Posted \"{}\"", post.recipe_name));
                self.switch_view(View::Feed).await;
            }
            Err(e) => {
                if let Some(v) = e.downcast_ref::<ValidationError>() {
                    self.set_status(v.to_string());
                } else {
                    tracing::warn!(error = %e, "Failed to create post");
                    self.set_status("Could not save post");
                }
            }
        }
    }
}

// ============================================================================
// Event Handling
// ============================================================================

/// Apply a background task result to app state.
pub fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::SaveToggled { recipe_name, saved } => {
            tracing::debug!(recipe = %recipe_name, saved, "Save toggle persisted");
        }
        AppEvent::SaveToggleFailed { recipe_name } => {
            // The optimistic flag stays as-is; the next focus reload
            // resynchronizes with durable state.
            app.set_status(format!("Could not update \"{}\"", recipe_name));
        }
        AppEvent::GenerateComplete {
            recipe_name,
            generation,
            recipe,
        } => {
            if generation != app.generate_generation {
                tracing::debug!(recipe = %recipe_name, "Discarding stale generation result");
                return;
            }
            if app
                .detail
                .as_ref()
                .map(|p| p.recipe_name != recipe_name)
                .unwrap_or(true)
            {
                app.generating = false;
                return;
            }
            if recipe.is_empty() {
                tracing::info!(recipe = %recipe_name, "Generation returned nothing");
            }
            // Overwrite semantics either way: a failed generation shows an
            // empty recipe body, never an error dialog
            app.apply_generated(recipe);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rating_from_unrated() {
        let (rating, count) = merge_rating("N/A", 0, 4);
        assert_eq!(rating, "4.0");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_merge_rating_averages() {
        let (rating, count) = merge_rating("4.0", 1, 5);
        assert_eq!(rating, "4.5");
        assert_eq!(count, 2);

        let (rating, count) = merge_rating(&rating, count, 1);
        assert_eq!(rating, "3.3");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_compose_default_has_placeholder_rows() {
        let compose = ComposeState::default();
        assert_eq!(compose.draft.ingredients, vec![""]);
        assert_eq!(compose.draft.directions, vec![""]);
        assert_eq!(compose.focus, ComposeField::Name);
    }
}
