//! Integration tests for screen-level state: focus-triggered reloads, the
//! optimistic save toggle, and the generated-content display flow.
//!
//! These drive the `App` layer directly, without a terminal.

use forkful::app::{handle_app_event, App, AppEvent, SaveState, View};
use forkful::config::Config;
use forkful::content::GeneratedRecipe;
use forkful::storage::{PostDraft, Store};
use tokio::sync::mpsc;

async fn test_app() -> App {
    let store = Store::open(":memory:").await.unwrap();
    let mut app = App::new(store, Config::default(), None).unwrap();
    app.reload_feed().await;
    app
}

fn draft(name: &str) -> PostDraft {
    PostDraft {
        recipe_name: name.to_string(),
        recipe_time: "10min".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fresh_feed_is_seed_only() {
    let app = test_app().await;
    assert_eq!(app.view, View::Feed);
    assert_eq!(app.feed.len(), app.seed.len());
    assert!(app
        .feed_rows
        .iter()
        .all(|r| r.save == SaveState::Unsaved));
}

#[tokio::test]
async fn test_optimistic_save_toggle_persists_in_background() {
    let mut app = test_app().await;
    let (tx, mut rx) = mpsc::channel::<AppEvent>(8);

    app.toggle_save_selected(&tx);

    // The bookmark flips before the write completes
    assert_eq!(app.feed_rows[0].save, SaveState::Saved);
    assert!(app.save_popup.is_some());

    // The background task reports the durable result
    match rx.recv().await.unwrap() {
        AppEvent::SaveToggled { recipe_name, saved } => {
            assert_eq!(recipe_name, app.feed[0].recipe_name);
            assert!(saved);
        }
        _ => panic!("expected SaveToggled"),
    }

    let collection = app.store.load_saved_posts().await.unwrap();
    assert_eq!(collection.len(), 1);
    assert_eq!(collection[0].recipe_name, app.feed[0].recipe_name);
}

#[tokio::test]
async fn test_reload_seeds_bookmark_state_from_collection() {
    let mut app = test_app().await;
    let saved = app.feed[1].clone();
    app.store.toggle_save(&saved).await.unwrap();

    // In-memory state is stale until the screen regains focus
    assert_eq!(app.feed_rows[1].save, SaveState::Unsaved);

    app.reload_feed().await;
    assert_eq!(app.feed_rows[1].save, SaveState::Saved);
    assert_eq!(app.feed_rows[0].save, SaveState::Unsaved);
}

#[tokio::test]
async fn test_open_feed_post_records_selection() {
    let mut app = test_app().await;
    app.selected_feed = 2; // Pancake Breakfast: no recipe body

    app.open_feed_post().await;

    assert_eq!(app.view, View::Detail);
    assert_eq!(app.detail_return, View::Feed);
    let detail = app.detail.as_ref().unwrap();
    assert_eq!(detail.recipe_name, "Pancake Breakfast");
    // The missing-recipe prompt shows for an empty body
    assert_eq!(app.detail_prompt, forkful::app::PROMPT_MISSING);

    let slot = app.store.selected_post().await.unwrap().unwrap();
    assert_eq!(slot.recipe_name, "Pancake Breakfast");
}

#[tokio::test]
async fn test_saved_screen_search_is_materialized() {
    let mut app = test_app().await;
    for post in app.seed.clone() {
        app.store.toggle_save(&post).await.unwrap();
    }

    app.switch_view(View::Saved).await;
    assert_eq!(app.saved_filtered.len(), 3);

    app.saved_search = "spaghetti".to_string();
    // Not recomputed until the explicit refilter runs
    assert_eq!(app.saved_filtered.len(), 3);

    app.apply_saved_filter();
    assert_eq!(app.saved_filtered.len(), 1);
    assert_eq!(app.saved_filtered[0].recipe_name, "Spaghetti with Garlic Butter");
}

#[tokio::test]
async fn test_submit_blank_draft_blocks_with_status() {
    let mut app = test_app().await;
    app.switch_view(View::Compose).await;
    app.compose.draft.recipe_name = "Unfinished".to_string();
    // cooking time left blank

    app.submit_draft().await;

    // Still on the compose screen, nothing written, draft kept
    assert_eq!(app.view, View::Compose);
    assert!(app.status_message.is_some());
    assert_eq!(app.compose.draft.recipe_name, "Unfinished");
    assert!(app.store.load_authored_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_draft_posts_and_returns_to_feed() {
    let mut app = test_app().await;
    app.switch_view(View::Compose).await;
    app.compose.draft = draft("Breakfast Sandwich");

    app.submit_draft().await;

    assert_eq!(app.view, View::Feed);
    assert_eq!(app.feed[0].recipe_name, "Breakfast Sandwich");
    assert_eq!(app.feed[0].username, "cindy_yang");
    // Draft reset for the next visit
    assert!(app.compose.draft.recipe_name.is_empty());
}

#[tokio::test]
async fn test_generated_content_is_display_only_until_saved() {
    let mut app = test_app().await;
    app.selected_feed = 2;
    app.open_feed_post().await;

    app.apply_generated(GeneratedRecipe {
        ingredients: vec!["Flour".to_string(), "Milk".to_string()],
        directions: vec!["Whisk".to_string(), "Griddle".to_string()],
    });

    assert_eq!(app.detail_ingredients.len(), 2);
    assert!(app.detail_dirty);

    // Nothing touched the stores
    let slot = app.store.selected_post().await.unwrap().unwrap();
    assert!(slot.ingredients.is_empty());

    // The explicit save updates the slot (a seed post is not authored, so
    // the authored list stays empty)
    app.save_detail_edits().await;
    let slot = app.store.selected_post().await.unwrap().unwrap();
    assert_eq!(slot.ingredients, vec!["Flour", "Milk"]);
    assert!(app.store.load_authored_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_detail_edits_writes_back_authored_post() {
    let mut app = test_app().await;
    app.store
        .create_post(draft("My Ramen"), "cindy_yang")
        .await
        .unwrap();
    app.reload_feed().await;
    app.selected_feed = 0;
    app.open_feed_post().await;

    app.detail_ingredients = vec!["Noodles".to_string()];
    app.detail_directions = vec!["Boil".to_string(), "  ".to_string()];
    app.save_detail_edits().await;

    let authored = app.store.load_authored_posts().await.unwrap();
    assert_eq!(authored[0].ingredients, vec!["Noodles"]);
    // Blank display rows do not survive the write-back
    assert_eq!(authored[0].directions, vec!["Boil"]);
    assert!(!app.detail_dirty);
}

#[tokio::test]
async fn test_stale_generation_result_is_discarded() {
    let mut app = test_app().await;
    app.selected_feed = 2;
    app.open_feed_post().await;
    app.generate_generation = 5;

    handle_app_event(
        &mut app,
        AppEvent::GenerateComplete {
            recipe_name: "Pancake Breakfast".to_string(),
            generation: 4, // superseded
            recipe: GeneratedRecipe {
                ingredients: vec!["stale".to_string()],
                directions: vec![],
            },
        },
    );

    assert!(app.detail_ingredients.is_empty());
}

#[tokio::test]
async fn test_failed_generation_shows_empty_body() {
    let mut app = test_app().await;
    app.selected_feed = 0; // Blueberry Cheesecake has a body
    app.open_feed_post().await;
    assert!(!app.detail_ingredients.is_empty());
    app.generating = true;

    handle_app_event(
        &mut app,
        AppEvent::GenerateComplete {
            recipe_name: "Blueberry Cheesecake".to_string(),
            generation: 0,
            recipe: GeneratedRecipe::default(),
        },
    );

    // Fail-open overwrite: the displayed lists become empty, no error state,
    // and there is nothing marked worth saving
    assert!(!app.generating);
    assert!(app.detail_ingredients.is_empty());
    assert!(app.detail_directions.is_empty());
    assert!(!app.detail_dirty);
    assert_eq!(app.detail_prompt, forkful::app::PROMPT_MISSING);

    // The stored post still has its body; only the display layer changed
    let slot = app.store.selected_post().await.unwrap().unwrap();
    assert!(!slot.ingredients.is_empty());
}

#[tokio::test]
async fn test_generate_flow_updates_display() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mut app = test_app().await;
    app.selected_feed = 2; // Pancake Breakfast: no recipe body
    app.open_feed_post().await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                serde_json::json!({
                    "choices": [{ "message": {
                        "role": "assistant",
                        "content": "{\"ingredients\": [\"Flour\"], \"directions\": [\"Whisk\"]}"
                    }}]
                })
                .to_string(),
            ),
        )
        .mount(&server)
        .await;
    app.generator_base_url = Some(server.uri());

    let (tx, mut rx) = mpsc::channel::<AppEvent>(8);
    app.start_generate(&tx);
    assert!(app.generating);

    let event = rx.recv().await.unwrap();
    handle_app_event(&mut app, event);

    assert!(!app.generating);
    assert_eq!(app.detail_ingredients, vec!["Flour"]);
    assert_eq!(app.detail_directions, vec!["Whisk"]);
    assert!(app.detail_dirty);
}

#[tokio::test]
async fn test_one_time_rating() {
    let mut app = test_app().await;
    app.store
        .create_post(draft("Rated Dish"), "cindy_yang")
        .await
        .unwrap();
    app.reload_feed().await;
    app.selected_feed = 0;
    app.open_feed_post().await;

    app.apply_rating(4).await;
    let authored = app.store.load_authored_posts().await.unwrap();
    assert_eq!(authored[0].rating, "4.0");
    assert_eq!(authored[0].rating_count, 1);

    // Second rating in the same viewing is rejected
    app.apply_rating(1).await;
    let authored = app.store.load_authored_posts().await.unwrap();
    assert_eq!(authored[0].rating, "4.0");
    assert_eq!(authored[0].rating_count, 1);
}

#[tokio::test]
async fn test_comment_appends_with_local_username() {
    let mut app = test_app().await;
    app.store
        .create_post(draft("Discussed Dish"), "cindy_yang")
        .await
        .unwrap();
    app.reload_feed().await;
    app.selected_feed = 0;
    app.open_feed_post().await;

    app.add_comment("So good".to_string()).await;
    app.add_comment("   ".to_string()).await; // blank comments are dropped

    let authored = app.store.load_authored_posts().await.unwrap();
    assert_eq!(authored[0].comments.len(), 1);
    assert_eq!(authored[0].comments[0].username, "cindy_yang");
    assert_eq!(authored[0].comments[0].text, "So good");
}
