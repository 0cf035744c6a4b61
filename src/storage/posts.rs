use anyhow::Result;
use chrono::Local;

use super::store::Store;
use super::types::{Post, PostDraft};

/// Store key for the authored-posts list.
pub(crate) const POSTS_KEY: &str = "posts";

/// Default image reference attached to posts created without a picture.
const DEFAULT_POST_IMAGE: &str = "assets/breakfast-sandwich.png";

/// Display timestamp stamped onto a post at creation.
///
/// This is a freeform label, not a clock value: once written it is never
/// reinterpreted or re-rendered relative to the current time.
fn display_timestamp() -> String {
    format!("Today at {}", Local::now().format("%-I:%M%p"))
}

impl Store {
    // ========================================================================
    // Authored Post Operations
    // ========================================================================

    /// Load the authored-posts list, most recent first.
    ///
    /// An absent `posts` key or a corrupt value degrades to an empty list.
    pub async fn load_authored_posts(&self) -> Result<Vec<Post>> {
        self.read_list(POSTS_KEY).await
    }

    /// Create a post from a draft and prepend it to the authored list.
    ///
    /// Fails with [`super::ValidationError`] when the recipe name or cooking
    /// time is blank after trimming; nothing is written in that case. Blank
    /// ingredient/direction entries are filtered out before persistence.
    /// Returns the post as persisted.
    pub async fn create_post(&self, draft: PostDraft, username: &str) -> Result<Post> {
        draft.validate()?;

        let image = if draft.image.trim().is_empty() {
            DEFAULT_POST_IMAGE.to_string()
        } else {
            draft.image
        };

        let post = Post {
            username: username.to_string(),
            time: display_timestamp(),
            image,
            recipe_name: draft.recipe_name.trim().to_string(),
            recipe_time: draft.recipe_time.trim().to_string(),
            ingredients: draft
                .ingredients
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            directions: draft
                .directions
                .into_iter()
                .filter(|d| !d.trim().is_empty())
                .collect(),
            rating: "N/A".to_string(),
            rating_count: 0,
            likes: 0,
            comments: Vec::new(),
        };

        // Whole-list read-modify-write; most-recent-first ordering
        let mut posts = self.load_authored_posts().await?;
        posts.insert(0, post.clone());
        self.write_list(POSTS_KEY, &posts).await?;

        tracing::info!(recipe = %post.recipe_name, "Created post");
        Ok(post)
    }

    /// Write an edited post back into the authored list, matched by recipe
    /// name. Returns false (and writes nothing) when no authored post has
    /// that name; seed posts and foreign saved copies are not updatable.
    ///
    /// Only the first match is replaced; authored duplicates by name keep
    /// their own entries. Saved-collection snapshots are deliberately left
    /// untouched (copy-on-save semantics).
    pub async fn update_authored_post(&self, updated: &Post) -> Result<bool> {
        let mut posts = self.load_authored_posts().await?;

        let Some(slot) = posts
            .iter_mut()
            .find(|p| p.recipe_name == updated.recipe_name)
        else {
            return Ok(false);
        };

        *slot = updated.clone();
        self.write_list(POSTS_KEY, &posts).await?;
        Ok(true)
    }

    /// Delete the entire authored-posts list.
    ///
    /// Maintenance-only reset; not reachable from normal navigation.
    pub async fn clear_authored_posts(&self) -> Result<()> {
        self.delete(POSTS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{PostDraft, Store, ValidationError};

    async fn test_store() -> Store {
        Store::open(":memory:").await.unwrap()
    }

    fn draft(name: &str, time: &str) -> PostDraft {
        PostDraft {
            recipe_name: name.to_string(),
            recipe_time: time.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_post_prepends() {
        let store = test_store().await;
        store
            .create_post(draft("First", "10min"), "cindy_yang")
            .await
            .unwrap();
        store
            .create_post(draft("Second", "20min"), "cindy_yang")
            .await
            .unwrap();

        let posts = store.load_authored_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].recipe_name, "Second");
        assert_eq!(posts[1].recipe_name, "First");
    }

    #[tokio::test]
    async fn test_create_post_trims_and_stamps_defaults() {
        let store = test_store().await;
        let post = store
            .create_post(draft("  Mushroom Pizza  ", " 30min "), "cindy_yang")
            .await
            .unwrap();

        assert_eq!(post.recipe_name, "Mushroom Pizza");
        assert_eq!(post.recipe_time, "30min");
        assert_eq!(post.username, "cindy_yang");
        assert_eq!(post.rating, "N/A");
        assert_eq!(post.rating_count, 0);
        assert_eq!(post.likes, 0);
        assert!(post.comments.is_empty());
        assert!(post.time.starts_with("Today at "));
        assert!(!post.image.is_empty());
    }

    #[tokio::test]
    async fn test_create_post_filters_blank_entries() {
        let store = test_store().await;
        let mut d = draft("Pancakes", "25min");
        // The compose screen keeps blank placeholder rows while editing
        d.ingredients = vec![
            "Flour".to_string(),
            " ".to_string(),
            String::new(),
            "Eggs".to_string(),
        ];
        d.directions = vec![String::new(), "Mix".to_string(), "  ".to_string()];

        let post = store.create_post(d, "cindy_yang").await.unwrap();
        assert_eq!(post.ingredients, vec!["Flour", "Eggs"]);
        assert_eq!(post.directions, vec!["Mix"]);
    }

    #[tokio::test]
    async fn test_create_post_blank_name_rejected_without_write() {
        let store = test_store().await;
        let err = store
            .create_post(draft("   ", "10min"), "cindy_yang")
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::BlankRecipeName)
        );

        assert!(store.load_authored_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_post_blank_time_rejected_without_write() {
        let store = test_store().await;
        store
            .create_post(draft("Kept", "5min"), "cindy_yang")
            .await
            .unwrap();

        let err = store
            .create_post(draft("Doomed", ""), "cindy_yang")
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::BlankRecipeTime)
        );

        // The existing list is unchanged
        let posts = store.load_authored_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].recipe_name, "Kept");
    }

    #[tokio::test]
    async fn test_duplicate_names_allowed_in_authored_list() {
        let store = test_store().await;
        store
            .create_post(draft("Toast", "5min"), "cindy_yang")
            .await
            .unwrap();
        store
            .create_post(draft("Toast", "7min"), "cindy_yang")
            .await
            .unwrap();

        let posts = store.load_authored_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn test_update_authored_post() {
        let store = test_store().await;
        let mut post = store
            .create_post(draft("Ramen", "15min"), "cindy_yang")
            .await
            .unwrap();

        post.ingredients = vec!["Noodles".to_string(), "Broth".to_string()];
        let updated = store.update_authored_post(&post).await.unwrap();
        assert!(updated);

        let posts = store.load_authored_posts().await.unwrap();
        assert_eq!(posts[0].ingredients, vec!["Noodles", "Broth"]);
    }

    #[tokio::test]
    async fn test_update_unknown_post_writes_nothing() {
        let store = test_store().await;
        let post = store
            .create_post(draft("Ramen", "15min"), "cindy_yang")
            .await
            .unwrap();

        let mut foreign = post.clone();
        foreign.recipe_name = "Pancake Breakfast".to_string();
        let updated = store.update_authored_post(&foreign).await.unwrap();
        assert!(!updated);

        let posts = store.load_authored_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].recipe_name, "Ramen");
    }

    #[tokio::test]
    async fn test_clear_authored_posts() {
        let store = test_store().await;
        store
            .create_post(draft("Gone", "1min"), "cindy_yang")
            .await
            .unwrap();

        store.clear_authored_posts().await.unwrap();
        assert!(store.load_authored_posts().await.unwrap().is_empty());
        // The key itself is removed, not set to []
        assert_eq!(store.get("posts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_posts_key_degrades_to_empty_and_repairs() {
        let store = test_store().await;
        store.put("posts", "{\"oops\": true}").await.unwrap();

        assert!(store.load_authored_posts().await.unwrap().is_empty());

        // The next create overwrites the corrupt value wholesale
        store
            .create_post(draft("Fresh Start", "2min"), "cindy_yang")
            .await
            .unwrap();
        let posts = store.load_authored_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
    }
}
