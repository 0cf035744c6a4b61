use anyhow::Result;

use super::store::Store;
use super::types::Post;

/// Store key for the saved collection.
pub(crate) const SAVED_POSTS_KEY: &str = "savedPosts";

/// Membership test for the saved collection, keyed by recipe name.
///
/// The name is the only lookup key across lists; two different posts sharing
/// a name are indistinguishable here.
pub fn is_saved(collection: &[Post], recipe_name: &str) -> bool {
    collection.iter().any(|p| p.recipe_name == recipe_name)
}

impl Store {
    // ========================================================================
    // Saved Collection Operations
    // ========================================================================

    /// Load the saved collection. Absent or corrupt key degrades to empty.
    pub async fn load_saved_posts(&self) -> Result<Vec<Post>> {
        self.read_list(SAVED_POSTS_KEY).await
    }

    /// Toggle a post in or out of the saved collection.
    ///
    /// If the recipe name is already present the entry is removed; otherwise
    /// the given post is appended verbatim. The appended entry is a snapshot
    /// of the post at the moment of saving; later edits to the original do
    /// not propagate to the saved copy. Returns the new membership state.
    pub async fn toggle_save(&self, post: &Post) -> Result<bool> {
        let mut collection = self.load_saved_posts().await?;

        let saved = if is_saved(&collection, &post.recipe_name) {
            collection.retain(|p| p.recipe_name != post.recipe_name);
            false
        } else {
            collection.push(post.clone());
            true
        };

        self.write_list(SAVED_POSTS_KEY, &collection).await?;
        tracing::debug!(recipe = %post.recipe_name, saved, "Toggled saved state");
        Ok(saved)
    }

    /// Remove a recipe from the saved collection by name.
    ///
    /// Removing a name that is not present is a no-op; the collection is
    /// rewritten either way.
    pub async fn remove_saved_by_name(&self, recipe_name: &str) -> Result<()> {
        let mut collection = self.load_saved_posts().await?;
        collection.retain(|p| p.recipe_name != recipe_name);
        self.write_list(SAVED_POSTS_KEY, &collection).await
    }
}
