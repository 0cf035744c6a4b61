use anyhow::Result;

use super::store::Store;
use super::types::Post;

/// Store key for the single "currently viewed recipe" slot.
pub(crate) const CLICKED_POST_KEY: &str = "clickedPost";

impl Store {
    // ========================================================================
    // Selected Post Operations
    // ========================================================================

    /// Record the post the user just opened, replacing any previous selection.
    ///
    /// There is exactly one slot regardless of whether the post came from the
    /// feed or the saved collection.
    pub async fn select_post(&self, post: &Post) -> Result<()> {
        let raw = serde_json::to_string(post)?;
        self.put(CLICKED_POST_KEY, &raw).await
    }

    /// Read back the selected post on detail-screen focus.
    ///
    /// `None` if nothing was ever selected; a corrupt slot also reads as
    /// `None` and is logged.
    pub async fn selected_post(&self) -> Result<Option<Post>> {
        let Some(raw) = self.get(CLICKED_POST_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(post) => Ok(Some(post)),
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt selected-post slot, treating as unset");
                Ok(None)
            }
        }
    }
}
