use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Store-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another instance of the application has locked the store
    #[error("Another instance of forkful appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Store migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Store error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StoreError::InstanceLocked;
        }

        StoreError::Other(err)
    }
}

/// Rejected recipe drafts. Creation aborts with no partial write.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill out the recipe name")]
    BlankRecipeName,

    #[error("Please fill out the cooking time")]
    BlankRecipeTime,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A single comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub username: String,
    pub text: String,
}

fn default_rating() -> String {
    "N/A".to_string()
}

/// One recipe submission.
///
/// Serialized camelCase because the persisted JSON layout keys fields as
/// `recipeName`, `recipeTime`, `ratingCount`. The recipe name is the de facto
/// identity within a list; there is no separate id field. Engagement fields
/// default when absent so older payloads still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub username: String,
    /// Freeform display timestamp ("Today at 3:12PM"), not a clock value.
    pub time: String,
    /// Opaque local image reference (a bundled asset path).
    #[serde(default)]
    pub image: String,
    pub recipe_name: String,
    /// Freeform duration label ("1hr 45min").
    pub recipe_time: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub directions: Vec<String>,
    /// Display rating: "N/A" until first rated.
    #[serde(default = "default_rating")]
    pub rating: String,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Create-flow input for a new recipe post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub recipe_name: String,
    pub recipe_time: String,
    pub image: String,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
}

impl PostDraft {
    /// Validate the draft: recipe name and cooking time must be non-blank
    /// after trimming. Blank ingredient/direction entries are tolerated here;
    /// they are filtered at creation time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.recipe_name.trim().is_empty() {
            return Err(ValidationError::BlankRecipeName);
        }
        if self.recipe_time.trim().is_empty() {
            return Err(ValidationError::BlankRecipeTime);
        }
        Ok(())
    }
}
