mod collection;
mod posts;
mod selected;
mod store;
mod types;

pub use collection::is_saved;
pub use store::Store;
pub use types::{Comment, Post, PostDraft, StoreError, ValidationError};
