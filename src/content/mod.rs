//! External content generation.
//!
//! The single outbound network surface of the application: a chat-completion
//! call that backfills missing ingredients/directions for a recipe name.

mod generator;

pub use generator::{generate, resolve_api_key, GeneratedRecipe, GeneratorError};
