//! forkful, a terminal recipe feed.
//!
//! Users post recipes, browse a feed that merges their posts with a curated
//! seed set, save recipes into a personal collection, and optionally backfill
//! missing ingredients/directions through an external completion API. All
//! durable state is JSON under three fixed keys in a local SQLite-backed
//! key-value store.

pub mod app;
pub mod config;
pub mod content;
pub mod feed;
pub mod storage;
pub mod ui;
pub mod util;
