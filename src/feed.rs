//! Feed assembly: merges authored posts with the curated seed set and applies
//! the shared name filter.
//!
//! Authored content always ranks first (most recent first within itself); the
//! seed set keeps its fixed, curated order. Filtering is a pure predicate:
//! no ranking, no fuzzy matching.

use crate::storage::{Comment, Post};

/// The fixed seed dataset appended after authored posts on the feed.
///
/// Never persisted; the last entry has no recipe body on purpose so the
/// detail screen's generate path has something to do out of the box.
pub fn seed_posts() -> Vec<Post> {
    vec![
        Post {
            username: "cindy_yang".to_string(),
            time: "Today at 8:34PM".to_string(),
            image: "assets/cheesecake.jpg".to_string(),
            recipe_name: "Blueberry Cheesecake".to_string(),
            recipe_time: "1hr 45min".to_string(),
            ingredients: vec![
                "1 cup graham cracker crumbs".to_string(),
                "¾ cup melted butter".to_string(),
                "2 packages cream cheese".to_string(),
            ],
            directions: vec![
                "Preheat the oven to 325°F.".to_string(),
                "Mix crust ingredients and press into pan.".to_string(),
                "Beat cream cheese, then bake for 1 hour.".to_string(),
            ],
            rating: "4.8".to_string(),
            rating_count: 12,
            likes: 27,
            comments: vec![Comment {
                username: "megan.pdf".to_string(),
                text: "Need to try this!!".to_string(),
            }],
        },
        Post {
            username: "megan.pdf".to_string(),
            time: "Yesterday at 1:51PM".to_string(),
            image: "assets/spaghetti.jpg".to_string(),
            recipe_name: "Spaghetti with Garlic Butter".to_string(),
            recipe_time: "40min".to_string(),
            ingredients: vec![
                "Spaghetti".to_string(),
                "Garlic".to_string(),
                "Butter".to_string(),
            ],
            directions: vec![
                "Boil pasta".to_string(),
                "Sauté garlic in butter".to_string(),
                "Combine and serve".to_string(),
            ],
            rating: "4.2".to_string(),
            rating_count: 5,
            likes: 13,
            comments: vec![],
        },
        Post {
            username: "yinqi".to_string(),
            time: "Yesterday at 10:08AM".to_string(),
            image: "assets/pancake-breakfast.jpg".to_string(),
            recipe_name: "Pancake Breakfast".to_string(),
            recipe_time: "1hr 10min".to_string(),
            ingredients: vec![],
            directions: vec![],
            rating: "N/A".to_string(),
            rating_count: 0,
            likes: 8,
            comments: vec![],
        },
    ]
}

/// Case-insensitive substring filter on recipe name.
///
/// Order-preserving; an empty query returns the input unfiltered. Shared by
/// the feed and the saved-collection screen, which each hold their own query.
pub fn filter_by_name(posts: &[Post], query: &str) -> Vec<Post> {
    if query.is_empty() {
        return posts.to_vec();
    }

    let needle = query.to_lowercase();
    posts
        .iter()
        .filter(|p| p.recipe_name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Assemble the feed: authored posts first, then the seed set, filtered.
pub fn build_feed(authored: &[Post], seed: &[Post], query: &str) -> Vec<Post> {
    let mut merged = Vec::with_capacity(authored.len() + seed.len());
    merged.extend_from_slice(authored);
    merged.extend_from_slice(seed);
    filter_by_name(&merged, query)
}
