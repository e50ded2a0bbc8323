//! Preference-weighted item scoring.
//!
//! Additive heuristic, not a probability: a base score plus bounded terms
//! for brand/category affinity, price proximity to the user's liked items,
//! a category-level collaborative proxy, and a small random jitter that
//! keeps repeat scoring from going stale. The sum is clamped to [0, 1].

use crate::catalog::Catalog;
use crate::profile::UserProfile;
use crate::types::{Category, InteractionAction, ProductItem};
use rand::Rng;
use std::collections::HashSet;

const BASE_SCORE: f32 = 0.5;
const BRAND_WEIGHT: f32 = 0.3;
const CATEGORY_WEIGHT: f32 = 0.3;
const PRICE_WEIGHT: f32 = 0.2;
const COLLABORATIVE_WEIGHT: f32 = 0.2;
const COLLABORATIVE_MATCH: f32 = 0.3;
const JITTER_WEIGHT: f32 = 0.1;
/// Minimum history length before the collaborative term activates.
const COLLABORATIVE_MIN_HISTORY: usize = 5;

/// Score one item against a user's profile. Result is in [0, 1].
pub fn score_item<R: Rng + ?Sized>(
    item: &ProductItem,
    profile: &UserProfile,
    catalog: &Catalog,
    rng: &mut R,
) -> f32 {
    let mut score = BASE_SCORE;

    score += profile
        .brand_preferences
        .get(&item.brand)
        .copied()
        .unwrap_or(0.0)
        * BRAND_WEIGHT;

    score += profile
        .category_preferences
        .get(&item.category)
        .copied()
        .unwrap_or(0.0)
        * CATEGORY_WEIGHT;

    if let Some(avg_price) = average_liked_price(profile, catalog) {
        let price_diff = (item.price - avg_price).abs() / avg_price;
        score += (1.0 - price_diff).max(0.0) * PRICE_WEIGHT;
    }

    if profile.interactions.len() > COLLABORATIVE_MIN_HISTORY {
        score += collaborative_score(item, profile, catalog) * COLLABORATIVE_WEIGHT;
    }

    score += rng.gen::<f32>() * JITTER_WEIGHT;

    score.clamp(0.0, 1.0)
}

/// Average price of the user's liked items, `None` with no likes so the
/// price term stays inert for fresh profiles.
fn average_liked_price(profile: &UserProfile, catalog: &Catalog) -> Option<f32> {
    let liked_prices: Vec<f32> = profile
        .interactions
        .iter()
        .filter(|i| i.action == InteractionAction::Like)
        .filter_map(|i| catalog.get(&i.item_id))
        .map(|item| item.price)
        .collect();

    if liked_prices.is_empty() {
        return None;
    }

    let avg = liked_prices.iter().sum::<f32>() / liked_prices.len() as f32;
    (avg > 0.0).then_some(avg)
}

/// Category-level collaborative proxy: a flat bonus when the item's category
/// appears among the categories the user has liked.
fn collaborative_score(item: &ProductItem, profile: &UserProfile, catalog: &Catalog) -> f32 {
    let liked_categories: HashSet<Category> = profile
        .interactions
        .iter()
        .filter(|i| i.action == InteractionAction::Like)
        .filter_map(|i| catalog.get(&i.item_id))
        .map(|liked| liked.category)
        .collect();

    if liked_categories.contains(&item.category) {
        COLLABORATIVE_MATCH
    } else {
        0.0
    }
}
