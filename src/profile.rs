//! Per-user preference state.
//!
//! Profiles are created lazily on first interaction and live for the
//! process session only. Preference weights are unbounded additive
//! accumulators: a Like bumps the item's brand, category and color weights
//! and nothing ever decays them, so recent and old likes count equally.

use crate::types::{Category, Interaction, InteractionAction, ProductItem, UserInsights};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Default exploration rate for a fresh profile.
pub const DEFAULT_EXPLORATION_RATE: f32 = 0.3;
/// Exploration rate bounds after recomputation.
pub const MIN_EXPLORATION_RATE: f32 = 0.1;
pub const MAX_EXPLORATION_RATE: f32 = 0.5;

const BRAND_DELTA: f32 = 0.1;
const CATEGORY_DELTA: f32 = 0.1;
const COLOR_DELTA: f32 = 0.05;
const EXPLORATION_LIKE_STEP: f32 = 0.02;
const RECENT_WINDOW: usize = 10;
/// Sliding recency window for recommendation exclusion: an item seen in the
/// last 20 interactions is not re-shown, but may resurface afterwards.
pub const EXCLUSION_WINDOW: usize = 20;

/// Mutable per-user state: interaction history plus accumulated preferences.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub interactions: Vec<Interaction>,
    pub brand_preferences: HashMap<String, f32>,
    pub category_preferences: HashMap<Category, f32>,
    pub color_preferences: HashMap<String, f32>,
    pub exploration_rate: f32,
}

impl UserProfile {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            interactions: Vec::new(),
            brand_preferences: HashMap::new(),
            category_preferences: HashMap::new(),
            color_preferences: HashMap::new(),
            exploration_rate: DEFAULT_EXPLORATION_RATE,
        }
    }

    /// Item ids from the most recent interactions, newest window only.
    pub fn recently_seen(&self, window: usize) -> Vec<String> {
        let start = self.interactions.len().saturating_sub(window);
        self.interactions[start..]
            .iter()
            .map(|i| i.item_id.clone())
            .collect()
    }

    pub fn liked_item_ids(&self) -> Vec<&str> {
        self.interactions
            .iter()
            .filter(|i| i.action == InteractionAction::Like)
            .map(|i| i.item_id.as_str())
            .collect()
    }

    fn recompute_exploration_rate(&mut self) {
        let start = self.interactions.len().saturating_sub(RECENT_WINDOW);
        let recent_likes = self.interactions[start..]
            .iter()
            .filter(|i| i.action == InteractionAction::Like)
            .count();
        let rate = DEFAULT_EXPLORATION_RATE - EXPLORATION_LIKE_STEP * recent_likes as f32;
        self.exploration_rate = rate.clamp(MIN_EXPLORATION_RATE, MAX_EXPLORATION_RATE);
    }
}

/// Session-scoped store of user profiles.
#[derive(Debug, Default)]
pub struct UserProfileStore {
    profiles: DashMap<Uuid, UserProfile>,
}

impl UserProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
        }
    }

    /// Fetch a profile, creating an empty one on first access. Idempotent.
    pub fn get_or_create(&self, user_id: Uuid) -> UserProfile {
        self.profiles
            .entry(user_id)
            .or_insert_with(|| {
                debug!(%user_id, "creating user profile");
                UserProfile::new(user_id)
            })
            .clone()
    }

    /// Append an interaction and, on Like, accumulate preference weights for
    /// the interacted item. Returns the updated profile.
    ///
    /// `item` is the catalog record the interaction refers to; a missing
    /// item (stale id) still records the interaction but moves no weights.
    pub fn record_interaction(
        &self,
        user_id: Uuid,
        interaction: Interaction,
        item: Option<&ProductItem>,
    ) -> UserProfile {
        let mut entry = self
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id));
        let profile = entry.value_mut();

        if interaction.action == InteractionAction::Like {
            if let Some(item) = item {
                *profile
                    .brand_preferences
                    .entry(item.brand.clone())
                    .or_insert(0.0) += BRAND_DELTA;
                *profile
                    .category_preferences
                    .entry(item.category)
                    .or_insert(0.0) += CATEGORY_DELTA;
                for color in &item.colors {
                    *profile
                        .color_preferences
                        .entry(color.clone())
                        .or_insert(0.0) += COLOR_DELTA;
                }
            }
        }

        profile.interactions.push(interaction);
        profile.recompute_exploration_rate();

        profile.clone()
    }

    /// Aggregate history stats for a user; `None` if the user has no profile.
    pub fn insights(&self, user_id: Uuid) -> Option<UserInsights> {
        let profile = self.profiles.get(&user_id)?;

        let total = profile.interactions.len();
        let likes = profile
            .interactions
            .iter()
            .filter(|i| i.action == InteractionAction::Like)
            .count();

        let top_brand = profile
            .brand_preferences
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(brand, _)| brand.clone());
        let top_category = profile
            .category_preferences
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(category, _)| *category);

        Some(UserInsights {
            total_interactions: total,
            like_rate: if total > 0 {
                likes as f32 / total as f32
            } else {
                0.0
            },
            top_brand,
            top_category,
            exploration_rate: profile.exploration_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;

    fn like(item_id: &str) -> Interaction {
        Interaction::new(item_id, InteractionAction::Like)
    }

    fn dislike(item_id: &str) -> Interaction {
        Interaction::new(item_id, InteractionAction::Dislike)
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();

        let first = store.get_or_create(user_id);
        let second = store.get_or_create(user_id);

        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);
        assert!((first.exploration_rate - DEFAULT_EXPLORATION_RATE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_like_accumulates_preference_weights() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();
        let item = test_util::item("p1");

        store.record_interaction(user_id, like("p1"), Some(&item));
        let profile = store.record_interaction(user_id, like("p1"), Some(&item));

        assert!((profile.brand_preferences["Alo Yoga"] - 0.2).abs() < 1e-6);
        assert!((profile.category_preferences[&Category::Tops] - 0.2).abs() < 1e-6);
        assert!((profile.color_preferences["black"] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_dislike_moves_no_weights() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();
        let item = test_util::item("p1");

        let profile = store.record_interaction(user_id, dislike("p1"), Some(&item));

        assert!(profile.brand_preferences.is_empty());
        assert_eq!(profile.interactions.len(), 1);
    }

    #[test]
    fn test_exploration_rate_drops_with_recent_likes() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();
        let item = test_util::item("p1");

        let mut profile = store.get_or_create(user_id);
        for _ in 0..10 {
            profile = store.record_interaction(user_id, like("p1"), Some(&item));
        }

        // 10 likes in the last 10 interactions: 0.3 - 0.2 = 0.1 (the floor).
        assert!((profile.exploration_rate - MIN_EXPLORATION_RATE).abs() < 1e-6);
    }

    #[test]
    fn test_exploration_rate_always_bounded() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();
        let item = test_util::item("p1");

        for i in 0..50 {
            let interaction = if i % 3 == 0 { like("p1") } else { dislike("p1") };
            let profile = store.record_interaction(user_id, interaction, Some(&item));
            assert!(profile.exploration_rate >= MIN_EXPLORATION_RATE);
            assert!(profile.exploration_rate <= MAX_EXPLORATION_RATE);
        }
    }

    #[test]
    fn test_recently_seen_is_a_sliding_window() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();

        for i in 0..25 {
            store.record_interaction(user_id, dislike(&format!("p{i}")), None);
        }

        let profile = store.get_or_create(user_id);
        let seen = profile.recently_seen(EXCLUSION_WINDOW);
        assert_eq!(seen.len(), 20);
        // The first five interactions have lapsed out of the window.
        assert!(!seen.contains(&"p0".to_string()));
        assert!(seen.contains(&"p24".to_string()));
    }

    #[test]
    fn test_insights_reports_top_preferences() {
        let store = UserProfileStore::new();
        let user_id = Uuid::new_v4();
        let tops = test_util::item("p1");
        let bottoms = test_util::item_with(
            "p2",
            "Jogger",
            "Gymshark",
            Category::Bottoms,
            25.0,
            &["black"],
            &["gym"],
        );

        store.record_interaction(user_id, like("p1"), Some(&tops));
        store.record_interaction(user_id, like("p1"), Some(&tops));
        store.record_interaction(user_id, like("p2"), Some(&bottoms));
        store.record_interaction(user_id, dislike("p2"), Some(&bottoms));

        let insights = store.insights(user_id).unwrap();
        assert_eq!(insights.total_interactions, 4);
        assert!((insights.like_rate - 0.75).abs() < 1e-6);
        assert_eq!(insights.top_brand.as_deref(), Some("Alo Yoga"));
        assert_eq!(insights.top_category, Some(Category::Tops));
    }

    #[test]
    fn test_insights_absent_for_unknown_user() {
        let store = UserProfileStore::new();
        assert!(store.insights(Uuid::new_v4()).is_none());
    }
}
