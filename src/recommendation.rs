//! Personalized feed engine.
//!
//! Ties the catalog, embedding index, and profile store together behind one
//! service object. Candidate items are scored against the user's learned
//! preferences, then split into an exploitation slice (best scores) and an
//! exploration slice (uniformly sampled from the rest) according to the
//! user's current exploration rate.

use crate::catalog::Catalog;
use crate::embedding::{EmbeddingIndex, FeatureEncoder};
use crate::profile::{UserProfileStore, EXCLUSION_WINDOW};
use crate::scoring::score_item;
use crate::similarity::cosine_similarity;
use crate::types::{Interaction, ProductItem, ScoredCandidate, UserInsights};
use crate::EngineConfig;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub struct RecommendationEngine {
    config: EngineConfig,
    catalog: Catalog,
    embeddings: EmbeddingIndex,
    profiles: UserProfileStore,
    rng: Mutex<StdRng>,
}

impl RecommendationEngine {
    /// Build the engine over an already-loaded catalog. Every catalog item
    /// is embedded up front so similarity lookups never encode lazily.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        let encoder = match config.rng_seed {
            Some(seed) => FeatureEncoder::with_seed(seed),
            None => FeatureEncoder::new(),
        };
        let embeddings = EmbeddingIndex::new(encoder);
        embeddings.index_items(catalog.items());

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            items = catalog.len(),
            embedded = embeddings.len(),
            "recommendation engine ready"
        );

        Self {
            config,
            catalog,
            embeddings,
            profiles: UserProfileStore::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Load a CSV catalog from disk and build the engine over it.
    pub fn from_path(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let catalog = Catalog::from_path(path)?;
        Ok(Self::new(catalog, config))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn profiles(&self) -> &UserProfileStore {
        &self.profiles
    }

    /// Produce up to `count` recommendations for the user.
    ///
    /// Items the user interacted with in their last 20 interactions are
    /// excluded from the candidate pool. When that leaves nothing (tiny
    /// catalog, very active user), the head of the catalog is served so the
    /// feed never goes blank.
    pub fn recommendations(&self, user_id: Uuid, count: usize) -> Vec<ScoredCandidate> {
        let profile = self.profiles.get_or_create(user_id);
        let recent: HashSet<String> = profile
            .recently_seen(EXCLUSION_WINDOW)
            .into_iter()
            .collect();

        let pool: Vec<&ProductItem> = self
            .catalog
            .items()
            .iter()
            .filter(|item| !recent.contains(&item.id))
            .collect();

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        if pool.is_empty() {
            debug!(%user_id, "candidate pool exhausted, serving catalog head");
            return self
                .catalog
                .items()
                .iter()
                .take(count)
                .map(|item| ScoredCandidate {
                    score: score_item(item, &profile, &self.catalog, &mut *rng),
                    item: item.clone(),
                })
                .collect();
        }

        let mut scored: Vec<ScoredCandidate> = pool
            .iter()
            .map(|item| ScoredCandidate {
                score: score_item(item, &profile, &self.catalog, &mut *rng),
                item: (*item).clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let exploit_count =
            ((count as f32) * (1.0 - profile.exploration_rate)).floor() as usize;
        let exploit_count = exploit_count.min(scored.len());

        let mut remainder: Vec<ScoredCandidate> = scored.split_off(exploit_count);
        let mut selected = scored;

        remainder.shuffle(&mut *rng);
        let explore_count = count.saturating_sub(selected.len());
        selected.extend(remainder.into_iter().take(explore_count));

        // A fixed best-first ordering would put every exploration pick at
        // the tail; shuffling interleaves them through the feed.
        selected.shuffle(&mut *rng);
        selected.truncate(count);

        debug!(
            %user_id,
            count = selected.len(),
            exploration_rate = profile.exploration_rate,
            "built recommendations"
        );
        selected
    }

    /// Record a like/dislike and fold the item's attributes into the user's
    /// preference weights. Unknown item ids still count as interactions.
    pub fn record_interaction(
        &self,
        user_id: Uuid,
        interaction: Interaction,
    ) -> crate::profile::UserProfile {
        let item = self.catalog.get(&interaction.item_id);
        self.profiles.record_interaction(user_id, interaction, item)
    }

    /// Nearest catalog items to `item_id` by embedding cosine similarity,
    /// best first. `exclude` ids and the item itself never appear.
    pub fn similar_items(
        &self,
        item_id: &str,
        exclude: &[String],
        count: usize,
    ) -> Vec<ScoredCandidate> {
        let Some(anchor) = self.embeddings.get(item_id) else {
            return Vec::new();
        };
        let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();

        let mut scored: Vec<ScoredCandidate> = self
            .catalog
            .items()
            .iter()
            .filter(|item| item.id != item_id && !excluded.contains(item.id.as_str()))
            .filter_map(|item| {
                let embedding = self.embeddings.get(&item.id)?;
                Some(ScoredCandidate {
                    score: cosine_similarity(&anchor, &embedding),
                    item: item.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(count);
        scored
    }

    pub fn insights(&self, user_id: Uuid) -> Option<UserInsights> {
        self.profiles.insights(user_id)
    }

    pub fn default_count(&self) -> usize {
        self.config.default_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::item_with;
    use crate::types::{Category, InteractionAction};

    fn engine_with_items(n: usize) -> RecommendationEngine {
        let items: Vec<ProductItem> = (0..n)
            .map(|i| {
                item_with(
                    &format!("item{i}"),
                    &format!("Tank Top {i}"),
                    if i % 2 == 0 { "Alo Yoga" } else { "Gymshark" },
                    Category::Tops,
                    20.0 + i as f32,
                    &["black"],
                    &["casual"],
                )
            })
            .collect();
        let catalog = Catalog::from_items(items).unwrap();
        RecommendationEngine::new(
            catalog,
            EngineConfig {
                rng_seed: Some(42),
                ..EngineConfig::default()
            },
        )
    }

    #[test]
    fn test_returns_requested_count() {
        let engine = engine_with_items(30);
        let user = Uuid::new_v4();
        let recs = engine.recommendations(user, 10);
        assert_eq!(recs.len(), 10);

        let ids: HashSet<&str> = recs.iter().map(|r| r.item.id.as_str()).collect();
        assert_eq!(ids.len(), 10, "recommendations must be distinct");
    }

    #[test]
    fn test_small_catalog_returns_everything() {
        let engine = engine_with_items(4);
        let recs = engine.recommendations(Uuid::new_v4(), 10);
        assert_eq!(recs.len(), 4);
    }

    #[test]
    fn test_recent_interactions_are_excluded() {
        let engine = engine_with_items(30);
        let user = Uuid::new_v4();

        for i in 0..5 {
            engine.record_interaction(
                user,
                Interaction::new(format!("item{i}"), InteractionAction::Like),
            );
        }

        let recs = engine.recommendations(user, 25);
        for rec in &recs {
            for i in 0..5 {
                assert_ne!(rec.item.id, format!("item{i}"));
            }
        }
    }

    #[test]
    fn test_exhausted_pool_falls_back_to_catalog_head() {
        let engine = engine_with_items(3);
        let user = Uuid::new_v4();

        for i in 0..3 {
            engine.record_interaction(
                user,
                Interaction::new(format!("item{i}"), InteractionAction::Like),
            );
        }

        let recs = engine.recommendations(user, 2);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].item.id, "item0");
        assert_eq!(recs[1].item.id, "item1");
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let engine = engine_with_items(20);
        let recs = engine.recommendations(Uuid::new_v4(), 20);
        for rec in &recs {
            assert!((0.0..=1.0).contains(&rec.score), "score {}", rec.score);
        }
    }

    #[test]
    fn test_unknown_interaction_still_counts() {
        let engine = engine_with_items(5);
        let user = Uuid::new_v4();
        let profile = engine.record_interaction(
            user,
            Interaction::new("ghost".to_string(), InteractionAction::Like),
        );
        assert_eq!(profile.interactions.len(), 1);
        assert!(profile.brand_preferences.is_empty());
    }

    #[test]
    fn test_similar_items_excludes_anchor_and_listed() {
        let engine = engine_with_items(10);
        let similar = engine.similar_items("item0", &["item1".to_string()], 5);

        assert_eq!(similar.len(), 5);
        for rec in &similar {
            assert_ne!(rec.item.id, "item0");
            assert_ne!(rec.item.id, "item1");
        }
        for pair in similar.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_similar_items_unknown_anchor_is_empty() {
        let engine = engine_with_items(5);
        assert!(engine.similar_items("nope", &[], 5).is_empty());
    }

    #[test]
    fn test_insights_after_likes() {
        let engine = engine_with_items(10);
        let user = Uuid::new_v4();
        engine.record_interaction(
            user,
            Interaction::new("item0".to_string(), InteractionAction::Like),
        );

        let insights = engine.insights(user).unwrap();
        assert_eq!(insights.total_interactions, 1);
        assert!((insights.like_rate - 1.0).abs() < f32::EPSILON);
    }
}
