//! StyleFeed personalization engine
//!
//! Client-side recommendation core for a swipe-based fashion feed:
//! feature-hashed item embeddings, preference-weighted scoring with an
//! exploration/exploitation split, occasion-aware outfit assembly, and an
//! asset prefetch cache.

pub mod catalog;
pub mod color;
pub mod embedding;
pub mod guard;
pub mod outfit;
pub mod prefetch;
pub mod profile;
pub mod recommendation;
pub mod scoring;
pub mod similarity;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export key types
pub use catalog::{Catalog, CatalogError, CatalogStats};
pub use embedding::{EmbeddingIndex, FeatureEncoder, EMBEDDING_DIM};
pub use guard::{GenerationGuard, GenerationToken};
pub use outfit::OutfitEngine;
pub use prefetch::{PrefetchCache, PrefetchError, ResourceFetcher, DEFAULT_BATCH_SIZE};
pub use profile::{UserProfile, UserProfileStore};
pub use recommendation::RecommendationEngine;
pub use similarity::cosine_similarity;
pub use types::{
    Category, Interaction, InteractionAction, Outfit, ProductItem, ScoredCandidate, UserInsights,
};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seed for the encoder noise region and the scoring jitter. `None`
    /// draws from entropy; set it for reproducible feeds.
    pub rng_seed: Option<u64>,
    /// Recommendations returned when the caller gives no count (default: 10)
    pub default_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            default_count: 10,
        }
    }
}
