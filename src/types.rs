//! Core data model shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed category taxonomy for catalog items.
///
/// Raw category strings are mapped into this taxonomy at the ingestion
/// boundary; anything unrecognized falls back to [`Category::Fashion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tops,
    Bottoms,
    Dresses,
    Activewear,
    Swimwear,
    Outerwear,
    Lingerie,
    Accessories,
    Shoes,
    /// Default bucket for items that match no category keywords.
    Fashion,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tops => "tops",
            Category::Bottoms => "bottoms",
            Category::Dresses => "dresses",
            Category::Activewear => "activewear",
            Category::Swimwear => "swimwear",
            Category::Outerwear => "outerwear",
            Category::Lingerie => "lingerie",
            Category::Accessories => "accessories",
            Category::Shoes => "shoes",
            Category::Fashion => "fashion",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product, immutable once loaded.
///
/// Invariants established at ingestion: `id` unique across the catalog,
/// `price >= 0` rounded to 2 decimals, `colors` deduplicated
/// case-insensitively (max 8), `sizes` uppercased (max 10), `occasions`
/// lowercase (max 5), `style_features` derived (max 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductItem {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: Category,
    pub price: f32,
    pub original_price: f32,
    /// Percent discount, capped at 90. Derived from prices when not supplied.
    pub discount: u32,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub occasions: Vec<String>,
    pub style_features: Vec<String>,
    pub image_url: String,
    pub url: String,
    pub availability: String,
}

impl ProductItem {
    /// Lowercased name + category text used by keyword classifiers.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.category.as_str(), self.name.to_lowercase())
    }
}

/// Swipe direction recorded for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Like,
    Dislike,
}

/// A single user interaction with a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub item_id: String,
    pub action: InteractionAction,
    pub timestamp: DateTime<Utc>,
    /// Free-form context supplied by the caller (screen, session, etc).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl Interaction {
    pub fn new(item_id: impl Into<String>, action: InteractionAction) -> Self {
        Self {
            item_id: item_id.into(),
            action,
            timestamp: Utc::now(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// A generated outfit. Ephemeral: replaced wholesale on the next generation
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outfit {
    pub id: String,
    pub name: String,
    pub description: String,
    /// 1 to 4 items; pairs are always top then bottom.
    pub items: Vec<ProductItem>,
    pub occasion: String,
    /// Bounded heuristic quality score, 0-100. Not a calibrated probability.
    pub confidence: u8,
    pub icon: String,
}

impl Outfit {
    pub fn total_price(&self) -> f32 {
        self.items.iter().map(|i| i.price).sum()
    }
}

/// An item with a transient score, scoped to a single recommendation or
/// matching call.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub item: ProductItem,
    pub score: f32,
}

/// Aggregate view of a user's interaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInsights {
    pub total_interactions: usize,
    pub like_rate: f32,
    pub top_brand: Option<String>,
    pub top_category: Option<Category>,
    pub exploration_rate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_matches_taxonomy() {
        assert_eq!(Category::Tops.to_string(), "tops");
        assert_eq!(Category::Fashion.to_string(), "fashion");
    }

    #[test]
    fn test_outfit_total_price() {
        let mut item = test_item("a1");
        item.price = 19.99;
        let mut other = test_item("a2");
        other.price = 25.0;

        let outfit = Outfit {
            id: "o1".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            items: vec![item, other],
            occasion: "Casual".to_string(),
            confidence: 85,
            icon: "CASUAL".to_string(),
        };

        assert!((outfit.total_price() - 44.99).abs() < f32::EPSILON);
    }

    pub(crate) fn test_item(id: &str) -> ProductItem {
        ProductItem {
            id: id.to_string(),
            name: "Test Item".to_string(),
            brand: "Test Brand".to_string(),
            category: Category::Tops,
            price: 20.0,
            original_price: 20.0,
            discount: 0,
            colors: vec!["black".to_string()],
            sizes: vec!["M".to_string()],
            occasions: vec!["casual".to_string()],
            style_features: vec![],
            image_url: "https://example.com/a.jpg".to_string(),
            url: String::new(),
            availability: "Available".to_string(),
        }
    }
}
