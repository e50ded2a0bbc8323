//! Catalog ingestion boundary.
//!
//! Normalizes raw delimited product rows into canonical [`ProductItem`]s.
//! Every field-name variant and formatting quirk is resolved here, once, at
//! the edge; the rest of the engine only ever sees the canonical type.
//! Malformed rows are dropped, counted, and logged rather than surfaced.

use crate::types::{Category, ProductItem};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const MAX_STRING_LEN: usize = 200;
const MAX_COLORS: usize = 8;
const MAX_SIZES: usize = 10;
const MAX_OCCASIONS: usize = 5;
const MAX_STYLE_FEATURES: usize = 3;
const MAX_DISCOUNT: u32 = 90;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("duplicate item id in catalog: {0}")]
    DuplicateId(String),
}

/// Raw row as it appears in the source dataset. Field-name variants
/// (`available_colors` vs `color`) are resolved through serde aliases.
#[derive(Debug, Default, Deserialize)]
pub struct RawProductRecord {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "color")]
    pub available_colors: String,
    #[serde(default)]
    pub available_sizes: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub occasion: String,
}

/// Catalog statistics for diagnostics.
#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub total_items: usize,
    pub brands: Vec<String>,
    pub categories: Vec<Category>,
    pub price_min: f32,
    pub price_max: f32,
    pub price_avg: f32,
}

/// Immutable, id-indexed product catalog.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: Vec<ProductItem>,
    by_id: HashMap<String, usize>,
    dropped_rows: usize,
}

impl Catalog {
    /// Build a catalog from already-normalized items.
    ///
    /// Fails on duplicate ids: id uniqueness is the one invariant the rest of
    /// the engine relies on everywhere.
    pub fn from_items(items: Vec<ProductItem>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if by_id.insert(item.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self {
            items,
            by_id,
            dropped_rows: 0,
        })
    }

    /// Load and normalize a delimited dataset (header row expected).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut items: Vec<ProductItem> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut dropped = 0usize;

        for (row_idx, result) in csv_reader.deserialize::<RawProductRecord>().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    debug!(row = row_idx, error = %err, "dropping malformed row");
                    dropped += 1;
                    continue;
                }
            };

            match normalize_record(record, row_idx) {
                Some(item) => {
                    if by_id.contains_key(&item.id) {
                        debug!(id = %item.id, "dropping row with duplicate id");
                        dropped += 1;
                        continue;
                    }
                    by_id.insert(item.id.clone(), items.len());
                    items.push(item);
                }
                None => dropped += 1,
            }
        }

        info!(
            loaded = items.len(),
            dropped, "catalog ingestion complete"
        );

        Ok(Self {
            items,
            by_id,
            dropped_rows: dropped,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn items(&self) -> &[ProductItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&ProductItem> {
        self.by_id.get(id).map(|&idx| &self.items[idx])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows dropped during ingestion (data-quality failures).
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn stats(&self) -> Option<CatalogStats> {
        if self.items.is_empty() {
            return None;
        }

        let mut brands: Vec<String> = Vec::new();
        let mut seen_brands: HashSet<String> = HashSet::new();
        let mut categories: Vec<Category> = Vec::new();
        let mut seen_categories: HashSet<Category> = HashSet::new();
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;

        for item in &self.items {
            if seen_brands.insert(item.brand.clone()) {
                brands.push(item.brand.clone());
            }
            if seen_categories.insert(item.category) {
                categories.push(item.category);
            }
            min = min.min(item.price);
            max = max.max(item.price);
            sum += f64::from(item.price);
        }

        Some(CatalogStats {
            total_items: self.items.len(),
            brands,
            categories,
            price_min: min,
            price_max: max,
            price_avg: ((sum / self.items.len() as f64) * 100.0).round() as f32 / 100.0,
        })
    }
}

/// Normalize a raw row. Returns `None` when critical fields are missing; the
/// caller counts the drop.
pub fn normalize_record(record: RawProductRecord, row_idx: usize) -> Option<ProductItem> {
    let name = clean_string(&record.name);
    let brand = clean_string(&record.brand);
    let image_url = clean_image_url(&record.image_url);

    if name.is_empty() || brand.is_empty() || image_url.is_empty() {
        debug!(row = row_idx, "dropping row with missing name/brand/image");
        return None;
    }

    let id = if record.product_id.trim().is_empty() {
        format!("item_{row_idx}")
    } else {
        record.product_id.trim().to_string()
    };

    let price = parse_price(&record.price);
    let original_price = {
        let parsed = parse_price(&record.original_price);
        if parsed > 0.0 {
            parsed
        } else {
            price
        }
    };

    let mut discount = parse_discount(&record.discount);
    if discount == 0 && original_price > price && original_price > 0.0 {
        discount = (((original_price - price) / original_price) * 100.0).round() as u32;
        discount = discount.min(MAX_DISCOUNT);
    }

    let category = standardize_category(&record.category);
    let style_features = extract_style_features(&name);

    Some(ProductItem {
        id,
        name: name.clone(),
        brand,
        category,
        price,
        original_price,
        discount,
        colors: parse_colors(&record.available_colors),
        sizes: parse_sizes(&record.available_sizes),
        occasions: parse_occasions(&record.occasion),
        style_features,
        image_url,
        url: record.url.trim().to_string(),
        availability: if record.availability.trim().is_empty() {
            "Available".to_string()
        } else {
            record.availability.trim().to_string()
        },
    })
}

/// Trim, collapse internal whitespace, cap length.
fn clean_string(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_STRING_LEN).collect()
}

/// Strip non-numeric characters and parse, rounding to 2 decimals.
/// Unparsable prices default to 0.
fn parse_price(raw: &str) -> f32 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match cleaned.parse::<f32>() {
        Ok(price) if price.is_finite() && price >= 0.0 => (price * 100.0).round() / 100.0,
        _ => 0.0,
    }
}

fn parse_discount(raw: &str) -> u32 {
    let cleaned: String = raw.chars().filter(char::is_ascii_digit).collect();
    cleaned.parse::<u32>().map_or(0, |d| d.min(MAX_DISCOUNT))
}

/// Accept only well-formed http(s) URLs; anything else becomes empty and the
/// row is dropped upstream.
fn clean_image_url(raw: &str) -> String {
    let url = raw.trim();
    if (url.starts_with("https://") || url.starts_with("http://")) && url.len() > 10 {
        url.to_string()
    } else {
        String::new()
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';', '|']).map(str::trim)
}

fn parse_colors(raw: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    split_list(raw)
        .filter(|token| {
            !token.is_empty()
                && token.len() < 25
                && !token.chars().all(|c| c.is_ascii_digit() || c == '.')
                && !token.eq_ignore_ascii_case("available")
        })
        .filter(|token| seen.insert(token.to_lowercase()))
        .take(MAX_COLORS)
        .map(str::to_string)
        .collect()
}

fn parse_sizes(raw: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    split_list(raw)
        .map(str::to_uppercase)
        .filter(|token| !token.is_empty() && token.len() < 10)
        .filter(|token| seen.insert(token.clone()))
        .take(MAX_SIZES)
        .collect()
}

fn parse_occasions(raw: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    split_list(raw)
        .map(str::to_lowercase)
        .filter(|token| !token.is_empty() && token.len() < 20)
        .filter(|token| seen.insert(token.clone()))
        .take(MAX_OCCASIONS)
        .collect()
}

/// Ordered keyword table mapping raw category text into the taxonomy.
/// First match wins; unrecognized text falls back to `Fashion`.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Tops,
        &[
            "top", "shirt", "t-shirt", "tshirt", "blouse", "tank", "camisole", "crop", "sweater",
            "hoodie", "cardigan",
        ],
    ),
    (
        Category::Bottoms,
        &[
            "bottom", "pant", "jean", "short", "skirt", "legging", "trouser",
        ],
    ),
    (Category::Dresses, &["dress", "gown", "frock", "maxi", "mini", "midi"]),
    (
        Category::Activewear,
        &[
            "activewear", "sportswear", "athletic", "workout", "gym", "fitness", "yoga",
            "running", "training",
        ],
    ),
    (
        Category::Swimwear,
        &["swim", "bikini", "swimsuit", "beachwear", "bathing"],
    ),
    (
        Category::Outerwear,
        &["coat", "jacket", "blazer", "outerwear", "windbreaker", "bomber"],
    ),
    (
        Category::Lingerie,
        &["bra", "underwear", "lingerie", "intimate", "panties", "briefs"],
    ),
    (
        Category::Accessories,
        &[
            "bag", "accessory", "belt", "hat", "scarf", "jewelry", "watch", "sunglasses",
        ],
    ),
    (
        Category::Shoes,
        &["shoe", "sneaker", "boot", "sandal", "heel", "flat"],
    ),
];

pub fn standardize_category(raw: &str) -> Category {
    let text = raw.to_lowercase();
    if text.is_empty() {
        return Category::Fashion;
    }
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return *category;
        }
    }
    Category::Fashion
}

const STYLE_KEYWORDS: &[(&str, &[&str])] = &[
    ("casual", &["casual", "everyday", "comfort", "relaxed"]),
    ("formal", &["formal", "elegant", "dress", "blazer"]),
    ("sporty", &["sport", "athletic", "gym", "workout", "active"]),
    ("trendy", &["trendy", "fashion", "style", "modern"]),
    ("vintage", &["vintage", "retro", "classic", "timeless"]),
    ("minimalist", &["minimal", "simple", "basic", "clean"]),
    ("bohemian", &["boho", "bohemian", "flowy", "hippie"]),
    ("edgy", &["edgy", "rock", "punk", "leather", "studded"]),
];

/// Derive up to 3 style tags from the item name.
pub fn extract_style_features(name: &str) -> Vec<String> {
    let text = name.to_lowercase();
    STYLE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .take(MAX_STYLE_FEATURES)
        .map(|(style, _)| (*style).to_string())
        .collect()
}

/// Price tier used by catalog diagnostics.
pub fn price_range(price: f32) -> &'static str {
    if price < 25.0 {
        "budget"
    } else if price < 75.0 {
        "mid-range"
    } else if price < 150.0 {
        "premium"
    } else {
        "luxury"
    }
}
