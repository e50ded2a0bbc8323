//! Outfit compatibility engine.
//!
//! Two modes share the same color/style rule tables:
//!
//! - prompt-driven generation: a free-text occasion prompt selects themed
//!   item pools, all valid top/bottom pairs are scored additively, and the
//!   best pairs plus curated single pieces become outfits;
//! - item-anchored expansion: one base item is classified into a garment
//!   role, complementary roles are filled from the pool by a weighted
//!   compatibility score, and the assembled set is scored pairwise.
//!
//! Both modes degrade silently: an empty slot skips the outfit template
//! instead of erroring, and an outfit is only emitted when it holds enough
//! pieces to wear.

use crate::color;
use crate::types::{Category, Outfit, ProductItem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use tracing::debug;

const MAX_OUTFITS: usize = 6;
const MAX_OUTFIT_ITEMS: usize = 4;
const CANDIDATES_PER_SLOT: usize = 2;

/// Semantic garment role used by prompt-driven generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Top,
    Bottom,
    Dress,
    Beachwear,
    Accessory,
    Activewear,
}

/// Garment role used by item-anchored expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarmentRole {
    Dress,
    Top,
    Bottom,
    Jacket,
    Shoes,
    Accessory,
}

/// Keyword rule: an item matches when its text contains any include keyword
/// and none of the exclude keywords. Bottoms exclude top keywords and vice
/// versa so one item never classifies as both.
pub struct SlotRule {
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
}

impl SlotRule {
    pub fn matches(&self, text: &str) -> bool {
        self.include.iter().any(|kw| text.contains(kw))
            && !self.exclude.iter().any(|kw| text.contains(kw))
    }
}

const TOP_KEYWORDS: &[&str] = &[
    "top", "shirt", "bra", "blouse", "tank", "cami", "crop", "tee", "hoodie", "sweater", "sleeve",
];
const BOTTOM_KEYWORDS: &[&str] = &[
    "bottom", "pant", "short", "jean", "skirt", "legging", "trouser", "jogger", "wide leg",
    "flare",
];
const DRESS_KEYWORDS: &[&str] = &["dress", "frock"];

pub const TOP_RULE: SlotRule = SlotRule {
    include: TOP_KEYWORDS,
    exclude: &[
        "bottom", "pant", "short", "jean", "skirt", "legging", "trouser", "dress", "frock",
    ],
};

pub const BOTTOM_RULE: SlotRule = SlotRule {
    include: BOTTOM_KEYWORDS,
    exclude: &["top", "bra", "shirt", "tank", "crop", "sleeve"],
};

const BEACHWEAR_KEYWORDS: &[&str] = &[
    "bikini", "swimsuit", "swimwear", "beach", "sarong", "coverup",
];
const ACCESSORY_KEYWORDS: &[&str] = &["accessor", "bag", "tote", "hat", "sunglasses"];
const ACTIVEWEAR_KEYWORDS: &[&str] = &[
    "gymshark", "alo", "vuori", "sport", "gym", "athletic", "workout", "active",
];

const ATHLETIC_BRANDS: &[&str] = &["gymshark", "alo", "vuori"];
const YOGA_BRANDS: &[&str] = &["alo", "lululemon", "beyond yoga"];

fn item_text(item: &ProductItem) -> String {
    format!(
        "{} {}",
        item.category.as_str(),
        item.name.to_lowercase()
    )
}

fn activewear_text(item: &ProductItem) -> String {
    format!(
        "{} {} {}",
        item.brand.to_lowercase(),
        item.name.to_lowercase(),
        item.category.as_str()
    )
}

/// Classify an item into its prompt-generation slot, if any.
pub fn classify_slot(item: &ProductItem) -> Option<Slot> {
    let text = item_text(item);
    if DRESS_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return Some(Slot::Dress);
    }
    if TOP_RULE.matches(&text) {
        return Some(Slot::Top);
    }
    if BOTTOM_RULE.matches(&text) {
        return Some(Slot::Bottom);
    }
    if BEACHWEAR_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return Some(Slot::Beachwear);
    }
    if ACCESSORY_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return Some(Slot::Accessory);
    }
    if ACTIVEWEAR_KEYWORDS
        .iter()
        .any(|kw| activewear_text(item).contains(kw))
    {
        return Some(Slot::Activewear);
    }
    None
}

/// Classify an item into the single garment role used by expansion.
pub fn classify_role(item: &ProductItem) -> GarmentRole {
    let name = item.name.to_lowercase();
    let category = item.category;

    if name.contains("dress") || category == Category::Dresses {
        GarmentRole::Dress
    } else if ["top", "shirt", "blouse", "tee", "tank"]
        .iter()
        .any(|kw| name.contains(kw))
        || category == Category::Tops
    {
        GarmentRole::Top
    } else if ["bottom", "pant", "jean", "short", "skirt"]
        .iter()
        .any(|kw| name.contains(kw))
        || category == Category::Bottoms
    {
        GarmentRole::Bottom
    } else if ["jacket", "blazer", "cardigan"]
        .iter()
        .any(|kw| name.contains(kw))
        || category == Category::Outerwear
    {
        GarmentRole::Jacket
    } else if ["shoe", "boot", "sneaker"].iter().any(|kw| name.contains(kw))
        || category == Category::Shoes
    {
        GarmentRole::Shoes
    } else {
        GarmentRole::Accessory
    }
}

/// Roles needed to complete an outfit anchored on the given base role.
fn complementary_roles(base: GarmentRole) -> &'static [GarmentRole] {
    match base {
        GarmentRole::Dress => &[GarmentRole::Jacket, GarmentRole::Shoes, GarmentRole::Accessory],
        GarmentRole::Top => &[GarmentRole::Bottom, GarmentRole::Jacket, GarmentRole::Shoes],
        GarmentRole::Bottom => &[GarmentRole::Top, GarmentRole::Jacket, GarmentRole::Shoes],
        GarmentRole::Jacket => &[GarmentRole::Top, GarmentRole::Bottom, GarmentRole::Shoes],
        GarmentRole::Shoes | GarmentRole::Accessory => &[],
    }
}

struct ClassifiedPool<'a> {
    tops: Vec<&'a ProductItem>,
    bottoms: Vec<&'a ProductItem>,
    dresses: Vec<&'a ProductItem>,
}

impl<'a> ClassifiedPool<'a> {
    fn classify(pool: &'a [ProductItem]) -> Self {
        let mut classified = Self {
            tops: Vec::new(),
            bottoms: Vec::new(),
            dresses: Vec::new(),
        };

        for item in pool {
            let text = item_text(item);
            if DRESS_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                classified.dresses.push(item);
            }
            if TOP_RULE.matches(&text) {
                classified.tops.push(item);
            }
            if BOTTOM_RULE.matches(&text) {
                classified.bottoms.push(item);
            }
        }

        // Relaxed second pass when the strict bottom rule finds nothing:
        // anything that is not already a top or a dress and carries a weak
        // bottom signal.
        if classified.bottoms.is_empty() {
            for item in pool {
                let text = item_text(item);
                let already_top = classified.tops.iter().any(|t| t.id == item.id);
                let is_dress = classified.dresses.iter().any(|d| d.id == item.id);
                let weak_signal = ["pant", "short", "skirt", "bottom"]
                    .iter()
                    .any(|kw| text.contains(kw))
                    || (item.brand.to_lowercase().contains("alo")
                        && !text.contains("bra")
                        && !text.contains("top"));
                if !already_top && !is_dress && weak_signal {
                    classified.bottoms.push(item);
                }
            }
        }

        classified
    }

    fn contains_top(&self, item: &ProductItem) -> bool {
        self.tops.iter().any(|t| t.id == item.id)
    }

    fn contains_bottom(&self, item: &ProductItem) -> bool {
        self.bottoms.iter().any(|b| b.id == item.id)
    }

    fn contains_dress(&self, item: &ProductItem) -> bool {
        self.dresses.iter().any(|d| d.id == item.id)
    }
}

fn occasion_matches(item: &ProductItem, keywords: &[&str]) -> bool {
    item.occasions
        .iter()
        .any(|occ| keywords.iter().any(|kw| occ.contains(kw)))
}

fn brand_in(item: &ProductItem, brands: &[&str]) -> bool {
    let brand = item.brand.to_lowercase();
    brands.iter().any(|b| brand.contains(b))
}

fn name_has(item: &ProductItem, keywords: &[&str]) -> bool {
    let name = item.name.to_lowercase();
    keywords.iter().any(|kw| name.contains(kw))
}

struct ScoredPair<'a> {
    top: &'a ProductItem,
    bottom: &'a ProductItem,
    score: i32,
}

fn make_outfit(
    id: String,
    name: &str,
    description: &str,
    items: Vec<ProductItem>,
    occasion: &str,
    confidence: u8,
    icon: &str,
) -> Outfit {
    Outfit {
        id,
        name: name.to_string(),
        description: description.to_string(),
        items,
        occasion: occasion.to_string(),
        confidence,
        icon: icon.to_string(),
    }
}

/// Compatibility scorer for outfit generation and completion.
pub struct OutfitEngine {
    rng: Mutex<StdRng>,
}

impl OutfitEngine {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed seed for the variety term in expansion scoring.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Prompt-driven generation: build up to 6 outfits for the occasions
    /// named in the free-text prompt, from the given item pool.
    pub fn generate(&self, prompt: &str, pool: &[ProductItem]) -> Vec<Outfit> {
        let lower_prompt = prompt.to_lowercase();
        let classified = ClassifiedPool::classify(pool);
        let mut outfits: Vec<Outfit> = Vec::new();

        if ["gym", "workout", "exercise"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.gym_outfits(pool, &classified, &mut outfits);
        }
        if ["yoga", "studio", "meditation"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.yoga_outfits(pool, &classified, &mut outfits);
        }
        if ["work", "office", "professional"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.work_outfits(pool, &classified, &mut outfits);
        }
        if ["date", "romantic", "dinner"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.date_outfits(pool, &classified, &mut outfits);
        }
        if ["casual", "weekend", "relax"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.casual_outfits(pool, &classified, &mut outfits);
        }
        if lower_prompt.contains("lounge") {
            self.lounge_outfits(pool, &classified, &mut outfits);
        }
        if ["party", "night out", "club"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.party_outfits(&classified, &mut outfits);
        }
        if ["beach", "vacation", "summer", "pool"].iter().any(|kw| lower_prompt.contains(kw)) {
            self.beach_outfits(pool, &classified, &mut outfits);
        }

        if outfits.is_empty() {
            self.general_outfits(&classified, &mut outfits);
        }

        outfits.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        outfits.truncate(MAX_OUTFITS);
        debug!(prompt = %prompt, outfits = outfits.len(), "generated outfits");
        outfits
    }

    fn gym_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let gym_items: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                brand_in(item, ATHLETIC_BRANDS)
                    || occasion_matches(item, &["gym", "workout", "exercise"])
                    || name_has(item, &["sport", "athletic", "workout"])
            })
            .collect();

        let tops: Vec<&ProductItem> = gym_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i))
            .collect();
        let bottoms: Vec<&ProductItem> = gym_items
            .iter()
            .copied()
            .filter(|i| classified.contains_bottom(i))
            .collect();

        let mut pairs: Vec<ScoredPair<'_>> = Vec::new();
        for top in &tops {
            for bottom in &bottoms {
                if top.id == bottom.id {
                    continue;
                }
                let mut score = 0;
                if !top.brand.is_empty() && top.brand.eq_ignore_ascii_case(&bottom.brand) {
                    score += 40;
                }
                if brand_in(top, ATHLETIC_BRANDS) && brand_in(bottom, ATHLETIC_BRANDS) {
                    score += 25;
                }
                if color::shares_color(&top.colors, &bottom.colors) {
                    score += 20;
                }
                if color::has_palette_color(&top.colors, color::NEUTRALS)
                    || color::has_palette_color(&bottom.colors, color::NEUTRALS)
                {
                    score += 15;
                }
                if name_has(top, &["bra"]) && name_has(bottom, &["legging"]) {
                    score += 30;
                }
                pairs.push(ScoredPair { top, bottom, score });
            }
        }

        pairs.sort_by(|a, b| b.score.cmp(&a.score));
        for (i, pair) in pairs.iter().take(3).enumerate() {
            let same_brand = pair.top.brand.eq_ignore_ascii_case(&pair.bottom.brand);
            let name = if same_brand {
                format!("{} Set", pair.top.brand)
            } else {
                "Gym Ready".to_string()
            };
            let confidence = (70 + pair.score / 2).min(95) as u8;
            outfits.push(make_outfit(
                format!("gym_smart_{i}"),
                &name,
                "Perfect workout combo",
                vec![pair.top.clone(), pair.bottom.clone()],
                "Gym",
                confidence,
                "GYM",
            ));
        }
    }

    fn yoga_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let yoga_items: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                brand_in(item, &["alo"])
                    || occasion_matches(item, &["yoga", "studio", "meditation"])
            })
            .collect();

        let tops: Vec<&ProductItem> = yoga_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i))
            .collect();
        let bottoms: Vec<&ProductItem> = yoga_items
            .iter()
            .copied()
            .filter(|i| classified.contains_bottom(i))
            .collect();

        let mut pairs: Vec<ScoredPair<'_>> = Vec::new();
        for top in &tops {
            for bottom in &bottoms {
                if top.id == bottom.id {
                    continue;
                }
                let mut score = 30;
                if !top.brand.is_empty() && top.brand.eq_ignore_ascii_case(&bottom.brand) {
                    score += 40;
                }
                if brand_in(top, YOGA_BRANDS) && brand_in(bottom, YOGA_BRANDS) {
                    score += 25;
                }
                if color::shares_color(&top.colors, &bottom.colors) {
                    score += 20;
                }
                if color::has_palette_color(&top.colors, color::YOGA_PALETTE)
                    || color::has_palette_color(&bottom.colors, color::YOGA_PALETTE)
                {
                    score += 15;
                }
                if name_has(top, &["tank"]) && name_has(bottom, &["legging"]) {
                    score += 25;
                }
                if name_has(top, &["bra"]) && name_has(bottom, &["high-waist"]) {
                    score += 20;
                }
                pairs.push(ScoredPair { top, bottom, score });
            }
        }

        pairs.sort_by(|a, b| b.score.cmp(&a.score));
        for (i, pair) in pairs.iter().take(3).enumerate() {
            let same_brand = pair.top.brand.eq_ignore_ascii_case(&pair.bottom.brand);
            let name = if same_brand {
                format!("{} Flow", pair.top.brand)
            } else {
                "Yoga Flow".to_string()
            };
            let confidence = (60 + pair.score).min(95) as u8;
            outfits.push(make_outfit(
                format!("yoga_smart_{i}"),
                &name,
                "Perfect for your practice",
                vec![pair.top.clone(), pair.bottom.clone()],
                "Yoga",
                confidence,
                "YOGA",
            ));
        }

        // Curated single pieces: flowing dresses work for practice too.
        let dresses: Vec<&ProductItem> = yoga_items
            .iter()
            .copied()
            .filter(|i| classified.contains_dress(i))
            .collect();
        for (i, dress) in dresses.iter().take(2).enumerate() {
            outfits.push(make_outfit(
                format!("yoga_dress_{i}"),
                "Yoga Dress",
                "Flowing movement",
                vec![(*dress).clone()],
                "Yoga",
                88,
                "YOGA",
            ));
        }
    }

    fn work_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let work_items: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                occasion_matches(
                    item,
                    &["work", "office", "professional", "business", "meeting", "formal"],
                )
            })
            .collect();

        let tops: Vec<&ProductItem> = work_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i))
            .collect();
        let bottoms: Vec<&ProductItem> = work_items
            .iter()
            .copied()
            .filter(|i| classified.contains_bottom(i))
            .collect();

        let mut pairs: Vec<ScoredPair<'_>> = Vec::new();
        for top in &tops {
            for bottom in &bottoms {
                if top.id == bottom.id {
                    continue;
                }
                let mut score = 20;
                if top.brand == bottom.brand {
                    score += 25;
                }
                if color::has_palette_color(&top.colors, color::PROFESSIONAL_PALETTE)
                    && color::has_palette_color(&bottom.colors, color::PROFESSIONAL_PALETTE)
                {
                    score += 30;
                }
                if color::shares_color(&top.colors, &bottom.colors) {
                    score += 20;
                }
                pairs.push(ScoredPair { top, bottom, score });
            }
        }

        pairs.sort_by(|a, b| b.score.cmp(&a.score));
        for (i, pair) in pairs.iter().take(3).enumerate() {
            let confidence = (60 + pair.score).min(95) as u8;
            outfits.push(make_outfit(
                format!("work_smart_{i}"),
                "Office Chic",
                "Professional and polished",
                vec![pair.top.clone(), pair.bottom.clone()],
                "Work",
                confidence,
                "WORK",
            ));
        }

        let dresses: Vec<&ProductItem> = work_items
            .iter()
            .copied()
            .filter(|i| classified.contains_dress(i))
            .collect();
        for (i, dress) in dresses.iter().enumerate() {
            outfits.push(make_outfit(
                format!("work_dress_{i}"),
                "Work Dress",
                "Effortlessly professional",
                vec![(*dress).clone()],
                "Work",
                92,
                "DRESS",
            ));
        }
    }

    fn date_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let specific: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                occasion_matches(
                    item,
                    &["date", "romantic", "dinner", "evening", "cocktail", "party"],
                )
            })
            .collect();

        // Elegant versatile pieces, strictly excluding athletic wear.
        let elegant: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                let athletic = occasion_matches(
                    item,
                    &["gym", "studio", "yoga", "running", "workout"],
                ) || name_has(item, &["bra", "legging", "sport"]);
                let elegant = occasion_matches(item, &["versatile", "lounge"])
                    || name_has(item, &["dress", "blouse", "trouser"]);
                !athletic && elegant
            })
            .collect();

        let mut date_items: Vec<&ProductItem> = specific;
        for item in elegant {
            if !date_items.iter().any(|d| d.id == item.id) {
                date_items.push(item);
            }
        }

        let dresses: Vec<&ProductItem> = date_items
            .iter()
            .copied()
            .filter(|i| classified.contains_dress(i))
            .collect();
        for (i, dress) in dresses.iter().take(3).enumerate() {
            outfits.push(make_outfit(
                format!("date_dress_{i}"),
                "Date Night Glam",
                "Romantic and stunning",
                vec![(*dress).clone()],
                "Date",
                94,
                "DATE",
            ));
        }

        let tops: Vec<&ProductItem> = date_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i) && !name_has(i, &["bra", "sport", "tank"]))
            .collect();
        let bottoms: Vec<&ProductItem> = date_items
            .iter()
            .copied()
            .filter(|i| {
                classified.contains_bottom(i)
                    && !name_has(i, &["legging", "short"])
                    && name_has(i, &["trouser", "pant", "skirt"])
            })
            .collect();

        let mut pairs: Vec<ScoredPair<'_>> = Vec::new();
        for top in tops.iter().take(3) {
            for bottom in bottoms.iter().take(3) {
                if top.id == bottom.id {
                    continue;
                }
                let mut score = 30;
                if color::has_palette_color(&top.colors, color::ELEGANT_PALETTE)
                    && color::has_palette_color(&bottom.colors, color::ELEGANT_PALETTE)
                {
                    score += 30;
                }
                let top_black = color::has_palette_color(&top.colors, &["black"]);
                let top_white = color::has_palette_color(&top.colors, &["white"]);
                let bottom_black = color::has_palette_color(&bottom.colors, &["black"]);
                let bottom_white = color::has_palette_color(&bottom.colors, &["white"]);
                if top_black && bottom_black {
                    score += 35;
                }
                if (top_white && bottom_black) || (top_black && bottom_white) {
                    score += 25;
                }
                if top.brand == bottom.brand {
                    score += 20;
                }
                pairs.push(ScoredPair { top, bottom, score });
            }
        }

        // High bar for a date outfit: only well-coordinated pairs make it.
        pairs.retain(|pair| pair.score >= 50);
        pairs.sort_by(|a, b| b.score.cmp(&a.score));
        for (i, pair) in pairs.iter().take(2).enumerate() {
            let confidence = (60 + pair.score).min(95) as u8;
            outfits.push(make_outfit(
                format!("date_smart_{i}"),
                "Elegant Evening",
                "Sophisticated and chic",
                vec![pair.top.clone(), pair.bottom.clone()],
                "Date",
                confidence,
                "DATE",
            ));
        }
    }

    fn casual_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let casual_items: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                let tagged = occasion_matches(
                    item,
                    &["casual", "weekend", "lounge", "streetwear", "versatile"],
                );
                let casual_type = name_has(
                    item,
                    &[
                        "tee", "tank", "graphic", "crew", "hoodie", "sweat", "jogger", "casual",
                        "pullover",
                    ],
                );
                // Gym-focused pieces belong to the gym/yoga pools instead.
                let athletic_brand = brand_in(item, &["gymshark"])
                    || (brand_in(item, &["alo"]) && occasion_matches(item, &["gym", "yoga"]));
                (tagged || casual_type) && !athletic_brand
            })
            .collect();

        let tops: Vec<&ProductItem> = casual_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i))
            .collect();
        let bottoms: Vec<&ProductItem> = casual_items
            .iter()
            .copied()
            .filter(|i| classified.contains_bottom(i))
            .collect();

        for (i, top) in tops.iter().take(3).enumerate() {
            for (j, bottom) in bottoms.iter().take(2).enumerate() {
                if outfits.len() < MAX_OUTFITS && top.id != bottom.id {
                    outfits.push(make_outfit(
                        format!("casual_{i}_{j}"),
                        "Weekend Vibes",
                        "Comfortable and stylish",
                        vec![(*top).clone(), (*bottom).clone()],
                        "Casual",
                        85,
                        "CASUAL",
                    ));
                }
            }
        }
    }

    fn lounge_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let lounge_items: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| occasion_matches(item, &["lounge", "relax", "comfort"]))
            .collect();

        let tops: Vec<&ProductItem> = lounge_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i))
            .collect();
        let bottoms: Vec<&ProductItem> = lounge_items
            .iter()
            .copied()
            .filter(|i| classified.contains_bottom(i))
            .collect();

        for (i, top) in tops.iter().take(2).enumerate() {
            for (j, bottom) in bottoms.iter().take(2).enumerate() {
                if top.id != bottom.id {
                    outfits.push(make_outfit(
                        format!("lounge_{i}_{j}"),
                        "Lounge Life",
                        "Ultimate comfort and relaxation",
                        vec![(*top).clone(), (*bottom).clone()],
                        "Lounge",
                        88,
                        "LOUNGE",
                    ));
                }
            }
        }
    }

    fn party_outfits(&self, classified: &ClassifiedPool<'_>, outfits: &mut Vec<Outfit>) {
        for (i, dress) in classified.dresses.iter().take(2).enumerate() {
            outfits.push(make_outfit(
                format!("party_dress_{i}"),
                "Party Perfect",
                "Ready to dance the night away",
                vec![(*dress).clone()],
                "Party",
                94,
                "PARTY",
            ));
        }
    }

    fn beach_outfits(
        &self,
        pool: &[ProductItem],
        classified: &ClassifiedPool<'_>,
        outfits: &mut Vec<Outfit>,
    ) {
        let beach_items: Vec<&ProductItem> = pool
            .iter()
            .filter(|item| {
                occasion_matches(item, &["beach", "vacation", "summer", "pool", "swimwear"])
            })
            .collect();

        let dresses: Vec<&ProductItem> = beach_items
            .iter()
            .copied()
            .filter(|i| classified.contains_dress(i))
            .collect();
        for (i, dress) in dresses.iter().take(2).enumerate() {
            outfits.push(make_outfit(
                format!("beach_dress_{i}"),
                "Beach Goddess",
                "Perfect for seaside strolls",
                vec![(*dress).clone()],
                "Beach",
                92,
                "BEACH",
            ));
        }

        let tops: Vec<&ProductItem> = beach_items
            .iter()
            .copied()
            .filter(|i| classified.contains_top(i))
            .collect();
        let bottoms: Vec<&ProductItem> = beach_items
            .iter()
            .copied()
            .filter(|i| classified.contains_bottom(i))
            .collect();

        for (i, top) in tops.iter().take(2).enumerate() {
            for (j, bottom) in bottoms.iter().take(2).enumerate() {
                let beach_count = outfits.iter().filter(|o| o.occasion == "Beach").count();
                if top.id != bottom.id && beach_count < MAX_OUTFITS {
                    outfits.push(make_outfit(
                        format!("beach_combo_{i}_{j}"),
                        "Beach Casual",
                        "Comfortable and breezy",
                        vec![(*top).clone(), (*bottom).clone()],
                        "Beach",
                        88,
                        "BEACH",
                    ));
                }
            }
        }
    }

    /// Fallback when no occasion fired: general top/bottom combinations and
    /// standalone dresses.
    fn general_outfits(&self, classified: &ClassifiedPool<'_>, outfits: &mut Vec<Outfit>) {
        for (i, top) in classified.tops.iter().take(3).enumerate() {
            for (j, bottom) in classified.bottoms.iter().take(3).enumerate() {
                if top.id != bottom.id && outfits.len() < MAX_OUTFITS {
                    outfits.push(make_outfit(
                        format!("general_{i}_{j}"),
                        "Perfect Match",
                        "Great combination for any occasion",
                        vec![(*top).clone(), (*bottom).clone()],
                        "General",
                        80,
                        "MATCH",
                    ));
                }
            }
        }

        for (i, dress) in classified.dresses.iter().take(2).enumerate() {
            outfits.push(make_outfit(
                format!("general_dress_{i}"),
                "Dress Up",
                "Always a good choice",
                vec![(*dress).clone()],
                "General",
                82,
                "DRESS",
            ));
        }
    }

    /// Item-anchored expansion: complete an outfit around one base item.
    /// Returns one outfit per template that could be filled with at least
    /// one complementary piece.
    pub fn expand(&self, base: &ProductItem, pool: &[ProductItem]) -> Vec<Outfit> {
        const TEMPLATES: &[(&str, &str, &str)] = &[
            ("Casual Chic", "casual", "Easy pieces that work together"),
            ("Work Professional", "professional", "Office-ready polish"),
            ("Date Night", "romantic", "Evening-ready coordination"),
            ("Weekend Vibes", "relaxed", "Laid-back comfort"),
        ];

        let base_role = classify_role(base);
        let needed = complementary_roles(base_role);
        let mut outfits = Vec::new();

        for (idx, (name, style, description)) in TEMPLATES.iter().enumerate() {
            let mut items = vec![base.clone()];
            for role in needed {
                let mut candidates: Vec<(f32, &ProductItem)> = pool
                    .iter()
                    .filter(|item| item.id != base.id && classify_role(item) == *role)
                    .map(|item| (self.compatibility_score(base, item), item))
                    .collect();
                candidates
                    .sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
                for (_, item) in candidates.iter().take(CANDIDATES_PER_SLOT) {
                    if items.len() < MAX_OUTFIT_ITEMS {
                        items.push((*item).clone());
                    }
                }
            }

            // A single lonely item is not an outfit.
            if items.len() < 2 {
                continue;
            }

            let confidence = (Self::outfit_confidence(&items) * 100.0).round() as u8;
            outfits.push(make_outfit(
                format!("expand_{idx}"),
                name,
                description,
                items,
                style,
                confidence,
                "BUILD",
            ));
        }

        debug!(base = %base.id, outfits = outfits.len(), "expanded outfits");
        outfits
    }

    /// Weighted compatibility between the base item and a candidate:
    /// color harmony 30%, price proximity 20%, same brand 15%, shared
    /// occasion 25%, random variety 10%.
    fn compatibility_score(&self, base: &ProductItem, item: &ProductItem) -> f32 {
        let mut score = 0.0;

        score += color::color_harmony(&base.colors, &item.colors) * 0.3;

        let max_price = base.price.max(item.price);
        if max_price > 0.0 {
            score += (base.price.min(item.price) / max_price) * 0.2;
        }

        if base.brand == item.brand {
            score += 0.15;
        }

        score += style_consistency(base, item) * 0.25;

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        score += rng.gen::<f32>() * 0.1;

        score
    }

    /// Mean pairwise `(color harmony + style consistency) / 2` across all
    /// item pairs in the outfit.
    fn outfit_confidence(items: &[ProductItem]) -> f32 {
        if items.len() < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut comparisons = 0;
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let harmony = color::color_harmony(&items[i].colors, &items[j].colors);
                let consistency = style_consistency(&items[i], &items[j]);
                total += (harmony + consistency) / 2.0;
                comparisons += 1;
            }
        }

        total / comparisons as f32
    }
}

impl Default for OutfitEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 0.8 when the items share an occasion tag, 0.5 otherwise.
fn style_consistency(a: &ProductItem, b: &ProductItem) -> f32 {
    let shared = a.occasions.iter().any(|occ_a| {
        b.occasions
            .iter()
            .any(|occ_b| occ_a.eq_ignore_ascii_case(occ_b))
    });
    if shared {
        0.8
    } else {
        0.5
    }
}
