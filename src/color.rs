//! Color matching rules.
//!
//! Explicit lookup tables rather than scattered conditionals so the rules
//! stay testable in isolation. All matching is case-insensitive substring
//! matching: "Jet Black" harmonizes with anything "black" does.

/// Known-harmonious color pairs. Direction-agnostic.
const HARMONIOUS_PAIRS: &[(&str, &str)] = &[
    ("black", "white"),
    ("black", "gray"),
    ("white", "gray"),
    ("blue", "white"),
    ("blue", "black"),
    ("navy", "white"),
    ("red", "black"),
    ("red", "white"),
    ("pink", "white"),
    ("green", "white"),
    ("brown", "beige"),
    ("brown", "white"),
];

/// Neutral palette used for gym pair bonuses.
pub const NEUTRALS: &[&str] = &["black", "white", "gray", "grey"];
/// Muted palette favored for yoga pairings.
pub const YOGA_PALETTE: &[&str] = &["black", "white", "gray", "navy", "sage", "beige"];
/// Office-appropriate palette.
pub const PROFESSIONAL_PALETTE: &[&str] = &["black", "white", "navy", "gray", "beige", "cream"];
/// Evening palette for date-night pairings.
pub const ELEGANT_PALETTE: &[&str] = &["black", "white", "navy", "burgundy", "emerald"];

/// Harmony score for two color lists: 0.9 for a known-harmonious pair, 0.8
/// for an identical color, 0.4 for unknown combinations, 0.5 when either
/// side has no colors.
pub fn color_harmony(colors_a: &[String], colors_b: &[String]) -> f32 {
    if colors_a.is_empty() || colors_b.is_empty() {
        return 0.5;
    }

    for color_a in colors_a {
        let a = color_a.to_lowercase();
        for color_b in colors_b {
            let b = color_b.to_lowercase();
            for (h1, h2) in HARMONIOUS_PAIRS {
                if (a.contains(h1) && b.contains(h2)) || (a.contains(h2) && b.contains(h1)) {
                    return 0.9;
                }
            }
            if a == b {
                return 0.8;
            }
        }
    }

    0.4
}

/// Whether any color in the list belongs to the given palette.
pub fn has_palette_color(colors: &[String], palette: &[&str]) -> bool {
    colors
        .iter()
        .any(|color| palette.contains(&color.to_lowercase().as_str()))
}

/// Whether the two lists share at least one color (case-insensitive).
pub fn shares_color(colors_a: &[String], colors_b: &[String]) -> bool {
    colors_a.iter().any(|a| {
        let a = a.to_lowercase();
        colors_b.iter().any(|b| b.to_lowercase() == a)
    })
}

/// Coarse warm/cool/neutral/bold family for a color string.
pub fn color_family(color: &str) -> &'static str {
    const FAMILIES: &[(&str, &[&str])] = &[
        ("warm", &["red", "orange", "yellow", "pink", "coral", "peach"]),
        ("cool", &["blue", "green", "purple", "turquoise", "teal", "mint"]),
        (
            "neutral",
            &["black", "white", "gray", "brown", "beige", "cream", "tan", "nude"],
        ),
        ("bold", &["neon", "bright", "electric", "hot", "fluorescent"]),
    ];

    let text = color.to_lowercase();
    for (family, members) in FAMILIES {
        if members.iter().any(|member| text.contains(member)) {
            return family;
        }
    }
    "neutral"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_harmonious_pair_scores_high() {
        assert!((color_harmony(&colors(&["Black"]), &colors(&["White"])) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_harmony_is_direction_agnostic() {
        let ab = color_harmony(&colors(&["navy"]), &colors(&["white"]));
        let ba = color_harmony(&colors(&["white"]), &colors(&["navy"]));
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_identical_color_scores_point_eight() {
        assert!((color_harmony(&colors(&["sage"]), &colors(&["Sage"])) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_combination_is_neutral() {
        assert!((color_harmony(&colors(&["chartreuse"]), &colors(&["mauve"])) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_empty_side_scores_half() {
        assert!((color_harmony(&[], &colors(&["black"])) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_substring_matching() {
        // Compound color names still harmonize through their base color.
        let sim = color_harmony(&colors(&["Jet Black"]), &colors(&["Off White"]));
        assert!((sim - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_palette_membership() {
        assert!(has_palette_color(&colors(&["Black"]), NEUTRALS));
        assert!(!has_palette_color(&colors(&["magenta"]), NEUTRALS));
    }

    #[test]
    fn test_shared_color_detection() {
        assert!(shares_color(&colors(&["Black", "Red"]), &colors(&["black"])));
        assert!(!shares_color(&colors(&["red"]), &colors(&["blue"])));
    }

    #[test]
    fn test_color_families() {
        assert_eq!(color_family("coral"), "warm");
        assert_eq!(color_family("teal"), "cool");
        assert_eq!(color_family("cream"), "neutral");
        assert_eq!(color_family("electric"), "bold");
        // Family order matters: the base color wins over the bold modifier.
        assert_eq!(color_family("neon green"), "cool");
        assert_eq!(color_family("mystery"), "neutral");
    }
}
