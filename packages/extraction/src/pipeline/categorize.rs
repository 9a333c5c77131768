//! Keyword classification of packaging, source and product type.
//!
//! Each axis is a single ordered list of (category, keywords) rules tested
//! top to bottom against the lowercased page text; the first rule with any
//! keyword hit wins. The order is the tie-break policy: a page mentioning
//! both "glass" and "plastic" is glass, one mentioning both "sparkling" and
//! "flavored" is sparkling.
//!
//! Keywords match on word boundaries, so "can" never fires inside
//! "american" and "gas" never fires inside "vegas".

use crate::types::product::{Packaging, WaterSource, WaterType};

/// One classification rule.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule<T: 'static> {
    pub category: T,
    pub keywords: &'static [&'static str],
}

/// Packaging rules. Bare "can" is left out: as a verb it is on every page.
pub const PACKAGING_RULES: &[CategoryRule<Packaging>] = &[
    CategoryRule {
        category: Packaging::Glass,
        keywords: &["glass"],
    },
    CategoryRule {
        category: Packaging::Plastic,
        keywords: &["plastic", "pet", "hdpe"],
    },
    CategoryRule {
        category: Packaging::Aluminum,
        keywords: &["aluminum", "aluminium", "cans", "canned"],
    },
    CategoryRule {
        category: Packaging::Carton,
        keywords: &["carton", "tetra", "boxed water"],
    },
];

/// Source rules.
pub const SOURCE_RULES: &[CategoryRule<WaterSource>] = &[
    CategoryRule {
        category: WaterSource::Spring,
        keywords: &["spring", "natural spring"],
    },
    CategoryRule {
        category: WaterSource::Mineral,
        keywords: &["mineral", "natural mineral"],
    },
    CategoryRule {
        category: WaterSource::Purified,
        keywords: &["purified", "filtered", "distilled", "reverse osmosis"],
    },
    CategoryRule {
        category: WaterSource::Artesian,
        keywords: &["artesian"],
    },
    CategoryRule {
        category: WaterSource::Volcanic,
        keywords: &["volcanic"],
    },
    CategoryRule {
        category: WaterSource::Glacial,
        keywords: &["glacial", "glacier"],
    },
    CategoryRule {
        category: WaterSource::Municipal,
        keywords: &["municipal", "tap water", "public water supply"],
    },
];

/// Type rules. The last rule is a catch-all for plain water pages.
pub const TYPE_RULES: &[CategoryRule<WaterType>] = &[
    CategoryRule {
        category: WaterType::SparklingWater,
        keywords: &["sparkling", "carbonated", "seltzer", "gas"],
    },
    CategoryRule {
        category: WaterType::FlavoredWater,
        keywords: &["flavored", "flavoured", "flavor", "fruit", "infused"],
    },
    CategoryRule {
        category: WaterType::WaterDelivery,
        keywords: &["delivery", "gallon", "gallons"],
    },
    CategoryRule {
        category: WaterType::BottledWater,
        keywords: &["still", "natural", "spring", "water"],
    },
];

/// First category whose keyword set hits `text_lower`.
pub fn first_match<T: Copy>(rules: &[CategoryRule<T>], text_lower: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| contains_word(text_lower, k)))
        .map(|rule| rule.category)
}

pub fn classify_packaging(text_lower: &str) -> Option<Packaging> {
    first_match(PACKAGING_RULES, text_lower)
}

pub fn classify_source(text_lower: &str) -> Option<WaterSource> {
    first_match(SOURCE_RULES, text_lower)
}

/// Product type, defaulting to bottled water when nothing matches.
pub fn classify_type(text_lower: &str) -> WaterType {
    first_match(TYPE_RULES, text_lower).unwrap_or_default()
}

/// Whether `needle` occurs in `haystack` with no word character on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
