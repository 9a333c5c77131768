//! The static search query enumeration.

use indexmap::IndexSet;

const WATER_TERMS: &[&str] = &[
    "water", "spring", "sparkling", "mineral", "purified", "alkaline", "filtered", "electrolyte",
    "coconut", "flavored", "delivery", "glacial", "artesian", "distilled", "natural", "volcanic",
    "still", "gas", "carbonated", "enhanced", "raw", "structured",
];

const BRANDS: &[&str] = &[
    "evian", "fiji", "voss", "perrier", "pellegrino", "gerolsteiner", "aquafina", "dasani",
    "smartwater", "essentia", "core", "lifewtr", "topo chico", "mountain valley", "saratoga",
    "waiakea", "icelandic", "aqua carpatica", "hallstein", "hawaii volcanic", "crystal geyser",
    "nestle", "ozarka", "poland spring", "zephyrhills", "arrowhead", "deer park", "ice mountain",
    "pure life", "vittel", "badoit", "san pellegrino", "acqua panna", "hildon", "ty nant", "belu",
    "highland spring", "buxton", "harrogate", "malvern", "strathmore",
];

const DESCRIPTIVE_TERMS: &[&str] = &[
    "glass", "plastic", "aluminum", "bottle", "can", "premium", "organic", "pure", "clean",
    "healthy", "premium", "luxury", "sustainable", "eco", "natural", "fresh", "crisp", "smooth",
];

/// Single letters a-z, then water terms, brands and descriptive terms.
///
/// Duplicates are removed keeping the first occurrence, so the order is
/// stable from run to run.
pub fn default_queries() -> Vec<String> {
    let letters = ('a'..='z').map(String::from);
    let terms = WATER_TERMS
        .iter()
        .chain(BRANDS)
        .chain(DESCRIPTIVE_TERMS)
        .map(|term| term.to_string());

    letters.chain(terms).collect::<IndexSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_dedup() {
        let queries = default_queries();
        assert_eq!(queries[0], "a");
        assert_eq!(queries[25], "z");
        assert_eq!(queries[26], "water");
        assert_eq!(queries.iter().filter(|q| *q == "natural").count(), 1);
        assert_eq!(queries.iter().filter(|q| *q == "premium").count(), 1);
        assert!(queries.contains(&"topo chico".to_string()));
    }
}
