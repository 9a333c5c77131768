//! Candidate records from the search response stream.
//!
//! The search endpoint answers with streamed component markup that embeds
//! JSON-ish fragments. Three strategies are tried in order:
//!
//! 1. object recovery - brace-delimited fragments containing `slug`
//! 2. positional correlation - `score`/`name`/`slug`/`type` scanned as
//!    independent sequences and zipped by index
//! 3. slug salvage - bare `/product/<slug>` paths
//!
//! Fragments come out in discovery order. Colliding slugs are not resolved
//! here; identity resolution belongs to the merge step.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

use super::strategy::{first_productive, ChainOutcome, Strategy};
use crate::error::{ParseError, ParseResult};
use crate::types::fragment::{Origin, ProductFragment};
use crate::types::product::{title_case_slug, WaterType};

static SLUG_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^{}]*\bslug\b[^{}]*\}"#).expect("slug object pattern is valid")
});

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).expect("bare key pattern is valid")
});

static SCORE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""score"\s*:\s*(\d+)"#).expect("score pattern is valid"));

static NAME_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""name"\s*:\s*"([^"]+)""#).expect("name pattern is valid"));

static SLUG_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""slug"\s*:\s*"([^"]+)""#).expect("slug pattern is valid"));

static TYPE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""type"\s*:\s*"([^"]+)""#).expect("type pattern is valid"));

/// Parses search response bodies into product fragments.
#[derive(Debug, Clone)]
pub struct StreamRecordExtractor {
    salvage: SlugSalvage,
}

impl StreamRecordExtractor {
    /// `product_path` is the path prefix product pages live under, e.g. `/product/`.
    pub fn new(product_path: impl Into<String>) -> Self {
        Self {
            salvage: SlugSalvage::new(product_path),
        }
    }

    pub fn extract(&self, body: &str) -> ChainOutcome<ProductFragment> {
        first_productive::<str, ProductFragment>(
            &[&ObjectRecovery, &PositionalCorrelation, &self.salvage],
            body,
        )
    }
}

impl Default for StreamRecordExtractor {
    fn default() -> Self {
        Self::new("/product/")
    }
}

/// Strategy 1: whole JSON objects that carry a `slug`.
pub struct ObjectRecovery;

impl Strategy<str> for ObjectRecovery {
    type Output = ProductFragment;

    fn name(&self) -> &'static str {
        Origin::ObjectRecovery.as_str()
    }

    fn extract(&self, body: &str) -> ParseResult<Vec<ProductFragment>> {
        let mut fragments = Vec::new();

        for candidate in SLUG_OBJECT.find_iter(body) {
            let quoted = quote_bare_keys(candidate.as_str());
            let object = match serde_json::from_str::<Value>(&quoted) {
                Ok(Value::Object(object)) => object,
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "Skipping unparseable stream fragment");
                    continue;
                }
            };

            if let Some(fragment) = fragment_from_object(&object, Origin::ObjectRecovery) {
                fragments.push(fragment);
            }
        }

        Ok(fragments)
    }
}

/// Strategy 2: the i-th occurrence of each field describes the i-th product.
pub struct PositionalCorrelation;

impl Strategy<str> for PositionalCorrelation {
    type Output = ProductFragment;

    fn name(&self) -> &'static str {
        Origin::PositionalCorrelation.as_str()
    }

    fn extract(&self, body: &str) -> ParseResult<Vec<ProductFragment>> {
        let slugs = captures(&SLUG_FIELD, body);
        let scores = captures(&SCORE_FIELD, body);
        let names = captures(&NAME_FIELD, body);
        let kinds = captures(&TYPE_FIELD, body);

        // A product needs at least a slug and a score to be worth correlating.
        let count = slugs.len().min(scores.len());

        let fragments = (0..count)
            .map(|i| {
                let slug = slugs[i];
                let mut fragment = ProductFragment::new(Origin::PositionalCorrelation)
                    .with_slug(slug)
                    .with_name(names.get(i).copied().map_or_else(|| title_case_slug(slug), str::to_string))
                    .with_kind(
                        kinds
                            .get(i)
                            .and_then(|label| WaterType::from_label(label))
                            .unwrap_or_default(),
                    );
                fragment.score = scores[i].parse::<u32>().ok().and_then(score_in_range);
                fragment
            })
            .collect();

        Ok(fragments)
    }
}

/// Strategy 3: product paths only; name comes from the slug.
#[derive(Debug, Clone)]
pub struct SlugSalvage {
    prefix: String,
}

impl SlugSalvage {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Strategy<str> for SlugSalvage {
    type Output = ProductFragment;

    fn name(&self) -> &'static str {
        Origin::SlugSalvage.as_str()
    }

    fn extract(&self, body: &str) -> ParseResult<Vec<ProductFragment>> {
        if self.prefix.is_empty() {
            return Err(ParseError::NoStructure("empty product path prefix".into()));
        }

        let fragments = body
            .match_indices(self.prefix.as_str())
            .filter_map(|(start, _)| {
                let rest = &body[start + self.prefix.len()..];
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '/' | '"' | '\'' | '?' | '#' | '\\' | '<' | '>'))
                    .unwrap_or(rest.len());
                let slug = &rest[..end];
                (!slug.is_empty()).then(|| {
                    ProductFragment::new(Origin::SlugSalvage)
                        .with_slug(slug)
                        .with_name(title_case_slug(slug))
                })
            })
            .collect();

        Ok(fragments)
    }
}

/// Quote unquoted object keys so `{slug: "x"}` parses as JSON.
fn quote_bare_keys(fragment: &str) -> String {
    BARE_KEY.replace_all(fragment, r#"$1"$2":"#).into_owned()
}

fn captures<'a>(pattern: &Regex, body: &'a str) -> Vec<&'a str> {
    pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

fn score_in_range(score: u32) -> Option<u8> {
    u8::try_from(score).ok().filter(|s| *s <= 100)
}

/// Read the modelled fields of a recovered JSON object.
///
/// Returns `None` unless the object carries a non-empty string `slug`.
pub(crate) fn fragment_from_object(object: &Map<String, Value>, origin: Origin) -> Option<ProductFragment> {
    let slug = object.get("slug")?.as_str()?;
    let mut fragment = ProductFragment::new(origin).with_slug(slug);
    fragment.slug.as_ref()?;

    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty());

    fragment = fragment.with_name(text("name").map_or_else(|| title_case_slug(slug), str::to_string));
    fragment.brand = text("brand").map(str::to_string);
    fragment.image = text("image").map(str::to_string);
    fragment.score = match object.get("score") {
        Some(Value::Number(n)) => n.as_u64().and_then(|s| u32::try_from(s).ok()).and_then(score_in_range),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok().and_then(score_in_range),
        _ => None,
    };
    fragment.kind = text("type").and_then(WaterType::from_label);
    fragment.packaging = object
        .get("packaging")
        .and_then(|v| serde_json::from_value(v.clone()).ok());
    fragment.source = object
        .get("source")
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    Some(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::Packaging;

    #[test]
    fn test_object_recovery_with_bare_keys() {
        let body = r#"1:["$","div",null,{slug:"fiji-water",name:"Fiji Water",score:52,type:"bottled_water"}]
2:{"slug":"voss-still","name":"Voss Still","score":71,"packaging":"glass"}"#;
        let outcome = StreamRecordExtractor::default().extract(body);
        assert_eq!(outcome.strategy, Some("object_recovery"));
        assert_eq!(outcome.items.len(), 2);

        let fiji = &outcome.items[0];
        assert_eq!(fiji.slug.as_deref(), Some("fiji-water"));
        assert_eq!(fiji.score, Some(52));
        assert_eq!(fiji.kind, Some(WaterType::BottledWater));

        let voss = &outcome.items[1];
        assert_eq!(voss.packaging, Some(Packaging::Glass));
        assert_eq!(voss.origin, Origin::ObjectRecovery);
    }

    #[test]
    fn test_object_recovery_is_exclusive() {
        // Positional correlation and slug salvage would both find more here.
        let body = r#"{"slug":"evian","score":80} "/product/other-thing" "slug":"x","score":1"#;
        let outcome = StreamRecordExtractor::default().extract(body);
        assert_eq!(outcome.strategy, Some("object_recovery"));
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].slug.as_deref(), Some("evian"));
    }

    #[test]
    fn test_positional_fallback() {
        // Nested objects never match the flat-brace pattern.
        let body = r#"{"p":{"x":{"slug":"a-b","score":40,"name":"A B","type":"sparkling_water","m":{"z":1}}}}
{"q":{"slug":"c-d","score":150,"m":{"z":1}}}"#;
        let outcome = StreamRecordExtractor::default().extract(body);
        assert_eq!(outcome.strategy, Some("positional_correlation"));
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[0].kind, Some(WaterType::SparklingWater));
        assert_eq!(outcome.items[0].score, Some(40));
        assert_eq!(outcome.items[1].name.as_deref(), Some("C D"));
        assert_eq!(outcome.items[1].kind, Some(WaterType::BottledWater));
        assert_eq!(outcome.items[1].score, None);
    }

    #[test]
    fn test_slug_salvage() {
        let body = r#"<a href="/product/mountain-valley-spring?ref=1">x</a> \"/product/topo-chico\""#;
        let outcome = StreamRecordExtractor::default().extract(body);
        assert_eq!(outcome.strategy, Some("slug_salvage"));
        let names: Vec<_> = outcome.items.iter().filter_map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec!["Mountain Valley Spring", "Topo Chico"]);
    }

    #[test]
    fn test_nothing_recoverable() {
        let outcome = StreamRecordExtractor::default().extract("0:null\n1:[]");
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_objects_without_string_slug_are_dropped() {
        let object: Map<String, Value> = serde_json::from_str(r#"{"slug": null, "name": "x"}"#).unwrap();
        assert!(fragment_from_object(&object, Origin::ObjectRecovery).is_none());
    }
}
