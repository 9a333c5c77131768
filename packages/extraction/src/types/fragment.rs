//! Partial product records produced by individual extraction strategies.

use serde_json::{Map, Value};
use std::fmt;

use super::contaminant::ContaminantRecord;
use super::product::{name_key, normalize_slug, Packaging, ProductRecord, WaterSource, WaterType};

/// Which strategy recovered a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Whole JSON object recovered from the search stream
    ObjectRecovery,
    /// Field sequences zipped by position
    PositionalCorrelation,
    /// Only a `/product/<slug>` path was found
    SlugSalvage,
    /// Parsed from the product's own page
    ProductPage,
    /// Loaded from the record store
    Store,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::ObjectRecovery => "object_recovery",
            Origin::PositionalCorrelation => "positional_correlation",
            Origin::SlugSalvage => "slug_salvage",
            Origin::ProductPage => "product_page",
            Origin::Store => "store",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product as seen by one strategy: every field may be absent.
///
/// Absent means "this strategy has nothing to say", so merging a fragment
/// never erases a value an earlier strategy found.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFragment {
    pub origin: Origin,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub score: Option<u8>,
    pub packaging: Option<Packaging>,
    pub source: Option<WaterSource>,
    pub kind: Option<WaterType>,
    pub image: Option<String>,
    /// `None` when the strategy found no contaminant rows.
    pub contaminants: Option<Vec<ContaminantRecord>>,
    pub extra: Map<String, Value>,
}

impl ProductFragment {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            slug: None,
            name: None,
            brand: None,
            score: None,
            packaging: None,
            source: None,
            kind: None,
            image: None,
            contaminants: None,
            extra: Map::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl AsRef<str>) -> Self {
        let slug = normalize_slug(slug.as_ref());
        self.slug = (!slug.is_empty()).then_some(slug);
        self
    }

    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        self.name = (!name.is_empty()).then(|| name.to_string());
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_kind(mut self, kind: WaterType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach contaminant rows; an empty table counts as absent.
    pub fn with_contaminants(mut self, rows: Vec<ContaminantRecord>) -> Self {
        self.contaminants = (!rows.is_empty()).then_some(rows);
        self
    }

    /// Merge key, or `None` if the fragment has neither slug nor name.
    pub fn identity_key(&self) -> Option<String> {
        self.slug
            .clone()
            .or_else(|| self.name.as_deref().map(name_key))
            .filter(|key| !key.is_empty())
    }

    /// Materialize a record from a fragment seen for the first time.
    pub fn into_record(self) -> Option<ProductRecord> {
        let mut record = match (&self.slug, &self.name) {
            (Some(slug), _) => ProductRecord::from_slug(slug),
            (None, Some(name)) => ProductRecord::from_name(name.clone()),
            (None, None) => return None,
        };
        record.absorb(self);
        Some(record)
    }
}

impl From<&ProductRecord> for ProductFragment {
    /// Every field of a record counts as present.
    fn from(record: &ProductRecord) -> Self {
        let mut fragment = ProductFragment::new(Origin::Store).with_name(&record.name);
        fragment.slug = record.slug.clone();
        fragment.brand = record.brand.clone();
        fragment.score = record.score;
        fragment.packaging = record.packaging;
        fragment.source = record.source;
        fragment.kind = record.kind;
        fragment.image = record.image.clone();
        fragment.extra = record.extra.clone();
        fragment.with_contaminants(record.contaminants().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key() {
        let by_slug = ProductFragment::new(Origin::SlugSalvage)
            .with_slug("/Fiji-Water/")
            .with_name("Fiji");
        assert_eq!(by_slug.identity_key(), Some("fiji-water".to_string()));

        let by_name = ProductFragment::new(Origin::ProductPage).with_name("  Voss Still ");
        assert_eq!(by_name.identity_key(), Some("voss still".to_string()));

        assert_eq!(ProductFragment::new(Origin::ProductPage).with_name("   ").identity_key(), None);
    }

    #[test]
    fn test_into_record_uses_slug_name_fallback() {
        let record = ProductFragment::new(Origin::SlugSalvage)
            .with_slug("icelandic-glacial-water")
            .into_record()
            .unwrap();
        assert_eq!(record.name, "Icelandic Glacial Water");
        assert_eq!(record.id, "icelandic-glacial-water");
        assert!(ProductFragment::new(Origin::ProductPage).into_record().is_none());
    }

    #[test]
    fn test_empty_contaminants_are_absent() {
        let fragment = ProductFragment::new(Origin::ProductPage).with_contaminants(Vec::new());
        assert!(fragment.contaminants.is_none());
    }
}
