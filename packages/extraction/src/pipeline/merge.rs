//! Identity resolution and field-level merging.
//!
//! Rule: a later value replaces an earlier one only when it is present.
//! Identity is the normalized slug, or the lowercased trimmed name when no
//! slug is known. A record's `id` is fixed when it is first observed.

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

use crate::types::fragment::ProductFragment;
use crate::types::product::{name_key, ProductRecord};

impl ProductRecord {
    /// Overwrite fields with every value `fragment` has.
    pub fn absorb(&mut self, fragment: ProductFragment) {
        if fragment.slug.is_some() {
            self.slug = fragment.slug;
        }
        if let Some(name) = fragment.name {
            self.name = name;
        }
        if fragment.brand.is_some() {
            self.brand = fragment.brand;
        }
        if fragment.score.is_some() {
            self.score = fragment.score;
        }
        if fragment.packaging.is_some() {
            self.packaging = fragment.packaging;
        }
        if fragment.source.is_some() {
            self.source = fragment.source;
        }
        if fragment.kind.is_some() {
            self.kind = fragment.kind;
        }
        if fragment.image.is_some() {
            self.image = fragment.image;
        }
        if let Some(contaminants) = fragment.contaminants {
            self.set_contaminants(contaminants);
        }
        self.extra.extend(fragment.extra);
    }

    /// Merge a later record for the same identity into this one.
    pub fn merge_from(&mut self, later: &ProductRecord) {
        self.absorb(ProductFragment::from(later));
    }
}

/// What merging a fragment did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    /// Fragment had neither slug nor name
    Skipped,
}

/// Product records keyed by identity, in first-observed order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: IndexMap<String, ProductRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from stored records, merging repeated identities.
    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.merge_record(record);
        }
        catalog
    }

    pub fn merge_fragment(&mut self, fragment: ProductFragment) -> MergeOutcome {
        let Some(key) = fragment.identity_key() else {
            debug!(origin = %fragment.origin, "Dropping fragment without identity");
            return MergeOutcome::Skipped;
        };

        if let Some(existing) = self.records.get_mut(&key) {
            existing.absorb(fragment);
            return MergeOutcome::Updated;
        }

        match fragment.into_record() {
            Some(record) => {
                self.records.insert(key, record);
                MergeOutcome::Inserted
            }
            None => MergeOutcome::Skipped,
        }
    }

    pub fn merge_record(&mut self, record: ProductRecord) -> MergeOutcome {
        let key = record.identity_key();
        if let Some(existing) = self.records.get_mut(&key) {
            existing.merge_from(&record);
            MergeOutcome::Updated
        } else {
            self.records.insert(key, record);
            MergeOutcome::Inserted
        }
    }

    /// Collapse records sharing a name key, keeping the first seen.
    ///
    /// Returns how many records were dropped.
    pub fn dedupe_by_name(&mut self) -> usize {
        let before = self.records.len();
        let mut seen = HashSet::new();
        self.records.retain(|identity, record| {
            let key = name_key(&record.name);
            if key.is_empty() {
                debug!(identity = %identity, "Dropping record without a name");
                return false;
            }
            let first = seen.insert(key);
            if !first {
                debug!(identity = %identity, name = %record.name, "Dropping duplicate by name");
            }
            first
        });
        before - self.records.len()
    }

    pub fn get(&self, identity: &str) -> Option<&ProductRecord> {
        self.records.get(identity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProductRecord> {
        self.records.values_mut()
    }

    /// `(identity, slug)` for every record with a known slug, in order.
    pub fn slugs(&self) -> Vec<(String, String)> {
        self.records
            .iter()
            .filter_map(|(identity, record)| record.slug.clone().map(|slug| (identity.clone(), slug)))
            .collect()
    }

    /// Merge a fragment into an existing identity regardless of the
    /// fragment's own key. Returns false if the identity is unknown.
    pub fn absorb_into(&mut self, identity: &str, fragment: ProductFragment) -> bool {
        match self.records.get_mut(identity) {
            Some(record) => {
                record.absorb(fragment);
                true
            }
            None => false,
        }
    }

    pub fn to_records(&self) -> Vec<ProductRecord> {
        self.records.values().cloned().collect()
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contaminant::ContaminantRecord;
    use crate::types::fragment::Origin;
    use crate::types::product::{Packaging, WaterType};
    use proptest::prelude::*;

    #[test]
    fn test_present_values_overwrite() {
        let mut record = ProductRecord::from_slug("fiji-water");
        record.score = Some(40);
        record.packaging = Some(Packaging::Plastic);

        let mut page = ProductFragment::new(Origin::ProductPage).with_name("Fiji Natural Artesian");
        page.score = Some(55);
        record.absorb(page);

        assert_eq!(record.name, "Fiji Natural Artesian");
        assert_eq!(record.score, Some(55));
        assert_eq!(record.packaging, Some(Packaging::Plastic));
        assert_eq!(record.id, "fiji-water");
    }

    #[test]
    fn test_contaminants_replace_and_recount() {
        let mut record = ProductRecord::from_slug("voss");
        let rows = vec![ContaminantRecord::classified(
            "Lead",
            Some("12 ppb".into()),
            Some("10 ppb".into()),
            None,
        )];
        record.absorb(ProductFragment::new(Origin::ProductPage).with_contaminants(rows));
        assert_eq!(record.total_contaminants(), 1);
        assert_eq!(record.contaminants_above_guidelines(), 1);

        record.absorb(ProductFragment::new(Origin::ProductPage).with_contaminants(Vec::new()));
        assert_eq!(record.total_contaminants(), 1);
    }

    #[test]
    fn test_catalog_merges_by_identity() {
        let mut catalog = Catalog::new();
        let first = ProductFragment::new(Origin::ObjectRecovery)
            .with_slug("evian")
            .with_score(70);
        let second = ProductFragment::new(Origin::ObjectRecovery)
            .with_slug("/EVIAN/")
            .with_kind(WaterType::BottledWater);
        assert_eq!(catalog.merge_fragment(first), MergeOutcome::Inserted);
        assert_eq!(catalog.merge_fragment(second), MergeOutcome::Updated);
        assert_eq!(
            catalog.merge_fragment(ProductFragment::new(Origin::ProductPage)),
            MergeOutcome::Skipped
        );

        let evian = catalog.get("evian").unwrap();
        assert_eq!(evian.score, Some(70));
        assert_eq!(evian.kind, Some(WaterType::BottledWater));
        assert_eq!(catalog.slugs(), vec![("evian".to_string(), "evian".to_string())]);
    }

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let mut catalog = Catalog::new();
        catalog.merge_fragment(ProductFragment::new(Origin::SlugSalvage).with_slug("topo-chico-glass").with_name("Topo Chico"));
        catalog.merge_fragment(ProductFragment::new(Origin::SlugSalvage).with_slug("topo-chico").with_name(" topo chico "));
        catalog.merge_fragment(ProductFragment::new(Origin::SlugSalvage).with_slug("perrier"));

        assert_eq!(catalog.dedupe_by_name(), 1);
        let ids: Vec<_> = catalog.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["topo-chico-glass", "perrier"]);
    }

    fn arb_fragment() -> impl Strategy<Value = ProductFragment> {
        (
            proptest::option::of("[a-z]{1,8}"),
            proptest::option::of(0u8..=100),
            proptest::option::of(prop_oneof![Just(Packaging::Glass), Just(Packaging::Plastic)]),
            proptest::option::of("[a-z]{1,8}"),
        )
            .prop_map(|(name, score, packaging, brand)| {
                let mut fragment = ProductFragment::new(Origin::ProductPage);
                if let Some(name) = name {
                    fragment = fragment.with_name(name);
                }
                fragment.score = score;
                fragment.packaging = packaging;
                fragment.brand = brand;
                fragment
            })
    }

    proptest! {
        #[test]
        fn later_present_fields_win(a in arb_fragment(), b in arb_fragment()) {
            let mut record = ProductRecord::from_slug("same");
            record.absorb(a.clone());
            record.absorb(b.clone());

            prop_assert_eq!(record.score, b.score.or(a.score));
            prop_assert_eq!(record.packaging, b.packaging.or(a.packaging));
            prop_assert_eq!(record.brand.clone(), b.brand.clone().or(a.brand.clone()));
            let expected_name = b.name.clone().or(a.name.clone()).unwrap_or_else(|| "Same".to_string());
            prop_assert_eq!(record.name.clone(), expected_name);
        }

        #[test]
        fn merging_with_self_is_identity(a in arb_fragment()) {
            let mut record = ProductRecord::from_slug("same");
            record.absorb(a);
            let before = record.clone();
            record.merge_from(&before);
            prop_assert_eq!(record, before);
        }
    }
}
