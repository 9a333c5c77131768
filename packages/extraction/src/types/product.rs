//! Product records - the normalized output of a harvest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tracing::warn;

use super::contaminant::{ContaminantRecord, Status};
use super::lenient;

/// Container material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    Glass,
    Plastic,
    Aluminum,
    Carton,
    #[serde(other)]
    Unknown,
}

/// Where the water comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterSource {
    Spring,
    Mineral,
    Purified,
    Artesian,
    Volcanic,
    Glacial,
    Municipal,
    #[serde(other)]
    Unknown,
}

/// Product category. Unrecognized labels read as bottled water.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterType {
    SparklingWater,
    FlavoredWater,
    WaterDelivery,
    #[default]
    #[serde(other)]
    BottledWater,
}

impl WaterType {
    /// Parse a wire label such as `sparkling_water`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "bottled_water" => Some(WaterType::BottledWater),
            "sparkling_water" => Some(WaterType::SparklingWater),
            "flavored_water" => Some(WaterType::FlavoredWater),
            "water_delivery" => Some(WaterType::WaterDelivery),
            _ => None,
        }
    }
}

/// A normalized product with its contaminant table.
///
/// `total_contaminants` and `contaminants_above_guidelines` are private and
/// recomputed on every change to the contaminant list, including on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredProduct")]
pub struct ProductRecord {
    /// Identity: normalized slug, or a slug derived from the name.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<Packaging>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<WaterSource>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<WaterType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    contaminants: Vec<ContaminantRecord>,
    total_contaminants: usize,
    contaminants_above_guidelines: usize,

    /// Fields this crate does not model, kept so a store round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    /// Create a minimal record for a slug, naming it after the slug.
    pub fn from_slug(slug: &str) -> Self {
        let slug = normalize_slug(slug);
        let mut record = Self::empty(slug.clone(), title_case_slug(&slug));
        record.slug = Some(slug);
        record
    }

    /// Create a minimal record known only by name.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        Self::empty(slugify(&name), name)
    }

    fn empty(id: String, name: String) -> Self {
        Self {
            id,
            slug: None,
            name,
            brand: None,
            score: None,
            packaging: None,
            source: None,
            kind: None,
            image: None,
            contaminants: Vec::new(),
            total_contaminants: 0,
            contaminants_above_guidelines: 0,
            extra: Map::new(),
        }
    }

    /// Key used to merge records discovered by different strategies.
    ///
    /// Normalized slug when known, otherwise the lowercased trimmed name.
    pub fn identity_key(&self) -> String {
        match self.slug.as_deref().map(normalize_slug) {
            Some(slug) if !slug.is_empty() => slug,
            _ => name_key(&self.name),
        }
    }

    pub fn contaminants(&self) -> &[ContaminantRecord] {
        &self.contaminants
    }

    /// Replace the contaminant table and recompute the derived counts.
    pub fn set_contaminants(&mut self, contaminants: Vec<ContaminantRecord>) {
        self.contaminants = contaminants;
        self.recount();
    }

    /// Append rows in discovery order and recompute the derived counts.
    pub fn extend_contaminants(&mut self, rows: impl IntoIterator<Item = ContaminantRecord>) {
        self.contaminants.extend(rows);
        self.recount();
    }

    pub fn has_contaminant_data(&self) -> bool {
        !self.contaminants.is_empty()
    }

    pub fn total_contaminants(&self) -> usize {
        self.total_contaminants
    }

    pub fn contaminants_above_guidelines(&self) -> usize {
        self.contaminants_above_guidelines
    }

    /// Category with the bottled-water default applied.
    pub fn water_type(&self) -> WaterType {
        self.kind.unwrap_or_default()
    }

    /// Status of each contaminant row, in table order.
    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.contaminants.iter().map(ContaminantRecord::status)
    }

    fn recount(&mut self) {
        self.total_contaminants = self.contaminants.len();
        self.contaminants_above_guidelines = self
            .contaminants
            .iter()
            .filter(|c| c.status().is_above_guidelines())
            .count();
    }
}

/// On-disk shape. Stored counts are read and discarded; a field of the wrong
/// shape reads as absent.
#[derive(Deserialize)]
struct StoredProduct {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    slug: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    brand: Option<Value>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    packaging: Option<Value>,
    #[serde(default)]
    source: Option<Value>,
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    image: Option<Value>,
    #[serde(default)]
    contaminants: Option<Value>,
    #[serde(default, rename = "total_contaminants")]
    _total_contaminants: Option<Value>,
    #[serde(default, rename = "contaminants_above_guidelines")]
    _contaminants_above_guidelines: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<StoredProduct> for ProductRecord {
    fn from(stored: StoredProduct) -> Self {
        let slug = lenient::text(stored.slug)
            .map(|s| normalize_slug(&s))
            .filter(|s| !s.is_empty());
        let name = lenient::text(stored.name)
            .or_else(|| slug.as_deref().map(title_case_slug))
            .unwrap_or_default();
        let id = lenient::text(stored.id)
            .or_else(|| slug.clone())
            .unwrap_or_else(|| slugify(&name));

        let mut record = Self::empty(id, name);
        record.slug = slug;
        record.brand = lenient::text(stored.brand);
        record.score = lenient::score(stored.score);
        record.packaging = lenient::typed(stored.packaging);
        record.source = lenient::typed(stored.source);
        record.kind = lenient::typed(stored.kind);
        record.image = lenient::text(stored.image);
        record.extra = stored.extra;
        record.set_contaminants(stored_contaminants(&record.id, stored.contaminants));
        record
    }
}

/// Rows that fail to read are logged and dropped.
fn stored_contaminants(id: &str, value: Option<Value>) -> Vec<ContaminantRecord> {
    let Some(Value::Array(rows)) = value else {
        return Vec::new();
    };
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(id = %id, error = %e, "Dropping unreadable stored contaminant");
                None
            }
        })
        .collect()
}

/// Normalize a URL slug: trimmed, no surrounding slashes, lowercase.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().trim_matches('/').to_lowercase()
}

/// Name key used for deduplication: lowercased and trimmed.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Derive a slug-like id from a free-text name.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// `aqua-carpatica-spring` -> `Aqua Carpatica Spring`.
pub fn title_case_slug(slug: &str) -> String {
    slug.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
