//! Product detail from a fetched product page.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

use super::categorize::{classify_packaging, classify_source, classify_type};
use super::contaminants::ContaminantTableExtractor;
use crate::error::{ParseError, ParseResult};
use crate::traits::ingestor::RawPage;
use crate::types::config::HarvestConfig;
use crate::types::fragment::{Origin, ProductFragment};

/// Score patterns in priority order. Each captures the candidate value.
static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)\bscore["']?\s*[:=]\s*["']?(\d{1,3})\b"#,
        r#"(?i)\brating["']?\s*[:=]\s*["']?(\d{1,3})\b"#,
        r"\b(\d{1,3})\s*/\s*100\b",
        r"(?i)\b(\d{1,3})\s*points?\b",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("score pattern is valid"))
    .collect()
});

static LEADING_CAPITALIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{Lu}[\p{L}'&]*(?:[ \t]+\p{Lu}[\p{L}'&]*)*").expect("brand pattern is valid")
});

static IMAGE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:jpg|jpeg|png|webp)(?:[?#]|$)").expect("image pattern is valid"));

/// Name candidates, best first. `title` is the only one that can carry the
/// site's own branding.
const NAME_SELECTORS: &[&str] = &["h1", r#"[data-testid="product-title"]"#, ".product-title", "title"];

/// Extracts a product fragment from a product page.
#[derive(Debug, Clone)]
pub struct ProductPageExtractor {
    site_brand_token: String,
    contaminants: ContaminantTableExtractor,
}

impl ProductPageExtractor {
    /// `site_brand_token` is the target site's own name, lowercased.
    pub fn new(site_brand_token: impl Into<String>) -> Self {
        Self {
            site_brand_token: site_brand_token.into().to_lowercase(),
            contaminants: ContaminantTableExtractor::new(),
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(&config.site_brand_token)
    }

    /// Extract a fragment, or `None` if the page is unusable.
    ///
    /// Failures are logged here and never propagated.
    pub fn extract(&self, page: &RawPage) -> Option<ProductFragment> {
        match self.try_extract(page) {
            Ok(fragment) => {
                debug!(
                    url = %page.url,
                    name = ?fragment.name,
                    contaminants = fragment.contaminants.as_ref().map_or(0, Vec::len),
                    "Parsed product page"
                );
                Some(fragment)
            }
            Err(e) => {
                warn!(url = %page.url, error = %e, "Skipping product page");
                None
            }
        }
    }

    /// Extract a fragment, reporting why a page is unusable.
    pub fn try_extract(&self, page: &RawPage) -> ParseResult<ProductFragment> {
        if !page.has_content() {
            return Err(ParseError::NoStructure("empty page".into()));
        }

        let document = Html::parse_document(&page.content);
        let text_lower = page.content.to_lowercase();

        let name = self.name(&document);
        let score = score(&page.content);
        let contaminants = self.contaminants.extract(&document, &page.content);

        if name.is_none() && score.is_none() && contaminants.is_empty() {
            return Err(ParseError::NoStructure("no name, score or contaminants".into()));
        }

        let mut fragment = ProductFragment::new(Origin::ProductPage).with_contaminants(contaminants);
        if let Some(name) = name {
            fragment.brand = brand(&name);
            fragment = fragment.with_name(name);
        }
        fragment.score = score;
        fragment.packaging = classify_packaging(&text_lower);
        fragment.source = classify_source(&text_lower);
        fragment.kind = Some(classify_type(&text_lower));
        fragment.image = image(&document, &page.url);

        Ok(fragment)
    }

    /// First usable name candidate. A title carrying the site brand is kept
    /// only as a last resort.
    fn name(&self, document: &Html) -> Option<String> {
        let mut branded_title = None;

        for css in NAME_SELECTORS {
            let Ok(selector) = Selector::parse(css) else {
                continue;
            };
            let Some(text) = document
                .select(&selector)
                .map(|el| el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" "))
                .find(|text| !text.is_empty())
            else {
                continue;
            };

            let is_title = *css == "title";
            if is_title
                && !self.site_brand_token.is_empty()
                && text.to_lowercase().contains(&self.site_brand_token)
            {
                branded_title = Some(text);
                continue;
            }
            return Some(text);
        }

        branded_title
    }
}

/// First in-range score across the patterns, in priority order.
fn score(content: &str) -> Option<u8> {
    SCORE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(content)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .filter(|score| *score <= 100)
    })
}

/// Leading run of capitalized words.
fn brand(name: &str) -> Option<String> {
    LEADING_CAPITALIZED
        .find(name.trim())
        .map(|m| m.as_str().trim().to_string())
        .filter(|brand| !brand.is_empty())
}

/// First image with a picture extension, resolved against the page URL.
fn image(document: &Html, page_url: &str) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    let src = document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .find(|src| IMAGE_EXTENSION.is_match(src))?;

    match Url::parse(page_url) {
        Ok(base) => base.join(src).ok().map(String::from),
        Err(_) => Url::parse(src).ok().map(String::from),
    }
}
