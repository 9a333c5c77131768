//! The harvest run: seed, search, probe, detail, enrich, finalize.
//!
//! Per-item failures (a search that errors, a page that will not fetch or
//! parse) are logged and counted; only store failures end a run.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use super::merge::Catalog;
use super::page::ProductPageExtractor;
use super::stream::StreamRecordExtractor;
use super::synthetic::SyntheticContaminantGenerator;
use crate::error::StoreResult;
use crate::traits::ingestor::Ingestor;
use crate::traits::store::RecordStore;
use crate::types::config::HarvestConfig;
use crate::types::contaminant::Status;
use crate::types::product::ProductRecord;

/// Contaminant rows per status across a record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub pass: usize,
    pub warning: usize,
    pub fail: usize,
    pub unknown: usize,
}

impl StatusBreakdown {
    pub fn from_records(records: &[ProductRecord]) -> Self {
        let mut breakdown = Self::default();
        for status in records.iter().flat_map(|record| record.statuses()) {
            breakdown.add(status);
        }
        breakdown
    }

    pub fn add(&mut self, status: Status) {
        match status {
            Status::Pass => self.pass += 1,
            Status::Warning => self.warning += 1,
            Status::Fail => self.fail += 1,
            Status::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.warning + self.fail + self.unknown
    }
}

impl fmt::Display for StatusBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pass={} warning={} fail={} unknown={}",
            self.pass, self.warning, self.fail, self.unknown
        )
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub records_seeded: usize,
    pub queries_run: usize,
    pub queries_failed: usize,
    pub fragments_found: usize,
    /// URL-pattern candidates requested
    pub probes_tried: usize,
    /// Candidates that answered with a usable product page
    pub probes_found: usize,
    pub pages_fetched: usize,
    /// Pages that could not be fetched
    pub pages_failed: usize,
    /// Pages fetched but yielding no usable record
    pub pages_unparsed: usize,
    pub synthetic_profiles: usize,
    pub duplicates_dropped: usize,
    pub checkpoints: usize,
    pub records_written: usize,
    pub status_breakdown: StatusBreakdown,
}

/// Drives one harvest against an ingestor and a record store.
pub struct Harvester<I, S> {
    config: HarvestConfig,
    ingestor: I,
    store: S,
    catalog: Catalog,
    stream: StreamRecordExtractor,
    pages: ProductPageExtractor,
    synthetic: SyntheticContaminantGenerator,
    report: HarvestReport,
    /// Identities whose page was already parsed this run
    detailed: HashSet<String>,
}

impl<I: Ingestor, S: RecordStore> Harvester<I, S> {
    pub fn new(config: HarvestConfig, ingestor: I, store: S) -> Self {
        Self {
            stream: StreamRecordExtractor::new(config.product_path.clone()),
            pages: ProductPageExtractor::from_config(&config),
            synthetic: SyntheticContaminantGenerator::new(),
            catalog: Catalog::new(),
            report: HarvestReport::default(),
            detailed: HashSet::new(),
            config,
            ingestor,
            store,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn report(&self) -> &HarvestReport {
        &self.report
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full run: seed, search, probe, detail, enrich, finalize.
    pub async fn run(&mut self, queries: &[String]) -> StoreResult<HarvestReport> {
        info!(ingestor = self.ingestor.name(), queries = queries.len(), "Starting harvest");
        self.seed().await?;
        self.search_phase(queries).await;
        self.probe_phase().await;
        self.detail_phase().await?;
        self.enrich();
        self.finalize().await
    }

    /// Enrich the stored records without touching the network.
    pub async fn run_enrichment_only(&mut self) -> StoreResult<HarvestReport> {
        info!("Starting enrichment-only run");
        self.seed().await?;
        self.enrich();
        self.finalize().await
    }

    /// Load the existing store so a run resumes where the last one stopped.
    pub async fn seed(&mut self) -> StoreResult<usize> {
        let records = self.store.load().await?;
        let count = records.len();
        for record in records {
            self.catalog.merge_record(record);
        }
        self.report.records_seeded += count;
        info!(count, identities = self.catalog.len(), "Seeded from store");
        Ok(count)
    }

    /// Search every query and merge the recovered fragments.
    ///
    /// Results are consumed in query order regardless of completion order,
    /// so discovery order does not depend on timing.
    pub async fn search_phase(&mut self, queries: &[String]) -> usize {
        let ingestor = &self.ingestor;
        let limit = self.config.search_limit;
        let mut merged = 0;

        let mut results = stream::iter(queries)
            .map(|query| async move { (query, ingestor.search(query, limit).await) })
            .buffered(self.config.concurrency.max(1));

        while let Some((query, result)) = results.next().await {
            self.report.queries_run += 1;
            match result {
                Ok(body) => {
                    let outcome = self.stream.extract(&body);
                    info!(
                        query = %query,
                        strategy = outcome.strategy.unwrap_or("none"),
                        count = outcome.items.len(),
                        "Search parsed"
                    );
                    self.report.fragments_found += outcome.items.len();
                    for fragment in outcome.items {
                        self.catalog.merge_fragment(fragment);
                        merged += 1;
                    }
                }
                Err(e) => {
                    self.report.queries_failed += 1;
                    warn!(query = %query, error = %e, "Search failed");
                }
            }
        }

        info!(identities = self.catalog.len(), "Search phase complete");
        merged
    }

    /// Request the configured slug patterns that are not yet known.
    ///
    /// A candidate that answers with a usable product page becomes a new
    /// identity; anything else is expected and only logged at debug level.
    pub async fn probe_phase(&mut self) -> usize {
        let candidates: Vec<String> = self
            .config
            .probe_candidates()
            .into_iter()
            .filter(|slug| self.catalog.get(slug).is_none())
            .collect();
        if candidates.is_empty() {
            return 0;
        }

        let ingestor = &self.ingestor;
        let config = &self.config;
        let mut probes = stream::iter(candidates)
            .map(|slug| {
                let url = config.product_url(&slug);
                async move {
                    let result = ingestor.fetch_page(&url).await;
                    (slug, url, result)
                }
            })
            .buffered(config.concurrency.max(1));

        let mut found = 0;
        while let Some((slug, url, result)) = probes.next().await {
            self.report.probes_tried += 1;
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    debug!(url = %url, error = %e, "Probe missed");
                    continue;
                }
            };
            let Some(fragment) = self.pages.extract(&page) else {
                continue;
            };

            self.catalog.merge_fragment(fragment.with_slug(&slug));
            self.detailed.insert(slug.clone());
            found += 1;
            info!(url = %url, "Probe found product");
        }

        self.report.probes_found += found;
        info!(tried = self.report.probes_tried, found, "Probe phase complete");
        found
    }

    /// Fetch and parse the page of every identity with a slug.
    ///
    /// Identities already parsed by the probe are not fetched again. The
    /// catalog is checkpointed to the store every `checkpoint_every`
    /// processed items (0 disables checkpoints).
    pub async fn detail_phase(&mut self) -> StoreResult<()> {
        let detailed = &self.detailed;
        let targets: Vec<(String, String)> = self
            .catalog
            .slugs()
            .into_iter()
            .filter(|(identity, _)| !detailed.contains(identity))
            .collect();
        let total = targets.len();
        let checkpoint_every = self.config.checkpoint_every;
        let ingestor = &self.ingestor;
        let config = &self.config;

        let mut fetches = stream::iter(targets)
            .map(|(identity, slug)| {
                let url = config.product_url(&slug);
                async move {
                    let result = ingestor.fetch_page(&url).await;
                    (identity, slug, url, result)
                }
            })
            .buffered(config.concurrency.max(1));

        let mut processed = 0;
        while let Some((identity, slug, url, result)) = fetches.next().await {
            processed += 1;
            debug!(processed, total, slug = %slug, "Detail progress");

            match result {
                Ok(page) => {
                    self.report.pages_fetched += 1;
                    match self.pages.extract(&page) {
                        Some(fragment) => {
                            self.catalog.absorb_into(&identity, fragment.with_slug(&slug));
                        }
                        None => self.report.pages_unparsed += 1,
                    }
                }
                Err(e) => {
                    self.report.pages_failed += 1;
                    warn!(url = %url, error = %e, "Product page unreachable, keeping basic record");
                }
            }

            if checkpoint_every > 0 && processed % checkpoint_every == 0 {
                self.store.save(&self.catalog.to_records()).await?;
                self.report.checkpoints += 1;
                info!(processed, total, "Checkpoint saved");
            }
        }

        info!(
            fetched = self.report.pages_fetched,
            failed = self.report.pages_failed,
            unparsed = self.report.pages_unparsed,
            "Detail phase complete"
        );
        Ok(())
    }

    /// Give every record without contaminant data a synthetic profile.
    pub fn enrich(&mut self) -> usize {
        let mut added = 0;
        for record in self.catalog.iter_mut() {
            if record.has_contaminant_data() {
                continue;
            }
            let profile = self.synthetic.generate(record);
            record.set_contaminants(profile);
            added += 1;
        }
        self.report.synthetic_profiles += added;
        info!(added, "Synthetic profiles generated");
        added
    }

    /// Deduplicate by name, write the store, and close the report.
    pub async fn finalize(&mut self) -> StoreResult<HarvestReport> {
        self.report.duplicates_dropped += self.catalog.dedupe_by_name();

        let records = self.catalog.to_records();
        self.store.save(&records).await?;

        self.report.records_written = records.len();
        self.report.status_breakdown = StatusBreakdown::from_records(&records);
        info!(
            records = records.len(),
            breakdown = %self.report.status_breakdown,
            "Harvest complete"
        );
        Ok(self.report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contaminant::ContaminantRecord;

    #[test]
    fn test_status_breakdown() {
        let mut record = ProductRecord::from_name("Evian");
        record.set_contaminants(vec![
            ContaminantRecord::classified("Lead", Some("12 ppb".into()), Some("10 ppb".into()), None),
            ContaminantRecord::classified("Arsenic", Some("ND".into()), None, None),
            ContaminantRecord::classified("Nitrate", Some("1 ppm".into()), Some("10 ppm".into()), None),
        ]);

        let breakdown = StatusBreakdown::from_records(&[record]);
        assert_eq!(breakdown.fail, 1);
        assert_eq!(breakdown.unknown, 1);
        assert_eq!(breakdown.pass, 1);
        assert_eq!(breakdown.total(), 3);
        assert_eq!(breakdown.to_string(), "pass=1 warning=0 fail=1 unknown=1");
    }
}
