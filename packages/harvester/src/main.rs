// Entry point for a harvest run

mod config;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use water_extraction::{
    default_queries, Harvester, HttpIngestor, JsonFileStore, ProductRecord, RateLimitedIngestor,
    StoreError, TemplateSink,
};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,water_extraction=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        base_url = %config.harvest.base_url,
        store = %config.store_path.display(),
        skip_search = config.skip_search,
        "Configuration loaded"
    );

    let ingestor = HttpIngestor::new(&config.harvest).context("Failed to build HTTP client")?;
    let ingestor = RateLimitedIngestor::new(ingestor, config.harvest.requests_per_second);
    let store = JsonFileStore::new(&config.store_path);
    let mut harvester = Harvester::new(config.harvest.clone(), ingestor, store);

    let report = if config.skip_search {
        harvester.run_enrichment_only().await
    } else {
        harvester.run(&default_queries()).await
    }
    .context("Harvest failed")?;

    tracing::info!(
        seeded = report.records_seeded,
        queries = report.queries_run,
        queries_failed = report.queries_failed,
        fragments = report.fragments_found,
        pages_fetched = report.pages_fetched,
        pages_failed = report.pages_failed,
        pages_unparsed = report.pages_unparsed,
        synthetic = report.synthetic_profiles,
        duplicates = report.duplicates_dropped,
        checkpoints = report.checkpoints,
        "Run summary"
    );
    tracing::info!(
        records = report.records_written,
        breakdown = %report.status_breakdown,
        "Status breakdown"
    );

    if let Some(path) = &config.template_path {
        let records = harvester.catalog().to_records();
        splice_template(TemplateSink::new(path), &records).await?;
    }

    Ok(())
}

/// A host without the data marker is reported and left untouched.
async fn splice_template(sink: TemplateSink, records: &[ProductRecord]) -> Result<()> {
    match sink.write(records).await {
        Ok(()) => Ok(()),
        Err(e @ (StoreError::MarkerNotFound | StoreError::UnterminatedArray { .. })) => {
            tracing::warn!(path = %sink.path().display(), error = %e, "Template not updated");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to write template"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_splice_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<script>const data = [];</script>").unwrap();

        let records = vec![ProductRecord::from_slug("voss-water")];
        splice_template(TemplateSink::new(&path), &records).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"id\": \"voss-water\""));
        assert!(written.ends_with("];</script>"));
    }

    #[tokio::test]
    async fn test_host_without_marker_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<html></html>").unwrap();

        splice_template(TemplateSink::new(&path), &[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_missing_host_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = splice_template(TemplateSink::new(dir.path().join("absent.html")), &[]).await;
        assert!(result.is_err());
    }
}
