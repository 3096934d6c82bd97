use anyhow::Result;
use places_ingest::{init_tracing, AppConfig, Pipeline};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let config = AppConfig::from_env();
    let pipeline = Pipeline::from_config(&config)?;
    let summary = pipeline.run().await?;
    info!(
        fetched = summary.fetched,
        enriched = summary.enriched,
        uploaded = summary.uploaded,
        collection = config.upload_collection.as_str(),
        "places ingestion complete"
    );
    Ok(())
}
