use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::enricher::{PlaceEnricher, ProgressObserver};
use crate::errors::{AppError, AppResult};
use crate::fetcher::{PlaceFetcher, SearchArea};
use crate::model::{EnrichedPlace, RawPlace};
use crate::pacing::{Pacer, PolitenessPolicy, SleepPacer};
use crate::places::{HttpPlacesClient, PhotoLinks, PlacesApi};
use crate::snapshot::{read_places, write_places};
use crate::store::{DocumentStore, SqliteDocumentStore};
use crate::uploader::PlaceUploader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub fetched: usize,
    pub enriched: usize,
    pub uploaded: usize,
    pub batches: usize,
}

pub struct Pipeline {
    fetcher: PlaceFetcher,
    enricher: PlaceEnricher,
    uploader: PlaceUploader,
    area: SearchArea,
    max_pages: usize,
    collection: String,
    snapshot_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(
        config: &AppConfig,
        api: Arc<dyn PlacesApi>,
        pacer: Arc<dyn Pacer>,
        store: Arc<dyn DocumentStore>,
        photos: PhotoLinks,
        observer: Option<ProgressObserver>,
    ) -> Self {
        let mut fetcher = PlaceFetcher::new(Arc::clone(&api), pacer);
        if let Some(categories) = &config.categories {
            fetcher = fetcher.with_catalog(categories.clone());
        }
        let enricher = PlaceEnricher::new(api, photos)
            .with_progress(config.enrich_progress_every, observer);

        Self {
            fetcher,
            enricher,
            uploader: PlaceUploader::new(store, config.upload_batch_size),
            area: SearchArea {
                region: config.region.clone(),
                location: config.location,
                radius_m: config.radius_m,
            },
            max_pages: config.max_pages,
            collection: config.upload_collection.clone(),
            snapshot_dir: config.write_snapshots.then(|| config.data_dir.clone()),
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api_key = config
            .google_maps_api_key
            .clone()
            .ok_or_else(|| AppError::Config("GOOGLE_MAPS_API_KEY is not set".into()))?;
        let photos = PhotoLinks::new(&config.places_api_base, api_key.clone());
        let api = HttpPlacesClient::new(&config.places_api_base, api_key)?;
        let pacer = SleepPacer::new(PolitenessPolicy::from_config(config));
        let store = SqliteDocumentStore::open(&config.data_dir, &config.database_file_name)?;
        Ok(Self::new(
            config,
            Arc::new(api),
            Arc::new(pacer),
            Arc::new(store),
            photos,
            None,
        ))
    }

    pub async fn run(&self) -> AppResult<PipelineSummary> {
        info!(region = self.area.region.as_str(), "fetching places");
        let raw_places = self.fetcher.fetch_all(&self.area, self.max_pages).await?;
        self.snapshot("raw", &raw_places)?;
        self.enrich_and_upload(&raw_places).await
    }

    pub async fn run_from_raw(&self, path: &Path) -> AppResult<PipelineSummary> {
        let raw_places: Vec<RawPlace> = read_places(path)?;
        info!(path = %path.display(), count = raw_places.len(), "loaded raw places");
        self.enrich_and_upload(&raw_places).await
    }

    async fn enrich_and_upload(&self, raw_places: &[RawPlace]) -> AppResult<PipelineSummary> {
        let enriched: Vec<EnrichedPlace> = self.enricher.enrich(raw_places).await?;
        info!(enriched = enriched.len(), "enrichment complete");
        self.snapshot("enriched", &enriched)?;

        let upload = self.uploader.upload(&enriched, &self.collection)?;
        let summary = PipelineSummary {
            fetched: raw_places.len(),
            enriched: enriched.len(),
            uploaded: upload.written,
            batches: upload.batches,
        };
        info!(?summary, collection = self.collection.as_str(), "pipeline finished");
        Ok(summary)
    }

    pub fn snapshot_path(&self, stage: &str) -> Option<PathBuf> {
        self.snapshot_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}_places_{stage}.json", self.collection)))
    }

    fn snapshot<T: Serialize>(&self, stage: &str, places: &[T]) -> AppResult<()> {
        match self.snapshot_path(stage) {
            Some(path) => write_places(&path, places),
            None => Ok(()),
        }
    }
}
