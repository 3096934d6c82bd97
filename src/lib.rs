mod category;
mod config;
mod enricher;
mod errors;
mod fetcher;
mod model;
mod pacing;
mod pipeline;
mod places;
mod snapshot;
mod store;
mod uploader;

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use category::{map_category, table_key, AGENCY_KEYWORDS, CATEGORIES, FALLBACK_CATEGORY};
pub use config::AppConfig;
pub use enricher::{
    fallback_schedule, popularity_score, EnrichmentProgress, PlaceEnricher, ProgressObserver,
};
pub use errors::{AppError, AppResult};
pub use fetcher::{PlaceFetcher, SearchArea};
pub use model::{EnrichedPlace, HoursSource, OpeningHours, Priority, RawPlace};
pub use pacing::{Pacer, Pause, PolitenessPolicy, SleepPacer};
pub use pipeline::{Pipeline, PipelineSummary};
pub use places::{
    ApiStatus, HttpPlacesClient, LatLng, PhotoLinks, PlaceDetails, PlacesApi, SearchPage,
    SearchRequest, SearchResult, MAX_PHOTOS,
};
pub use snapshot::{read_places, write_places};
pub use store::{DocumentStore, SetWrite, SqliteDocumentStore, WriteBatch, MAX_BATCH_WRITES};
pub use uploader::{sanitize_doc_id, PlaceUploader, UploadSummary};

pub fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,places_ingest=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
