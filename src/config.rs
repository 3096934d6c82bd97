use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use std::{env, io};

use secrecy::SecretString;
use tracing::debug;

use crate::places::LatLng;
use crate::store::MAX_BATCH_WRITES;

const DEFAULT_PLACES_API_BASE: &str = "https://maps.googleapis.com/maps/api/place";
const DEFAULT_UPLOAD_BATCH_SIZE: usize = 450;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_maps_api_key: Option<SecretString>,
    pub places_api_base: String,
    pub region: String,
    pub location: LatLng,
    pub radius_m: u32,
    pub max_pages: usize,
    pub categories: Option<Vec<String>>,
    pub page_token_delay_ms: u64,
    pub category_delay_ms: u64,
    pub enrich_progress_every: usize,
    pub upload_collection: String,
    pub upload_batch_size: usize,
    pub data_dir: PathBuf,
    pub database_file_name: String,
    pub write_snapshots: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_maps_api_key: None,
            places_api_base: DEFAULT_PLACES_API_BASE.to_string(),
            region: "Goa, India".to_string(),
            location: LatLng {
                lat: 15.2993,
                lng: 74.1240,
            },
            radius_m: 10_000,
            max_pages: 3,
            categories: None,
            page_token_delay_ms: 2_000,
            category_delay_ms: 1_000,
            enrich_progress_every: 10,
            upload_collection: "goa".to_string(),
            upload_batch_size: DEFAULT_UPLOAD_BATCH_SIZE,
            data_dir: PathBuf::from("data"),
            database_file_name: "places.db".to_string(),
            write_snapshots: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        let defaults = Self::default();
        Self {
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
            places_api_base: env::var("PLACES_API_BASE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.places_api_base),
            region: env::var("PLACES_REGION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.region),
            location: LatLng {
                lat: parse_env("PLACES_LAT", defaults.location.lat),
                lng: parse_env("PLACES_LNG", defaults.location.lng),
            },
            radius_m: parse_env("PLACES_RADIUS_M", defaults.radius_m),
            max_pages: parse_env("PLACES_MAX_PAGES", defaults.max_pages).max(1),
            categories: env::var("PLACES_CATEGORIES").ok().and_then(|v| parse_list(&v)),
            page_token_delay_ms: parse_env("PAGE_TOKEN_DELAY_MS", defaults.page_token_delay_ms),
            category_delay_ms: parse_env("CATEGORY_DELAY_MS", defaults.category_delay_ms),
            enrich_progress_every: parse_env(
                "ENRICH_PROGRESS_EVERY",
                defaults.enrich_progress_every,
            )
            .max(1),
            upload_collection: env::var("UPLOAD_COLLECTION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upload_collection),
            upload_batch_size: parse_env("UPLOAD_BATCH_SIZE", defaults.upload_batch_size)
                .clamp(1, MAX_BATCH_WRITES),
            data_dir: env::var("DATA_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            database_file_name: env::var("DATABASE_FILE_NAME")
                .unwrap_or_else(|_| defaults.database_file_name.clone()),
            write_snapshots: parse_bool("WRITE_SNAPSHOTS", defaults.write_snapshots),
        }
    }

    pub fn page_token_delay(&self) -> Duration {
        Duration::from_millis(self.page_token_delay_ms)
    }

    pub fn category_delay(&self) -> Duration {
        Duration::from_millis(self.category_delay_ms)
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn parse_list(value: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
