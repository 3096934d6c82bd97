use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::model::OpeningHours;

const DETAILS_FIELDS: &str = "formatted_phone_number,website,opening_hours,price_level,photos";
const PHOTO_MAX_WIDTH: u32 = 400;
pub const MAX_PHOTOS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    Query {
        query: String,
        location: LatLng,
        radius_m: u32,
    },
    PageToken(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ApiStatus {
    Ok,
    ZeroResults,
    NotFound,
    #[default]
    Missing,
    Other(String),
}


impl ApiStatus {
    /// `OK` and `ZERO_RESULTS` both mean the page can be consumed.
    pub fn is_usable(&self) -> bool {
        matches!(self, ApiStatus::Ok | ApiStatus::ZeroResults)
    }
}

impl From<String> for ApiStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OK" => ApiStatus::Ok,
            "ZERO_RESULTS" => ApiStatus::ZeroResults,
            "NOT_FOUND" => ApiStatus::NotFound,
            _ => ApiStatus::Other(value),
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Ok => f.write_str("OK"),
            ApiStatus::ZeroResults => f.write_str("ZERO_RESULTS"),
            ApiStatus::NotFound => f.write_str("NOT_FOUND"),
            ApiStatus::Missing => f.write_str("<missing>"),
            ApiStatus::Other(status) => f.write_str(status),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub status: ApiStatus,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhotoRef {
    pub photo_reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

#[derive(Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    status: ApiStatus,
    #[serde(default)]
    result: Option<PlaceDetails>,
}

#[async_trait]
pub trait PlacesApi: Send + Sync {
    async fn text_search(&self, request: &SearchRequest) -> AppResult<SearchPage>;

    async fn place_details(&self, place_id: &str) -> AppResult<PlaceDetails>;
}

pub struct HttpPlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpPlacesClient {
    pub fn new(base_url: &str, api_key: SecretString) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("places-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl PlacesApi for HttpPlacesClient {
    async fn text_search(&self, request: &SearchRequest) -> AppResult<SearchPage> {
        let key = self.api_key.expose_secret();
        let params: Vec<(&str, String)> = match request {
            SearchRequest::Query {
                query,
                location,
                radius_m,
            } => vec![
                ("query", query.clone()),
                ("key", key.to_string()),
                ("location", format!("{},{}", location.lat, location.lng)),
                ("radius", radius_m.to_string()),
            ],
            SearchRequest::PageToken(token) => {
                vec![("key", key.to_string()), ("pagetoken", token.clone())]
            }
        };

        let response = self
            .http
            .get(self.endpoint("textsearch/json"))
            .query(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn place_details(&self, place_id: &str) -> AppResult<PlaceDetails> {
        let response = self
            .http
            .get(self.endpoint("details/json"))
            .query(&[
                ("place_id", place_id),
                ("fields", DETAILS_FIELDS),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: DetailsResponse = response.json().await?;
        match details_failure(place_id, &parsed.status) {
            Some(err) => warn!(error = %err, "details unavailable; continuing without them"),
            None if parsed.result.is_none() => {
                debug!(place_id, status = %parsed.status, "details lookup returned no result");
            }
            None => {}
        }
        Ok(parsed.result.unwrap_or_default())
    }
}

// Quota and key failures are reported; a place that no longer exists is not.
fn details_failure(place_id: &str, status: &ApiStatus) -> Option<AppError> {
    match status {
        ApiStatus::Ok | ApiStatus::ZeroResults | ApiStatus::NotFound => None,
        ApiStatus::Missing | ApiStatus::Other(_) => Some(AppError::ExternalApi {
            operation: format!("place details {place_id}"),
            status: status.to_string(),
        }),
    }
}

#[derive(Clone)]
pub struct PhotoLinks {
    base_url: String,
    api_key: SecretString,
}

impl PhotoLinks {
    pub fn new(base_url: &str, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn urls(&self, references: &[String]) -> Vec<String> {
        references
            .iter()
            .take(MAX_PHOTOS)
            .map(|reference| {
                format!(
                    "{}/photo?maxwidth={PHOTO_MAX_WIDTH}&photoreference={reference}&key={}",
                    self.base_url,
                    self.api_key.expose_secret()
                )
            })
            .collect()
    }
}
