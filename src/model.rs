use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
    #[serde(default)]
    pub open_now: Option<bool>,
}

impl OpeningHours {
    pub fn mentions_weekend(&self) -> bool {
        self.weekday_text
            .iter()
            .any(|line| line.contains("Saturday") || line.contains("Sunday"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlace {
    #[serde(rename = "googlePlaceId")]
    pub google_place_id: String,
    pub name: String,
    pub category: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(rename = "ratingCount", default)]
    pub rating_count: u32,
    #[serde(default)]
    pub photo_refs: Vec<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub opening_hours: OpeningHours,
    #[serde(default)]
    pub ticket_price: Option<u8>,
}

impl RawPlace {
    pub fn identifier(&self) -> AppResult<&str> {
        if self.google_place_id.trim().is_empty() {
            return Err(AppError::MissingIdentifier {
                name: self.name.clone(),
            });
        }
        Ok(&self.google_place_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "must-visit")]
    MustVisit,
    #[serde(rename = "optional")]
    Optional,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::MustVisit => "must-visit",
            Priority::Optional => "optional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursSource {
    Provider,
    Fallback,
}

/// A fetched place plus planning metadata.
///
/// `place` keeps every fetched field; enrichment only replaces `opening_hours`,
/// `website` and `ticket_price` with the live details it looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPlace {
    #[serde(flatten)]
    pub place: RawPlace,
    pub duration: f64,
    pub priority: Priority,
    pub tags: Vec<String>,
    #[serde(rename = "popularityScore")]
    pub popularity_score: f64,
    pub hours_source: HoursSource,
    pub open_on_weekends: bool,
    pub sensitive_margins: bool,
    pub phone_number: Option<String>,
    pub photo_urls: Vec<String>,
    pub facilities: Vec<String>,
    pub safety_notes: Vec<String>,
}
