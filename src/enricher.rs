use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::category::{table_key, FALLBACK_CATEGORY};
use crate::errors::AppResult;
use crate::model::{EnrichedPlace, HoursSource, OpeningHours, Priority, RawPlace};
use crate::places::{PhotoLinks, PlacesApi};

const DEFAULT_DURATION_HOURS: f64 = 1.0;

const DURATION_HOURS: &[(&str, f64)] = &[
    ("beach", 2.0),
    ("fort", 1.5),
    ("temple", 1.0),
    ("church", 1.0),
    ("museum", 2.0),
    ("cafe", 0.75),
    ("water_sports", 2.0),
    ("adventure_sports", 3.0),
];

const MUST_VISIT: &[&str] = &["beach", "fort", "temple", "museum", "water_sports"];
const INDOOR_CULTURAL: &[&str] = &["temple", "church", "museum"];
const OUTDOOR_RISK: &[&str] = &["beach", "water_sports", "adventure_sports"];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const FALLBACK_HOURS: &str = "06:00 – 18:00";

pub type ProgressObserver = Arc<dyn Fn(EnrichmentProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentProgress {
    pub processed: usize,
    pub total: usize,
    pub enriched: usize,
}

pub struct PlaceEnricher {
    details: Arc<dyn PlacesApi>,
    photos: PhotoLinks,
    progress_every: usize,
    observer: Option<ProgressObserver>,
}

impl PlaceEnricher {
    pub fn new(details: Arc<dyn PlacesApi>, photos: PhotoLinks) -> Self {
        Self {
            details,
            photos,
            progress_every: 10,
            observer: None,
        }
    }

    pub fn with_progress(mut self, every: usize, observer: Option<ProgressObserver>) -> Self {
        self.progress_every = every.max(1);
        self.observer = observer;
        self
    }

    /// Enriches each distinct place once, keeping the first occurrence of
    /// every provider identifier in input order.
    pub async fn enrich(&self, raw_places: &[RawPlace]) -> AppResult<Vec<EnrichedPlace>> {
        let total = raw_places.len();
        let mut seen = HashSet::new();
        let mut enriched = Vec::new();

        for (index, place) in raw_places.iter().enumerate() {
            let place_id = place.identifier()?;
            if seen.insert(place_id.to_string()) {
                enriched.push(self.enrich_one(place).await?);
            } else {
                debug!(place_id, "skipping duplicate place");
            }

            let processed = index + 1;
            if processed % self.progress_every == 0 {
                info!(processed, total, "enriched places");
                if let Some(observer) = &self.observer {
                    observer(EnrichmentProgress {
                        processed,
                        total,
                        enriched: enriched.len(),
                    });
                }
            }
        }

        Ok(enriched)
    }

    pub async fn enrich_one(&self, place: &RawPlace) -> AppResult<EnrichedPlace> {
        let place_id = place.identifier()?;
        let details = self.details.place_details(place_id).await?;

        let key = table_key(&place.category);
        let (opening_hours, hours_source) = match details.opening_hours {
            Some(hours) if !hours.weekday_text.is_empty() => (hours, HoursSource::Provider),
            _ => {
                debug!(place_id, "no weekly hours from provider; using fallback schedule");
                (fallback_schedule(), HoursSource::Fallback)
            }
        };
        let open_on_weekends = opening_hours.mentions_weekend();
        let phone_number = details
            .formatted_phone_number
            .or_else(|| place.contact.clone());

        let mut merged = place.clone();
        merged.opening_hours = opening_hours;
        merged.website = details.website.or_else(|| place.website.clone());
        merged.ticket_price = details.price_level.or(place.ticket_price);

        Ok(EnrichedPlace {
            duration: duration_hours(&key),
            priority: priority(&key),
            tags: tags(&place.category),
            popularity_score: popularity_score(place.rating, place.rating_count),
            hours_source,
            open_on_weekends,
            sensitive_margins: true,
            phone_number,
            photo_urls: self.photos.urls(&place.photo_refs),
            facilities: facilities(&key),
            safety_notes: safety_notes(&key),
            place: merged,
        })
    }
}

fn duration_hours(key: &str) -> f64 {
    DURATION_HOURS
        .iter()
        .find(|(category, _)| *category == key)
        .map(|(_, hours)| *hours)
        .unwrap_or(DEFAULT_DURATION_HOURS)
}

fn priority(key: &str) -> Priority {
    if MUST_VISIT.contains(&key) {
        Priority::MustVisit
    } else {
        Priority::Optional
    }
}

fn tags(category: &str) -> Vec<String> {
    let category = category.trim();
    if category.is_empty() {
        vec![FALLBACK_CATEGORY.to_string()]
    } else {
        vec![category.to_string()]
    }
}

pub fn popularity_score(rating: f64, rating_count: u32) -> f64 {
    rating * 10.0 + f64::from(rating_count) / 10.0
}

pub fn fallback_schedule() -> OpeningHours {
    OpeningHours {
        weekday_text: WEEKDAYS
            .iter()
            .map(|day| format!("{day}: {FALLBACK_HOURS}"))
            .collect(),
        open_now: Some(true),
    }
}

fn facilities(key: &str) -> Vec<String> {
    let items: &[&str] = if INDOOR_CULTURAL.contains(&key) {
        &["toilets", "parking"]
    } else {
        &["equipment provided", "instructor available"]
    };
    items.iter().map(|s| (*s).to_string()).collect()
}

fn safety_notes(key: &str) -> Vec<String> {
    if OUTDOOR_RISK.contains(&key) {
        vec!["Avoid late night visit".to_string(), "Carry water".to_string()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use secrecy::SecretString;

    use super::*;
    use crate::errors::AppError;
    use crate::places::{PlaceDetails, SearchPage, SearchRequest};

    struct StaticDetails {
        details: PlaceDetails,
        calls: Mutex<Vec<String>>,
    }

    impl StaticDetails {
        fn new(details: PlaceDetails) -> Arc<Self> {
            Arc::new(Self {
                details,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PlacesApi for StaticDetails {
        async fn text_search(&self, _request: &SearchRequest) -> AppResult<SearchPage> {
            Err(AppError::Config("search is not scripted".into()))
        }

        async fn place_details(&self, place_id: &str) -> AppResult<PlaceDetails> {
            self.calls.lock().push(place_id.to_string());
            Ok(self.details.clone())
        }
    }

    fn raw(id: &str, name: &str, category: &str) -> RawPlace {
        RawPlace {
            google_place_id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            lat: 15.5,
            lng: 73.8,
            address: "Goa".into(),
            rating: 0.0,
            rating_count: 0,
            photo_refs: Vec::new(),
            contact: Some("+91 1234".into()),
            website: Some("https://fetched.example".into()),
            opening_hours: OpeningHours::default(),
            ticket_price: None,
        }
    }

    fn enricher(api: Arc<StaticDetails>) -> PlaceEnricher {
        PlaceEnricher::new(
            api,
            PhotoLinks::new(
                "https://maps.example.com/place",
                SecretString::from("key".to_string()),
            ),
        )
    }

    #[tokio::test]
    async fn keeps_first_occurrence_of_each_identifier() {
        let api = StaticDetails::new(PlaceDetails::default());
        let input = vec![
            raw("a", "First A", "beach"),
            raw("b", "Only B", "fort"),
            raw("a", "Second A", "temple"),
        ];
        let output = enricher(api.clone()).enrich(&input).await.unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].place.name, "First A");
        assert_eq!(output[1].place.name, "Only B");
        assert_eq!(*api.calls.lock(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn applies_category_defaults() {
        let api = StaticDetails::new(PlaceDetails::default());
        let enricher = enricher(api);
        let beach = enricher.enrich_one(&raw("a", "Baga", "beach")).await.unwrap();
        let unknown = enricher
            .enrich_one(&raw("b", "Mystery", "unknown_x"))
            .await
            .unwrap();
        assert_eq!(beach.duration, 2.0);
        assert_eq!(unknown.duration, 1.0);
        assert_eq!(unknown.priority, Priority::Optional);
        assert_eq!(unknown.tags, vec!["unknown_x".to_string()]);
    }

    #[test]
    fn priority_partition() {
        for key in ["beach", "fort", "temple", "museum", "water_sports"] {
            assert_eq!(priority(key), Priority::MustVisit, "{key}");
        }
        for key in ["church", "cafe", "adventure_sports", "other", "spa"] {
            assert_eq!(priority(key), Priority::Optional, "{key}");
        }
    }

    #[tokio::test]
    async fn catalog_labels_hit_underscored_tables() {
        let api = StaticDetails::new(PlaceDetails::default());
        let place = enricher(api)
            .enrich_one(&raw("a", "Jet Ski Co", "water sports"))
            .await
            .unwrap();
        assert_eq!(place.priority, Priority::MustVisit);
        assert_eq!(place.duration, 2.0);
        assert_eq!(place.safety_notes.len(), 2);
        assert_eq!(place.tags, vec!["water sports".to_string()]);
    }

    #[test]
    fn popularity_formula_is_unclamped() {
        assert_eq!(popularity_score(4.5, 120), 57.0);
        assert_eq!(popularity_score(0.0, 0), 0.0);
        assert_eq!(popularity_score(5.0, 100_000), 10_050.0);
    }

    #[tokio::test]
    async fn missing_hours_use_fallback_schedule() {
        let api = StaticDetails::new(PlaceDetails::default());
        let place = enricher(api).enrich_one(&raw("a", "Baga", "beach")).await.unwrap();
        let hours = &place.place.opening_hours;
        assert_eq!(hours.weekday_text.len(), 7);
        assert_eq!(hours.weekday_text[0], "Monday: 06:00 – 18:00");
        assert_eq!(hours.weekday_text[6], "Sunday: 06:00 – 18:00");
        assert_eq!(hours.open_now, Some(true));
        assert_eq!(place.hours_source, HoursSource::Fallback);
        assert!(place.open_on_weekends);
    }

    #[tokio::test]
    async fn provider_hours_drive_weekend_flag() {
        let api = StaticDetails::new(PlaceDetails {
            opening_hours: Some(OpeningHours {
                weekday_text: vec![
                    "Monday: Closed".into(),
                    "Saturday: 10:00 – 14:00".into(),
                ],
                open_now: Some(false),
            }),
            website: Some("https://live.example".into()),
            price_level: Some(2),
            ..PlaceDetails::default()
        });
        let place = enricher(api).enrich_one(&raw("a", "Museum", "museum")).await.unwrap();
        assert_eq!(place.hours_source, HoursSource::Provider);
        assert!(place.open_on_weekends);
        assert_eq!(place.place.opening_hours.open_now, Some(false));
        assert_eq!(place.place.website.as_deref(), Some("https://live.example"));
        assert_eq!(place.place.ticket_price, Some(2));
        assert_eq!(place.phone_number.as_deref(), Some("+91 1234"));
    }

    #[tokio::test]
    async fn facilities_and_safety_split() {
        let api = StaticDetails::new(PlaceDetails::default());
        let enricher = enricher(api);
        let church = enricher.enrich_one(&raw("a", "Bom Jesus", "church")).await.unwrap();
        let cafe = enricher.enrich_one(&raw("b", "Cafe", "cafe")).await.unwrap();
        assert_eq!(church.facilities, vec!["toilets", "parking"]);
        assert!(church.safety_notes.is_empty());
        assert_eq!(cafe.facilities, vec!["equipment provided", "instructor available"]);
        assert!(cafe.safety_notes.is_empty());
    }

    #[tokio::test]
    async fn preserves_fetched_fields_and_caps_photos() {
        let api = StaticDetails::new(PlaceDetails::default());
        let mut input = raw("a", "Fort Aguada", "fort");
        input.rating = 4.5;
        input.rating_count = 120;
        input.photo_refs = (1..=4).map(|i| format!("r{i}")).collect();
        let place = enricher(api).enrich_one(&input).await.unwrap();

        assert_eq!(place.popularity_score, 57.0);
        assert_eq!(place.photo_urls.len(), 3);
        assert_eq!(place.place.photo_refs.len(), 4);
        assert_eq!(place.place.address, "Goa");
        assert_eq!(place.place.website.as_deref(), Some("https://fetched.example"));
        assert!(place.sensitive_margins);
    }

    #[tokio::test]
    async fn reports_progress_without_changing_output() {
        let api = StaticDetails::new(PlaceDetails::default());
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = ticks.clone();
        let observer: ProgressObserver = Arc::new(move |progress: EnrichmentProgress| sink.lock().push(progress));
        let input: Vec<RawPlace> = (0..5)
            .map(|i| raw(&format!("id-{}", i % 4), "Place", "beach"))
            .collect();

        let output = enricher(api)
            .with_progress(2, Some(observer))
            .enrich(&input)
            .await
            .unwrap();

        assert_eq!(output.len(), 4);
        assert_eq!(
            *ticks.lock(),
            vec![
                EnrichmentProgress {
                    processed: 2,
                    total: 5,
                    enriched: 2
                },
                EnrichmentProgress {
                    processed: 4,
                    total: 5,
                    enriched: 4
                },
            ]
        );
    }

    #[tokio::test]
    async fn blank_identifier_is_fatal() {
        let api = StaticDetails::new(PlaceDetails::default());
        let err = enricher(api)
            .enrich(&[raw("", "Ghost", "beach")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingIdentifier { .. }));
    }
}
