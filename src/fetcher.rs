use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::category::{map_category, CATEGORIES};
use crate::errors::{AppError, AppResult};
use crate::model::RawPlace;
use crate::pacing::{Pacer, Pause};
use crate::places::{LatLng, PlaceDetails, PlacesApi, SearchRequest, SearchResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchArea {
    pub region: String,
    pub location: LatLng,
    pub radius_m: u32,
}

impl SearchArea {
    pub fn query_for(&self, category: &str) -> String {
        format!("{category} in {}", self.region)
    }
}

pub struct PlaceFetcher {
    api: Arc<dyn PlacesApi>,
    pacer: Arc<dyn Pacer>,
    catalog: Vec<String>,
}

impl PlaceFetcher {
    pub fn new(api: Arc<dyn PlacesApi>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            api,
            pacer,
            catalog: CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<String>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Fetches up to `max_pages` pages of `"{category} in {region}"`.
    ///
    /// Results repeating an identifier already seen in this call are skipped.
    /// A page whose status is neither `OK` nor `ZERO_RESULTS` ends the
    /// pagination and the places collected so far are returned.
    pub async fn fetch(
        &self,
        category: &str,
        area: &SearchArea,
        max_pages: usize,
    ) -> AppResult<Vec<RawPlace>> {
        let query = area.query_for(category);
        let mut request = SearchRequest::Query {
            query: query.clone(),
            location: area.location,
            radius_m: area.radius_m,
        };
        let mut seen = HashSet::new();
        let mut places = Vec::new();

        for page_number in 1..=max_pages {
            let page = self.api.text_search(&request).await?;
            if !page.status.is_usable() {
                let err = AppError::ExternalApi {
                    operation: format!("text search {query:?} page {page_number}"),
                    status: page.status.to_string(),
                };
                warn!(
                    error = %err,
                    detail = page.error_message.as_deref().unwrap_or_default(),
                    "stopping category fetch"
                );
                break;
            }

            for result in page.results {
                let place_id = result
                    .place_id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| AppError::MissingIdentifier {
                        name: result.name.clone(),
                    })?;
                if !seen.insert(place_id.clone()) {
                    debug!(place_id = place_id.as_str(), "skipping repeated search result");
                    continue;
                }

                let details = self.api.place_details(&place_id).await?;
                let category = map_category(&result.types, &query);
                places.push(raw_place(place_id, category, result, details));
            }

            let Some(token) = page.next_page_token.filter(|t| !t.is_empty()) else {
                break;
            };
            if page_number == max_pages {
                break;
            }
            self.pacer.pause(Pause::PageToken).await;
            request = SearchRequest::PageToken(token);
        }

        Ok(places)
    }

    /// Fetches every category in the catalog. Results are concatenated in
    /// catalog order without removing cross-category duplicates.
    pub async fn fetch_all(&self, area: &SearchArea, max_pages: usize) -> AppResult<Vec<RawPlace>> {
        let mut all_places = Vec::new();
        for (index, category) in self.catalog.iter().enumerate() {
            if index > 0 {
                self.pacer.pause(Pause::Category).await;
            }
            let places = self.fetch(category, area, max_pages).await?;
            info!(
                category = category.as_str(),
                region = area.region.as_str(),
                fetched = places.len(),
                "fetched category"
            );
            all_places.extend(places);
        }
        info!(
            region = area.region.as_str(),
            total = all_places.len(),
            "fetch complete"
        );
        Ok(all_places)
    }
}

fn raw_place(
    place_id: String,
    category: String,
    result: SearchResult,
    details: PlaceDetails,
) -> RawPlace {
    let location = result.geometry.map(|g| g.location).unwrap_or_default();
    let photo_source = if result.photos.is_empty() {
        details.photos
    } else {
        result.photos
    };

    RawPlace {
        google_place_id: place_id,
        name: result.name,
        category,
        lat: location.lat,
        lng: location.lng,
        address: result.formatted_address,
        rating: result.rating.unwrap_or(0.0),
        rating_count: result.user_ratings_total.unwrap_or(0),
        photo_refs: photo_source
            .into_iter()
            .map(|photo| photo.photo_reference)
            .collect(),
        contact: details.formatted_phone_number,
        website: details.website,
        opening_hours: details.opening_hours.unwrap_or_default(),
        ticket_price: details.price_level,
    }
}
