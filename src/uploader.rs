use std::sync::Arc;

use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::model::EnrichedPlace;
use crate::store::{DocumentStore, WriteBatch, MAX_BATCH_WRITES};

const ILLEGAL_KEY_CHARS: &[char] = &['#', '/', '[', ']'];

pub fn sanitize_doc_id(name: &str) -> String {
    name.trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| !ILLEGAL_KEY_CHARS.contains(c))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub written: usize,
    pub batches: usize,
}

pub struct PlaceUploader {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
}

impl PlaceUploader {
    pub fn new(store: Arc<dyn DocumentStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.clamp(1, MAX_BATCH_WRITES),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Overwrites one document per place, keyed by its sanitized name.
    ///
    /// A batch is committed every `batch_size` writes and once more for the
    /// remainder. The first failed commit stops the upload; earlier batches
    /// stay committed.
    pub fn upload(&self, places: &[EnrichedPlace], collection: &str) -> AppResult<UploadSummary> {
        let mut batch = WriteBatch::new();
        let mut summary = UploadSummary {
            written: 0,
            batches: 0,
        };

        for place in places {
            let key = sanitize_doc_id(&place.place.name);
            if key.is_empty() {
                return Err(AppError::InvalidDocumentKey(place.place.name.clone()));
            }
            batch.set(collection, &key, serde_json::to_value(place)?)?;
            if batch.len() == self.batch_size {
                self.flush(std::mem::take(&mut batch), collection, &mut summary)?;
            }
        }
        if !batch.is_empty() {
            self.flush(batch, collection, &mut summary)?;
        }

        info!(
            collection,
            written = summary.written,
            batches = summary.batches,
            "uploaded places"
        );
        Ok(summary)
    }

    fn flush(
        &self,
        batch: WriteBatch,
        collection: &str,
        summary: &mut UploadSummary,
    ) -> AppResult<()> {
        let size = batch.len();
        let number = summary.batches + 1;
        self.store
            .commit(batch)
            .map_err(|err| AppError::PersistenceBatch {
                batch: number,
                committed: summary.written,
                source: Box::new(err),
            })?;
        summary.batches = number;
        summary.written += size;
        info!(collection, batch = number, size, "committed batch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::model::{HoursSource, OpeningHours, Priority, RawPlace};

    #[derive(Default)]
    struct MemoryStore {
        commits: Mutex<Vec<WriteBatch>>,
        fail_on_commit: Option<usize>,
    }

    impl DocumentStore for MemoryStore {
        fn commit(&self, batch: WriteBatch) -> AppResult<()> {
            let mut commits = self.commits.lock();
            if self.fail_on_commit == Some(commits.len() + 1) {
                return Err(AppError::Config("store unavailable".into()));
            }
            commits.push(batch);
            Ok(())
        }
    }

    fn place(name: &str) -> EnrichedPlace {
        EnrichedPlace {
            place: RawPlace {
                google_place_id: format!("id-{name}"),
                name: name.to_string(),
                category: "beach".into(),
                lat: 15.5,
                lng: 73.8,
                address: String::new(),
                rating: 4.0,
                rating_count: 10,
                photo_refs: Vec::new(),
                contact: None,
                website: None,
                opening_hours: OpeningHours::default(),
                ticket_price: None,
            },
            duration: 2.0,
            priority: Priority::MustVisit,
            tags: vec!["beach".into()],
            popularity_score: 41.0,
            hours_source: HoursSource::Fallback,
            open_on_weekends: true,
            sensitive_margins: true,
            phone_number: None,
            photo_urls: Vec::new(),
            facilities: Vec::new(),
            safety_notes: Vec::new(),
        }
    }

    fn places(count: usize) -> Vec<EnrichedPlace> {
        (0..count).map(|i| place(&format!("Place {i}"))).collect()
    }

    #[test]
    fn sanitizes_names_into_keys() {
        assert_eq!(sanitize_doc_id("Fort Aguada #1"), "Fort_Aguada_1");
        assert_eq!(sanitize_doc_id("  Cafe [Old/New]  "), "Cafe_OldNew");
        assert_eq!(sanitize_doc_id("Basilica of Bom Jesus"), "Basilica_of_Bom_Jesus");
    }

    #[test]
    fn flushes_full_batches_without_an_empty_tail() {
        let store = Arc::new(MemoryStore::default());
        let summary = PlaceUploader::new(store.clone(), 450)
            .upload(&places(900), "goa")
            .unwrap();
        assert_eq!(summary, UploadSummary { written: 900, batches: 2 });
        let sizes: Vec<_> = store.commits.lock().iter().map(WriteBatch::len).collect();
        assert_eq!(sizes, vec![450, 450]);
    }

    #[test]
    fn flushes_final_partial_batch() {
        let store = Arc::new(MemoryStore::default());
        let summary = PlaceUploader::new(store.clone(), 450)
            .upload(&places(451), "goa")
            .unwrap();
        assert_eq!(summary, UploadSummary { written: 451, batches: 2 });
        let commits = store.commits.lock();
        assert_eq!(commits[1].len(), 1);
        assert_eq!(commits[1].writes()[0].key, "Place_450");
        assert_eq!(commits[1].writes()[0].collection, "goa");
    }

    #[test]
    fn clamps_batch_size_to_store_ceiling() {
        let store = Arc::new(MemoryStore::default());
        assert_eq!(PlaceUploader::new(store.clone(), 10_000).batch_size(), MAX_BATCH_WRITES);
        assert_eq!(PlaceUploader::new(store, 0).batch_size(), 1);
    }

    #[test]
    fn failed_commit_stops_remaining_batches() {
        let store = Arc::new(MemoryStore {
            commits: Mutex::new(Vec::new()),
            fail_on_commit: Some(2),
        });
        let err = PlaceUploader::new(store.clone(), 2)
            .upload(&places(5), "goa")
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::PersistenceBatch {
                batch: 2,
                committed: 2,
                ..
            }
        ));
        assert_eq!(store.commits.lock().len(), 1);
    }

    #[test]
    fn documents_carry_the_full_enriched_record() {
        let store = Arc::new(MemoryStore::default());
        PlaceUploader::new(store.clone(), 450)
            .upload(&[place("Fort Aguada #1")], "goa")
            .unwrap();
        let commits = store.commits.lock();
        let write = &commits[0].writes()[0];
        assert_eq!(write.key, "Fort_Aguada_1");
        assert_eq!(write.document["googlePlaceId"], "id-Fort Aguada #1");
        assert_eq!(write.document["priority"], "must-visit");
        assert_eq!(write.document["popularityScore"], 41.0);
    }

    #[test]
    fn rejects_names_without_key_characters() {
        let store = Arc::new(MemoryStore::default());
        let err = PlaceUploader::new(store, 450)
            .upload(&[place(" #/ ")], "goa")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDocumentKey(_)));
    }
}
