//! # Place Repository
//!
//! Owns the `Place` lifecycle: create, fetch, list and the three shared-state
//! mutations (vote, add-feature, add-comment).
//!
//! Many independent clients mutate the same place document. How their writes
//! combine is chosen by [`WriteStrategy`]:
//! - `Atomic` sends targeted union/remove/append operations, so writers that
//!   touch different users never collide and no read is needed.
//! - `Optimistic` reads, computes the new field values, and writes them back
//!   conditioned on the version it read, retrying on conflict.
//! - `LastWriterWins` is the same read-modify-write without the version check.
//!   A slower writer can overwrite a concurrent writer's entry.

use std::sync::Arc;

use log::{debug, info, warn};
use ma_core::document::{FieldUpdate, UpdateRequest};
use ma_core::error::{AppError, Result, StoreError};
use ma_core::models::{ImageFolder, NewPlace, Place, PlaceListing, SkippedDocument, UserId, UserLedger, VoteKind};
use ma_core::traits::{DocumentStore, ImageUploader};

use crate::codec::{self, NewPlaceFields};
use crate::images::upload_many;
use crate::ledger::{self, LedgerField};
use crate::validation::{require_caller, required};
use crate::vote;

/// Default collection holding place documents.
pub const PLACES: &str = "places";

/// How mutations of shared place collections reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    #[default]
    Atomic,
    Optimistic { max_attempts: u32 },
    LastWriterWins,
}

#[derive(Clone)]
pub struct PlaceRepository {
    store: Arc<dyn DocumentStore>,
    uploader: Arc<dyn ImageUploader>,
    collection: String,
    strategy: WriteStrategy,
}

impl PlaceRepository {
    pub fn new(store: Arc<dyn DocumentStore>, uploader: Arc<dyn ImageUploader>) -> Self {
        Self {
            store,
            uploader,
            collection: PLACES.to_string(),
            strategy: WriteStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn strategy(&self) -> WriteStrategy {
        self.strategy
    }

    /// Uploads any images, then inserts the place in one atomic create.
    /// Returns the store-assigned id.
    pub async fn create(&self, caller: Option<&UserId>, new_place: NewPlace) -> Result<String> {
        let creator = require_caller(caller)?;
        let place_name = required("placeName", &new_place.place_name)?;
        let description = required("description", &new_place.description)?;
        let location = required("location", &new_place.location)?;
        let city = required("city", &new_place.city)?;
        let features = clean_ledger(new_place.features);

        let images = if new_place.images.is_empty() {
            Vec::new()
        } else {
            upload_many(self.uploader.as_ref(), ImageFolder::Place, new_place.images).await
        };

        let fields = NewPlaceFields {
            place_name: &place_name,
            description: &description,
            location: &location,
            city: &city,
            features: &features,
            images: &images,
            creator,
        }
        .into_updates();

        let id = self.store.create(&self.collection, fields).await?;
        info!("Created place {id} ('{place_name}') for {creator}");
        Ok(id)
    }

    /// Fails with `NotFound` when the document is absent or malformed.
    pub async fn fetch(&self, id: &str) -> Result<Place> {
        let doc = self
            .store
            .get(&self.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        codec::decode_place(doc).map_err(|err| {
            warn!("Place {id} is malformed: {err}");
            self.not_found(id)
        })
    }

    /// Every decodable place, newest first. Undecodable documents are
    /// reported in `skipped` instead of failing the listing.
    pub async fn fetch_all(&self) -> Result<PlaceListing> {
        let docs = self.store.list(&self.collection).await?;
        let mut listing = PlaceListing::default();
        for doc in docs {
            let id = doc.id.clone();
            match codec::decode_place(doc) {
                Ok(place) => listing.places.push(place),
                Err(err) => {
                    warn!("Skipping malformed place {id}: {err}");
                    listing.skipped.push(SkippedDocument { id, reason: err.to_string() });
                }
            }
        }
        listing
            .places
            .sort_by(|a, b| b.date_added.cmp(&a.date_added).then_with(|| a.id.cmp(&b.id)));
        Ok(listing)
    }

    /// Places whose city matches `city`, ignoring case and surrounding whitespace.
    pub async fn list_by_city(&self, city: &str) -> Result<PlaceListing> {
        let wanted = city.trim().to_lowercase();
        let mut listing = self.fetch_all().await?;
        listing.places.retain(|place| place.city.trim().to_lowercase() == wanted);
        Ok(listing)
    }

    /// Records `caller`'s vote. Afterwards the caller is in exactly the set
    /// matching `kind` and absent from the other.
    pub async fn vote(&self, place_id: &str, caller: Option<&UserId>, kind: VoteKind) -> Result<()> {
        let voter = require_caller(caller)?;
        match self.strategy {
            WriteStrategy::Atomic => {
                let request = UpdateRequest::new(vote::atomic_updates(voter, kind));
                self.store.update_fields(&self.collection, place_id, request).await?;
            }
            _ => {
                self.read_modify_write(place_id, |place| vote::overwrite_updates(place, voter, kind))
                    .await?;
            }
        }
        info!("Recorded {kind:?} by {voter} on place {place_id}");
        Ok(())
    }

    pub async fn add_feature(&self, place_id: &str, caller: Option<&UserId>, text: &str) -> Result<()> {
        self.append_entry(LedgerField::Features, place_id, caller, text).await
    }

    pub async fn add_comment(&self, place_id: &str, caller: Option<&UserId>, text: &str) -> Result<()> {
        self.append_entry(LedgerField::Comments, place_id, caller, text).await
    }

    async fn append_entry(&self, field: LedgerField, place_id: &str, caller: Option<&UserId>, text: &str) -> Result<()> {
        let user = require_caller(caller)?;
        let text = required(field.label(), text)?;
        match self.strategy {
            WriteStrategy::Atomic => {
                let request = UpdateRequest::new(ledger::atomic_updates(field, user, &text));
                self.store.update_fields(&self.collection, place_id, request).await?;
            }
            _ => {
                self.read_modify_write(place_id, |place| ledger::overwrite_updates(field, place, user, &text))
                    .await?;
            }
        }
        info!("Appended {} by {user} on place {place_id}", field.label());
        Ok(())
    }

    /// Read, compute, write. Under `Optimistic` the write is conditioned on
    /// the version read and retried on conflict; otherwise it is sent once,
    /// unconditioned.
    async fn read_modify_write<F>(&self, place_id: &str, plan: F) -> Result<()>
    where
        F: Fn(&Place) -> Vec<FieldUpdate>,
    {
        let (attempts, checked) = match self.strategy {
            WriteStrategy::Optimistic { max_attempts } => (max_attempts.max(1), true),
            _ => (1, false),
        };

        for attempt in 1..=attempts {
            let doc = self
                .store
                .get(&self.collection, place_id)
                .await?
                .ok_or_else(|| self.not_found(place_id))?;
            let version = doc.version;
            let place = codec::decode_place(doc).map_err(|err| {
                warn!("Place {place_id} is malformed: {err}");
                self.not_found(place_id)
            })?;

            let mut request = UpdateRequest::new(plan(&place));
            if checked {
                request = request.if_version(version);
            }

            match self.store.update_fields(&self.collection, place_id, request).await {
                Ok(_) => return Ok(()),
                Err(StoreError::VersionMismatch { actual, .. }) => {
                    debug!("Place {place_id} moved from v{version} to v{actual}, retry {attempt}/{attempts}");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::Conflict(format!(
            "place {place_id} kept changing; gave up after {attempts} attempts"
        )))
    }

    fn not_found(&self, id: &str) -> AppError {
        AppError::NotFound(self.collection.clone(), id.to_string())
    }
}

/// Trims entries and drops blank ones; users left with nothing are removed.
fn clean_ledger(ledger: UserLedger) -> UserLedger {
    ledger
        .into_iter()
        .filter_map(|(user, entries)| {
            let entries: Vec<String> = entries
                .iter()
                .map(|entry| entry.trim())
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect();
            (!entries.is_empty()).then_some((user, entries))
        })
        .collect()
}
