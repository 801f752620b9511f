use std::sync::Arc;

use integration_tests::{backends, spence_hall, user, RecordingUploader};
use ma_core::document::FieldUpdate;
use ma_core::error::AppError;
use ma_core::models::{RawImage, VoteKind};
use ma_core::traits::DocumentStore;
use ma_repo::{PlaceRepository, PLACES};
use ma_store_memory::MemoryStore;
use ma_store_sqlite::SqliteDocumentStore;
use serde_json::json;

#[tokio::test]
async fn spence_hall_walkthrough() {
    for (backend, store) in backends().await {
        let places = PlaceRepository::new(store.clone(), Arc::new(RecordingUploader));
        let (u1, u2, u3) = (user("u1"), user("u2"), user("u3"));

        let mut submission = spence_hall();
        submission.features.insert(u1.clone(), vec!["Ramp at north entrance".into()]);
        submission.images = vec![RawImage::new(vec![1u8, 2, 3]), RawImage::new(Vec::<u8>::new())];
        let id = places.create(Some(&u1), submission).await.unwrap();

        let place = places.fetch(&id).await.unwrap();
        assert_eq!(place.user_id, u1, "{backend}");
        assert_eq!(place.images, vec!["/static/uploads/place_images/3.jpg"], "{backend}");
        assert!(place.likes.is_empty() && place.dislikes.is_empty(), "{backend}");
        assert!(place.comments.is_empty(), "{backend}");
        assert!(place.date_added.is_some(), "{backend}");

        // u2 likes, changes their mind, then likes again twice.
        places.vote(&id, Some(&u2), VoteKind::Like).await.unwrap();
        places.vote(&id, Some(&u2), VoteKind::Dislike).await.unwrap();
        let place = places.fetch(&id).await.unwrap();
        assert!(place.likes.is_empty(), "{backend}");
        assert_eq!(place.dislikes, vec![u2.clone()], "{backend}");

        places.vote(&id, Some(&u2), VoteKind::Like).await.unwrap();
        places.vote(&id, Some(&u2), VoteKind::Like).await.unwrap();
        places.vote(&id, Some(&u3), VoteKind::Dislike).await.unwrap();
        let place = places.fetch(&id).await.unwrap();
        assert_eq!(place.likes, vec![u2.clone()], "{backend}");
        assert_eq!(place.dislikes, vec![u3.clone()], "{backend}");
        assert_eq!(place.vote_of(&u2), Some(VoteKind::Like), "{backend}");

        places.add_feature(&id, Some(&u2), "Elevator").await.unwrap();
        places.add_feature(&id, Some(&u1), "Wide doors").await.unwrap();
        places.add_comment(&id, Some(&u3), "Great access").await.unwrap();
        places.add_comment(&id, Some(&u3), "Great access").await.unwrap();

        let place = places.fetch(&id).await.unwrap();
        assert_eq!(place.features[&u1], vec!["Ramp at north entrance", "Wide doors"], "{backend}");
        assert_eq!(place.features[&u2], vec!["Elevator"], "{backend}");
        assert_eq!(place.comments[&u3], vec!["Great access", "Great access"], "{backend}");
    }
}

#[tokio::test]
async fn listing_tolerates_legacy_and_broken_documents() {
    for (backend, store) in backends().await {
        let places = PlaceRepository::new(store.clone(), Arc::new(RecordingUploader));
        let fresh = places.create(Some(&user("u1")), spence_hall()).await.unwrap();

        // Written by an older client: no vote sets, creation time under another name.
        store
            .create_with_id(
                PLACES,
                "legacy",
                vec![
                    FieldUpdate::set("placeName", json!("Morris Library")),
                    FieldUpdate::set("description", json!("Library")),
                    FieldUpdate::set("location", json!("Main St")),
                    FieldUpdate::set("city", json!("newark ")),
                    FieldUpdate::set("userID", json!("u9")),
                    FieldUpdate::set("dateCreated", json!("2021-09-01T12:00:00Z")),
                ],
            )
            .await
            .unwrap();
        store
            .create_with_id(PLACES, "broken", vec![FieldUpdate::set("description", json!("no name"))])
            .await
            .unwrap();

        let listing = places.fetch_all().await.unwrap();
        let ids: Vec<_> = listing.places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![fresh.as_str(), "legacy"], "{backend}: newest first");
        assert_eq!(listing.skipped.len(), 1, "{backend}");
        assert_eq!(listing.skipped[0].id, "broken", "{backend}");

        let legacy = places.fetch("legacy").await.unwrap();
        assert!(legacy.likes.is_empty(), "{backend}");
        assert_eq!(legacy.date_added.map(|d| d.to_rfc3339()), Some("2021-09-01T12:00:00+00:00".into()));
        assert!(matches!(places.fetch("broken").await, Err(AppError::NotFound(..))), "{backend}");

        // Legacy documents accept atomic mutations on their missing sets.
        places.vote("legacy", Some(&user("u1")), VoteKind::Dislike).await.unwrap();
        assert_eq!(places.fetch("legacy").await.unwrap().dislikes, vec![user("u1")]);

        let newark = places.list_by_city("Newark").await.unwrap();
        assert_eq!(newark.places.len(), 2, "{backend}");
        assert!(places.list_by_city("Dover").await.unwrap().places.is_empty());
    }
}

#[tokio::test]
async fn non_object_bodies_are_skipped_not_fatal() {
    let sqlite = SqliteDocumentStore::new("sqlite::memory:").await.unwrap();
    sqlite.insert_raw(PLACES, "broken", json!(["not", "an", "object"])).await.unwrap();
    let memory = MemoryStore::new();
    memory.insert_raw(PLACES, "broken", json!(["not", "an", "object"]));
    let stores: Vec<(&str, Arc<dyn DocumentStore>)> = vec![("memory", Arc::new(memory)), ("sqlite", Arc::new(sqlite))];

    for (backend, store) in stores {
        let places = PlaceRepository::new(store, Arc::new(RecordingUploader));
        let good = places.create(Some(&user("u1")), spence_hall()).await.unwrap();

        let listing = places.fetch_all().await.unwrap();
        assert_eq!(listing.places.len(), 1, "{backend}");
        assert_eq!(listing.places[0].id, good, "{backend}");
        assert_eq!(listing.skipped.len(), 1, "{backend}");
        assert_eq!(listing.skipped[0].id, "broken", "{backend}");

        assert!(matches!(places.fetch("broken").await, Err(AppError::NotFound(..))), "{backend}");
        assert_eq!(places.list_by_city("Newark").await.unwrap().places.len(), 1, "{backend}");
    }
}

#[tokio::test]
async fn mutations_on_missing_place_are_not_found() {
    for (backend, store) in backends().await {
        let places = PlaceRepository::new(store, Arc::new(RecordingUploader));
        let u1 = user("u1");
        let vote = places.vote("ghost", Some(&u1), VoteKind::Like).await;
        let feature = places.add_feature("ghost", Some(&u1), "Ramp").await;
        let comment = places.add_comment("ghost", Some(&u1), "Nice").await;
        for result in [vote, feature, comment] {
            assert!(matches!(result, Err(AppError::NotFound(..))), "{backend}: {result:?}");
        }
    }
}

#[tokio::test]
async fn anonymous_callers_cannot_write() {
    for (backend, store) in backends().await {
        let places = PlaceRepository::new(store.clone(), Arc::new(RecordingUploader));
        assert!(matches!(places.create(None, spence_hall()).await, Err(AppError::Unauthenticated)));

        let id = places.create(Some(&user("u1")), spence_hall()).await.unwrap();
        let before = store.get(PLACES, &id).await.unwrap().unwrap().version;
        assert!(matches!(places.vote(&id, None, VoteKind::Like).await, Err(AppError::Unauthenticated)));
        assert!(matches!(places.add_comment(&id, None, "hi").await, Err(AppError::Unauthenticated)));
        let after = store.get(PLACES, &id).await.unwrap().unwrap().version;
        assert_eq!(before, after, "{backend}: rejected writes must not touch the document");
    }
}
