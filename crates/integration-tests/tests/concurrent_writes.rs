//! Two clients mutate the same place at the same time. With read-modify-write
//! both are forced to read the same snapshot before either writes.

use std::sync::Arc;

use integration_tests::{backends, spence_hall, user, GatedStore, RecordingUploader};
use ma_core::error::AppError;
use ma_core::models::VoteKind;
use ma_core::traits::DocumentStore;
use ma_repo::{PlaceRepository, WriteStrategy};

async fn gated_repo(inner: Arc<dyn DocumentStore>, strategy: WriteStrategy) -> (PlaceRepository, String) {
    let id = PlaceRepository::new(inner.clone(), Arc::new(RecordingUploader))
        .create(Some(&user("owner")), spence_hall())
        .await
        .unwrap();
    let gated: Arc<dyn DocumentStore> = Arc::new(GatedStore::new(inner, 2));
    let repo = PlaceRepository::new(gated, Arc::new(RecordingUploader)).with_strategy(strategy);
    (repo, id)
}

#[tokio::test]
async fn last_writer_wins_loses_a_feature() {
    for (backend, store) in backends().await {
        let (repo, id) = gated_repo(store, WriteStrategy::LastWriterWins).await;
        let (a, b) = (user("alice"), user("bob"));

        let (ra, rb) = tokio::join!(
            repo.add_feature(&id, Some(&a), "Ramp"),
            repo.add_feature(&id, Some(&b), "Elevator"),
        );
        ra.unwrap();
        rb.unwrap();

        let place = repo.fetch(&id).await.unwrap();
        assert_eq!(place.features.len(), 1, "{backend}: one write overwrote the other");
    }
}

#[tokio::test]
async fn optimistic_and_atomic_keep_both_features() {
    for strategy in [WriteStrategy::Optimistic { max_attempts: 3 }, WriteStrategy::Atomic] {
        for (backend, store) in backends().await {
            let (repo, id) = gated_repo(store, strategy).await;
            let (a, b) = (user("alice"), user("bob"));

            // Atomic never reads, so warm the gate with two fetches first.
            if strategy == WriteStrategy::Atomic {
                let (fa, fb) = tokio::join!(repo.fetch(&id), repo.fetch(&id));
                fa.unwrap();
                fb.unwrap();
            }

            let (ra, rb) = tokio::join!(
                repo.add_feature(&id, Some(&a), "Ramp"),
                repo.add_feature(&id, Some(&b), "Elevator"),
            );
            ra.unwrap();
            rb.unwrap();

            let place = repo.fetch(&id).await.unwrap();
            assert_eq!(place.features[&a], vec!["Ramp"], "{backend} {strategy:?}");
            assert_eq!(place.features[&b], vec!["Elevator"], "{backend} {strategy:?}");
        }
    }
}

#[tokio::test]
async fn concurrent_votes_from_different_users_all_land() {
    for strategy in [WriteStrategy::Optimistic { max_attempts: 3 }, WriteStrategy::Atomic] {
        for (backend, store) in backends().await {
            let (repo, id) = gated_repo(store, strategy).await;
            if strategy == WriteStrategy::Atomic {
                let (fa, fb) = tokio::join!(repo.fetch(&id), repo.fetch(&id));
                fa.unwrap();
                fb.unwrap();
            }

            let (alice, bob) = (user("alice"), user("bob"));
            let (ra, rb) = tokio::join!(
                repo.vote(&id, Some(&alice), VoteKind::Like),
                repo.vote(&id, Some(&bob), VoteKind::Dislike),
            );
            ra.unwrap();
            rb.unwrap();

            let place = repo.fetch(&id).await.unwrap();
            assert_eq!(place.likes, vec![user("alice")], "{backend} {strategy:?}");
            assert_eq!(place.dislikes, vec![user("bob")], "{backend} {strategy:?}");
        }
    }
}

#[tokio::test]
async fn same_voter_racing_like_and_dislike_stays_exclusive() {
    let strategies = [
        WriteStrategy::LastWriterWins,
        WriteStrategy::Optimistic { max_attempts: 3 },
        WriteStrategy::Atomic,
    ];
    for strategy in strategies {
        for (backend, store) in backends().await {
            let (repo, id) = gated_repo(store, strategy).await;
            let voter = user("alice");
            if strategy == WriteStrategy::Atomic {
                let (fa, fb) = tokio::join!(repo.fetch(&id), repo.fetch(&id));
                fa.unwrap();
                fb.unwrap();
            }

            let (ra, rb) = tokio::join!(
                repo.vote(&id, Some(&voter), VoteKind::Like),
                repo.vote(&id, Some(&voter), VoteKind::Dislike),
            );
            ra.unwrap();
            rb.unwrap();

            // Either vote may win, but never both and never neither.
            let place = repo.fetch(&id).await.unwrap();
            let liked = place.likes.contains(&voter);
            let disliked = place.dislikes.contains(&voter);
            assert!(liked != disliked, "{backend} {strategy:?}: {place:?}");
            assert_eq!(place.like_count() + place.dislike_count(), 1, "{backend} {strategy:?}");
            assert!(place.vote_of(&voter).is_some(), "{backend} {strategy:?}");
        }
    }
}

#[tokio::test]
async fn optimistic_gives_up_with_conflict() {
    for (backend, store) in backends().await {
        let (repo, id) = gated_repo(store, WriteStrategy::Optimistic { max_attempts: 1 }).await;

        let (alice, bob) = (user("alice"), user("bob"));
        let (ra, rb) = tokio::join!(
            repo.add_comment(&id, Some(&alice), "first"),
            repo.add_comment(&id, Some(&bob), "second"),
        );
        let conflicts = [ra, rb]
            .into_iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1, "{backend}: exactly one writer loses the race");

        let place = repo.fetch(&id).await.unwrap();
        assert_eq!(place.comments.len(), 1, "{backend}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_parallel_atomic_comments() {
    for (backend, store) in backends().await {
        let repo = PlaceRepository::new(store, Arc::new(RecordingUploader));
        let id = repo.create(Some(&user("owner")), spence_hall()).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let who = user(&format!("u{}", i % 4));
                    repo.add_comment(&id, Some(&who), &format!("comment {i}")).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let place = repo.fetch(&id).await.unwrap();
        let total: usize = place.comments.values().map(Vec::len).sum();
        assert_eq!(total, 16, "{backend}");
        assert_eq!(place.comments.len(), 4, "{backend}");
    }
}
