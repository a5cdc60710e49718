mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{catalog, music_service, track, Behavior, InMemoryTrackStore};
use discovery_service::models::TrackPage;
use discovery_service::{BrowseRequest, SearchRequest};

fn ids(page: &TrackPage) -> Vec<String> {
    page.items.iter().map(|t| t.id.clone()).collect()
}

#[tokio::test]
async fn browse_in_one_session_never_repeats() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(30))));
    let request = BrowseRequest {
        limit: 5,
        session_id: Some("listener".to_string()),
        ..Default::default()
    };

    let first = svc.browse(request.clone()).await.unwrap();
    let second = svc.browse(request).await.unwrap();

    assert_eq!(first.items.len(), 5);
    assert_eq!(second.items.len(), 5);
    assert_eq!(first.session.viewed_count, Some(5));
    assert_eq!(second.session.viewed_count, Some(10));
    assert_eq!(second.pagination.total, 25);

    let first_ids: HashSet<String> = ids(&first).into_iter().collect();
    assert!(ids(&second).iter().all(|id| !first_ids.contains(id)));
}

#[tokio::test]
async fn browse_with_a_fixed_seed_is_reproducible() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(40))));
    let request = BrowseRequest {
        limit: 8,
        seed: Some("night".to_string()),
        ..Default::default()
    };

    let a = svc.browse(request.clone()).await.unwrap();
    let b = svc.browse(request).await.unwrap();

    assert_eq!(ids(&a), ids(&b));
    assert!(a.pagination.has_more);
    assert!(a.pagination.offset.is_none());
}

#[tokio::test]
async fn browse_of_an_exhausted_catalog_is_empty() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(4))));
    let request = BrowseRequest {
        limit: 10,
        session_id: Some("s".to_string()),
        ..Default::default()
    };

    let first = svc.browse(request.clone()).await.unwrap();
    assert_eq!(first.items.len(), 4);
    assert!(!first.pagination.has_more);

    let second = svc.browse(request).await.unwrap();
    assert!(second.items.is_empty());
    assert_eq!(second.pagination.total, 0);
    assert_eq!(second.session.viewed_count, Some(4));
}

#[tokio::test]
async fn search_pages_by_offset() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(25))));

    let first = svc
        .search(SearchRequest {
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    let third = svc
        .search(SearchRequest {
            limit: 10,
            offset: 20,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(first.pagination.total, 25);
    assert!(first.pagination.has_more);
    assert_eq!(first.pagination.offset, Some(0));
    assert_eq!(third.items.len(), 5);
    assert!(!third.pagination.has_more);
    assert_eq!(ids(&third)[0], "t020");
}

#[tokio::test]
async fn search_session_skips_tracks_already_returned() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(12))));
    let request = SearchRequest {
        limit: 5,
        session_id: Some("s1".to_string()),
        ..Default::default()
    };

    let first = svc.search(request.clone()).await.unwrap();
    let second = svc.search(request).await.unwrap();

    assert_eq!(first.session.excluded_count, Some(0));
    assert_eq!(second.session.excluded_count, Some(5));
    assert_eq!(second.pagination.total, 7);
    let first_ids: HashSet<String> = ids(&first).into_iter().collect();
    assert!(ids(&second).iter().all(|id| !first_ids.contains(id)));
}

#[tokio::test]
async fn search_filters_are_case_insensitive() {
    let tracks = vec![
        track("a1", "Phonk", "dark"),
        track("a2", "Lo-Fi", "calm"),
        track("a3", "drift phonk", "dark"),
    ];
    let svc = music_service(Arc::new(InMemoryTrackStore::new(tracks)));

    let page = svc
        .search(SearchRequest {
            genre: Some("PHONK".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["a1", "a3"]);

    let page = svc
        .search(SearchRequest {
            query: Some("song a2".to_string()),
            mood: Some("calm".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["a2"]);
}

#[tokio::test]
async fn shuffled_search_is_seeded() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(30))));
    let request = SearchRequest {
        limit: 10,
        shuffle: true,
        seed: Some("mix".to_string()),
        ..Default::default()
    };

    let a = svc.search(request.clone()).await.unwrap();
    let b = svc.search(request).await.unwrap();

    assert_eq!(a.items.len(), 10);
    assert_eq!(ids(&a), ids(&b));
    let unique: HashSet<String> = ids(&a).into_iter().collect();
    assert_eq!(unique.len(), 10);
    assert!(a.pagination.has_more);
}

#[tokio::test]
async fn store_failure_propagates() {
    let svc = music_service(Arc::new(InMemoryTrackStore::with_behavior(
        catalog(5),
        Behavior::Failing,
    )));

    assert!(svc.search(SearchRequest::default()).await.is_err());
    assert!(svc.browse(BrowseRequest::default()).await.is_err());
    assert!(svc.genres().await.is_err());
}

#[tokio::test]
async fn genres_are_distinct_and_sorted() {
    let svc = music_service(Arc::new(InMemoryTrackStore::new(catalog(6))));
    assert_eq!(svc.genres().await.unwrap(), vec!["Lo-Fi", "Phonk"]);
}
