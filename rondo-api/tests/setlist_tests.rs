//! Setlist reconciliation tests
//!
//! Exercises reconcile/add/remove through the db layer: dense unique
//! positions after every mutation, order fidelity against the requested
//! sequence, idempotent re-runs, all-or-nothing failure behavior, and the
//! no-op contract for removing absent songs.

mod helpers;

use helpers::{read_setlist, seed_group, seed_round, seed_song, seed_user, setup_db};
use rondo_api::db::setlist::{self, ReconcileOutcome};
use rondo_common::Error;
use sqlx::SqlitePool;

/// Group + round + three songs, the staple fixture
async fn setup_round(db: &SqlitePool) -> (String, String, String, String) {
    let (owner, _) = seed_user(db, "owner@example.com", "Owner").await;
    let group = seed_group(db, &owner.guid, "The Regulars").await;
    let round = seed_round(db, &group, "First Set").await;
    let a = seed_song(db, &group, "Angeline").await;
    let b = seed_song(db, &group, "Blue Bossa").await;
    let c = seed_song(db, &group, "Cold Rain").await;
    (round, a, b, c)
}

#[tokio::test]
async fn reconcile_drops_missing_and_reorders_kept() {
    let db = setup_db().await;
    let (round, a, b, c) = setup_round(&db).await;

    for song in [&a, &b, &c] {
        setlist::add_song(&db, &round, song, None, None).await.unwrap();
    }

    let outcome = setlist::reconcile(&db, &round, &[c.clone(), a.clone()]).await.unwrap();
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.created, 0);

    assert_eq!(read_setlist(&db, &round).await, vec![(c, 0), (a, 1)]);
}

#[tokio::test]
async fn reconcile_populates_empty_round() {
    let db = setup_db().await;
    let (round, a, b, c) = setup_round(&db).await;

    let outcome = setlist::reconcile(&db, &round, &[a.clone(), b.clone(), c.clone()])
        .await
        .unwrap();
    assert_eq!(outcome.created, 3);

    assert_eq!(read_setlist(&db, &round).await, vec![(a, 0), (b, 1), (c, 2)]);
}

#[tokio::test]
async fn reconcile_with_unchanged_order_is_a_noop() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    setlist::add_song(&db, &round, &b, None, None).await.unwrap();
    let before = setlist::list_items(&db, &round).await.unwrap();

    let outcome = setlist::reconcile(&db, &round, &[a.clone(), b.clone()]).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::default());

    // Same items, untouched: guids and positions identical
    let after = setlist::list_items(&db, &round).await.unwrap();
    let key = |items: &[rondo_common::db::RoundItem]| {
        items
            .iter()
            .map(|i| (i.guid.clone(), i.position))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&before), key(&after));
}

#[tokio::test]
async fn reconcile_twice_converges() {
    let db = setup_db().await;
    let (round, a, b, c) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();

    let desired = vec![b.clone(), c.clone()];
    setlist::reconcile(&db, &round, &desired).await.unwrap();
    let second = setlist::reconcile(&db, &round, &desired).await.unwrap();

    assert_eq!(second, ReconcileOutcome::default());
    assert_eq!(read_setlist(&db, &round).await, vec![(b, 0), (c, 1)]);
}

#[tokio::test]
async fn reconcile_with_unknown_song_changes_nothing() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    setlist::add_song(&db, &round, &b, None, None).await.unwrap();
    let before = read_setlist(&db, &round).await;

    let err = setlist::reconcile(
        &db,
        &round,
        &[b.clone(), "no-such-song".to_string(), a.clone()],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(read_setlist(&db, &round).await, before);
}

#[tokio::test]
async fn reconcile_rejects_songs_from_another_group() {
    let db = setup_db().await;
    let (round, a, _, _) = setup_round(&db).await;

    let (other_owner, _) = seed_user(&db, "other@example.com", "Other").await;
    let other_group = seed_group(&db, &other_owner.guid, "Rivals").await;
    let foreign_song = seed_song(&db, &other_group, "Stolen Tune").await;

    let err = setlist::reconcile(&db, &round, &[a.clone(), foreign_song])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert!(read_setlist(&db, &round).await.is_empty());
}

#[tokio::test]
async fn reconcile_duplicate_input_keeps_first_occurrence() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    let outcome = setlist::reconcile(&db, &round, &[a.clone(), a.clone(), b.clone()])
        .await
        .unwrap();
    assert_eq!(outcome.created, 2);

    assert_eq!(read_setlist(&db, &round).await, vec![(a, 0), (b, 1)]);
}

#[tokio::test]
async fn reconcile_empty_order_clears_the_round() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    setlist::add_song(&db, &round, &b, None, None).await.unwrap();

    let outcome = setlist::reconcile(&db, &round, &[]).await.unwrap();
    assert_eq!(outcome.deleted, 2);
    assert!(read_setlist(&db, &round).await.is_empty());
}

#[tokio::test]
async fn reconcile_unknown_round_is_not_found() {
    let db = setup_db().await;
    setup_round(&db).await;

    let err = setlist::reconcile(&db, "no-such-round", &[]).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn add_song_appends_to_the_end() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    let first = setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    let second = setlist::add_song(&db, &round, &b, None, None).await.unwrap();

    assert_eq!(first.position, 0);
    assert_eq!(second.position, 1);
}

#[tokio::test]
async fn add_song_at_position_shifts_trailing_items() {
    let db = setup_db().await;
    let (round, a, b, c) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    setlist::add_song(&db, &round, &b, None, None).await.unwrap();

    let spliced = setlist::add_song(&db, &round, &c, Some(0), None).await.unwrap();
    assert_eq!(spliced.position, 0);

    assert_eq!(read_setlist(&db, &round).await, vec![(c, 0), (a, 1), (b, 2)]);
}

#[tokio::test]
async fn add_song_position_past_the_end_appends() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    let item = setlist::add_song(&db, &round, &b, Some(99), None).await.unwrap();

    assert_eq!(item.position, 1);
}

#[tokio::test]
async fn add_song_twice_is_a_conflict() {
    let db = setup_db().await;
    let (round, a, _, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    let err = setlist::add_song(&db, &round, &a, None, None).await.unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(read_setlist(&db, &round).await.len(), 1);
}

#[tokio::test]
async fn add_song_rejects_negative_position() {
    let db = setup_db().await;
    let (round, a, _, _) = setup_round(&db).await;

    let err = setlist::add_song(&db, &round, &a, Some(-1), None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn add_song_keeps_notes() {
    let db = setup_db().await;
    let (round, a, _, _) = setup_round(&db).await;

    let item = setlist::add_song(&db, &round, &a, None, Some("capo 3, slow intro"))
        .await
        .unwrap();

    assert_eq!(item.notes.as_deref(), Some("capo 3, slow intro"));
}

#[tokio::test]
async fn remove_song_renumbers_trailing_items() {
    let db = setup_db().await;
    let (round, a, b, c) = setup_round(&db).await;

    for song in [&a, &b, &c] {
        setlist::add_song(&db, &round, song, None, None).await.unwrap();
    }

    let removed = setlist::remove_song(&db, &round, &b).await.unwrap();
    assert!(removed);

    // Positions stay dense after a single removal
    assert_eq!(read_setlist(&db, &round).await, vec![(a, 0), (c, 1)]);
}

#[tokio::test]
async fn remove_absent_song_is_a_noop() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    let before = read_setlist(&db, &round).await;

    let removed = setlist::remove_song(&db, &round, &b).await.unwrap();
    assert!(!removed);
    assert_eq!(read_setlist(&db, &round).await, before);
}

#[tokio::test]
async fn remove_song_from_unknown_round_is_not_found() {
    let db = setup_db().await;
    let (_, a, _, _) = setup_round(&db).await;

    let err = setlist::remove_song(&db, "no-such-round", &a).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_song_cascades_out_of_setlists() {
    let db = setup_db().await;
    let (round, a, b, _) = setup_round(&db).await;

    setlist::add_song(&db, &round, &a, None, None).await.unwrap();
    setlist::add_song(&db, &round, &b, None, None).await.unwrap();

    rondo_api::db::songs::delete_song(&db, &a).await.unwrap();

    // The survivor moves down so positions stay dense
    assert_eq!(read_setlist(&db, &round).await, vec![(b, 0)]);
}
