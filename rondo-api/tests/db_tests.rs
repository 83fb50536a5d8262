//! Database initialization tests
//!
//! File-backed startup behavior: first run creates the database with
//! defaults, later runs reopen it without disturbing user overrides.

use rondo_common::db::{get_schema_version, init_database};

#[tokio::test]
async fn first_run_creates_database_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rondo.db");

    let pool = init_database(&db_path).await.unwrap();

    assert!(db_path.exists());
    assert_eq!(get_schema_version(&pool).await.unwrap(), 1);

    let leads = rondo_api::db::settings::reminder_lead_minutes(&pool)
        .await
        .unwrap();
    assert_eq!(leads, vec![1440, 60]);
}

#[tokio::test]
async fn reopening_preserves_overridden_settings() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rondo.db");

    let pool = init_database(&db_path).await.unwrap();
    rondo_api::db::settings::set_setting(&pool, "reminder_lead_minutes", "30")
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let leads = rondo_api::db::settings::reminder_lead_minutes(&pool)
        .await
        .unwrap();
    assert_eq!(leads, vec![30]);
}
