use drill_core::model::{Grade, ProblemId, Progress};
use drill_core::time::fixed_now;
use storage::repository::{PROGRESS_KEY, ProgressRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn id(raw: &str) -> ProblemId {
    ProblemId::new(raw).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_starts_without_progress() {
    let repo = connect("memdb_empty").await;
    assert!(repo.load_progress().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_round_trips_progress_blob() {
    let repo = connect("memdb_roundtrip").await;

    let mut progress = Progress::default();
    progress.apply_grade(&id("42"), Grade::Hard, fixed_now());
    progress.apply_grade(&id("7"), Grade::Easy, fixed_now());
    progress.toggle_favorite(&id("7"));
    progress.set_note(&id("42"), "monotonic stack");
    repo.save_progress(&progress).await.unwrap();

    let loaded = repo.load_progress().await.unwrap().expect("stored");
    assert_eq!(loaded, progress);
    assert_eq!(loaded.stats().total_seen(), 2);

    // Second save replaces the whole blob.
    progress.set_note(&id("42"), "");
    repo.save_progress(&progress).await.unwrap();
    let loaded = repo.load_progress().await.unwrap().expect("stored");
    assert_eq!(loaded.note(&id("42")), Some(""));
}

#[tokio::test]
async fn sqlite_reports_malformed_blob() {
    let repo = connect("memdb_malformed").await;
    repo.put_blob(PROGRESS_KEY, "{\"correct\": 12").await.unwrap();

    let err = repo.load_progress().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.put_blob("other", "x").await.unwrap();
    assert_eq!(repo.get_blob("other").await.unwrap().as_deref(), Some("x"));
}
