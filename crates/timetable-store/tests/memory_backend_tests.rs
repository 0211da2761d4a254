//! Tests for the in-memory Backend adapter.

use rstest::rstest;
use serde_json::{json, Value};
use timetable_store::{Backend, BackendError, InMemoryBackend, Row, RowFilter, Snapshot, Table};

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn teacher(name: &str, email: &str) -> Row {
    row(json!({ "name": name, "email": email, "subjects": [] }))
}

#[rstest]
#[tokio::test]
async fn insert_assigns_ids() {
    let backend = InMemoryBackend::new();
    let stored = backend
        .insert(Table::Rooms, vec![row(json!({"name": "V101", "capacity": 30}))])
        .await
        .expect("expected the insert to succeed");

    let id = stored[0]["id"].as_str().expect("expected a string id");
    assert!(!id.is_empty());
    assert_eq!(backend.select_all(Table::Rooms).await.unwrap(), stored);
}

#[rstest]
#[tokio::test]
async fn duplicate_teacher_email_is_a_unique_violation() {
    let backend = InMemoryBackend::new();
    backend
        .insert(Table::Teachers, vec![teacher("Alice", "a@school.test")])
        .await
        .unwrap();

    let err = backend
        .insert(Table::Teachers, vec![teacher("Alice bis", "a@school.test")])
        .await
        .expect_err("expected a unique violation");

    assert!(err.is_unique_violation());
    assert_eq!(err.code.as_deref(), Some("23505"));
}

#[rstest]
#[tokio::test]
async fn failing_batch_stores_nothing() {
    let backend = InMemoryBackend::new();
    let batch = vec![
        teacher("Alice", "a@school.test"),
        teacher("Bob", "b@school.test"),
        teacher("Alice again", "a@school.test"),
    ];

    assert!(backend.insert(Table::Teachers, batch).await.is_err());
    assert!(backend.select_all(Table::Teachers).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn batch_repeating_an_explicit_id_stores_nothing() {
    let backend = InMemoryBackend::new();
    let batch = vec![
        row(json!({"id": "R1", "name": "V101"})),
        row(json!({"id": "R2", "name": "R202"})),
        row(json!({"id": "R1", "name": "V101 bis"})),
    ];

    let err = backend.insert(Table::Rooms, batch).await.unwrap_err();

    assert!(err.is_unique_violation());
    assert!(backend.select_all(Table::Rooms).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn insert_rejects_an_id_already_stored() {
    let backend = InMemoryBackend::new();
    backend.insert(Table::Rooms, vec![row(json!({"id": "R1", "name": "V101"}))]).await.unwrap();

    let err = backend
        .insert(Table::Rooms, vec![row(json!({"id": "R1", "name": "Other"}))])
        .await
        .unwrap_err();

    assert!(err.is_unique_violation());
    assert_eq!(backend.select_all(Table::Rooms).await.unwrap().len(), 1);
}

#[rstest]
#[tokio::test]
async fn update_cannot_take_another_teachers_email() {
    let backend = InMemoryBackend::new();
    let stored = backend
        .insert(
            Table::Teachers,
            vec![teacher("Alice", "a@school.test"), teacher("Bob", "b@school.test")],
        )
        .await
        .unwrap();
    let bob = stored[1]["id"].as_str().unwrap();

    let err = backend
        .update(Table::Teachers, bob, row(json!({"email": "a@school.test"})))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());

    // Keeping one's own email is fine.
    backend
        .update(Table::Teachers, bob, row(json!({"name": "Robert", "email": "b@school.test"})))
        .await
        .unwrap();
    let rows = backend.select_all(Table::Teachers).await.unwrap();
    assert_eq!(rows[1]["name"], json!("Robert"));
}

#[rstest]
#[tokio::test]
async fn updating_a_missing_row_fails_but_deleting_one_does_not() {
    let backend = InMemoryBackend::new();
    assert!(backend.update(Table::Rooms, "nope", Row::new()).await.is_err());
    assert!(backend.delete(Table::Rooms, "nope").await.is_ok());
}

#[rstest]
#[tokio::test]
async fn delete_where_removes_matching_rows() {
    let lesson = |date: &str, teacher: &str| {
        row(json!({"id": format!("{}-{}", teacher, date), "teacher_id": teacher, "date": date}))
    };
    let backend = InMemoryBackend::from_snapshot(Snapshot {
        schedule_entries: vec![
            lesson("2025-03-03", "T1"),
            lesson("2025-03-10", "T1"),
            lesson("2025-03-17", "T1"),
            lesson("2025-03-10", "T2"),
        ],
        ..Snapshot::default()
    });

    let filter = RowFilter::new().eq("teacher_id", "T1").gte("date", "2025-03-10");
    let removed = backend.delete_where(Table::ScheduleEntries, &filter).await.unwrap();

    assert_eq!(removed, 2);
    let left: Vec<_> = backend
        .snapshot()
        .await
        .schedule_entries
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(left, vec!["T1-2025-03-03", "T2-2025-03-10"]);
}

#[rstest]
#[tokio::test]
async fn queued_failures_are_consumed_in_order() {
    let backend = InMemoryBackend::new();
    backend.fail_next(BackendError::new("connection reset")).await;

    let err = backend.select_all(Table::Classes).await.unwrap_err();
    assert_eq!(err.message, "connection reset");
    assert!(backend.select_all(Table::Classes).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn snapshot_document_round_trips() {
    let document = json!({
        "rooms": [{"id": "R1", "name": "V101", "capacity": 30, "type": "classroom"}],
        "classes": [{"id": "C1", "name": "10A", "level": "10"}]
    });
    let snapshot: Snapshot = serde_json::from_value(document).unwrap();
    let backend = InMemoryBackend::from_snapshot(snapshot.clone());

    assert_eq!(backend.select_all(Table::Rooms).await.unwrap().len(), 1);
    assert!(backend.select_all(Table::Teachers).await.unwrap().is_empty());
    assert_eq!(backend.snapshot().await, snapshot);
}
