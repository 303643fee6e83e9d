mod common;

use chrono::DateTime;
use common::{draft, DownStore, HungStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use todo_core::{
    DualStoreTodoRepository, LocalMirror, Provenance, StoreOrigin, TodoDraft, TodoPatch,
};

fn offline_repo() -> DualStoreTodoRepository<DownStore> {
    DualStoreTodoRepository::new(DownStore, LocalMirror::new())
}

fn micros(stamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(stamp)
        .expect("timestamp should be RFC 3339")
        .timestamp_micros()
}

#[tokio::test]
async fn offline_lifecycle_create_find_update_delete() {
    let repo = offline_repo();

    let created = repo
        .create(TodoDraft::new("Buy milk", "low", "u1").with_status("pending"))
        .await;
    assert_eq!(created.origin, StoreOrigin::Local);
    assert_eq!(created.count, 1);
    let todo = created.data.expect("local create should return the record");
    assert_eq!(todo.name, "Buy milk");
    assert!(!todo.id.is_empty());
    assert!(!todo.created_at.is_empty());
    assert!(todo.updated_at.is_none());

    let listing = repo.find().await;
    assert_eq!(listing.origin, StoreOrigin::Local);
    assert_eq!(listing.items, vec![todo.clone()]);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let updated = repo
        .update(
            &todo.id,
            TodoPatch {
                status: Some("completed".to_string()),
                ..TodoPatch::default()
            },
        )
        .await;
    assert_eq!(updated.origin, StoreOrigin::Local);
    assert_eq!(updated.count, 1);

    let listing = repo.find().await;
    let stored = &listing.items[0];
    assert_eq!(stored.status, "completed");
    let updated_at = stored.updated_at.as_deref().expect("updated_at should be set");
    assert!(micros(updated_at) > micros(&stored.created_at));

    let deleted = repo.delete(&todo.id).await;
    assert_eq!(deleted.origin, StoreOrigin::Local);
    assert_eq!(deleted.count, 1);
    assert!(deleted.data.is_none());
    assert!(repo.find().await.items.is_empty());

    let again = repo.delete(&todo.id).await;
    assert_eq!(again.origin, StoreOrigin::Local);
    assert_eq!(again.count, 0);
}

#[tokio::test]
async fn offline_creates_are_listed_newest_first() {
    let repo = offline_repo();
    for name in ["A", "B", "C"] {
        repo.create(draft(name)).await;
    }

    let names: Vec<_> = repo
        .find()
        .await
        .items
        .into_iter()
        .map(|todo| todo.name)
        .collect();
    assert_eq!(names, vec!["C", "B", "A"]);
}

#[tokio::test]
async fn offline_create_defaults_status_and_tags_local_only() {
    let repo = offline_repo();
    let todo = repo
        .create(TodoDraft::new("No status", "high", "u1"))
        .await
        .data
        .unwrap();

    assert_eq!(todo.status, "pending");
    assert!(todo.description.is_none());
    assert!(todo.story_points.is_none());
    assert_eq!(repo.provenance(&todo.id), Some(Provenance::LocalOnly));
}

#[tokio::test]
async fn offline_update_merges_only_patched_fields() {
    let repo = offline_repo();
    let todo = repo
        .create(TodoDraft::new("A", "low", "u1"))
        .await
        .data
        .unwrap();
    let started = chrono::Utc::now().timestamp_micros();

    let result = repo
        .update(
            &todo.id,
            TodoPatch {
                name: Some("B".to_string()),
                ..TodoPatch::default()
            },
        )
        .await;

    let merged = result.data.expect("mirror entry should be merged");
    assert_eq!(merged.id, todo.id);
    assert_eq!(merged.name, "B");
    assert_eq!(merged.priority, "low");
    assert!(micros(merged.updated_at.as_deref().unwrap()) >= started);
}

#[tokio::test]
async fn offline_update_of_unknown_id_returns_empty_success() {
    let repo = offline_repo();
    let result = repo
        .update(
            "local-0-0",
            TodoPatch {
                name: Some("ghost".to_string()),
                ..TodoPatch::default()
            },
        )
        .await;
    assert_eq!(result.origin, StoreOrigin::Local);
    assert_eq!(result.count, 0);
    assert!(result.data.is_none());
}

#[tokio::test]
async fn delete_twice_succeeds_both_times() {
    let repo = offline_repo();
    let todo = repo.create(draft("once")).await.data.unwrap();

    let first = repo.delete(&todo.id).await;
    let second = repo.delete(&todo.id).await;
    assert!(first.data.is_none());
    assert!(second.data.is_none());
    assert!(repo.find_one(&todo.id).await.is_none());
}

#[tokio::test]
async fn find_one_falls_back_to_mirror() {
    let repo = offline_repo();
    let todo = repo.create(draft("lookup")).await.data.unwrap();

    let found = repo.find_one(&todo.id).await.expect("mirror should hold it");
    assert_eq!(found.origin, StoreOrigin::Local);
    assert_eq!(found.item, todo);
    assert!(repo.find_one("missing").await.is_none());
}

#[tokio::test]
async fn hung_remote_falls_back_after_deadline() {
    let repo = DualStoreTodoRepository::new(HungStore, LocalMirror::new())
        .with_deadline(Some(Duration::from_millis(20)));

    let started = Instant::now();
    let created = repo.create(draft("deadline")).await;
    assert_eq!(created.origin, StoreOrigin::Local);

    let listing = repo.find().await;
    assert_eq!(listing.origin, StoreOrigin::Local);
    assert_eq!(listing.items.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn repositories_do_not_share_mirrors() {
    let first = offline_repo();
    let second = offline_repo();
    first.create(draft("isolated")).await;

    assert_eq!(first.find().await.items.len(), 1);
    assert!(second.find().await.items.is_empty());
}

fn local_seq(id: &str) -> u64 {
    id.rsplit('-')
        .next()
        .and_then(|seq| seq.parse().ok())
        .expect("local id should end in a sequence number")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_offline_writes_keep_mirror_consistent() {
    let repo = Arc::new(offline_repo());

    let creates: Vec<_> = (0..200)
        .map(|n| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.create(draft(&format!("task {n}"))).await })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in creates {
        let created = handle.await.unwrap();
        assert_eq!(created.origin, StoreOrigin::Local);
        assert_eq!(created.count, 1);
        ids.push(created.data.unwrap().id);
    }
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 200);

    let deleted: HashSet<String> = ids.iter().step_by(3).cloned().collect();
    let writes: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let repo = Arc::clone(&repo);
            let delete = deleted.contains(&id);
            tokio::spawn(async move {
                if delete {
                    repo.delete(&id).await
                } else {
                    let patch = TodoPatch {
                        status: Some("completed".to_string()),
                        ..TodoPatch::default()
                    };
                    repo.update(&id, patch).await
                }
            })
        })
        .collect();
    for handle in writes {
        let result = handle.await.unwrap();
        assert_eq!(result.origin, StoreOrigin::Local);
        assert_eq!(result.count, 1);
    }

    let items = repo.find().await.items;
    assert_eq!(items.len(), 200 - deleted.len());
    let unique: HashSet<_> = items.iter().map(|todo| todo.id.as_str()).collect();
    assert_eq!(unique.len(), items.len());
    assert!(items.iter().all(|todo| !deleted.contains(&todo.id)));
    assert!(items.iter().all(|todo| todo.status == "completed"));
    for pair in items.windows(2) {
        assert!(local_seq(&pair[0].id) > local_seq(&pair[1].id));
        assert!(micros(&pair[0].created_at) >= micros(&pair[1].created_at));
    }
}
