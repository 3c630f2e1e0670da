use beacon_outbox::{
    MemoryOutboxStore, OutboxError, OutboxStore, OutboxWriter, WriteFailurePolicy,
};

use crate::helpers::{FlakyStore, test_environment, user_created, writer};

#[tokio::test]
async fn should_discard_entries_when_business_transaction_rolls_back() {
    let store = MemoryOutboxStore::new();
    let tx = store.begin();
    writer(store.clone())
        .insert(&tx, &[&user_created("a@x.com")])
        .await
        .unwrap();
    assert_eq!(tx.staged_len(), 1);

    drop(tx);

    assert!(store.entries().is_empty());
    assert!(store.select_pending(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_stamp_environment_event_type_and_payload() {
    let store = MemoryOutboxStore::new();
    let tx = store.begin();
    let first = user_created("a@x.com");
    let second = user_created("b@x.com");
    writer(store.clone())
        .insert(&tx, &[&first, &second])
        .await
        .unwrap();
    store.commit(tx);

    let entries = store.entries();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.event_type, "user_created");
        assert_eq!(entry.environment, "test");
        assert!(!entry.processed);
        assert!(entry.processed_at.is_none());
    }
    assert_eq!(
        entries[1].payload,
        r#"{"email":"b@x.com","first_name":"A","last_name":"B"}"#
    );
    assert!(entries[0].occurred_at < entries[1].occurred_at);
}

#[tokio::test]
async fn should_keep_occurred_at_increasing_across_inserts() {
    let store = MemoryOutboxStore::new();
    let writer = writer(store.clone());
    for i in 0..50 {
        let tx = store.begin();
        writer
            .insert(&tx, &[&user_created(&format!("u{i}@x.com"))])
            .await
            .unwrap();
        store.commit(tx);
    }

    let entries = store.entries();
    assert!(
        entries
            .windows(2)
            .all(|w| w[0].occurred_at < w[1].occurred_at)
    );
}

#[tokio::test]
async fn should_swallow_store_failure_by_default() {
    let store = FlakyStore::failing_appends();
    let writer = writer(store.clone());
    let tx = store.inner.begin();

    let result = writer.insert(&tx, &[&user_created("a@x.com")]).await;

    assert!(result.is_ok(), "best effort writes must not fail the caller");
    store.inner.commit(tx);
    assert!(store.inner.entries().is_empty());
}

#[tokio::test]
async fn should_propagate_store_failure_when_strict() {
    let store = FlakyStore::failing_appends();
    let writer = OutboxWriter::new(store.clone(), test_environment())
        .with_failure_policy(WriteFailurePolicy::Strict);
    let tx = store.inner.begin();

    let result = writer.insert(&tx, &[&user_created("a@x.com")]).await;

    assert!(
        matches!(result, Err(OutboxError::Persistence(_))),
        "expected Persistence, got {result:?}"
    );
}

#[tokio::test]
async fn should_accept_empty_event_list() {
    let store = MemoryOutboxStore::new();
    let tx = store.begin();
    writer(store.clone()).insert(&tx, &[]).await.unwrap();
    assert!(store.commit(tx).is_empty());
}
