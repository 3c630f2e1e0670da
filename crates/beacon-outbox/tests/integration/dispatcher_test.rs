use std::time::Duration;

use beacon_outbox::{
    BatchSize, DispatcherConfig, DrainOutcome, MemoryOutboxStore, OutboxDispatcher, OutboxError,
};

use crate::helpers::{FlakyStore, RecordingEventLog, dispatcher, seed, user_created, writer};

#[tokio::test]
async fn should_ship_and_acknowledge_inserted_event() {
    let store = MemoryOutboxStore::new();
    let tx = store.begin();
    writer(store.clone())
        .insert(&tx, &[&user_created("a@x.com")])
        .await
        .unwrap();
    store.commit(tx);

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, "user_created");
    assert!(!entries[0].processed);

    let log = RecordingEventLog::new();
    let outcome = dispatcher(store.clone(), log.clone(), 100)
        .drain_once()
        .await
        .unwrap();
    assert_eq!(outcome, DrainOutcome::Shipped(1));

    let rows = log.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "user_created");
    assert_eq!(rows[0].event_date_time, entries[0].occurred_at);
    assert_eq!(rows[0].environment, "test");
    let context: serde_json::Value = serde_json::from_str(&rows[0].event_context).unwrap();
    assert_eq!(
        context,
        serde_json::json!({ "email": "a@x.com", "first_name": "A", "last_name": "B" })
    );

    let entry = &store.entries()[0];
    assert!(entry.processed);
    assert!(entry.processed_at.is_some());
}

#[tokio::test]
async fn should_not_contact_event_log_when_outbox_empty() {
    let log = RecordingEventLog::new();
    let outcome = dispatcher(MemoryOutboxStore::new(), log.clone(), 100)
        .drain_once()
        .await
        .unwrap();

    assert_eq!(outcome, DrainOutcome::Idle);
    assert_eq!(log.connect_count(), 0);
}

#[tokio::test]
async fn should_keep_entry_pending_when_ship_fails_and_deliver_on_next_drain() {
    let store = MemoryOutboxStore::new();
    seed(&store, 1).await;
    let log = RecordingEventLog::failing(1);
    let dispatcher = dispatcher(store.clone(), log.clone(), 100);

    let first = dispatcher.drain_once().await;
    assert!(
        matches!(first, Err(OutboxError::TransientDelivery(_))),
        "expected TransientDelivery, got {first:?}"
    );
    assert_eq!(store.pending_count(), 1);
    assert!(log.rows().is_empty());
    assert_eq!(log.open_connections(), 0, "connection must be released on failure");

    let second = dispatcher.drain_once().await.unwrap();
    assert_eq!(second, DrainOutcome::Shipped(1));
    assert_eq!(log.rows().len(), 1);
    assert_eq!(store.pending_count(), 0);
    assert_eq!(log.open_connections(), 0);
}

#[tokio::test]
async fn should_bound_batches_and_drain_in_insertion_order() {
    let store = MemoryOutboxStore::new();
    seed(&store, 250).await;
    let log = RecordingEventLog::new();
    let dispatcher = dispatcher(store.clone(), log.clone(), 100);

    let mut outcomes = Vec::new();
    loop {
        let outcome = dispatcher.drain_once().await.unwrap();
        outcomes.push(outcome);
        if outcome == DrainOutcome::Idle {
            break;
        }
    }

    assert_eq!(
        outcomes,
        [
            DrainOutcome::Shipped(100),
            DrainOutcome::Shipped(100),
            DrainOutcome::Shipped(50),
            DrainOutcome::Idle,
        ]
    );
    let rows = log.rows();
    assert_eq!(rows.len(), 250);
    assert!(
        rows.windows(2)
            .all(|w| w[0].event_date_time < w[1].event_date_time),
        "rows should arrive oldest first"
    );
    let first: serde_json::Value = serde_json::from_str(&rows[0].event_context).unwrap();
    assert_eq!(first["email"], "user0@x.com");
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn should_redeliver_batch_when_acknowledge_fails() {
    let store = FlakyStore::failing_marks(1);
    seed(&store.inner, 2).await;
    let log = RecordingEventLog::new();
    let dispatcher = dispatcher(store.clone(), log.clone(), 100);

    let first = dispatcher.drain_once().await;
    assert!(matches!(first, Err(OutboxError::Persistence(_))));
    assert_eq!(log.rows().len(), 2, "batch already reached the event log");
    assert_eq!(store.inner.pending_count(), 2);

    let second = dispatcher.drain_once().await.unwrap();
    assert_eq!(second, DrainOutcome::Shipped(2));
    // At-least-once: the batch is shipped again rather than lost.
    assert_eq!(log.rows().len(), 4);
    assert_eq!(store.inner.pending_count(), 0);
}

#[tokio::test]
async fn should_fail_with_transient_delivery_when_event_log_times_out() {
    let store = MemoryOutboxStore::new();
    seed(&store, 1).await;
    let log = RecordingEventLog::slow(Duration::from_millis(500));
    let dispatcher = OutboxDispatcher::new(
        store.clone(),
        log.clone(),
        DispatcherConfig {
            batch_size: BatchSize::DEFAULT,
            delivery_timeout: Duration::from_millis(20),
        },
    );

    let result = dispatcher.drain_once().await;

    assert!(
        matches!(result, Err(OutboxError::TransientDelivery(_))),
        "expected TransientDelivery, got {result:?}"
    );
    assert_eq!(store.pending_count(), 1);
    assert_eq!(log.open_connections(), 0, "timed out connection must be released");
}

#[tokio::test]
async fn should_transition_each_entry_to_processed_exactly_once() {
    let store = MemoryOutboxStore::new();
    seed(&store, 3).await;
    let dispatcher = dispatcher(store.clone(), RecordingEventLog::new(), 100);

    dispatcher.drain_once().await.unwrap();
    let after_first: Vec<_> = store.entries().iter().map(|e| e.processed_at).collect();
    assert!(after_first.iter().all(Option::is_some));

    assert_eq!(dispatcher.drain_once().await.unwrap(), DrainOutcome::Idle);
    let after_second: Vec<_> = store.entries().iter().map(|e| e.processed_at).collect();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn should_deliver_everything_when_drains_overlap() {
    let store = MemoryOutboxStore::new();
    seed(&store, 4).await;
    let log = RecordingEventLog::slow(Duration::from_millis(50));
    let first = dispatcher(store.clone(), log.clone(), 100);
    let second = dispatcher(store.clone(), log.clone(), 100);

    let (first_result, second_result) = tokio::join!(
        async {
            let outcome = first.drain_once().await;
            (outcome, chrono::Utc::now())
        },
        async {
            // Selects while the first drain is still shipping the same rows.
            tokio::time::sleep(Duration::from_millis(10)).await;
            second.drain_once().await
        },
    );
    let (first_outcome, first_done) = first_result;
    assert_eq!(first_outcome.unwrap(), DrainOutcome::Shipped(4));
    assert_eq!(second_result.unwrap(), DrainOutcome::Shipped(4));

    // At-least-once: both drains shipped the batch.
    let rows = log.rows();
    assert_eq!(rows.len(), 8);
    for i in 0..4 {
        let email = format!("user{i}@x.com");
        assert!(
            rows.iter().any(|row| row.event_context.contains(&email)),
            "{email} never reached the event log"
        );
    }

    let entries = store.entries();
    assert!(entries.iter().all(|e| e.processed));
    for entry in &entries {
        let processed_at = entry.processed_at.unwrap();
        assert!(
            processed_at <= first_done,
            "entry {} took the later acknowledgement",
            entry.id
        );
    }
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn should_leave_entries_committed_mid_drain_pending() {
    let store = MemoryOutboxStore::new();
    seed(&store, 3).await;
    let log = RecordingEventLog::slow(Duration::from_millis(50));
    let dispatcher = dispatcher(store.clone(), log.clone(), 100);
    let writer = writer(store.clone());

    let (drained, committed) = tokio::join!(dispatcher.drain_once(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let tx = store.begin();
        writer
            .insert(&tx, &[&user_created("late0@x.com"), &user_created("late1@x.com")])
            .await
            .unwrap();
        store.commit(tx)
    });

    assert_eq!(drained.unwrap(), DrainOutcome::Shipped(3));
    assert_eq!(committed, vec![4, 5]);
    let entries = store.entries();
    let processed: Vec<_> = entries.iter().filter(|e| e.processed).map(|e| e.id).collect();
    assert_eq!(processed, [1, 2, 3]);
    assert_eq!(store.pending_count(), 2);

    assert_eq!(dispatcher.drain_once().await.unwrap(), DrainOutcome::Shipped(2));
    assert_eq!(store.pending_count(), 0);
    let rows = log.rows();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().any(|row| row.event_context.contains("late0@x.com")));
    assert!(rows.iter().any(|row| row.event_context.contains("late1@x.com")));
}
