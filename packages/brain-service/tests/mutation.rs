use std::{sync::Arc, time::Duration};

use tokio::time;

use brain_domain::{ContentId, ContentPatch, ProcessingStatus};
use brain_service::{
	ContentStore, Error, MutationEngine, NotifyKind, ResultCache, SearchOutcome, Speculative,
};
use brain_testkit::{FakeApi, Failure, RecordingNotifier, SERVER_TIME, content, note};

const DELAY: Duration = Duration::from_millis(100);

struct Harness {
	api: Arc<FakeApi>,
	store: ContentStore,
	cache: Arc<ResultCache>,
	notifier: Arc<RecordingNotifier>,
	engine: MutationEngine,
}

async fn harness() -> Harness {
	let api = Arc::new(
		FakeApi::new()
			.with_mutation_delay(DELAY)
			.with_server_content(vec![
				content("a", "Alpha", ProcessingStatus::Completed),
				content("b", "Beta", ProcessingStatus::Failed),
			]),
	);
	let store = ContentStore::new();
	let cache = Arc::new(ResultCache::new(Duration::from_secs(300), 16));
	let notifier = Arc::new(RecordingNotifier::new());

	store.refresh(api.as_ref()).await.expect("Initial load failed.");

	let engine =
		MutationEngine::new(store.clone(), api.clone(), notifier.clone(), Some(cache.clone()));

	Harness { api, store, cache, notifier, engine }
}

fn rename(title: &str) -> ContentPatch {
	ContentPatch { title: Some(title.to_string()), ..ContentPatch::default() }
}

#[tokio::test(start_paused = true)]
async fn update_shows_overlay_then_settles_to_server_value() {
	let h = harness().await;
	let id = ContentId::new("a");
	let task = tokio::spawn({
		let engine = h.engine.clone();
		let id = id.clone();

		async move { engine.update(&id, rename("Renamed")).await }
	});

	time::sleep(DELAY / 2).await;

	assert!(h.engine.is_pending(&id));
	assert_eq!(h.engine.effective(&id).map(|item| item.title).as_deref(), Some("Renamed"));
	assert_eq!(h.store.get(&id).map(|item| item.title).as_deref(), Some("Alpha"));

	let settled = task.await.expect("Task panicked.").expect("Update failed.");

	assert!(!h.engine.is_pending(&id));
	assert_eq!(settled.updated_at, SERVER_TIME);
	assert_eq!(h.store.get(&id), Some(settled.clone()));
	assert_eq!(h.engine.effective(&id), Some(settled));
	assert_eq!(h.notifier.count(NotifyKind::Success), 1);
}

#[tokio::test(start_paused = true)]
async fn abandoned_update_discards_its_overlay() {
	let h = harness().await;
	let id = ContentId::new("a");
	let abandoned = time::timeout(DELAY / 2, h.engine.update(&id, rename("Ghost"))).await;

	assert!(abandoned.is_err());

	time::sleep(DELAY * 10).await;

	assert!(!h.engine.is_pending(&id));
	assert_eq!(h.engine.effective(&id).map(|item| item.title).as_deref(), Some("Alpha"));
	assert_eq!(h.store.get(&id).map(|item| item.title).as_deref(), Some("Alpha"));
	assert_eq!(h.notifier.count(NotifyKind::Success), 0);
	assert_eq!(h.notifier.count(NotifyKind::Error), 0);
}

#[tokio::test(start_paused = true)]
async fn abandoned_older_update_keeps_newer_overlay() {
	let h = harness().await;
	let id = ContentId::new("a");
	let newer = tokio::spawn({
		let engine = h.engine.clone();
		let id = id.clone();

		async move {
			time::sleep(DELAY / 4).await;

			engine.update(&id, rename("Newer")).await
		}
	});
	let abandoned = time::timeout(DELAY / 2, h.engine.update(&id, rename("Older"))).await;

	assert!(abandoned.is_err());
	assert!(h.engine.is_pending(&id));
	assert_eq!(h.engine.effective(&id).map(|item| item.title).as_deref(), Some("Newer"));

	newer.await.expect("Task panicked.").expect("Newer update failed.");

	assert!(!h.engine.is_pending(&id));
	assert_eq!(h.store.get(&id).map(|item| item.title).as_deref(), Some("Newer"));
}

#[tokio::test(start_paused = true)]
async fn failed_delete_restores_the_item() {
	let h = harness().await;
	let id = ContentId::new("a");
	let original = h.store.get(&id).expect("Missing seed item.");

	h.api.fail_deletes(Some(Failure::Network));

	let task = tokio::spawn({
		let engine = h.engine.clone();
		let id = id.clone();

		async move { engine.delete(&id).await }
	});

	time::sleep(DELAY / 2).await;

	assert_eq!(
		h.engine.pending_operation(&id).map(|op| op.speculative),
		Some(Speculative::Deleted)
	);
	assert!(h.engine.effective(&id).is_none());
	assert!(h.engine.effective_snapshot().iter().all(|item| item.id != id));

	let err = task.await.expect("Task panicked.").expect_err("Expected delete failure.");

	assert!(matches!(err, Error::Api(_)));
	assert!(!h.engine.is_pending(&id));
	assert_eq!(h.store.get(&id), Some(original.clone()));
	assert_eq!(h.engine.effective(&id), Some(original));
	assert_eq!(h.notifier.count(NotifyKind::Error), 1);
}

#[tokio::test(start_paused = true)]
async fn delete_removes_item_on_success() {
	let h = harness().await;
	let id = ContentId::new("a");

	h.engine.delete(&id).await.expect("Delete failed.");

	assert!(h.store.get(&id).is_none());
	assert_eq!(h.store.len(), 1);
	assert!(h.api.server_content().iter().all(|item| item.id != id));
}

#[tokio::test(start_paused = true)]
async fn create_swaps_temporary_key_for_server_id() {
	let h = harness().await;
	let temp = ContentId::temporary();
	let task = tokio::spawn({
		let engine = h.engine.clone();
		let temp = temp.clone();

		async move { engine.create(temp, note("Fresh idea")).await }
	});

	time::sleep(DELAY / 2).await;

	let snapshot = h.engine.effective_snapshot();

	assert_eq!(snapshot.len(), 3);
	assert_eq!(snapshot[0].id, temp);
	assert_eq!(snapshot[0].status, ProcessingStatus::Pending);
	assert!(h.store.get(&temp).is_none());

	let created = task.await.expect("Task panicked.").expect("Create failed.");

	assert!(!created.id.is_temporary());
	assert!(!h.engine.is_pending(&temp));
	assert!(h.engine.effective(&temp).is_none());
	assert_eq!(h.store.snapshot().first().map(|item| item.id.clone()), Some(created.id));
}

#[tokio::test(start_paused = true)]
async fn failed_create_leaves_no_trace() {
	let h = harness().await;
	let temp = ContentId::temporary();

	h.api.fail_creates(Some(Failure::Unavailable));

	let err = h.engine.create(temp.clone(), note("Lost")).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::Api(_)));
	assert_eq!(h.engine.pending_count(), 0);
	assert_eq!(h.engine.effective_snapshot().len(), 2);
	assert_eq!(h.store.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_id_is_rejected_before_any_remote_call() {
	let h = harness().await;
	let missing = ContentId::new("missing");
	let update = h.engine.update(&missing, rename("x")).await.expect_err("Expected not found.");
	let delete = h.engine.delete(&missing).await.expect_err("Expected not found.");

	assert!(matches!(update, Error::NotFound { .. }));
	assert!(matches!(delete, Error::NotFound { .. }));
	assert_eq!(h.api.update_calls(), 0);
	assert_eq!(h.api.delete_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_status_transition_is_rejected() {
	let h = harness().await;
	let err = h
		.engine
		.update(&ContentId::new("a"), ContentPatch::status(ProcessingStatus::Processing))
		.await
		.expect_err("Expected invalid transition.");

	assert!(matches!(
		err,
		Error::InvalidTransition {
			from: ProcessingStatus::Completed,
			to: ProcessingStatus::Processing,
			..
		}
	));
	assert_eq!(h.api.update_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn retry_moves_failed_item_back_to_pending() {
	let h = harness().await;
	let retried = h.engine.retry(&ContentId::new("b")).await.expect("Retry failed.");

	assert_eq!(retried.status, ProcessingStatus::Pending);
	assert!(h.store.has_transient());

	let err = h.engine.retry(&ContentId::new("a")).await.expect_err("Expected rejection.");

	assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test(start_paused = true)]
async fn overlapping_updates_on_one_key_settle_last_writer_wins() {
	let h = harness().await;
	let id = ContentId::new("a");
	let first = tokio::spawn({
		let engine = h.engine.clone();
		let id = id.clone();

		async move { engine.update(&id, rename("First")).await }
	});

	time::sleep(DELAY / 2).await;

	let second = tokio::spawn({
		let engine = h.engine.clone();
		let id = id.clone();

		async move { engine.update(&id, rename("Second")).await }
	});

	time::sleep(DELAY / 2 + Duration::from_millis(10)).await;
	first.await.expect("Task panicked.").expect("First update failed.");

	// The first settlement must not drop the newer overlay.
	assert!(h.engine.is_pending(&id));
	assert_eq!(h.store.get(&id).map(|item| item.title).as_deref(), Some("First"));
	assert_eq!(h.engine.effective(&id).map(|item| item.title).as_deref(), Some("Second"));

	second.await.expect("Task panicked.").expect("Second update failed.");

	assert!(!h.engine.is_pending(&id));
	assert_eq!(h.store.get(&id).map(|item| item.title).as_deref(), Some("Second"));
}

#[tokio::test(start_paused = true)]
async fn successful_mutation_clears_cached_searches() {
	let h = harness().await;

	h.cache.insert("alpha", SearchOutcome::empty());
	h.api.fail_updates(Some(Failure::Network));

	let _ = h.engine.update(&ContentId::new("a"), rename("Nope")).await;

	assert_eq!(h.cache.len(), 1);

	h.api.fail_updates(None);
	h.engine.update(&ContentId::new("a"), rename("Yes")).await.expect("Update failed.");

	assert!(h.cache.is_empty());
}
