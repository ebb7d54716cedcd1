use std::sync::Arc;

use brain_domain::{ContentId, ContentPatch, ProcessingStatus};
use brain_service::{BrainService, Collaborators, SearchStatus};
use brain_testkit::{FakeApi, RecordingNotifier, content, scored, test_config};

fn service(api: &Arc<FakeApi>, invalidate_on_mutation: bool) -> BrainService {
	let mut cfg = test_config();

	cfg.search.cache.invalidate_on_mutation = invalidate_on_mutation;

	BrainService::new(
		&cfg,
		Collaborators::new(api.clone(), api.clone(), Arc::new(RecordingNotifier::new())),
	)
}

#[tokio::test(start_paused = true)]
async fn wires_search_store_and_mutations_together() {
	let api = Arc::new(
		FakeApi::new()
			.with_search("alpha", vec![scored("a", 0.9)])
			.with_server_content(vec![content("a", "Alpha", ProcessingStatus::Completed)]),
	);
	let mut service = service(&api, true);

	assert_eq!(service.load().await.expect("Load failed."), 1);

	service.search.submit("alpha").await.expect("Search failed.");

	assert_eq!(service.cache.len(), 1);

	let patch = ContentPatch { title: Some("Alpha v2".to_string()), ..ContentPatch::default() };

	service.mutations.update(&ContentId::new("a"), patch).await.expect("Update failed.");

	assert!(service.cache.is_empty());
	assert_eq!(
		service.store.get(&ContentId::new("a")).map(|item| item.title).as_deref(),
		Some("Alpha v2")
	);

	service.start_poller();
	service.start_poller();

	assert!(service.is_polling());

	service.shutdown().await;

	assert!(!service.is_polling());
}

#[tokio::test(start_paused = true)]
async fn cache_survives_mutations_when_invalidation_is_off() {
	let api = Arc::new(
		FakeApi::new()
			.with_search("alpha", vec![scored("a", 0.9)])
			.with_server_content(vec![content("a", "Alpha", ProcessingStatus::Completed)]),
	);
	let service = service(&api, false);

	service.load().await.expect("Load failed.");
	service.search.submit("alpha").await.expect("Search failed.");
	service.mutations.delete(&ContentId::new("a")).await.expect("Delete failed.");

	let again = service.search.submit("alpha").await.expect("Search failed.");

	assert!(matches!(again, SearchStatus::Cached(_)));
	assert_eq!(api.search_calls(), 1);
}
