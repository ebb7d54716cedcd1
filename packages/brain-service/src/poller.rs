use std::{sync::Arc, time::Duration};

use tokio::{
	sync::watch,
	task::JoinHandle,
	time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{ContentApi, ContentStore};

/// Periodically refreshes the [`ContentStore`] while any item is pending or processing.
///
/// A single background task owns the only timer. It arms when a change leaves transient items
/// in the store and disarms as soon as none remain. Refreshes are silent; failures are logged
/// and the next tick retries.
pub struct Poller {
	shutdown: CancellationToken,
	handle: Option<JoinHandle<()>>,
}
impl Poller {
	/// Must be called from within a Tokio runtime.
	pub fn spawn(store: ContentStore, api: Arc<dyn ContentApi>, interval: Duration) -> Self {
		let shutdown = CancellationToken::new();
		let handle = tokio::spawn(run_poller(store, api, interval, shutdown.clone()));

		Self { shutdown, handle: Some(handle) }
	}

	pub fn is_running(&self) -> bool {
		self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
	}

	/// Stops the loop and waits for the task to exit.
	pub async fn shutdown(mut self) {
		self.shutdown.cancel();

		if let Some(handle) = self.handle.take()
			&& let Err(err) = handle.await
		{
			tracing::warn!(error = %err, "Poller task ended abnormally.");
		}
	}
}

impl Drop for Poller {
	fn drop(&mut self) {
		self.shutdown.cancel();
	}
}

async fn run_poller(
	store: ContentStore,
	api: Arc<dyn ContentApi>,
	interval: Duration,
	shutdown: CancellationToken,
) {
	let mut changes = store.subscribe();
	let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);

	tracing::info!(interval_ms, "Poller started.");

	loop {
		changes.borrow_and_update();

		if !store.has_transient() {
			tokio::select! {
				biased;
				_ = shutdown.cancelled() => break,
				changed = changes.changed() => {
					if changed.is_err() {
						break;
					}

					continue;
				},
			}
		}

		match wait_for_tick(&store, &mut changes, interval, &shutdown).await {
			Tick::Fire => {},
			Tick::Disarmed => continue,
			Tick::Stop => break,
		}

		tokio::select! {
			biased;
			_ = shutdown.cancelled() => break,
			res = store.refresh(api.as_ref()) => match res {
				Ok(count) => tracing::debug!(count, "Background refresh finished."),
				Err(err) => tracing::warn!(error = %err, "Background refresh failed."),
			},
		}
	}

	tracing::info!("Poller stopped.");
}

enum Tick {
	Fire,
	Disarmed,
	Stop,
}

async fn wait_for_tick(
	store: &ContentStore,
	changes: &mut watch::Receiver<u64>,
	interval: Duration,
	shutdown: &CancellationToken,
) -> Tick {
	let deadline = Instant::now() + interval;

	loop {
		tokio::select! {
			biased;
			_ = shutdown.cancelled() => return Tick::Stop,
			_ = time::sleep_until(deadline) => return Tick::Fire,
			changed = changes.changed() => {
				if changed.is_err() {
					return Tick::Stop;
				}
				if !store.has_transient() {
					tracing::debug!("No transient content left; poller disarmed.");

					return Tick::Disarmed;
				}
			},
		}
	}
}
