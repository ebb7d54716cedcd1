/// Category of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyKind {
	Loading,
	Success,
	Error,
}

/// Sink for user-facing notifications. Rendering is the implementor's concern.
pub trait Notifier
where
	Self: Send + Sync,
{
	fn notify(&self, kind: NotifyKind, message: &str);
}

/// Forwards notifications to the log.
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify(&self, kind: NotifyKind, message: &str) {
		match kind {
			NotifyKind::Loading => tracing::debug!(notification = message, "Loading."),
			NotifyKind::Success => tracing::info!(notification = message, "Success."),
			NotifyKind::Error => tracing::warn!(notification = message, "Error."),
		}
	}
}
