//! Fan-out scopes for concurrent provider calls.
//!
//! A [`FanOut`] owns every task spawned for one operation together with the
//! queue those tasks report into. The queue is sized to the number of tasks,
//! so a task never waits to deliver its result. The scope then completes in
//! one of two ways:
//!
//! - [`FanOut::drain`] waits for every task and returns every delivered value.
//! - [`FanOut::first`] returns the first delivered value and hands the
//!   remaining tasks to a [`StragglerPolicy`].

use chainstate_config::StragglerPolicy;
use std::future::Future;
use std::sync::OnceLock;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Scope owning the concurrent tasks of a single operation.
pub(crate) struct FanOut<T> {
	tasks: JoinSet<()>,
	sender: mpsc::Sender<T>,
	receiver: mpsc::Receiver<T>,
}

impl<T: Send + 'static> FanOut<T> {
	/// Creates a scope whose queue holds `capacity` results.
	pub(crate) fn with_capacity(capacity: usize) -> Self {
		let (sender, receiver) = mpsc::channel(capacity.max(1));
		Self {
			tasks: JoinSet::new(),
			sender,
			receiver,
		}
	}

	/// Spawns a task. A `Some` output is delivered to the queue; `None` means
	/// the task has nothing to report.
	pub(crate) fn spawn<F>(&mut self, task: F)
	where
		F: Future<Output = Option<T>> + Send + 'static,
	{
		let sender = self.sender.clone();
		self.tasks.spawn(async move {
			if let Some(value) = task.await {
				// Fails only once the scope stopped listening
				let _ = sender.send(value).await;
			}
		});
	}

	/// Waits for every task, returning all delivered values in arrival order.
	///
	/// A task that panicked or was cancelled is logged and contributes nothing.
	pub(crate) async fn drain(self) -> Vec<T> {
		let Self {
			mut tasks,
			sender,
			mut receiver,
		} = self;
		drop(sender);

		let mut values = Vec::with_capacity(tasks.len());
		while let Some(value) = receiver.recv().await {
			values.push(value);
		}
		while let Some(joined) = tasks.join_next().await {
			if let Err(e) = joined {
				tracing::error!(error = %e, "Fan-out task ended without reporting");
			}
		}
		values
	}

	/// Returns the first delivered value, or `None` if every task finished
	/// without reporting or `deadline` passed first.
	///
	/// Tasks still running afterwards are detached or aborted per `stragglers`.
	/// Detached tasks keep running until their own calls return; whatever they
	/// deliver is discarded.
	pub(crate) async fn first(self, deadline: Instant, stragglers: StragglerPolicy) -> Option<T> {
		let Self {
			mut tasks,
			sender,
			mut receiver,
		} = self;
		drop(sender);

		let first = tokio::time::timeout_at(deadline, receiver.recv())
			.await
			.unwrap_or(None);

		let remaining = tasks.len();
		match stragglers {
			StragglerPolicy::Detach => tasks.detach_all(),
			StragglerPolicy::Abort => tasks.abort_all(),
		}
		tracing::trace!(remaining, policy = ?stragglers, "Fan-out scope closed early");
		first
	}
}

/// Write-once record of the first provider that accepted a broadcast.
///
/// Shared between the broadcast tasks and the caller, who can await the
/// first acceptance while the coordinator is still draining the others.
#[derive(Debug, Default)]
pub struct FirstSuccess {
	provider: OnceLock<String>,
	notify: Notify,
}

impl FirstSuccess {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `provider` as the first success. Only the first call has any
	/// effect; returns whether this call was it.
	pub fn record(&self, provider: &str) -> bool {
		let recorded = self.provider.set(provider.to_string()).is_ok();
		if recorded {
			self.notify.notify_waiters();
		}
		recorded
	}

	/// Name of the first provider that succeeded, if any has.
	pub fn get(&self) -> Option<&str> {
		self.provider.get().map(String::as_str)
	}

	/// Waits until a success is recorded.
	///
	/// Never completes if every provider fails, so callers should race it
	/// against the broadcast itself.
	pub async fn wait(&self) -> &str {
		loop {
			// Registered before the check so a concurrent record is not missed
			let notified = self.notify.notified();
			if let Some(provider) = self.get() {
				return provider;
			}
			notified.await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;
	use std::time::Duration;

	#[tokio::test]
	async fn test_drain_collects_every_result() {
		let mut scope = FanOut::with_capacity(3);
		for i in 0..3u64 {
			scope.spawn(async move {
				tokio::time::sleep(Duration::from_millis(10 * (3 - i))).await;
				Some(i)
			});
		}
		let mut values = scope.drain().await;
		values.sort();
		assert_eq!(values, vec![0, 1, 2]);
	}

	#[tokio::test]
	async fn test_drain_skips_silent_and_panicking_tasks() {
		let mut scope = FanOut::with_capacity(3);
		scope.spawn(async { Some(1) });
		scope.spawn(async { None });
		scope.spawn(async {
			if true {
				panic!("provider task failed");
			}
			Some(3)
		});
		assert_eq!(scope.drain().await, vec![1]);
	}

	#[tokio::test]
	async fn test_first_returns_fastest() {
		let mut scope = FanOut::with_capacity(2);
		scope.spawn(async {
			tokio::time::sleep(Duration::from_millis(200)).await;
			Some("slow")
		});
		scope.spawn(async {
			tokio::time::sleep(Duration::from_millis(5)).await;
			Some("fast")
		});
		let deadline = Instant::now() + Duration::from_secs(5);
		assert_eq!(scope.first(deadline, StragglerPolicy::Detach).await, Some("fast"));
	}

	#[tokio::test]
	async fn test_first_none_when_nobody_reports() {
		let mut scope: FanOut<u8> = FanOut::with_capacity(2);
		scope.spawn(async { None });
		scope.spawn(async { None });
		let deadline = Instant::now() + Duration::from_secs(5);
		assert_eq!(scope.first(deadline, StragglerPolicy::Detach).await, None);
	}

	#[tokio::test(start_paused = true)]
	async fn test_first_honours_deadline() {
		let mut scope = FanOut::with_capacity(1);
		scope.spawn(async {
			tokio::time::sleep(Duration::from_secs(60)).await;
			Some(1)
		});
		let deadline = Instant::now() + Duration::from_secs(1);
		assert_eq!(scope.first(deadline, StragglerPolicy::Abort).await, None);
	}

	#[tokio::test]
	async fn test_detached_stragglers_keep_running() {
		let finished = Arc::new(AtomicUsize::new(0));
		let mut scope = FanOut::with_capacity(2);
		scope.spawn(async { Some(()) });
		let counter = finished.clone();
		scope.spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			counter.fetch_add(1, Ordering::SeqCst);
			Some(())
		});

		let deadline = Instant::now() + Duration::from_secs(5);
		assert!(scope.first(deadline, StragglerPolicy::Detach).await.is_some());
		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(finished.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_aborted_stragglers_stop() {
		let finished = Arc::new(AtomicUsize::new(0));
		let mut scope = FanOut::with_capacity(2);
		scope.spawn(async { Some(()) });
		let counter = finished.clone();
		scope.spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			counter.fetch_add(1, Ordering::SeqCst);
			Some(())
		});

		let deadline = Instant::now() + Duration::from_secs(5);
		assert!(scope.first(deadline, StragglerPolicy::Abort).await.is_some());
		tokio::time::sleep(Duration::from_millis(100)).await;
		assert_eq!(finished.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn test_first_success_records_once() {
		let latch = FirstSuccess::new();
		assert_eq!(latch.get(), None);
		assert!(latch.record("Taal"));
		assert!(!latch.record("Mempool"));
		assert_eq!(latch.get(), Some("Taal"));
	}

	#[tokio::test]
	async fn test_first_success_wakes_waiter() {
		let latch = Arc::new(FirstSuccess::new());
		let writer = latch.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(10)).await;
			writer.record("explorer");
		});
		let provider = tokio::time::timeout(Duration::from_secs(5), latch.wait())
			.await
			.unwrap();
		assert_eq!(provider, "explorer");
	}
}
