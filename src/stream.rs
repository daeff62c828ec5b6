//! Result streamer: runs a pager on its own task and hands items to the caller one at a time.
//!
//! Each list call owns a bounded channel (capacity 1) so a slow consumer throttles paging. Every
//! send races the caller's [`CancellationToken`]; cancelling, dropping the stream, the last page,
//! the first error, and a panic in the producer all end the task and close the channel.

// std
use std::panic::AssertUnwindSafe;
// crates.io
use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	http::{CollectorHttpClient, TransportErrorMapper},
	obs::{OpKind, OpOutcome, OpSpan},
	paging::{PageEnvelope, Pager},
	request::ApiRequest,
	sender::ApiClient,
};

const CHANNEL_CAPACITY: usize = 1;

/// One streamed item or the error that ended the stream.
#[derive(Debug)]
pub struct ListResult<T> {
	/// Object the item was listed under (group, app, subscription, scope, …), for nested lists.
	pub parent_id: Option<String>,
	/// The item, or the failure that terminated the list.
	pub result: Result<T>,
}
impl<T> ListResult<T> {
	/// Returns the item when the result is `Ok`.
	pub fn ok(self) -> Option<T> {
		self.result.ok()
	}
}

/// Receiving half of a list call.
///
/// Drain with [`ListStream::recv`] until it yields `None`. [`ListStream::join`] drops the
/// receiver and waits for the producer task to finish.
#[derive(Debug)]
pub struct ListStream<T> {
	receiver: mpsc::Receiver<ListResult<T>>,
	task: JoinHandle<()>,
}
impl<T> ListStream<T> {
	/// Receives the next result; `None` once the producer has finished.
	pub async fn recv(&mut self) -> Option<ListResult<T>> {
		self.receiver.recv().await
	}

	/// Drains the stream into a vector.
	pub async fn collect(mut self) -> Vec<ListResult<T>> {
		let mut results = Vec::new();

		while let Some(result) = self.receiver.recv().await {
			results.push(result);
		}

		results
	}

	/// Returns `true` once the producer task has completed.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	/// Drops the receiver and waits for the producer task to exit.
	pub async fn join(self) {
		let Self { receiver, task } = self;

		drop(receiver);

		// The producer never propagates its own panics, so only runtime shutdown errors here.
		let _ = task.await;
	}
}

/// Spawns a producer that pages through `first` and streams every item.
///
/// Must be called from within a tokio runtime.
pub fn spawn_list<C, M, E>(
	client: Arc<ApiClient<C, M>>,
	first: ApiRequest,
	parent_id: Option<String>,
	cancel: &CancellationToken,
) -> ListStream<E::Item>
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	E: PageEnvelope,
{
	let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
	let emitter = Emitter { sender, parent_id, cancel: cancel.clone() };
	let span = OpSpan::start(OpKind::List, first.url().path());
	let pager = Pager::<C, M, E>::new(client, first);
	let outcome = span.clone();
	let task = tokio::spawn(span.instrument(async move {
		match AssertUnwindSafe(produce(pager, emitter)).catch_unwind().await {
			Ok(true) => outcome.finish(OpOutcome::Success),
			Ok(false) => outcome.finish(OpOutcome::Failure),
			Err(panic) => {
				outcome.finish(OpOutcome::Failure);

				#[cfg(feature = "tracing")]
				tracing::error!(panic = panic_message(panic.as_ref()), "list producer panicked");
				#[cfg(not(feature = "tracing"))]
				let _ = panic;
			},
		}
	}));

	ListStream { receiver, task }
}

/// Returns a stream that yields `error` once and closes.
///
/// Used when a list request cannot even be built (for example an unparsable path).
pub fn spawn_error<T>(error: Error, parent_id: Option<String>) -> ListStream<T>
where
	T: 'static + Send,
{
	let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
	let task = tokio::spawn(async move {
		OpSpan::start(OpKind::List, "unbuildable").finish(OpOutcome::Failure);

		let _ = sender.send(ListResult { parent_id, result: Err(error) }).await;
	});

	ListStream { receiver, task }
}

struct Emitter<T> {
	sender: mpsc::Sender<ListResult<T>>,
	parent_id: Option<String>,
	cancel: CancellationToken,
}
impl<T> Emitter<T> {
	/// Returns `false` when the caller cancelled or went away.
	async fn emit(&self, result: Result<T>) -> bool {
		let item = ListResult { parent_id: self.parent_id.clone(), result };

		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => false,
			sent = self.sender.send(item) => sent.is_ok(),
		}
	}

	fn is_stopped(&self) -> bool {
		self.cancel.is_cancelled() || self.sender.is_closed()
	}
}

/// Returns `true` when every page was delivered without error.
async fn produce<C, M, E>(mut pager: Pager<C, M, E>, emitter: Emitter<E::Item>) -> bool
where
	C: ?Sized + CollectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
	E: PageEnvelope,
{
	loop {
		if emitter.is_stopped() {
			return false;
		}

		let page = tokio::select! {
			biased;
			_ = emitter.cancel.cancelled() => return false,
			_ = emitter.sender.closed() => return false,
			page = pager.next_page() => page,
		};
		let items = match page {
			None => return true,
			Some(Ok(items)) => items,
			Some(Err(e)) => {
				emitter.emit(Err(e)).await;

				return false;
			},
		};

		for item in items {
			if !emitter.emit(Ok(item)).await {
				return false;
			}
		}
	}
}

#[cfg(feature = "tracing")]
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
	payload
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("non-string panic payload")
}
