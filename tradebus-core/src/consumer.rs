//! Queue-backed channel consumers.
//!
//! A [`Consumer`] owns a queue and a [`Sink`]. Producers enqueue payloads,
//! the consumer's dispatch loop drains the queue one payload at a time and
//! hands each one to the sink. A failing or panicking sink is logged and
//! the loop goes on.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, trace};
use tradebus_sdk::objects::ChannelPayload;
use uuid::Uuid;

use crate::error::{ChannelError, SinkError};
use crate::filter::FilterSet;

/// Consumer queue capacity used when none is configured. `0` is unbounded.
pub const DEFAULT_QUEUE_SIZE: usize = 0;

/// Destination of the payloads a consumer receives.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn deliver(&self, payload: ChannelPayload) -> Result<(), SinkError>;
}

/// A sink backed by an async callback.
pub struct CallbackSink<F> {
    callback: F,
}

#[async_trait]
impl<F, Fut> Sink for CallbackSink<F>
where
    F: Fn(ChannelPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SinkError>> + Send,
{
    async fn deliver(&self, payload: ChannelPayload) -> Result<(), SinkError> {
        (self.callback)(payload).await
    }
}

/// Wrap an async callback into a sink.
pub fn callback<F, Fut>(callback: F) -> Arc<dyn Sink>
where
    F: Fn(ChannelPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SinkError>> + Send + 'static,
{
    Arc::new(CallbackSink { callback })
}

#[async_trait]
impl Sink for mpsc::UnboundedSender<ChannelPayload> {
    async fn deliver(&self, payload: ChannelPayload) -> Result<(), SinkError> {
        self.send(payload).map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl Sink for mpsc::Sender<ChannelPayload> {
    async fn deliver(&self, payload: ChannelPayload) -> Result<(), SinkError> {
        self.send(payload).await.map_err(|_| SinkError::Closed)
    }
}

/// A raw sink: payloads are forwarded into a stream the caller drains.
pub fn queue_sink() -> (Arc<dyn Sink>, UnboundedReceiverStream<ChannelPayload>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), UnboundedReceiverStream::new(rx))
}

enum QueueSender {
    Bounded(mpsc::Sender<ChannelPayload>),
    Unbounded(mpsc::UnboundedSender<ChannelPayload>),
}

enum QueueReceiver {
    Bounded(mpsc::Receiver<ChannelPayload>),
    Unbounded(mpsc::UnboundedReceiver<ChannelPayload>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<ChannelPayload> {
        match self {
            QueueReceiver::Bounded(rx) => rx.recv().await,
            QueueReceiver::Unbounded(rx) => rx.recv().await,
        }
    }
}

fn queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
    }
}

/// Counts payloads that were enqueued but not yet handled by the sink.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    /// Count one payload; the count is undone if the guard is dropped
    /// before [`InFlightGuard::commit`].
    fn begin(&self) -> InFlightGuard<'_> {
        self.count.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            in_flight: self,
            committed: false,
        }
    }

    fn done(&self) {
        // saturating: `reset` may already have zeroed the count
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1));
        if previous == Ok(1) {
            self.idle.notify_waiters();
        }
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Release);
        self.idle.notify_waiters();
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    committed: bool,
}

impl InFlightGuard<'_> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.in_flight.done();
        }
    }
}

/// A queue-backed subscriber with one immutable filter set.
///
/// Lifecycle: [`register`](Consumer::register) stores the filter and sink,
/// [`run`](Consumer::run) starts the dispatch loop, [`stop`](Consumer::stop)
/// ends it. A stopped consumer cannot be restarted.
pub struct Consumer {
    id: Uuid,
    filters: FilterSet,
    capacity: usize,
    sink: Arc<dyn Sink>,
    sender: QueueSender,
    receiver: Mutex<Option<QueueReceiver>>,
    task: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    stopped: AtomicBool,
    in_flight: Arc<InFlight>,
}

impl Consumer {
    /// Create a consumer. Delivery does not start until [`run`](Consumer::run).
    ///
    /// `capacity` bounds the queue; `0` makes it unbounded. When a bounded
    /// queue is full, [`enqueue`](Consumer::enqueue) waits for room.
    pub fn register(filters: FilterSet, sink: Arc<dyn Sink>, capacity: usize) -> Self {
        let (sender, receiver) = queue(capacity);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            id: Uuid::now_v7(),
            filters,
            capacity,
            sink,
            sender,
            receiver: Mutex::new(Some(receiver)),
            task: Mutex::new(None),
            shutdown_tx,
            stopped: AtomicBool::new(false),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn is_running(&self) -> bool {
        !self.is_stopped()
            && self
                .receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Payloads enqueued and not yet handed to the sink.
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Start the dispatch loop on the current tokio runtime.
    ///
    /// Starting twice is an error, so is starting a stopped consumer.
    pub fn run(&self) -> Result<(), ChannelError> {
        if self.is_stopped() {
            return Err(ChannelError::ConsumerStopped);
        }
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ChannelError::ConsumerAlreadyRunning)?;

        let handle = tokio::spawn(dispatch_loop(
            self.id,
            Arc::clone(&self.sink),
            receiver,
            self.shutdown_tx.subscribe(),
            Arc::clone(&self.in_flight),
        ));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        debug!(consumer = %self.id, filters = %self.filters, "Consumer started");
        Ok(())
    }

    /// Append a payload to the queue.
    ///
    /// Waits for room when the queue is bounded and full. Fails with
    /// [`ChannelError::ConsumerStopped`] once the consumer is stopped.
    pub async fn enqueue(&self, payload: ChannelPayload) -> Result<(), ChannelError> {
        if self.is_stopped() {
            return Err(ChannelError::ConsumerStopped);
        }
        let guard = self.in_flight.begin();
        let sent = match &self.sender {
            QueueSender::Bounded(tx) => tx.send(payload).await.is_ok(),
            QueueSender::Unbounded(tx) => tx.send(payload).is_ok(),
        };
        if !sent {
            return Err(ChannelError::ConsumerStopped);
        }
        guard.commit();
        Ok(())
    }

    /// Wait until every enqueued payload went through the sink.
    ///
    /// Returns immediately for a stopped consumer.
    pub async fn drained(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Stop the dispatch loop. Payloads still queued are discarded.
    ///
    /// Idempotent. Must not be awaited on from the consumer's own sink
    /// through [`Consumer::stopped`], which would wait on itself.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown_tx.send_replace(true);
        // never started: drop the queue so blocked producers wake up
        drop(
            self.receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        self.in_flight.reset();
        debug!(consumer = %self.id, "Consumer stopped");
    }

    /// Wait for the dispatch loop to exit after [`stop`](Consumer::stop).
    pub async fn stopped(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("id", &self.id)
            .field("filters", &self.filters)
            .field("capacity", &self.capacity)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

async fn dispatch_loop(
    id: Uuid,
    sink: Arc<dyn Sink>,
    mut receiver: QueueReceiver,
    mut shutdown_rx: watch::Receiver<bool>,
    in_flight: Arc<InFlight>,
) {
    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            payload = receiver.recv() => {
                let Some(payload) = payload else {
                    break;
                };
                let channel = payload.channel();
                match AssertUnwindSafe(sink.deliver(payload)).catch_unwind().await {
                    Ok(Ok(())) => trace!(consumer = %id, %channel, "Payload delivered"),
                    Ok(Err(e)) => error!(
                        consumer = %id,
                        %channel,
                        error = %e,
                        "Consumer sink failed"
                    ),
                    Err(_) => error!(consumer = %id, %channel, "Consumer sink panicked"),
                }
                in_flight.done();
            }
        }
    }
    // later enqueues now fail; those already accepted are discarded
    drop(receiver);
    in_flight.reset();
    debug!(consumer = %id, "Dispatch loop exited");
}
