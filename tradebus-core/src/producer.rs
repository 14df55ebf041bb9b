//! Channel producers.
//!
//! A producer never keeps consumer references: every emission asks its
//! [`Channel`] for the consumers matching the payload at that moment.
//! Pausing and resuming is driven by the channel, see
//! [`Channel::register_producer`] and [`Channel::new_consumer`].

use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, trace};
use tradebus_sdk::objects::ChannelPayload;

use crate::channel::Channel;
use crate::error::ChannelError;
use crate::filter::FilterSet;

/// Active/paused flag of a producer. Producers start paused, like the
/// channel that owns them.
#[derive(Debug)]
pub struct ProducerState {
    paused: AtomicBool,
}

impl ProducerState {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(true),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Set the flag. Returns `true` only if the state actually changed.
    pub fn transition(&self, paused: bool) -> bool {
        self.paused.swap(paused, Ordering::AcqRel) != paused
    }
}

impl Default for ProducerState {
    fn default() -> Self {
        Self::new()
    }
}

/// The data source of a channel.
///
/// `pause` and `resume` are idempotent: the hooks only run on an actual
/// transition. Domain producers override [`on_pause`](Producer::on_pause)
/// and [`on_resume`](Producer::on_resume) to release or re-acquire upstream
/// resources. None of these may suspend.
pub trait Producer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn state(&self) -> &ProducerState;

    fn on_pause(&self) {}

    fn on_resume(&self) {}

    fn pause(&self) {
        if self.state().transition(true) {
            debug!(producer = self.name(), "Pausing...");
            self.on_pause();
        }
    }

    fn resume(&self) {
        if self.state().transition(false) {
            debug!(producer = self.name(), "Resuming...");
            self.on_resume();
        }
    }

    fn is_paused(&self) -> bool {
        self.state().is_paused()
    }
}

/// Relay producer used by every exchange channel without domain computation.
///
/// Also the building block of domain producers, which wrap it and add their
/// own `perform` step in front of [`send`](ExchangeProducer::send).
pub struct ExchangeProducer {
    channel: Arc<Channel>,
    state: ProducerState,
    name: String,
}

impl ExchangeProducer {
    pub fn new(channel: Arc<Channel>) -> Self {
        let name = format!("{}Producer[{}]", channel.name(), channel.exchange());
        Self {
            channel,
            state: ProducerState::new(),
            name,
        }
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Enqueue `payload` into every consumer matching its routing keys.
    ///
    /// Matching is recomputed on every call. Returns the number of consumers
    /// the payload was enqueued into.
    pub async fn send(&self, payload: ChannelPayload) -> Result<usize, ChannelError> {
        self.channel.dispatch(payload).await
    }

    /// Upstream entry point.
    ///
    /// Drops the payload without sending when no consumer would receive it.
    /// Send failures are logged and the update is dropped.
    pub async fn push(&self, payload: ChannelPayload) {
        let target = FilterSet::for_payload(&payload);
        if !self.channel.has_matching_consumers(&target).await {
            trace!(producer = %self.name, %target, "No matching consumer, update dropped");
            return;
        }
        if let Err(e) = self.send(payload).await {
            error!(producer = %self.name, error = %e, "Failed to send update");
        }
    }
}

impl Producer for ExchangeProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &ProducerState {
        &self.state
    }
}

impl Processor<ChannelPayload> for ExchangeProducer {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, payload: ChannelPayload) -> Result<(), Infallible> {
        self.push(payload).await;
        Ok(())
    }
}
