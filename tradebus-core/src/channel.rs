//! Exchange channels.
//!
//! A [`Channel`] is the event bus for one (exchange, channel name) pair. It
//! owns the producers feeding it and the consumers listening to it, and it
//! keeps the producers paused while no consumer listens.
//!
//! Consumer-set mutations and the pause recomputation that follows them run
//! under the same write lock, so an emission either sees the consumer set
//! before the mutation or after it, never in between.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use tradebus_sdk::config::ChannelSettings;
use tradebus_sdk::objects::{ChannelName, ChannelPayload, ExchangeName, Symbol, TimeFrame};
use uuid::Uuid;

use crate::consumer::{Consumer, Sink};
use crate::error::ChannelError;
use crate::filter::{FilterKey, FilterSet, FilterValue, matches};
use crate::producer::Producer;

/// What a new consumer subscribes to.
///
/// Unset keys default to the wildcard, except `symbol` on channels
/// configured to require one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerFilterSpec {
    pub symbol: Option<Symbol>,
    pub time_frame: Option<TimeFrame>,
    /// Queue capacity override, `Some(0)` for unbounded.
    pub queue_size: Option<usize>,
}

impl ConsumerFilterSpec {
    /// Every symbol, every time frame.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn symbol(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Self::default()
        }
    }

    pub fn with_time_frame(mut self, time_frame: TimeFrame) -> Self {
        self.time_frame = Some(time_frame);
        self
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = Some(queue_size);
        self
    }
}

/// Point-in-time view of a channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStatus {
    pub exchange: ExchangeName,
    pub channel: ChannelName,
    pub is_paused: bool,
    pub consumers: usize,
    pub producers: usize,
}

struct ChannelInner {
    consumers: Vec<Arc<Consumer>>,
    producers: Vec<Arc<dyn Producer>>,
    is_paused: bool,
}

pub struct Channel {
    exchange: ExchangeName,
    name: ChannelName,
    queue_size: usize,
    symbol_required: bool,
    inner: RwLock<ChannelInner>,
}

impl Channel {
    /// Create a paused channel with no producer and no consumer.
    pub fn new(
        exchange: impl Into<ExchangeName>,
        name: ChannelName,
        settings: &ChannelSettings,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            name,
            queue_size: settings.queue_size,
            symbol_required: settings.is_symbol_required(name),
            inner: RwLock::new(ChannelInner {
                consumers: Vec::new(),
                producers: Vec::new(),
                is_paused: true,
            }),
        }
    }

    pub fn exchange(&self) -> &ExchangeName {
        &self.exchange
    }

    pub fn name(&self) -> ChannelName {
        self.name
    }

    /// Whether consumers must name a symbol to subscribe.
    pub fn symbol_required(&self) -> bool {
        self.symbol_required
    }

    pub async fn is_paused(&self) -> bool {
        self.inner.read().await.is_paused
    }

    /// Attach a producer, aligned with the current pause state.
    pub async fn register_producer(&self, producer: Arc<dyn Producer>) {
        let mut inner = self.inner.write().await;
        if inner.is_paused {
            producer.pause();
        } else {
            producer.resume();
        }
        debug!(
            exchange = %self.exchange,
            channel = %self.name,
            producer = producer.name(),
            "Producer registered"
        );
        inner.producers.push(producer);
    }

    pub async fn producers(&self) -> Vec<Arc<dyn Producer>> {
        self.inner.read().await.producers.clone()
    }

    /// Normalize a subscription into the filter set stored on the consumer.
    pub fn consumer_filters(&self, spec: &ConsumerFilterSpec) -> Result<FilterSet, ChannelError> {
        let symbol = match &spec.symbol {
            Some(symbol) => FilterValue::from(symbol),
            None if self.symbol_required => {
                return Err(ChannelError::MissingFilter {
                    channel: self.name,
                    key: FilterKey::Symbol,
                });
            }
            None => FilterValue::Wildcard,
        };
        let mut filters = FilterSet::new().with(FilterKey::Symbol, symbol);
        if self.name.with_time_frame() {
            let time_frame = spec
                .time_frame
                .map_or(FilterValue::Wildcard, FilterValue::from);
            filters.insert(FilterKey::TimeFrame, time_frame);
        }
        Ok(filters)
    }

    /// Register and start a consumer built by [`Consumer::register`].
    pub async fn new_consumer(
        &self,
        sink: Arc<dyn Sink>,
        spec: ConsumerFilterSpec,
    ) -> Result<Arc<Consumer>, ChannelError> {
        self.new_consumer_with(sink, spec, Consumer::register).await
    }

    /// Register and start a consumer built by `factory`.
    ///
    /// The factory receives the normalized filter set, the sink and the
    /// queue capacity. Once the consumer runs, the pause state of the
    /// channel is recomputed before the write lock is released.
    pub async fn new_consumer_with<F>(
        &self,
        sink: Arc<dyn Sink>,
        spec: ConsumerFilterSpec,
        factory: F,
    ) -> Result<Arc<Consumer>, ChannelError>
    where
        F: FnOnce(FilterSet, Arc<dyn Sink>, usize) -> Consumer,
    {
        let filters = self.consumer_filters(&spec)?;
        let capacity = spec.queue_size.unwrap_or(self.queue_size);
        let consumer = Arc::new(factory(filters, sink, capacity));

        let mut inner = self.inner.write().await;
        consumer.run()?;
        inner.consumers.push(Arc::clone(&consumer));
        self.check_producers_state(&mut inner);
        debug!(
            exchange = %self.exchange,
            channel = %self.name,
            consumer = %consumer.id(),
            filters = %consumer.filters(),
            "Consumer registered"
        );
        Ok(consumer)
    }

    /// Stop and remove a consumer. Returns `false` if it was not registered.
    pub async fn remove_consumer(&self, consumer_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let Some(index) = inner.consumers.iter().position(|c| c.id() == consumer_id) else {
            return false;
        };
        let consumer = inner.consumers.remove(index);
        consumer.stop();
        self.check_producers_state(&mut inner);
        debug!(
            exchange = %self.exchange,
            channel = %self.name,
            consumer = %consumer_id,
            "Consumer removed"
        );
        true
    }

    /// Consumers matching `target`, in registration order.
    pub async fn get_filtered_consumers(&self, target: &FilterSet) -> Vec<Arc<Consumer>> {
        self.inner
            .read()
            .await
            .consumers
            .iter()
            .filter(|c| matches(c.filters(), target))
            .cloned()
            .collect()
    }

    pub async fn has_matching_consumers(&self, target: &FilterSet) -> bool {
        self.inner
            .read()
            .await
            .consumers
            .iter()
            .any(|c| matches(c.filters(), target))
    }

    pub async fn consumer_count(&self) -> usize {
        self.inner.read().await.consumers.len()
    }

    pub async fn status(&self) -> ChannelStatus {
        let inner = self.inner.read().await;
        ChannelStatus {
            exchange: self.exchange.clone(),
            channel: self.name,
            is_paused: inner.is_paused,
            consumers: inner.consumers.len(),
            producers: inner.producers.len(),
        }
    }

    /// Enqueue `payload` into every consumer matching its routing keys,
    /// first-registered first. Returns how many consumers got it.
    ///
    /// A consumer stopped between the lookup and the enqueue is skipped.
    pub(crate) async fn dispatch(&self, payload: ChannelPayload) -> Result<usize, ChannelError> {
        if payload.channel() != self.name {
            return Err(ChannelError::PayloadMismatch {
                channel: self.name,
                payload: payload.channel(),
            });
        }
        let consumers = self
            .get_filtered_consumers(&FilterSet::for_payload(&payload))
            .await;
        let mut delivered = 0;
        for consumer in consumers {
            match consumer.enqueue(payload.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => debug!(
                    exchange = %self.exchange,
                    channel = %self.name,
                    consumer = %consumer.id(),
                    error = %e,
                    "Skipping consumer"
                ),
            }
        }
        Ok(delivered)
    }

    /// Stop every consumer and release every producer.
    ///
    /// Producers hold the channel, the channel holds its producers: this is
    /// what breaks the cycle on teardown.
    pub async fn stop(&self) {
        let mut inner = self.inner.write().await;
        for consumer in inner.consumers.drain(..) {
            consumer.stop();
        }
        for producer in inner.producers.drain(..) {
            producer.pause();
        }
        inner.is_paused = true;
        info!(exchange = %self.exchange, channel = %self.name, "Channel stopped");
    }

    fn check_producers_state(&self, inner: &mut ChannelInner) {
        let any = FilterSet::any();
        let has_consumers = inner.consumers.iter().any(|c| matches(c.filters(), &any));
        if !has_consumers && !inner.is_paused {
            inner.is_paused = true;
            for producer in &inner.producers {
                producer.pause();
            }
            debug!(exchange = %self.exchange, channel = %self.name, "Channel paused");
        } else if has_consumers && inner.is_paused {
            inner.is_paused = false;
            for producer in &inner.producers {
                producer.resume();
            }
            debug!(exchange = %self.exchange, channel = %self.name, "Channel resumed");
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("exchange", &self.exchange)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::queue_sink;
    use crate::producer::ProducerState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProducer {
        state: ProducerState,
        pauses: AtomicUsize,
        resumes: AtomicUsize,
    }

    impl Producer for CountingProducer {
        fn name(&self) -> &str {
            "counting"
        }

        fn state(&self) -> &ProducerState {
            &self.state
        }

        fn on_pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn channel(name: ChannelName) -> Channel {
        Channel::new("binance", name, &ChannelSettings::default())
    }

    #[tokio::test]
    async fn test_first_consumer_resumes_last_consumer_pauses() {
        let channel = channel(ChannelName::Ticker);
        let producers: Vec<Arc<CountingProducer>> =
            (0..2).map(|_| Arc::new(CountingProducer::default())).collect();
        for producer in &producers {
            channel.register_producer(producer.clone()).await;
        }
        assert!(channel.is_paused().await);

        let (sink, _stream) = queue_sink();
        let first = channel
            .new_consumer(sink.clone(), ConsumerFilterSpec::all())
            .await
            .unwrap();
        let second = channel
            .new_consumer(sink, ConsumerFilterSpec::symbol("BTC/USDT"))
            .await
            .unwrap();
        assert!(!channel.is_paused().await);
        for producer in &producers {
            assert_eq!(producer.resumes.load(Ordering::SeqCst), 1);
            assert!(!producer.is_paused());
        }

        assert!(channel.remove_consumer(first.id()).await);
        assert!(!channel.is_paused().await);
        assert!(channel.remove_consumer(second.id()).await);
        assert!(channel.is_paused().await);
        assert!(second.is_stopped());
        for producer in &producers {
            assert_eq!(producer.pauses.load(Ordering::SeqCst), 1);
            assert!(producer.is_paused());
        }
        assert!(!channel.remove_consumer(second.id()).await);
    }

    #[tokio::test]
    async fn test_late_producer_follows_channel_state() {
        let channel = channel(ChannelName::Ticker);
        let (sink, _stream) = queue_sink();
        channel
            .new_consumer(sink, ConsumerFilterSpec::all())
            .await
            .unwrap();

        let producer = Arc::new(CountingProducer::default());
        channel.register_producer(producer.clone()).await;
        assert!(!producer.is_paused());
        assert_eq!(channel.status().await.producers, 1);
    }

    #[test]
    fn test_filter_normalization() {
        let ticker = channel(ChannelName::Ticker);
        let filters = ticker.consumer_filters(&ConsumerFilterSpec::all()).unwrap();
        assert_eq!(filters.get(FilterKey::Symbol), Some(&FilterValue::Wildcard));
        // time frame ignored on channels not filtered by it
        let filters = ticker
            .consumer_filters(&ConsumerFilterSpec::all().with_time_frame(TimeFrame::OneHour))
            .unwrap();
        assert_eq!(filters.get(FilterKey::TimeFrame), None);

        let ohlcv = channel(ChannelName::Ohlcv);
        let filters = ohlcv
            .consumer_filters(&ConsumerFilterSpec::symbol("BTC/USDT"))
            .unwrap();
        assert_eq!(
            filters.get(FilterKey::Symbol),
            Some(&FilterValue::exact("BTC/USDT"))
        );
        assert_eq!(filters.get(FilterKey::TimeFrame), Some(&FilterValue::Wildcard));
    }

    #[test]
    fn test_symbol_required() {
        let settings = ChannelSettings::new(0, vec![ChannelName::OrderBook]);
        let channel = Channel::new("binance", ChannelName::OrderBook, &settings);
        assert!(channel.symbol_required());
        assert!(!Channel::new("binance", ChannelName::Ticker, &settings).symbol_required());
        assert!(matches!(
            channel.consumer_filters(&ConsumerFilterSpec::all()),
            Err(ChannelError::MissingFilter {
                key: FilterKey::Symbol,
                ..
            })
        ));
        assert!(
            channel
                .consumer_filters(&ConsumerFilterSpec::symbol("ETH/BTC"))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_stop_clears_everything() {
        let channel = channel(ChannelName::Balance);
        let producer = Arc::new(CountingProducer::default());
        channel.register_producer(producer.clone()).await;
        let (sink, _stream) = queue_sink();
        let consumer = channel
            .new_consumer(sink, ConsumerFilterSpec::all())
            .await
            .unwrap();

        channel.stop().await;
        assert!(consumer.is_stopped());
        assert!(producer.is_paused());
        let status = channel.status().await;
        assert!(status.is_paused);
        assert_eq!(status.consumers, 0);
        assert_eq!(status.producers, 0);
    }
}
