use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::StreamExt;
use tradebus_core::channel::ConsumerFilterSpec;
use tradebus_core::consumer::{callback, queue_sink};
use tradebus_core::producer::ProducerState;
use tradebus_core::{
    Channel, ChannelError, ChannelRegistry, ExchangeContext, ExchangeProducer, FilterSet,
    Producer, Sink, SinkError, SymbolDataStore, create_exchange_channels,
};
use tradebus_sdk::config::ChannelSettings;
use tradebus_sdk::objects::account::TimeUpdate;
use tradebus_sdk::objects::market::{BookLevel, OrderBookUpdate};
use tradebus_sdk::objects::{ChannelName, ChannelPayload};

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

fn level(price: i64) -> BookLevel {
    BookLevel::new(Decimal::new(price, 0), Decimal::ONE)
}

fn order_book(symbol: &str) -> ChannelPayload {
    ChannelPayload::OrderBook(OrderBookUpdate {
        exchange: "binance".into(),
        symbol: symbol.into(),
        asks: vec![level(101)],
        bids: vec![level(100)],
    })
}

fn order_book_channel() -> Arc<Channel> {
    Arc::new(Channel::new(
        "binance",
        ChannelName::OrderBook,
        &ChannelSettings::default(),
    ))
}

type Received = Arc<Mutex<Vec<ChannelPayload>>>;

fn recording_sink() -> (Arc<dyn Sink>, Received) {
    let received: Received = Arc::default();
    let log = Arc::clone(&received);
    let sink = callback(move |payload| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(payload);
            Ok::<_, SinkError>(())
        }
    });
    (sink, received)
}

#[tokio::test]
async fn test_pause_follows_consumer_presence() {
    let channel = order_book_channel();
    let producers: Vec<_> = (0..3)
        .map(|_| Arc::new(CountingProducer::default()))
        .collect();
    for producer in &producers {
        channel.register_producer(producer.clone()).await;
    }
    assert!(channel.is_paused().await);

    let (sink, _stream) = queue_sink();
    let consumer = channel
        .new_consumer(sink, ConsumerFilterSpec::symbol("ETH/BTC"))
        .await
        .unwrap();
    assert!(!channel.is_paused().await);
    for producer in &producers {
        assert_eq!(producer.resumes.load(Ordering::SeqCst), 1);
        assert_eq!(producer.pauses.load(Ordering::SeqCst), 0);
    }

    assert!(channel.remove_consumer(consumer.id()).await);
    assert!(channel.is_paused().await);
    for producer in &producers {
        assert_eq!(producer.resumes.load(Ordering::SeqCst), 1);
        assert_eq!(producer.pauses.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_perform_skips_unmatched_symbol() {
    let registry = ChannelRegistry::new();
    let store = Arc::new(SymbolDataStore::new());
    let producers = create_exchange_channels(
        &ExchangeContext::new("binance", store.clone()),
        &registry,
        &ChannelSettings::default(),
    )
    .await
    .unwrap();
    let channel = registry
        .lookup(ChannelName::OrderBook, "binance")
        .await
        .unwrap();
    let (sink, received) = recording_sink();
    let consumer = channel
        .new_consumer(sink, ConsumerFilterSpec::symbol("ETH/BTC"))
        .await
        .unwrap();

    let sent = producers
        .order_book()
        .perform("BTC/USDT".into(), vec![level(101)], vec![level(100)])
        .await
        .unwrap();
    assert_eq!(sent, 0);
    assert!(store.order_book("BTC/USDT").is_none());
    consumer.drained().await;
    assert!(received.lock().unwrap().is_empty());

    let sent = producers
        .order_book()
        .perform("ETH/BTC".into(), vec![level(101)], vec![level(100)])
        .await
        .unwrap();
    assert_eq!(sent, 1);
    assert!(store.order_book("ETH/BTC").is_some());
}

#[tokio::test]
async fn test_send_routes_by_symbol() {
    let channel = order_book_channel();
    let producer = ExchangeProducer::new(Arc::clone(&channel));

    let (wildcard_sink, wildcard) = recording_sink();
    let (exact_sink, exact) = recording_sink();
    let (other_sink, other) = recording_sink();
    let consumers = [
        channel
            .new_consumer(wildcard_sink, ConsumerFilterSpec::all())
            .await
            .unwrap(),
        channel
            .new_consumer(exact_sink, ConsumerFilterSpec::symbol("BTC/USDT"))
            .await
            .unwrap(),
        channel
            .new_consumer(other_sink, ConsumerFilterSpec::symbol("ETH/BTC"))
            .await
            .unwrap(),
    ];

    let sent = producer.send(order_book("BTC/USDT")).await.unwrap();
    assert_eq!(sent, 2);
    for consumer in &consumers {
        consumer.drained().await;
    }
    assert_eq!(*wildcard.lock().unwrap(), vec![order_book("BTC/USDT")]);
    assert_eq!(*exact.lock().unwrap(), vec![order_book("BTC/USDT")]);
    assert!(other.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_rejects_foreign_payload() {
    let channel = order_book_channel();
    let producer = ExchangeProducer::new(Arc::clone(&channel));
    let payload = ChannelPayload::Time(TimeUpdate {
        exchange: "binance".into(),
        timestamp: time::OffsetDateTime::UNIX_EPOCH,
    });
    assert!(matches!(
        producer.send(payload).await,
        Err(ChannelError::PayloadMismatch {
            channel: ChannelName::OrderBook,
            payload: ChannelName::Time,
        })
    ));
}

#[tokio::test]
async fn test_fan_out_in_registration_order() {
    let channel = order_book_channel();
    let producer = Arc::new(ExchangeProducer::new(Arc::clone(&channel)));

    // first consumer: queue of one, sink held closed until the gate opens
    let gate = Arc::new(Semaphore::new(0));
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let first_sink = {
        let gate = Arc::clone(&gate);
        callback(move |_| {
            let gate = Arc::clone(&gate);
            let entered_tx = entered_tx.clone();
            async move {
                let _ = entered_tx.send(());
                let _permit = gate
                    .acquire()
                    .await
                    .map_err(|_| SinkError::Closed)?;
                Ok::<_, SinkError>(())
            }
        })
    };
    let first = channel
        .new_consumer(first_sink, ConsumerFilterSpec::all().with_queue_size(1))
        .await
        .unwrap();
    let (second_sink, mut second) = queue_sink();
    let second_consumer = channel
        .new_consumer(second_sink, ConsumerFilterSpec::all())
        .await
        .unwrap();
    assert_eq!(
        channel
            .get_filtered_consumers(&FilterSet::any())
            .await
            .iter()
            .map(|c| c.id())
            .collect::<Vec<_>>(),
        vec![first.id(), second_consumer.id()]
    );

    // the first payload occupies the first sink, the second fills its queue
    producer.send(order_book("BTC/USDT")).await.unwrap();
    entered_rx.recv().await.unwrap();
    producer.send(order_book("ETH/BTC")).await.unwrap();
    assert_eq!(second.next().await, Some(order_book("BTC/USDT")));
    assert_eq!(second.next().await, Some(order_book("ETH/BTC")));

    // the third blocks on the first consumer, so the second does not see it
    let blocked = {
        let producer = Arc::clone(&producer);
        tokio::spawn(async move { producer.send(order_book("SOL/USDT")).await })
    };
    assert!(
        tokio::time::timeout(Duration::from_millis(50), second.next())
            .await
            .is_err()
    );

    gate.add_permits(Semaphore::MAX_PERMITS / 2);
    assert_eq!(blocked.await.unwrap().unwrap(), 2);
    assert_eq!(second.next().await, Some(order_book("SOL/USDT")));
}

#[tokio::test]
async fn test_registry_errors() {
    let registry = ChannelRegistry::new();
    assert!(matches!(
        registry.lookup(ChannelName::Ticker, "binance").await,
        Err(ChannelError::ChannelNotFound { .. })
    ));

    registry.register(order_book_channel()).await.unwrap();
    assert!(matches!(
        registry.register(order_book_channel()).await,
        Err(ChannelError::DuplicateChannel { .. })
    ));
    assert!(!registry.unregister(ChannelName::Ticker, "binance").await);
}

#[tokio::test]
async fn test_pause_is_idempotent() {
    let producer = CountingProducer::default();
    producer.resume();
    producer.pause();
    producer.pause();
    assert!(producer.is_paused());
    assert_eq!(producer.pauses.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unregister_exchange_stops_consumers() {
    let registry = ChannelRegistry::new();
    create_exchange_channels(
        &ExchangeContext::new("binance", Arc::new(SymbolDataStore::new())),
        &registry,
        &ChannelSettings::default(),
    )
    .await
    .unwrap();
    let ticker = registry.lookup(ChannelName::Ticker, "binance").await.unwrap();
    let (sink, _stream) = queue_sink();
    let consumer = ticker
        .new_consumer(sink, ConsumerFilterSpec::all())
        .await
        .unwrap();

    assert_eq!(
        registry.unregister_exchange("binance").await,
        ChannelName::ALL.len()
    );
    assert!(consumer.is_stopped());
    assert!(ticker.is_paused().await);
    assert!(matches!(
        consumer.enqueue(order_book("BTC/USDT")).await,
        Err(ChannelError::ConsumerStopped)
    ));
}
