//! Event bus - topic based publish/subscribe between modules.
//!
//! Every [`EventBus::subscribe`] call allocates an independent bounded FIFO
//! queue. Publishing offers the event to each queue of the topic:
//!
//! | Call | Full queue | Caller |
//! |------|------------|--------|
//! | [`EventBus::publish`] | event dropped for that subscriber, counted | never blocks |
//! | [`EventBus::publish_blocking`] | waits for space | suspended by the slowest subscriber |
//!
//! Dropping beats blocking here: the newest reading reflects current truth
//! and an unbounded queue would grow without limit on a small target.
//!
//! # Deadlock risk
//!
//! `publish_blocking` never returns while a subscriber queue stays full. A
//! subscriber that stops draining stalls every blocking publisher of that
//! topic.

use modus_common::consts::DEFAULT_QUEUE_CAPACITY;
use modus_common::event::{Event, Payload};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, warn};

/// Receive side of one subscription.
///
/// Only the subscriber that created it consumes it. Dropping it
/// unregisters the queue on the next publish to its topic.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    /// Topic this queue listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(evt) => Some(evt),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut out = Vec::with_capacity(self.rx.len());
        while let Some(evt) = self.try_recv() {
            out.push(evt);
        }
        out
    }

    /// Events waiting in the queue.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Topic-based message relay.
#[derive(Debug)]
pub struct EventBus {
    capacity: usize,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<Event>>>>,
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Bus with the default queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Bus whose subscriber queues hold `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Mutex::new(HashMap::new()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue capacity of every subscription.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a new independent queue for `topic`.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        debug!("EventBus: new subscriber for '{topic}'");
        Subscription {
            topic: topic.to_string(),
            rx,
        }
    }

    /// Publish without blocking.
    ///
    /// Returns how many subscribers missed the event because their queue
    /// was full. Zero subscribers is not an error.
    pub fn publish(&self, topic: &str, value: i64, payload: Payload, source: &str) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(queues) = subscribers.get_mut(topic) else {
            return 0;
        };

        let evt = Event::new(topic, value, payload, source);
        let mut dropped = 0;
        queues.retain(|tx| match tx.try_send(evt.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        if queues.is_empty() {
            subscribers.remove(topic);
        }
        drop(subscribers);

        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
            warn!("EventBus: dropped '{topic}' from '{source}' for {dropped} subscriber(s)");
        }
        dropped
    }

    /// Publish, waiting for space in every subscriber queue.
    ///
    /// Returns the number of queues the event was delivered to. See the
    /// module docs for the deadlock risk.
    pub async fn publish_blocking(
        &self,
        topic: &str,
        value: i64,
        payload: Payload,
        source: &str,
    ) -> usize {
        // Snapshot the senders so the map lock is never held across an await.
        let queues: Vec<mpsc::Sender<Event>> = match self.subscribers.lock().get(topic) {
            Some(queues) => queues.clone(),
            None => return 0,
        };

        let evt = Event::new(topic, value, payload, source);
        let mut delivered = 0;
        for tx in queues {
            if tx.send(evt.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Live subscriber queues for `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .lock()
            .get(topic)
            .map(|queues| queues.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Total drops since the bus was created.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
