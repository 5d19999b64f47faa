//! Event value carried by the event bus.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque payload attached to an event.
///
/// Shared by reference between every subscriber that receives the event.
pub type Payload = Option<Arc<dyn Any + Send + Sync>>;

/// A message published on a topic.
///
/// Cloning is cheap: strings and payload are reference counted.
#[derive(Clone)]
pub struct Event {
    /// Topic the event was published on.
    pub topic: Arc<str>,
    /// Integer command or measurement code.
    pub value: i64,
    /// Optional opaque data.
    pub payload: Payload,
    /// Name of the publishing module.
    pub source: Arc<str>,
    /// Wall-clock nanoseconds since the UNIX epoch at publish time.
    pub timestamp: i64,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(topic: &str, value: i64, payload: Payload, source: &str) -> Self {
        Self {
            topic: Arc::from(topic),
            value,
            payload,
            source: Arc::from(source),
            timestamp: current_timestamp_ns(),
        }
    }

    /// Borrow the payload as `T` if it has that type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("topic", &self.topic)
            .field("value", &self.value)
            .field("payload", &self.payload.as_ref().map(|_| "<opaque>"))
            .field("source", &self.source)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Current wall-clock time in nanoseconds since the UNIX epoch.
pub fn current_timestamp_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}
