//! In-process topic-exchange event bus (spec.md §6): JSON envelopes routed
//! by routing key, one queue per consumer, at-least-once (a slow consumer
//! never loses events — unbounded channels, never dropped on backpressure).

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::id::EventIdGenerator;

/// Every event on the bus carries this envelope (spec.md §6: "Every
/// envelope includes event_id, event_type, run_id, mode, seed, scale,
/// sim_time_s, ts_utc").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event_id: u64,
    pub event_type: String,
    pub run_id: String,
    pub mode: String,
    pub seed: u64,
    pub scale: String,
    pub sim_time_s: f64,
    pub ts_utc: String,
    pub payload: Value,
}

impl Envelope {
    pub fn to_json(&self) -> SerdeResult<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> SerdeResult<Envelope> {
        serde_json::from_str(raw)
    }

    pub fn now_ts_utc() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

type SerdeResult<T> = Result<T, serde_json::Error>;

struct Subscriber {
    routing_keys: Vec<String>,
    sender: UnboundedSender<Envelope>,
}

/// Topic exchange: `publish` fans an envelope out to every subscriber whose
/// routing-key set contains the envelope's routing key.
pub struct TopicBus {
    event_ids: EventIdGenerator,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Default for TopicBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicBus {
    pub fn new() -> Self {
        Self {
            event_ids: EventIdGenerator::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn next_event_id(&self) -> u64 {
        self.event_ids.next().value()
    }

    /// Registers a new consumer queue bound to the given routing keys.
    pub fn subscribe(&self, routing_keys: &[&str]) -> UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(Subscriber {
            routing_keys: routing_keys.iter().map(|s| s.to_string()).collect(),
            sender: tx,
        });
        rx
    }

    /// Publishes to every subscriber bound to `routing_key`. Malformed
    /// payloads never reach here — envelope construction is type-checked;
    /// the malformed-payload path is exercised at `Envelope::from_json`.
    pub fn publish(&self, routing_key: &str, envelope: Envelope) {
        let subscribers = self.subscribers.lock().unwrap();
        for sub in subscribers.iter() {
            if sub.routing_keys.iter().any(|k| k == routing_key) {
                if sub.sender.send(envelope.clone()).is_err() {
                    warn!(routing_key, "subscriber queue dropped, consumer gone");
                }
            }
        }
    }
}
