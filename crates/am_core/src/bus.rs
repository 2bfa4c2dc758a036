//! Event fan-out - one publisher (the engine), many subscribers.
//!
//! Built on `tokio::sync::broadcast` so slow subscribers lag instead of
//! blocking officiating. The bus also retains the latest score snapshot so a
//! display that connects mid-match can render immediately instead of waiting
//! for the next scoring event.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::models::events::EngineEvent;
use crate::models::snapshot::ScoreSnapshot;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
    latest: Arc<Mutex<Option<ScoreSnapshot>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, latest: Arc::new(Mutex::new(None)) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. A send error only means nobody is listening, which
    /// is normal before the first display connects.
    pub fn publish(&self, event: EngineEvent) {
        if let EngineEvent::ScoreUpdated { snapshot } = &event {
            if let Ok(mut latest) = self.latest.lock() {
                *latest = Some(snapshot.clone());
            }
        }
        log::trace!("event: {}", event.label());
        let _ = self.sender.send(event);
    }

    /// Most recent score snapshot, for late joiners.
    pub fn latest_snapshot(&self) -> Option<ScoreSnapshot> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
