//! Cross-surface notifications. Each event belongs to exactly one named topic
//! and carries a typed payload; subscribers receive only their topic.

use crate::optimistic::MutationKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Habits,
    Profile,
    Theme,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Topic::Habits => "habits",
            Topic::Profile => "profile",
            Topic::Theme => "theme",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitsEvent {
    Loaded { count: usize },
    Confirmed { key: MutationKey },
    RolledBack { key: MutationKey, notice: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEvent {
    Updated { display_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeEvent {
    Changed(Theme),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Habits(HabitsEvent),
    Profile(ProfileEvent),
    Theme(ThemeEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Habits(_) => Topic::Habits,
            Event::Profile(_) => Topic::Profile,
            Event::Theme(_) => Topic::Theme,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Returns how many subscribers saw the event. Publishing with nobody
    /// listening is not an error.
    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            topic,
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Next event on this topic, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.topic() == self.topic => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant for render loops.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.topic() == self.topic => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "subscriber lagged, events dropped");
                }
                Err(_) => return None,
            }
        }
    }
}
