//! State publishing through the log
//!
//! Broker integrations are out of scope; the published state goes to the
//! `tracing` output as one JSON document per publish.

use pink_noise_core::domain::command::{PublishedState, StatePublisher};
use tracing::{info, warn};

#[derive(Debug, Default, Clone)]
pub struct TracingPublisher {
    topic: String,
}

impl TracingPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// JSON payload for a state snapshot
    pub fn payload(state: &PublishedState) -> serde_json::Result<String> {
        serde_json::to_string(state)
    }
}

#[async_trait::async_trait]
impl StatePublisher for TracingPublisher {
    async fn publish(&self, state: &PublishedState) {
        match Self::payload(state) {
            Ok(payload) => info!(topic = %self.topic, %payload, "State published"),
            Err(e) => warn!(topic = %self.topic, "Failed to encode state: {}", e),
        }
    }
}
