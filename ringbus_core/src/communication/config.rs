/// Channel declarations for component config files
///
/// Lets a component list the channels it publishes and subscribes to in its
/// TOML/YAML config instead of hardcoding topics and sizes.
use super::publisher::Publisher;
use super::subscriber::Subscriber;
use crate::error::RingbusResult;
use crate::memory::{validate_topic, SubscriberMode};
use serde::{Deserialize, Serialize};

pub use crate::memory::ChannelOptions;

/// One channel this component writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Shared memory name, e.g. "/counter"
    pub topic: String,

    /// Number of message slots
    pub capacity: usize,

    /// Bytes per message
    pub message_length: usize,

    #[serde(default)]
    pub options: ChannelOptions,
}

/// One channel this component reads from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberConfig {
    pub topic: String,

    /// GET_FIRST (oldest first) or GET_LAST (newest first)
    #[serde(default)]
    pub mode: SubscriberMode,

    pub message_length: usize,

    #[serde(default)]
    pub options: ChannelOptions,
}

impl PublisherConfig {
    pub fn new(topic: impl Into<String>, capacity: usize, message_length: usize) -> Self {
        Self {
            topic: topic.into(),
            capacity,
            message_length,
            options: ChannelOptions::default(),
        }
    }

    pub fn validate(&self) -> RingbusResult<()> {
        validate_topic(&self.topic)?;
        crate::memory::Channel::required_size(self.capacity, self.message_length)?;
        Ok(())
    }

    pub fn build(&self) -> RingbusResult<Publisher> {
        Publisher::with_options(
            &self.topic,
            self.capacity,
            self.message_length,
            &self.options,
        )
    }
}

impl SubscriberConfig {
    pub fn new(topic: impl Into<String>, mode: SubscriberMode, message_length: usize) -> Self {
        Self {
            topic: topic.into(),
            mode,
            message_length,
            options: ChannelOptions::default(),
        }
    }

    pub fn build<F>(&self, callback: F) -> RingbusResult<Subscriber>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        Subscriber::with_options(
            &self.topic,
            self.mode,
            self.message_length,
            &self.options,
            callback,
        )
    }
}
