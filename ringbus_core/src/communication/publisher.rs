use super::metrics::{AtomicPublisherMetrics, PublisherMetrics};
use crate::error::RingbusResult;
use crate::memory::{Channel, ChannelOptions, ChannelStats, EnqueueOutcome};
use std::sync::atomic::Ordering;

/// Write side of a channel.
///
/// Constructing a publisher creates the channel, or attaches to it when
/// another publisher got there first. The handle that created the channel
/// removes its name when dropped; subscribers that are still attached keep
/// their mapping but new ones can no longer find it.
pub struct Publisher {
    channel: Channel,
    metrics: AtomicPublisherMetrics,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("channel", &self.channel)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl Publisher {
    /// Create or open `topic` with `capacity` slots of `message_length` bytes
    pub fn new(topic: &str, capacity: usize, message_length: usize) -> RingbusResult<Self> {
        Self::with_options(topic, capacity, message_length, &ChannelOptions::default())
    }

    /// Create `topic`, failing with `AlreadyExists` if it is already present
    pub fn create_exclusive(
        topic: &str,
        capacity: usize,
        message_length: usize,
    ) -> RingbusResult<Self> {
        Self::with_options(
            topic,
            capacity,
            message_length,
            &ChannelOptions::default().exclusive(),
        )
    }

    pub fn with_options(
        topic: &str,
        capacity: usize,
        message_length: usize,
        options: &ChannelOptions,
    ) -> RingbusResult<Self> {
        let channel = Channel::open_or_create(topic, capacity, message_length, options)?;
        Ok(Self {
            channel,
            metrics: AtomicPublisherMetrics::default(),
        })
    }

    /// Write one message.
    ///
    /// `payload` must be exactly `message_length` bytes, otherwise this fails
    /// with `InvalidArgument` and the channel is left untouched. A full channel
    /// is not an error: the oldest message is overwritten and counted in
    /// [`PublisherMetrics::dropped`].
    pub fn publish(&self, payload: &[u8]) -> RingbusResult<()> {
        match self.channel.enqueue(payload) {
            Ok(outcome) => {
                self.metrics.published.fetch_add(1, Ordering::Relaxed);
                if outcome == EnqueueOutcome::OverwroteOldest {
                    self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    log::debug!(
                        "Channel '{}' is full, overwrote the oldest message",
                        self.channel.topic()
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Publish a plain-old-data value as its in-memory bytes
    pub fn publish_pod<T: bytemuck::Pod>(&self, value: &T) -> RingbusResult<()> {
        self.publish(bytemuck::bytes_of(value))
    }

    pub fn topic(&self) -> &str {
        self.channel.topic()
    }

    pub fn capacity(&self) -> usize {
        self.channel.capacity()
    }

    pub fn message_length(&self) -> usize {
        self.channel.message_length()
    }

    /// True if this handle created the channel
    pub fn is_owner(&self) -> bool {
        self.channel.is_owner()
    }

    /// Number of messages this handle overwrote because the channel was full
    pub fn dropped_messages(&self) -> u64 {
        self.metrics.dropped.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> PublisherMetrics {
        self.metrics.snapshot()
    }

    pub fn stats(&self) -> RingbusResult<ChannelStats> {
        self.channel.stats()
    }

    /// Retained messages oldest first, without consuming them
    pub fn retained_messages(&self) -> RingbusResult<Vec<Vec<u8>>> {
        self.channel.retained_messages()
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        if self.channel.is_owner() {
            log::info!("Removing channel '{}'", self.channel.topic());
        }
    }
}
