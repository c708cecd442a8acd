use super::metrics::{AtomicSubscriberMetrics, SubscriberMetrics};
use crate::error::RingbusResult;
use crate::memory::{Channel, ChannelOptions, ChannelStats, SubscriberMode};
use std::sync::atomic::Ordering;

/// Callback invoked with each message a subscriber takes off its channel
pub type MessageCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Read side of a channel.
///
/// A subscriber attaches to a channel some publisher already created and
/// never initializes or removes it. Reads are destructive: a message taken by
/// one subscriber is gone for every other subscriber of the same topic.
pub struct Subscriber {
    channel: Channel,
    mode: SubscriberMode,
    callback: MessageCallback,
    buffer: Vec<u8>,
    metrics: AtomicSubscriberMetrics,
    registered_reader: bool,
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("channel", &self.channel)
            .field("mode", &self.mode)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

impl Subscriber {
    /// Attach to `topic`; fails with `NotFound` if no publisher created it yet
    pub fn new<F>(
        topic: &str,
        mode: SubscriberMode,
        message_length: usize,
        callback: F,
    ) -> RingbusResult<Self>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        Self::with_options(
            topic,
            mode,
            message_length,
            &ChannelOptions::default(),
            callback,
        )
    }

    pub fn with_options<F>(
        topic: &str,
        mode: SubscriberMode,
        message_length: usize,
        options: &ChannelOptions,
        callback: F,
    ) -> RingbusResult<Self>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let channel = Channel::attach(topic, message_length, options)?;

        // The reader count is advisory; failing to bump it is not fatal
        let registered_reader = match channel.increment_readers() {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Channel '{}': could not register reader: {}", topic, e);
                false
            }
        };

        Ok(Self {
            buffer: Vec::with_capacity(message_length),
            channel,
            mode,
            callback: Box::new(callback),
            metrics: AtomicSubscriberMetrics::default(),
            registered_reader,
        })
    }

    /// Take at most one message and hand it to the callback.
    ///
    /// Returns `Ok(false)` without locking when the channel is empty. The
    /// message is copied out and the channel lock released before the callback
    /// runs, so the callback may publish to any channel, this one included.
    pub fn spin_once(&mut self) -> RingbusResult<bool> {
        match self.channel.dequeue(self.mode, &mut self.buffer) {
            Ok(false) => Ok(false),
            Ok(true) => {
                self.metrics.received.fetch_add(1, Ordering::Relaxed);
                (self.callback)(&self.buffer);
                Ok(true)
            }
            Err(e) => {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Spin until the channel is empty, returning how many messages were delivered
    pub fn drain(&mut self) -> RingbusResult<usize> {
        let mut delivered = 0;
        while self.spin_once()? {
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Take one message without invoking the callback
    pub fn recv(&mut self) -> RingbusResult<Option<Vec<u8>>> {
        let mut message = Vec::with_capacity(self.channel.message_length());
        match self.channel.dequeue(self.mode, &mut message) {
            Ok(true) => {
                self.metrics.received.fetch_add(1, Ordering::Relaxed);
                Ok(Some(message))
            }
            Ok(false) => Ok(None),
            Err(e) => {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Bump the channel's advisory reader count
    pub fn increment_readers(&self) -> RingbusResult<u64> {
        self.channel.increment_readers()
    }

    /// Lower the channel's advisory reader count (never below zero)
    pub fn decrement_readers(&self) -> RingbusResult<u64> {
        self.channel.decrement_readers()
    }

    /// Messages currently waiting, read without the lock
    pub fn pending(&self) -> usize {
        self.channel.len_hint()
    }

    pub fn topic(&self) -> &str {
        self.channel.topic()
    }

    pub fn mode(&self) -> SubscriberMode {
        self.mode
    }

    pub fn message_length(&self) -> usize {
        self.channel.message_length()
    }

    pub fn metrics(&self) -> SubscriberMetrics {
        self.metrics.snapshot()
    }

    pub fn stats(&self) -> RingbusResult<ChannelStats> {
        self.channel.stats()
    }

    /// Whether some process currently holds the channel lock
    pub fn lock_is_held(&self) -> bool {
        self.channel.lock_is_held()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if self.registered_reader {
            if let Err(e) = self.channel.decrement_readers() {
                log::warn!(
                    "Channel '{}': could not unregister reader: {}",
                    self.channel.topic(),
                    e
                );
            }
        }
    }
}
