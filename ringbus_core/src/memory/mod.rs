//! # Shared memory channels for ringbus
//!
//! This module provides the process-shared ring buffer every topic is built on:
//!
//! - **ShmRegion**: a named POSIX shared memory object mapped into this process
//! - **ShmMutex**: a `PTHREAD_PROCESS_SHARED` mutex stored inside the region
//! - **RingCursor**: the circular index rules (drop-oldest writes, FIFO/newest reads)
//! - **Channel**: header + slot arena tying the three together
//!
//! ## Region layout
//!
//! ```text
//! offset 0            HEADER_SIZE          HEADER_SIZE + i * message_length
//! | capacity | start | end | size | mutex | reader_count | slot 0 | ... | slot i | ...
//! ```
//!
//! ## Known limitation
//!
//! Lock acquisition is bounded by `ChannelOptions::lock_timeout_ms`. On Linux a
//! publisher that dies while holding the lock is detected and the lock is
//! recovered; on other hosts a crashed holder surfaces as `LockTimeout` on every
//! later operation until the channel is recreated.

pub mod channel;
pub mod platform;
pub mod ring;
pub mod shm_lock;
pub mod shm_region;

pub use channel::{Channel, ChannelOptions, ChannelStats, HEADER_SIZE};
pub use platform::{has_robust_mutex, max_topic_len, shm_object_path, validate_topic};
pub use ring::{EnqueueOutcome, RingCursor, SubscriberMode};
pub use shm_region::ShmRegion;

use crate::error::RingbusResult;

/// Remove a channel name left behind by a publisher that never cleaned up
pub fn remove_channel(topic: &str) -> RingbusResult<()> {
    shm_region::unlink(topic)?;
    log::info!("Removed channel '{}'", topic);
    Ok(())
}

/// Check whether a channel with this name currently exists
pub fn channel_exists(topic: &str) -> RingbusResult<bool> {
    shm_region::exists(topic)
}
