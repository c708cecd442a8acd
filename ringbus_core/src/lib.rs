//! # ringbus core
//!
//! Shared memory publish/subscribe channels and a fixed-frequency component
//! scheduler for processes on one host.
//!
//! ## Core modules
//!
//! - **memory**: named shared memory ring buffers with a process-shared lock
//! - **communication**: [`Publisher`] and [`Subscriber`] handles over those channels
//! - **scheduling**: [`Component`], which runs a user update function and drives its channels
//! - **config**: TOML/YAML/JSON config loading
//! - **error**: [`RingbusError`] and [`RingbusResult`]
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use ringbus_core::{Publisher, Subscriber, SubscriberMode};
//!
//! let publisher = Publisher::new("/temperature", 16, 4)?;
//! let mut subscriber = Subscriber::new("/temperature", SubscriberMode::GetFirst, 4, |bytes| {
//!     println!("received {:?}", bytes);
//! })?;
//!
//! publisher.publish(&21u32.to_ne_bytes())?;
//! subscriber.spin_once()?;
//! ```

pub mod communication;
pub mod config;
pub mod error;
pub mod memory;
pub mod scheduling;

pub use communication::{
    decode_pod, encode_pod, ChannelOptions, Outputs, Publisher, PublisherConfig,
    PublisherMetrics, Subscriber, SubscriberConfig, SubscriberMetrics,
};
pub use config::{find_config_file, load_config};
pub use error::{RingbusError, RingbusResult};
pub use memory::{channel_exists, remove_channel, ChannelStats, SubscriberMode};
pub use scheduling::{Component, ComponentMetrics, ComponentStatus, StopHandle, Tick};
