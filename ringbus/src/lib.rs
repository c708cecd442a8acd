//! # ringbus
//!
//! Named shared memory ring buffers for processes on one host, plus a
//! scheduler that runs user logic at a fixed frequency and moves messages
//! through those buffers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ringbus::prelude::*;
//!
//! fn main() -> AnyResult<()> {
//!     let mut component = Component::new("counter", (), |_| 0u32, |_, count| {
//!         *count += 1;
//!         Tick::continue_if(*count < 10).with_pod_output("/counter", &*count)
//!     });
//!     component.create_publisher("/counter", 16, 4)?;
//!     component.create_subscriber("/counter", SubscriberMode::GetFirst, 4, |bytes| {
//!         println!("{:?}", bytes);
//!     })?;
//!     component.run(10.0)?;
//!     component.join()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Drop-oldest channels**: a full channel overwrites its oldest message
//! - **Two read modes**: oldest first (`GET_FIRST`) or newest first (`GET_LAST`)
//! - **Bounded locking**: lock waits time out and a dead lock holder is recovered
//! - **Config files**: TOML, YAML or JSON component configs

pub mod example;

pub use ringbus_core::{self, *};

/// The ringbus prelude - everything you need to get started
pub mod prelude {
    // Channels
    pub use ringbus_core::communication::{
        decode_pod, encode_pod, ChannelOptions, Outputs, Publisher, PublisherConfig,
        Subscriber, SubscriberConfig,
    };
    pub use ringbus_core::memory::SubscriberMode;

    // Scheduling
    pub use ringbus_core::scheduling::{Component, ComponentStatus, StopHandle, Tick};

    // Error types
    pub use ringbus_core::error::{RingbusError, RingbusResult};
    pub type Result<T> = RingbusResult<T>;

    // Common std types
    pub use std::sync::Arc;
    pub use std::time::{Duration, Instant};

    // Common traits
    pub use serde::{Deserialize, Serialize};

    // Re-export anyhow for error handling
    pub use anyhow::{anyhow, bail, ensure, Context, Result as AnyResult};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}
