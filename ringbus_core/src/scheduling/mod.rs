//! # Fixed-frequency component scheduling
//!
//! A [`Component`] pairs a user `init`/`update` function with the publishers
//! and subscribers it owns and drives them from one background thread:
//!
//! 1. `update(config, state)` runs under the state lock and returns a [`Tick`]
//! 2. each output is published to the publisher registered for its topic
//! 3. every subscriber is spun once, in registration order
//! 4. the thread sleeps out the rest of the period
//!
//! ```rust,ignore
//! use ringbus_core::scheduling::{Component, Tick};
//!
//! let mut component = Component::new("heartbeat", (), |_| 0u64, |_, beat| {
//!     *beat += 1;
//!     Tick::proceed().with_pod_output("/heartbeat", &*beat)
//! });
//! component.create_publisher("/heartbeat", 8, 8)?;
//! component.run(50.0)?;
//! // ...
//! component.stop();
//! component.join()?;
//! ```

pub mod clock;
pub mod component;
pub mod tick;

pub use clock::Clock;
pub use component::{Component, ComponentMetrics, ComponentStatus, StopHandle};
pub use tick::Tick;
