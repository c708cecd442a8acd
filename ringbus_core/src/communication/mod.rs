//! Publishers, subscribers and the values that flow between them

pub mod config;
pub mod metrics;
pub mod outputs;
pub mod payload;
pub mod publisher;
pub mod subscriber;

pub use config::{ChannelOptions, PublisherConfig, SubscriberConfig};
pub use metrics::{PublisherMetrics, SubscriberMetrics};
pub use outputs::Outputs;
pub use payload::{decode_pod, encode_pod};
pub use publisher::Publisher;
pub use subscriber::{MessageCallback, Subscriber};
