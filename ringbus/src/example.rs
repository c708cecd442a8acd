//! The counter component run by `ringbus run`.
//!
//! Each tick increments a counter and publishes it as a native-endian `u32`.
//! A subscriber on the same topic hands every value it takes back to the
//! caller, so one process exercises both ends of a channel.

use ringbus_core::communication::{decode_pod, PublisherConfig, SubscriberConfig};
use ringbus_core::error::{RingbusError, RingbusResult};
use ringbus_core::memory::SubscriberMode;
use ringbus_core::scheduling::{Component, Tick};
use serde::{Deserialize, Serialize};
use std::path::Path;

const COUNTER_MESSAGE_LENGTH: usize = std::mem::size_of::<u32>();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// Stop once the counter reaches this value; `null` runs until stopped
    #[serde(default = "default_limit")]
    pub limit: Option<u32>,

    /// How the echo subscriber reads the channel
    #[serde(default)]
    pub mode: SubscriberMode,

    pub publisher: PublisherConfig,
}

fn default_frequency_hz() -> f64 {
    10.0
}

fn default_limit() -> Option<u32> {
    Some(10)
}

pub fn counter_init(config: &CounterConfig) -> u32 {
    tracing::info!(
        "Counter publishing to '{}' (limit: {:?})",
        config.publisher.topic,
        config.limit
    );
    0
}

pub fn counter_update(config: &CounterConfig, count: &mut u32) -> Tick {
    *count += 1;
    tracing::debug!("Counter tick {}", count);
    let keep_running = config.limit.is_none_or(|limit| *count < limit);
    Tick::continue_if(keep_running).with_pod_output(config.publisher.topic.clone(), &*count)
}

/// Load the counter config from `path` and register its channels.
///
/// `on_value` is called from the scheduling thread with every counter value
/// the echo subscriber receives.
pub fn build_counter<F>(
    path: &Path,
    mut on_value: F,
) -> RingbusResult<Component<CounterConfig, u32>>
where
    F: FnMut(u32) + Send + 'static,
{
    let mut component =
        Component::from_config_file("counter", path, counter_init, counter_update)?;

    let publisher = component.config().publisher.clone();
    if publisher.message_length != COUNTER_MESSAGE_LENGTH {
        return Err(RingbusError::invalid_argument(format!(
            "counter messages are {} bytes, config says {}",
            COUNTER_MESSAGE_LENGTH, publisher.message_length
        )));
    }
    component.create_publishers(std::slice::from_ref(&publisher))?;

    let mut echo = SubscriberConfig::new(
        publisher.topic.clone(),
        component.config().mode,
        COUNTER_MESSAGE_LENGTH,
    );
    echo.options = publisher.options.clone();
    component.create_subscriber_from(&echo, move |bytes| match decode_pod::<u32>(bytes) {
        Ok(value) => on_value(value),
        Err(e) => tracing::warn!("Dropping malformed counter message: {}", e),
    })?;

    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn write_config(
        dir: &tempfile::TempDir,
        topic: &str,
        message_length: usize,
    ) -> std::path::PathBuf {
        let path = dir.path().join("counter.yaml");
        std::fs::write(
            &path,
            format!(
                "limit: 3\npublisher:\n  topic: {}\n  capacity: 4\n  message_length: {}\n",
                topic, message_length
            ),
        )
        .unwrap();
        path
    }

    fn unique_topic() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("/rb_counter_{}", &id[..12])
    }

    #[test]
    fn test_counter_echoes_every_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &unique_topic(), 4);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut component = build_counter(&path, move |v| sink.lock().unwrap().push(v)).unwrap();
        assert_eq!(component.config().frequency_hz, 10.0);
        assert_eq!(component.config().mode, SubscriberMode::GetFirst);

        component.run(200.0).unwrap();
        component.join().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_counter_rejects_wrong_message_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &unique_topic(), 8);
        assert!(matches!(
            build_counter(&path, |_| {}),
            Err(RingbusError::InvalidArgument(_))
        ));
    }
}
