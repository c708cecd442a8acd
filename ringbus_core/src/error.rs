//! Error types shared by every ringbus module.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout ringbus
pub type RingbusResult<T> = Result<T, RingbusError>;

/// Errors raised by channels, components and the configuration loader
#[derive(Debug, Error)]
pub enum RingbusError {
    /// A channel with this name already exists and exclusive creation was requested
    #[error("channel '{0}' already exists")]
    AlreadyExists(String),

    /// The host refused to create or size the shared memory object
    #[error("failed to create channel '{topic}': {source}")]
    CreationFailed {
        topic: String,
        #[source]
        source: io::Error,
    },

    /// No channel with this name has been created yet
    #[error("channel '{0}' not found")]
    NotFound(String),

    /// A caller supplied an argument the channel or component cannot accept
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The existing region does not match the layout this handle expects
    #[error("channel '{topic}' layout mismatch: {reason}")]
    LayoutMismatch { topic: String, reason: String },

    /// The creator did not finish initializing the channel header in time
    #[error("channel '{topic}' was not initialized within {timeout:?}")]
    NotReady { topic: String, timeout: Duration },

    /// The channel lock could not be acquired within the configured bound
    #[error("timed out after {timeout:?} waiting for the lock of channel '{topic}'")]
    LockTimeout { topic: String, timeout: Duration },

    /// The previous lock owner died and the lock cannot be made consistent again
    #[error("lock of channel '{0}' is not recoverable")]
    LockUnrecoverable(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Component lifecycle misuse or a panicked scheduling thread
    #[error("component error: {0}")]
    Component(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RingbusError {
    pub fn config(msg: impl Into<String>) -> Self {
        RingbusError::Config(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        RingbusError::InvalidArgument(msg.into())
    }

    pub fn component(msg: impl Into<String>) -> Self {
        RingbusError::Component(msg.into())
    }

    pub fn layout(topic: &str, reason: impl Into<String>) -> Self {
        RingbusError::LayoutMismatch {
            topic: topic.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors a scheduling loop can log and move past
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RingbusError::LockTimeout { .. } | RingbusError::InvalidArgument(_)
        )
    }
}

impl From<serde_yaml::Error> for RingbusError {
    fn from(err: serde_yaml::Error) -> Self {
        RingbusError::Config(format!("Failed to parse YAML: {}", err))
    }
}

impl From<toml::de::Error> for RingbusError {
    fn from(err: toml::de::Error) -> Self {
        RingbusError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for RingbusError {
    fn from(err: serde_json::Error) -> Self {
        RingbusError::Config(format!("Failed to parse JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_topic() {
        let err = RingbusError::NotFound("/camera".to_string());
        assert_eq!(err.to_string(), "channel '/camera' not found");

        let err = RingbusError::LockTimeout {
            topic: "/imu".to_string(),
            timeout: Duration::from_millis(5),
        };
        assert!(err.to_string().contains("/imu"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_io_conversion() {
        let err: RingbusError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, RingbusError::Io(_)));
        assert!(!err.is_transient());
    }
}
