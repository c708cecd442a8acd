// Host rules for POSIX shared memory object names
//
// Linux: objects live under /dev/shm (tmpfs), names up to NAME_MAX
// macOS: no filesystem view, names limited to PSHMNAMLEN (31)
// Other Unix: treated like Linux without the /dev/shm view

use crate::error::{RingbusError, RingbusResult};
use std::path::PathBuf;

/// Longest topic name the host accepts for a shared memory object
pub fn max_topic_len() -> usize {
    #[cfg(target_os = "macos")]
    {
        31
    }

    #[cfg(not(target_os = "macos"))]
    {
        255
    }
}

/// Check that a topic can be used verbatim as a shared memory object name.
///
/// A valid topic has a single leading `/`, at least one more character, no
/// further `/`, no NUL byte and fits within [`max_topic_len`].
pub fn validate_topic(topic: &str) -> RingbusResult<()> {
    let Some(rest) = topic.strip_prefix('/') else {
        return Err(RingbusError::invalid_argument(format!(
            "topic '{}' must start with '/'",
            topic
        )));
    };
    if rest.is_empty() {
        return Err(RingbusError::invalid_argument("topic name is empty"));
    }
    if rest.contains('/') {
        return Err(RingbusError::invalid_argument(format!(
            "topic '{}' may not contain '/' after the leading separator",
            topic
        )));
    }
    if topic.contains('\0') {
        return Err(RingbusError::invalid_argument(format!(
            "topic '{}' contains a NUL byte",
            topic.escape_debug()
        )));
    }
    if topic.len() > max_topic_len() {
        return Err(RingbusError::invalid_argument(format!(
            "topic '{}' is {} bytes, the host limit is {}",
            topic,
            topic.len(),
            max_topic_len()
        )));
    }
    Ok(())
}

/// Filesystem view of a channel, where the host provides one
pub fn shm_object_path(topic: &str) -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        Some(PathBuf::from("/dev/shm").join(topic.trim_start_matches('/')))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = topic;
        None
    }
}

/// Check if the host supports robust, time-bounded process-shared mutexes
pub fn has_robust_mutex() -> bool {
    cfg!(target_os = "linux")
}

/// Whether a mapped region of `actual` bytes was sized for `required` bytes.
///
/// Linux reports the exact length passed to `ftruncate`. macOS rounds shared
/// memory objects up to whole pages, so anything inside the last page matches.
pub fn region_size_matches(actual: usize, required: usize) -> bool {
    #[cfg(target_os = "macos")]
    {
        let page = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
            n if n > 0 => n as usize,
            _ => 4096,
        };
        actual >= required && actual - required < page
    }

    #[cfg(not(target_os = "macos"))]
    {
        actual == required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_topics() {
        assert!(validate_topic("/example_topic").is_ok());
        assert!(validate_topic("/a").is_ok());
        assert!(validate_topic("/imu.raw-0").is_ok());
    }

    #[test]
    fn test_invalid_topics() {
        assert!(validate_topic("example_topic").is_err());
        assert!(validate_topic("/").is_err());
        assert!(validate_topic("/robot/imu").is_err());
        assert!(validate_topic("/bad\0name").is_err());

        let long = format!("/{}", "x".repeat(max_topic_len()));
        assert!(matches!(
            validate_topic(&long),
            Err(RingbusError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_region_size_must_match() {
        assert!(region_size_matches(4096 + 64, 4096 + 64));
        assert!(!region_size_matches(4096, 4096 + 64));
        assert!(!region_size_matches(1 << 20, 4096));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_region_size_is_exact() {
        assert!(!region_size_matches(4096 + 64, 4096 + 32));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_object_path() {
        let path = shm_object_path("/camera").unwrap();
        assert_eq!(path, PathBuf::from("/dev/shm/camera"));
    }
}
