//! Helpers for plain-old-data message structs.
//!
//! Channels carry opaque byte blocks. These helpers view a `bytemuck::Pod`
//! value as its in-memory bytes and back; byte order stays the callers' concern.

use crate::error::{RingbusError, RingbusResult};
use bytemuck::Pod;

/// Read a `T` out of a received message.
///
/// `bytes` must be exactly `size_of::<T>()` long. The read is unaligned, so
/// any buffer handed to a subscriber callback can be decoded directly.
pub fn decode_pod<T: Pod>(bytes: &[u8]) -> RingbusResult<T> {
    let expected = std::mem::size_of::<T>();
    if bytes.len() != expected {
        return Err(RingbusError::invalid_argument(format!(
            "message is {} bytes, {} expects {}",
            bytes.len(),
            std::any::type_name::<T>(),
            expected
        )));
    }
    Ok(bytemuck::pod_read_unaligned(bytes))
}

/// Bytes of a `T` ready to publish
pub fn encode_pod<T: Pod>(value: &T) -> Vec<u8> {
    bytemuck::bytes_of(value).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    struct Pose {
        x: f64,
        y: f64,
        heading: f32,
        seq: u32,
    }

    #[test]
    fn test_decode_matches_encoded_value() {
        let pose = Pose {
            x: 1.5,
            y: -2.0,
            heading: 0.25,
            seq: 7,
        };
        let bytes = encode_pod(&pose);
        assert_eq!(bytes.len(), std::mem::size_of::<Pose>());
        assert_eq!(decode_pod::<Pose>(&bytes).unwrap(), pose);
    }

    #[test]
    fn test_decode_from_unaligned_buffer() {
        let mut buffer = vec![0u8; 1 + 4];
        buffer[1..].copy_from_slice(&42u32.to_ne_bytes());
        assert_eq!(decode_pod::<u32>(&buffer[1..]).unwrap(), 42);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = decode_pod::<u64>(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, RingbusError::InvalidArgument(_)));
    }
}
