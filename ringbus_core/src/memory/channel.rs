use super::platform::region_size_matches;
use super::ring::{EnqueueOutcome, RingCursor, SubscriberMode};
use super::shm_lock::{LockError, ShmMutex, ShmMutexGuard};
use super::shm_region::ShmRegion;
use crate::error::{RingbusError, RingbusResult};
use serde::{Deserialize, Serialize};
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// Safety constants to prevent dangerous configurations
const MAX_CAPACITY: usize = 1_000_000; // Maximum number of slots
const MAX_MESSAGE_LENGTH: usize = 16 * 1024 * 1024; // Maximum bytes per slot
const MAX_TOTAL_SIZE: usize = 1 << 30; // Maximum mapped size (1 GiB)

const READY_POLL_INTERVAL: Duration = Duration::from_micros(200);
const CREATE_OR_OPEN_ATTEMPTS: usize = 3;

/// Header at offset 0 of every channel region.
///
/// Every process attaching to a channel must agree on this layout bit for bit.
/// The atomics have the size and alignment of the plain integers they replace;
/// `capacity` doubles as the ready flag and is stored last by the creator.
#[repr(C)]
struct ChannelHeader {
    capacity: AtomicUsize,
    start: AtomicUsize,
    end: AtomicUsize,
    size: AtomicUsize,
    lock: ShmMutex,
    reader_count: AtomicU64,
}

/// Byte offset of slot 0
pub const HEADER_SIZE: usize = mem::size_of::<ChannelHeader>();

/// Per-handle tuning for channel creation and locking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOptions {
    /// Upper bound on waiting for the channel lock; `None` waits forever
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: Option<u64>,

    /// How long an attacher waits for the creator to finish the header
    #[serde(default = "default_init_timeout_ms")]
    pub init_timeout_ms: u64,

    /// Fail with `AlreadyExists` instead of attaching to an existing channel
    #[serde(default)]
    pub exclusive: bool,
}

fn default_lock_timeout_ms() -> Option<u64> {
    Some(2_000)
}

fn default_init_timeout_ms() -> u64 {
    1_000
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            init_timeout_ms: default_init_timeout_ms(),
            exclusive: false,
        }
    }
}

impl ChannelOptions {
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout_ms = timeout.map(whole_millis);
        self
    }

    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout_ms = whole_millis(timeout);
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }
}

// Rounds up so a sub-millisecond bound never becomes a zero wait
fn whole_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

/// Point-in-time view of a channel header, read under the lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub topic: String,
    pub capacity: usize,
    pub message_length: usize,
    pub size: usize,
    pub start: usize,
    pub end: usize,
    pub reader_count: u64,
}

/// A ring buffer of fixed-size slots living in a named shared memory region.
///
/// The region is treated as an arena: the header sits at offset 0 and slot
/// `i` starts at `HEADER_SIZE + i * message_length`. Every mutation happens
/// under the process-shared lock embedded in the header.
pub struct Channel {
    region: ShmRegion,
    topic: String,
    capacity: usize,
    message_length: usize,
    lock_timeout: Option<Duration>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("topic", &self.topic)
            .field("capacity", &self.capacity)
            .field("message_length", &self.message_length)
            .field("owner", &self.region.is_owner())
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Total mapped size for a channel, validated against the safety limits
    pub fn required_size(capacity: usize, message_length: usize) -> RingbusResult<usize> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(RingbusError::invalid_argument(format!(
                "capacity {} outside 1..={}",
                capacity, MAX_CAPACITY
            )));
        }
        if message_length == 0 || message_length > MAX_MESSAGE_LENGTH {
            return Err(RingbusError::invalid_argument(format!(
                "message length {} outside 1..={}",
                message_length, MAX_MESSAGE_LENGTH
            )));
        }

        let total = capacity
            .checked_mul(message_length)
            .and_then(|data| data.checked_add(HEADER_SIZE))
            .ok_or_else(|| RingbusError::invalid_argument("channel size overflows usize"))?;
        if total > MAX_TOTAL_SIZE {
            return Err(RingbusError::invalid_argument(format!(
                "channel size {} exceeds maximum {}",
                total, MAX_TOTAL_SIZE
            )));
        }
        Ok(total)
    }

    /// Create a new channel; fails with `AlreadyExists` if the name is taken.
    ///
    /// The exclusive create makes this process the single initializer. The
    /// header is fully written and the lock constructed before `capacity` is
    /// published, so an attacher that sees a non-zero capacity sees the rest.
    pub fn create(
        topic: &str,
        capacity: usize,
        message_length: usize,
        options: &ChannelOptions,
    ) -> RingbusResult<Self> {
        let total_size = Self::required_size(capacity, message_length)?;
        let region = ShmRegion::create(topic, total_size)?;

        let channel = Channel {
            region,
            topic: topic.to_string(),
            capacity,
            message_length,
            lock_timeout: options.lock_timeout(),
        };

        let header = channel.header();
        header.start.store(0, Ordering::Relaxed);
        header.end.store(0, Ordering::Relaxed);
        header.size.store(0, Ordering::Relaxed);
        header.reader_count.store(0, Ordering::Relaxed);
        // The region is fresh and zeroed, and nobody can use the lock before
        // capacity is published below
        unsafe { header.lock.init_in_place() }.map_err(|e| RingbusError::CreationFailed {
            topic: topic.to_string(),
            source: e,
        })?;
        header.capacity.store(capacity, Ordering::Release);

        log::info!(
            "Created channel '{}' (capacity: {}, message length: {}, size: {} bytes)",
            topic,
            capacity,
            message_length,
            total_size
        );

        Ok(channel)
    }

    /// Create the channel, or attach to it if another publisher already did.
    ///
    /// An existing channel must have the same capacity and message length.
    pub fn open_or_create(
        topic: &str,
        capacity: usize,
        message_length: usize,
        options: &ChannelOptions,
    ) -> RingbusResult<Self> {
        if options.exclusive {
            return Self::create(topic, capacity, message_length, options);
        }

        let mut last_err = None;
        for _ in 0..CREATE_OR_OPEN_ATTEMPTS {
            match Self::create(topic, capacity, message_length, options) {
                Err(RingbusError::AlreadyExists(_)) => {}
                other => return other,
            }
            // The owner can remove the name between our create and open
            match Self::open(topic, Some(capacity), message_length, options) {
                Err(e @ RingbusError::NotFound(_)) => last_err = Some(e),
                other => return other,
            }
        }
        Err(last_err.unwrap_or_else(|| RingbusError::NotFound(topic.to_string())))
    }

    /// Attach to an existing channel without initializing anything
    pub fn attach(
        topic: &str,
        message_length: usize,
        options: &ChannelOptions,
    ) -> RingbusResult<Self> {
        Self::open(topic, None, message_length, options)
    }

    fn open(
        topic: &str,
        expected_capacity: Option<usize>,
        message_length: usize,
        options: &ChannelOptions,
    ) -> RingbusResult<Self> {
        if message_length == 0 {
            return Err(RingbusError::invalid_argument("message length must be non-zero"));
        }

        let init_timeout = options.init_timeout();
        let region = ShmRegion::open(topic, HEADER_SIZE, init_timeout)?;
        let capacity = wait_until_ready(&region, init_timeout)?;

        if let Some(expected) = expected_capacity {
            if expected != capacity {
                return Err(RingbusError::layout(
                    topic,
                    format!("capacity is {}, expected {}", capacity, expected),
                ));
            }
        }

        let required = Self::required_size(capacity, message_length)?;
        if !region_size_matches(region.size(), required) {
            return Err(RingbusError::layout(
                topic,
                format!(
                    "region is {} bytes, capacity {} with message length {} needs {}",
                    region.size(),
                    capacity,
                    message_length,
                    required
                ),
            ));
        }

        log::info!(
            "Attached to channel '{}' (capacity: {}, message length: {})",
            topic,
            capacity,
            message_length
        );

        Ok(Channel {
            region,
            topic: topic.to_string(),
            capacity,
            message_length,
            lock_timeout: options.lock_timeout(),
        })
    }

    fn header(&self) -> &ChannelHeader {
        // The region is page aligned and at least HEADER_SIZE bytes long
        unsafe { &*(self.region.as_ptr() as *const ChannelHeader) }
    }

    /// Start of slot `index`, checked against the mapped region
    fn slot_ptr(&self, index: usize) -> RingbusResult<*mut u8> {
        let bounds = (index < self.capacity)
            .then(|| index.checked_mul(self.message_length))
            .flatten()
            .and_then(|data| data.checked_add(HEADER_SIZE))
            .and_then(|offset| Some((offset, offset.checked_add(self.message_length)?)));
        match bounds {
            Some((offset, slot_end)) if slot_end <= self.region.size() => {
                // offset + message_length lies inside the mapping
                Ok(unsafe { self.region.as_ptr().add(offset) })
            }
            _ => Err(RingbusError::layout(
                &self.topic,
                format!(
                    "slot {} outside capacity {} of a {} byte region",
                    index,
                    self.capacity,
                    self.region.size()
                ),
            )),
        }
    }

    fn lock(&self) -> RingbusResult<ShmMutexGuard<'_>> {
        let guard = self.header().lock.lock(self.lock_timeout).map_err(|e| match e {
            LockError::Timeout => RingbusError::LockTimeout {
                topic: self.topic.clone(),
                timeout: self.lock_timeout.unwrap_or_default(),
            },
            LockError::Unrecoverable => RingbusError::LockUnrecoverable(self.topic.clone()),
            LockError::Os(e) => RingbusError::Io(e),
        })?;
        self.repair_if_recovered(&guard);
        Ok(guard)
    }

    // A guard taken over from a dead owner means the cursor may be half written
    fn repair_if_recovered(&self, guard: &ShmMutexGuard<'_>) {
        if !guard.recovered() {
            return;
        }
        let cursor = self.load_cursor();
        if cursor.is_consistent() {
            log::warn!(
                "Channel '{}': previous lock owner died, ring state is intact",
                self.topic
            );
        } else {
            log::warn!(
                "Channel '{}': previous lock owner died mid-update ({:?}), discarding retained messages",
                self.topic,
                cursor
            );
            self.store_cursor(&RingCursor::empty(self.capacity));
        }
    }

    // Must be called with the lock held
    fn load_cursor(&self) -> RingCursor {
        let header = self.header();
        RingCursor {
            capacity: self.capacity,
            start: header.start.load(Ordering::Relaxed),
            end: header.end.load(Ordering::Relaxed),
            size: header.size.load(Ordering::Relaxed),
        }
    }

    // Must be called with the lock held
    fn store_cursor(&self, cursor: &RingCursor) {
        let header = self.header();
        header.start.store(cursor.start, Ordering::Relaxed);
        header.end.store(cursor.end, Ordering::Relaxed);
        header.size.store(cursor.size, Ordering::Release);
    }

    /// Copy `payload` into the next slot, overwriting the oldest message when full
    pub fn enqueue(&self, payload: &[u8]) -> RingbusResult<EnqueueOutcome> {
        if payload.len() != self.message_length {
            return Err(RingbusError::invalid_argument(format!(
                "payload is {} bytes, channel '{}' carries {} byte messages",
                payload.len(),
                self.topic,
                self.message_length
            )));
        }

        let _guard = self.lock()?;
        let mut cursor = self.load_cursor();
        let (slot, outcome) = cursor.push();
        let dst = self.slot_ptr(slot)?;
        unsafe {
            ptr::copy_nonoverlapping(payload.as_ptr(), dst, self.message_length);
        }
        self.store_cursor(&cursor);
        Ok(outcome)
    }

    /// Move one message into `out` according to `mode`.
    ///
    /// Returns `Ok(false)` when there is nothing to read. An empty channel is
    /// detected without taking the lock. The lock is released before this
    /// returns, so callers may act on `out` freely.
    pub fn dequeue(&self, mode: SubscriberMode, out: &mut Vec<u8>) -> RingbusResult<bool> {
        if self.len_hint() == 0 {
            return Ok(false);
        }

        let _guard = self.lock()?;
        let mut cursor = self.load_cursor();
        let Some(slot) = cursor.pop(mode) else {
            return Ok(false);
        };
        let src = self.slot_ptr(slot)?;

        out.clear();
        out.resize(self.message_length, 0);
        unsafe {
            ptr::copy_nonoverlapping(src, out.as_mut_ptr(), self.message_length);
        }
        self.store_cursor(&cursor);
        Ok(true)
    }

    /// Occupied slot count read without the lock; may be stale immediately
    pub fn len_hint(&self) -> usize {
        self.header().size.load(Ordering::Acquire)
    }

    pub fn increment_readers(&self) -> RingbusResult<u64> {
        let _guard = self.lock()?;
        Ok(self.header().reader_count.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn decrement_readers(&self) -> RingbusResult<u64> {
        let _guard = self.lock()?;
        let readers = &self.header().reader_count;
        let previous = readers.load(Ordering::Relaxed);
        let next = previous.saturating_sub(1);
        readers.store(next, Ordering::Relaxed);
        Ok(next)
    }

    pub fn stats(&self) -> RingbusResult<ChannelStats> {
        let _guard = self.lock()?;
        let cursor = self.load_cursor();
        Ok(ChannelStats {
            topic: self.topic.clone(),
            capacity: self.capacity,
            message_length: self.message_length,
            size: cursor.size,
            start: cursor.start,
            end: cursor.end,
            reader_count: self.header().reader_count.load(Ordering::Relaxed),
        })
    }

    /// Copies of all retained messages, oldest first, without consuming them
    pub fn retained_messages(&self) -> RingbusResult<Vec<Vec<u8>>> {
        let _guard = self.lock()?;
        let cursor = self.load_cursor();
        cursor
            .occupied()
            .map(|slot| -> RingbusResult<Vec<u8>> {
                let src = self.slot_ptr(slot)?;
                let mut message = vec![0u8; self.message_length];
                unsafe {
                    ptr::copy_nonoverlapping(src, message.as_mut_ptr(), self.message_length);
                }
                Ok(message)
            })
            .collect()
    }

    /// Whether some holder currently owns the channel lock.
    ///
    /// Never waits. Finding the lock abandoned by a dead owner counts as free
    /// and repairs the ring exactly like a regular lock would.
    pub fn lock_is_held(&self) -> bool {
        match self.header().lock.try_lock() {
            Ok(Some(guard)) => {
                self.repair_if_recovered(&guard);
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("Channel '{}': checking the lock failed: {:?}", self.topic, e);
                true
            }
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn message_length(&self) -> usize {
        self.message_length
    }

    /// True if this handle created the channel and will remove its name
    pub fn is_owner(&self) -> bool {
        self.region.is_owner()
    }
}

fn wait_until_ready(region: &ShmRegion, timeout: Duration) -> RingbusResult<usize> {
    let header = unsafe { &*(region.as_ptr() as *const ChannelHeader) };
    let deadline = Instant::now() + timeout;
    loop {
        let capacity = header.capacity.load(Ordering::Acquire);
        if capacity != 0 {
            return Ok(capacity);
        }
        if Instant::now() >= deadline {
            return Err(RingbusError::NotReady {
                topic: region.name().to_string(),
                timeout,
            });
        }
        std::thread::sleep(READY_POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_topic(tag: &str) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("/rbc_{}_{}", tag, &id[..12])
    }

    #[test]
    fn test_header_layout() {
        let word = mem::size_of::<usize>();
        assert_eq!(mem::offset_of!(ChannelHeader, capacity), 0);
        assert_eq!(mem::offset_of!(ChannelHeader, start), word);
        assert_eq!(mem::offset_of!(ChannelHeader, end), 2 * word);
        assert_eq!(mem::offset_of!(ChannelHeader, size), 3 * word);
        assert_eq!(mem::offset_of!(ChannelHeader, lock), 4 * word);
        assert_eq!(
            mem::offset_of!(ChannelHeader, reader_count),
            4 * word + mem::size_of::<libc::pthread_mutex_t>()
        );
    }

    #[test]
    fn test_required_size_limits() {
        assert_eq!(Channel::required_size(3, 1).unwrap(), HEADER_SIZE + 3);
        assert!(Channel::required_size(0, 8).is_err());
        assert!(Channel::required_size(8, 0).is_err());
        assert!(Channel::required_size(MAX_CAPACITY + 1, 1).is_err());
        assert!(Channel::required_size(MAX_CAPACITY, MAX_MESSAGE_LENGTH).is_err());
    }

    #[test]
    fn test_slots_follow_header() {
        let topic = unique_topic("slots");
        let channel = Channel::create(&topic, 4, 2, &ChannelOptions::default()).unwrap();
        channel.enqueue(&[7, 8]).unwrap();

        let base = channel.region.as_ptr();
        unsafe {
            assert_eq!(*base.add(HEADER_SIZE), 7);
            assert_eq!(*base.add(HEADER_SIZE + 1), 8);
        }
    }

    #[test]
    fn test_open_or_create_checks_capacity() {
        let topic = unique_topic("cap");
        let options = ChannelOptions::default();
        let _first = Channel::open_or_create(&topic, 4, 8, &options).unwrap();

        let second = Channel::open_or_create(&topic, 4, 8, &options).unwrap();
        assert!(!second.is_owner());

        assert!(matches!(
            Channel::open_or_create(&topic, 5, 8, &options),
            Err(RingbusError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_attach_rejects_oversized_messages() {
        let topic = unique_topic("len");
        let _owner = Channel::create(&topic, 2, 4, &ChannelOptions::default()).unwrap();
        assert!(matches!(
            Channel::attach(&topic, 4096, &ChannelOptions::default()),
            Err(RingbusError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_attach_rejects_undersized_messages() {
        let topic = unique_topic("short");
        let _owner = Channel::create(&topic, 4, 4, &ChannelOptions::default()).unwrap();
        // Slots of 2 bytes would fit inside the region but misplace every slot after 0
        assert!(matches!(
            Channel::attach(&topic, 2, &ChannelOptions::default()),
            Err(RingbusError::LayoutMismatch { .. })
        ));
        assert!(matches!(
            Channel::open_or_create(&topic, 4, 2, &ChannelOptions::default()),
            Err(RingbusError::LayoutMismatch { .. })
        ));
        assert!(Channel::attach(&topic, 4, &ChannelOptions::default()).is_ok());
    }

    #[test]
    fn test_slot_bounds_are_checked() {
        let topic = unique_topic("bounds");
        let channel = Channel::create(&topic, 3, 2, &ChannelOptions::default()).unwrap();
        assert!(channel.slot_ptr(2).is_ok());
        assert!(matches!(
            channel.slot_ptr(3),
            Err(RingbusError::LayoutMismatch { .. })
        ));
        assert!(channel.slot_ptr(usize::MAX).is_err());
    }

    #[test]
    fn test_sub_millisecond_timeouts_round_up() {
        let options = ChannelOptions::default()
            .with_lock_timeout(Some(Duration::from_micros(100)))
            .with_init_timeout(Duration::from_micros(1));
        assert_eq!(options.lock_timeout_ms, Some(1));
        assert_eq!(options.init_timeout_ms, 1);

        let options = ChannelOptions::default().with_lock_timeout(Some(Duration::from_millis(3)));
        assert_eq!(options.lock_timeout(), Some(Duration::from_millis(3)));
        assert_eq!(
            ChannelOptions::default().with_lock_timeout(None).lock_timeout(),
            None
        );
        assert_eq!(
            ChannelOptions::default()
                .with_init_timeout(Duration::ZERO)
                .init_timeout_ms,
            0
        );
    }

    // Leaves the lock to a thread that exits mid-update with a torn cursor
    #[cfg(target_os = "linux")]
    fn abandon_lock_mid_update(channel: &Channel) {
        std::thread::scope(|s| {
            s.spawn(|| {
                let guard = channel.lock().unwrap();
                channel.header().size.store(3, Ordering::Relaxed);
                mem::forget(guard);
            });
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_lock_check_repairs_after_dead_owner() {
        let topic = unique_topic("dead_check");
        let channel = Channel::create(&topic, 4, 1, &ChannelOptions::default()).unwrap();
        channel.enqueue(&[9]).unwrap();
        abandon_lock_mid_update(&channel);

        assert!(!channel.lock_is_held());
        let stats = channel.stats().unwrap();
        assert_eq!((stats.size, stats.start, stats.end), (0, 0, 0));

        channel.enqueue(&[5]).unwrap();
        assert_eq!(channel.retained_messages().unwrap(), vec![vec![5]]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_operations_repair_after_dead_owner() {
        let topic = unique_topic("dead_op");
        let options = ChannelOptions::default().with_lock_timeout(Some(Duration::from_millis(200)));
        let channel = Channel::create(&topic, 4, 1, &options).unwrap();
        let reader = Channel::attach(&topic, 1, &options).unwrap();
        channel.enqueue(&[1]).unwrap();
        abandon_lock_mid_update(&channel);

        // The next regular lock, from another handle, takes the lock over
        assert_eq!(reader.enqueue(&[2]).unwrap(), EnqueueOutcome::Stored);
        let mut out = Vec::new();
        assert!(reader.dequeue(SubscriberMode::GetFirst, &mut out).unwrap());
        assert_eq!(out, vec![2]);
        assert!(!reader.dequeue(SubscriberMode::GetFirst, &mut out).unwrap());
    }

    #[test]
    fn test_attach_waits_for_initializer() {
        let topic = unique_topic("ready");
        // A bare region with a zero header looks like a creator that never finished
        let _bare = ShmRegion::create(&topic, HEADER_SIZE + 16).unwrap();
        let options = ChannelOptions::default().with_init_timeout(Duration::from_millis(20));
        assert!(matches!(
            Channel::attach(&topic, 4, &options),
            Err(RingbusError::NotReady { .. })
        ));
    }

    #[test]
    fn test_lock_timeout_is_reported() {
        let topic = unique_topic("busy");
        let options = ChannelOptions::default().with_lock_timeout(Some(Duration::from_millis(20)));
        let channel = Channel::create(&topic, 2, 1, &options).unwrap();
        let other = Channel::attach(&topic, 1, &options).unwrap();

        let _held = channel.lock().unwrap();
        assert!(other.lock_is_held());
        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(matches!(
                    other.enqueue(&[1]),
                    Err(RingbusError::LockTimeout { .. })
                ));
            });
        });
    }

    #[test]
    fn test_readers_saturate_at_zero() {
        let topic = unique_topic("readers");
        let channel = Channel::create(&topic, 2, 1, &ChannelOptions::default()).unwrap();
        assert_eq!(channel.increment_readers().unwrap(), 1);
        assert_eq!(channel.decrement_readers().unwrap(), 0);
        assert_eq!(channel.decrement_readers().unwrap(), 0);
    }
}
