//! Circular index bookkeeping for a fixed number of slots.
//!
//! [`RingCursor`] is the arithmetic half of the channel protocol: it decides
//! which slot a write or read touches and how `start`, `end` and `size` move.
//! The channel loads a cursor from its shared header under the lock, applies
//! one operation and stores it back, so these rules are the only place the
//! index math lives.

/// Which retained message a read takes
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum SubscriberMode {
    /// Oldest retained message first; strict publish order
    #[default]
    #[serde(rename = "GET_FIRST", alias = "first", alias = "get_first")]
    GetFirst,
    /// Newest retained message first
    #[serde(rename = "GET_LAST", alias = "last", alias = "get_last")]
    GetLast,
}

impl std::fmt::Display for SubscriberMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriberMode::GetFirst => write!(f, "GET_FIRST"),
            SubscriberMode::GetLast => write!(f, "GET_LAST"),
        }
    }
}

/// Result of placing one message into the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The message took a free slot
    Stored,
    /// The ring was full; the oldest retained message was overwritten
    OverwroteOldest,
}

/// Snapshot of the ring indices.
///
/// Invariants: `start < capacity`, `end < capacity`, `size <= capacity` and
/// `end == (start + size) % capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursor {
    pub capacity: usize,
    pub start: usize,
    pub end: usize,
    pub size: usize,
}

impl RingCursor {
    pub fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            start: 0,
            end: 0,
            size: 0,
        }
    }

    /// Check the invariants; a ring left half-updated by a dead process fails this
    pub fn is_consistent(&self) -> bool {
        self.capacity > 0
            && self.start < self.capacity
            && self.end < self.capacity
            && self.size <= self.capacity
            && (self.start + self.size) % self.capacity == self.end
    }

    /// Claim the slot for the next write.
    ///
    /// Returns the slot index to fill. When the ring is full the write still
    /// happens and `start` moves past the oldest message.
    pub fn push(&mut self) -> (usize, EnqueueOutcome) {
        let slot = self.end;
        self.end = (self.end + 1) % self.capacity;

        if self.size < self.capacity {
            self.size += 1;
            (slot, EnqueueOutcome::Stored)
        } else {
            self.start = (self.start + 1) % self.capacity;
            (slot, EnqueueOutcome::OverwroteOldest)
        }
    }

    /// Release one message according to `mode` and return the slot it occupied.
    ///
    /// `GetFirst` advances `start`. `GetLast` reads the newest slot and moves
    /// `end` back over it, so the slot is reclaimed and the remaining messages
    /// keep their order.
    pub fn pop(&mut self, mode: SubscriberMode) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        let slot = match mode {
            SubscriberMode::GetFirst => {
                let slot = self.start;
                self.start = (self.start + 1) % self.capacity;
                slot
            }
            SubscriberMode::GetLast => {
                let slot = self.newest_slot();
                self.end = slot;
                slot
            }
        };
        self.size -= 1;
        Some(slot)
    }

    /// Slot holding the most recent write
    pub fn newest_slot(&self) -> usize {
        (self.end + self.capacity - 1) % self.capacity
    }

    /// Occupied slots, oldest first
    pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).map(move |i| (self.start + i) % self.capacity)
    }
}
