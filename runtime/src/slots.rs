//! Per-room-type coordination slots.
//!
//! One async mutex per room type serializes every operation that changes the room
//! type's active reservation set. Slots for different room types are independent, so
//! bookings on disjoint room types never wait on each other. Acquisition is bounded:
//! a caller that cannot get the slot within the configured timeout receives
//! [`BookingError::Busy`] instead of queueing indefinitely.

use crate::metrics::BookingMetrics;
use dashmap::DashMap;
use hotel_booking_core::error::BookingError;
use hotel_booking_core::types::RoomTypeId;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Exclusive hold on a room type's slot, released on drop
#[derive(Debug)]
pub struct SlotGuard {
    room_type_id: RoomTypeId,
    _guard: OwnedMutexGuard<()>,
}

impl SlotGuard {
    /// Room type this guard serializes
    #[must_use]
    pub const fn room_type_id(&self) -> RoomTypeId {
        self.room_type_id
    }
}

/// Registry of coordination slots, created lazily per room type.
///
/// Entries are never removed, so a room type id maps to one mutex for the life of the
/// registry, even across removal and re-creation of the room type.
#[derive(Debug)]
pub struct RoomSlots {
    slots: DashMap<RoomTypeId, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl RoomSlots {
    /// Creates a registry whose acquisitions give up after `timeout`
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }

    /// Acquires the slot for `room_type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Busy`] if the slot is not free within the timeout.
    pub async fn acquire(&self, room_type_id: RoomTypeId) -> Result<SlotGuard, BookingError> {
        // Clone the Arc out so no map shard lock is held across the await.
        let slot = Arc::clone(self.slots.entry(room_type_id).or_default().value());

        let started = Instant::now();
        let acquired = tokio::time::timeout(self.timeout, slot.lock_owned()).await;
        let waited = started.elapsed();
        BookingMetrics::record_slot_wait(waited);

        match acquired {
            Ok(guard) => {
                tracing::debug!(
                    room_type_id = %room_type_id,
                    waited_us = waited.as_micros(),
                    "Acquired room type slot"
                );
                Ok(SlotGuard {
                    room_type_id,
                    _guard: guard,
                })
            }
            Err(_) => {
                tracing::warn!(
                    room_type_id = %room_type_id,
                    timeout_ms = self.timeout.as_millis(),
                    "Timed out waiting for room type slot"
                );
                Err(BookingError::Busy { room_type_id })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn held_slot_makes_second_caller_busy() {
        let slots = RoomSlots::new(Duration::from_millis(20));
        let room = RoomTypeId::new();

        let guard = slots.acquire(room).await.unwrap();
        assert_eq!(guard.room_type_id(), room);
        assert_eq!(
            slots.acquire(room).await.unwrap_err(),
            BookingError::Busy { room_type_id: room }
        );

        drop(guard);
        assert!(slots.acquire(room).await.is_ok());
    }

    #[tokio::test]
    async fn distinct_room_types_do_not_block_each_other() {
        let slots = RoomSlots::new(Duration::from_millis(20));
        let _first = slots.acquire(RoomTypeId::new()).await.unwrap();
        assert!(slots.acquire(RoomTypeId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn waiter_gets_slot_once_released() {
        let slots = Arc::new(RoomSlots::new(Duration::from_secs(1)));
        let room = RoomTypeId::new();
        let guard = slots.acquire(room).await.unwrap();

        let waiter = {
            let slots = Arc::clone(&slots);
            tokio::spawn(async move { slots.acquire(room).await.map(|g| g.room_type_id()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(guard);

        assert_eq!(waiter.await.unwrap(), Ok(room));
    }
}
