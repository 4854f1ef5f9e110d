//! Room catalog.
//!
//! Read-mostly map of room types. Lookups never block bookings on other room types;
//! mutations are routed through the coordinator, which checks privileges and holds the
//! room type's slot while the inventory definition changes.

use dashmap::DashMap;
use hotel_booking_core::error::BookingError;
use hotel_booking_core::types::{RoomFilter, RoomType, RoomTypeId};

/// Room types known to the hotel
#[derive(Debug, Default)]
pub struct RoomCatalog {
    rooms: DashMap<RoomTypeId, RoomType>,
}

impl RoomCatalog {
    /// Creates an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `rooms`
    #[must_use]
    pub fn with_rooms<I>(rooms: I) -> Self
    where
        I: IntoIterator<Item = RoomType>,
    {
        Self {
            rooms: rooms.into_iter().map(|room| (room.id, room)).collect(),
        }
    }

    /// Looks up a room type.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RoomNotFound`] if the id is unknown.
    pub fn get(&self, id: RoomTypeId) -> Result<RoomType, BookingError> {
        self.rooms
            .get(&id)
            .map(|room| room.value().clone())
            .ok_or(BookingError::RoomNotFound(id))
    }

    /// Whether the id is known
    #[must_use]
    pub fn contains(&self, id: RoomTypeId) -> bool {
        self.rooms.contains_key(&id)
    }

    /// All room types, cheapest first
    #[must_use]
    pub fn list(&self) -> Vec<RoomType> {
        self.search(&RoomFilter::default())
    }

    /// Room types matching `filter`, cheapest first
    #[must_use]
    pub fn search(&self, filter: &RoomFilter) -> Vec<RoomType> {
        let mut rooms: Vec<RoomType> = self
            .rooms
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rooms.sort_by(|a, b| {
            a.price_per_night
                .cmp(&b.price_per_night)
                .then_with(|| a.name.cmp(&b.name))
        });
        rooms
    }

    /// Inserts or replaces a room type, returning the previous definition
    pub fn upsert(&self, room: RoomType) -> Option<RoomType> {
        self.rooms.insert(room.id, room)
    }

    /// Removes a room type.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RoomNotFound`] if the id is unknown.
    pub fn remove(&self, id: RoomTypeId) -> Result<RoomType, BookingError> {
        self.rooms
            .remove(&id)
            .map(|(_, room)| room)
            .ok_or(BookingError::RoomNotFound(id))
    }

    /// Number of room types
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
