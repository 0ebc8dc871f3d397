use async_trait::async_trait;
use crate::models::reservation::Reservation;

#[cfg(test)]
pub mod memory_repo;
pub mod postgres_repo;

/// Storage seam for the reservation handlers. Each method maps to exactly one
/// statement against the backing store.
#[async_trait]
pub trait ReservationRepo: Send + Sync {
    async fn license_plate_exists(&self, license_plate: &str) -> anyhow::Result<bool>;

    /// Inserts the record and returns the id the store assigned to it.
    async fn insert_reservation(&self, reservation: &Reservation) -> anyhow::Result<i32>;

    /// Replaces every field of the row keyed by `reservation_id`. Returns the
    /// number of rows affected, which is 0 for an unknown id.
    async fn update_reservation(
        &self,
        reservation_id: i32,
        reservation: &Reservation,
    ) -> anyhow::Result<u64>;

    async fn delete_reservation(&self, reservation_id: i32) -> anyhow::Result<u64>;
}
