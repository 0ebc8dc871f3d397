use std::collections::BTreeMap;
use async_trait::async_trait;
use tokio::sync::Mutex;
use crate::models::reservation::Reservation;
use crate::repositories::ReservationRepo;

/// In-process stand-in for the reservations table, keyed by id with a
/// serial counter like the real column.
#[derive(Default)]
pub struct InMemoryReservationRepo {
    rows: Mutex<BTreeMap<i32, Reservation>>,
    next_id: Mutex<i32>,
}

impl InMemoryReservationRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rows(&self) -> Vec<Reservation> {
        self.rows.lock().await.values().cloned().collect()
    }

    pub async fn count_plate(&self, license_plate: &str) -> usize {
        self.rows
            .lock()
            .await
            .values()
            .filter(|r| r.license_plate == license_plate)
            .count()
    }
}

#[async_trait]
impl ReservationRepo for InMemoryReservationRepo {
    async fn license_plate_exists(&self, license_plate: &str) -> anyhow::Result<bool> {
        Ok(self.count_plate(license_plate).await > 0)
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> anyhow::Result<i32> {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let id = *next_id;

        let mut row = reservation.clone();
        row.reservation_id = id;
        self.rows.lock().await.insert(id, row);
        Ok(id)
    }

    async fn update_reservation(
        &self,
        reservation_id: i32,
        reservation: &Reservation,
    ) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&reservation_id) {
            Some(row) => {
                *row = Reservation {
                    reservation_id,
                    ..reservation.clone()
                };
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_reservation(&self, reservation_id: i32) -> anyhow::Result<u64> {
        Ok(self.rows.lock().await.remove(&reservation_id).map_or(0, |_| 1))
    }
}
