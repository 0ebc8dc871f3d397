use anyhow::Context;
use async_trait::async_trait;
use bb8_postgres::bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::NoTls;
use tracing::debug;
use crate::config::DatabaseSettings;
use crate::models::reservation::Reservation;
use crate::repositories::ReservationRepo;

const LICENSE_PLATE_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM reservations WHERE license_plate = $1)";

const INSERT_RESERVATION: &str = "INSERT INTO reservations \
    (first_name, last_name, phone_number, license_plate, date_of_departure, date_of_arrival) \
    VALUES ($1, $2, $3, $4, $5, $6) \
    RETURNING reservation_id";

const UPDATE_RESERVATION: &str = "UPDATE reservations \
    SET first_name = $1, last_name = $2, phone_number = $3, license_plate = $4, \
    date_of_departure = $5, date_of_arrival = $6 \
    WHERE reservation_id = $7";

const DELETE_RESERVATION: &str = "DELETE FROM reservations WHERE reservation_id = $1";

pub struct PostgresConnectionRepo {
    postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresConnectionRepo {
    pub fn new(
        postgres_connection: Pool<PostgresConnectionManager<NoTls>>,
    ) -> Self {
        Self {
            postgres_connection
        }
    }

    /// Builds the pool from `settings` and pings the database once. A failed
    /// ping is returned as an error so startup can abort.
    pub async fn connect(
        settings: &DatabaseSettings,
        pool_size: u32,
    ) -> anyhow::Result<Self> {
        let manager = PostgresConnectionManager::new(settings.postgres_config(), NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .await
            .context("Error building the postgres connection pool")?;

        let repo = Self::new(pool);
        repo.ping().await?;
        Ok(repo)
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let conn = self.get_postgres_connection().await?;
        conn.execute("SELECT 1", &[])
            .await
            .context("Error when trying to ping database")?;
        Ok(())
    }

    async fn get_postgres_connection(
        &self,
    ) -> anyhow::Result<PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        self.postgres_connection
            .get()
            .await
            .context("Failed to retrieve a valid connection from postgres pool")
    }
}

#[async_trait]
impl ReservationRepo for PostgresConnectionRepo {
    async fn license_plate_exists(&self, license_plate: &str) -> anyhow::Result<bool> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_one(LICENSE_PLATE_EXISTS, &[&license_plate])
            .await
            .context("Error querying license plate existence")?;

        row.try_get(0).context("Error reading license plate existence flag")
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> anyhow::Result<i32> {
        let conn = self.get_postgres_connection().await?;
        let row = conn
            .query_one(
                INSERT_RESERVATION,
                &[
                    &reservation.first_name,
                    &reservation.last_name,
                    &reservation.phone_number,
                    &reservation.license_plate,
                    &reservation.date_of_departure,
                    &reservation.date_of_arrival,
                ],
            )
            .await
            .context("Error inserting reservation")?;

        row.try_get(0).context("Error getting inserted reservation id")
    }

    async fn update_reservation(
        &self,
        reservation_id: i32,
        reservation: &Reservation,
    ) -> anyhow::Result<u64> {
        let conn = self.get_postgres_connection().await?;
        let affected = conn
            .execute(
                UPDATE_RESERVATION,
                &[
                    &reservation.first_name,
                    &reservation.last_name,
                    &reservation.phone_number,
                    &reservation.license_plate,
                    &reservation.date_of_departure,
                    &reservation.date_of_arrival,
                    &reservation_id,
                ],
            )
            .await
            .context("Error updating reservation")?;

        debug!("Updated {} row(s) for reservation id: {}", affected, reservation_id);
        Ok(affected)
    }

    async fn delete_reservation(&self, reservation_id: i32) -> anyhow::Result<u64> {
        let conn = self.get_postgres_connection().await?;
        let affected = conn
            .execute(DELETE_RESERVATION, &[&reservation_id])
            .await
            .context("Error deleting reservation")?;

        debug!("Deleted {} row(s) for reservation id: {}", affected, reservation_id);
        Ok(affected)
    }
}
