mod memory;
mod mongodb;
pub mod seed;

pub use self::memory::MemoryStore;
pub use self::mongodb::MongoDB;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Bill, Booking, Driver, User, Vehicle};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the HTTP handlers.
///
/// `update_*` replace the whole record and fail with `NotFound` when no
/// record has the same id. Inserts and updates enforce the unique keys
/// (user email, vehicle registration, driver licence) with `Duplicate`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn count_users(&self) -> StoreResult<u64>;

    async fn insert_vehicle(&self, vehicle: Vehicle) -> StoreResult<Vehicle>;
    async fn get_vehicle(&self, id: &str) -> StoreResult<Option<Vehicle>>;
    async fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>>;
    async fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()>;
    async fn delete_vehicle(&self, id: &str) -> StoreResult<()>;

    async fn insert_driver(&self, driver: Driver) -> StoreResult<Driver>;
    async fn get_driver(&self, id: &str) -> StoreResult<Option<Driver>>;
    async fn list_drivers(&self) -> StoreResult<Vec<Driver>>;
    async fn update_driver(&self, driver: &Driver) -> StoreResult<()>;
    async fn delete_driver(&self, id: &str) -> StoreResult<()>;

    /// Drops every vehicle and driver.
    async fn clear_fleet(&self) -> StoreResult<()>;

    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking>;
    async fn get_booking(&self, id: &str) -> StoreResult<Option<Booking>>;
    /// All bookings, or only those of `user_id`. Oldest first.
    async fn list_bookings(&self, user_id: Option<&str>) -> StoreResult<Vec<Booking>>;
    async fn update_booking(&self, booking: &Booking) -> StoreResult<()>;

    async fn insert_bill(&self, bill: Bill) -> StoreResult<Bill>;
    async fn get_bill(&self, id: &str) -> StoreResult<Option<Bill>>;
    async fn find_bill_for_booking(&self, booking_id: &str) -> StoreResult<Option<Bill>>;
    /// All bills, or only those of `user_id`. Oldest first.
    async fn list_bills(&self, user_id: Option<&str>) -> StoreResult<Vec<Bill>>;
    async fn update_bill(&self, bill: &Bill) -> StoreResult<()>;
}
