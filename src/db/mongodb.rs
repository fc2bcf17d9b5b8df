use async_trait::async_trait;
use futures::StreamExt;
use log::{error, info};
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client, Collection, IndexModel,
};
use serde::de::DeserializeOwned;

use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{Bill, Booking, Driver, User, Vehicle};

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db_name: String,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, mongodb::error::Error> {
        let client_options = mongodb::options::ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        Ok(MongoDB {
            client,
            db_name: db_name.to_string(),
        })
    }

    fn get_users_collection(&self) -> Collection<User> {
        self.client.database(&self.db_name).collection("users")
    }

    fn get_vehicles_collection(&self) -> Collection<Vehicle> {
        self.client.database(&self.db_name).collection("vehicles")
    }

    fn get_drivers_collection(&self) -> Collection<Driver> {
        self.client.database(&self.db_name).collection("drivers")
    }

    fn get_bookings_collection(&self) -> Collection<Booking> {
        self.client.database(&self.db_name).collection("bookings")
    }

    fn get_bills_collection(&self) -> Collection<Bill> {
        self.client.database(&self.db_name).collection("bills")
    }

    /// Unique indexes backing the duplicate checks below.
    pub async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        async fn unique<T: Send + Sync>(
            coll: Collection<T>,
            field: &str,
        ) -> Result<(), mongodb::error::Error> {
            let model = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            coll.create_index(model, None).await.map(|_| ())
        }

        unique(self.get_users_collection(), "id").await?;
        unique(self.get_users_collection(), "email").await?;
        unique(self.get_vehicles_collection(), "id").await?;
        unique(self.get_vehicles_collection(), "registration_number").await?;
        unique(self.get_drivers_collection(), "id").await?;
        unique(self.get_drivers_collection(), "license_number").await?;
        unique(self.get_bookings_collection(), "id").await?;
        unique(self.get_bills_collection(), "id").await?;
        unique(self.get_bills_collection(), "booking_id").await?;
        info!("MongoDB indexes ready on {}", self.db_name);
        Ok(())
    }
}

/// Runs `filter` and returns the documents ordered by `sort_key`.
///
/// Timestamps are stored as RFC 3339 strings whose fractional part varies in
/// width, so ordering happens here rather than in the query.
async fn collect<T, K, F>(coll: &Collection<T>, filter: Document, sort_key: F) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut cursor = coll.find(filter, None).await?;
    let mut items = Vec::new();
    while let Some(result) = cursor.next().await {
        items.push(result.map_err(|e| {
            error!("Failed to decode document: {}", e);
            e
        })?);
    }
    Ok(ordered(items, sort_key))
}

fn ordered<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

fn owner_filter(user_id: Option<&str>) -> Document {
    match user_id {
        Some(id) => doc! { "user_id": id },
        None => doc! {},
    }
}

#[async_trait]
impl Store for MongoDB {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let collection = self.get_users_collection();

        // Check if user already exists
        if collection.find_one(doc! { "email": &user.email }, None).await?.is_some() {
            return Err(StoreError::Duplicate("User already exists".to_string()));
        }
        collection.insert_one(&user, None).await?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.get_users_collection().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .get_users_collection()
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.get_users_collection().count_documents(None, None).await?)
    }

    async fn insert_vehicle(&self, vehicle: Vehicle) -> StoreResult<Vehicle> {
        let collection = self.get_vehicles_collection();
        let existing = collection
            .find_one(doc! { "registration_number": &vehicle.registration_number }, None)
            .await?;
        if existing.is_some() {
            return Err(StoreError::Duplicate(format!(
                "Vehicle {} already exists",
                vehicle.registration_number
            )));
        }
        collection.insert_one(&vehicle, None).await?;
        Ok(vehicle)
    }

    async fn get_vehicle(&self, id: &str) -> StoreResult<Option<Vehicle>> {
        Ok(self.get_vehicles_collection().find_one(doc! { "id": id }, None).await?)
    }

    async fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        collect(&self.get_vehicles_collection(), doc! {}, |v: &Vehicle| {
            (v.created_at, v.id.clone())
        })
        .await
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        let collection = self.get_vehicles_collection();
        let clash = collection
            .find_one(
                doc! {
                    "registration_number": &vehicle.registration_number,
                    "id": { "$ne": &vehicle.id },
                },
                None,
            )
            .await?;
        if clash.is_some() {
            return Err(StoreError::Duplicate(format!(
                "Vehicle {} already exists",
                vehicle.registration_number
            )));
        }
        let result = collection.replace_one(doc! { "id": &vehicle.id }, vehicle, None).await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("vehicle"));
        }
        Ok(())
    }

    async fn delete_vehicle(&self, id: &str) -> StoreResult<()> {
        let result = self.get_vehicles_collection().delete_one(doc! { "id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound("vehicle"));
        }
        Ok(())
    }

    async fn insert_driver(&self, driver: Driver) -> StoreResult<Driver> {
        let collection = self.get_drivers_collection();
        let existing = collection
            .find_one(doc! { "license_number": &driver.license_number }, None)
            .await?;
        if existing.is_some() {
            return Err(StoreError::Duplicate(format!(
                "Driver with licence {} already exists",
                driver.license_number
            )));
        }
        collection.insert_one(&driver, None).await?;
        Ok(driver)
    }

    async fn get_driver(&self, id: &str) -> StoreResult<Option<Driver>> {
        Ok(self.get_drivers_collection().find_one(doc! { "id": id }, None).await?)
    }

    async fn list_drivers(&self) -> StoreResult<Vec<Driver>> {
        collect(&self.get_drivers_collection(), doc! {}, |d: &Driver| {
            (d.created_at, d.id.clone())
        })
        .await
    }

    async fn update_driver(&self, driver: &Driver) -> StoreResult<()> {
        let collection = self.get_drivers_collection();
        let clash = collection
            .find_one(
                doc! {
                    "license_number": &driver.license_number,
                    "id": { "$ne": &driver.id },
                },
                None,
            )
            .await?;
        if clash.is_some() {
            return Err(StoreError::Duplicate(format!(
                "Driver with licence {} already exists",
                driver.license_number
            )));
        }
        let result = collection.replace_one(doc! { "id": &driver.id }, driver, None).await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("driver"));
        }
        Ok(())
    }

    async fn delete_driver(&self, id: &str) -> StoreResult<()> {
        let result = self.get_drivers_collection().delete_one(doc! { "id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound("driver"));
        }
        Ok(())
    }

    async fn clear_fleet(&self) -> StoreResult<()> {
        self.get_vehicles_collection().delete_many(doc! {}, None).await?;
        self.get_drivers_collection().delete_many(doc! {}, None).await?;
        Ok(())
    }

    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        self.get_bookings_collection().insert_one(&booking, None).await?;
        Ok(booking)
    }

    async fn get_booking(&self, id: &str) -> StoreResult<Option<Booking>> {
        Ok(self.get_bookings_collection().find_one(doc! { "id": id }, None).await?)
    }

    async fn list_bookings(&self, user_id: Option<&str>) -> StoreResult<Vec<Booking>> {
        collect(&self.get_bookings_collection(), owner_filter(user_id), |b: &Booking| {
            (b.created_at, b.id.clone())
        })
        .await
    }

    async fn update_booking(&self, booking: &Booking) -> StoreResult<()> {
        let result = self
            .get_bookings_collection()
            .replace_one(doc! { "id": &booking.id }, booking, None)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("booking"));
        }
        Ok(())
    }

    async fn insert_bill(&self, bill: Bill) -> StoreResult<Bill> {
        let collection = self.get_bills_collection();
        if collection
            .find_one(doc! { "booking_id": &bill.booking_id }, None)
            .await?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "Booking {} is already billed",
                bill.booking_id
            )));
        }
        collection.insert_one(&bill, None).await?;
        Ok(bill)
    }

    async fn get_bill(&self, id: &str) -> StoreResult<Option<Bill>> {
        Ok(self.get_bills_collection().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_bill_for_booking(&self, booking_id: &str) -> StoreResult<Option<Bill>> {
        Ok(self
            .get_bills_collection()
            .find_one(doc! { "booking_id": booking_id }, None)
            .await?)
    }

    async fn list_bills(&self, user_id: Option<&str>) -> StoreResult<Vec<Bill>> {
        collect(&self.get_bills_collection(), owner_filter(user_id), |b: &Bill| {
            (b.issued_at, b.id.clone())
        })
        .await
    }

    async fn update_bill(&self, bill: &Bill) -> StoreResult<()> {
        let result = self
            .get_bills_collection()
            .replace_one(doc! { "id": &bill.id }, bill, None)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("bill"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn ordering_follows_time_not_stored_text() {
        let whole = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let fraction = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();

        // As stored, the later timestamp sorts first.
        let stored = |t: &chrono::DateTime<Utc>| serde_json::to_string(t).unwrap();
        assert!(stored(&fraction) < stored(&whole));

        let items = ordered(vec![fraction, whole], |t| *t);
        assert_eq!(items, vec![whole, fraction]);
    }
}
