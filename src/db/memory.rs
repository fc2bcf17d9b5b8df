//! In-memory store, used for development without a database and in tests.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{Bill, Booking, Driver, User, Vehicle};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    vehicles: DashMap<String, Vehicle>,
    drivers: DashMap<String, Driver>,
    bookings: DashMap<String, Booking>,
    bills: DashMap<String, Bill>,
    // Unique keys, claimed through `entry` so concurrent inserts cannot both win.
    user_by_email: DashMap<String, String>,
    bill_by_booking: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn registration_taken(&self, registration: &str, except_id: &str) -> bool {
        self.vehicles
            .iter()
            .any(|v| v.registration_number == registration && v.id != except_id)
    }

    fn license_taken(&self, license: &str, except_id: &str) -> bool {
        self.drivers
            .iter()
            .any(|d| d.license_number == license && d.id != except_id)
    }
}

fn replace<T: Clone>(map: &DashMap<String, T>, id: &str, value: &T, what: &'static str) -> StoreResult<()> {
    match map.get_mut(id) {
        Some(mut entry) => {
            *entry = value.clone();
            Ok(())
        }
        None => Err(StoreError::NotFound(what)),
    }
}

fn remove<T>(map: &DashMap<String, T>, id: &str, what: &'static str) -> StoreResult<()> {
    map.remove(id).map(|_| ()).ok_or(StoreError::NotFound(what))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        match self.user_by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("User already exists".to_string())),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = match self.user_by_email.get(email) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn insert_vehicle(&self, vehicle: Vehicle) -> StoreResult<Vehicle> {
        if self.registration_taken(&vehicle.registration_number, &vehicle.id) {
            return Err(StoreError::Duplicate(format!(
                "Vehicle {} already exists",
                vehicle.registration_number
            )));
        }
        self.vehicles.insert(vehicle.id.clone(), vehicle.clone());
        Ok(vehicle)
    }

    async fn get_vehicle(&self, id: &str) -> StoreResult<Option<Vehicle>> {
        Ok(self.vehicles.get(id).map(|v| v.clone()))
    }

    async fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = self.vehicles.iter().map(|v| v.clone()).collect();
        vehicles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(vehicles)
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        if self.registration_taken(&vehicle.registration_number, &vehicle.id) {
            return Err(StoreError::Duplicate(format!(
                "Vehicle {} already exists",
                vehicle.registration_number
            )));
        }
        replace(&self.vehicles, &vehicle.id, vehicle, "vehicle")
    }

    async fn delete_vehicle(&self, id: &str) -> StoreResult<()> {
        remove(&self.vehicles, id, "vehicle")
    }

    async fn insert_driver(&self, driver: Driver) -> StoreResult<Driver> {
        if self.license_taken(&driver.license_number, &driver.id) {
            return Err(StoreError::Duplicate(format!(
                "Driver with licence {} already exists",
                driver.license_number
            )));
        }
        self.drivers.insert(driver.id.clone(), driver.clone());
        Ok(driver)
    }

    async fn get_driver(&self, id: &str) -> StoreResult<Option<Driver>> {
        Ok(self.drivers.get(id).map(|d| d.clone()))
    }

    async fn list_drivers(&self) -> StoreResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self.drivers.iter().map(|d| d.clone()).collect();
        drivers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(drivers)
    }

    async fn update_driver(&self, driver: &Driver) -> StoreResult<()> {
        if self.license_taken(&driver.license_number, &driver.id) {
            return Err(StoreError::Duplicate(format!(
                "Driver with licence {} already exists",
                driver.license_number
            )));
        }
        replace(&self.drivers, &driver.id, driver, "driver")
    }

    async fn delete_driver(&self, id: &str) -> StoreResult<()> {
        remove(&self.drivers, id, "driver")
    }

    async fn clear_fleet(&self) -> StoreResult<()> {
        self.vehicles.clear();
        self.drivers.clear();
        Ok(())
    }

    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking> {
        self.bookings.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: &str) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.get(id).map(|b| b.clone()))
    }

    async fn list_bookings(&self, user_id: Option<&str>) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| user_id.map_or(true, |u| b.user_id == u))
            .map(|b| b.clone())
            .collect();
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    async fn update_booking(&self, booking: &Booking) -> StoreResult<()> {
        replace(&self.bookings, &booking.id, booking, "booking")
    }

    async fn insert_bill(&self, bill: Bill) -> StoreResult<Bill> {
        match self.bill_by_booking.entry(bill.booking_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "Booking {} is already billed",
                bill.booking_id
            ))),
            Entry::Vacant(slot) => {
                self.bills.insert(bill.id.clone(), bill.clone());
                slot.insert(bill.id.clone());
                Ok(bill)
            }
        }
    }

    async fn get_bill(&self, id: &str) -> StoreResult<Option<Bill>> {
        Ok(self.bills.get(id).map(|b| b.clone()))
    }

    async fn find_bill_for_booking(&self, booking_id: &str) -> StoreResult<Option<Bill>> {
        let id = match self.bill_by_booking.get(booking_id) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        Ok(self.bills.get(&id).map(|b| b.clone()))
    }

    async fn list_bills(&self, user_id: Option<&str>) -> StoreResult<Vec<Bill>> {
        let mut bills: Vec<Bill> = self
            .bills
            .iter()
            .filter(|b| user_id.map_or(true, |u| b.user_id == u))
            .map(|b| b.clone())
            .collect();
        bills.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then(a.id.cmp(&b.id)));
        Ok(bills)
    }

    async fn update_bill(&self, bill: &Bill) -> StoreResult<()> {
        replace(&self.bills, &bill.id, bill, "bill")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        new_id, BillStatus, CreateDriverRequest, CreateVehicleRequest, Role, VehicleType,
    };
    use chrono::Utc;

    fn vehicle(registration: &str) -> Vehicle {
        Vehicle::from_request(
            new_id(),
            CreateVehicleRequest {
                registration_number: registration.into(),
                model: "Toyota Axio".into(),
                vehicle_type: VehicleType::Sedan,
                seats: None,
                driver_id: None,
                available: None,
            },
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn vehicle_registration_is_unique() {
        let store = MemoryStore::new();
        let first = store.insert_vehicle(vehicle("CAB-1001")).await.unwrap();
        let second = store.insert_vehicle(vehicle("CAB-1002")).await.unwrap();

        assert!(matches!(
            store.insert_vehicle(vehicle("cab-1001")).await,
            Err(StoreError::Duplicate(_))
        ));

        let mut renamed = second.clone();
        renamed.registration_number = first.registration_number.clone();
        assert!(matches!(
            store.update_vehicle(&renamed).await,
            Err(StoreError::Duplicate(_))
        ));

        // Saving a record under its own registration is fine.
        store.update_vehicle(&first).await.unwrap();
        assert_eq!(store.list_vehicles().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn missing_records_report_not_found() {
        let store = MemoryStore::new();
        let v = vehicle("CAB-2001");
        assert!(matches!(
            store.update_vehicle(&v).await,
            Err(StoreError::NotFound("vehicle"))
        ));
        assert!(matches!(
            store.delete_driver("nope").await,
            Err(StoreError::NotFound("driver"))
        ));
        assert!(store.get_booking("nope").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn clear_fleet_drops_vehicles_and_drivers() {
        let store = MemoryStore::new();
        store.insert_vehicle(vehicle("CAB-3001")).await.unwrap();
        store
            .insert_driver(
                Driver::from_request(
                    new_id(),
                    CreateDriverRequest {
                        name: "Sunil Perera".into(),
                        license_number: "B1234567".into(),
                        phone: "+94771234567".into(),
                        available: None,
                    },
                )
                .unwrap(),
            )
            .await
            .unwrap();
        store.clear_fleet().await.unwrap();
        assert!(store.list_vehicles().await.unwrap().is_empty());
        assert!(store.list_drivers().await.unwrap().is_empty());
    }

    fn bill(booking_id: &str) -> Bill {
        Bill {
            id: new_id(),
            booking_id: booking_id.into(),
            user_id: "u1".into(),
            vehicle_type: VehicleType::Sedan,
            distance_km: 0.0,
            base_fare: 200.0,
            distance_charge: 0.0,
            total: 200.0,
            currency: "LKR".into(),
            status: BillStatus::Unpaid,
            issued_at: Utc::now(),
            paid_at: None,
        }
    }

    #[test]
    fn concurrent_bills_for_one_booking_keep_one() {
        let store = MemoryStore::new();
        let inserted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| futures::executor::block_on(store.insert_bill(bill("b1")))))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|result| result.is_ok())
                .count()
        });
        assert_eq!(inserted, 1);

        let all = futures::executor::block_on(store.list_bills(None)).unwrap();
        assert_eq!(all.len(), 1);
        let found = futures::executor::block_on(store.find_bill_for_booking("b1"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, all[0].id);
    }

    #[test]
    fn concurrent_signups_with_one_email_keep_one() {
        let store = MemoryStore::new();
        let user = || User {
            id: new_id(),
            name: "Dilini".into(),
            email: "dilini@example.lk".into(),
            password: String::new(),
            role: Role::Customer,
            phone: None,
            created_at: Utc::now(),
        };
        let inserted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| futures::executor::block_on(store.insert_user(user()))))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|result| result.is_ok())
                .count()
        });
        assert_eq!(inserted, 1);
        assert_eq!(futures::executor::block_on(store.count_users()).unwrap(), 1);
        assert!(futures::executor::block_on(store.find_user_by_email("dilini@example.lk"))
            .unwrap()
            .is_some());
    }
}
