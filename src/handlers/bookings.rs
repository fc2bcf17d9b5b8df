use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use log::{debug, info};

use crate::auth::AuthUser;
use crate::db::Store;
use crate::error::{ApiError, StoreError};
use crate::models::{
    new_id, Bill, Booking, BookingStatus, CreateBookingRequest, Driver, UpdateBookingRequest,
    Vehicle,
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn not_found() -> ApiError {
    ApiError::NotFound("Booking not found".to_string())
}

/// Loads a booking the caller may act on. Other customers' bookings are
/// reported as missing.
async fn load_booking(store: &dyn Store, user: &AuthUser, id: &str) -> Result<Booking, ApiError> {
    match store.get_booking(id).await? {
        Some(booking) if user.can_access(&booking.user_id) => Ok(booking),
        Some(_) => {
            debug!("User {} denied access to booking {}", user.id, id);
            Err(not_found())
        }
        None => Err(not_found()),
    }
}

pub async fn create_booking(
    user: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let booking = Booking::from_request(new_id(), user.id.clone(), payload.into_inner(), today())
        .map_err(ApiError::BadRequest)?;
    let booking = store.insert_booking(booking).await?;
    info!(
        "Booking {} created by {} for a {} on {} {}",
        booking.id, user.email, booking.vehicle_type, booking.pickup_date, booking.pickup_time
    );
    Ok(HttpResponse::Created().json(booking))
}

pub async fn list_bookings(
    user: AuthUser,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let owner = if user.is_admin() { None } else { Some(user.id.as_str()) };
    Ok(HttpResponse::Ok().json(store.list_bookings(owner).await?))
}

pub async fn get_booking(
    user: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let booking = load_booking(store.get_ref(), &user, &path).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn update_booking(
    user: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
    payload: web::Json<UpdateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let store = store.get_ref();
    let update = payload.into_inner();
    let mut booking = load_booking(store, &user, &path).await?;

    if !user.is_admin() {
        if update.assigns() {
            return Err(ApiError::Forbidden(
                "Only administrators can assign vehicles or drivers".to_string(),
            ));
        }
        if matches!(update.status, Some(s) if s != BookingStatus::Cancelled) {
            return Err(ApiError::Forbidden(
                "Customers can only cancel a booking".to_string(),
            ));
        }
    }

    if update.edits_details() {
        if booking.status != BookingStatus::Pending {
            return Err(ApiError::Conflict(
                "Only pending bookings can be changed".to_string(),
            ));
        }
        booking
            .apply_details(&update, today())
            .map_err(ApiError::BadRequest)?;
    }

    // Everything is checked on the in-memory booking before the fleet is touched.
    let claim = if update.assigns() {
        plan_assignment(store, &booking, &update).await?
    } else {
        Assignment::default()
    };
    let released = claim.attach(&mut booking)?;

    if let Some(next) = update.status.filter(|s| *s != booking.status) {
        if next == BookingStatus::InProgress && booking.vehicle_id.is_none() {
            return Err(ApiError::Conflict(
                "Assign a vehicle before starting the ride".to_string(),
            ));
        }
        booking.transition(next).map_err(ApiError::Conflict)?;
    }

    for id in released.vehicles {
        release_vehicle(store, &id).await?;
    }
    for id in released.drivers {
        release_driver(store, &id).await?;
    }
    claim.commit(store).await?;
    if !booking.status.is_active() {
        release_fleet(store, &booking).await?;
    }

    booking.updated_at = Utc::now();
    store.update_booking(&booking).await?;
    info!("Booking {} is now {}", booking.id, booking.status.as_str());

    if booking.status == BookingStatus::Completed {
        issue_bill(store, &booking).await?;
    }

    Ok(HttpResponse::Ok().json(booking))
}

/// Issues the bill for a completed booking unless one already exists.
async fn issue_bill(store: &dyn Store, booking: &Booking) -> Result<(), ApiError> {
    match store.insert_bill(Bill::for_booking(new_id(), booking)).await {
        Ok(bill) => {
            info!("Issued bill {} for {} {}", bill.id, bill.total, bill.currency);
            Ok(())
        }
        Err(StoreError::Duplicate(_)) => {
            debug!("Booking {} is already billed", booking.id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Vehicle and driver a booking update wants to claim.
#[derive(Default)]
struct Assignment {
    vehicle: Option<Vehicle>,
    driver: Option<Driver>,
}

/// Ids displaced by a new assignment.
#[derive(Default)]
struct Released {
    vehicles: Vec<String>,
    drivers: Vec<String>,
}

impl Assignment {
    /// Points the booking at the claimed vehicle and driver, confirming a
    /// pending booking. Nothing is written to the store.
    fn attach(&self, booking: &mut Booking) -> Result<Released, ApiError> {
        let mut released = Released::default();
        if self.vehicle.is_none() && self.driver.is_none() {
            return Ok(released);
        }
        if let Some(vehicle) = &self.vehicle {
            released.vehicles.extend(booking.vehicle_id.replace(vehicle.id.clone()));
        }
        if let Some(driver) = &self.driver {
            released.drivers.extend(booking.driver_id.replace(driver.id.clone()));
        }
        if booking.status == BookingStatus::Pending {
            booking
                .transition(BookingStatus::Confirmed)
                .map_err(ApiError::Conflict)?;
        }
        Ok(released)
    }

    /// Marks the claimed vehicle and driver unavailable.
    async fn commit(mut self, store: &dyn Store) -> Result<(), ApiError> {
        if let Some(vehicle) = self.vehicle.as_mut() {
            vehicle.available = false;
            store.update_vehicle(vehicle).await?;
        }
        if let Some(driver) = self.driver.as_mut() {
            driver.available = false;
            store.update_driver(driver).await?;
        }
        Ok(())
    }
}

/// Looks up and validates the requested vehicle and driver. A vehicle's own
/// driver is used when no driver is named.
async fn plan_assignment(
    store: &dyn Store,
    booking: &Booking,
    update: &UpdateBookingRequest,
) -> Result<Assignment, ApiError> {
    if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
        return Err(ApiError::Conflict(format!(
            "Cannot assign a {} booking",
            booking.status.as_str()
        )));
    }

    let vehicle = match update.vehicle_id.as_deref() {
        Some(id) if booking.vehicle_id.as_deref() != Some(id) => {
            let vehicle = store
                .get_vehicle(id)
                .await?
                .ok_or_else(|| ApiError::BadRequest(format!("Vehicle {} does not exist", id)))?;
            if vehicle.vehicle_type != booking.vehicle_type {
                return Err(ApiError::BadRequest(format!(
                    "Booking needs a {} but vehicle {} is a {}",
                    booking.vehicle_type, vehicle.registration_number, vehicle.vehicle_type
                )));
            }
            if vehicle.seats < booking.passengers {
                return Err(ApiError::BadRequest(format!(
                    "Vehicle {} has only {} seats",
                    vehicle.registration_number, vehicle.seats
                )));
            }
            if !vehicle.available {
                return Err(ApiError::Conflict(format!(
                    "Vehicle {} is not available",
                    vehicle.registration_number
                )));
            }
            Some(vehicle)
        }
        _ => None,
    };

    let driver_id = update.driver_id.clone().or_else(|| {
        vehicle
            .as_ref()
            .and_then(|v| v.driver_id.clone())
            .filter(|_| booking.driver_id.is_none())
    });
    let driver = match driver_id {
        Some(id) if booking.driver_id.as_deref() != Some(id.as_str()) => {
            let driver = store
                .get_driver(&id)
                .await?
                .ok_or_else(|| ApiError::BadRequest(format!("Driver {} does not exist", id)))?;
            if !driver.available {
                return Err(ApiError::Conflict(format!(
                    "Driver {} is not available",
                    driver.name
                )));
            }
            Some(driver)
        }
        _ => None,
    };

    Ok(Assignment { vehicle, driver })
}

async fn release_fleet(store: &dyn Store, booking: &Booking) -> Result<(), ApiError> {
    if let Some(id) = booking.vehicle_id.as_deref() {
        release_vehicle(store, id).await?;
    }
    if let Some(id) = booking.driver_id.as_deref() {
        release_driver(store, id).await?;
    }
    Ok(())
}

async fn release_vehicle(store: &dyn Store, id: &str) -> Result<(), ApiError> {
    if let Some(mut vehicle) = store.get_vehicle(id).await? {
        vehicle.available = true;
        store.update_vehicle(&vehicle).await?;
    }
    Ok(())
}

async fn release_driver(store: &dyn Store, id: &str) -> Result<(), ApiError> {
    if let Some(mut driver) = store.get_driver(id).await? {
        driver.available = true;
        store.update_driver(&driver).await?;
    }
    Ok(())
}
