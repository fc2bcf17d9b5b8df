use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::AdminUser;
use crate::db::Store;
use crate::error::ApiError;
use crate::fare::round_amount;
use crate::models::{BillStatus, BookingStatus, VehicleType};

#[derive(Serialize)]
pub struct Stats {
    pub total_users: u64,
    pub total_bookings: usize,
    pub bookings_by_status: BTreeMap<&'static str, usize>,
    pub total_vehicles: usize,
    pub available_vehicles: usize,
    pub vehicles_by_type: BTreeMap<&'static str, usize>,
    pub total_drivers: usize,
    pub available_drivers: usize,
    pub revenue: f64,
    pub outstanding: f64,
}

pub async fn admin_stats(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let bookings = store.list_bookings(None).await?;
    let vehicles = store.list_vehicles().await?;
    let drivers = store.list_drivers().await?;
    let bills = store.list_bills(None).await?;

    let mut bookings_by_status: BTreeMap<&'static str, usize> =
        BookingStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for booking in &bookings {
        *bookings_by_status.entry(booking.status.as_str()).or_default() += 1;
    }

    let mut vehicles_by_type: BTreeMap<&'static str, usize> =
        VehicleType::ALL.iter().map(|t| (t.as_str(), 0)).collect();
    for vehicle in &vehicles {
        *vehicles_by_type.entry(vehicle.vehicle_type.as_str()).or_default() += 1;
    }

    let sum = |status: BillStatus| {
        round_amount(bills.iter().filter(|b| b.status == status).map(|b| b.total).sum())
    };

    Ok(HttpResponse::Ok().json(Stats {
        total_users: store.count_users().await?,
        total_bookings: bookings.len(),
        bookings_by_status,
        total_vehicles: vehicles.len(),
        available_vehicles: vehicles.iter().filter(|v| v.available).count(),
        vehicles_by_type,
        total_drivers: drivers.len(),
        available_drivers: drivers.iter().filter(|d| d.available).count(),
        revenue: sum(BillStatus::Paid),
        outstanding: sum(BillStatus::Unpaid),
    }))
}
