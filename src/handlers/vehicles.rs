use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

use crate::auth::{AdminUser, AuthUser};
use crate::db::Store;
use crate::error::ApiError;
use crate::models::vehicle::VehicleQuery;
use crate::models::{new_id, CreateVehicleRequest, UpdateVehicleRequest, Vehicle, VehicleType};

fn not_found() -> ApiError {
    ApiError::NotFound("Vehicle not found".to_string())
}

async fn ensure_driver_exists(store: &dyn Store, driver_id: Option<&str>) -> Result<(), ApiError> {
    if let Some(id) = driver_id {
        if store.get_driver(id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Driver {} does not exist", id)));
        }
    }
    Ok(())
}

async fn held_by_active_booking(store: &dyn Store, id: &str) -> Result<bool, ApiError> {
    Ok(store
        .list_bookings(None)
        .await?
        .iter()
        .any(|b| b.status.is_active() && b.vehicle_id.as_deref() == Some(id)))
}

pub async fn list_vehicles(
    _user: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<VehicleQuery>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_type = query
        .vehicle_type
        .as_deref()
        .map(str::parse::<VehicleType>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let vehicles: Vec<Vehicle> = store
        .list_vehicles()
        .await?
        .into_iter()
        .filter(|v| vehicle_type.map_or(true, |t| v.vehicle_type == t))
        .filter(|v| query.available.map_or(true, |a| v.available == a))
        .collect();
    Ok(HttpResponse::Ok().json(vehicles))
}

pub async fn get_vehicle(
    _user: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let vehicle = store.get_vehicle(&path).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(vehicle))
}

pub async fn create_vehicle(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    payload: web::Json<CreateVehicleRequest>,
) -> Result<HttpResponse, ApiError> {
    let vehicle = Vehicle::from_request(new_id(), payload.into_inner()).map_err(ApiError::BadRequest)?;
    ensure_driver_exists(store.get_ref(), vehicle.driver_id.as_deref()).await?;

    let vehicle = store.insert_vehicle(vehicle).await?;
    info!("Added vehicle {} ({})", vehicle.registration_number, vehicle.vehicle_type);
    Ok(HttpResponse::Created().json(vehicle))
}

pub async fn update_vehicle(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
    payload: web::Json<UpdateVehicleRequest>,
) -> Result<HttpResponse, ApiError> {
    let current = store.get_vehicle(&path).await?.ok_or_else(not_found)?;
    let mut vehicle = current.clone();
    vehicle.apply(payload.into_inner()).map_err(ApiError::BadRequest)?;
    ensure_driver_exists(store.get_ref(), vehicle.driver_id.as_deref()).await?;

    let reshaped = vehicle.vehicle_type != current.vehicle_type
        || vehicle.seats != current.seats
        || vehicle.available != current.available;
    if reshaped && held_by_active_booking(store.get_ref(), &vehicle.id).await? {
        return Err(ApiError::Conflict(
            "Vehicle is assigned to an active booking; type, seats and availability are locked"
                .to_string(),
        ));
    }

    store.update_vehicle(&vehicle).await?;
    Ok(HttpResponse::Ok().json(vehicle))
}

pub async fn delete_vehicle(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    store.get_vehicle(&id).await?.ok_or_else(not_found)?;

    if held_by_active_booking(store.get_ref(), &id).await? {
        return Err(ApiError::Conflict(
            "Vehicle is assigned to an active booking".to_string(),
        ));
    }

    store.delete_vehicle(&id).await?;
    info!("Deleted vehicle {}", id);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Vehicle deleted successfully" })))
}
