use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::{new_id, CreateDriverRequest, Driver, UpdateDriverRequest};

fn not_found() -> ApiError {
    ApiError::NotFound("Driver not found".to_string())
}

async fn held_by_active_booking(store: &dyn Store, id: &str) -> Result<bool, ApiError> {
    Ok(store
        .list_bookings(None)
        .await?
        .iter()
        .any(|b| b.status.is_active() && b.driver_id.as_deref() == Some(id)))
}

pub async fn list_drivers(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list_drivers().await?))
}

pub async fn get_driver(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let driver = store.get_driver(&path).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(driver))
}

pub async fn create_driver(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    payload: web::Json<CreateDriverRequest>,
) -> Result<HttpResponse, ApiError> {
    let driver = Driver::from_request(new_id(), payload.into_inner()).map_err(ApiError::BadRequest)?;
    let driver = store.insert_driver(driver).await?;
    info!("Added driver {}", driver.name);
    Ok(HttpResponse::Created().json(driver))
}

pub async fn update_driver(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
    payload: web::Json<UpdateDriverRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut driver = store.get_driver(&path).await?.ok_or_else(not_found)?;
    let was_available = driver.available;
    driver.apply(payload.into_inner()).map_err(ApiError::BadRequest)?;
    if driver.available != was_available
        && held_by_active_booking(store.get_ref(), &driver.id).await?
    {
        return Err(ApiError::Conflict(
            "Driver is assigned to an active booking; availability is locked".to_string(),
        ));
    }
    store.update_driver(&driver).await?;
    Ok(HttpResponse::Ok().json(driver))
}

/// Deleting a driver also unassigns them from any vehicle.
pub async fn delete_driver(
    _admin: AdminUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    store.get_driver(&id).await?.ok_or_else(not_found)?;

    if held_by_active_booking(store.get_ref(), &id).await? {
        return Err(ApiError::Conflict(
            "Driver is assigned to an active booking".to_string(),
        ));
    }

    for mut vehicle in store.list_vehicles().await? {
        if vehicle.driver_id.as_deref() == Some(id.as_str()) {
            vehicle.driver_id = None;
            store.update_vehicle(&vehicle).await?;
        }
    }
    store.delete_driver(&id).await?;
    info!("Deleted driver {}", id);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Driver deleted successfully" })))
}
