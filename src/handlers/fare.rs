use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::fare;
use crate::models::{GeoPoint, VehicleType};

#[derive(Deserialize)]
pub struct EstimateRequest {
    pub vehicle_type: VehicleType,
    pub distance_km: Option<f64>,
    pub pickup: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
}

/// An explicit `distance_km` wins over coordinates.
pub async fn estimate(payload: web::Json<EstimateRequest>) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let breakdown = match (req.distance_km, req.pickup, req.destination) {
        (Some(distance), _, _) => fare::breakdown(distance, req.vehicle_type)?,
        (None, Some(pickup), Some(destination)) => {
            pickup.validate().map_err(ApiError::BadRequest)?;
            destination.validate().map_err(ApiError::BadRequest)?;
            fare::fare_between(pickup, destination, req.vehicle_type)?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Provide distance_km or both pickup and destination".to_string(),
            ))
        }
    };
    Ok(HttpResponse::Ok().json(breakdown.rounded()))
}

pub async fn rates() -> HttpResponse {
    let table: Vec<fare::Rate> = VehicleType::ALL.iter().map(|t| t.rate()).collect();
    HttpResponse::Ok().json(table)
}
