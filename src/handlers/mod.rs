pub mod auth;
pub mod bills;
pub mod bookings;
pub mod drivers;
pub mod fare;
pub mod geocode;
pub mod stats;
pub mod vehicles;

use actix_web::HttpResponse;
use serde_json::json;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
