use actix_web::{web, HttpResponse};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::geocode::ReverseGeocoder;
use crate::models::GeoPoint;

pub async fn reverse(
    _user: AuthUser,
    geocoder: web::Data<ReverseGeocoder>,
    query: web::Query<GeoPoint>,
) -> Result<HttpResponse, ApiError> {
    let point = query.into_inner();
    point.validate().map_err(ApiError::BadRequest)?;
    Ok(HttpResponse::Ok().json(geocoder.reverse(point).await?))
}
