use actix_web::{web, HttpResponse};
use log::info;

use crate::auth::AuthUser;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::Bill;

async fn load_bill(store: &dyn Store, user: &AuthUser, id: &str) -> Result<Bill, ApiError> {
    store
        .get_bill(id)
        .await?
        .filter(|bill| user.can_access(&bill.user_id))
        .ok_or_else(|| ApiError::NotFound("Bill not found".to_string()))
}

pub async fn list_bills(user: AuthUser, store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let owner = if user.is_admin() { None } else { Some(user.id.as_str()) };
    Ok(HttpResponse::Ok().json(store.list_bills(owner).await?))
}

pub async fn get_bill(
    user: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(load_bill(store.get_ref(), &user, &path).await?))
}

pub async fn pay_bill(
    user: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut bill = load_bill(store.get_ref(), &user, &path).await?;
    bill.pay().map_err(ApiError::Conflict)?;
    store.update_bill(&bill).await?;
    info!("Bill {} paid: {} {}", bill.id, bill.total, bill.currency);
    Ok(HttpResponse::Ok().json(bill))
}
