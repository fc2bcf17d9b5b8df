use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{info, warn};

use crate::auth::{self, AuthUser};
use crate::config::Config;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::auth::normalize_email;
use crate::models::{new_id, AuthResponse, LoginRequest, Role, SignupRequest, User, UserResponse};

pub async fn signup(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    payload.validate().map_err(ApiError::BadRequest)?;

    let user = User {
        id: new_id(),
        name: payload.name.trim().to_string(),
        email: normalize_email(&payload.email),
        password: auth::hash_password(&payload.password, config.bcrypt_cost)?,
        role: Role::Customer,
        phone: payload.phone.filter(|p| !p.trim().is_empty()),
        created_at: Utc::now(),
    };
    let user = store.insert_user(user).await?;
    info!("Registered user {}", user.email);

    let token = auth::issue_token(&user, &config.jwt)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

pub async fn login(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());
    let email = normalize_email(&credentials.email);

    let user = store.find_user_by_email(&email).await?.ok_or_else(invalid)?;
    if !auth::verify_password(&credentials.password, &user.password)? {
        warn!("Invalid password attempt for email: {}", email);
        return Err(invalid());
    }

    let token = auth::issue_token(&user, &config.jwt)?;
    info!("User {} authenticated successfully", user.email);
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}

pub async fn me(user: AuthUser, store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let profile = store
        .get_user(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(profile)))
}
