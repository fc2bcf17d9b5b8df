//! Token issuing and request authentication.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error};

use crate::config::{Config, JwtConfig};
use crate::error::ApiError;
use crate::models::{Claims, Role, User};

pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash).map_err(|e| {
        error!("Bcrypt verification error: {}", e);
        ApiError::from(e)
    })
}

pub fn issue_token(user: &User, config: &JwtConfig) -> Result<String, ApiError> {
    let now = chrono::Utc::now();
    let expiration = now + chrono::Duration::hours(config.expiration_hours);
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_ref()),
    )?)
}

pub fn decode_token(token: &str, config: &JwtConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// The caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on any record; everyone else only on their own.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }

    fn from_request_headers(req: &HttpRequest) -> Result<Self, ApiError> {
        let config = req
            .app_data::<web::Data<Config>>()
            .ok_or_else(|| ApiError::Internal("configuration not registered".into()))?;

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok());
        let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.trim(),
            None => {
                debug!("Missing or malformed Authorization header");
                return Err(ApiError::unauthorized());
            }
        };

        match decode_token(token, &config.jwt) {
            Ok(claims) => {
                debug!("Token decoded successfully for user: {}", claims.sub);
                Ok(AuthUser {
                    id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                })
            }
            Err(e) => {
                debug!("Token decoding failed: {:?}", e);
                Err(ApiError::unauthorized())
            }
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(AuthUser::from_request_headers(req))
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(AuthUser::from_request_headers(req).and_then(|user| {
            if user.is_admin() {
                Ok(AdminUser(user))
            } else {
                Err(ApiError::forbidden())
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: "64f0c0ffee".into(),
            name: "Amali".into(),
            email: "amali@example.lk".into(),
            password: String::new(),
            role,
            phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_keeps_role() {
        let config = JwtConfig::default();
        let token = issue_token(&user(Role::Admin), &config).unwrap();
        let claims = decode_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "64f0c0ffee");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&user(Role::Customer), &JwtConfig::default()).unwrap();
        let other = JwtConfig {
            secret: "another".into(),
            ..JwtConfig::default()
        };
        assert!(decode_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = JwtConfig {
            expiration_hours: -2,
            ..JwtConfig::default()
        };
        let token = issue_token(&user(Role::Customer), &config).unwrap();
        assert!(decode_token(&token, &config).is_err());
    }

    #[test]
    fn passwords_hash_and_verify() {
        let hash = hash_password("s3cret!", crate::config::MIN_BCRYPT_COST).unwrap();
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("guess", &hash).unwrap());
    }

    #[test]
    fn owners_and_admins_can_access() {
        let customer = AuthUser {
            id: "u1".into(),
            email: "a@b.lk".into(),
            role: Role::Customer,
        };
        assert!(customer.can_access("u1"));
        assert!(!customer.can_access("u2"));
        let admin = AuthUser {
            role: Role::Admin,
            ..customer
        };
        assert!(admin.can_access("u2"));
    }
}
