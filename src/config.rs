//! Runtime configuration, read from the environment.

use std::env;

/// Cost range accepted by bcrypt.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    MongoDB,
}

impl StorageKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" => Some(StorageKind::Memory),
            "mongo" | "mongodb" => Some(StorageKind::MongoDB),
            _ => None,
        }
    }
}

/// JWT signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "secret".to_string(),
            expiration_hours: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageKind,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub admin_email: String,
    pub admin_password: String,
    pub force_seed: bool,
    pub geocoder_url: String,
    pub cors_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage: StorageKind::Memory,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "ride_book".to_string(),
            jwt: JwtConfig::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_email: "admin@ridebook.lk".to_string(),
            admin_password: "admin123".to_string(),
            force_seed: false,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            cors_origin: None,
        }
    }
}

impl Config {
    /// Build the configuration from process environment variables.
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        let defaults = Config::default();

        Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(lookup("PORT")).unwrap_or(defaults.port),
            storage: lookup("STORAGE")
                .and_then(|v| StorageKind::parse(&v))
                .unwrap_or(defaults.storage),
            mongodb_uri: lookup("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            database_name: lookup("DATABASE_NAME").unwrap_or(defaults.database_name),
            jwt: JwtConfig {
                secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt.secret),
                expiration_hours: parsed(lookup("JWT_EXPIRATION_HOURS"))
                    .unwrap_or(defaults.jwt.expiration_hours),
            },
            bcrypt_cost: parsed(lookup("BCRYPT_COST"))
                .filter(|cost| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(cost))
                .unwrap_or(defaults.bcrypt_cost),
            admin_email: lookup("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            force_seed: lookup("FORCE_SEED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.force_seed),
            geocoder_url: lookup("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.is_empty()),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.jwt.expiration_hours, 24);
        assert!(!config.force_seed);
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("STORAGE", "MongoDB"),
            ("JWT_EXPIRATION_HOURS", "168"),
            ("BCRYPT_COST", "4"),
            ("FORCE_SEED", "true"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage, StorageKind::MongoDB);
        assert_eq!(config.jwt.expiration_hours, 168);
        assert_eq!(config.bcrypt_cost, 4);
        assert!(config.force_seed);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("STORAGE", "sqlite"), ("BCRYPT_COST", "99")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }
}
