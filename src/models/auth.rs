use super::user::UserResponse;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl SignupRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err("A valid email is required".to_string()),
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        Ok(())
    }
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
        }
    }

    #[test]
    fn signup_validation() {
        assert!(signup("Nimal", "nimal@example.lk", "hunter22").validate().is_ok());
        assert!(signup(" ", "nimal@example.lk", "hunter22").validate().is_err());
        assert!(signup("Nimal", "nimal.example.lk", "hunter22").validate().is_err());
        assert!(signup("Nimal", "@example.lk", "hunter22").validate().is_err());
        assert!(signup("Nimal", "nimal@example.lk", "short").validate().is_err());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Kamal@Mail.COM "), "kamal@mail.com");
    }
}
