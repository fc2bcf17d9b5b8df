use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub license_number: String,
    pub phone: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub license_number: String,
    pub phone: String,
    pub available: Option<bool>,
}

#[derive(Serialize, Deserialize, Default)]
pub struct UpdateDriverRequest {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub phone: Option<String>,
    pub available: Option<bool>,
}

impl Driver {
    pub fn from_request(id: String, req: CreateDriverRequest) -> Result<Self, String> {
        let driver = Driver {
            id,
            name: req.name.trim().to_string(),
            license_number: req.license_number.trim().to_uppercase(),
            phone: req.phone.trim().to_string(),
            available: req.available.unwrap_or(true),
            created_at: Utc::now(),
        };
        driver.validate()?;
        Ok(driver)
    }

    pub fn apply(&mut self, update: UpdateDriverRequest) -> Result<(), String> {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(license) = update.license_number {
            self.license_number = license.trim().to_uppercase();
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Driver name is required".to_string());
        }
        if self.license_number.is_empty() {
            return Err("License number is required".to_string());
        }
        if self.phone.is_empty() {
            return Err("Phone number is required".to_string());
        }
        Ok(())
    }
}
