use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Sedan,
    Suv,
    Van,
    Luxury,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Sedan => "sedan",
            VehicleType::Suv => "suv",
            VehicleType::Van => "van",
            VehicleType::Luxury => "luxury",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sedan" => Ok(VehicleType::Sedan),
            "suv" => Ok(VehicleType::Suv),
            "van" => Ok(VehicleType::Van),
            "luxury" => Ok(VehicleType::Luxury),
            other => Err(format!("Unknown vehicle type: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vehicle {
    pub id: String,
    pub registration_number: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    pub seats: u32,
    pub driver_id: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateVehicleRequest {
    pub registration_number: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    /// Defaults to the type's passenger limit.
    pub seats: Option<u32>,
    pub driver_id: Option<String>,
    pub available: Option<bool>,
}

/// Partial update; an empty `driver_id` unassigns the driver.
#[derive(Serialize, Deserialize, Default)]
pub struct UpdateVehicleRequest {
    pub registration_number: Option<String>,
    pub model: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub seats: Option<u32>,
    pub driver_id: Option<String>,
    pub available: Option<bool>,
}

#[derive(Deserialize)]
pub struct VehicleQuery {
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub available: Option<bool>,
}

impl Vehicle {
    pub fn from_request(id: String, req: CreateVehicleRequest) -> Result<Self, String> {
        let vehicle = Vehicle {
            id,
            registration_number: req.registration_number.trim().to_uppercase(),
            model: req.model.trim().to_string(),
            vehicle_type: req.vehicle_type,
            seats: req
                .seats
                .unwrap_or_else(|| req.vehicle_type.rate().max_passengers),
            driver_id: req.driver_id.filter(|d| !d.is_empty()),
            available: req.available.unwrap_or(true),
            created_at: Utc::now(),
        };
        vehicle.validate()?;
        Ok(vehicle)
    }

    pub fn apply(&mut self, update: UpdateVehicleRequest) -> Result<(), String> {
        if let Some(reg) = update.registration_number {
            self.registration_number = reg.trim().to_uppercase();
        }
        if let Some(model) = update.model {
            self.model = model.trim().to_string();
        }
        if let Some(vehicle_type) = update.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
        if let Some(seats) = update.seats {
            self.seats = seats;
        }
        if let Some(driver_id) = update.driver_id {
            self.driver_id = Some(driver_id).filter(|d| !d.is_empty());
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), String> {
        if self.registration_number.is_empty() {
            return Err("Registration number is required".to_string());
        }
        if self.model.is_empty() {
            return Err("Model is required".to_string());
        }
        if self.seats == 0 {
            return Err("A vehicle needs at least one seat".to_string());
        }
        Ok(())
    }
}
