use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::VehicleType;
use crate::fare;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!(
                "Coordinates out of range: ({}, {})",
                self.lat, self.lng
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

impl Location {
    fn validate(&self, what: &str) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err(format!("{} address is required", what));
        }
        match &self.coordinates {
            Some(point) => point.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Still occupying a vehicle or driver.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub pickup: Location,
    pub destination: Location,
    pub pickup_date: String,
    pub pickup_time: String,
    pub vehicle_type: VehicleType,
    pub passengers: u32,
    pub distance_km: Option<f64>,
    pub estimated_fare: Option<f64>,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub pickup: Location,
    pub destination: Location,
    pub pickup_date: String,
    pub pickup_time: String,
    pub vehicle_type: VehicleType,
    pub passengers: u32,
}

#[derive(Serialize, Deserialize, Default)]
pub struct UpdateBookingRequest {
    pub pickup: Option<Location>,
    pub destination: Option<Location>,
    pub pickup_date: Option<String>,
    pub pickup_time: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub passengers: Option<u32>,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub status: Option<BookingStatus>,
}

impl UpdateBookingRequest {
    /// Touches the ride details (as opposed to assignment or status).
    pub fn edits_details(&self) -> bool {
        self.pickup.is_some()
            || self.destination.is_some()
            || self.pickup_date.is_some()
            || self.pickup_time.is_some()
            || self.vehicle_type.is_some()
            || self.passengers.is_some()
    }

    pub fn assigns(&self) -> bool {
        self.vehicle_id.is_some() || self.driver_id.is_some()
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

impl Booking {
    pub fn from_request(
        id: String,
        user_id: String,
        req: CreateBookingRequest,
        today: NaiveDate,
    ) -> Result<Self, String> {
        let now = Utc::now();
        let mut booking = Booking {
            id,
            user_id,
            pickup: req.pickup,
            destination: req.destination,
            pickup_date: req.pickup_date.trim().to_string(),
            pickup_time: req.pickup_time.trim().to_string(),
            vehicle_type: req.vehicle_type,
            passengers: req.passengers,
            distance_km: None,
            estimated_fare: None,
            vehicle_id: None,
            driver_id: None,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        booking.validate_details(today)?;
        booking.estimate();
        Ok(booking)
    }

    /// Apply edited ride details and recompute the estimate.
    pub fn apply_details(
        &mut self,
        update: &UpdateBookingRequest,
        today: NaiveDate,
    ) -> Result<(), String> {
        if let Some(pickup) = &update.pickup {
            self.pickup = pickup.clone();
        }
        if let Some(destination) = &update.destination {
            self.destination = destination.clone();
        }
        if let Some(date) = &update.pickup_date {
            self.pickup_date = date.trim().to_string();
        }
        if let Some(time) = &update.pickup_time {
            self.pickup_time = time.trim().to_string();
        }
        if let Some(vehicle_type) = update.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
        if let Some(passengers) = update.passengers {
            self.passengers = passengers;
        }
        self.validate_details(today)?;
        self.estimate();
        Ok(())
    }

    pub fn transition(&mut self, next: BookingStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Cannot move booking from {} to {}",
                self.status.as_str(),
                next.as_str()
            ));
        }
        self.status = next;
        Ok(())
    }

    fn validate_details(&self, today: NaiveDate) -> Result<(), String> {
        self.pickup.validate("Pickup")?;
        self.destination.validate("Destination")?;

        let date = NaiveDate::parse_from_str(&self.pickup_date, "%Y-%m-%d")
            .map_err(|_| format!("Invalid pickup date: {}", self.pickup_date))?;
        if date < today {
            return Err("Pickup date cannot be in the past".to_string());
        }
        if parse_time(&self.pickup_time).is_none() {
            return Err(format!("Invalid pickup time: {}", self.pickup_time));
        }

        let max = self.vehicle_type.rate().max_passengers;
        if self.passengers == 0 || self.passengers > max {
            return Err(format!(
                "A {} carries between 1 and {} passengers",
                self.vehicle_type, max
            ));
        }
        Ok(())
    }

    fn estimate(&mut self) {
        let points = self.pickup.coordinates.zip(self.destination.coordinates);
        match points.and_then(|(a, b)| fare::fare_between(a, b, self.vehicle_type).ok()) {
            Some(breakdown) => {
                self.distance_km = Some(fare::round_amount(breakdown.distance_km));
                self.estimated_fare = Some(fare::round_amount(breakdown.total));
            }
            None => {
                self.distance_km = None;
                self.estimated_fare = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            pickup: Location {
                address: "Fort Railway Station, Colombo".into(),
                coordinates: Some(GeoPoint { lat: 6.9344, lng: 79.8500 }),
            },
            destination: Location {
                address: "Bandaranaike International Airport".into(),
                coordinates: Some(GeoPoint { lat: 7.1808, lng: 79.8841 }),
            },
            pickup_date: "2026-03-02".into(),
            pickup_time: "08:30".into(),
            vehicle_type: VehicleType::Sedan,
            passengers: 2,
        }
    }

    #[test]
    fn new_booking_is_pending_with_estimate() {
        let booking = Booking::from_request("b1".into(), "u1".into(), request(), today()).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        let distance = booking.distance_km.unwrap();
        assert!(distance > 25.0 && distance < 30.0, "distance {}", distance);
        let fare = booking.estimated_fare.unwrap();
        assert!((fare - (200.0 + 50.0 * distance)).abs() < 0.1);
    }

    #[test]
    fn no_coordinates_means_no_estimate() {
        let mut req = request();
        req.destination.coordinates = None;
        let booking = Booking::from_request("b1".into(), "u1".into(), req, today()).unwrap();
        assert!(booking.distance_km.is_none());
        assert!(booking.estimated_fare.is_none());
    }

    #[test]
    fn rejects_bad_details() {
        let mut req = request();
        req.passengers = 5;
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_err());

        let mut req = request();
        req.passengers = 0;
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_err());

        let mut req = request();
        req.pickup_date = "2026-02-28".into();
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_err());

        let mut req = request();
        req.pickup_time = "25:00".into();
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_err());

        let mut req = request();
        req.pickup.address = "  ".into();
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_err());

        let mut req = request();
        req.pickup.coordinates = Some(GeoPoint { lat: 91.0, lng: 0.0 });
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_err());
    }

    #[test]
    fn accepts_time_with_seconds() {
        let mut req = request();
        req.pickup_time = "08:30:00".into();
        assert!(Booking::from_request("b".into(), "u".into(), req, today()).is_ok());
    }

    #[test]
    fn changing_type_reprices() {
        let mut booking = Booking::from_request("b1".into(), "u1".into(), request(), today()).unwrap();
        let sedan_fare = booking.estimated_fare.unwrap();
        let update = UpdateBookingRequest {
            vehicle_type: Some(VehicleType::Luxury),
            ..Default::default()
        };
        booking.apply_details(&update, today()).unwrap();
        assert!(booking.estimated_fare.unwrap() > sedan_fare);
    }

    #[test]
    fn status_lifecycle() {
        use BookingStatus::*;
        let mut booking = Booking::from_request("b1".into(), "u1".into(), request(), today()).unwrap();
        assert!(booking.transition(Completed).is_err());
        booking.transition(Confirmed).unwrap();
        booking.transition(InProgress).unwrap();
        assert!(booking.transition(Cancelled).is_err());
        booking.transition(Completed).unwrap();
        for next in BookingStatus::ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(!Completed.is_active());
        assert!(InProgress.is_active());
    }
}
