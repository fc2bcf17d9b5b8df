//! Fare table and distance calculations.
//!
//! Formula: `fare = base_fare(type) + rate_per_km(type) * distance_km`, with the
//! distance taken as the great-circle distance between pickup and destination.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{GeoPoint, VehicleType};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const CURRENCY: &str = "LKR";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rate {
    pub vehicle_type: VehicleType,
    pub base_fare: f64,
    pub rate_per_km: f64,
    pub max_passengers: u32,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Sedan,
        VehicleType::Suv,
        VehicleType::Van,
        VehicleType::Luxury,
    ];

    pub fn rate(self) -> Rate {
        let (base_fare, rate_per_km, max_passengers) = match self {
            VehicleType::Sedan => (200.0, 50.0, 4),
            VehicleType::Suv => (300.0, 65.0, 6),
            VehicleType::Van => (400.0, 80.0, 10),
            VehicleType::Luxury => (600.0, 100.0, 4),
        };
        Rate {
            vehicle_type: self,
            base_fare,
            rate_per_km,
            max_passengers,
        }
    }
}

/// Itemised fare for one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub vehicle_type: VehicleType,
    pub distance_km: f64,
    pub base_fare: f64,
    pub distance_charge: f64,
    pub total: f64,
    pub currency: String,
}

impl FareBreakdown {
    /// Same breakdown with every amount rounded to cents.
    pub fn rounded(self) -> Self {
        Self {
            distance_km: round_amount(self.distance_km),
            base_fare: round_amount(self.base_fare),
            distance_charge: round_amount(self.distance_charge),
            total: round_amount(self.total),
            ..self
        }
    }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    // Rounding can push h just past 1 for near-antipodal points.
    let h = (sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon).clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Fare for `distance_km` in a vehicle of the given type.
///
/// Fails on a negative or non-finite distance.
pub fn calculate_fare(distance_km: f64, vehicle_type: VehicleType) -> Result<f64, ApiError> {
    Ok(breakdown(distance_km, vehicle_type)?.total)
}

pub fn breakdown(distance_km: f64, vehicle_type: VehicleType) -> Result<FareBreakdown, ApiError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "distance must be a non-negative number, got {}",
            distance_km
        )));
    }
    Ok(priced(distance_km, vehicle_type))
}

/// Unchecked pricing; `distance_km` must already be finite and non-negative.
pub(crate) fn priced(distance_km: f64, vehicle_type: VehicleType) -> FareBreakdown {
    let rate = vehicle_type.rate();
    let distance_charge = rate.rate_per_km * distance_km;
    FareBreakdown {
        vehicle_type,
        distance_km,
        base_fare: rate.base_fare,
        distance_charge,
        total: rate.base_fare + distance_charge,
        currency: CURRENCY.to_string(),
    }
}

/// Fare between two coordinates.
pub fn fare_between(
    pickup: GeoPoint,
    destination: GeoPoint,
    vehicle_type: VehicleType,
) -> Result<FareBreakdown, ApiError> {
    breakdown(haversine_km(pickup, destination), vehicle_type)
}

/// Round a currency amount to cents.
pub fn round_amount(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOMBO: GeoPoint = GeoPoint { lat: 6.9271, lng: 79.8612 };
    const KANDY: GeoPoint = GeoPoint { lat: 7.2906, lng: 80.6337 };

    #[test]
    fn zero_distance_costs_base_fare() {
        for vehicle_type in VehicleType::ALL {
            let fare = calculate_fare(0.0, vehicle_type).unwrap();
            assert_eq!(fare, vehicle_type.rate().base_fare);
        }
    }

    #[test]
    fn suv_ten_km() {
        assert_eq!(calculate_fare(10.0, VehicleType::Suv).unwrap(), 950.0);
    }

    #[test]
    fn fare_table_matches_published_rates() {
        let table: Vec<(f64, f64)> = VehicleType::ALL
            .iter()
            .map(|t| (t.rate().base_fare, t.rate().rate_per_km))
            .collect();
        assert_eq!(
            table,
            vec![(200.0, 50.0), (300.0, 65.0), (400.0, 80.0), (600.0, 100.0)]
        );
    }

    #[test]
    fn fare_never_decreases_with_distance() {
        for vehicle_type in VehicleType::ALL {
            let mut previous = 0.0;
            for step in 0..200 {
                let fare = calculate_fare(step as f64 * 0.37, vehicle_type).unwrap();
                assert!(fare >= previous, "{:?} dropped at step {}", vehicle_type, step);
                previous = fare;
            }
        }
    }

    #[test]
    fn rejects_bad_distances() {
        assert!(calculate_fare(-1.0, VehicleType::Sedan).is_err());
        assert!(calculate_fare(f64::NAN, VehicleType::Sedan).is_err());
        assert!(calculate_fare(f64::INFINITY, VehicleType::Van).is_err());
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_km(COLOMBO, COLOMBO), 0.0);
        assert_eq!(haversine_km(KANDY, KANDY), 0.0);
    }

    #[test]
    fn colombo_to_kandy() {
        let d = haversine_km(COLOMBO, KANDY);
        assert!((d - 94.0).abs() < 2.0, "got {}", d);
        assert!((d - haversine_km(KANDY, COLOMBO)).abs() < 1e-9);
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        let a = GeoPoint { lat: -87.843, lng: -177.3958 };
        let b = GeoPoint { lat: 87.843, lng: 2.6042 };
        let d = haversine_km(a, b);
        assert!(d.is_finite(), "got {}", d);
        assert!((d - half_circumference).abs() < 1.0);
        assert!(fare_between(a, b, VehicleType::Sedan).is_ok());

        for i in 0..2000 {
            let lat = -89.9 + (i as f64) * 0.0899;
            let lng = -179.9 + (i as f64) * 0.1799;
            let p = GeoPoint { lat, lng };
            let q = GeoPoint { lat: -lat, lng: if lng > 0.0 { lng - 180.0 } else { lng + 180.0 } };
            let d = haversine_km(p, q);
            assert!(d.is_finite() && d >= 0.0, "{:?} to {:?} gave {}", p, q, d);
        }
    }

    #[test]
    fn breakdown_adds_up() {
        let fare = fare_between(COLOMBO, KANDY, VehicleType::Luxury).unwrap();
        assert_eq!(fare.base_fare, 600.0);
        assert!((fare.base_fare + fare.distance_charge - fare.total).abs() < 1e-9);
        assert_eq!(fare.currency, "LKR");
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_amount(1234.5678), 1234.57);
        assert_eq!(round_amount(950.0), 950.0);
    }
}
