use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Booking, VehicleType};
use crate::fare::{self, FareBreakdown};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Unpaid,
    Paid,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Bill {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub vehicle_type: VehicleType,
    pub distance_km: f64,
    pub base_fare: f64,
    pub distance_charge: f64,
    pub total: f64,
    pub currency: String,
    pub status: BillStatus,
    pub issued_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Bill {
    /// Bill for a finished ride. Without a measured distance only the base
    /// fare is charged.
    pub fn for_booking(id: String, booking: &Booking) -> Self {
        let distance_km = booking
            .distance_km
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);
        let FareBreakdown {
            base_fare,
            distance_charge,
            total,
            currency,
            ..
        } = fare::priced(distance_km, booking.vehicle_type);

        Bill {
            id,
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            vehicle_type: booking.vehicle_type,
            distance_km,
            base_fare,
            distance_charge: fare::round_amount(distance_charge),
            total: fare::round_amount(total),
            currency,
            status: BillStatus::Unpaid,
            issued_at: Utc::now(),
            paid_at: None,
        }
    }

    pub fn pay(&mut self) -> Result<(), String> {
        if self.status == BillStatus::Paid {
            return Err("Bill is already paid".to_string());
        }
        self.status = BillStatus::Paid;
        self.paid_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, Location};

    fn booking(distance_km: Option<f64>) -> Booking {
        let now = Utc::now();
        let place = Location {
            address: "Galle Face".into(),
            coordinates: None,
        };
        Booking {
            id: "b1".into(),
            user_id: "u1".into(),
            pickup: place.clone(),
            destination: place,
            pickup_date: "2026-01-01".into(),
            pickup_time: "10:00".into(),
            vehicle_type: VehicleType::Suv,
            passengers: 3,
            distance_km,
            estimated_fare: None,
            vehicle_id: None,
            driver_id: None,
            status: BookingStatus::Completed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn bill_uses_fare_table() {
        let bill = Bill::for_booking("bill1".into(), &booking(Some(10.0)));
        assert_eq!(bill.base_fare, 300.0);
        assert_eq!(bill.distance_charge, 650.0);
        assert_eq!(bill.total, 950.0);
        assert_eq!(bill.currency, "LKR");
        assert_eq!(bill.status, BillStatus::Unpaid);
    }

    #[test]
    fn missing_distance_charges_base_fare() {
        let bill = Bill::for_booking("bill1".into(), &booking(None));
        assert_eq!(bill.total, 300.0);
    }

    #[test]
    fn paying_twice_fails() {
        let mut bill = Bill::for_booking("bill1".into(), &booking(Some(1.0)));
        bill.pay().unwrap();
        assert!(bill.paid_at.is_some());
        assert!(bill.pay().is_err());
    }
}
