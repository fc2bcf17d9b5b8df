pub mod auth;
pub mod bill;
pub mod booking;
pub mod driver;
pub mod user;
pub mod vehicle;

// Re-export all the models that are used in other modules
pub use auth::{AuthResponse, LoginRequest, SignupRequest};
pub use bill::{Bill, BillStatus};
pub use booking::{
    Booking, BookingStatus, CreateBookingRequest, GeoPoint, Location, UpdateBookingRequest,
};
pub use driver::{CreateDriverRequest, Driver, UpdateDriverRequest};
pub use user::{Claims, Role, User, UserResponse};
pub use vehicle::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle, VehicleType};

/// Fresh document id, shared by both storage backends.
pub fn new_id() -> String {
    mongodb::bson::oid::ObjectId::new().to_hex()
}
