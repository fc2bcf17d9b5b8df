use chrono::Utc;
use log::info;

use super::Store;
use crate::auth;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{new_id, Driver, Role, User, Vehicle, VehicleType};

/// Creates the admin account if missing and fills an empty fleet with
/// sample vehicles and drivers. With `force_seed` the fleet is cleared first.
pub async fn seed_data(store: &dyn Store, config: &Config) -> Result<(), ApiError> {
    let admin_email = crate::models::auth::normalize_email(&config.admin_email);
    if store.find_user_by_email(&admin_email).await?.is_none() {
        let admin = User {
            id: new_id(),
            name: "Administrator".to_string(),
            email: admin_email.clone(),
            password: auth::hash_password(&config.admin_password, config.bcrypt_cost)?,
            role: Role::Admin,
            phone: None,
            created_at: Utc::now(),
        };
        store.insert_user(admin).await?;
        info!("Created admin account {}", admin_email);
    }

    if config.force_seed {
        info!("Force seeding enabled. Clearing fleet...");
        store.clear_fleet().await?;
    }

    if !store.list_vehicles().await?.is_empty() {
        return Ok(());
    }

    info!("Seeding sample fleet...");
    let drivers = [
        ("Sunil Perera", "B2345671", "+94 77 123 4567"),
        ("Nimal Fernando", "B3456782", "+94 71 234 5678"),
        ("Kasun Jayasinghe", "B4567893", "+94 76 345 6789"),
        ("Ruwan Silva", "B5678904", "+94 70 456 7890"),
    ];
    let mut driver_ids = Vec::new();
    for (name, license, phone) in drivers {
        let driver = Driver {
            id: new_id(),
            name: name.to_string(),
            license_number: license.to_string(),
            phone: phone.to_string(),
            available: true,
            created_at: Utc::now(),
        };
        driver_ids.push(store.insert_driver(driver).await?.id);
    }

    let vehicles = [
        ("CAB-4521", "Toyota Axio", VehicleType::Sedan),
        ("CAD-7710", "Suzuki Ciaz", VehicleType::Sedan),
        ("KX-3390", "Toyota Prado", VehicleType::Suv),
        ("PH-2044", "Toyota KDH Hiace", VehicleType::Van),
        ("CBA-0001", "Mercedes-Benz E-Class", VehicleType::Luxury),
    ];
    let count = vehicles.len();
    for (i, (registration, model, vehicle_type)) in vehicles.into_iter().enumerate() {
        let vehicle = Vehicle {
            id: new_id(),
            registration_number: registration.to_string(),
            model: model.to_string(),
            vehicle_type,
            seats: vehicle_type.rate().max_passengers,
            driver_id: driver_ids.get(i).cloned(),
            available: true,
            created_at: Utc::now(),
        };
        store.insert_vehicle(vehicle).await?;
    }
    info!("Seeding complete with {} vehicles and {} drivers", count, driver_ids.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn config() -> Config {
        Config {
            bcrypt_cost: crate::config::MIN_BCRYPT_COST,
            ..Config::default()
        }
    }

    #[actix_web::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        let config = config();
        seed_data(&store, &config).await.unwrap();
        seed_data(&store, &config).await.unwrap();

        assert_eq!(store.list_vehicles().await.unwrap().len(), 5);
        assert_eq!(store.list_drivers().await.unwrap().len(), 4);
        assert_eq!(store.count_users().await.unwrap(), 1);
        let admin = store
            .find_user_by_email("admin@ridebook.lk")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[actix_web::test]
    async fn force_seed_replaces_fleet() {
        let store = MemoryStore::new();
        seed_data(&store, &config()).await.unwrap();
        let before: Vec<String> = store
            .list_vehicles()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();

        let forced = Config {
            force_seed: true,
            ..config()
        };
        seed_data(&store, &forced).await.unwrap();
        let after = store.list_vehicles().await.unwrap();
        assert_eq!(after.len(), 5);
        assert!(after.iter().all(|v| !before.contains(&v.id)));
    }
}
