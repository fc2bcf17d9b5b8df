use std::sync::Arc;

use actix_web::web;

use crate::config::Config;
use crate::db::Store;
use crate::error::ApiError;
use crate::geocode::ReverseGeocoder;
use crate::handlers::{self, auth, bills, bookings, drivers, fare, geocode, stats, vehicles};

/// Shared application data, cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub store: web::Data<dyn Store>,
    pub config: web::Data<Config>,
    pub geocoder: web::Data<ReverseGeocoder>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let geocoder = ReverseGeocoder::new(&config.geocoder_url);
        Self {
            store: web::Data::from(store),
            config: web::Data::new(config),
            geocoder: web::Data::new(geocoder),
        }
    }
}

/// Registers application data and every route.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state.store)
            .app_data(state.config)
            .app_data(state.geocoder)
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                ApiError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                ApiError::BadRequest(err.to_string()).into()
            }))
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/user")
                            .route("/signup", web::post().to(auth::signup))
                            .route("/login", web::post().to(auth::login))
                            .route("/me", web::get().to(auth::me)),
                    )
                    .service(
                        web::scope("/vehicle")
                            .route("", web::get().to(vehicles::list_vehicles))
                            .route("", web::post().to(vehicles::create_vehicle))
                            .route("/{id}", web::get().to(vehicles::get_vehicle))
                            .route("/{id}", web::put().to(vehicles::update_vehicle))
                            .route("/{id}", web::delete().to(vehicles::delete_vehicle)),
                    )
                    .service(
                        web::scope("/driver")
                            .route("", web::get().to(drivers::list_drivers))
                            .route("", web::post().to(drivers::create_driver))
                            .route("/{id}", web::get().to(drivers::get_driver))
                            .route("/{id}", web::put().to(drivers::update_driver))
                            .route("/{id}", web::delete().to(drivers::delete_driver)),
                    )
                    .service(
                        web::scope("/booking")
                            .route("", web::get().to(bookings::list_bookings))
                            .route("", web::post().to(bookings::create_booking))
                            .route("/{id}", web::get().to(bookings::get_booking))
                            .route("/{id}", web::put().to(bookings::update_booking)),
                    )
                    .service(
                        web::scope("/bill")
                            .route("", web::get().to(bills::list_bills))
                            .route("/{id}", web::get().to(bills::get_bill))
                            .route("/{id}/pay", web::put().to(bills::pay_bill)),
                    )
                    .service(
                        web::scope("/fare")
                            .route("/estimate", web::post().to(fare::estimate))
                            .route("/rates", web::get().to(fare::rates)),
                    )
                    .route("/admin/stats", web::get().to(stats::admin_stats))
                    .route("/geocode/reverse", web::get().to(geocode::reverse)),
            );
    }
}
