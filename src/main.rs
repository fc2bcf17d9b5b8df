use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use log::{error, info};

use ride_book::config::{Config, StorageKind};
use ride_book::db::{seed, MemoryStore, MongoDB, Store};
use ride_book::{configure, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();

    let store: Arc<dyn Store> = match config.storage {
        StorageKind::MongoDB => {
            let mongo = MongoDB::new(&config.mongodb_uri, &config.database_name)
                .await
                .map_err(|e| {
                    error!("Failed to connect to MongoDB: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
            if let Err(e) = mongo.ensure_indexes().await {
                error!("Failed to create indexes: {}", e);
            }
            info!("Using MongoDB database {}", config.database_name);
            Arc::new(mongo)
        }
        StorageKind::Memory => {
            info!("Using in-memory store with mock data");
            Arc::new(MemoryStore::new())
        }
    };

    if let Err(e) = seed::seed_data(store.as_ref(), &config).await {
        error!("Seeding failed: {}", e);
    }

    let address = config.address();
    let cors_origin = config.cors_origin.clone();
    let state = AppState::new(store, config);

    info!("Starting server at http://{}", address);
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure(state.clone()))
    })
    .bind(&address)?
    .run()
    .await
}
