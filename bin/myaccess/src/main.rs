//! # MyAccess Binary
//!
//! Assembles the application from runtime settings and compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use configs::{PlaceSettings, Settings, StoreBackend, WriteStrategySetting};
use log::{info, warn};
use ma_api::handlers::AppState;
use ma_api::middleware::{cors_policy, standard_middleware};
use ma_auth_simple::SimpleAuthProvider;
use ma_core::traits::{DocumentStore, ImageUploader};
use ma_repo::{PlaceRepository, UserRepository, WriteStrategy};
use ma_storage_local::LocalImageStore;
use ma_store_memory::MemoryStore;
use secrecy::ExposeSecret;

#[cfg(feature = "db-sqlite")]
use ma_store_sqlite::SqliteDocumentStore;

const DEV_SECRET: &str = "dev-secret-change-me";

fn write_strategy(settings: &PlaceSettings) -> WriteStrategy {
    match settings.write_strategy {
        WriteStrategySetting::Atomic => WriteStrategy::Atomic,
        WriteStrategySetting::Optimistic => WriteStrategy::Optimistic {
            max_attempts: settings.max_attempts,
        },
        WriteStrategySetting::LastWriterWins => WriteStrategy::LastWriterWins,
    }
}

async fn document_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "db-sqlite")]
        StoreBackend::Sqlite => {
            let store = SqliteDocumentStore::new(&settings.store.database_url)
                .await
                .with_context(|| format!("failed to open {}", settings.store.database_url))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "db-sqlite"))]
        StoreBackend::Sqlite => anyhow::bail!("built without the db-sqlite feature; set store.backend = memory"),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Document store
    let store = document_store(&settings).await?;

    // 2. Image storage
    std::fs::create_dir_all(&settings.media.root)
        .with_context(|| format!("failed to create {}", settings.media.root))?;
    let uploader: Arc<dyn ImageUploader> =
        Arc::new(LocalImageStore::new(&settings.media.root, settings.media.url_prefix.clone()));

    // 3. Auth
    let secret = settings.auth.secret.expose_secret();
    if secret == DEV_SECRET {
        warn!("auth.secret is the development default; set MYACCESS__AUTH__SECRET");
    }
    let auth = SimpleAuthProvider::new(secret)?;

    // 4. Repositories
    let strategy = write_strategy(&settings.places);
    let default_image = format!("{}/profile_images/default_user_image.png", settings.media.url_prefix);
    let state = web::Data::new(AppState {
        places: PlaceRepository::new(store.clone(), uploader.clone()).with_strategy(strategy),
        users: UserRepository::new(store).with_default_profile_image(default_image),
        uploader,
        auth: Box::new(auth),
    });

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let media_root = settings.media.root.clone();
    let url_prefix = settings.media.url_prefix.clone();
    info!("MyAccess starting on http://{host}:{port} ({strategy:?} writes)");

    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .app_data(state.clone())
            .service(actix_files::Files::new(&url_prefix, &media_root))
            .configure(ma_api::configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;
    Ok(())
}
