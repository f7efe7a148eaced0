use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::{Arg, Command};
use decideguide_api::config::ApiConfig;
use decideguide_api::handlers::AppState;
use decideguide_api::helpers::database::initialize_database;
use decideguide_api::logging::init_logging;
use decideguide_api::routes::configure_routes;
use decideguide_api::storage::{LocalObjectStore, SqliteSurveyStorage};
use decideguide_api::{json_config, payload_config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("decideguide-api")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Decision-tree survey service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file")
                .value_name("FILE"),
        )
        .get_matches();
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);

    let (config, loaded_from) = ApiConfig::load(config_path.as_deref())?;
    let _log_guard = init_logging(&config.logging)?;
    info!("Loaded configuration from {}", loaded_from.display());

    let db = initialize_database(&config.database.path)?;
    info!("Database initialized at {:?}", config.database.path);

    std::fs::create_dir_all(&config.storage.uploads_dir)?;
    let storage = Arc::new(SqliteSurveyStorage::new(db));
    let objects = Arc::new(LocalObjectStore::new(&config.storage.uploads_dir));
    let app_state = web::Data::new(AppState::new(
        storage,
        objects,
        config.storage.max_upload_bytes,
    ));

    let allowed_origins = config
        .cors
        .as_ref()
        .map(|cors| cors.allowed_origins.clone())
        .unwrap_or_default();
    let max_upload_bytes = config.storage.max_upload_bytes;
    let bind_addr = config.bind_address();
    info!("Starting decideguide-api server at http://{}", bind_addr);

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .app_data(json_config())
            .app_data(payload_config(max_upload_bytes))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
