use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use taskdesk::{
    auth::AccessGate,
    routes::{self, health},
    store::PgStore,
    AppState, Config,
};

fn cors(config: &Config) -> Cors {
    match &config.cors_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600),
        None => Cors::default(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let state = match &config.database_url {
        Some(database_url) => {
            let store = PgStore::connect(database_url)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            store
                .migrate()
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            log::info!("connected to Postgres, migrations applied");
            AppState::new(&config, Arc::new(store.clone()), Arc::new(store))
        }
        None => {
            log::warn!("DATABASE_URL not set; using the in-memory store, data will not persist");
            AppState::in_memory(&config)
        }
    };

    log::info!("Starting taskdesk server at {}", config.server_url());

    let state = web::Data::new(state);
    let bind_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(AccessGate::new(state.tokens.clone()))
            .wrap(Logger::default())
            .wrap(cors(&config))
            .service(health::health)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind((bind_config.server_host.as_str(), bind_config.server_port))?
    .run()
    .await
}
