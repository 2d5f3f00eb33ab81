//! # Posty Web Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod listing;
mod middleware;
mod state;
mod telemetry;
mod views;

use config::AppConfig;
use middleware::error::error_pages;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

/// Minimum `SECRET_KEY` length accepted for the session cookie key.
const SECRET_KEY_MIN_BYTES: usize = 64;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Posty Web Server on {}:{}",
        config.host,
        config.port
    );

    let (state, stores) = AppState::new(&config).await?;

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&config, stores).await?;
    #[cfg(not(feature = "scheduler"))]
    drop(stores);

    let key = session_key(config.secret_key.as_deref());
    let cookie_secure = config.cookie_secure;

    HttpServer::new(move || {
        App::new()
            .wrap(error_pages())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(cookie_secure)
                    .build(),
            )
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    Ok(())
}

fn session_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) if secret.len() >= SECRET_KEY_MIN_BYTES => Key::from(secret.as_bytes()),
        Some(_) => {
            tracing::warn!(
                "SECRET_KEY shorter than {} bytes, using a random session key",
                SECRET_KEY_MIN_BYTES
            );
            Key::generate()
        }
        None => {
            tracing::warn!("SECRET_KEY not set, sessions will not survive a restart");
            Key::generate()
        }
    }
}

/// Start the sweepers for the login limiter and, when the page cache lives
/// in process memory, for the cache.
#[cfg(feature = "scheduler")]
async fn start_scheduler(
    config: &AppConfig,
    stores: state::MemoryStores,
) -> anyhow::Result<Option<background::Scheduler>> {
    if !config.cache_sweep_enabled {
        tracing::info!("Sweepers disabled");
        return Ok(None);
    }

    let scheduler = background::Scheduler::new(background::SchedulerConfig { enabled: true }).await?;
    scheduler.add_limiter_sweep(stores.login_limiter).await?;
    if let Some(cache) = stores.cache {
        scheduler.add_cache_sweep(cache).await?;
    }
    scheduler.start().await?;
    Ok(Some(scheduler))
}
