use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use biograph_backend::{routes, AppState};
use biograph_config::AppConfig;
use biograph_observability::{init_tracing, observability, TracingConfig};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::for_service("biograph-backend"));

    info!("Starting BioGraph query service...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize application state")?;
    let frontend_dir = state.frontend_dir.clone();
    let state_data = web::Data::new(state);

    let bind = (config.server.host.clone(), config.server.port);
    info!("🔷 Listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(Cors::permissive())
            .wrap(observability("biograph-backend"))
            .configure(routes::configure_routes)
            .configure(routes::static_files(frontend_dir.clone()))
    })
    .bind(bind)
    .context("Failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server error")
}
