use sea_orm::{ConnectOptions, Database};
use tokio::net::TcpListener;

use user_api::{
    config::AppConfig,
    infrastructure::{logging::init_logging, schema::sync_schema},
    presentation::app_module::AppModule,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_logging(&config.logging);

    let mut opt = ConnectOptions::new(config.database.url.clone());
    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .sqlx_logging(config.database.sql_logging);

    let db = Database::connect(opt).await?;
    if config.database.sync_schema {
        sync_schema(&db).await?;
    }

    let app = AppModule::new(db).into_router();

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
