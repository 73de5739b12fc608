use std::sync::Arc;

use taxi_service::{
    AppConfig, AppState, TaxiResult, build_router,
    utils::telemetry::init_telemetry,
};

#[tokio::main]
async fn main() -> TaxiResult<()> {
    let config = AppConfig::from_env()?;
    init_telemetry(&config.logging)?;

    let bind_address = config.bind_address.clone();
    let app_state = AppState::new(config).await?;
    let app = build_router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Taxi service listening on {}", bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
