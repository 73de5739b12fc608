use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    handlers::{AuthenticatedDriver, page_context},
    services::{CarOperations, DriverOperations, ManufacturerOperations},
    state::AppState,
};

pub async fn index(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
) -> Result<Html<String>, AppError> {
    let num_drivers = state.driver_service.count_drivers().await?;
    let num_cars = state.car_service.count_cars().await?;
    let num_manufacturers = state.manufacturer_service.count_manufacturers().await?;

    let mut session = auth.session;
    session.num_visits += 1;
    state.session_service.save(&auth.session_key, &session).await?;

    let mut context = page_context(Some(&auth.driver), "Home");
    context.insert("num_drivers", &num_drivers);
    context.insert("num_cars", &num_cars);
    context.insert("num_manufacturers", &num_manufacturers);
    context.insert("num_visits", &session.num_visits);
    state.templates.render("index.html", &context)
}
