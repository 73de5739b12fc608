// src/routes.rs
use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{admin_handler, auth_handler, car_handler, driver_handler, index_handler, manufacturer_handler},
    state::AppState,
    urls,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(urls::INDEX, get(index_handler::index))
        .route(
            urls::LOGIN,
            get(auth_handler::login_page).post(auth_handler::login),
        )
        .route(
            urls::LOGOUT,
            get(auth_handler::logout).post(auth_handler::logout),
        )
        .route(urls::MANUFACTURER_LIST, get(manufacturer_handler::list_manufacturers))
        .route(
            urls::MANUFACTURER_CREATE,
            get(manufacturer_handler::create_manufacturer_page).post(manufacturer_handler::create_manufacturer),
        )
        .route(
            "/manufacturers/:id/update/",
            get(manufacturer_handler::update_manufacturer_page).post(manufacturer_handler::update_manufacturer),
        )
        .route(
            "/manufacturers/:id/delete/",
            get(manufacturer_handler::delete_manufacturer_page).post(manufacturer_handler::delete_manufacturer),
        )
        .route(urls::CAR_LIST, get(car_handler::list_cars))
        .route(
            urls::CAR_CREATE,
            get(car_handler::create_car_page).post(car_handler::create_car),
        )
        .route("/cars/:id/", get(car_handler::car_detail))
        .route(
            "/cars/:id/update/",
            get(car_handler::update_car_page).post(car_handler::update_car),
        )
        .route(
            "/cars/:id/delete/",
            get(car_handler::delete_car_page).post(car_handler::delete_car),
        )
        .route(
            "/cars/:id/toggle-assign/",
            get(car_handler::toggle_assign_to_car).post(car_handler::toggle_assign_to_car),
        )
        .route(urls::DRIVER_LIST, get(driver_handler::list_drivers))
        .route(
            urls::DRIVER_CREATE,
            get(driver_handler::create_driver_page).post(driver_handler::create_driver),
        )
        .route("/drivers/:id/", get(driver_handler::driver_detail))
        .route(
            "/drivers/:id/update/",
            get(driver_handler::update_driver_page).post(driver_handler::update_driver),
        )
        .route(
            "/drivers/:id/delete/",
            get(driver_handler::delete_driver_page).post(driver_handler::delete_driver),
        )
        .route(urls::ADMIN_INDEX, get(admin_handler::admin_index))
        .route("/admin/taxi/:model/", get(admin_handler::changelist))
        .route(
            "/admin/taxi/:model/:id/change/",
            get(admin_handler::change_page).post(admin_handler::save_change),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
