#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::{TestServer, TestServerConfig};
use std::sync::Arc;

use taxi_service::{
    AppConfig, AppState, build_router,
    models::{Car, Driver, Manufacturer, NewCar, NewDriver, NewManufacturer},
    services::{CarOperations, DriverOperations, ManufacturerOperations},
};

pub const ADMIN_USERNAME: &str = "test_admin";
pub const ADMIN_PASSWORD: &str = "admin_12345";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

/// A fresh in-memory app with cookie-saving client.
pub async fn spawn_app() -> TestApp {
    let state = Arc::new(AppState::new(AppConfig::in_memory()).await.unwrap());
    let config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::default()
    };
    let server = TestServer::new_with_config(build_router(state.clone()), config).unwrap();
    TestApp { server, state }
}

impl TestApp {
    pub async fn create_superuser(&self) -> Driver {
        self.state
            .driver_service
            .create_driver(NewDriver::superuser(ADMIN_USERNAME, ADMIN_PASSWORD))
            .await
            .unwrap()
    }

    pub async fn create_driver(&self, username: &str, password: &str, license_number: &str) -> Driver {
        self.state
            .driver_service
            .create_driver(NewDriver::new(username, password).with_license_number(license_number))
            .await
            .unwrap()
    }

    pub async fn create_manufacturer(&self, name: &str, country: &str) -> Manufacturer {
        self.state
            .manufacturer_service
            .create_manufacturer(NewManufacturer::new(name, country))
            .await
            .unwrap()
    }

    pub async fn create_car(&self, model: &str, manufacturer: &Manufacturer, drivers: &[&Driver]) -> Car {
        self.state
            .car_service
            .create_car(NewCar {
                model: model.to_string(),
                manufacturer_id: manufacturer.id,
                driver_ids: drivers.iter().map(|d| d.id).collect(),
            })
            .await
            .unwrap()
    }

    pub async fn login(&self, username: &str, password: &str) {
        let response = self
            .server
            .post("/accounts/login/")
            .form(&[("username", username), ("password", password)])
            .await;
        assert_eq!(response.status_code(), StatusCode::FOUND, "login as {} failed", username);
    }

    /// Superuser logged in, plus the Nissan Skyline and its future driver.
    pub async fn seeded() -> (TestApp, Manufacturer, Driver, Car) {
        let app = spawn_app().await;
        app.create_superuser().await;
        app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        let manufacturer = app.create_manufacturer("Nissan", "Japan").await;
        let driver = app.create_driver("test_driver", "driver_12345", "DRV12345").await;
        let car = app.create_car("Skyline", &manufacturer, &[]).await;
        (app, manufacturer, driver, car)
    }
}

pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .unwrap()
        .to_string()
}
