mod common;

use axum::http::StatusCode;

use common::{TestApp, location, spawn_app};
use taxi_service::services::{CarOperations, DriverOperations, ManufacturerOperations};

#[tokio::test]
async fn test_admin_index_lists_models() {
    let (app, ..) = TestApp::seeded().await;
    let response = app.server.get("/admin/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Cars"));
    assert!(body.contains("Drivers"));
    assert!(body.contains("Manufacturers"));
}

#[tokio::test]
async fn test_license_number_in_list_display() {
    let (app, ..) = TestApp::seeded().await;
    let response = app.server.get("/admin/taxi/driver/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("DRV12345"));
    assert!(body.contains("Select driver to change"));
}

#[tokio::test]
async fn test_license_number_in_fieldsets() {
    let (app, _, driver, _) = TestApp::seeded().await;
    let response = app.server.get(&format!("/admin/taxi/driver/{}/change/", driver.id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("License number"));
    assert!(body.contains("Additional info"));
}

#[tokio::test]
async fn test_car_model_in_list_display() {
    let (app, ..) = TestApp::seeded().await;
    let response = app.server.get("/admin/taxi/car/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Skyline"));
}

#[tokio::test]
async fn test_manufacturer_in_list_display() {
    let (app, ..) = TestApp::seeded().await;
    let response = app.server.get("/admin/taxi/manufacturer/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Manufacturer"));
    assert!(body.contains("Nissan Japan"));
}

#[tokio::test]
async fn test_car_changelist_search_and_filter() {
    let (app, ..) = TestApp::seeded().await;
    let honda = app.create_manufacturer("Honda", "Japan").await;
    app.create_car("Civic", &honda, &[]).await;

    let body = app.server.get("/admin/taxi/car/?q=civ").await.text();
    assert!(body.contains("Civic"));
    assert!(!body.contains(">Skyline<"));

    let body = app
        .server
        .get(&format!("/admin/taxi/car/?manufacturer__id__exact={}", honda.id))
        .await
        .text();
    assert!(body.contains(">Civic<"));
    assert!(!body.contains(">Skyline<"));
}

#[tokio::test]
async fn test_unknown_admin_model_is_404() {
    let (app, ..) = TestApp::seeded().await;
    assert_eq!(app.server.get("/admin/taxi/job/").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.server.get("/admin/taxi/driver/999/change/").await.status_code(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_change_driver_in_admin() {
    let (app, _, driver, _) = TestApp::seeded().await;
    let path = format!("/admin/taxi/driver/{}/change/", driver.id);
    let response = app
        .server
        .post(&path)
        .form(&[
            ("first_name", "Test"),
            ("last_name", "Driver"),
            ("email", "driver@example.com"),
            ("license_number", "ADM54321"),
            ("is_active", "on"),
            ("is_staff", "on"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(location(&response), "/admin/taxi/driver/");

    let updated = app.state.driver_service.get_driver(driver.id).await.unwrap().unwrap();
    assert_eq!(updated.license_number, "ADM54321");
    assert_eq!(updated.email, "driver@example.com");
    assert!(updated.is_staff);
    assert!(!updated.is_superuser);
}

#[tokio::test]
async fn test_change_car_in_admin() {
    let (app, _, driver, car) = TestApp::seeded().await;
    let toyota = app.create_manufacturer("Toyota", "Japan").await;
    let path = format!("/admin/taxi/car/{}/change/", car.id);

    let response = app.server.get(&path).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let manufacturer_id = toyota.id.to_string();
    let driver_id = driver.id.to_string();
    let response = app
        .server
        .post(&path)
        .form(&[
            ("model", "Supra"),
            ("manufacturer", manufacturer_id.as_str()),
            ("drivers", driver_id.as_str()),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(location(&response), "/admin/taxi/car/");

    let updated = app.state.car_service.get_car(car.id).await.unwrap().unwrap();
    assert_eq!(updated.model, "Supra");
    assert_eq!(updated.manufacturer.id, toyota.id);
    let drivers = app.state.car_service.drivers_of_car(car.id).await.unwrap();
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0].id, driver.id);
}

#[tokio::test]
async fn test_change_with_errors_rerenders() {
    let (app, manufacturer, ..) = TestApp::seeded().await;
    let path = format!("/admin/taxi/manufacturer/{}/change/", manufacturer.id);
    let response = app.server.post(&path).form(&[("name", ""), ("country", "Japan")]).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Please correct the errors below."));

    let unchanged = app
        .state
        .manufacturer_service
        .get_manufacturer(manufacturer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.name, "Nissan");
}

#[tokio::test]
async fn test_admin_requires_staff() {
    let app = spawn_app().await;
    let response = app.server.get("/admin/").await;
    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(location(&response), "/accounts/login/?next=%2Fadmin%2F");

    app.create_driver("plain", "plain_12345", "PLN12345").await;
    app.login("plain", "plain_12345").await;
    assert_eq!(app.server.get("/admin/").await.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(app.server.get("/admin/taxi/driver/").await.status_code(), StatusCode::FORBIDDEN);
}
