// src/services/driver_service.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing;

use crate::{
    db::contains_pattern,
    errors::TaxiError as AppError,
    models::{
        car::{Assignment, Car},
        driver::{Driver, DriverUpdate, NewDriver},
    },
    services::car_service::{row_to_car, select_cars},
    utils::{
        pagination::{Page, PageRequest},
        password::{Argon2Hasher, PasswordHasher},
    },
};

#[async_trait]
pub trait DriverOperations: Send + Sync {
    async fn list_drivers(&self, username: Option<&str>, page: PageRequest) -> Result<Page<Driver>, AppError>;
    async fn all_drivers(&self) -> Result<Vec<Driver>, AppError>;
    async fn get_driver(&self, driver_id: i64) -> Result<Option<Driver>, AppError>;
    async fn get_driver_by_username(&self, username: &str) -> Result<Option<Driver>, AppError>;
    async fn create_driver(&self, new_driver: NewDriver) -> Result<Driver, AppError>;
    async fn update_license_number(&self, driver_id: i64, license_number: &str) -> Result<Driver, AppError>;
    async fn update_driver(&self, driver_id: i64, update: DriverUpdate) -> Result<Driver, AppError>;
    async fn delete_driver(&self, driver_id: i64) -> Result<(), AppError>;
    async fn cars_of_driver(&self, driver_id: i64) -> Result<Vec<Car>, AppError>;
    async fn toggle_car_assignment(&self, driver_id: i64, car_id: i64) -> Result<Assignment, AppError>;
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, AppError>;
    async fn record_login(&self, driver_id: i64) -> Result<(), AppError>;
    async fn username_taken(&self, username: &str) -> Result<bool, AppError>;
    async fn license_number_taken(&self, license_number: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;
    async fn count_drivers(&self) -> Result<i64, AppError>;
}

pub struct DriverService {
    pool: SqlitePool,
    hasher: Argon2Hasher,
}

impl DriverService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            hasher: Argon2Hasher::new(),
        }
    }
}

#[async_trait]
impl DriverOperations for DriverService {
    async fn list_drivers(&self, username: Option<&str>, page: PageRequest) -> Result<Page<Driver>, AppError> {
        let pattern = contains_pattern(username.unwrap_or(""));
        tracing::debug!("Listing drivers matching {:?}, page {}", username, page.number);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM drivers WHERE username LIKE ? ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;
        page.ensure_within(total)?;

        let items = sqlx::query_as::<_, Driver>(
            r"SELECT * FROM drivers
              WHERE username LIKE ? ESCAPE '\'
              ORDER BY username
              LIMIT ? OFFSET ?",
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, page, total))
    }

    async fn all_drivers(&self) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>("SELECT * FROM drivers ORDER BY username")
            .fetch_all(&self.pool)
            .await?;
        Ok(drivers)
    }

    async fn get_driver(&self, driver_id: i64) -> Result<Option<Driver>, AppError> {
        tracing::debug!("Getting driver: {}", driver_id);
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = ?")
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn get_driver_by_username(&self, username: &str) -> Result<Option<Driver>, AppError> {
        tracing::debug!("Getting driver by username: {}", username);
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn create_driver(&self, new_driver: NewDriver) -> Result<Driver, AppError> {
        tracing::info!("Registering driver: {}", new_driver.username);

        let hashed_password = self.hasher.hash(&new_driver.password)?;
        let driver = sqlx::query_as::<_, Driver>(
            "INSERT INTO drivers
                (username, password, first_name, last_name, email, license_number,
                 is_active, is_staff, is_superuser, date_joined)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
             RETURNING *",
        )
        .bind(&new_driver.username)
        .bind(&hashed_password)
        .bind(&new_driver.first_name)
        .bind(&new_driver.last_name)
        .bind(&new_driver.email)
        .bind(&new_driver.license_number)
        .bind(new_driver.is_staff)
        .bind(new_driver.is_superuser)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Driver registered successfully: {}", driver.id);
        Ok(driver)
    }

    async fn update_license_number(&self, driver_id: i64, license_number: &str) -> Result<Driver, AppError> {
        let driver = sqlx::query_as::<_, Driver>(
            "UPDATE drivers SET license_number = ? WHERE id = ? RETURNING *",
        )
        .bind(license_number)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::DriverNotFound(driver_id))?;

        tracing::info!("License number updated for driver: {}", driver_id);
        Ok(driver)
    }

    async fn update_driver(&self, driver_id: i64, update: DriverUpdate) -> Result<Driver, AppError> {
        let driver = sqlx::query_as::<_, Driver>(
            "UPDATE drivers
             SET first_name = ?, last_name = ?, email = ?, license_number = ?,
                 is_active = ?, is_staff = ?, is_superuser = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.license_number)
        .bind(update.is_active)
        .bind(update.is_staff)
        .bind(update.is_superuser)
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::DriverNotFound(driver_id))?;

        tracing::info!("Driver updated: {}", driver_id);
        Ok(driver)
    }

    async fn delete_driver(&self, driver_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = ?")
            .bind(driver_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::DriverNotFound(driver_id));
        }
        tracing::info!("Driver deleted: {}", driver_id);
        Ok(())
    }

    async fn cars_of_driver(&self, driver_id: i64) -> Result<Vec<Car>, AppError> {
        let rows = sqlx::query(&select_cars(
            "JOIN car_drivers cd ON cd.car_id = c.id WHERE cd.driver_id = ? ORDER BY c.id",
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_car).collect()
    }

    async fn toggle_car_assignment(&self, driver_id: i64, car_id: i64) -> Result<Assignment, AppError> {
        let mut tx = self.pool.begin().await?;

        let car_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cars WHERE id = ?)")
            .bind(car_id)
            .fetch_one(&mut *tx)
            .await?;
        if !car_exists {
            return Err(AppError::CarNotFound(car_id));
        }

        let removed = sqlx::query("DELETE FROM car_drivers WHERE car_id = ? AND driver_id = ?")
            .bind(car_id)
            .bind(driver_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let assignment = if removed > 0 {
            Assignment::Unassigned
        } else {
            sqlx::query("INSERT INTO car_drivers (car_id, driver_id) VALUES (?, ?)")
                .bind(car_id)
                .bind(driver_id)
                .execute(&mut *tx)
                .await?;
            Assignment::Assigned
        };
        tx.commit().await?;

        tracing::info!("Driver {} {:?} car {}", driver_id, assignment, car_id);
        Ok(assignment)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, AppError> {
        let Some(driver) = self.get_driver_by_username(username).await? else {
            tracing::warn!("Login attempt for unknown username");
            return Ok(None);
        };

        if !driver.is_active || !driver.check_password(password) {
            tracing::warn!("Rejected login for driver {}", driver.id);
            return Ok(None);
        }
        Ok(Some(driver))
    }

    async fn record_login(&self, driver_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE drivers SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(driver_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM drivers WHERE username = ?)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn license_number_taken(&self, license_number: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM drivers WHERE license_number = ? AND id IS NOT ?)",
        )
        .bind(license_number)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn count_drivers(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drivers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{car::NewCar, manufacturer::NewManufacturer};
    use crate::services::{
        car_service::{CarOperations, CarService},
        manufacturer_service::{ManufacturerOperations, ManufacturerService},
    };

    async fn pool() -> SqlitePool {
        db::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_driver_with_license_number() {
        let service = DriverService::new(pool().await);
        let driver = service
            .create_driver(NewDriver::new("test_username", "test_123").with_license_number("test_license_number"))
            .await
            .unwrap();

        let fetched = service.get_driver(driver.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "test_username");
        assert_eq!(fetched.license_number, "test_license_number");
        assert_ne!(fetched.password, "test_123");
        assert!(fetched.check_password("test_123"));
        assert!(!fetched.is_staff);
    }

    #[tokio::test]
    async fn test_license_uniqueness_ignores_blank() {
        let service = DriverService::new(pool().await);
        service.create_driver(NewDriver::new("a", "pass_1234")).await.unwrap();
        service.create_driver(NewDriver::new("b", "pass_1234")).await.unwrap();

        let c = service
            .create_driver(NewDriver::new("c", "pass_1234").with_license_number("DRV12345"))
            .await
            .unwrap();
        assert!(service.license_number_taken("DRV12345", None).await.unwrap());
        assert!(!service.license_number_taken("DRV12345", Some(c.id)).await.unwrap());

        let duplicate = service
            .create_driver(NewDriver::new("d", "pass_1234").with_license_number("DRV12345"))
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(ref message)) if message.contains("license_number")));

        let duplicate = service.create_driver(NewDriver::new("a", "pass_1234")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(ref message)) if message.contains("username")));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = DriverService::new(pool().await);
        let driver = service.create_driver(NewDriver::new("driver1", "test123")).await.unwrap();

        assert_eq!(service.authenticate("driver1", "test123").await.unwrap().unwrap().id, driver.id);
        assert!(service.authenticate("driver1", "wrong").await.unwrap().is_none());
        assert!(service.authenticate("nobody", "test123").await.unwrap().is_none());

        let mut update = DriverUpdate::from(&driver);
        update.is_active = false;
        service.update_driver(driver.id, update).await.unwrap();
        assert!(service.authenticate("driver1", "test123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_and_update_license() {
        let service = DriverService::new(pool().await);
        let first = service.create_driver(NewDriver::new("driver1", "test123")).await.unwrap();
        service.create_driver(NewDriver::new("driver2", "test321")).await.unwrap();

        let page = service.list_drivers(Some("driver1"), PageRequest::first(5)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].username, "driver1");

        let updated = service.update_license_number(first.id, "NEW12345").await.unwrap();
        assert_eq!(updated.license_number, "NEW12345");
        assert!(matches!(
            service.update_license_number(999, "NEW12345").await,
            Err(AppError::DriverNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_toggle_car_assignment_twice_restores_state() {
        let pool = pool().await;
        let drivers = DriverService::new(pool.clone());
        let cars = CarService::new(pool.clone());
        let nissan = ManufacturerService::new(pool)
            .create_manufacturer(NewManufacturer::new("Nissan", "Japan"))
            .await
            .unwrap();
        let driver = drivers
            .create_driver(NewDriver::new("test_driver", "driver_12345").with_license_number("DRV12345"))
            .await
            .unwrap();
        let car = cars
            .create_car(NewCar {
                model: "Skyline".to_string(),
                manufacturer_id: nissan.id,
                driver_ids: vec![],
            })
            .await
            .unwrap();

        assert!(drivers.cars_of_driver(driver.id).await.unwrap().is_empty());

        let first = drivers.toggle_car_assignment(driver.id, car.id).await.unwrap();
        assert_eq!(first, Assignment::Assigned);
        assert_eq!(drivers.cars_of_driver(driver.id).await.unwrap(), vec![car.clone()]);

        let second = drivers.toggle_car_assignment(driver.id, car.id).await.unwrap();
        assert_eq!(second, Assignment::Unassigned);
        assert!(drivers.cars_of_driver(driver.id).await.unwrap().is_empty());

        assert!(matches!(
            drivers.toggle_car_assignment(driver.id, 4242).await,
            Err(AppError::CarNotFound(4242))
        ));
    }

    #[tokio::test]
    async fn test_delete_driver_unlinks_cars() {
        let pool = pool().await;
        let drivers = DriverService::new(pool.clone());
        let cars = CarService::new(pool.clone());
        let nissan = ManufacturerService::new(pool)
            .create_manufacturer(NewManufacturer::new("Nissan", "Japan"))
            .await
            .unwrap();
        let driver = drivers.create_driver(NewDriver::new("gone", "pass_1234")).await.unwrap();
        let car = cars
            .create_car(NewCar {
                model: "Civic".to_string(),
                manufacturer_id: nissan.id,
                driver_ids: vec![driver.id],
            })
            .await
            .unwrap();

        drivers.delete_driver(driver.id).await.unwrap();
        assert!(drivers.get_driver(driver.id).await.unwrap().is_none());
        assert!(cars.drivers_of_car(car.id).await.unwrap().is_empty());
        assert!(cars.get_car(car.id).await.unwrap().is_some());
    }
}
