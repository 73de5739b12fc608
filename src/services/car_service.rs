// src/services/car_service.rs
use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing;

use crate::{
    db::contains_pattern,
    errors::TaxiError as AppError,
    models::{
        car::{Car, CarFilter, NewCar},
        driver::Driver,
        manufacturer::Manufacturer,
    },
    utils::pagination::{Page, PageRequest},
};

const CAR_COLUMNS: &str = "c.id, c.model, m.id AS manufacturer_id, m.name AS manufacturer_name, \
                           m.country AS manufacturer_country \
                           FROM cars c JOIN manufacturers m ON m.id = c.manufacturer_id";

#[async_trait]
pub trait CarOperations: Send + Sync {
    async fn list_cars(&self, filter: &CarFilter, page: PageRequest) -> Result<Page<Car>, AppError>;
    async fn get_car(&self, car_id: i64) -> Result<Option<Car>, AppError>;
    async fn create_car(&self, new_car: NewCar) -> Result<Car, AppError>;
    async fn update_car(&self, car_id: i64, update: NewCar) -> Result<Car, AppError>;
    async fn delete_car(&self, car_id: i64) -> Result<(), AppError>;
    async fn drivers_of_car(&self, car_id: i64) -> Result<Vec<Driver>, AppError>;
    async fn count_cars(&self) -> Result<i64, AppError>;
}

pub struct CarService {
    pool: SqlitePool,
}

impl CarService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn row_to_car(row: &SqliteRow) -> Result<Car, AppError> {
    Ok(Car {
        id: row.try_get("id")?,
        model: row.try_get("model")?,
        manufacturer: Manufacturer {
            id: row.try_get("manufacturer_id")?,
            name: row.try_get("manufacturer_name")?,
            country: row.try_get("manufacturer_country")?,
        },
    })
}

pub(crate) fn select_cars(tail: &str) -> String {
    format!("SELECT {} {}", CAR_COLUMNS, tail)
}

#[async_trait]
impl CarOperations for CarService {
    async fn list_cars(&self, filter: &CarFilter, page: PageRequest) -> Result<Page<Car>, AppError> {
        let pattern = contains_pattern(filter.model.as_deref().unwrap_or(""));
        tracing::debug!("Listing cars matching {:?}, page {}", filter, page.number);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM cars
              WHERE model LIKE ? ESCAPE '\' AND (? IS NULL OR manufacturer_id = ?)",
        )
        .bind(&pattern)
        .bind(filter.manufacturer_id)
        .bind(filter.manufacturer_id)
        .fetch_one(&self.pool)
        .await?;
        page.ensure_within(total)?;

        let rows = sqlx::query(&select_cars(
            r"WHERE c.model LIKE ? ESCAPE '\' AND (? IS NULL OR c.manufacturer_id = ?)
              ORDER BY c.id
              LIMIT ? OFFSET ?",
        ))
        .bind(&pattern)
        .bind(filter.manufacturer_id)
        .bind(filter.manufacturer_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(row_to_car).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total))
    }

    async fn get_car(&self, car_id: i64) -> Result<Option<Car>, AppError> {
        tracing::debug!("Getting car: {}", car_id);
        let row = sqlx::query(&select_cars("WHERE c.id = ?"))
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_car).transpose()
    }

    async fn create_car(&self, new_car: NewCar) -> Result<Car, AppError> {
        let mut tx = self.pool.begin().await?;

        let car_id: i64 = sqlx::query_scalar(
            "INSERT INTO cars (model, manufacturer_id) VALUES (?, ?) RETURNING id",
        )
        .bind(&new_car.model)
        .bind(new_car.manufacturer_id)
        .fetch_one(&mut *tx)
        .await?;

        for driver_id in &new_car.driver_ids {
            sqlx::query("INSERT OR IGNORE INTO car_drivers (car_id, driver_id) VALUES (?, ?)")
                .bind(car_id)
                .bind(driver_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Car created: {} ({})", new_car.model, car_id);
        self.get_car(car_id).await?.ok_or(AppError::CarNotFound(car_id))
    }

    async fn update_car(&self, car_id: i64, update: NewCar) -> Result<Car, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE cars SET model = ?, manufacturer_id = ? WHERE id = ?")
            .bind(&update.model)
            .bind(update.manufacturer_id)
            .bind(car_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::CarNotFound(car_id));
        }

        // the edit form owns the full driver set of this one car
        sqlx::query("DELETE FROM car_drivers WHERE car_id = ?")
            .bind(car_id)
            .execute(&mut *tx)
            .await?;
        for driver_id in &update.driver_ids {
            sqlx::query("INSERT OR IGNORE INTO car_drivers (car_id, driver_id) VALUES (?, ?)")
                .bind(car_id)
                .bind(driver_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Car updated: {}", car_id);
        self.get_car(car_id).await?.ok_or(AppError::CarNotFound(car_id))
    }

    async fn delete_car(&self, car_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(car_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CarNotFound(car_id));
        }
        tracing::info!("Car deleted: {}", car_id);
        Ok(())
    }

    async fn drivers_of_car(&self, car_id: i64) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT d.* FROM drivers d
             JOIN car_drivers cd ON cd.driver_id = d.id
             WHERE cd.car_id = ?
             ORDER BY d.username",
        )
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    async fn count_cars(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
