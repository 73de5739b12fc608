// src/services/manufacturer_service.rs
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing;

use crate::{
    db::contains_pattern,
    errors::TaxiError as AppError,
    models::manufacturer::{Manufacturer, NewManufacturer},
    utils::pagination::{Page, PageRequest},
};

#[async_trait]
pub trait ManufacturerOperations: Send + Sync {
    async fn list_manufacturers(&self, name: Option<&str>, page: PageRequest) -> Result<Page<Manufacturer>, AppError>;
    async fn all_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError>;
    async fn get_manufacturer(&self, manufacturer_id: i64) -> Result<Option<Manufacturer>, AppError>;
    async fn create_manufacturer(&self, new_manufacturer: NewManufacturer) -> Result<Manufacturer, AppError>;
    async fn update_manufacturer(&self, manufacturer_id: i64, update: NewManufacturer) -> Result<Manufacturer, AppError>;
    async fn delete_manufacturer(&self, manufacturer_id: i64) -> Result<(), AppError>;
    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;
    async fn count_manufacturers(&self) -> Result<i64, AppError>;
}

pub struct ManufacturerService {
    pool: SqlitePool,
}

impl ManufacturerService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManufacturerOperations for ManufacturerService {
    async fn list_manufacturers(&self, name: Option<&str>, page: PageRequest) -> Result<Page<Manufacturer>, AppError> {
        let pattern = contains_pattern(name.unwrap_or(""));
        tracing::debug!("Listing manufacturers matching {:?}, page {}", name, page.number);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM manufacturers WHERE name LIKE ? ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;
        page.ensure_within(total)?;

        let items = sqlx::query_as::<_, Manufacturer>(
            r"SELECT id, name, country FROM manufacturers
              WHERE name LIKE ? ESCAPE '\'
              ORDER BY name, id
              LIMIT ? OFFSET ?",
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, page, total))
    }

    async fn all_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError> {
        let manufacturers = sqlx::query_as::<_, Manufacturer>(
            "SELECT id, name, country FROM manufacturers ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(manufacturers)
    }

    async fn get_manufacturer(&self, manufacturer_id: i64) -> Result<Option<Manufacturer>, AppError> {
        tracing::debug!("Getting manufacturer: {}", manufacturer_id);
        let manufacturer = sqlx::query_as::<_, Manufacturer>(
            "SELECT id, name, country FROM manufacturers WHERE id = ?",
        )
        .bind(manufacturer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(manufacturer)
    }

    async fn create_manufacturer(&self, new_manufacturer: NewManufacturer) -> Result<Manufacturer, AppError> {
        let manufacturer = sqlx::query_as::<_, Manufacturer>(
            "INSERT INTO manufacturers (name, country) VALUES (?, ?) RETURNING id, name, country",
        )
        .bind(&new_manufacturer.name)
        .bind(&new_manufacturer.country)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Manufacturer created: {} ({})", manufacturer, manufacturer.id);
        Ok(manufacturer)
    }

    async fn update_manufacturer(&self, manufacturer_id: i64, update: NewManufacturer) -> Result<Manufacturer, AppError> {
        let manufacturer = sqlx::query_as::<_, Manufacturer>(
            "UPDATE manufacturers SET name = ?, country = ? WHERE id = ? RETURNING id, name, country",
        )
        .bind(&update.name)
        .bind(&update.country)
        .bind(manufacturer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ManufacturerNotFound(manufacturer_id))?;

        tracing::info!("Manufacturer updated: {}", manufacturer_id);
        Ok(manufacturer)
    }

    async fn delete_manufacturer(&self, manufacturer_id: i64) -> Result<(), AppError> {
        // cars of this manufacturer go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM manufacturers WHERE id = ?")
            .bind(manufacturer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ManufacturerNotFound(manufacturer_id));
        }
        tracing::info!("Manufacturer deleted: {}", manufacturer_id);
        Ok(())
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM manufacturers WHERE name = ? AND id IS NOT ?)",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn count_manufacturers(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM manufacturers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn service() -> ManufacturerService {
        ManufacturerService::new(db::connect("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let service = service().await;
        let nissan = service
            .create_manufacturer(NewManufacturer::new("Nissan", "Japan"))
            .await
            .unwrap();
        assert_eq!(nissan.to_string(), "Nissan Japan");

        let fetched = service.get_manufacturer(nissan.id).await.unwrap().unwrap();
        assert_eq!(fetched, nissan);

        let updated = service
            .update_manufacturer(nissan.id, NewManufacturer::new("Updated Nissan", "Updated Japan"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Updated Nissan");

        service.delete_manufacturer(nissan.id).await.unwrap();
        assert!(service.get_manufacturer(nissan.id).await.unwrap().is_none());
        assert!(matches!(
            service.delete_manufacturer(nissan.id).await,
            Err(AppError::ManufacturerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let service = service().await;
        for (name, country) in [("Nissan", "Japan"), ("Honda", "Japan"), ("Bogdan", "Ukraine")] {
            service
                .create_manufacturer(NewManufacturer::new(name, country))
                .await
                .unwrap();
        }

        let page = service
            .list_manufacturers(Some("an"), PageRequest::first(5))
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bogdan", "Nissan"]);

        let page = service
            .list_manufacturers(Some("HON"), PageRequest::first(5))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);

        let page = service
            .list_manufacturers(Some("%"), PageRequest::first(5))
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_pagination_bounds() {
        let service = service().await;
        for i in 0..6 {
            service
                .create_manufacturer(NewManufacturer::new(format!("Maker {}", i), "Nowhere"))
                .await
                .unwrap();
        }

        let second = service
            .list_manufacturers(None, PageRequest::new(2, 5))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.total, 6);
        assert!(second.has_previous);

        let err = service
            .list_manufacturers(None, PageRequest::new(3, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_name_taken() {
        let service = service().await;
        let nissan = service
            .create_manufacturer(NewManufacturer::new("Nissan", "Japan"))
            .await
            .unwrap();

        assert!(service.name_taken("Nissan", None).await.unwrap());
        assert!(!service.name_taken("Nissan", Some(nissan.id)).await.unwrap());
        assert!(!service.name_taken("Toyota", None).await.unwrap());
        assert!(matches!(
            service.create_manufacturer(NewManufacturer::new("Nissan", "Japan")).await,
            Err(AppError::Conflict(_))
        ));
    }
}
