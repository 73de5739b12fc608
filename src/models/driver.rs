// src/models/driver.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::password::{Argon2Hasher, PasswordHasher};

/// A driver is the user account of the service: everyone who logs in,
/// staff included, is a driver.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Driver {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String, // argon2 PHC string
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Returns true when `raw_password` matches the stored hash.
    /// A malformed hash never matches.
    pub fn check_password(&self, raw_password: &str) -> bool {
        match Argon2Hasher::new().verify(raw_password, &self.password) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Unusable password hash for driver {}: {}", self.id, e);
                false
            }
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Driver registration, with the password still in plaintext.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewDriver {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewDriver {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn superuser(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            is_superuser: true,
            ..Self::new(username, password)
        }
    }

    pub fn with_license_number(mut self, license_number: impl Into<String>) -> Self {
        self.license_number = license_number.into();
        self
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }
}

/// Fields the admin change screen may edit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DriverUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&Driver> for DriverUpdate {
    fn from(driver: &Driver) -> Self {
        Self {
            first_name: driver.first_name.clone(),
            last_name: driver.last_name.clone(),
            email: driver.email.clone(),
            license_number: driver.license_number.clone(),
            is_active: driver.is_active,
            is_staff: driver.is_staff,
            is_superuser: driver.is_superuser,
        }
    }
}
