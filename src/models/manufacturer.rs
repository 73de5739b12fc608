// src/models/manufacturer.rs
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub country: String,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

/// Fields accepted when creating or editing a manufacturer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewManufacturer {
    pub name: String,
    pub country: String,
}

impl NewManufacturer {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}
