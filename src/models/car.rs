// src/models/car.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use super::manufacturer::Manufacturer;

/// A car together with the manufacturer it belongs to.
///
/// Drivers are loaded separately through `CarOperations::drivers_of_car`
/// since most screens only need the car row itself.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Car {
    pub id: i64,
    pub model: String,
    pub manufacturer: Manufacturer,
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewCar {
    pub model: String,
    pub manufacturer_id: i64,
    pub driver_ids: Vec<i64>,
}

/// Filters accepted by the car listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarFilter {
    pub model: Option<String>,
    pub manufacturer_id: Option<i64>,
}

impl CarFilter {
    pub fn by_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }
}

/// Outcome of toggling a driver's assignment to a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment {
    Assigned,
    Unassigned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_display_is_model() {
        let car = Car {
            id: 7,
            model: "test_model".to_string(),
            manufacturer: Manufacturer {
                id: 1,
                name: "Nissan".to_string(),
                country: "Japan".to_string(),
            },
        };
        assert_eq!(car.to_string(), "test_model");
    }

    #[test]
    fn test_car_filter_by_model() {
        let filter = CarFilter::by_model("Sky");
        assert_eq!(filter.model.as_deref(), Some("Sky"));
        assert_eq!(filter.manufacturer_id, None);
    }
}
