use super::{BoundField, Form, FormData, FormErrors, INVALID_CHOICE, REQUIRED, Widget, parse_id, required_text};
use crate::models::{
    car::{Car, NewCar},
    driver::Driver,
    manufacturer::Manufacturer,
};

#[derive(Debug, Clone, Default)]
pub struct CarForm {
    pub model: String,
    pub manufacturer: String,
    pub drivers: Vec<String>,
}

impl CarForm {
    pub fn from_instance(car: &Car, drivers: &[Driver]) -> Self {
        Self {
            model: car.model.clone(),
            manufacturer: car.manufacturer.id.to_string(),
            drivers: drivers.iter().map(|d| d.id.to_string()).collect(),
        }
    }

    pub fn fields(&self, errors: &FormErrors, manufacturers: &[Manufacturer], drivers: &[Driver]) -> Vec<BoundField> {
        vec![
            BoundField::new("model", "Model", Widget::Text, errors).value(&self.model),
            BoundField::new("manufacturer", "Manufacturer", Widget::Select, errors).choices(
                manufacturers.iter().map(|m| (m.id.to_string(), m.to_string())),
                std::slice::from_ref(&self.manufacturer),
            ),
            BoundField::new("drivers", "Drivers", Widget::SelectMultiple, errors).choices(
                drivers.iter().map(|d| (d.id.to_string(), driver_label(d))),
                &self.drivers,
            ),
        ]
    }
}

fn driver_label(driver: &Driver) -> String {
    let full_name = driver.full_name();
    if full_name.is_empty() {
        driver.username.clone()
    } else {
        format!("{} ({})", driver.username, full_name)
    }
}

impl Form for CarForm {
    type Cleaned = NewCar;

    fn bind(data: &FormData) -> Self {
        Self {
            model: data.text("model"),
            manufacturer: data.text("manufacturer"),
            drivers: data
                .get_all("drivers")
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    fn clean(&self) -> Result<NewCar, FormErrors> {
        let mut errors = FormErrors::new();
        let model = required_text(&self.model, "model", 255, &mut errors);
        let manufacturer_id = parse_id(&self.manufacturer, "manufacturer", &mut errors);

        let mut driver_ids = Vec::with_capacity(self.drivers.len());
        for raw in self.drivers.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            match raw.parse::<i64>() {
                Ok(id) if !driver_ids.contains(&id) => driver_ids.push(id),
                Ok(_) => {}
                Err(_) => {
                    errors.add("drivers", format!("\u{201c}{}\u{201d} is not a valid value.", raw));
                }
            }
        }
        if driver_ids.is_empty() && !errors.has("drivers") {
            errors.add("drivers", REQUIRED);
        }

        match manufacturer_id {
            Some(manufacturer_id) if errors.is_empty() => Ok(NewCar {
                model,
                manufacturer_id,
                driver_ids,
            }),
            _ => Err(errors),
        }
    }
}

/// Reports ids the database did not know about.
pub fn check_references(
    cleaned: &NewCar,
    manufacturer_exists: bool,
    known_driver_ids: &[i64],
) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();
    if !manufacturer_exists {
        errors.add("manufacturer", INVALID_CHOICE);
    }
    for id in cleaned.driver_ids.iter().filter(|id| !known_driver_ids.contains(id)) {
        errors.add(
            "drivers",
            format!("Select a valid choice. {} is not one of the available choices.", id),
        );
    }
    errors.into_result(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_form_valid_data() {
        let form = CarForm::bind(&FormData::from_pairs(&[
            ("model", "Skyline"),
            ("manufacturer", "1"),
            ("drivers", "1"),
            ("drivers", "2"),
        ]));
        assert!(form.is_valid());
        assert_eq!(
            form.clean().unwrap(),
            NewCar {
                model: "Skyline".to_string(),
                manufacturer_id: 1,
                driver_ids: vec![1, 2],
            }
        );
    }

    #[test]
    fn test_car_form_requires_manufacturer_and_drivers() {
        let form = CarForm::bind(&FormData::from_pairs(&[("model", "Skyline")]));
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("manufacturer"), vec![REQUIRED.to_string()]);
        assert_eq!(errors.field("drivers"), vec![REQUIRED.to_string()]);
    }

    #[test]
    fn test_car_form_rejects_garbage_ids() {
        let form = CarForm::bind(&FormData::from_pairs(&[
            ("model", "Skyline"),
            ("manufacturer", "nissan"),
            ("drivers", "x"),
        ]));
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("manufacturer"), vec![INVALID_CHOICE.to_string()]);
        assert_eq!(errors.field("drivers").len(), 1);
    }

    #[test]
    fn test_duplicate_driver_ids_collapse() {
        let form = CarForm::bind(&FormData::from_pairs(&[
            ("model", "Civic"),
            ("manufacturer", "3"),
            ("drivers", "4"),
            ("drivers", "4"),
        ]));
        assert_eq!(form.clean().unwrap().driver_ids, vec![4]);
    }

    #[test]
    fn test_check_references() {
        let cleaned = NewCar {
            model: "Civic".to_string(),
            manufacturer_id: 3,
            driver_ids: vec![4, 5],
        };
        assert!(check_references(&cleaned, true, &[4, 5]).is_ok());

        let errors = check_references(&cleaned, false, &[4]).unwrap_err();
        assert!(errors.has("manufacturer"));
        assert_eq!(errors.field("drivers").len(), 1);
    }
}
