use super::{BoundField, Form, FormData, FormErrors, Widget, required_text};
use crate::models::manufacturer::{Manufacturer, NewManufacturer};

pub const NAME_TAKEN: &str = "Manufacturer with this Name already exists.";

#[derive(Debug, Clone, Default)]
pub struct ManufacturerForm {
    pub name: String,
    pub country: String,
}

impl ManufacturerForm {
    pub fn from_instance(manufacturer: &Manufacturer) -> Self {
        Self {
            name: manufacturer.name.clone(),
            country: manufacturer.country.clone(),
        }
    }

    pub fn fields(&self, errors: &FormErrors) -> Vec<BoundField> {
        vec![
            BoundField::new("name", "Name", Widget::Text, errors).value(&self.name),
            BoundField::new("country", "Country", Widget::Text, errors).value(&self.country),
        ]
    }
}

impl Form for ManufacturerForm {
    type Cleaned = NewManufacturer;

    fn bind(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            country: data.text("country"),
        }
    }

    fn clean(&self) -> Result<NewManufacturer, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required_text(&self.name, "name", 255, &mut errors);
        let country = required_text(&self.country, "country", 255, &mut errors);
        errors.into_result(NewManufacturer { name, country })
    }
}
