//! The single-input search boxes above the public lists. They never fail:
//! a blank box means "no filter".

use super::{BoundField, Form, FormData, FormErrors, Widget};

fn clean_term(raw: &str) -> Option<String> {
    let term = raw.trim();
    if term.is_empty() { None } else { Some(term.to_string()) }
}

macro_rules! search_form {
    ($name:ident, $field:literal, $placeholder:literal) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub term: String,
        }

        impl $name {
            pub const FIELD: &'static str = $field;
            pub const PLACEHOLDER: &'static str = $placeholder;

            pub fn field(&self) -> BoundField {
                BoundField::new($field, $placeholder, Widget::Text, &FormErrors::new())
                    .value(self.term.trim())
                    .optional()
            }
        }

        impl Form for $name {
            type Cleaned = Option<String>;

            fn bind(data: &FormData) -> Self {
                Self {
                    term: data.text($field),
                }
            }

            fn clean(&self) -> Result<Option<String>, FormErrors> {
                Ok(clean_term(&self.term))
            }
        }
    };
}

search_form!(ManufacturerSearchForm, "name", "Search by name");
search_form!(CarSearchForm, "model", "Search by model");
search_form!(DriverSearchForm, "username", "Search by username");
