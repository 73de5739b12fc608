//! Bound forms: raw submitted values in, cleaned values or per-field errors
//! out, plus the field descriptions templates render.
//!
//! Checks that need the database (uniqueness, existence of referenced rows)
//! are made by the handlers after `clean` succeeds, and reported back through
//! the same `FormErrors`.

pub mod car;
pub mod driver;
pub mod manufacturer;
pub mod search;

pub use car::CarForm;
pub use driver::{DriverAdminForm, DriverCreationForm, DriverLicenseUpdateForm, LoginForm};
pub use manufacturer::ManufacturerForm;
pub use search::{CarSearchForm, DriverSearchForm, ManufacturerSearchForm};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::{TaxiError, ValidationError};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

pub trait Form: Sized {
    type Cleaned;

    fn bind(data: &FormData) -> Self;

    fn clean(&self) -> Result<Self::Cleaned, FormErrors>;

    fn is_valid(&self) -> bool {
        self.clean().is_ok()
    }
}

/// Submitted key/value pairs in arrival order. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }

    /// Last value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// HTML checkboxes are only submitted when ticked.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("on" | "true" | "1"))
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field(&self, field: &str) -> Vec<String> {
        self.fields.get(field).cloned().unwrap_or_default()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<FormErrors> for TaxiError {
    fn from(errors: FormErrors) -> Self {
        let mut list: Vec<ValidationError> = errors
            .fields
            .into_iter()
            .flat_map(|(field, messages)| {
                messages.into_iter().map(move |message| ValidationError {
                    field: field.clone(),
                    message,
                })
            })
            .collect();
        list.extend(errors.non_field.into_iter().map(|message| ValidationError {
            field: "__all__".to_string(),
            message,
        }));
        TaxiError::ValidationFailed(list)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Text,
    Password,
    Email,
    Checkbox,
    Select,
    SelectMultiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One form field as the templates see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub help_text: &'static str,
    pub choices: Vec<Choice>,
    pub errors: Vec<String>,
}

impl BoundField {
    pub fn new(name: &'static str, label: &'static str, widget: Widget, errors: &FormErrors) -> Self {
        Self {
            name,
            label,
            widget,
            value: String::new(),
            checked: false,
            required: true,
            help_text: "",
            choices: Vec::new(),
            errors: errors.field(name),
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn help(mut self, help_text: &'static str) -> Self {
        self.help_text = help_text;
        self
    }

    pub fn choices<I>(mut self, options: I, selected: &[String]) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.choices = options
            .into_iter()
            .map(|(value, label)| Choice {
                selected: selected.contains(&value),
                value,
                label,
            })
            .collect();
        self
    }
}

// Field-level checks shared by the forms.

pub(crate) fn required_text(data: &str, field: &str, max_length: usize, errors: &mut FormErrors) -> String {
    let value = data.trim().to_string();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else {
        check_max_length(&value, field, max_length, errors);
    }
    value
}

pub(crate) fn check_max_length(value: &str, field: &str, max_length: usize, errors: &mut FormErrors) {
    let length = value.chars().count();
    if length > max_length {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max_length, length
            ),
        );
    }
}

pub(crate) fn parse_id(raw: &str, field: &str, errors: &mut FormErrors) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}
