//! Staff back office: which models are exposed, how their change lists
//! look and how their change forms are grouped.

use serde::Serialize;
use std::str::FromStr;

use crate::{
    errors::TaxiError,
    forms::{BoundField, CarForm, DriverAdminForm, FormErrors, ManufacturerForm, Widget},
    models::{
        car::Car,
        driver::Driver,
        manufacturer::Manufacturer,
    },
    urls,
};

/// Change lists show this many rows per page.
pub const LIST_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminModel {
    Car,
    Driver,
    Manufacturer,
}

impl AdminModel {
    pub const ALL: [AdminModel; 3] = [AdminModel::Car, AdminModel::Driver, AdminModel::Manufacturer];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminModel::Car => "car",
            AdminModel::Driver => "driver",
            AdminModel::Manufacturer => "manufacturer",
        }
    }

    pub fn verbose_name_plural(&self) -> &'static str {
        match self {
            AdminModel::Car => "Cars",
            AdminModel::Driver => "Drivers",
            AdminModel::Manufacturer => "Manufacturers",
        }
    }

    pub fn list_display(&self) -> &'static [&'static str] {
        match self {
            AdminModel::Car => &["Model", "Manufacturer"],
            AdminModel::Driver => &[
                "Username",
                "Email address",
                "First name",
                "Last name",
                "Staff status",
                "License number",
            ],
            AdminModel::Manufacturer => &["Manufacturer"],
        }
    }

    /// "1 car", "2 cars"
    pub fn result_label(&self, count: i64) -> String {
        if count == 1 {
            self.as_str().to_string()
        } else {
            self.verbose_name_plural().to_lowercase()
        }
    }
}

impl FromStr for AdminModel {
    type Err = TaxiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdminModel::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| TaxiError::not_found(format!("No admin for model '{}'", s)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminModelLink {
    pub verbose_name_plural: &'static str,
    pub url: String,
}

pub fn model_links() -> Vec<AdminModelLink> {
    AdminModel::ALL
        .into_iter()
        .map(|model| AdminModelLink {
            verbose_name_plural: model.verbose_name_plural(),
            url: urls::admin_changelist(model),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeListRow {
    pub change_url: String,
    pub cells: Vec<String>,
}

fn yes_no(flag: bool) -> String {
    if flag { "True" } else { "False" }.to_string()
}

pub fn driver_row(driver: &Driver) -> ChangeListRow {
    ChangeListRow {
        change_url: urls::admin_change(AdminModel::Driver, driver.id),
        cells: vec![
            driver.username.clone(),
            driver.email.clone(),
            driver.first_name.clone(),
            driver.last_name.clone(),
            yes_no(driver.is_staff),
            driver.license_number.clone(),
        ],
    }
}

pub fn car_row(car: &Car) -> ChangeListRow {
    ChangeListRow {
        change_url: urls::admin_change(AdminModel::Car, car.id),
        cells: vec![car.model.clone(), car.manufacturer.to_string()],
    }
}

pub fn manufacturer_row(manufacturer: &Manufacturer) -> ChangeListRow {
    ChangeListRow {
        change_url: urls::admin_change(AdminModel::Manufacturer, manufacturer.id),
        cells: vec![manufacturer.to_string()],
    }
}

/// One entry of the car change list's "By manufacturer" filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChoice {
    pub label: String,
    pub url: String,
    pub selected: bool,
}

pub fn manufacturer_filter(
    manufacturers: &[Manufacturer],
    selected: Option<i64>,
    search: Option<&str>,
) -> Vec<FilterChoice> {
    let link = |manufacturer_id: Option<i64>| {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(q) = search {
            serializer.append_pair("q", q);
        }
        if let Some(id) = manufacturer_id {
            serializer.append_pair("manufacturer__id__exact", &id.to_string());
        }
        let query = serializer.finish();
        if query.is_empty() { "?".to_string() } else { format!("?{}", query) }
    };

    let mut choices = vec![FilterChoice {
        label: "All".to_string(),
        url: link(None),
        selected: selected.is_none(),
    }];
    choices.extend(manufacturers.iter().map(|manufacturer| FilterChoice {
        label: manufacturer.to_string(),
        url: link(Some(manufacturer.id)),
        selected: selected == Some(manufacturer.id),
    }));
    choices
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminField {
    #[serde(flatten)]
    pub field: BoundField,
    pub readonly: bool,
}

impl From<BoundField> for AdminField {
    fn from(field: BoundField) -> Self {
        Self { field, readonly: false }
    }
}

fn readonly(name: &'static str, label: &'static str, value: impl Into<String>) -> AdminField {
    AdminField {
        field: BoundField::new(name, label, Widget::Text, &FormErrors::new())
            .value(value)
            .optional(),
        readonly: true,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Fieldset {
    pub name: &'static str,
    pub fields: Vec<AdminField>,
}

impl Fieldset {
    fn new(name: &'static str, fields: Vec<AdminField>) -> Self {
        Self { name, fields }
    }
}

/// "algorithm: argon2id" for a PHC string; the hash itself is never shown.
fn password_summary(hash: &str) -> String {
    match hash.split('$').nth(1) {
        Some(algorithm) if !algorithm.is_empty() => format!("algorithm: {}", algorithm),
        _ => "No password set.".to_string(),
    }
}

pub fn driver_fieldsets(driver: &Driver, form: &DriverAdminForm, errors: &FormErrors) -> Vec<Fieldset> {
    let last_login = driver
        .last_login
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    vec![
        Fieldset::new(
            "",
            vec![
                readonly("username", "Username", &driver.username),
                readonly("password", "Password", password_summary(&driver.password)),
            ],
        ),
        Fieldset::new(
            "Personal info",
            vec![
                BoundField::new("first_name", "First name", Widget::Text, errors)
                    .value(&form.first_name)
                    .optional()
                    .into(),
                BoundField::new("last_name", "Last name", Widget::Text, errors)
                    .value(&form.last_name)
                    .optional()
                    .into(),
                BoundField::new("email", "Email address", Widget::Email, errors)
                    .value(&form.email)
                    .optional()
                    .into(),
            ],
        ),
        Fieldset::new(
            "Permissions",
            vec![
                BoundField::new("is_active", "Active", Widget::Checkbox, errors)
                    .checked(form.is_active)
                    .optional()
                    .help("Designates whether this user should be treated as active.")
                    .into(),
                BoundField::new("is_staff", "Staff status", Widget::Checkbox, errors)
                    .checked(form.is_staff)
                    .optional()
                    .help("Designates whether the user can log into this admin site.")
                    .into(),
                BoundField::new("is_superuser", "Superuser status", Widget::Checkbox, errors)
                    .checked(form.is_superuser)
                    .optional()
                    .into(),
            ],
        ),
        Fieldset::new(
            "Important dates",
            vec![
                readonly("last_login", "Last login", last_login),
                readonly(
                    "date_joined",
                    "Date joined",
                    driver.date_joined.format("%Y-%m-%d %H:%M:%S").to_string(),
                ),
            ],
        ),
        Fieldset::new(
            "Additional info",
            vec![
                BoundField::new("license_number", "License number", Widget::Text, errors)
                    .value(&form.license_number)
                    .optional()
                    .into(),
            ],
        ),
    ]
}

pub fn car_fieldsets(
    form: &CarForm,
    errors: &FormErrors,
    manufacturers: &[Manufacturer],
    drivers: &[Driver],
) -> Vec<Fieldset> {
    vec![Fieldset::new(
        "",
        form.fields(errors, manufacturers, drivers)
            .into_iter()
            .map(AdminField::from)
            .collect(),
    )]
}

pub fn manufacturer_fieldsets(form: &ManufacturerForm, errors: &FormErrors) -> Vec<Fieldset> {
    vec![Fieldset::new(
        "",
        form.fields(errors).into_iter().map(AdminField::from).collect(),
    )]
}
