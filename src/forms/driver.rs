use serde::Serialize;

use super::{BoundField, Form, FormData, FormErrors, REQUIRED, Widget, check_max_length};
use crate::models::driver::{Driver, DriverUpdate, NewDriver};

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const LICENSE_TAKEN: &str = "Driver with this License number already exists.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn\u{2019}t match.";
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

const LICENSE_LENGTH: usize = 8;
const MIN_PASSWORD_LENGTH: usize = 8;

/// Licenses look like `ABC12345`: three uppercase letters, five digits.
pub fn validate_license_number(license_number: &str) -> Result<(), String> {
    if license_number.chars().count() != LICENSE_LENGTH {
        return Err(format!(
            "License number should consist of {} characters",
            LICENSE_LENGTH
        ));
    }
    let mut chars = license_number.chars();
    if !chars.by_ref().take(3).all(|c| c.is_ascii_uppercase()) {
        return Err("First 3 characters should be uppercase letters".to_string());
    }
    if !chars.all(|c| c.is_ascii_digit()) {
        return Err("Last 5 characters should be digits".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
            .to_string())
    }
}

pub fn validate_password(password: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    problems
}

/// Form errors for a unique-constraint failure reported by the database,
/// e.g. `UNIQUE constraint failed: drivers.license_number`.
pub fn unique_violation_errors(message: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if message.contains("license_number") {
        errors.add("license_number", LICENSE_TAKEN);
    } else {
        errors.add("username", USERNAME_TAKEN);
    }
    errors
}

fn clean_license(raw: &str, errors: &mut FormErrors) -> String {
    let license_number = raw.trim().to_string();
    if license_number.is_empty() {
        errors.add("license_number", REQUIRED);
    } else if let Err(message) = validate_license_number(&license_number) {
        errors.add("license_number", message);
    }
    license_number
}

/// Cleaned values of a valid `DriverCreationForm`; same names as the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverCreationData {
    pub username: String,
    pub password1: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl From<DriverCreationData> for NewDriver {
    fn from(data: DriverCreationData) -> Self {
        NewDriver::new(data.username, data.password1)
            .with_name(data.first_name, data.last_name)
            .with_license_number(data.license_number)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverCreationForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl DriverCreationForm {
    /// Passwords are never echoed back into the re-rendered form.
    pub fn fields(&self, errors: &FormErrors) -> Vec<BoundField> {
        vec![
            BoundField::new("username", "Username", Widget::Text, errors)
                .value(&self.username)
                .help("Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only."),
            BoundField::new("password1", "Password", Widget::Password, errors),
            BoundField::new("password2", "Password confirmation", Widget::Password, errors)
                .help("Enter the same password as before, for verification."),
            BoundField::new("first_name", "First name", Widget::Text, errors)
                .value(&self.first_name)
                .optional(),
            BoundField::new("last_name", "Last name", Widget::Text, errors)
                .value(&self.last_name)
                .optional(),
            BoundField::new("license_number", "License number", Widget::Text, errors)
                .value(&self.license_number),
        ]
    }
}

impl Form for DriverCreationForm {
    type Cleaned = DriverCreationData;

    fn bind(data: &FormData) -> Self {
        Self {
            username: data.text("username"),
            password1: data.text("password1"),
            password2: data.text("password2"),
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            license_number: data.text("license_number"),
        }
    }

    fn clean(&self) -> Result<DriverCreationData, FormErrors> {
        let mut errors = FormErrors::new();

        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else {
            check_max_length(&username, "username", 150, &mut errors);
            if let Err(message) = validate_username(&username) {
                errors.add("username", message);
            }
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if !self.password1.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", PASSWORD_MISMATCH);
            } else {
                for problem in validate_password(&self.password2) {
                    errors.add("password2", problem);
                }
            }
        }

        let first_name = self.first_name.trim().to_string();
        check_max_length(&first_name, "first_name", 150, &mut errors);
        let last_name = self.last_name.trim().to_string();
        check_max_length(&last_name, "last_name", 150, &mut errors);

        let license_number = clean_license(&self.license_number, &mut errors);

        errors.into_result(DriverCreationData {
            username,
            password1: self.password1.clone(),
            password2: self.password2.clone(),
            first_name,
            last_name,
            license_number,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverLicenseUpdateForm {
    pub license_number: String,
}

impl DriverLicenseUpdateForm {
    pub fn from_instance(driver: &Driver) -> Self {
        Self {
            license_number: driver.license_number.clone(),
        }
    }

    pub fn fields(&self, errors: &FormErrors) -> Vec<BoundField> {
        vec![BoundField::new("license_number", "License number", Widget::Text, errors).value(&self.license_number)]
    }
}

impl Form for DriverLicenseUpdateForm {
    type Cleaned = String;

    fn bind(data: &FormData) -> Self {
        Self {
            license_number: data.text("license_number"),
        }
    }

    fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let license_number = clean_license(&self.license_number, &mut errors);
        errors.into_result(license_number)
    }
}

/// The admin change screen for drivers. Unlike the public forms the license
/// may stay blank here, so staff accounts need not hold one.
#[derive(Debug, Clone, Default)]
pub struct DriverAdminForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl DriverAdminForm {
    pub fn from_instance(driver: &Driver) -> Self {
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

impl Form for DriverAdminForm {
    type Cleaned = DriverUpdate;

    fn bind(data: &FormData) -> Self {
        Self {
            first_name: data.text("first_name"),
            last_name: data.text("last_name"),
            email: data.text("email"),
            license_number: data.text("license_number"),
            is_active: data.flag("is_active"),
            is_staff: data.flag("is_staff"),
            is_superuser: data.flag("is_superuser"),
        }
    }

    fn clean(&self) -> Result<DriverUpdate, FormErrors> {
        let mut errors = FormErrors::new();
        let first_name = self.first_name.trim().to_string();
        check_max_length(&first_name, "first_name", 150, &mut errors);
        let last_name = self.last_name.trim().to_string();
        check_max_length(&last_name, "last_name", 150, &mut errors);

        let email = self.email.trim().to_string();
        if !email.is_empty() && !looks_like_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        let license_number = self.license_number.trim().to_string();
        if !license_number.is_empty() {
            if let Err(message) = validate_license_number(&license_number) {
                errors.add("license_number", message);
            }
        }

        errors.into_result(DriverUpdate {
            first_name,
            last_name,
            email,
            license_number,
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

impl LoginForm {
    pub fn fields(&self, errors: &FormErrors) -> Vec<BoundField> {
        vec![
            BoundField::new("username", "Username", Widget::Text, errors).value(&self.username),
            BoundField::new("password", "Password", Widget::Password, errors),
        ]
    }
}

impl Form for LoginForm {
    type Cleaned = (String, String);

    fn bind(data: &FormData) -> Self {
        Self {
            username: data.text("username"),
            password: data.text("password"),
            next: data.text("next"),
        }
    }

    fn clean(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result((username, self.password.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creation_data() -> Vec<(&'static str, &'static str)> {
        vec![
            ("username", "new_user"),
            ("password1", "user12test"),
            ("password2", "user12test"),
            ("first_name", "First"),
            ("last_name", "Last"),
            ("license_number", "TST12345"),
        ]
    }

    #[test]
    fn test_driver_creation_form_with_all_data_is_valid() {
        let form = DriverCreationForm::bind(&FormData::from_pairs(&creation_data()));
        assert!(form.is_valid());
        assert_eq!(
            form.clean().unwrap(),
            DriverCreationData {
                username: "new_user".to_string(),
                password1: "user12test".to_string(),
                password2: "user12test".to_string(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                license_number: "TST12345".to_string(),
            }
        );
    }

    #[test]
    fn test_names_are_optional() {
        let data: Vec<_> = creation_data()
            .into_iter()
            .filter(|(k, _)| !k.ends_with("_name"))
            .collect();
        let cleaned = DriverCreationForm::bind(&FormData::from_pairs(&data)).clean().unwrap();
        assert_eq!(cleaned.first_name, "");
        let new_driver = NewDriver::from(cleaned);
        assert_eq!(new_driver.password, "user12test");
        assert_eq!(new_driver.license_number, "TST12345");
    }

    #[test]
    fn test_password_mismatch() {
        let mut form = DriverCreationForm::bind(&FormData::from_pairs(&creation_data()));
        form.password2 = "different1".to_string();
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("password2"), vec![PASSWORD_MISMATCH.to_string()]);
    }

    #[test]
    fn test_weak_password() {
        let mut form = DriverCreationForm::bind(&FormData::from_pairs(&creation_data()));
        form.password1 = "1234".to_string();
        form.password2 = "1234".to_string();
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("password2").len(), 2);
    }

    #[test]
    fn test_license_is_required() {
        let data: Vec<_> = creation_data()
            .into_iter()
            .filter(|(k, _)| *k != "license_number")
            .collect();
        let errors = DriverCreationForm::bind(&FormData::from_pairs(&data)).clean().unwrap_err();
        assert_eq!(errors.field("license_number"), vec![REQUIRED.to_string()]);
    }

    #[test]
    fn test_invalid_username() {
        let mut form = DriverCreationForm::bind(&FormData::from_pairs(&creation_data()));
        form.username = "bad name!".to_string();
        assert!(form.clean().unwrap_err().has("username"));
    }

    #[test]
    fn test_valid_license_number_update() {
        let form = DriverLicenseUpdateForm::bind(&FormData::from_pairs(&[("license_number", "TST12345")]));
        assert!(form.is_valid());
        assert_eq!(form.clean().unwrap(), "TST12345");
    }

    #[test]
    fn test_license_number_format() {
        assert!(validate_license_number("DRV12345").is_ok());
        assert_eq!(
            validate_license_number("DRV1234").unwrap_err(),
            "License number should consist of 8 characters"
        );
        assert_eq!(
            validate_license_number("drv12345").unwrap_err(),
            "First 3 characters should be uppercase letters"
        );
        assert_eq!(
            validate_license_number("DRV1234A").unwrap_err(),
            "Last 5 characters should be digits"
        );
        assert!(validate_license_number("ÄBC12345").is_err());
    }

    #[test]
    fn test_unique_violation_errors() {
        let errors = unique_violation_errors("UNIQUE constraint failed: drivers.license_number");
        assert_eq!(errors.field("license_number"), vec![LICENSE_TAKEN.to_string()]);
        assert!(!errors.has("username"));

        let errors = unique_violation_errors("UNIQUE constraint failed: drivers.username");
        assert_eq!(errors.field("username"), vec![USERNAME_TAKEN.to_string()]);
    }

    #[test]
    fn test_license_number_with_multibyte_chars() {
        assert_eq!(
            validate_license_number("éé123456").unwrap_err(),
            "First 3 characters should be uppercase letters"
        );
        assert_eq!(
            validate_license_number("ABC1234é").unwrap_err(),
            "Last 5 characters should be digits"
        );
    }

    #[test]
    fn test_admin_form_flags_and_blank_license() {
        let form = DriverAdminForm::bind(&FormData::from_pairs(&[
            ("first_name", "Ann"),
            ("email", "ann@example.com"),
            ("is_active", "on"),
        ]));
        let update = form.clean().unwrap();
        assert!(update.is_active);
        assert!(!update.is_staff);
        assert_eq!(update.license_number, "");

        let form = DriverAdminForm::bind(&FormData::from_pairs(&[("email", "nope"), ("license_number", "x")]));
        let errors = form.clean().unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("license_number"));
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let errors = LoginForm::bind(&FormData::from_pairs(&[("username", "x")])).clean().unwrap_err();
        assert!(errors.has("password"));
        assert!(!errors.has("username"));
    }
}
