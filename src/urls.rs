//! Paths of the named routes, so handlers never hand-format them.

use serde::Serialize;

use crate::{
    admin::AdminModel,
    models::{car::Car, driver::Driver, manufacturer::Manufacturer},
};

pub const INDEX: &str = "/";
pub const LOGIN: &str = "/accounts/login/";
pub const LOGOUT: &str = "/accounts/logout/";
pub const MANUFACTURER_LIST: &str = "/manufacturers/";
pub const MANUFACTURER_CREATE: &str = "/manufacturers/create/";
pub const CAR_LIST: &str = "/cars/";
pub const CAR_CREATE: &str = "/cars/create/";
pub const DRIVER_LIST: &str = "/drivers/";
pub const DRIVER_CREATE: &str = "/drivers/create/";
pub const ADMIN_INDEX: &str = "/admin/";

/// The fixed paths, exposed to every template as `urls`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StaticUrls {
    pub index: &'static str,
    pub login: &'static str,
    pub logout: &'static str,
    pub manufacturer_list: &'static str,
    pub manufacturer_create: &'static str,
    pub car_list: &'static str,
    pub car_create: &'static str,
    pub driver_list: &'static str,
    pub driver_create: &'static str,
    pub admin_index: &'static str,
}

pub const STATIC_URLS: StaticUrls = StaticUrls {
    index: INDEX,
    login: LOGIN,
    logout: LOGOUT,
    manufacturer_list: MANUFACTURER_LIST,
    manufacturer_create: MANUFACTURER_CREATE,
    car_list: CAR_LIST,
    car_create: CAR_CREATE,
    driver_list: DRIVER_LIST,
    driver_create: DRIVER_CREATE,
    admin_index: ADMIN_INDEX,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub update: String,
    pub delete: String,
}

/// Objects that own a set of pages.
pub trait Reverse {
    fn urls(&self) -> ObjectUrls;
}

impl Reverse for Manufacturer {
    fn urls(&self) -> ObjectUrls {
        ObjectUrls {
            detail: None,
            update: manufacturer_update(self.id),
            delete: manufacturer_delete(self.id),
        }
    }
}

impl Reverse for Car {
    fn urls(&self) -> ObjectUrls {
        ObjectUrls {
            detail: Some(car_detail(self.id)),
            update: car_update(self.id),
            delete: car_delete(self.id),
        }
    }
}

impl Reverse for Driver {
    fn urls(&self) -> ObjectUrls {
        ObjectUrls {
            detail: Some(driver_detail(self.id)),
            update: driver_update(self.id),
            delete: driver_delete(self.id),
        }
    }
}

/// An object serialized together with its `urls`.
#[derive(Debug, Clone, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub object: T,
    pub urls: ObjectUrls,
}

pub fn linked<T: Reverse>(object: T) -> Linked<T> {
    let urls = object.urls();
    Linked { object, urls }
}

pub fn linked_all<T: Reverse>(objects: Vec<T>) -> Vec<Linked<T>> {
    objects.into_iter().map(linked).collect()
}

pub fn manufacturer_update(id: i64) -> String {
    format!("/manufacturers/{}/update/", id)
}

pub fn manufacturer_delete(id: i64) -> String {
    format!("/manufacturers/{}/delete/", id)
}

pub fn car_detail(id: i64) -> String {
    format!("/cars/{}/", id)
}

pub fn car_update(id: i64) -> String {
    format!("/cars/{}/update/", id)
}

pub fn car_delete(id: i64) -> String {
    format!("/cars/{}/delete/", id)
}

pub fn toggle_car_assign(id: i64) -> String {
    format!("/cars/{}/toggle-assign/", id)
}

pub fn driver_detail(id: i64) -> String {
    format!("/drivers/{}/", id)
}

pub fn driver_update(id: i64) -> String {
    format!("/drivers/{}/update/", id)
}

pub fn driver_delete(id: i64) -> String {
    format!("/drivers/{}/delete/", id)
}

pub fn admin_changelist(model: AdminModel) -> String {
    format!("/admin/taxi/{}/", model.as_str())
}

pub fn admin_change(model: AdminModel, id: i64) -> String {
    format!("/admin/taxi/{}/{}/change/", model.as_str(), id)
}

/// `/accounts/login/?next=<path>`
pub fn login_with_next(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", LOGIN, query)
}

/// Only same-site absolute paths are followed after login.
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_paths() {
        assert_eq!(manufacturer_update(3), "/manufacturers/3/update/");
        assert_eq!(car_detail(1), "/cars/1/");
        assert_eq!(toggle_car_assign(7), "/cars/7/toggle-assign/");
        assert_eq!(driver_update(2), "/drivers/2/update/");
        assert_eq!(driver_delete(2), "/drivers/2/delete/");
        assert_eq!(admin_change(AdminModel::Driver, 5), "/admin/taxi/driver/5/change/");
        assert_eq!(admin_changelist(AdminModel::Car), "/admin/taxi/car/");
    }

    #[test]
    fn test_linked_objects_serialize_their_urls() {
        let manufacturer = Manufacturer {
            id: 4,
            name: "Nissan".to_string(),
            country: "Japan".to_string(),
        };
        let value = serde_json::to_value(linked(manufacturer.clone())).unwrap();
        assert_eq!(value["name"], "Nissan");
        assert_eq!(value["urls"]["update"], "/manufacturers/4/update/");
        assert_eq!(value["urls"]["delete"], "/manufacturers/4/delete/");
        assert!(value["urls"].get("detail").is_none());

        let car = Car {
            id: 9,
            model: "Skyline".to_string(),
            manufacturer,
        };
        let value = serde_json::to_value(linked(car)).unwrap();
        assert_eq!(value["manufacturer"]["name"], "Nissan");
        assert_eq!(value["urls"]["detail"], "/cars/9/");
        assert_eq!(value["urls"]["update"], "/cars/9/update/");
    }

    #[test]
    fn test_login_with_next_encodes_query() {
        assert_eq!(login_with_next("/cars/"), "/accounts/login/?next=%2Fcars%2F");
        assert_eq!(
            login_with_next("/cars/?model=a b"),
            "/accounts/login/?next=%2Fcars%2F%3Fmodel%3Da+b"
        );
    }

    #[test]
    fn test_local_paths() {
        assert!(is_local_path("/drivers/1/"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example/"));
        assert!(!is_local_path(""));
    }
}
