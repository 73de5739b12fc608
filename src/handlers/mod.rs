pub mod admin_handler;
pub mod auth_handler;
pub mod car_handler;
pub mod driver_handler;
pub mod extractors;
pub mod index_handler;
pub mod manufacturer_handler;

pub use extractors::{AuthenticatedDriver, StaffDriver};

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tera::Context;

use crate::{
    forms::{BoundField, FormErrors},
    models::driver::Driver,
    urls,
};

/// 302 to `location` (`Redirect::to` answers 303).
pub fn found(location: impl AsRef<str>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.as_ref().to_string())]).into_response()
}

#[derive(Debug, Clone, Serialize)]
struct UserContext<'a> {
    id: i64,
    username: &'a str,
    is_staff: bool,
    url: String,
}

/// Context every page starts from: the current user, the page title and the
/// fixed `urls`.
pub(crate) fn page_context(user: Option<&Driver>, title: &str) -> Context {
    let mut context = Context::new();
    context.insert(
        "user",
        &user.map(|driver| UserContext {
            id: driver.id,
            username: &driver.username,
            is_staff: driver.is_staff,
            url: urls::driver_detail(driver.id),
        }),
    );
    context.insert("title", title);
    context.insert("urls", &urls::STATIC_URLS);
    context
}

/// Context for `form.html`.
pub(crate) fn form_context(
    user: &Driver,
    title: &str,
    fields: &[BoundField],
    errors: &FormErrors,
    submit_label: &str,
    cancel_url: &str,
) -> Context {
    let mut context = page_context(Some(user), title);
    context.insert("fields", fields);
    context.insert("non_field_errors", errors.non_field());
    context.insert("submit_label", submit_label);
    context.insert("cancel_url", cancel_url);
    context
}

pub(crate) fn confirm_delete_context(user: &Driver, object_kind: &str, object_label: &str, cancel_url: &str) -> Context {
    let mut context = page_context(Some(user), &format!("Delete {}", object_kind));
    context.insert("object_kind", object_kind);
    context.insert("object_label", object_label);
    context.insert("cancel_url", cancel_url);
    context
}

/// `name=term&` for pagination links, or nothing when there is no search.
pub(crate) fn query_prefix(params: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (name, value) in params.iter().filter(|(_, value)| !value.is_empty()) {
        serializer.append_pair(name, value);
        any = true;
    }
    if any { format!("{}&", serializer.finish()) } else { String::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_is_302() {
        let response = found("/cars/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/cars/");
    }

    #[test]
    fn test_query_prefix() {
        assert_eq!(query_prefix(&[("model", "")]), "");
        assert_eq!(query_prefix(&[("model", "Sky line")]), "model=Sky+line&");
        assert_eq!(query_prefix(&[("q", "a"), ("manufacturer__id__exact", "2")]), "q=a&manufacturer__id__exact=2&");
    }
}
