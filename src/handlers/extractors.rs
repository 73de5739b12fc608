// src/handlers/extractors.rs
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite, time::Duration};
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    models::driver::Driver,
    services::{DriverOperations, Session},
    state::AppState,
    urls,
};

use super::found;

pub const SESSION_COOKIE: &str = "sessionid";

/// Value of the `sessionid` cookie, if the browser sent one.
pub fn session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|key| !key.is_empty())
}

pub fn session_cookie(key: &str, ttl_seconds: u64) -> String {
    Cookie::build((SESSION_COOKIE, key.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX)))
        .build()
        .to_string()
}

pub fn expired_session_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}

/// The logged-in driver behind the request's session cookie.
///
/// Anonymous requests are answered with a redirect to the login page that
/// brings the user back afterwards.
#[derive(Debug, Clone)]
pub struct AuthenticatedDriver {
    pub driver: Driver,
    pub session_key: String,
    pub session: Session,
}

impl AuthenticatedDriver {
    async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<Self>, AppError> {
        let Some(session_key) = session_key(&parts.headers) else {
            return Ok(None);
        };
        let Some(session) = state.session_service.load(&session_key).await? else {
            tracing::debug!("Unknown or expired session");
            return Ok(None);
        };
        if session.is_expired() {
            return Ok(None);
        }
        match state.driver_service.get_driver(session.driver_id).await? {
            Some(driver) if driver.is_active => Ok(Some(Self {
                driver,
                session_key,
                session,
            })),
            _ => Ok(None),
        }
    }
}

fn login_redirect(parts: &Parts) -> Response {
    let next = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(urls::INDEX);
    found(urls::login_with_next(next))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedDriver {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match Self::resolve(parts, state).await {
            Ok(Some(auth)) => Ok(auth),
            Ok(None) => Err(login_redirect(parts)),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// A logged-in driver with `is_staff` set. Other drivers get 403.
#[derive(Debug, Clone)]
pub struct StaffDriver(pub AuthenticatedDriver);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for StaffDriver {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let auth = AuthenticatedDriver::from_request_parts(parts, state).await?;
        if !auth.driver.is_staff {
            tracing::warn!("Driver {} denied admin access", auth.driver.id);
            return Err(AppError::forbidden("Staff access required").into_response());
        }
        Ok(StaffDriver(auth))
    }
}
