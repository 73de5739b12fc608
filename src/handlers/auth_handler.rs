use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{Html, IntoResponse, Response},
    Form as FormBody,
};
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    forms::{Form, FormData, FormErrors, LoginForm, driver::INVALID_LOGIN},
    handlers::{
        extractors::{expired_session_cookie, session_cookie, session_key},
        found, page_context,
    },
    services::DriverOperations,
    state::AppState,
    urls,
};

fn render_login(state: &AppState, form: &LoginForm, errors: &FormErrors) -> Result<Html<String>, AppError> {
    let mut context = page_context(None, "Login");
    context.insert("fields", &form.fields(errors));
    context.insert("non_field_errors", errors.non_field());
    context.insert("next", &form.next);
    state.templates.render("registration/login.html", &context)
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let form = LoginForm::bind(&FormData::from(params));
    render_login(&state, &form, &FormErrors::new())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = LoginForm::bind(&FormData::from(pairs));
    let (username, password) = match form.clean() {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(render_login(&state, &form, &errors)?.into_response()),
    };

    let Some(driver) = state.driver_service.authenticate(&username, &password).await? else {
        let mut errors = FormErrors::new();
        errors.add_non_field(INVALID_LOGIN);
        return Ok(render_login(&state, &form, &errors)?.into_response());
    };

    let (key, _) = state.session_service.create(driver.id).await?;
    state.driver_service.record_login(driver.id).await?;
    tracing::info!("Driver {} logged in", driver.id);

    let target = if urls::is_local_path(&form.next) {
        form.next.as_str()
    } else {
        urls::INDEX
    };
    let mut response = found(target);
    let cookie = session_cookie(&key, state.session_service.ttl_seconds());
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|_| AppError::internal_error("invalid session cookie"))?,
    );
    Ok(response)
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(key) = session_key(&headers) {
        state.session_service.destroy(&key).await?;
    }
    let mut response = found(urls::LOGIN);
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&expired_session_cookie())
            .map_err(|_| AppError::internal_error("invalid session cookie"))?,
    );
    Ok(response)
}
