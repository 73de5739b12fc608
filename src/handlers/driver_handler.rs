use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form as FormBody,
};
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    forms::{
        DriverCreationForm, DriverLicenseUpdateForm, DriverSearchForm, Form, FormData, FormErrors,
        driver::{DriverCreationData, LICENSE_TAKEN, USERNAME_TAKEN, unique_violation_errors},
    },
    handlers::{AuthenticatedDriver, confirm_delete_context, form_context, found, page_context, query_prefix},
    models::driver::{Driver, NewDriver},
    services::DriverOperations,
    state::AppState,
    urls,
    utils::pagination::PageRequest,
};

pub async fn list_drivers(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = FormData::from(params);
    let search = DriverSearchForm::bind(&params);
    let username = search.clean().unwrap_or(None);
    let page_request = PageRequest::parse(params.get("page"), state.config.page_size)?;

    let page = state
        .driver_service
        .list_drivers(username.as_deref(), page_request)
        .await?
        .map(urls::linked);

    let mut context = page_context(Some(&auth.driver), "Driver list");
    context.insert("search_field", &search.field());
    context.insert("page", &page);
    context.insert(
        "query_prefix",
        &query_prefix(&[(DriverSearchForm::FIELD, username.as_deref().unwrap_or(""))]),
    );
    state.templates.render("taxi/driver_list.html", &context)
}

async fn load(state: &AppState, driver_id: i64) -> Result<Driver, AppError> {
    state
        .driver_service
        .get_driver(driver_id)
        .await?
        .ok_or(AppError::DriverNotFound(driver_id))
}

pub async fn driver_detail(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(driver_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let driver = load(&state, driver_id).await?;
    let cars = state.driver_service.cars_of_driver(driver_id).await?;

    let mut context = page_context(Some(&auth.driver), &driver.username);
    context.insert("driver", &urls::linked(driver));
    context.insert("cars", &urls::linked_all(cars));
    state.templates.render("taxi/driver_detail.html", &context)
}

fn render_creation_form(
    state: &AppState,
    user: &Driver,
    form: &DriverCreationForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let context = form_context(user, "Create driver", &form.fields(errors), errors, "Submit", urls::DRIVER_LIST);
    state.templates.render("form.html", &context)
}

async fn validate_creation(
    state: &AppState,
    form: &DriverCreationForm,
) -> Result<Result<DriverCreationData, FormErrors>, AppError> {
    let cleaned = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(Err(errors)),
    };
    let mut errors = FormErrors::new();
    if state.driver_service.username_taken(&cleaned.username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if state
        .driver_service
        .license_number_taken(&cleaned.license_number, None)
        .await?
    {
        errors.add("license_number", LICENSE_TAKEN);
    }
    Ok(errors.into_result(cleaned))
}

pub async fn create_driver_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
) -> Result<Html<String>, AppError> {
    render_creation_form(&state, &auth.driver, &DriverCreationForm::default(), &FormErrors::new())
}

pub async fn create_driver(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = DriverCreationForm::bind(&FormData::from(pairs));
    match validate_creation(&state, &form).await? {
        Ok(cleaned) => match state.driver_service.create_driver(NewDriver::from(cleaned)).await {
            Ok(driver) => Ok(found(urls::driver_detail(driver.id))),
            Err(AppError::Conflict(message)) => {
                let errors = unique_violation_errors(&message);
                Ok(render_creation_form(&state, &auth.driver, &form, &errors)?.into_response())
            }
            Err(err) => Err(err),
        },
        Err(errors) => Ok(render_creation_form(&state, &auth.driver, &form, &errors)?.into_response()),
    }
}

fn render_license_form(
    state: &AppState,
    user: &Driver,
    driver: &Driver,
    form: &DriverLicenseUpdateForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let title = format!("Update license number of {}", driver.username);
    let context = form_context(
        user,
        &title,
        &form.fields(errors),
        errors,
        "Submit",
        &urls::driver_detail(driver.id),
    );
    state.templates.render("form.html", &context)
}

pub async fn update_driver_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(driver_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let driver = load(&state, driver_id).await?;
    let form = DriverLicenseUpdateForm::from_instance(&driver);
    render_license_form(&state, &auth.driver, &driver, &form, &FormErrors::new())
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(driver_id): Path<i64>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let driver = load(&state, driver_id).await?;
    let form = DriverLicenseUpdateForm::bind(&FormData::from(pairs));

    let result = match form.clean() {
        Ok(license_number) => {
            let mut errors = FormErrors::new();
            if state
                .driver_service
                .license_number_taken(&license_number, Some(driver_id))
                .await?
            {
                errors.add("license_number", LICENSE_TAKEN);
            }
            errors.into_result(license_number)
        }
        Err(errors) => Err(errors),
    };

    match result {
        Ok(license_number) => {
            state
                .driver_service
                .update_license_number(driver_id, &license_number)
                .await?;
            Ok(found(urls::DRIVER_LIST))
        }
        Err(errors) => Ok(render_license_form(&state, &auth.driver, &driver, &form, &errors)?.into_response()),
    }
}

pub async fn delete_driver_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(driver_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let driver = load(&state, driver_id).await?;
    let context = confirm_delete_context(
        &auth.driver,
        "driver",
        &driver.to_string(),
        &urls::driver_detail(driver_id),
    );
    state.templates.render("confirm_delete.html", &context)
}

pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedDriver,
    Path(driver_id): Path<i64>,
) -> Result<Response, AppError> {
    state.driver_service.delete_driver(driver_id).await?;
    Ok(found(urls::DRIVER_LIST))
}
