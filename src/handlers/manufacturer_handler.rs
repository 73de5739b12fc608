use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form as FormBody,
};
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    forms::{Form, FormData, FormErrors, ManufacturerForm, ManufacturerSearchForm, manufacturer::NAME_TAKEN},
    handlers::{AuthenticatedDriver, confirm_delete_context, form_context, found, page_context, query_prefix},
    models::{
        driver::Driver,
        manufacturer::{Manufacturer, NewManufacturer},
    },
    services::ManufacturerOperations,
    state::AppState,
    urls,
    utils::pagination::PageRequest,
};

pub async fn list_manufacturers(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = FormData::from(params);
    let search = ManufacturerSearchForm::bind(&params);
    let name = search.clean().unwrap_or(None);
    let page_request = PageRequest::parse(params.get("page"), state.config.page_size)?;

    let page = state
        .manufacturer_service
        .list_manufacturers(name.as_deref(), page_request)
        .await?
        .map(urls::linked);

    let mut context = page_context(Some(&auth.driver), "Manufacturer list");
    context.insert("search_field", &search.field());
    context.insert("page", &page);
    context.insert(
        "query_prefix",
        &query_prefix(&[(ManufacturerSearchForm::FIELD, name.as_deref().unwrap_or(""))]),
    );
    state.templates.render("taxi/manufacturer_list.html", &context)
}

async fn load(state: &AppState, manufacturer_id: i64) -> Result<Manufacturer, AppError> {
    state
        .manufacturer_service
        .get_manufacturer(manufacturer_id)
        .await?
        .ok_or(AppError::ManufacturerNotFound(manufacturer_id))
}

fn render_form(
    state: &AppState,
    user: &Driver,
    title: &str,
    form: &ManufacturerForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let context = form_context(user, title, &form.fields(errors), errors, "Submit", urls::MANUFACTURER_LIST);
    state.templates.render("form.html", &context)
}

/// Runs the form checks plus the unique-name check against the database.
pub(crate) async fn validate(
    state: &AppState,
    form: &ManufacturerForm,
    exclude_id: Option<i64>,
) -> Result<Result<NewManufacturer, FormErrors>, AppError> {
    let cleaned = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(Err(errors)),
    };
    if state.manufacturer_service.name_taken(&cleaned.name, exclude_id).await? {
        let mut errors = FormErrors::new();
        errors.add("name", NAME_TAKEN);
        return Ok(Err(errors));
    }
    Ok(Ok(cleaned))
}

pub async fn create_manufacturer_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
) -> Result<Html<String>, AppError> {
    render_form(&state, &auth.driver, "Create manufacturer", &ManufacturerForm::default(), &FormErrors::new())
}

pub async fn create_manufacturer(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = ManufacturerForm::bind(&FormData::from(pairs));
    match validate(&state, &form, None).await? {
        Ok(new_manufacturer) => {
            state.manufacturer_service.create_manufacturer(new_manufacturer).await?;
            Ok(found(urls::MANUFACTURER_LIST))
        }
        Err(errors) => Ok(render_form(&state, &auth.driver, "Create manufacturer", &form, &errors)?.into_response()),
    }
}

pub async fn update_manufacturer_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(manufacturer_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let manufacturer = load(&state, manufacturer_id).await?;
    render_form(
        &state,
        &auth.driver,
        "Update manufacturer",
        &ManufacturerForm::from_instance(&manufacturer),
        &FormErrors::new(),
    )
}

pub async fn update_manufacturer(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(manufacturer_id): Path<i64>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    load(&state, manufacturer_id).await?;
    let form = ManufacturerForm::bind(&FormData::from(pairs));
    match validate(&state, &form, Some(manufacturer_id)).await? {
        Ok(update) => {
            state.manufacturer_service.update_manufacturer(manufacturer_id, update).await?;
            Ok(found(urls::MANUFACTURER_LIST))
        }
        Err(errors) => Ok(render_form(&state, &auth.driver, "Update manufacturer", &form, &errors)?.into_response()),
    }
}

pub async fn delete_manufacturer_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(manufacturer_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let manufacturer = load(&state, manufacturer_id).await?;
    let context = confirm_delete_context(
        &auth.driver,
        "manufacturer",
        &manufacturer.to_string(),
        urls::MANUFACTURER_LIST,
    );
    state.templates.render("confirm_delete.html", &context)
}

pub async fn delete_manufacturer(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedDriver,
    Path(manufacturer_id): Path<i64>,
) -> Result<Response, AppError> {
    state.manufacturer_service.delete_manufacturer(manufacturer_id).await?;
    Ok(found(urls::MANUFACTURER_LIST))
}
