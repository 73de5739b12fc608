use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form as FormBody,
};
use std::sync::Arc;
use tera::Context;

use crate::{
    admin::{self, AdminModel, ChangeListRow, Fieldset, LIST_PER_PAGE},
    errors::TaxiError as AppError,
    forms::{CarForm, DriverAdminForm, Form, FormData, FormErrors, ManufacturerForm, driver::LICENSE_TAKEN},
    handlers::{StaffDriver, car_handler, manufacturer_handler, page_context, query_prefix},
    models::{car::CarFilter, driver::Driver},
    services::{CarOperations, DriverOperations, ManufacturerOperations},
    state::AppState,
    urls,
    utils::pagination::{Page, PageRequest},
};

use super::found;

pub async fn admin_index(
    State(state): State<Arc<AppState>>,
    StaffDriver(auth): StaffDriver,
) -> Result<Html<String>, AppError> {
    let mut context = page_context(Some(&auth.driver), "Site administration");
    context.insert("models", &admin::model_links());
    state.templates.render("admin/index.html", &context)
}

pub async fn changelist(
    State(state): State<Arc<AppState>>,
    StaffDriver(auth): StaffDriver,
    Path(model): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let model: AdminModel = model.parse()?;
    let params = FormData::from(params);
    let q = params.text("q").trim().to_string();
    let search = (!q.is_empty()).then_some(q.as_str());
    let page_request = PageRequest::parse(params.get("p"), LIST_PER_PAGE)?;

    let mut context = page_context(
        Some(&auth.driver),
        &format!("Select {} to change", model.as_str()),
    );
    context.insert("search_enabled", &true);
    context.insert("q", &q);
    context.insert("columns", model.list_display());

    let mut filters = Vec::new();
    let mut preserved_filters = Vec::new();
    let mut prefix = query_prefix(&[("q", q.as_str())]);

    let page: Page<ChangeListRow> = match model {
        AdminModel::Driver => state
            .driver_service
            .list_drivers(search, page_request)
            .await?
            .map(|driver| admin::driver_row(&driver)),
        AdminModel::Manufacturer => state
            .manufacturer_service
            .list_manufacturers(search, page_request)
            .await?
            .map(|manufacturer| admin::manufacturer_row(&manufacturer)),
        AdminModel::Car => {
            let manufacturer_id = match params.get("manufacturer__id__exact").map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(
                    raw.parse::<i64>()
                        .map_err(|_| AppError::bad_request(format!("Invalid manufacturer filter: {}", raw)))?,
                ),
            };
            if let Some(id) = manufacturer_id {
                let id = id.to_string();
                preserved_filters.push(serde_json::json!({ "name": "manufacturer__id__exact", "value": id }));
                prefix = query_prefix(&[("q", q.as_str()), ("manufacturer__id__exact", id.as_str())]);
            }
            let manufacturers = state.manufacturer_service.all_manufacturers().await?;
            filters = admin::manufacturer_filter(&manufacturers, manufacturer_id, search);

            let filter = CarFilter {
                model: search.map(str::to_string),
                manufacturer_id,
            };
            state
                .car_service
                .list_cars(&filter, page_request)
                .await?
                .map(|car| admin::car_row(&car))
        }
    };

    context.insert("result_count", &page.total);
    context.insert("result_label", &model.result_label(page.total));
    context.insert("rows", &page.items);
    context.insert("page", &page);
    context.insert("filters", &filters);
    context.insert("preserved_filters", &preserved_filters);
    context.insert("query_prefix", &prefix);
    state.templates.render("admin/change_list.html", &context)
}

fn change_form_context(user: &Driver, model: AdminModel, object_label: &str, fieldsets: &[Fieldset], has_errors: bool) -> Context {
    let mut context = page_context(Some(user), &format!("Change {}", model.as_str()));
    context.insert("object_label", object_label);
    context.insert("fieldsets", fieldsets);
    context.insert("has_errors", &has_errors);
    context
}

/// Renders the change form for `model`/`object_id`, or saves it when `data`
/// is present.
async fn change(
    state: &AppState,
    user: &Driver,
    model: AdminModel,
    object_id: i64,
    data: Option<FormData>,
) -> Result<Response, AppError> {
    let (object_label, fieldsets, errors) = match model {
        AdminModel::Driver => {
            let driver = state
                .driver_service
                .get_driver(object_id)
                .await?
                .ok_or(AppError::DriverNotFound(object_id))?;
            let form = match &data {
                Some(data) => DriverAdminForm::bind(data),
                None => DriverAdminForm::from_instance(&driver),
            };
            let errors = match data {
                None => FormErrors::new(),
                Some(_) => match form.clean() {
                    Ok(update) => {
                        let mut errors = FormErrors::new();
                        if !update.license_number.is_empty()
                            && state
                                .driver_service
                                .license_number_taken(&update.license_number, Some(object_id))
                                .await?
                        {
                            errors.add("license_number", LICENSE_TAKEN);
                        }
                        if errors.is_empty() {
                            state.driver_service.update_driver(object_id, update).await?;
                            return Ok(found(urls::admin_changelist(model)));
                        }
                        errors
                    }
                    Err(errors) => errors,
                },
            };
            (driver.to_string(), admin::driver_fieldsets(&driver, &form, &errors), errors)
        }
        AdminModel::Car => {
            let car = state
                .car_service
                .get_car(object_id)
                .await?
                .ok_or(AppError::CarNotFound(object_id))?;
            let form = match &data {
                Some(data) => CarForm::bind(data),
                None => CarForm::from_instance(&car, &state.car_service.drivers_of_car(object_id).await?),
            };
            let errors = match data {
                None => FormErrors::new(),
                Some(_) => match car_handler::validate(state, &form).await? {
                    Ok(update) => {
                        state.car_service.update_car(object_id, update).await?;
                        return Ok(found(urls::admin_changelist(model)));
                    }
                    Err(errors) => errors,
                },
            };
            let manufacturers = state.manufacturer_service.all_manufacturers().await?;
            let drivers = state.driver_service.all_drivers().await?;
            let fieldsets = admin::car_fieldsets(&form, &errors, &manufacturers, &drivers);
            (car.to_string(), fieldsets, errors)
        }
        AdminModel::Manufacturer => {
            let manufacturer = state
                .manufacturer_service
                .get_manufacturer(object_id)
                .await?
                .ok_or(AppError::ManufacturerNotFound(object_id))?;
            let form = match &data {
                Some(data) => ManufacturerForm::bind(data),
                None => ManufacturerForm::from_instance(&manufacturer),
            };
            let errors = match data {
                None => FormErrors::new(),
                Some(_) => match manufacturer_handler::validate(state, &form, Some(object_id)).await? {
                    Ok(update) => {
                        state
                            .manufacturer_service
                            .update_manufacturer(object_id, update)
                            .await?;
                        return Ok(found(urls::admin_changelist(model)));
                    }
                    Err(errors) => errors,
                },
            };
            (manufacturer.to_string(), admin::manufacturer_fieldsets(&form, &errors), errors)
        }
    };

    let context = change_form_context(user, model, &object_label, &fieldsets, !errors.is_empty());
    Ok(state.templates.render("admin/change_form.html", &context)?.into_response())
}

pub async fn change_page(
    State(state): State<Arc<AppState>>,
    StaffDriver(auth): StaffDriver,
    Path((model, object_id)): Path<(String, i64)>,
) -> Result<Response, AppError> {
    change(&state, &auth.driver, model.parse()?, object_id, None).await
}

pub async fn save_change(
    State(state): State<Arc<AppState>>,
    StaffDriver(auth): StaffDriver,
    Path((model, object_id)): Path<(String, i64)>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let model: AdminModel = model.parse()?;
    let response = change(&state, &auth.driver, model, object_id, Some(FormData::from(pairs))).await?;
    if response.status().is_redirection() {
        tracing::info!("Driver {} changed {} {}", auth.driver.id, model.as_str(), object_id);
    }
    Ok(response)
}
