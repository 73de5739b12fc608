use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form as FormBody,
};
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    forms::{CarForm, CarSearchForm, Form, FormData, FormErrors, car::check_references},
    handlers::{AuthenticatedDriver, confirm_delete_context, form_context, found, page_context, query_prefix},
    models::{
        car::{Car, CarFilter, NewCar},
        driver::Driver,
    },
    services::{CarOperations, DriverOperations, ManufacturerOperations},
    state::AppState,
    urls,
    utils::pagination::PageRequest,
};

pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let params = FormData::from(params);
    let search = CarSearchForm::bind(&params);
    let model = search.clean().unwrap_or(None);
    let page_request = PageRequest::parse(params.get("page"), state.config.page_size)?;

    let filter = CarFilter {
        model: model.clone(),
        ..Default::default()
    };
    let page = state
        .car_service
        .list_cars(&filter, page_request)
        .await?
        .map(urls::linked);

    let mut context = page_context(Some(&auth.driver), "Car list");
    context.insert("search_field", &search.field());
    context.insert("page", &page);
    context.insert(
        "query_prefix",
        &query_prefix(&[(CarSearchForm::FIELD, model.as_deref().unwrap_or(""))]),
    );
    state.templates.render("taxi/car_list.html", &context)
}

async fn load(state: &AppState, car_id: i64) -> Result<Car, AppError> {
    state
        .car_service
        .get_car(car_id)
        .await?
        .ok_or(AppError::CarNotFound(car_id))
}

pub async fn car_detail(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(car_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let car = load(&state, car_id).await?;
    let drivers = state.car_service.drivers_of_car(car_id).await?;
    let is_assigned = drivers.iter().any(|driver| driver.id == auth.driver.id);

    let mut context = page_context(Some(&auth.driver), &car.model);
    context.insert("toggle_url", &urls::toggle_car_assign(car.id));
    context.insert("car", &urls::linked(car));
    context.insert("drivers", &urls::linked_all(drivers));
    context.insert("is_assigned", &is_assigned);
    state.templates.render("taxi/car_detail.html", &context)
}

async fn render_form(
    state: &AppState,
    user: &Driver,
    title: &str,
    form: &CarForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let manufacturers = state.manufacturer_service.all_manufacturers().await?;
    let drivers = state.driver_service.all_drivers().await?;
    let fields = form.fields(errors, &manufacturers, &drivers);
    let context = form_context(user, title, &fields, errors, "Submit", urls::CAR_LIST);
    state.templates.render("form.html", &context)
}

/// Form checks plus the existence of the chosen manufacturer and drivers.
pub(crate) async fn validate(state: &AppState, form: &CarForm) -> Result<Result<NewCar, FormErrors>, AppError> {
    let cleaned = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(Err(errors)),
    };
    let manufacturer_exists = state
        .manufacturer_service
        .get_manufacturer(cleaned.manufacturer_id)
        .await?
        .is_some();
    let known_driver_ids: Vec<i64> = state
        .driver_service
        .all_drivers()
        .await?
        .iter()
        .map(|driver| driver.id)
        .collect();

    Ok(check_references(&cleaned, manufacturer_exists, &known_driver_ids).map(|()| cleaned))
}

pub async fn create_car_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
) -> Result<Html<String>, AppError> {
    render_form(&state, &auth.driver, "Create car", &CarForm::default(), &FormErrors::new()).await
}

pub async fn create_car(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = CarForm::bind(&FormData::from(pairs));
    match validate(&state, &form).await? {
        Ok(new_car) => {
            state.car_service.create_car(new_car).await?;
            Ok(found(urls::CAR_LIST))
        }
        Err(errors) => Ok(render_form(&state, &auth.driver, "Create car", &form, &errors)
            .await?
            .into_response()),
    }
}

pub async fn update_car_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(car_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let car = load(&state, car_id).await?;
    let drivers = state.car_service.drivers_of_car(car_id).await?;
    let form = CarForm::from_instance(&car, &drivers);
    render_form(&state, &auth.driver, "Update car", &form, &FormErrors::new()).await
}

pub async fn update_car(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(car_id): Path<i64>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    load(&state, car_id).await?;
    let form = CarForm::bind(&FormData::from(pairs));
    match validate(&state, &form).await? {
        Ok(update) => {
            state.car_service.update_car(car_id, update).await?;
            Ok(found(urls::CAR_LIST))
        }
        Err(errors) => Ok(render_form(&state, &auth.driver, "Update car", &form, &errors)
            .await?
            .into_response()),
    }
}

pub async fn delete_car_page(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(car_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let car = load(&state, car_id).await?;
    let context = confirm_delete_context(&auth.driver, "car", &car.to_string(), &urls::car_detail(car_id));
    state.templates.render("confirm_delete.html", &context)
}

pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedDriver,
    Path(car_id): Path<i64>,
) -> Result<Response, AppError> {
    state.car_service.delete_car(car_id).await?;
    Ok(found(urls::CAR_LIST))
}

/// Adds the current driver to the car, or removes them if already there.
pub async fn toggle_assign_to_car(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedDriver,
    Path(car_id): Path<i64>,
) -> Result<Response, AppError> {
    state
        .driver_service
        .toggle_car_assignment(auth.driver.id, car_id)
        .await?;
    Ok(found(urls::car_detail(car_id)))
}
