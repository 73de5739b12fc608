// src/templates.rs
use axum::response::Html;
use tera::{Context, Tera};

use crate::errors::TaxiResult;

/// Compiled page templates, embedded into the binary.
pub struct Templates {
    tera: Tera,
}

const SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("includes/form_fields.html", include_str!("../templates/includes/form_fields.html")),
    ("includes/pagination.html", include_str!("../templates/includes/pagination.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("registration/login.html", include_str!("../templates/registration/login.html")),
    ("form.html", include_str!("../templates/form.html")),
    ("confirm_delete.html", include_str!("../templates/confirm_delete.html")),
    ("taxi/manufacturer_list.html", include_str!("../templates/taxi/manufacturer_list.html")),
    ("taxi/car_list.html", include_str!("../templates/taxi/car_list.html")),
    ("taxi/car_detail.html", include_str!("../templates/taxi/car_detail.html")),
    ("taxi/driver_list.html", include_str!("../templates/taxi/driver_list.html")),
    ("taxi/driver_detail.html", include_str!("../templates/taxi/driver_detail.html")),
    ("admin/base.html", include_str!("../templates/admin/base.html")),
    ("admin/index.html", include_str!("../templates/admin/index.html")),
    ("admin/change_list.html", include_str!("../templates/admin/change_list.html")),
    ("admin/change_form.html", include_str!("../templates/admin/change_form.html")),
];

impl Templates {
    pub fn new() -> TaxiResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(SOURCES.iter().copied())?;
        tracing::debug!("Loaded {} templates", SOURCES.len());
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> TaxiResult<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }
}
