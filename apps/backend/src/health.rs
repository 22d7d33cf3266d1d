use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::AppError;

async fn health() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
