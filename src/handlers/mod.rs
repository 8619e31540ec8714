pub mod checkout;
pub mod developer;
pub mod rti;
pub mod verify;
pub mod webhook;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/payments/checkout", post(checkout::initiate_checkout))
        .route("/payments/verify", post(verify::verify_payment))
        .route("/payments/webhook", post(webhook::handle_webhook))
        .route("/rti/{id}/document", get(rti::get_rti_document))
        .route("/developer/credentials", get(developer::get_credentials))
}
