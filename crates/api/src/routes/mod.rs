use axum::{
    http::Method,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowHeaders, Any, CorsLayer};

use crate::AppState;

pub mod admin;
pub mod reports;
pub mod root;
pub mod submit;
pub mod weather;
pub mod whatsapp;

pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_origin(Any);

    Router::new()
        .route("/", get(root::root))
        .route("/reports", post(submit::submit_report))
        .route("/reports/public", get(reports::public_feed))
        .route("/reports/insights", get(reports::insights))
        .route("/weather", get(weather::weather))
        .route("/webhooks/whatsapp", post(whatsapp::whatsapp_inbound))
        .route("/admin/reports", get(admin::list_reports))
        .route(
            "/admin/reports/:report_id",
            patch(admin::edit_report).delete(admin::delete_report),
        )
        .layer(cors)
}
