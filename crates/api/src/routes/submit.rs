use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::{extract::State, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use floodnet_models::v0::{Category, SubmissionOutcome};
use floodnet_pipeline::{Ingestion, SubmitReport};
use floodnet_config::report_internal_error;
use floodnet_result::{create_error, Result};
use utoipa::ToSchema;

/// Request body for a report submission
#[derive(ToSchema, TryFromMultipart)]
pub struct SubmitPayload {
    /// Photo evidence of the hazard
    #[schema(value_type = String, format = Binary)]
    #[form_data(limit = "unlimited")] // enforced by the pipeline
    image: FieldData<Bytes>,
    /// Latitude of the hazard
    lat: f64,
    /// Longitude of the hazard
    lng: f64,
    /// Free-text location description
    location: String,
    /// Nearest landmark
    landmark: Option<String>,
    /// Hazard category ("flash-flood" or "drainage-blockage")
    r#type: String,
    /// Declared severity (1..=3)
    impact_level: u8,
}

/// Submit a report
///
/// Runs the submission through the validation pipeline: duplicate
/// check, evidence upload, AI verification, persistence and alert
/// dispatch.
#[utoipa::path(
    post,
    path = "/reports",
    request_body(content_type = "multipart/form-data", content = SubmitPayload),
    responses(
        (status = 200, description = "Report accepted", body = SubmissionOutcome),
        (status = 409, description = "A report already covers this location")
    )
)]
pub async fn submit_report(
    State(ingestion): State<Arc<Ingestion>>,
    TypedMultipart(payload): TypedMultipart<SubmitPayload>,
) -> Result<Json<SubmissionOutcome>> {
    let content_type = payload
        .image
        .metadata
        .content_type
        .clone()
        .unwrap_or_else(|| "image/jpeg".to_string());

    let category = Category::from_str(&payload.r#type).map_err(|_| {
        create_error!(FailedValidation {
            error: "unknown report type".to_string()
        })
    })?;

    let data = SubmitReport {
        image: payload.image.contents.to_vec(),
        content_type,
        latitude: payload.lat,
        longitude: payload.lng,
        location: payload.location,
        landmark: payload.landmark.unwrap_or_default(),
        category,
        impact_level: payload.impact_level,
    };

    // Run on a separate task: once the report persists, a client
    // disconnect must not cancel the alert fan-out
    let submission = tokio::spawn(async move { ingestion.submit(data).await });

    report_internal_error!(submission.await)?.map(Json)
}
