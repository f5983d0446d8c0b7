use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::Json;
use floodnet_database::Database;
use floodnet_models::v0::{self, ReportStatus};
use floodnet_pipeline::Ingestion;
use floodnet_result::{create_error, Error, Result};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Proof that the request carried the moderation shared secret
pub struct AdminToken;

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<AdminToken> {
        if let Some(Ok(token)) = parts.headers.get("x-admin-token").map(|v| v.to_str()) {
            let config = floodnet_config::config().await;
            if !config.api.admin_token.is_empty() && config.api.admin_token == token {
                Ok(AdminToken)
            } else {
                Err(create_error!(InvalidCredentials))
            }
        } else {
            Err(create_error!(NotAuthenticated))
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct ListQueryParams {
    /// Only return reports in this status
    pub status: Option<String>,
}

/// List reports
///
/// All reports for the moderation queue, optionally filtered by
/// status, newest first.
#[utoipa::path(
    get,
    path = "/admin/reports",
    security(("admin_token" = [])),
    params(ListQueryParams),
    responses(
        (status = 200, description = "Reports", body = Vec<v0::Report>)
    )
)]
pub async fn list_reports(
    _token: AdminToken,
    Query(params): Query<ListQueryParams>,
    State(db): State<Database>,
) -> Result<Json<Vec<v0::Report>>> {
    let status = params
        .status
        .as_deref()
        .map(|status| {
            ReportStatus::from_str(status).map_err(|_| {
                create_error!(FailedValidation {
                    error: "unknown status".to_string()
                })
            })
        })
        .transpose()?;

    Ok(Json(
        db.fetch_reports(status)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
    ))
}

/// Request body for a status change
#[derive(Deserialize, ToSchema)]
pub struct DataEditReport {
    /// Requested status
    pub status: ReportStatus,
}

/// Edit a report
///
/// Request a status change; the transition is validated against the
/// lifecycle table and an alert goes out when it lands on an
/// alert-worthy status.
#[utoipa::path(
    patch,
    path = "/admin/reports/{report_id}",
    security(("admin_token" = [])),
    params(
        ("report_id" = String, Path, description = "Id of the report")
    ),
    request_body = DataEditReport,
    responses(
        (status = 200, description = "Updated report", body = v0::Report),
        (status = 400, description = "Transition outside the lifecycle table")
    )
)]
pub async fn edit_report(
    _token: AdminToken,
    Path(report_id): Path<String>,
    State(ingestion): State<Arc<Ingestion>>,
    Json(edit): Json<DataEditReport>,
) -> Result<Json<v0::Report>> {
    ingestion
        .apply_transition(&report_id, edit.status)
        .await
        .map(|report| Json(report.into()))
}

/// Delete a report
///
/// Hard-delete the report row together with its stored evidence.
#[utoipa::path(
    delete,
    path = "/admin/reports/{report_id}",
    security(("admin_token" = [])),
    params(
        ("report_id" = String, Path, description = "Id of the report")
    ),
    responses(
        (status = 200, description = "Report removed")
    )
)]
pub async fn delete_report(
    _token: AdminToken,
    Path(report_id): Path<String>,
    State(ingestion): State<Arc<Ingestion>>,
) -> Result<()> {
    ingestion.delete_report(&report_id).await
}
