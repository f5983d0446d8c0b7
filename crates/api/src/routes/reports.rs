use axum::{extract::State, Json};
use floodnet_database::Database;
use floodnet_models::v0;
use floodnet_pipeline::hotspots;
use floodnet_result::Result;
use iso8601_timestamp::Timestamp;

/// Public report feed
///
/// Reports that have been vetted (approved) or fixed (resolved),
/// newest first.
#[utoipa::path(
    get,
    path = "/reports/public",
    responses(
        (status = 200, description = "Publicly visible reports", body = Vec<v0::Report>)
    )
)]
pub async fn public_feed(State(db): State<Database>) -> Result<Json<Vec<v0::Report>>> {
    Ok(Json(
        db.fetch_public_reports()
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
    ))
}

/// Dashboard insights
///
/// The public snapshot annotated with per-report confidence and the
/// hotspot cell table.
#[utoipa::path(
    get,
    path = "/reports/insights",
    responses(
        (status = 200, description = "Aggregated dashboard view", body = v0::Insights)
    )
)]
pub async fn insights(State(db): State<Database>) -> Result<Json<v0::Insights>> {
    let config = floodnet_config::config().await;
    let threshold = config.reports.hotspot_min_reports;

    let reports = db.fetch_public_reports().await?;
    let cells = hotspots::aggregate(&reports);
    let now = Timestamp::now_utc();

    let annotated = reports
        .into_iter()
        .map(|report| v0::ReportInsight {
            confidence: hotspots::confidence(&report, &cells, threshold, now),
            hotspot: hotspots::in_hotspot(&report, &cells, threshold),
            report: report.into(),
        })
        .collect();

    let mut cells: Vec<v0::HotspotCell> = cells
        .into_iter()
        .map(|(cell, count)| v0::HotspotCell {
            cell,
            count,
            hotspot: count >= threshold,
        })
        .collect();
    cells.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cell.cmp(&b.cell)));

    Ok(Json(v0::Insights {
        reports: annotated,
        cells,
    }))
}
