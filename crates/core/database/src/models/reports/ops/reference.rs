use floodnet_models::v0::ReportStatus;
use floodnet_result::Result;

use crate::util::geo;
use crate::ReferenceDb;
use crate::Report;

use super::AbstractReports;

#[async_trait]
impl AbstractReports for ReferenceDb {
    /// Insert a new report unless the location is already covered.
    /// The collection lock is held across check and insert, which is
    /// what makes the pair atomic here.
    async fn insert_report_if_location_free(
        &self,
        report: &Report,
        radius_metres: f64,
    ) -> Result<()> {
        let mut reports = self.reports.lock().await;

        if reports.values().any(|existing| {
            geo::haversine_metres(
                existing.latitude,
                existing.longitude,
                report.latitude,
                report.longitude,
            ) < radius_metres
        }) {
            return Err(create_error!(DuplicateLocation));
        }

        if reports.contains_key(&report.id) {
            Err(create_database_error!("insert", "reports"))
        } else {
            reports.insert(report.id.to_string(), report.clone());
            Ok(())
        }
    }

    /// Fetch a report by its id
    async fn fetch_report(&self, id: &str) -> Result<Report> {
        let reports = self.reports.lock().await;
        reports.get(id).cloned().ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all reports, optionally filtered by status, newest first
    async fn fetch_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let reports = self.reports.lock().await;
        let mut reports: Vec<Report> = reports
            .values()
            .filter(|report| {
                status
                    .as_ref()
                    .map(|status| &report.status == status)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Fetch all reports within the geodesic radius of a coordinate
    async fn fetch_reports_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_metres: f64,
    ) -> Result<Vec<Report>> {
        let reports = self.reports.lock().await;
        Ok(reports
            .values()
            .filter(|report| {
                geo::haversine_metres(report.latitude, report.longitude, latitude, longitude)
                    < radius_metres
            })
            .cloned()
            .collect())
    }

    /// Fetch publicly visible reports, newest first
    async fn fetch_public_reports(&self) -> Result<Vec<Report>> {
        let reports = self.reports.lock().await;
        let mut reports: Vec<Report> = reports
            .values()
            .filter(|report| {
                matches!(
                    report.status,
                    ReportStatus::Approved | ReportStatus::Resolved
                )
            })
            .cloned()
            .collect();

        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Overwrite the status of a report, returning the updated row
    async fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<Report> {
        let mut reports = self.reports.lock().await;
        if let Some(report) = reports.get_mut(id) {
            report.status = status;
            Ok(report.clone())
        } else {
            Err(create_error!(NotFound))
        }
    }

    /// Remove a report row
    async fn delete_report(&self, id: &str) -> Result<()> {
        let mut reports = self.reports.lock().await;
        if reports.remove(id).is_some() {
            Ok(())
        } else {
            Err(create_error!(NotFound))
        }
    }
}
