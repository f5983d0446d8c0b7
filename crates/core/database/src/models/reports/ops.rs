use floodnet_models::v0::ReportStatus;
use floodnet_result::Result;

use crate::Report;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractReports: Sync + Send {
    /// Insert a new report, failing with `DuplicateLocation` if another
    /// report already covers a point within `radius_metres`. The check
    /// and the insert are atomic with respect to other inserts through
    /// the same database handle.
    async fn insert_report_if_location_free(
        &self,
        report: &Report,
        radius_metres: f64,
    ) -> Result<()>;

    /// Fetch a report by its id
    async fn fetch_report(&self, id: &str) -> Result<Report>;

    /// Fetch all reports, optionally filtered by status, newest first
    async fn fetch_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>>;

    /// Fetch all reports within the geodesic radius of a coordinate
    async fn fetch_reports_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_metres: f64,
    ) -> Result<Vec<Report>>;

    /// Fetch publicly visible reports (approved or resolved), newest first
    async fn fetch_public_reports(&self) -> Result<Vec<Report>>;

    /// Overwrite the status of a report, returning the updated row
    async fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<Report>;

    /// Remove a report row
    async fn delete_report(&self, id: &str) -> Result<()>;
}
