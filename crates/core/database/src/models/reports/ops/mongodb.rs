use floodnet_models::v0::ReportStatus;
use floodnet_result::Result;
use mongodb::options::FindOptions;

use crate::util::geo;
use crate::MongoDb;
use crate::Report;

use super::AbstractReports;

static COL: &str = "reports";

#[async_trait]
impl AbstractReports for MongoDb {
    /// Insert a new report unless the location is already covered.
    /// MongoDB has no advisory lock over a geodesic radius, so the
    /// check + insert pair is serialized through the driver-level
    /// insert lock; see the note on `MongoDb::insert_lock`.
    async fn insert_report_if_location_free(
        &self,
        report: &Report,
        radius_metres: f64,
    ) -> Result<()> {
        let _guard = self.insert_lock.lock().await;

        let nearby = self
            .fetch_reports_near(report.latitude, report.longitude, radius_metres)
            .await?;
        if !nearby.is_empty() {
            return Err(create_error!(DuplicateLocation));
        }

        query!(self, insert_one, COL, &report).map(|_| ())
    }

    /// Fetch a report by its id
    async fn fetch_report(&self, id: &str) -> Result<Report> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    /// Fetch all reports, optionally filtered by status, newest first
    async fn fetch_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let filter = if let Some(status) = status {
            doc! {
                "status": status.as_str()
            }
        } else {
            doc! {}
        };

        query!(
            self,
            find_with_options,
            COL,
            filter,
            FindOptions::builder()
                .sort(doc! {
                    "created_at": -1_i32
                })
                .build()
        )
    }

    /// Fetch all reports within the geodesic radius of a coordinate.
    /// A coordinate bounding box narrows the scan, the haversine
    /// distance makes the final call.
    async fn fetch_reports_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_metres: f64,
    ) -> Result<Vec<Report>> {
        let (min_lat, max_lat, min_lng, max_lng) =
            geo::bounding_box(latitude, longitude, radius_metres);

        let candidates: Vec<Report> = query!(
            self,
            find,
            COL,
            doc! {
                "latitude": { "$gte": min_lat, "$lte": max_lat },
                "longitude": { "$gte": min_lng, "$lte": max_lng }
            }
        )?;

        Ok(candidates
            .into_iter()
            .filter(|report| {
                geo::haversine_metres(report.latitude, report.longitude, latitude, longitude)
                    < radius_metres
            })
            .collect())
    }

    /// Fetch publicly visible reports, newest first
    async fn fetch_public_reports(&self) -> Result<Vec<Report>> {
        query!(
            self,
            find_with_options,
            COL,
            doc! {
                "status": {
                    "$in": ["approved", "resolved"]
                }
            },
            FindOptions::builder()
                .sort(doc! {
                    "created_at": -1_i32
                })
                .build()
        )
    }

    /// Overwrite the status of a report, returning the updated row
    async fn update_report_status(&self, id: &str, status: ReportStatus) -> Result<Report> {
        let result = query!(
            self,
            update_one_by_id,
            COL,
            id,
            doc! {
                "$set": {
                    "status": status.as_str()
                }
            }
        )?;

        if result.matched_count == 0 {
            return Err(create_error!(NotFound));
        }

        self.fetch_report(id).await
    }

    /// Remove a report row
    async fn delete_report(&self, id: &str) -> Result<()> {
        let result = query!(self, delete_one_by_id, COL, id)?;
        if result.deleted_count == 0 {
            Err(create_error!(NotFound))
        } else {
            Ok(())
        }
    }
}
