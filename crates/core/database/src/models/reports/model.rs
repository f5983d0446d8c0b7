use floodnet_models::v0::{self, Category, ReportStatus};
use iso8601_timestamp::Timestamp;
use ulid::Ulid;

use crate::util::geo;

auto_derived!(
    /// Citizen-submitted incident report
    pub struct Report {
        /// Unique Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Latitude the hazard was reported at
        pub latitude: f64,
        /// Longitude the hazard was reported at
        pub longitude: f64,
        /// Free-text description of the location
        pub location: String,
        /// Nearest landmark, empty when the reporter gave none
        #[serde(default)]
        pub landmark: String,
        /// Kind of hazard being reported
        pub category: Category,
        /// Severity self-declared by the reporter (1..=3)
        pub impact_level: u8,
        /// Public locator of the stored photo evidence
        pub image_url: String,
        /// Where the report sits in its lifecycle
        pub status: ReportStatus,
        /// What the verification gate concluded at creation time
        #[serde(default)]
        pub verification_reason: String,
        /// When the report was created
        pub created_at: Timestamp,
        /// Rounded-coordinate bucket backing the duplicate guard and
        /// the hotspot aggregation
        pub cell_key: String,
    }
);

impl Report {
    /// Build a new report row; the id, timestamp and spatial bucket
    /// are derived here, everything else comes from the submission
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        latitude: f64,
        longitude: f64,
        location: String,
        landmark: String,
        category: Category,
        impact_level: u8,
        image_url: String,
        status: ReportStatus,
        verification_reason: String,
    ) -> Report {
        Report {
            id: Ulid::new().to_string(),
            latitude,
            longitude,
            location,
            landmark,
            category,
            impact_level,
            image_url,
            status,
            verification_reason,
            created_at: Timestamp::now_utc(),
            cell_key: geo::cell_key(latitude, longitude),
        }
    }
}

impl From<Report> for v0::Report {
    fn from(value: Report) -> Self {
        v0::Report {
            id: value.id,
            latitude: value.latitude,
            longitude: value.longitude,
            location: value.location,
            landmark: value.landmark,
            category: value.category,
            impact_level: value.impact_level,
            image_url: value.image_url,
            status: value.status,
            verification_reason: value.verification_reason,
            created_at: value.created_at,
        }
    }
}
