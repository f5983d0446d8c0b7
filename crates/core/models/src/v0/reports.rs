use iso8601_timestamp::Timestamp;

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
        /// Nearest landmark, if the reporter gave one
        #[serde(skip_serializing_if = "crate::if_empty", default)]
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
        #[serde(skip_serializing_if = "crate::if_empty", default)]
        pub verification_reason: String,
        /// When the report was created
        #[schema(value_type = String)]
        pub created_at: Timestamp,
    }

    /// Kind of hazard a report describes
    #[serde(rename_all = "kebab-case")]
    pub enum Category {
        /// Rapid surface flooding of a street or open area
        FlashFlood,
        /// Blocked or overflowing drainage infrastructure
        DrainageBlockage,
    }

    /// Lifecycle status of a report
    #[serde(rename_all = "snake_case")]
    pub enum ReportStatus {
        /// Waiting for moderation
        Pending,
        /// Confirmed and visible on the public feed
        Approved,
        /// Declined, not shown publicly
        Rejected,
        /// Remediated by responders
        Resolved,
    }

    /// Severity hint produced by the image classifier
    #[serde(rename_all = "lowercase")]
    pub enum Severity {
        Low,
        Medium,
        High,
    }

    /// Decision of the verification gate for one image
    pub struct VerificationResult {
        /// Whether the image shows a genuine hazard
        pub verified: bool,
        /// Human-readable explanation of the decision
        pub reason: String,
        /// Optional severity estimate
        #[serde(skip_serializing_if = "Option::is_none", default)]
        pub severity: Option<Severity>,
    }

    /// Outcome handed back to a submitting citizen
    pub struct SubmissionOutcome {
        /// Id of the newly created report
        pub report_id: String,
        /// Status the report entered the system with
        pub status: ReportStatus,
    }

    /// One spatial cell of the hotspot aggregation
    pub struct HotspotCell {
        /// Rounded-coordinate bucket ("26.158,91.668")
        pub cell: String,
        /// Number of reports inside the cell
        pub count: usize,
        /// Whether the cell crosses the hotspot threshold
        pub hotspot: bool,
    }

    /// A public report annotated for the monitoring dashboard
    pub struct ReportInsight {
        /// The report itself
        #[serde(flatten)]
        pub report: Report,
        /// Display confidence score (0..=99)
        pub confidence: u8,
        /// Whether the report sits inside a hotspot cell
        pub hotspot: bool,
    }

    /// Aggregated dashboard view over the public report snapshot
    pub struct Insights {
        /// Public reports, newest first, annotated with confidence
        pub reports: Vec<ReportInsight>,
        /// Spatial cells holding at least one report
        pub cells: Vec<HotspotCell>,
    }
);

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FlashFlood => "flash-flood",
            Category::DrainageBlockage => "drainage-blockage",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flash-flood" => Ok(Category::FlashFlood),
            "drainage-blockage" => Ok(Category::DrainageBlockage),
            _ => Err(()),
        }
    }
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "rejected" => Ok(ReportStatus::Rejected),
            "resolved" => Ok(ReportStatus::Resolved),
            _ => Err(()),
        }
    }
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Three-tier label for a reporter-declared impact level
    pub fn from_impact_level(impact_level: u8) -> Severity {
        match impact_level {
            1 => Severity::Low,
            2 => Severity::Medium,
            _ => Severity::High,
        }
    }
}
