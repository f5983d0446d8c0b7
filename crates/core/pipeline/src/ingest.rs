//! Ingestion orchestrator: the single entry point a submission passes
//! through on its way into the system.
//!
//! Collaborators are injected at construction; the process entry point
//! owns their lifecycle. Nothing here keeps state between submissions,
//! the backing store is the only shared ground.

use std::str::FromStr;
use std::sync::Arc;

use floodnet_config::config;
use floodnet_database::{Database, Report};
use floodnet_models::v0::{Category, ReportStatus, SubmissionOutcome};
use floodnet_result::{create_error, Result};

use crate::dispatch::AlertDispatcher;
use crate::evidence::{EvidenceStore, S3EvidenceStore};
use crate::lifecycle;
use crate::verify::{VerificationGate, VisionClassifier};

/// One citizen submission, as handed over by the intake surface
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub image: Vec<u8>,
    pub content_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub landmark: String,
    pub category: Category,
    pub impact_level: u8,
}

/// Tunables of the pipeline, read from configuration in production
#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub duplicate_radius_metres: f64,
    pub auto_approve: bool,
    pub alert_statuses: Vec<ReportStatus>,
    pub max_file_size: usize,
    pub min_file_size: usize,
}

pub struct Ingestion {
    db: Database,
    evidence: Arc<dyn EvidenceStore>,
    gate: VerificationGate,
    dispatcher: AlertDispatcher,
    options: IngestionOptions,
}

impl Ingestion {
    pub fn new(
        db: Database,
        evidence: Arc<dyn EvidenceStore>,
        gate: VerificationGate,
        dispatcher: AlertDispatcher,
        options: IngestionOptions,
    ) -> Ingestion {
        Ingestion {
            db,
            evidence,
            gate,
            dispatcher,
            options,
        }
    }

    /// Assemble the production pipeline from configuration
    pub async fn from_config(db: Database) -> Ingestion {
        let settings = config().await;

        Ingestion::new(
            db,
            Arc::new(S3EvidenceStore),
            VerificationGate::new(
                Box::new(VisionClassifier::new(&settings.verification)),
                settings.verification.fallback,
            ),
            AlertDispatcher::from_config(&settings.alerts),
            IngestionOptions {
                duplicate_radius_metres: settings.reports.duplicate_radius_metres,
                auto_approve: settings.verification.auto_approve,
                alert_statuses: settings
                    .reports
                    .alert_statuses
                    .iter()
                    .filter_map(|status| ReportStatus::from_str(status).ok())
                    .collect(),
                max_file_size: settings.files.max_file_size,
                min_file_size: settings.files.min_file_size,
            },
        )
    }

    fn validate(&self, data: &SubmitReport) -> Result<()> {
        if data.image.len() < self.options.min_file_size {
            return Err(create_error!(FileTooSmall));
        }

        if data.image.len() > self.options.max_file_size {
            return Err(create_error!(FileTooLarge {
                max: self.options.max_file_size
            }));
        }

        floodnet_files::extension_for(&data.content_type)?;
        floodnet_files::validate_image(&data.image)?;

        if data.location.trim().is_empty() {
            return Err(create_error!(FailedValidation {
                error: "location must not be empty".to_string()
            }));
        }

        if !(-90.0..=90.0).contains(&data.latitude) || !(-180.0..=180.0).contains(&data.longitude)
        {
            return Err(create_error!(FailedValidation {
                error: "coordinates out of range".to_string()
            }));
        }

        if !(1..=3).contains(&data.impact_level) {
            return Err(create_error!(FailedValidation {
                error: "impact_level must be 1, 2 or 3".to_string()
            }));
        }

        Ok(())
    }

    /// Run one submission through the pipeline
    pub async fn submit(&self, data: SubmitReport) -> Result<SubmissionOutcome> {
        self.validate(&data)?;

        // Early duplicate probe, before paying for the upload; the
        // insert below re-checks under the storage guard
        let nearby = self
            .db
            .fetch_reports_near(
                data.latitude,
                data.longitude,
                self.options.duplicate_radius_metres,
            )
            .await?;
        if !nearby.is_empty() {
            return Err(create_error!(DuplicateLocation));
        }

        let image_url = self.evidence.upload(&data.image, &data.content_type).await?;

        let verification = self.gate.verify(&data.image).await;
        let status = lifecycle::initial_status(self.options.auto_approve, &verification);

        let report = Report::new(
            data.latitude,
            data.longitude,
            data.location,
            data.landmark,
            data.category,
            data.impact_level,
            image_url.clone(),
            status.clone(),
            verification.reason,
        );

        if let Err(error) = self
            .db
            .insert_report_if_location_free(&report, self.options.duplicate_radius_metres)
            .await
        {
            // The evidence object is already up; reclaim it so a lost
            // race does not leave an orphan behind
            if let Err(cleanup) = self.evidence.delete(&image_url).await {
                tracing::warn!("evidence {image_url} orphaned, needs reconciliation: {cleanup:?}");
            }
            return Err(error);
        }

        if self.is_alert_worthy(&report.status) {
            self.dispatch_alert(&report).await;
        }

        Ok(SubmissionOutcome {
            report_id: report.id,
            status,
        })
    }

    /// Apply a moderation status change through the state machine,
    /// dispatching when the transition lands on an alert-worthy state
    pub async fn apply_transition(&self, id: &str, requested: ReportStatus) -> Result<Report> {
        let report = self.db.fetch_report(id).await?;
        let next = lifecycle::transition(report.status, requested)?;

        let updated = self.db.update_report_status(id, next).await?;

        if self.is_alert_worthy(&updated.status) {
            self.dispatch_alert(&updated).await;
        }

        Ok(updated)
    }

    /// Remove a report row together with its stored evidence
    pub async fn delete_report(&self, id: &str) -> Result<()> {
        let report = self.db.fetch_report(id).await?;

        if let Err(error) = self.evidence.delete(&report.image_url).await {
            tracing::warn!(
                "evidence {} could not be removed, needs reconciliation: {error:?}",
                report.image_url
            );
        }

        self.db.delete_report(id).await
    }

    /// Run the verification gate over an image without creating a
    /// report; used by intake surfaces that only give feedback
    pub async fn verify_evidence(&self, image: &[u8]) -> floodnet_models::v0::VerificationResult {
        self.gate.verify(image).await
    }

    fn is_alert_worthy(&self, status: &ReportStatus) -> bool {
        self.options.alert_statuses.contains(status)
    }

    /// Fan the alert out; delivery is observability-only and never
    /// fails the surrounding operation
    async fn dispatch_alert(&self, report: &Report) {
        let outcome = self.dispatcher.dispatch(report).await;

        for (channel, result) in &outcome.per_channel {
            match result {
                Ok(()) => tracing::info!("alert for {} delivered via {channel}", report.id),
                Err(error) => {
                    tracing::error!("alert for {} failed via {channel}: {error:?}", report.id)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use floodnet_config::FallbackPolicy;
    use floodnet_database::{Database, DatabaseInfo};
    use floodnet_models::v0::{
        Category, ReportStatus, Severity, VerificationResult,
    };
    use floodnet_result::{create_error, ErrorType, Result};

    use crate::dispatch::{AlertChannel, AlertDispatcher, AlertMessage};
    use crate::evidence::EvidenceStore;
    use crate::verify::{Classify, VerificationGate};

    use super::{Ingestion, IngestionOptions, SubmitReport};

    // Minimal PNG header, enough for image validation
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    #[derive(Default)]
    struct MemoryEvidence {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        counter: AtomicUsize,
    }

    impl MemoryEvidence {
        fn len(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EvidenceStore for MemoryEvidence {
        async fn upload(&self, buf: &[u8], _content_type: &str) -> Result<String> {
            let reference = format!(
                "http://localhost/evidence/{}.png",
                self.counter.fetch_add(1, Ordering::SeqCst)
            );
            self.objects
                .lock()
                .unwrap()
                .insert(reference.clone(), buf.to_vec());
            Ok(reference)
        }

        async fn delete(&self, reference: &str) -> Result<()> {
            self.objects
                .lock()
                .unwrap()
                .remove(reference)
                .map(|_| ())
                .ok_or_else(|| create_error!(NotFound))
        }
    }

    struct StubClassifier(Result<VerificationResult>);

    #[async_trait]
    impl Classify for StubClassifier {
        async fn classify(&self, _image: &[u8]) -> Result<VerificationResult> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<AlertMessage>>,
    }

    impl RecordingChannel {
        fn len(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AlertChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, alert: &AlertMessage) -> Result<()> {
            self.sent.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    struct Harness {
        ingestion: Ingestion,
        db: Database,
        evidence: Arc<MemoryEvidence>,
        channel: Arc<RecordingChannel>,
    }

    async fn harness(
        classifier: Result<VerificationResult>,
        policy: FallbackPolicy,
        auto_approve: bool,
    ) -> Harness {
        let db = DatabaseInfo::Reference
            .connect()
            .await
            .expect("Database connection failed.");
        let evidence = Arc::new(MemoryEvidence::default());
        let channel = Arc::new(RecordingChannel::default());

        let ingestion = Ingestion::new(
            db.clone(),
            evidence.clone(),
            VerificationGate::new(Box::new(StubClassifier(classifier)), policy),
            AlertDispatcher::new(vec![channel.clone()], 1),
            IngestionOptions {
                duplicate_radius_metres: 50.0,
                auto_approve,
                alert_statuses: vec![ReportStatus::Approved],
                max_file_size: 10_485_760,
                min_file_size: 1,
            },
        );

        Harness {
            ingestion,
            db,
            evidence,
            channel,
        }
    }

    fn verified() -> Result<VerificationResult> {
        Ok(VerificationResult {
            verified: true,
            reason: "flood detected".to_string(),
            severity: Some(Severity::High),
        })
    }

    fn submission(latitude: f64, longitude: f64) -> SubmitReport {
        SubmitReport {
            image: PNG.to_vec(),
            content_type: "image/png".to_string(),
            latitude,
            longitude,
            location: "Zoo Road".to_string(),
            landmark: "Ganeshguri flyover".to_string(),
            category: Category::FlashFlood,
            impact_level: 3,
        }
    }

    #[async_std::test]
    async fn verified_submission_is_approved_and_dispatched() {
        let h = harness(verified(), FallbackPolicy::FailClosed, true).await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Approved);

        let feed = h.db.fetch_public_reports().await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, outcome.report_id);
        assert_eq!(feed[0].verification_reason, "flood detected");

        assert_eq!(h.channel.len(), 1);
        assert_eq!(h.evidence.len(), 1);
    }

    #[async_std::test]
    async fn newest_submission_leads_the_public_feed() {
        let h = harness(verified(), FallbackPolicy::FailClosed, true).await;

        h.ingestion.submit(submission(26.10, 91.60)).await.unwrap();
        let latest = h
            .ingestion
            .submit(submission(26.1579, 91.6676))
            .await
            .unwrap();

        let feed = h.db.fetch_public_reports().await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, latest.report_id);
    }

    #[async_std::test]
    async fn nearby_submission_is_rejected_as_duplicate() {
        let h = harness(verified(), FallbackPolicy::FailClosed, true).await;

        h.ingestion
            .submit(submission(26.1579, 91.6676))
            .await
            .unwrap();

        // ~10 metres away from the existing report
        let err = h
            .ingestion
            .submit(submission(26.15799, 91.6676))
            .await
            .unwrap_err();
        assert!(matches!(err.error_type, ErrorType::DuplicateLocation));

        // No second row, no second dispatch, no orphaned evidence
        assert_eq!(h.db.fetch_public_reports().await.unwrap().len(), 1);
        assert_eq!(h.channel.len(), 1);
        assert_eq!(h.evidence.len(), 1);
    }

    #[async_std::test]
    async fn distant_submission_is_accepted() {
        let h = harness(verified(), FallbackPolicy::FailClosed, true).await;

        h.ingestion
            .submit(submission(26.1579, 91.6676))
            .await
            .unwrap();

        // ~110 metres north of the first report
        h.ingestion
            .submit(submission(26.1589, 91.6676))
            .await
            .unwrap();

        assert_eq!(h.db.fetch_public_reports().await.unwrap().len(), 2);
    }

    #[async_std::test]
    async fn fail_closed_rejects_when_classifier_is_down() {
        let h = harness(
            Err(create_error!(ClassifierUnavailable)),
            FallbackPolicy::FailClosed,
            true,
        )
        .await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Rejected);

        // A definite outcome with the gate's reason, not a silent drop
        let report = h.db.fetch_report(&outcome.report_id).await.unwrap();
        assert!(!report.verification_reason.is_empty());

        // Rejected reports never alert
        assert_eq!(h.channel.len(), 0);
    }

    #[async_std::test]
    async fn fail_open_approves_when_classifier_is_down() {
        let h = harness(
            Err(create_error!(ClassifierUnavailable)),
            FallbackPolicy::FailOpen,
            true,
        )
        .await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Approved);
        assert_eq!(h.channel.len(), 1);
    }

    #[async_std::test]
    async fn manual_review_mode_parks_submissions_pending() {
        let h = harness(verified(), FallbackPolicy::FailClosed, false).await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Pending);
        assert_eq!(h.channel.len(), 0);
    }

    #[async_std::test]
    async fn validation_failures_leave_no_trace() {
        let h = harness(verified(), FallbackPolicy::FailClosed, true).await;

        let bad_coords = submission(126.0, 91.6676);
        assert!(h.ingestion.submit(bad_coords).await.is_err());

        let mut bad_impact = submission(26.1579, 91.6676);
        bad_impact.impact_level = 5;
        assert!(h.ingestion.submit(bad_impact).await.is_err());

        let mut empty_location = submission(26.1579, 91.6676);
        empty_location.location = "  ".to_string();
        assert!(h.ingestion.submit(empty_location).await.is_err());

        let mut empty_image = submission(26.1579, 91.6676);
        empty_image.image = Vec::new();
        assert!(h.ingestion.submit(empty_image).await.is_err());

        let mut not_an_image = submission(26.1579, 91.6676);
        not_an_image.image = b"just text".to_vec();
        assert!(h.ingestion.submit(not_an_image).await.is_err());

        assert_eq!(h.db.fetch_reports(None).await.unwrap().len(), 0);
        assert_eq!(h.evidence.len(), 0);
        assert_eq!(h.channel.len(), 0);
    }

    struct BrokenChannel;

    #[async_trait]
    impl AlertChannel for BrokenChannel {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn send(&self, _alert: &AlertMessage) -> Result<()> {
            Err(create_error!(DispatchFailed {
                channel: "broken".to_string()
            }))
        }
    }

    #[async_std::test]
    async fn channel_failure_never_fails_the_submission() {
        let db = DatabaseInfo::Reference
            .connect()
            .await
            .expect("Database connection failed.");
        let evidence = Arc::new(MemoryEvidence::default());
        let channel = Arc::new(RecordingChannel::default());

        let ingestion = Ingestion::new(
            db.clone(),
            evidence,
            VerificationGate::new(
                Box::new(StubClassifier(verified())),
                FallbackPolicy::FailClosed,
            ),
            AlertDispatcher::new(vec![channel.clone(), Arc::new(BrokenChannel)], 1),
            IngestionOptions {
                duplicate_radius_metres: 50.0,
                auto_approve: true,
                alert_statuses: vec![ReportStatus::Approved],
                max_file_size: 10_485_760,
                min_file_size: 1,
            },
        );

        // One channel is down, but the submission succeeds and the
        // report persists with its status intact
        let outcome = ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Approved);
        assert!(db.fetch_report(&outcome.report_id).await.is_ok());

        // The healthy channel still got the alert
        assert_eq!(channel.len(), 1);
    }

    #[async_std::test]
    async fn moderation_approval_dispatches_once() {
        let h = harness(verified(), FallbackPolicy::FailClosed, false).await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Pending);
        assert_eq!(h.channel.len(), 0);

        let updated = h
            .ingestion
            .apply_transition(&outcome.report_id, ReportStatus::Approved)
            .await
            .unwrap();
        assert_eq!(updated.status, ReportStatus::Approved);
        assert_eq!(h.channel.len(), 1);
    }

    #[async_std::test]
    async fn illegal_transition_changes_nothing() {
        let h = harness(
            Err(create_error!(ClassifierUnavailable)),
            FallbackPolicy::FailClosed,
            true,
        )
        .await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(outcome.status, ReportStatus::Rejected);

        let err = h
            .ingestion
            .apply_transition(&outcome.report_id, ReportStatus::Resolved)
            .await
            .unwrap_err();
        assert!(matches!(err.error_type, ErrorType::InvalidTransition { .. }));

        let report = h.db.fetch_report(&outcome.report_id).await.unwrap();
        assert_eq!(report.status, ReportStatus::Rejected);
    }

    #[async_std::test]
    async fn delete_removes_row_and_evidence() {
        let h = harness(verified(), FallbackPolicy::FailClosed, true).await;

        let outcome = h.ingestion.submit(submission(26.1579, 91.6676)).await.unwrap();
        assert_eq!(h.evidence.len(), 1);

        h.ingestion.delete_report(&outcome.report_id).await.unwrap();
        assert_eq!(h.evidence.len(), 0);
        assert!(h.db.fetch_report(&outcome.report_id).await.is_err());
    }
}
