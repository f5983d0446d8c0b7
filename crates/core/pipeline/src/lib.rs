#[macro_use]
extern crate async_trait;

pub mod dispatch;
pub mod evidence;
pub mod hotspots;
pub mod ingest;
pub mod lifecycle;
pub mod verify;

pub use dispatch::{AlertChannel, AlertDispatcher, AlertMessage, DispatchOutcome};
pub use evidence::{EvidenceStore, S3EvidenceStore};
pub use ingest::{Ingestion, IngestionOptions, SubmitReport};
pub use verify::{Classify, VerificationGate, VisionClassifier};
