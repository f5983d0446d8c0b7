//! Report lifecycle state machine.
//!
//! Pure functions over (current, requested) status pairs; side effects
//! such as alert dispatch belong to the caller observing the result.

use floodnet_models::v0::{ReportStatus, VerificationResult};
use floodnet_result::{create_error, Result};

/// Status a freshly verified submission enters the system with.
///
/// With `auto_approve` disabled every report waits for human review.
pub fn initial_status(auto_approve: bool, verification: &VerificationResult) -> ReportStatus {
    if !auto_approve {
        ReportStatus::Pending
    } else if verification.verified {
        ReportStatus::Approved
    } else {
        ReportStatus::Rejected
    }
}

/// Apply a requested status change, failing with `InvalidTransition`
/// for any pair outside the legal table
pub fn transition(current: ReportStatus, requested: ReportStatus) -> Result<ReportStatus> {
    use ReportStatus::*;

    match (&current, &requested) {
        // Moderation decision
        (Pending, Approved) | (Pending, Rejected) => Ok(requested),
        // Responders marked the hazard remediated
        (Approved, Resolved) => Ok(requested),
        // Restore for re-review
        (Rejected, Pending) => Ok(requested),
        // Reopen
        (Resolved, Pending) => Ok(requested),
        _ => Err(create_error!(InvalidTransition {
            from: current.as_str().to_string(),
            to: requested.as_str().to_string()
        })),
    }
}

#[cfg(test)]
mod tests {
    use floodnet_models::v0::{ReportStatus, Severity, VerificationResult};
    use floodnet_result::ErrorType;

    use super::{initial_status, transition};

    const ALL: [ReportStatus; 4] = [
        ReportStatus::Pending,
        ReportStatus::Approved,
        ReportStatus::Rejected,
        ReportStatus::Resolved,
    ];

    const LEGAL: [(ReportStatus, ReportStatus); 5] = [
        (ReportStatus::Pending, ReportStatus::Approved),
        (ReportStatus::Pending, ReportStatus::Rejected),
        (ReportStatus::Approved, ReportStatus::Resolved),
        (ReportStatus::Rejected, ReportStatus::Pending),
        (ReportStatus::Resolved, ReportStatus::Pending),
    ];

    fn verified(verified: bool) -> VerificationResult {
        VerificationResult {
            verified,
            reason: "flood detected".to_string(),
            severity: Some(Severity::High),
        }
    }

    #[test]
    fn legal_transitions_produce_requested_state() {
        for (from, to) in LEGAL.iter() {
            assert_eq!(transition(from.clone(), to.clone()).unwrap(), *to);
        }
    }

    #[test]
    fn every_pair_outside_the_table_is_rejected() {
        for from in ALL.iter() {
            for to in ALL.iter() {
                if LEGAL.contains(&(from.clone(), to.clone())) {
                    continue;
                }

                let err = transition(from.clone(), to.clone()).unwrap_err();
                assert!(matches!(
                    err.error_type,
                    ErrorType::InvalidTransition { .. }
                ));
            }
        }
    }

    #[test]
    fn rejected_cannot_jump_to_resolved() {
        assert!(transition(ReportStatus::Rejected, ReportStatus::Resolved).is_err());
    }

    #[test]
    fn initial_status_follows_verification_when_auto_approving() {
        assert_eq!(
            initial_status(true, &verified(true)),
            ReportStatus::Approved
        );
        assert_eq!(
            initial_status(true, &verified(false)),
            ReportStatus::Rejected
        );
    }

    #[test]
    fn initial_status_is_pending_without_auto_approve() {
        assert_eq!(
            initial_status(false, &verified(true)),
            ReportStatus::Pending
        );
        assert_eq!(
            initial_status(false, &verified(false)),
            ReportStatus::Pending
        );
    }
}
