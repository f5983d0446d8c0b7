//! Hotspot and confidence aggregation for the monitoring dashboard.
//!
//! Pure functions over a snapshot of reports; callers pass the clock
//! in, so the same inputs always score the same.

use std::collections::HashMap;

use floodnet_database::Report;
use iso8601_timestamp::{Duration, Timestamp};

/// Bucket a snapshot of reports into rounded-coordinate cells
/// (3 decimal places, cells of roughly 110 m)
pub fn aggregate(reports: &[Report]) -> HashMap<String, usize> {
    let mut cells: HashMap<String, usize> = HashMap::new();
    for report in reports {
        *cells.entry(report.cell_key.clone()).or_default() += 1;
    }
    cells
}

/// Whether a report sits inside a cell holding at least `threshold`
/// reports
pub fn in_hotspot(report: &Report, cells: &HashMap<String, usize>, threshold: usize) -> bool {
    cells
        .get(&report.cell_key)
        .map(|count| *count >= threshold)
        .unwrap_or(false)
}

/// Display confidence for one report (0..=99): declared impact,
/// plus a density bonus for hotspot cells, plus a recency bonus for
/// reports younger than 24 hours
pub fn confidence(
    report: &Report,
    cells: &HashMap<String, usize>,
    threshold: usize,
    now: Timestamp,
) -> u8 {
    let mut score = report.impact_level as u32 * 20;

    if in_hotspot(report, cells, threshold) {
        score += 30;
    }

    if report.created_at + Duration::hours(24) > now {
        score += 10;
    }

    score.min(99) as u8
}

#[cfg(test)]
mod tests {
    use floodnet_database::Report;
    use floodnet_models::v0::{Category, ReportStatus};
    use iso8601_timestamp::{Duration, Timestamp};

    use super::{aggregate, confidence, in_hotspot};

    const THRESHOLD: usize = 10;

    fn report_at(latitude: f64, longitude: f64, impact_level: u8) -> Report {
        Report::new(
            latitude,
            longitude,
            "Zoo Road".to_string(),
            String::new(),
            Category::FlashFlood,
            impact_level,
            "http://localhost/evidence/a.jpg".to_string(),
            ReportStatus::Approved,
            "flood detected".to_string(),
        )
    }

    #[test]
    fn ten_reports_in_one_cell_make_a_hotspot() {
        let reports: Vec<Report> = (0..10)
            // Jitter below the rounding precision keeps them in one cell
            .map(|i| report_at(26.1579 + i as f64 * 0.00001, 91.6676, 2))
            .collect();

        let cells = aggregate(&reports);
        assert_eq!(cells.len(), 1);
        assert!(reports.iter().all(|r| in_hotspot(r, &cells, THRESHOLD)));

        // The eleventh report in the same cell still scores the bonus
        let eleventh = report_at(26.1579, 91.6676, 2);
        let mut reports = reports;
        reports.push(eleventh.clone());
        let cells = aggregate(&reports);
        assert!(in_hotspot(&eleventh, &cells, THRESHOLD));
    }

    #[test]
    fn nine_reports_are_not_a_hotspot() {
        let reports: Vec<Report> = (0..9)
            .map(|_| report_at(26.1579, 91.6676, 2))
            .collect();

        let cells = aggregate(&reports);
        assert!(!in_hotspot(&reports[0], &cells, THRESHOLD));
    }

    #[test]
    fn distant_reports_land_in_distinct_cells() {
        let reports = vec![
            report_at(26.1579, 91.6676, 2),
            report_at(26.2579, 91.6676, 2),
        ];
        assert_eq!(aggregate(&reports).len(), 2);
    }

    #[test]
    fn confidence_is_monotonic_in_impact_level() {
        let now = Timestamp::now_utc();
        let cells = aggregate(&[]);

        let scores: Vec<u8> = (1..=3)
            .map(|impact| confidence(&report_at(26.0, 91.0, impact), &cells, THRESHOLD, now))
            .collect();

        assert!(scores.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn confidence_never_exceeds_99() {
        let now = Timestamp::now_utc();
        let reports: Vec<Report> = (0..10).map(|_| report_at(26.0, 91.0, 3)).collect();
        let cells = aggregate(&reports);

        // Max impact + hotspot + recent would be 100 before the cap
        assert_eq!(confidence(&reports[0], &cells, THRESHOLD, now), 99);
    }

    #[test]
    fn recency_bonus_expires_after_a_day() {
        let report = report_at(26.0, 91.0, 1);
        let cells = aggregate(&[]);

        let now = Timestamp::now_utc();
        assert_eq!(confidence(&report, &cells, THRESHOLD, now), 30);

        let two_days_on = now + Duration::hours(48);
        assert_eq!(confidence(&report, &cells, THRESHOLD, two_days_on), 20);
    }
}
