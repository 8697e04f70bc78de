//! Breach detection and roll-ups for one scorecard entry over displayed months.

use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::{AvailabilityRecord, ScorecardEntry, VolumeRecord};
use super::period::{MonthSlot, YearMonth};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntryThresholds {
    pub availability_threshold: f64,
    pub volume_change_threshold: f64,
}

impl From<&ScorecardEntry> for EntryThresholds {
    fn from(entry: &ScorecardEntry) -> Self {
        Self {
            availability_threshold: entry.availability_threshold,
            volume_change_threshold: entry.volume_change_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthEvaluation {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub is_future: bool,
    pub availability: Option<f64>,
    pub availability_reason: Option<String>,
    pub availability_breach: bool,
    pub volume: Option<i64>,
    pub volume_reason: Option<String>,
    /// Percentage change from the previous displayed month.
    pub volume_change: Option<f64>,
    pub volume_breach: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryEvaluation {
    pub thresholds: EntryThresholds,
    pub months: Vec<MonthEvaluation>,
    pub average_availability: Option<f64>,
    pub total_volume: Option<i64>,
    pub availability_breaches: usize,
    pub volume_breaches: usize,
}

/// Percentage change between consecutive months.
///
/// A previous volume of zero has no defined change; it is reported as 100%
/// when volume appeared and 0% when it stayed at zero.
pub fn volume_change_percent(previous: i64, current: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

/// Evaluates one entry across `months` (oldest first). Records for future
/// months are ignored everywhere.
pub fn evaluate_entry(
    thresholds: EntryThresholds,
    months: &[MonthSlot],
    availability: &BTreeMap<YearMonth, AvailabilityRecord>,
    volume: &BTreeMap<YearMonth, VolumeRecord>,
) -> EntryEvaluation {
    let mut evaluations = Vec::with_capacity(months.len());
    let mut previous_volume: Option<i64> = None;

    for (index, slot) in months.iter().enumerate() {
        let key = slot.key();
        let availability_record = availability.get(&key).filter(|_| !slot.is_future);
        let volume_record = volume.get(&key).filter(|_| !slot.is_future);

        let availability_value = availability_record.map(|record| record.availability);
        let availability_breach = availability_value
            .map(|value| value < thresholds.availability_threshold)
            .unwrap_or(false);

        let volume_value = volume_record.map(|record| record.volume);
        let volume_change = match (index, previous_volume, volume_value) {
            (0, _, _) => None,
            (_, Some(previous), Some(current)) => Some(volume_change_percent(previous, current)),
            _ => None,
        };
        let volume_breach = volume_change
            .map(|change| change.abs() > thresholds.volume_change_threshold)
            .unwrap_or(false);
        previous_volume = volume_value;

        evaluations.push(MonthEvaluation {
            year: slot.year,
            month: slot.month,
            label: slot.label.clone(),
            is_future: slot.is_future,
            availability: availability_value,
            availability_reason: availability_record.and_then(|record| record.reason.clone()),
            availability_breach,
            volume: volume_value,
            volume_reason: volume_record.and_then(|record| record.reason.clone()),
            volume_change,
            volume_breach,
        });
    }

    let recorded_availability: Vec<f64> = evaluations
        .iter()
        .filter_map(|month| month.availability)
        .collect();
    let average_availability = if recorded_availability.is_empty() {
        None
    } else {
        Some(recorded_availability.iter().sum::<f64>() / recorded_availability.len() as f64)
    };

    let recorded_volume: Vec<i64> = evaluations.iter().filter_map(|month| month.volume).collect();
    // Saturates rather than wrapping when stored volumes exceed the input bound.
    let total_volume = if recorded_volume.is_empty() {
        None
    } else {
        Some(
            recorded_volume
                .iter()
                .try_fold(0i64, |total, volume| total.checked_add(*volume))
                .unwrap_or(i64::MAX),
        )
    };

    EntryEvaluation {
        thresholds,
        availability_breaches: evaluations
            .iter()
            .filter(|month| month.availability_breach)
            .count(),
        volume_breaches: evaluations.iter().filter(|month| month.volume_breach).count(),
        months: evaluations,
        average_availability,
        total_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorecard::domain::EntryId;
    use crate::scorecard::period::{resolve_months, TimePeriod};
    use chrono::{NaiveDate, TimeZone, Utc};

    const THRESHOLDS: EntryThresholds = EntryThresholds {
        availability_threshold: 98.0,
        volume_change_threshold: 25.0,
    };

    fn availability(year: i32, month: u32, value: f64) -> (YearMonth, AvailabilityRecord) {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (
            YearMonth { year, month },
            AvailabilityRecord {
                entry_id: EntryId("entry-1".to_string()),
                year,
                month,
                availability: value,
                reason: None,
                created_by: "test".to_string(),
                created_at: at,
                updated_by: "test".to_string(),
                updated_at: at,
            },
        )
    }

    fn volume(year: i32, month: u32, value: i64) -> (YearMonth, VolumeRecord) {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (
            YearMonth { year, month },
            VolumeRecord {
                entry_id: EntryId("entry-1".to_string()),
                year,
                month,
                volume: value,
                reason: None,
                created_by: "test".to_string(),
                created_at: at,
                updated_by: "test".to_string(),
                updated_at: at,
            },
        )
    }

    fn march_2025() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date")
    }

    #[test]
    fn availability_below_threshold_is_a_breach() {
        let months = resolve_months(TimePeriod::Last3Months, march_2025());
        let records = BTreeMap::from([availability(2025, 2, 97.5), availability(2025, 3, 98.5)]);

        let evaluation = evaluate_entry(THRESHOLDS, &months, &records, &BTreeMap::new());

        assert!(evaluation.months[1].availability_breach);
        assert!(!evaluation.months[2].availability_breach);
        assert_eq!(evaluation.availability_breaches, 1);
    }

    #[test]
    fn average_skips_months_without_records() {
        let months = resolve_months(TimePeriod::Last3Months, march_2025());
        let records = BTreeMap::from([availability(2025, 1, 99.0), availability(2025, 3, 97.0)]);

        let evaluation = evaluate_entry(THRESHOLDS, &months, &records, &BTreeMap::new());

        assert_eq!(evaluation.average_availability, Some(98.0));
        assert_eq!(evaluation.months[1].availability, None);
        assert!(!evaluation.months[1].availability_breach);
    }

    #[test]
    fn first_displayed_month_has_no_volume_change() {
        let months = resolve_months(TimePeriod::Last3Months, march_2025());
        let volumes = BTreeMap::from([
            volume(2024, 12, 10),
            volume(2025, 1, 1_000),
            volume(2025, 2, 1_100),
            volume(2025, 3, 2_000),
        ]);

        let evaluation = evaluate_entry(THRESHOLDS, &months, &BTreeMap::new(), &volumes);

        assert_eq!(evaluation.months[0].volume, Some(1_000));
        assert_eq!(evaluation.months[0].volume_change, None);
        assert!(!evaluation.months[0].volume_breach);

        let february = evaluation.months[1].volume_change.expect("change");
        assert!((february - 10.0).abs() < 1e-9);
        assert!(!evaluation.months[1].volume_breach);

        assert!(evaluation.months[2].volume_breach);
        assert_eq!(evaluation.volume_breaches, 1);
        assert_eq!(evaluation.total_volume, Some(4_100));
    }

    #[test]
    fn huge_volumes_saturate_the_total() {
        let months = resolve_months(TimePeriod::Last3Months, march_2025());
        let volumes = BTreeMap::from([volume(2025, 2, i64::MAX), volume(2025, 3, i64::MAX)]);

        let evaluation = evaluate_entry(THRESHOLDS, &months, &BTreeMap::new(), &volumes);

        assert_eq!(evaluation.total_volume, Some(i64::MAX));
        assert_eq!(evaluation.months[2].volume_change, Some(0.0));
        assert_eq!(evaluation.volume_breaches, 0);
    }

    #[test]
    fn zero_previous_volume_policy() {
        assert_eq!(volume_change_percent(0, 100), 100.0);
        assert_eq!(volume_change_percent(0, 0), 0.0);
        assert_eq!(volume_change_percent(200, 150), -25.0);
    }

    #[test]
    fn gap_month_breaks_volume_change_chain() {
        let months = resolve_months(TimePeriod::Last3Months, march_2025());
        let volumes = BTreeMap::from([volume(2025, 1, 500), volume(2025, 3, 900)]);

        let evaluation = evaluate_entry(THRESHOLDS, &months, &BTreeMap::new(), &volumes);

        assert_eq!(evaluation.months[2].volume_change, None);
        assert_eq!(evaluation.volume_breaches, 0);
    }

    #[test]
    fn future_months_are_excluded_from_totals() {
        let months = resolve_months(TimePeriod::Year(2025), march_2025());
        let records = BTreeMap::from([availability(2025, 3, 99.0), availability(2025, 7, 50.0)]);
        let volumes = BTreeMap::from([volume(2025, 3, 100), volume(2025, 4, 9_999)]);

        let evaluation = evaluate_entry(THRESHOLDS, &months, &records, &volumes);

        assert_eq!(evaluation.average_availability, Some(99.0));
        assert_eq!(evaluation.total_volume, Some(100));
        assert_eq!(evaluation.availability_breaches, 0);
        assert_eq!(evaluation.volume_breaches, 0);
        assert_eq!(evaluation.months[6].availability, None);
        assert!(evaluation.months[6].is_future);
    }

    #[test]
    fn no_records_means_no_rollups() {
        let months = resolve_months(TimePeriod::Last6Months, march_2025());
        let evaluation = evaluate_entry(THRESHOLDS, &months, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(evaluation.average_availability, None);
        assert_eq!(evaluation.total_volume, None);
        assert_eq!(evaluation.months.len(), 6);
    }
}
