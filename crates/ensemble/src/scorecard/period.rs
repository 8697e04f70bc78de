//! Translates a selected time period into the concrete months to display.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Calendar month key used for records and publish status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn label(self) -> String {
        let index = self.month.clamp(1, 12) as usize - 1;
        format!("{} {}", MONTH_ABBREVIATIONS[index], self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Time period selector offered by the scorecard view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimePeriod {
    Last1Month,
    #[default]
    Last3Months,
    Last6Months,
    Last12Months,
    YearToDate,
    Year(i32),
}

impl TimePeriod {
    /// Length of a trailing window, `None` for calendar-anchored periods.
    pub const fn trailing_months(self) -> Option<u32> {
        match self {
            TimePeriod::Last1Month => Some(1),
            TimePeriod::Last3Months => Some(3),
            TimePeriod::Last6Months => Some(6),
            TimePeriod::Last12Months => Some(12),
            TimePeriod::YearToDate | TimePeriod::Year(_) => None,
        }
    }

    pub fn label(self) -> String {
        match self {
            TimePeriod::Last1Month => "Last month".to_string(),
            TimePeriod::Last3Months => "Last 3 months".to_string(),
            TimePeriod::Last6Months => "Last 6 months".to_string(),
            TimePeriod::Last12Months => "Last 12 months".to_string(),
            TimePeriod::YearToDate => "Year to date".to_string(),
            TimePeriod::Year(year) => year.to_string(),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePeriod::Last1Month => f.write_str("last-1"),
            TimePeriod::Last3Months => f.write_str("last-3"),
            TimePeriod::Last6Months => f.write_str("last-6"),
            TimePeriod::Last12Months => f.write_str("last-12"),
            TimePeriod::YearToDate => f.write_str("ytd"),
            TimePeriod::Year(year) => write!(f, "{year}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time period '{0}' (expected last-1, last-3, last-6, last-12, ytd or a year)")]
pub struct PeriodParseError(pub String);

impl FromStr for TimePeriod {
    type Err = PeriodParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "last-1" | "last-month" => Ok(TimePeriod::Last1Month),
            "last-3" => Ok(TimePeriod::Last3Months),
            "last-6" => Ok(TimePeriod::Last6Months),
            "last-12" => Ok(TimePeriod::Last12Months),
            "ytd" | "year-to-date" => Ok(TimePeriod::YearToDate),
            year if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) => year
                .parse::<i32>()
                .map(TimePeriod::Year)
                .map_err(|_| PeriodParseError(raw.to_string())),
            _ => Err(PeriodParseError(raw.to_string())),
        }
    }
}

impl TryFrom<String> for TimePeriod {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimePeriod> for String {
    fn from(value: TimePeriod) -> Self {
        value.to_string()
    }
}

/// One displayed column of the scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSlot {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub is_future: bool,
}

impl MonthSlot {
    fn new(key: YearMonth, is_future: bool) -> Self {
        Self {
            year: key.year,
            month: key.month,
            label: key.label(),
            is_future,
        }
    }

    /// Slot for a single month, judged against `today`.
    pub fn at(key: YearMonth, today: NaiveDate) -> Self {
        Self::new(key, key > YearMonth::of(today))
    }

    pub fn key(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// Resolves `period` against `today`, oldest month first.
pub fn resolve_months(period: TimePeriod, today: NaiveDate) -> Vec<MonthSlot> {
    let current = YearMonth::of(today);

    if let Some(window) = period.trailing_months() {
        let mut keys = Vec::with_capacity(window as usize);
        let mut cursor = current;
        for _ in 0..window {
            keys.push(cursor);
            cursor = cursor.previous();
        }
        keys.reverse();
        return keys.into_iter().map(|key| MonthSlot::new(key, false)).collect();
    }

    match period {
        TimePeriod::Year(year) => (1..=12)
            .map(|month| {
                let is_future =
                    year > current.year || (year == current.year && month > current.month);
                MonthSlot::new(YearMonth { year, month }, is_future)
            })
            .collect(),
        _ => (1..=current.month)
            .map(|month| {
                MonthSlot::new(
                    YearMonth {
                        year: current.year,
                        month,
                    },
                    false,
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn keys(slots: &[MonthSlot]) -> Vec<(i32, u32)> {
        slots.iter().map(|slot| (slot.year, slot.month)).collect()
    }

    #[test]
    fn trailing_window_wraps_year_boundary() {
        let slots = resolve_months(TimePeriod::Last3Months, date(2025, 2, 14));
        assert_eq!(keys(&slots), vec![(2024, 12), (2025, 1), (2025, 2)]);
        assert_eq!(slots[0].label, "Dec 2024");
        assert!(slots.iter().all(|slot| !slot.is_future));
    }

    #[test]
    fn every_selector_yields_contiguous_unique_months() {
        let today = date(2025, 5, 20);
        let cases = [
            (TimePeriod::Last1Month, 1),
            (TimePeriod::Last3Months, 3),
            (TimePeriod::Last6Months, 6),
            (TimePeriod::Last12Months, 12),
            (TimePeriod::YearToDate, 5),
            (TimePeriod::Year(2024), 12),
            (TimePeriod::Year(2025), 12),
        ];

        for (period, expected) in cases {
            let slots = resolve_months(period, today);
            assert_eq!(slots.len(), expected, "{period}");

            let unique: HashSet<_> = keys(&slots).into_iter().collect();
            assert_eq!(unique.len(), slots.len(), "{period} has duplicates");

            for pair in slots.windows(2) {
                assert_eq!(pair[1].key().previous(), pair[0].key(), "{period} has a gap");
            }
        }
    }

    #[test]
    fn year_to_date_in_january_is_one_month() {
        let slots = resolve_months(TimePeriod::YearToDate, date(2026, 1, 3));
        assert_eq!(keys(&slots), vec![(2026, 1)]);
        assert!(!slots[0].is_future);
    }

    #[test]
    fn specific_year_marks_future_months() {
        let today = date(2025, 9, 30);

        let current = resolve_months(TimePeriod::Year(2025), today);
        let future: Vec<u32> = current
            .iter()
            .filter(|slot| slot.is_future)
            .map(|slot| slot.month)
            .collect();
        assert_eq!(future, vec![10, 11, 12]);

        let past = resolve_months(TimePeriod::Year(2024), today);
        assert!(past.iter().all(|slot| !slot.is_future));

        let next = resolve_months(TimePeriod::Year(2026), today);
        assert!(next.iter().all(|slot| slot.is_future));
    }

    #[test]
    fn parses_selector_tokens() {
        assert_eq!("last-12".parse::<TimePeriod>(), Ok(TimePeriod::Last12Months));
        assert_eq!(" YTD ".parse::<TimePeriod>(), Ok(TimePeriod::YearToDate));
        assert_eq!("2024".parse::<TimePeriod>(), Ok(TimePeriod::Year(2024)));
        assert!("last-2".parse::<TimePeriod>().is_err());
        assert!("24".parse::<TimePeriod>().is_err());
    }

    #[test]
    fn serde_uses_selector_tokens() {
        let parsed: TimePeriod = serde_json::from_str("\"last-6\"").expect("parses");
        assert_eq!(parsed, TimePeriod::Last6Months);
        assert_eq!(
            serde_json::to_string(&TimePeriod::Year(2025)).expect("serializes"),
            "\"2025\""
        );
    }
}
