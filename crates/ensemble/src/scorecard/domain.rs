use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::period::YearMonth;
use crate::registry::ApplicationId;
use crate::validation::{self, ValidationError};

/// Identifier wrapper for scorecard entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked availability/volume metric for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardEntry {
    pub id: EntryId,
    pub application_id: ApplicationId,
    pub scorecard_identifier: String,
    pub name: String,
    pub availability_threshold: f64,
    pub volume_change_threshold: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Monthly availability percentage for an entry. Unique per (entry, year, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub entry_id: EntryId,
    pub year: i32,
    pub month: u32,
    pub availability: f64,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Monthly transaction volume for an entry. Unique per (entry, year, month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub entry_id: EntryId,
    pub year: i32,
    pub month: u32,
    pub volume: i64,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Common view over both record kinds for keying and change detection.
pub trait MonthlyRecord {
    fn key(&self) -> YearMonth;
    fn last_changed(&self) -> DateTime<Utc>;
}

impl MonthlyRecord for AvailabilityRecord {
    fn key(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    fn last_changed(&self) -> DateTime<Utc> {
        self.updated_at.max(self.created_at)
    }
}

impl MonthlyRecord for VolumeRecord {
    fn key(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    fn last_changed(&self) -> DateTime<Utc> {
        self.updated_at.max(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScorecardEntry {
    pub application_id: ApplicationId,
    pub scorecard_identifier: String,
    pub name: String,
    pub availability_threshold: f64,
    pub volume_change_threshold: f64,
}

impl NewScorecardEntry {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            application_id: self.application_id,
            scorecard_identifier: scorecard_identifier(&self.scorecard_identifier)?,
            name: validation::required_text("name", &self.name)?,
            availability_threshold: validation::percentage(
                "availability_threshold",
                self.availability_threshold,
            )?,
            volume_change_threshold: validation::non_negative(
                "volume_change_threshold",
                self.volume_change_threshold,
            )?,
        })
    }
}

/// Edit-dialog changes; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScorecardEntryPatch {
    #[serde(default)]
    pub scorecard_identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub availability_threshold: Option<f64>,
    #[serde(default)]
    pub volume_change_threshold: Option<f64>,
}

impl ScorecardEntryPatch {
    /// Applies every change or none of them.
    pub fn apply(self, entry: &mut ScorecardEntry) -> Result<(), ValidationError> {
        let mut updated = entry.clone();
        if let Some(identifier) = self.scorecard_identifier {
            updated.scorecard_identifier = scorecard_identifier(&identifier)?;
        }
        if let Some(name) = self.name {
            updated.name = validation::required_text("name", &name)?;
        }
        if let Some(threshold) = self.availability_threshold {
            updated.availability_threshold =
                validation::percentage("availability_threshold", threshold)?;
        }
        if let Some(threshold) = self.volume_change_threshold {
            updated.volume_change_threshold =
                validation::non_negative("volume_change_threshold", threshold)?;
        }
        *entry = updated;
        Ok(())
    }
}

fn scorecard_identifier(raw: &str) -> Result<String, ValidationError> {
    let identifier = validation::required_text("scorecard_identifier", raw)?;
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if identifier.len() > 64 || !identifier.chars().all(allowed) {
        return Err(ValidationError::new(
            "scorecard_identifier",
            "must be at most 64 letters, digits, '-', '_' or '.'",
        ));
    }
    Ok(identifier)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityInput {
    pub year: i32,
    pub month: u32,
    pub availability: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AvailabilityInput {
    /// A reason is mandatory whenever the value misses the entry's threshold.
    pub fn validate(self, threshold: f64) -> Result<Self, ValidationError> {
        validation::calendar_month(self.year, self.month)?;
        let availability = validation::percentage("availability", self.availability)?;
        let reason = validation::optional_text("reason", self.reason.as_deref())?;
        if availability < threshold && reason.is_none() {
            return Err(ValidationError::new(
                "reason",
                format!("is required when availability is below {threshold:.2}%"),
            ));
        }
        Ok(Self {
            year: self.year,
            month: self.month,
            availability,
            reason,
        })
    }
}

/// Largest monthly volume accepted, one quadrillion.
pub const MAX_VOLUME: i64 = 1_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInput {
    pub year: i32,
    pub month: u32,
    pub volume: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl VolumeInput {
    pub fn validate(self) -> Result<Self, ValidationError> {
        validation::calendar_month(self.year, self.month)?;
        if self.volume < 0 {
            return Err(ValidationError::new("volume", "must be zero or greater"));
        }
        if self.volume > MAX_VOLUME {
            return Err(ValidationError::new(
                "volume",
                format!("must be at most {MAX_VOLUME}"),
            ));
        }
        Ok(Self {
            reason: validation::optional_text("reason", self.reason.as_deref())?,
            ..self
        })
    }
}
