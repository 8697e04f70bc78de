use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::{ApplicationId, TeamId};
use crate::validation::{self, ValidationError};

/// Identifier wrapper for turnover entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnoverEntryId(pub String);

impl fmt::Display for TurnoverEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for finalized turnover snapshots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub String);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Section {
    Rfc,
    Inc,
    Alerts,
    Mim,
    Comms,
    Fyi,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Rfc,
        Section::Inc,
        Section::Alerts,
        Section::Mim,
        Section::Comms,
        Section::Fyi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Rfc => "RFC",
            Section::Inc => "INC",
            Section::Alerts => "ALERTS",
            Section::Mim => "MIM",
            Section::Comms => "COMMS",
            Section::Fyi => "FYI",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Section-specific fields; the tag doubles as the entry's section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "UPPERCASE")]
pub enum SectionDetails {
    Rfc {
        rfc_number: String,
        rfc_status: String,
        #[serde(default)]
        validated_by: Option<String>,
    },
    Inc {
        incident_number: String,
    },
    Alerts,
    Mim {
        mim_link: String,
        #[serde(default)]
        slack_link: Option<String>,
    },
    Comms {
        email_subject: String,
        #[serde(default)]
        slack_link: Option<String>,
    },
    Fyi,
}

impl SectionDetails {
    pub fn section(&self) -> Section {
        match self {
            SectionDetails::Rfc { .. } => Section::Rfc,
            SectionDetails::Inc { .. } => Section::Inc,
            SectionDetails::Alerts => Section::Alerts,
            SectionDetails::Mim { .. } => Section::Mim,
            SectionDetails::Comms { .. } => Section::Comms,
            SectionDetails::Fyi => Section::Fyi,
        }
    }

    /// Normalises the variant's fields and checks the ones it requires.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(match self {
            SectionDetails::Rfc {
                rfc_number,
                rfc_status,
                validated_by,
            } => SectionDetails::Rfc {
                rfc_number: validation::required_text("rfc_number", &rfc_number)?,
                rfc_status: validation::required_text("rfc_status", &rfc_status)?,
                validated_by: validation::optional_text("validated_by", validated_by.as_deref())?,
            },
            SectionDetails::Inc { incident_number } => SectionDetails::Inc {
                incident_number: validation::required_text("incident_number", &incident_number)?,
            },
            SectionDetails::Mim {
                mim_link,
                slack_link,
            } => SectionDetails::Mim {
                mim_link: validation::http_url("mim_link", &mim_link)?,
                slack_link: validation::optional_http_url("slack_link", slack_link.as_deref())?,
            },
            SectionDetails::Comms {
                email_subject,
                slack_link,
            } => SectionDetails::Comms {
                email_subject: validation::required_text("email_subject", &email_subject)?,
                slack_link: validation::optional_http_url("slack_link", slack_link.as_deref())?,
            },
            other @ (SectionDetails::Alerts | SectionDetails::Fyi) => other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TurnoverStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverEntry {
    pub id: TurnoverEntryId,
    pub team_id: TeamId,
    pub application_id: ApplicationId,
    pub details: SectionDetails,
    pub description: String,
    pub comments: Option<String>,
    pub is_important: bool,
    pub status: TurnoverStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TurnoverEntry {
    pub fn section(&self) -> Section {
        self.details.section()
    }

    pub fn is_open(&self) -> bool {
        self.status == TurnoverStatus::Open
    }

    /// OPEN -> RESOLVED is the only transition; resolved entries are terminal.
    pub fn resolve(&mut self, actor: &str, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.is_open() {
            return Err(TransitionError::AlreadyResolved {
                entry_id: self.id.clone(),
            });
        }
        self.status = TurnoverStatus::Resolved;
        self.resolved_by = Some(actor.to_string());
        self.resolved_at = Some(at);
        self.updated_by = actor.to_string();
        self.updated_at = at;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("turnover entry {entry_id} is already resolved")]
    AlreadyResolved { entry_id: TurnoverEntryId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTurnoverEntry {
    pub application_id: ApplicationId,
    pub details: SectionDetails,
    pub description: String,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub is_important: bool,
}

impl NewTurnoverEntry {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            application_id: self.application_id,
            details: self.details.validate()?,
            description: validation::required_text("description", &self.description)?,
            comments: validation::optional_text("comments", self.comments.as_deref())?,
            is_important: self.is_important,
        })
    }
}

/// Partial update. Details must keep the entry's section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoverEntryPatch {
    #[serde(default)]
    pub details: Option<SectionDetails>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub is_important: Option<bool>,
}

impl TurnoverEntryPatch {
    pub fn apply(self, entry: &mut TurnoverEntry) -> Result<(), ValidationError> {
        let mut next = entry.clone();
        if let Some(details) = self.details {
            if details.section() != entry.section() {
                return Err(ValidationError::new(
                    "section",
                    format!("cannot change section of a {} entry", entry.section()),
                ));
            }
            next.details = details.validate()?;
        }
        if let Some(description) = self.description {
            next.description = validation::required_text("description", &description)?;
        }
        if let Some(comments) = self.comments {
            next.comments = validation::optional_text("comments", Some(&comments))?;
        }
        if let Some(is_important) = self.is_important {
            next.is_important = is_important;
        }
        *entry = next;
        Ok(())
    }
}

/// Point-in-time export of a team's turnover log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedTurnoverSnapshot {
    pub id: SnapshotId,
    pub team_id: TeamId,
    pub finalized_by: String,
    pub finalized_at: DateTime<Utc>,
    pub entry_count: usize,
    pub payload: serde_json::Value,
}
