use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::{self, ValidationError};

/// Identifier wrapper for teams.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for registered applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tenant of the portal. Membership is derived from the two directory groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub admin_group: String,
    pub user_group: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One level of the ownership chain reported by the asset registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipLevel {
    pub role: String,
    pub name: String,
}

/// Application registered to a team, mirrored from the asset registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub team_id: TeamId,
    pub asset_id: String,
    pub name: String,
    pub tla: String,
    pub life_cycle_status: Option<String>,
    pub tier: Option<String>,
    pub hierarchy: Vec<OwnershipLevel>,
    pub synced_at: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub admin_group: String,
    pub user_group: String,
}

impl NewTeam {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = validation::required_text("name", &self.name)?;
        let admin_group = directory_group("admin_group", &self.admin_group)?;
        let user_group = directory_group("user_group", &self.user_group)?;
        if admin_group.eq_ignore_ascii_case(&user_group) {
            return Err(ValidationError::new(
                "user_group",
                "must differ from the admin group",
            ));
        }
        Ok(Self {
            name,
            admin_group,
            user_group,
        })
    }
}

fn directory_group(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let group = validation::required_text(field, value)?;
    if group.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(field, "must not contain whitespace"));
    }
    Ok(group)
}

/// Request to register an asset-registry application under a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub asset_id: String,
    #[serde(default)]
    pub tla: Option<String>,
}

impl NewApplication {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let asset_id = validation::required_text("asset_id", &self.asset_id)?;
        if !asset_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::new(
                "asset_id",
                "may only contain letters, digits and '-'",
            ));
        }
        let tla = match validation::optional_text("tla", self.tla.as_deref())? {
            Some(tla) => Some(normalize_tla(&tla)?),
            None => None,
        };
        Ok(Self { asset_id, tla })
    }
}

/// Uppercases and checks a three-letter application abbreviation.
pub fn normalize_tla(raw: &str) -> Result<String, ValidationError> {
    let tla = raw.trim().to_ascii_uppercase();
    let valid_len = (2..=5).contains(&tla.len());
    if !valid_len || !tla.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(
            "tla",
            "must be 2 to 5 letters or digits",
        ));
    }
    Ok(tla)
}

/// Falls back to the leading alphanumerics of the application name.
pub fn derive_tla(name: &str) -> String {
    let derived: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    if derived.len() < 2 {
        "APP".to_string()
    } else {
        derived
    }
}
