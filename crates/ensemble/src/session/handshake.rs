use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{SessionError, TeamPermission, TeamRole};
use crate::registry::Team;
use crate::validation::{self, ValidationError};

/// Attributes released by the SSO identity provider at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoAssertion {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub ads_id: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl SsoAssertion {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let email = validation::required_text("email", &self.email)?;
        if !email.contains('@') {
            return Err(ValidationError::new("email", "must be an email address"));
        }
        Ok(Self {
            first_name: validation::required_text("first_name", &self.first_name)?,
            last_name: validation::required_text("last_name", &self.last_name)?,
            email,
            ads_id: validation::required_text("ads_id", &self.ads_id)?,
            groups: self
                .groups
                .iter()
                .map(|group| group.trim().to_string())
                .filter(|group| !group.is_empty())
                .collect(),
        })
    }
}

/// Header carrying `hex(HMAC-SHA256(sso_secret, body))` for a forwarded assertion.
pub const SIGNATURE_HEADER: &str = "x-ensemble-sso-signature";

type HmacSha256 = Hmac<Sha256>;

/// Authenticates assertions relayed by the identity gateway. Only a body
/// signed with the shared secret is ever parsed.
pub struct AssertionVerifier {
    key: Vec<u8>,
}

impl fmt::Debug for AssertionVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionVerifier").finish_non_exhaustive()
    }
}

impl AssertionVerifier {
    pub fn new(shared_secret: &str) -> Self {
        Self {
            key: shared_secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| SessionError::BadSignature)
    }

    pub fn sign(&self, body: &[u8]) -> Result<String, SessionError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks the signature in constant time, then parses the body.
    pub fn verify(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<SsoAssertion, SessionError> {
        let signature = signature
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SessionError::Unsigned)?;
        let expected = hex::decode(signature).map_err(|_| SessionError::BadSignature)?;
        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SessionError::BadSignature)?;

        serde_json::from_slice(body).map_err(|_| {
            SessionError::Assertion(ValidationError::new(
                "assertion",
                "must be a JSON SSO assertion",
            ))
        })
    }
}

/// Maps directory groups onto team roles. The admin group outranks the user
/// group; inactive teams grant nothing.
pub fn permissions_for(groups: &[String], teams: &[Team]) -> Vec<TeamPermission> {
    let member_of = |group: &str| groups.iter().any(|g| g.eq_ignore_ascii_case(group));

    teams
        .iter()
        .filter(|team| team.is_active)
        .filter_map(|team| {
            let role = if member_of(&team.admin_group) {
                TeamRole::Admin
            } else if member_of(&team.user_group) {
                TeamRole::User
            } else {
                return None;
            };
            Some(TeamPermission {
                team_id: team.id.clone(),
                team_name: team.name.clone(),
                role,
            })
        })
        .collect()
}
