//! Sealed session cookies and the team permissions they carry.
//!
//! A session is minted once, right after the SSO provider hands over the
//! caller's attributes, and is then decrypted and expiry-checked on every
//! authenticated request. Anything that fails to unseal is treated as
//! anonymous and the cookie is cleared.

mod cookie;
mod handshake;
pub mod router;
mod seal;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::registry::{Team, TeamId};

pub use cookie::{read_cookie, CookieSettings};
pub use handshake::{permissions_for, AssertionVerifier, SsoAssertion, SIGNATURE_HEADER};
pub use router::session_router;
pub use seal::{SessionError, SessionSealer};

/// Role a session holds on a team, derived from directory group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPermission {
    pub team_id: TeamId,
    pub team_name: String,
    pub role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub ads_id: String,
}

impl SessionUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Decrypted cookie contents. `expires_at` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub permissions: Vec<TeamPermission>,
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.expires_at
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at).single()
    }

    /// Name stamped into audit columns.
    pub fn actor(&self) -> String {
        self.user.display_name()
    }

    pub fn role_for(&self, team_id: &TeamId) -> Option<TeamRole> {
        self.permissions
            .iter()
            .filter(|permission| &permission.team_id == team_id)
            .map(|permission| permission.role)
            .max()
    }

    pub fn require_member(&self, team_id: &TeamId) -> Result<TeamRole, AccessError> {
        self.role_for(team_id).ok_or_else(|| AccessError::NotAMember {
            team_id: team_id.clone(),
        })
    }

    pub fn require_admin(&self, team_id: &TeamId) -> Result<(), AccessError> {
        match self.require_member(team_id)? {
            TeamRole::Admin => Ok(()),
            TeamRole::User => Err(AccessError::AdminRequired {
                team_id: team_id.clone(),
            }),
        }
    }
}

/// Authenticated caller lacking the role an operation needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("not a member of team {team_id}")]
    NotAMember { team_id: TeamId },
    #[error("team {team_id} admin role required")]
    AdminRequired { team_id: TeamId },
}

/// A freshly sealed session and the cookie value that carries it.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub session: Session,
    pub cookie_value: String,
}

/// One year; longer lifetimes are clamped.
const MAX_TTL_HOURS: u64 = 24 * 366;

/// Owns the sealing key and cookie attributes. Built once from configuration
/// and shared by every router.
#[derive(Debug)]
pub struct SessionManager {
    sealer: SessionSealer,
    verifier: AssertionVerifier,
    cookie: CookieSettings,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        let ttl = Duration::hours(config.ttl_hours.min(MAX_TTL_HOURS) as i64);
        Self {
            sealer: SessionSealer::new(&config.secret),
            verifier: AssertionVerifier::new(&config.sso_secret),
            cookie: CookieSettings {
                name: config.cookie_name.clone(),
                secure: config.secure_cookie,
                max_age_secs: ttl.num_seconds(),
            },
            ttl,
        }
    }

    /// Completes the SSO handshake: maps groups onto team roles and seals the result.
    pub fn establish(
        &self,
        assertion: SsoAssertion,
        teams: &[Team],
        now: DateTime<Utc>,
    ) -> Result<EstablishedSession, SessionError> {
        let assertion = assertion.validate()?;
        let permissions = permissions_for(&assertion.groups, teams);
        let session = Session {
            user: SessionUser {
                first_name: assertion.first_name,
                last_name: assertion.last_name,
                email: assertion.email,
                ads_id: assertion.ads_id,
            },
            permissions,
            expires_at: (now + self.ttl).timestamp_millis(),
        };
        let cookie_value = self.sealer.seal(&session)?;
        Ok(EstablishedSession {
            session,
            cookie_value,
        })
    }

    /// Establishes a session from a gateway-relayed body, refusing anything
    /// not signed with the shared SSO secret.
    pub fn establish_signed(
        &self,
        body: &[u8],
        signature: Option<&str>,
        teams: &[Team],
        now: DateTime<Utc>,
    ) -> Result<EstablishedSession, SessionError> {
        let assertion = self.verifier.verify(body, signature)?;
        self.establish(assertion, teams, now)
    }

    /// Signature a trusted gateway attaches to `body`.
    pub fn sign_assertion(&self, body: &[u8]) -> Result<String, SessionError> {
        self.verifier.sign(body)
    }

    pub fn authenticate(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let value = read_cookie(headers, &self.cookie.name).ok_or(SessionError::Missing)?;
        self.sealer.unseal(value, now)
    }

    pub fn set_cookie(&self, value: &str) -> String {
        self.cookie.set_header(value)
    }

    pub fn clear_cookie(&self) -> String {
        self.cookie.clear_header()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.name
    }
}
