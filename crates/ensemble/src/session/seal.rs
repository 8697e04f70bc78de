use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

use super::Session;
use crate::validation::ValidationError;

const NONCE_LEN: usize = 12;

/// Why a cookie could not be turned into a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session cookie")]
    Missing,
    #[error("session cookie is malformed")]
    Malformed,
    #[error("session cookie failed authentication")]
    Tampered,
    #[error("session has expired")]
    Expired,
    #[error("SSO assertion is not signed")]
    Unsigned,
    #[error("SSO assertion signature does not match")]
    BadSignature,
    #[error("invalid SSO assertion: {0}")]
    Assertion(#[from] ValidationError),
    #[error("session could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session could not be sealed")]
    Seal,
}

/// Encrypts sessions with ChaCha20-Poly1305 under a key derived from the
/// configured secret. Output is `hex(nonce || ciphertext)`.
pub struct SessionSealer {
    cipher: ChaCha20Poly1305,
}

impl fmt::Debug for SessionSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSealer").finish_non_exhaustive()
    }
}

impl SessionSealer {
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&digest)),
        }
    }

    pub fn seal(&self, session: &Session) -> Result<String, SessionError> {
        let plaintext = serde_json::to_vec(session)?;
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| SessionError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    pub fn unseal(&self, value: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let bytes = hex::decode(value.trim()).map_err(|_| SessionError::Malformed)?;
        if bytes.len() <= NONCE_LEN {
            return Err(SessionError::Malformed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SessionError::Tampered)?;
        let session: Session =
            serde_json::from_slice(&plaintext).map_err(|_| SessionError::Malformed)?;

        if session.is_expired(now) {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TeamId;
    use crate::session::{SessionUser, TeamPermission, TeamRole};
    use chrono::{Duration, TimeZone};

    const SECRET: &str = "unit-test-secret-with-enough-characters";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap()
    }

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            user: SessionUser {
                first_name: "Lee".to_string(),
                last_name: "Park".to_string(),
                email: "lee.park@example.com".to_string(),
                ads_id: "lpark".to_string(),
            },
            permissions: vec![TeamPermission {
                team_id: TeamId("team-000001".to_string()),
                team_name: "Payments".to_string(),
                role: TeamRole::User,
            }],
            expires_at: expires_at.timestamp_millis(),
        }
    }

    #[test]
    fn sealed_cookie_opens_until_expiry() {
        let sealer = SessionSealer::new(SECRET);
        let original = session(now() + Duration::hours(1));
        let cookie = sealer.seal(&original).expect("seals");

        let opened = sealer.unseal(&cookie, now()).expect("unseals");
        assert_eq!(opened, original);

        let later = now() + Duration::hours(1);
        assert!(matches!(
            sealer.unseal(&cookie, later),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn sealing_twice_uses_fresh_nonces() {
        let sealer = SessionSealer::new(SECRET);
        let original = session(now() + Duration::hours(1));
        assert_ne!(
            sealer.seal(&original).expect("seals"),
            sealer.seal(&original).expect("seals")
        );
    }

    #[test]
    fn flipped_byte_is_rejected() {
        let sealer = SessionSealer::new(SECRET);
        let cookie = sealer
            .seal(&session(now() + Duration::hours(1)))
            .expect("seals");
        let mut bytes = hex::decode(&cookie).expect("hex");
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert!(matches!(
            sealer.unseal(&hex::encode(bytes), now()),
            Err(SessionError::Tampered)
        ));
    }

    #[test]
    fn other_secret_cannot_open_cookie() {
        let cookie = SessionSealer::new(SECRET)
            .seal(&session(now() + Duration::hours(1)))
            .expect("seals");
        let other = SessionSealer::new("a-different-secret-of-sufficient-length");
        assert!(matches!(
            other.unseal(&cookie, now()),
            Err(SessionError::Tampered)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let sealer = SessionSealer::new(SECRET);
        assert!(matches!(
            sealer.unseal("not-hex", now()),
            Err(SessionError::Malformed)
        ));
        assert!(matches!(
            sealer.unseal("abcd", now()),
            Err(SessionError::Malformed)
        ));
    }
}
