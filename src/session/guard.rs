use thiserror::Error;

use super::claims::{decode_token, Claims};
use super::store::{SessionStore, TOKEN_KEY};
use super::{HOME_PATH, LOGIN_PATH};

/// Why a viewer may not stay on a gated page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no session token stored")]
    NoToken,

    #[error("session token has expired")]
    ExpiredToken,

    #[error("session token could not be decoded")]
    InvalidToken,

    #[error("role {actual} may not view a page requiring role {required}")]
    RoleMismatch { required: i64, actual: i64 },
}

/// Outcome of a page gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Allow,
    Redirect(String),
}

impl Action {
    pub fn redirect(path: impl Into<String>) -> Self {
        Action::Redirect(path.into())
    }
}

/// Source of wall-clock time in Unix seconds.
pub trait Clock {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Gates pages on the token held in a [`SessionStore`].
///
/// The guard never caches a decision: every call reads the store again, so a
/// token replaced between two checks is always the one evaluated.
pub struct SessionGuard<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SessionStore> SessionGuard<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: SessionStore, C: Clock> SessionGuard<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the gate's decision table and returns the viewer's claims when
    /// the page may be rendered.
    ///
    /// Only an expired token is cleared from the store. An undecodable one
    /// is left in place and reported as [`SessionError::InvalidToken`].
    pub fn authorize(&self, required_role_id: i64) -> Result<Claims, SessionError> {
        self.authorize_stored(required_role_id).map(|(_, claims)| claims)
    }

    fn authorize_stored(&self, required_role_id: i64) -> Result<(String, Claims), SessionError> {
        let token = self.store.get(TOKEN_KEY).ok_or(SessionError::NoToken)?;
        let claims = decode_token(&token)?;

        if claims.is_expired_at(self.clock.now()) {
            self.store.clear(TOKEN_KEY);
            return Err(SessionError::ExpiredToken);
        }

        // Administrators bypass every role check.
        if claims.role().is_admin() || claims.role_id == required_role_id {
            return Ok((token, claims));
        }

        Err(SessionError::RoleMismatch {
            required: required_role_id,
            actual: claims.role_id,
        })
    }

    pub fn check_access(&self, required_role_id: i64, fallback_path: &str) -> Action {
        match self.admit(required_role_id, fallback_path) {
            Ok(_) => Action::Allow,
            Err(path) => Action::Redirect(path),
        }
    }

    /// Same decision as [`check_access`](Self::check_access): an allowed
    /// viewer comes back as the token and claims the decision was made on,
    /// anyone else as the path to redirect to.
    pub fn admit(
        &self,
        required_role_id: i64,
        fallback_path: &str,
    ) -> Result<(String, Claims), String> {
        match self.authorize_stored(required_role_id) {
            Ok((token, claims)) => {
                tracing::debug!(
                    user_id = claims.user_id,
                    role_id = claims.role_id,
                    required_role_id,
                    "Access granted"
                );
                Ok((token, claims))
            }
            Err(SessionError::RoleMismatch { required, actual }) => {
                tracing::info!(
                    required_role_id = required,
                    role_id = actual,
                    fallback = fallback_path,
                    "Role mismatch, redirecting to fallback"
                );
                Err(fallback_path.to_string())
            }
            Err(err) => {
                if err == SessionError::InvalidToken {
                    tracing::warn!("Stored session token is undecodable");
                } else {
                    tracing::debug!(reason = %err, "Redirecting to login");
                }
                Err(LOGIN_PATH.to_string())
            }
        }
    }

    /// True for a present, decodable administrator token.
    ///
    /// Expiry is deliberately not consulted: this only picks navigation
    /// variants, and an expired admin token still reports `true` here while
    /// [`check_access`](Self::check_access) redirects.
    pub fn is_administrator(&self) -> bool {
        self.current_claims()
            .map(|claims| claims.role().is_admin())
            .unwrap_or(false)
    }

    /// Decoded claims of the stored token, ignoring expiry.
    pub fn current_claims(&self) -> Option<Claims> {
        self.store
            .get(TOKEN_KEY)
            .and_then(|token| decode_token(&token).ok())
    }

    pub fn logout(&self) -> Action {
        self.store.clear(TOKEN_KEY);
        tracing::info!("Session cleared on logout");
        Action::redirect(HOME_PATH)
    }
}
