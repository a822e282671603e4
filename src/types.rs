//! Shared types for the TinyVerse agent.
//!
//! Sessions, galaxy ids, the per-session `ActionResult`, the typed
//! response bodies of the three game endpoints, and the domain errors.

use serde::Deserialize;
use std::fmt;

/// Decoded JSON object returned by the game API.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Number of leading characters of a session token kept in logs.
const SESSION_VISIBLE_CHARS: usize = 6;

/// Pre-captured session token for one game account.
///
/// `Display` and `Debug` print a masked form so the token never lands
/// in logs verbatim. Use [`Session::as_str`] when the raw value is needed
/// on the wire.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Session(String);

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First few characters followed by an ellipsis.
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(SESSION_VISIBLE_CHARS).collect();
        if visible.len() < self.0.len() {
            format!("{visible}…")
        } else {
            visible
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.masked())
    }
}

/// Purchase target paired by position with a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GalaxyId(String);

impl GalaxyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GalaxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Per-session outcome
// ---------------------------------------------------------------------------

/// Outcome of one API call for one session.
#[derive(Debug)]
pub enum ActionResult<T> {
    Success {
        payload: T,
        session: Session,
        galaxy_id: Option<GalaxyId>,
    },
    Failure {
        error: ApiError,
        session: Session,
        galaxy_id: Option<GalaxyId>,
    },
}

impl<T> ActionResult<T> {
    /// Tag a call result with the session (and galaxy) it was made for.
    pub fn from_call(
        result: Result<T, ApiError>,
        session: Session,
        galaxy_id: Option<GalaxyId>,
    ) -> Self {
        match result {
            Ok(payload) => ActionResult::Success { payload, session, galaxy_id },
            Err(error) => ActionResult::Failure { error, session, galaxy_id },
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            ActionResult::Success { session, .. } | ActionResult::Failure { session, .. } => session,
        }
    }

    pub fn galaxy_id(&self) -> Option<&GalaxyId> {
        match self {
            ActionResult::Success { galaxy_id, .. } | ActionResult::Failure { galaxy_id, .. } => {
                galaxy_id.as_ref()
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ActionResult::Success { payload, .. } => Some(payload),
            ActionResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ActionResult::Success { .. } => None,
            ActionResult::Failure { error, .. } => Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint responses
// ---------------------------------------------------------------------------

/// `/galaxy/collect` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectResponse {
    pub response: CollectBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectBody {
    /// `1` when the collection went through.
    pub success: f64,
    /// Stardust collected. Absent on unsuccessful collections.
    #[serde(default)]
    pub dust: Option<f64>,
}

impl CollectResponse {
    /// Collected stardust, if the collection succeeded and reported an amount.
    pub fn collected_dust(&self) -> Option<f64> {
        if self.response.success == 1.0 {
            self.response.dust
        } else {
            None
        }
    }
}

/// `/user/info` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
    pub response: UserStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserStats {
    pub dust: f64,
    pub stars: f64,
    pub stars_max: f64,
}

/// `/stars/create` response.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseResponse {
    pub response: PurchaseBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseBody {
    /// Id of the created stars; only present when the purchase went through.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl PurchaseResponse {
    pub fn is_confirmed(&self) -> bool {
        self.response.id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure of a single call to the game API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any HTTP status other than 200.
    #[error("unexpected status: {0}")]
    RemoteStatus(String),

    /// Malformed JSON or a missing/mis-typed field.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Galaxy ids and sessions must pair up one to one before buying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("length of galaxy ids ({galaxy_ids}) must match number of sessions ({sessions})")]
pub struct CardinalityMismatch {
    pub galaxy_ids: usize,
    pub sessions: usize,
}

/// A notification could not be delivered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
