//! Notification texts.

use crate::types::{ActionResult, ApiError, CardinalityMismatch, PurchaseResponse, UserStats};

pub const STARTED: &str = "🤖 Bot started!";

pub fn collected(dust: f64) -> String {
    format!("🌌 Successfully collected {dust} stardust")
}

pub fn statistics(stats: &UserStats) -> String {
    format!(
        "📊 User Statistics\n\t- Stardust: {}\n\t- Stars: {} / {}",
        stats.dust, stats.stars, stats.stars_max
    )
}

pub fn cardinality_warning(err: &CardinalityMismatch) -> String {
    format!(
        "⚠️ Mismatch: {} galaxyIDs but {} sessions",
        err.galaxy_ids, err.sessions
    )
}

/// Per-session purchase line; `index` is the session's position.
pub fn purchase(index: usize, result: &ActionResult<PurchaseResponse>) -> String {
    match result {
        ActionResult::Success { payload, .. } if payload.is_confirmed() => {
            format!("✅ Successful purchase: SessionId {index}")
        }
        ActionResult::Success { .. } => format!("❌ Purchase error: SessionId {index}"),
        ActionResult::Failure { error: ApiError::Decode(_), .. } => {
            format!("⚠️ Session {index}: Unexpected response format")
        }
        ActionResult::Failure { .. } => format!("❌ SessionId {index}: Error buying stars"),
    }
}
