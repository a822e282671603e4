//! Session fan-out.
//!
//! Runs one game action for every configured session and returns the
//! per-session outcomes in session order. Calls for different sessions are
//! issued concurrently; one session failing never stops the others.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{self, form, GameApi};
use crate::types::{
    ActionResult, CardinalityMismatch, CollectResponse, GalaxyId, PurchaseResponse, Session,
    UserInfoResponse,
};

/// Fans game actions out over a fixed, ordered set of sessions.
pub struct SessionFanOut {
    api: Arc<dyn GameApi>,
    sessions: Vec<Session>,
}

impl SessionFanOut {
    pub fn new(api: Arc<dyn GameApi>, sessions: Vec<Session>) -> Self {
        Self { api, sessions }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Collect stardust for every session.
    ///
    /// Every session yields an entry; failed calls come back as
    /// [`ActionResult::Failure`].
    pub async fn collect_all(&self) -> Vec<ActionResult<CollectResponse>> {
        let calls = self.sessions.iter().map(|session| async move {
            let fields = form([("session", session.as_str())]);
            let result = api::post_typed(&*self.api, api::GALAXY_COLLECT, &fields).await;
            if let Err(ref e) = result {
                debug!(session = %session, error = %e, "Collect call failed");
            }
            ActionResult::from_call(result, session.clone(), None)
        });

        join_all(calls).await
    }

    /// Fetch account statistics for every session.
    ///
    /// Sessions whose call fails are logged and left out of the result
    /// rather than reported as failures.
    pub async fn check_stats_all(&self) -> Vec<ActionResult<UserInfoResponse>> {
        let calls = self.sessions.iter().map(|session| async move {
            let fields = form([("session", session.as_str())]);
            match api::post_typed(&*self.api, api::USER_INFO, &fields).await {
                Ok(payload) => Some(ActionResult::Success {
                    payload,
                    session: session.clone(),
                    galaxy_id: None,
                }),
                Err(e) => {
                    warn!(session = %session, error = %e, "Error checking stats");
                    None
                }
            }
        });

        join_all(calls).await.into_iter().flatten().collect()
    }

    /// Buy `stars` stars for each session in the galaxy at the same index.
    ///
    /// Fails before any call is made unless there is exactly one galaxy id
    /// per session.
    pub async fn buy_stars_all(
        &self,
        galaxy_ids: &[GalaxyId],
        stars: u32,
    ) -> Result<Vec<ActionResult<PurchaseResponse>>, CardinalityMismatch> {
        if galaxy_ids.len() != self.sessions.len() {
            return Err(CardinalityMismatch {
                galaxy_ids: galaxy_ids.len(),
                sessions: self.sessions.len(),
            });
        }

        let stars = stars.to_string();
        let stars = stars.as_str();
        let calls = self
            .sessions
            .iter()
            .zip(galaxy_ids)
            .map(|(session, galaxy_id)| async move {
                let fields = form([
                    ("galaxy_id", galaxy_id.as_str()),
                    ("session", session.as_str()),
                    ("stars", stars),
                ]);
                let result = api::post_typed(&*self.api, api::STARS_CREATE, &fields).await;
                if let Err(ref e) = result {
                    debug!(session = %session, galaxy_id = %galaxy_id, error = %e, "Purchase call failed");
                }
                ActionResult::from_call(result, session.clone(), Some(galaxy_id.clone()))
            });

        Ok(join_all(calls).await)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
