//! The agent loop.
//!
//! One tick: collect stardust for every session, report statistics every
//! `stats_per_request` ticks, optionally auto-buy stars, then sleep for a
//! random pause inside the tolerance bounds. Ticks never overlap and a
//! failing session or notification never ends the loop.

use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::fanout::SessionFanOut;
use super::report;
use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::types::{ActionResult, GalaxyId};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Inclusive bounds of the random pause between ticks, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceBounds {
    from_secs: u64,
    to_secs: u64,
}

impl ToleranceBounds {
    pub fn new(from_secs: u64, to_secs: u64) -> Result<Self> {
        if from_secs > to_secs {
            bail!("tolerance lower bound {from_secs}s exceeds upper bound {to_secs}s");
        }
        Ok(Self { from_secs, to_secs })
    }

    pub fn from_secs(&self) -> u64 {
        self.from_secs
    }

    pub fn to_secs(&self) -> u64 {
        self.to_secs
    }

    /// Uniformly random pause in `[from, to]`, both ends included.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(rng.gen_range(self.from_secs..=self.to_secs))
    }
}

/// Immutable knobs of the agent loop.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub tolerance: ToleranceBounds,
    pub stats_per_request: u32,
    pub auto_buy: bool,
    pub stars_count: u32,
    /// Notification destination.
    pub chat_id: i64,
}

impl AgentSettings {
    pub fn from_config(cfg: &AppConfig, chat_id: i64) -> Result<Self> {
        Ok(Self {
            tolerance: ToleranceBounds::new(
                cfg.agent.tolerance_from_secs,
                cfg.agent.tolerance_to_secs,
            )?,
            stats_per_request: cfg.agent.stats_per_request,
            auto_buy: cfg.stars.auto_buy,
            stars_count: cfg.stars.count,
            chat_id,
        })
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable loop state, owned by the [`Agent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    /// Ticks left until the next statistics report.
    pub stats_countdown: i64,
    /// Value the countdown is reset to after each report.
    pub stats_countdown_base: i64,
    pub tick_count: u64,
}

impl AgentState {
    pub fn new(stats_per_request: u32) -> Self {
        Self {
            stats_countdown: i64::from(stats_per_request),
            stats_countdown_base: i64::from(stats_per_request),
            tick_count: 0,
        }
    }

    /// Count one tick; true when a statistics report is due.
    pub fn stats_due(&mut self) -> bool {
        self.stats_countdown -= 1;
        self.stats_countdown <= 0
    }

    pub fn reset_stats_countdown(&mut self) {
        self.stats_countdown = self.stats_countdown_base;
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Sessions whose collection was notified.
    pub collected: usize,
    pub collect_failures: usize,
    /// Sessions included in the statistics report, if one ran.
    pub stats_reported: Option<usize>,
    /// Purchase calls made, if auto-buy ran.
    pub purchases_attempted: Option<usize>,
    pub purchases_confirmed: usize,
    /// Auto-buy was due but galaxies and sessions did not pair up.
    pub purchase_skipped: bool,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

pub struct Agent {
    fanout: SessionFanOut,
    notifier: Arc<dyn Notifier>,
    galaxy_ids: Vec<GalaxyId>,
    settings: AgentSettings,
    state: AgentState,
}

impl Agent {
    pub fn new(
        fanout: SessionFanOut,
        notifier: Arc<dyn Notifier>,
        galaxy_ids: Vec<GalaxyId>,
        settings: AgentSettings,
    ) -> Self {
        let state = AgentState::new(settings.stats_per_request);
        Self {
            fanout,
            notifier,
            galaxy_ids,
            settings,
            state,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Run until the process is stopped.
    pub async fn run(&mut self) {
        self.notify(report::STARTED).await;

        loop {
            let tick = self.tick().await;
            log_tick_report(&tick);

            let pause = self.next_pause();
            let next_tick = wake_time(pause)
                .map(|at| at.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "far future".to_string());
            info!(
                sleep_secs = pause.as_secs(),
                next_tick = %next_tick,
                "Sleeping until next tick"
            );
            tokio::time::sleep(pause).await;
        }
    }

    /// Run one tick without the trailing pause.
    pub async fn tick(&mut self) -> TickReport {
        self.state.tick_count += 1;
        let mut summary = TickReport {
            tick: self.state.tick_count,
            ..TickReport::default()
        };
        debug!(tick = summary.tick, "Starting tick");

        self.collect_stardust(&mut summary).await;

        if self.state.stats_due() {
            self.report_statistics(&mut summary).await;
            self.state.reset_stats_countdown();
        }

        if self.settings.auto_buy {
            self.attempt_auto_buy(&mut summary).await;
        }

        summary
    }

    pub fn next_pause(&self) -> Duration {
        self.settings.tolerance.sample(&mut rand::thread_rng())
    }

    async fn collect_stardust(&self, summary: &mut TickReport) {
        for result in self.fanout.collect_all().await {
            match result {
                ActionResult::Failure { error, session, .. } => {
                    summary.collect_failures += 1;
                    warn!(session = %session, error = %error, "Error collecting stardust");
                }
                ActionResult::Success { payload, session, .. } => match payload.collected_dust() {
                    Some(dust) => {
                        info!(session = %session, dust, "Stardust collected");
                        self.notify(&report::collected(dust)).await;
                        summary.collected += 1;
                    }
                    None => {
                        warn!(
                            session = %session,
                            success = payload.response.success,
                            dust = ?payload.response.dust,
                            "Stardust collection not successful"
                        );
                    }
                },
            }
        }
    }

    async fn report_statistics(&self, summary: &mut TickReport) {
        let results = self.fanout.check_stats_all().await;

        for result in &results {
            let Some(payload) = result.payload() else {
                continue;
            };
            info!(
                session = %result.session(),
                dust = payload.response.dust,
                stars = payload.response.stars,
                stars_max = payload.response.stars_max,
                "User statistics"
            );
            self.notify(&report::statistics(&payload.response)).await;
        }

        summary.stats_reported = Some(results.len());
    }

    async fn attempt_auto_buy(&self, summary: &mut TickReport) {
        let results = match self
            .fanout
            .buy_stars_all(&self.galaxy_ids, self.settings.stars_count)
            .await
        {
            Ok(results) => results,
            Err(mismatch) => {
                warn!(
                    galaxy_ids = mismatch.galaxy_ids,
                    sessions = mismatch.sessions,
                    "Galaxy ids do not pair with sessions, skipping purchase"
                );
                self.notify(&report::cardinality_warning(&mismatch)).await;
                summary.purchase_skipped = true;
                return;
            }
        };

        for (index, result) in results.iter().enumerate() {
            if let Some(error) = result.error() {
                warn!(session = %result.session(), error = %error, "Error buying stars");
            }
            if result.payload().is_some_and(|p| p.is_confirmed()) {
                summary.purchases_confirmed += 1;
            }

            let text = report::purchase(index, result);
            info!(session = %result.session(), text = %text, "Purchase result");
            self.notify(&text).await;
        }

        summary.purchases_attempted = Some(results.len());
    }

    /// Deliver a notification; failures are logged and otherwise ignored.
    async fn notify(&self, text: &str) {
        debug!(sink = self.notifier.name(), text, "Sending notification");
        if let Err(e) = self.notifier.send(self.settings.chat_id, text).await {
            warn!(sink = self.notifier.name(), error = %e, "Failed to send notification");
        }
    }
}

/// Local time after `pause`, or `None` when it is past chrono's range.
fn wake_time(pause: Duration) -> Option<DateTime<Local>> {
    let delta = chrono::Duration::from_std(pause).ok()?;
    Local::now().checked_add_signed(delta)
}

/// Log a one-line tick summary.
fn log_tick_report(report: &TickReport) {
    info!(
        tick = report.tick,
        collected = report.collected,
        collect_failures = report.collect_failures,
        stats_reported = ?report.stats_reported,
        purchases = ?report.purchases_attempted,
        confirmed = report.purchases_confirmed,
        purchase_skipped = report.purchase_skipped,
        "Tick complete"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
