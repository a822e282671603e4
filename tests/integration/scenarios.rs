//! Multi-tick scenarios driving the agent against scripted collaborators.

use serde_json::json;
use std::sync::Arc;

use tinyverse::api::{GALAXY_COLLECT, STARS_CREATE, USER_INFO};
use tinyverse::engine::{Agent, AgentSettings, SessionFanOut, ToleranceBounds};
use tinyverse::types::{ApiError, GalaxyId, Session};

use crate::mock_api::{RecordingNotifier, ScriptedApi};

const CHAT_ID: i64 = 777;

fn settings(stats_per_request: u32, auto_buy: bool) -> AgentSettings {
    AgentSettings {
        tolerance: ToleranceBounds::new(3600, 4200).unwrap(),
        stats_per_request,
        auto_buy,
        stars_count: 100,
        chat_id: CHAT_ID,
    }
}

fn agent(
    api: &ScriptedApi,
    notifier: &Arc<RecordingNotifier>,
    sessions: &[&str],
    galaxy_ids: &[&str],
    settings: AgentSettings,
) -> Agent {
    let sessions = sessions.iter().map(|s| Session::new(*s)).collect();
    let galaxy_ids = galaxy_ids.iter().map(|g| GalaxyId::new(*g)).collect();
    Agent::new(
        SessionFanOut::new(Arc::new(api.clone()), sessions),
        notifier.clone(),
        galaxy_ids,
        settings,
    )
}

#[tokio::test]
async fn test_one_session_collects_other_fails() {
    let api = ScriptedApi::new();
    api.reply(GALAXY_COLLECT, "A", Ok(json!({"response": {"success": 1, "dust": 42}})))
        .reply(GALAXY_COLLECT, "B", Err(ApiError::Transport("connection reset".into())));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut agent = agent(&api, &notifier, &["A", "B"], &["g1", "g2"], settings(6, false));

    let summary = agent.tick().await;

    assert_eq!(summary.collected, 1);
    assert_eq!(summary.collect_failures, 1);
    assert_eq!(summary.stats_reported, None);
    assert_eq!(notifier.texts(), vec!["🌌 Successfully collected 42 stardust"]);
    assert_eq!(notifier.chat_ids(), vec![CHAT_ID]);
    assert_eq!(api.calls_to(GALAXY_COLLECT).len(), 2);
    assert!(api.calls_to(STARS_CREATE).is_empty());
}

#[tokio::test]
async fn test_auto_buy_mismatch_warns_without_purchasing() {
    let api = ScriptedApi::new();
    api.reply(GALAXY_COLLECT, "A", Ok(json!({"response": {"success": 0}})))
        .reply(GALAXY_COLLECT, "B", Ok(json!({"response": {"success": 0}})));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut agent = agent(&api, &notifier, &["A", "B"], &["g1"], settings(6, true));

    let summary = agent.tick().await;

    assert!(summary.purchase_skipped);
    assert_eq!(summary.purchases_attempted, None);
    assert_eq!(notifier.texts(), vec!["⚠️ Mismatch: 1 galaxyIDs but 2 sessions"]);
    assert!(api.calls_to(STARS_CREATE).is_empty());
}

#[tokio::test]
async fn test_auto_buy_reports_each_session() {
    let api = ScriptedApi::new();
    for s in ["A", "B", "C"] {
        api.reply(GALAXY_COLLECT, s, Ok(json!({"response": {"success": 0}})));
    }
    api.reply(STARS_CREATE, "A", Ok(json!({"response": {"id": 9001}})))
        .reply(STARS_CREATE, "B", Ok(json!({"response": {}})))
        .reply(STARS_CREATE, "C", Ok(json!({"error": "no stars"})));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut agent = agent(&api, &notifier, &["A", "B", "C"], &["g1", "g2", "g3"], settings(6, true));

    let summary = agent.tick().await;

    assert_eq!(summary.purchases_attempted, Some(3));
    assert_eq!(summary.purchases_confirmed, 1);
    assert_eq!(
        notifier.texts(),
        vec![
            "✅ Successful purchase: SessionId 0",
            "❌ Purchase error: SessionId 1",
            "⚠️ Session 2: Unexpected response format",
        ]
    );

    let purchases = api.calls_to(STARS_CREATE);
    assert_eq!(purchases.len(), 3);
    for call in &purchases {
        assert_eq!(call.form["stars"], "100");
    }
    let pairs: Vec<(&str, &str)> = purchases
        .iter()
        .map(|c| (c.form["session"].as_str(), c.form["galaxy_id"].as_str()))
        .collect();
    assert!(pairs.contains(&("A", "g1")));
    assert!(pairs.contains(&("B", "g2")));
    assert!(pairs.contains(&("C", "g3")));
}

#[tokio::test]
async fn test_statistics_every_third_tick() {
    let api = ScriptedApi::new();
    api.reply(GALAXY_COLLECT, "A", Ok(json!({"response": {"success": 0}})))
        .reply(USER_INFO, "A", Ok(json!({"response": {"dust": 1500, "stars": 12, "stars_max": 40}})));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut agent = agent(&api, &notifier, &["A"], &["g1"], settings(3, false));

    let mut reported = Vec::new();
    for _ in 0..7 {
        let summary = agent.tick().await;
        reported.push(summary.stats_reported.is_some());
    }

    assert_eq!(reported, vec![false, false, true, false, false, true, false]);
    assert_eq!(api.calls_to(USER_INFO).len(), 2);
    assert_eq!(
        notifier.texts(),
        vec![
            "📊 User Statistics\n\t- Stardust: 1500\n\t- Stars: 12 / 40",
            "📊 User Statistics\n\t- Stardust: 1500\n\t- Stars: 12 / 40",
        ]
    );
    assert_eq!(agent.state().tick_count, 7);
}

#[tokio::test]
async fn test_failed_stats_session_is_skipped() {
    let api = ScriptedApi::new();
    api.reply(GALAXY_COLLECT, "A", Ok(json!({"response": {"success": 0}})))
        .reply(GALAXY_COLLECT, "B", Ok(json!({"response": {"success": 0}})))
        .reply(USER_INFO, "A", Err(ApiError::RemoteStatus("401 Unauthorized".into())))
        .reply(USER_INFO, "B", Ok(json!({"response": {"dust": 7, "stars": 1, "stars_max": 2}})));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut agent = agent(&api, &notifier, &["A", "B"], &["g1", "g2"], settings(1, false));

    let summary = agent.tick().await;

    assert_eq!(summary.stats_reported, Some(1));
    assert_eq!(notifier.texts(), vec!["📊 User Statistics\n\t- Stardust: 7\n\t- Stars: 1 / 2"]);
}

#[tokio::test]
async fn test_every_call_carries_its_session() {
    let api = ScriptedApi::new();
    for s in ["s1", "s2", "s3"] {
        api.reply(GALAXY_COLLECT, s, Ok(json!({"response": {"success": 1, "dust": 1}})));
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let mut agent = agent(&api, &notifier, &["s1", "s2", "s3"], &["g"], settings(6, false));

    agent.tick().await;

    let mut seen: Vec<String> = api
        .calls_to(GALAXY_COLLECT)
        .into_iter()
        .map(|c| c.form["session"].clone())
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["s1", "s2", "s3"]);
    assert_eq!(notifier.texts().len(), 3);
}
