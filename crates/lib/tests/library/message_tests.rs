//! Forced refresh over the control channel.

use reqwest::StatusCode;
use serde_json::json;

use swcache_lib::engine::MessageOutcome;

use super::common::{Harness, ok, status};

const SHELL: &[&str] = &["/index.html"];
const DYNAMIC: &[&str] = &["/img/a.png", "/js/plugins.js", "/data/Map001.json"];

async fn installed() -> Harness {
  let h = Harness::new(SHELL, DYNAMIC);
  h.activate().await;
  for path in DYNAMIC {
    h.net.route(path, ok(&format!("{path} v2")));
  }
  h
}

#[tokio::test]
async fn refresh_overwrites_everything_outside_the_volatile_prefix() {
  let h = installed().await;

  let report = h.agent.refresh().await;

  assert_eq!(report.refreshed, 2);
  assert_eq!(report.skipped_volatile, 1);
  assert!(report.failed.is_empty());
  assert_eq!(h.cached("/img/a.png").await.unwrap().body.as_ref(), b"/img/a.png v2");
  assert_eq!(h.cached("/js/plugins.js").await.unwrap().body.as_ref(), b"/js/plugins.js v2");
  assert_eq!(
    h.cached("/data/Map001.json").await.unwrap().body.as_ref(),
    b"/data/Map001.json"
  );
}

#[tokio::test]
async fn failed_refresh_keeps_the_previous_copy() {
  let h = installed().await;
  h.net.route("/img/a.png", status(StatusCode::INTERNAL_SERVER_ERROR));

  let report = h.agent.refresh().await;

  assert_eq!(report.refreshed, 1);
  assert_eq!(report.failed.len(), 1);
  assert_eq!(report.failed[0].as_str(), "/img/a.png");
  assert_eq!(h.cached("/img/a.png").await.unwrap().body.as_ref(), b"/img/a.png");
}

#[tokio::test]
async fn refresh_message_schedules_background_refresh() {
  let h = installed().await;

  let outcome = h.agent.handle_message(&json!({ "action": "UPDATE_CACHE" }));

  assert_eq!(outcome, MessageOutcome::RefreshScheduled);
  assert!(h.eventually_cached("/js/plugins.js", "/js/plugins.js v2").await);
}

#[tokio::test]
async fn other_messages_are_ignored() {
  let h = installed().await;

  for message in [
    json!({ "action": "SOMETHING_ELSE" }),
    json!({ "type": "UPDATE_CACHE" }),
    json!("UPDATE_CACHE"),
    json!(null),
  ] {
    assert_eq!(h.agent.handle_message(&message), MessageOutcome::Ignored, "{message}");
  }
}

#[tokio::test]
async fn refresh_before_install_is_ignored() {
  let h = Harness::new(SHELL, DYNAMIC);

  let outcome = h.agent.handle_message(&json!({ "action": "UPDATE_CACHE" }));

  assert_eq!(outcome, MessageOutcome::Ignored);
  assert!(h.net.calls().is_empty());
}
