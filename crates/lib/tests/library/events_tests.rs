//! Event loop dispatch.

use serde_json::json;

use swcache_lib::engine::{AgentEvent, EngineError, EventOutcome, Lifecycle, MessageOutcome, event_loop};

use super::common::{Harness, get};

#[tokio::test]
async fn events_drive_the_full_lifecycle() {
  let h = Harness::new(&["/index.html"], &["/img/a.png"]);
  let (events, handle) = event_loop(h.agent.clone());
  let runner = tokio::spawn(events.run());

  let installed = handle.dispatch(AgentEvent::Install).await.unwrap();
  assert!(matches!(installed, EventOutcome::Installed(ref r) if r.shell_cached == 1));

  let activated = handle.dispatch(AgentEvent::Activate).await.unwrap();
  assert!(matches!(activated, EventOutcome::Activated(_)));
  assert_eq!(h.agent.lifecycle(), Lifecycle::Active);

  h.net.set_online(false);
  let EventOutcome::Fetched(outcome) = handle.dispatch(AgentEvent::Fetch(get("/img/a.png"))).await.unwrap() else {
    panic!("expected a fetch outcome");
  };
  assert_eq!(outcome.response().unwrap().body.as_ref(), b"/img/a.png");

  let messaged = handle
    .dispatch(AgentEvent::Message(json!({ "action": "noop" })))
    .await
    .unwrap();
  assert!(matches!(messaged, EventOutcome::Messaged(MessageOutcome::Ignored)));

  drop(handle);
  runner.await.unwrap();
}

#[tokio::test]
async fn fetch_queued_behind_install_and_activate_sees_active_agent() {
  let h = Harness::new(&["/index.html"], &[]);
  let (events, handle) = event_loop(h.agent.clone());
  tokio::spawn(events.run());

  let (install, activate, fetch) = tokio::join!(
    handle.dispatch(AgentEvent::Install),
    handle.dispatch(AgentEvent::Activate),
    handle.dispatch(AgentEvent::Fetch(get("/index.html"))),
  );

  install.unwrap();
  activate.unwrap();
  let EventOutcome::Fetched(outcome) = fetch.unwrap() else {
    panic!("expected a fetch outcome");
  };
  assert_eq!(outcome.response().unwrap().body.as_ref(), b"/index.html");
}

#[tokio::test]
async fn failed_transition_is_reported_to_the_caller() {
  let h = Harness::new(&["/index.html"], &[]);
  let (events, handle) = event_loop(h.agent.clone());
  tokio::spawn(events.run());

  let err = handle.dispatch(AgentEvent::Activate).await.unwrap_err();

  assert!(matches!(err, EngineError::InvalidTransition { .. }));
}

#[tokio::test]
async fn dispatch_after_shutdown_is_closed() {
  let h = Harness::new(&["/index.html"], &[]);
  let (events, handle) = event_loop(h.agent.clone());
  drop(events);

  let err = handle.dispatch(AgentEvent::Install).await.unwrap_err();

  assert!(matches!(err, EngineError::Closed));
}
