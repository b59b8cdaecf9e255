//! Typed event dispatch.
//!
//! The host delivers four kinds of events. `EventLoop::run` settles them in
//! arrival order with one rule: install and activate are awaited inline, so
//! nothing queued behind them is looked at until they finish. Fetch events
//! are spawned and answered independently; message events are answered as
//! soon as their refresh has been scheduled.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::agent::CacheAgent;
use super::types::{ActivationReport, EngineError, FetchOutcome, InstallReport, MessageOutcome, Request};

#[derive(Debug, Clone)]
pub enum AgentEvent {
  Install,
  Activate,
  Fetch(Request),
  Message(serde_json::Value),
}

#[derive(Debug, Clone)]
pub enum EventOutcome {
  Installed(InstallReport),
  Activated(ActivationReport),
  Fetched(FetchOutcome),
  Messaged(MessageOutcome),
}

type Reply = oneshot::Sender<Result<EventOutcome, EngineError>>;

/// Receiving side; drive it with `run`.
pub struct EventLoop {
  agent: Arc<CacheAgent>,
  rx: mpsc::UnboundedReceiver<(AgentEvent, Reply)>,
}

/// Sending side; cheap to clone.
#[derive(Clone)]
pub struct AgentHandle {
  tx: mpsc::UnboundedSender<(AgentEvent, Reply)>,
}

pub fn event_loop(agent: Arc<CacheAgent>) -> (EventLoop, AgentHandle) {
  let (tx, rx) = mpsc::unbounded_channel();
  (EventLoop { agent, rx }, AgentHandle { tx })
}

impl EventLoop {
  /// Process events until every `AgentHandle` is dropped.
  pub async fn run(mut self) {
    while let Some((event, reply)) = self.rx.recv().await {
      match event {
        AgentEvent::Install => {
          let result = self.agent.install().await.map(EventOutcome::Installed);
          let _ = reply.send(result);
        }
        AgentEvent::Activate => {
          let result = self.agent.activate().await.map(EventOutcome::Activated);
          let _ = reply.send(result);
        }
        AgentEvent::Fetch(request) => {
          let agent = Arc::clone(&self.agent);
          tokio::spawn(async move {
            let outcome = agent.handle_fetch(request).await;
            let _ = reply.send(Ok(EventOutcome::Fetched(outcome)));
          });
        }
        AgentEvent::Message(payload) => {
          let outcome = self.agent.handle_message(&payload);
          let _ = reply.send(Ok(EventOutcome::Messaged(outcome)));
        }
      }
    }
    debug!("agent event loop stopped");
  }
}

impl AgentHandle {
  /// Deliver one event and wait until it is settled.
  pub async fn dispatch(&self, event: AgentEvent) -> Result<EventOutcome, EngineError> {
    let (reply, settled) = oneshot::channel();
    self.tx.send((event, reply)).map_err(|_| EngineError::Closed)?;
    settled.await.map_err(|_| EngineError::Closed)?
  }
}
