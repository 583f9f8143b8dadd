use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::analytics::SessionAnalytics;
use super::controller::TimerController;
use super::error::TimerError;
use super::event::{TimerCommand, TimerKey};
use super::state::{SessionRecord, TimerSnapshot};
use super::store::{ActiveTimerStore, SessionHistoryStore};
use super::time::Timestamp;

type Reply<T> = oneshot::Sender<T>;

/// Requests accepted by the owning task. Each carries its own reply channel.
#[derive(Debug)]
pub enum Request {
    Command {
        key: TimerKey,
        command: TimerCommand,
        at: Timestamp,
        reply: Reply<Result<TimerSnapshot, TimerError>>,
    },
    ConversationClosed {
        conversation_id: String,
        at: Timestamp,
        reply: Reply<Vec<TimerSnapshot>>,
    },
    Current {
        key: TimerKey,
        at: Timestamp,
        reply: Reply<Result<TimerSnapshot, TimerError>>,
    },
    ActiveTimers {
        at: Timestamp,
        reply: Reply<Vec<TimerSnapshot>>,
    },
    History {
        key: TimerKey,
        limit: Option<usize>,
        reply: Reply<Vec<SessionRecord>>,
    },
    Analytics {
        operator_id: String,
        reply: Reply<SessionAnalytics>,
    },
}

/// Owning task for a `TimerController`. Requests are processed one at a time,
/// so no transition ever observes a partially-updated timer.
pub struct TimerReactor<A, H> {
    receiver: mpsc::Receiver<Request>,
    controller: TimerController<A, H>,
}

impl<A, H> TimerReactor<A, H>
where
    A: ActiveTimerStore + 'static,
    H: SessionHistoryStore + 'static,
{
    pub fn new(controller: TimerController<A, H>, capacity: usize) -> (Self, TimerHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let reactor = Self {
            receiver: rx,
            controller,
        };
        (reactor, TimerHandle { sender: tx })
    }

    /// Pure step: one request in, one reply out. No awaiting.
    pub fn handle(&mut self, request: Request) {
        // A dropped reply receiver just means the caller went away.
        match request {
            Request::Command { key, command, at, reply } => {
                let result = match command {
                    TimerCommand::Start => Ok(self.controller.start(&key, at)),
                    TimerCommand::Pause => self.controller.pause(&key, at),
                    TimerCommand::Resume => self.controller.resume(&key, at),
                    TimerCommand::Stop => self.controller.stop(&key, at),
                };
                let _ = reply.send(result);
            }
            Request::ConversationClosed { conversation_id, at, reply } => {
                let _ = reply.send(self.controller.stop_all_for_conversation(&conversation_id, at));
            }
            Request::Current { key, at, reply } => {
                let _ = reply.send(self.controller.current(&key, at));
            }
            Request::ActiveTimers { at, reply } => {
                let _ = reply.send(self.controller.active_timers(at));
            }
            Request::History { key, limit, reply } => {
                let _ = reply.send(self.controller.get_history(&key, limit));
            }
            Request::Analytics { operator_id, reply } => {
                let _ = reply.send(self.controller.analytics(&operator_id));
            }
        }
    }

    /// Async driver loop. Ends once every handle has been dropped.
    pub async fn run(mut self) {
        info!("Timer reactor started");
        while let Some(request) = self.receiver.recv().await {
            self.handle(request);
        }
        warn!("Timer reactor stopped: all handles dropped");
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Cloneable client side of the reactor, shared by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    sender: mpsc::Sender<Request>,
}

impl TimerHandle {
    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Request) -> Result<T, TimerError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| TimerError::ReactorUnavailable)?;
        rx.await.map_err(|_| TimerError::ReactorUnavailable)
    }

    pub async fn command(
        &self,
        key: TimerKey,
        command: TimerCommand,
        at: Timestamp,
    ) -> Result<TimerSnapshot, TimerError> {
        self.call(|reply| Request::Command { key, command, at, reply }).await?
    }

    pub async fn start(&self, key: TimerKey, at: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.command(key, TimerCommand::Start, at).await
    }

    pub async fn pause(&self, key: TimerKey, at: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.command(key, TimerCommand::Pause, at).await
    }

    pub async fn resume(&self, key: TimerKey, at: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.command(key, TimerCommand::Resume, at).await
    }

    pub async fn stop(&self, key: TimerKey, at: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.command(key, TimerCommand::Stop, at).await
    }

    pub async fn stop_all_for_conversation(
        &self,
        conversation_id: String,
        at: Timestamp,
    ) -> Result<Vec<TimerSnapshot>, TimerError> {
        self.call(|reply| Request::ConversationClosed { conversation_id, at, reply }).await
    }

    pub async fn current(&self, key: TimerKey, at: Timestamp) -> Result<TimerSnapshot, TimerError> {
        self.call(|reply| Request::Current { key, at, reply }).await?
    }

    pub async fn active_timers(&self, at: Timestamp) -> Result<Vec<TimerSnapshot>, TimerError> {
        self.call(|reply| Request::ActiveTimers { at, reply }).await
    }

    pub async fn history(
        &self,
        key: TimerKey,
        limit: Option<usize>,
    ) -> Result<Vec<SessionRecord>, TimerError> {
        self.call(|reply| Request::History { key, limit, reply }).await
    }

    pub async fn analytics(&self, operator_id: String) -> Result<SessionAnalytics, TimerError> {
        self.call(|reply| Request::Analytics { operator_id, reply }).await
    }
}
