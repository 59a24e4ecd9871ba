//! Worker state machine shared by the fetch, parse and track stages
//!
//! A [`Worker`] owns the observable state (`Waiting`, `Running`, `Stopped`)
//! and the cancellation signal. The per-message behaviour is plugged in
//! through the [`Stage`] trait, and [`Worker::run`] drives the loop:
//!
//! ```text
//! WAITING --message--> RUNNING --handled--> WAITING
//!    |                    |
//!    +--- stop / error ---+---> STOPPED (terminal)
//! ```

use crate::CrawlError;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// Observable state of a worker
///
/// `Waiting` is zero and the other states are non-zero, so the sum of all
/// worker states is zero exactly when every worker is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Blocked on its inbox, no message in hand
    Waiting = 0,
    /// Handling a message
    Running = 1,
    /// Cancelled; terminal
    Stopped = 2,
}

impl WorkerState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Waiting,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Identifies a worker in logs and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    Fetcher,
    Parser,
    Tracker,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetcher => write!(f, "Fetcher"),
            Self::Parser => write!(f, "Parser"),
            Self::Tracker => write!(f, "Tracker"),
        }
    }
}

/// State and cancellation signal of one pipeline worker
///
/// Components hold a `Worker` (usually behind an `Arc`) and delegate to it;
/// the worker itself knows nothing about messages.
#[derive(Debug)]
pub struct Worker {
    kind: WorkerKind,
    state: AtomicU8,
    stop: watch::Sender<bool>,
    span: tracing::Span,
}

impl Worker {
    /// Creates a worker in the `Waiting` state
    ///
    /// # Arguments
    ///
    /// * `kind` - Which stage this worker runs
    /// * `span` - Span every log line of the worker's loop is recorded under
    pub fn new(kind: WorkerKind, span: tracing::Span) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            kind,
            state: AtomicU8::new(WorkerState::Waiting.as_u8()),
            stop,
            span,
        }
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Updates the state unless the worker has already stopped
    pub fn set_state(&self, state: WorkerState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current == WorkerState::Stopped.as_u8() {
                    None
                } else {
                    Some(state.as_u8())
                }
            });
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == WorkerState::Stopped
    }

    /// Signals cancellation; safe to call any number of times
    ///
    /// The running loop returns promptly, abandoning a message it is in the
    /// middle of handling.
    pub fn request_stop(&self) {
        self.stop.send_replace(true);
    }

    /// True once `request_stop` has been called
    pub fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Runs `stage` against `inbox` until cancelled
    ///
    /// Each iteration waits for either a stop request or the next message.
    /// A message switches the worker to `Running` for the duration of
    /// [`Stage::handle`], which is dropped unfinished if a stop arrives
    /// first. The loop also ends when every sender of the inbox is gone.
    ///
    /// # Returns
    ///
    /// * `Ok(stage)` - Stopped cleanly; the stage is handed back so its state can be reclaimed
    /// * `Err(CrawlError)` - The stage returned an error, which stopped the worker
    pub async fn run<S: Stage>(
        &self,
        mut stage: S,
        mut inbox: mpsc::Receiver<S::Input>,
    ) -> Result<S, CrawlError> {
        let span = self.span.clone();
        let mut stop = self.stop.subscribe();

        async move {
            tracing::debug!("worker started");
            let result = loop {
                self.set_state(WorkerState::Waiting);

                let next = tokio::select! {
                    biased;
                    _ = stop.wait_for(|stopped| *stopped) => None,
                    message = inbox.recv() => message,
                };

                let Some(message) = next else {
                    break Ok(());
                };

                self.set_state(WorkerState::Running);
                let handled = tokio::select! {
                    biased;
                    result = stage.handle(message) => result,
                    _ = stop.wait_for(|stopped| *stopped) => {
                        tracing::debug!("stop requested mid-message, abandoning it");
                        break Ok(());
                    }
                };
                if let Err(e) = handled {
                    break Err(e);
                }
            };

            self.state
                .store(WorkerState::Stopped.as_u8(), Ordering::Release);
            self.request_stop();

            match result {
                Ok(()) => {
                    tracing::debug!("worker stopped");
                    Ok(stage)
                }
                Err(e) => {
                    tracing::debug!("worker stopped on error: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Per-message behaviour of a pipeline worker
pub trait Stage: Send + 'static {
    /// Message type read from the stage's inbox
    type Input: Send + 'static;

    /// Processes one message
    ///
    /// Returning an error stops the worker; recoverable problems should be
    /// logged and swallowed instead.
    fn handle(&mut self, input: Self::Input) -> impl Future<Output = Result<(), CrawlError>> + Send;
}
