//! Cancellation tickets for in-flight backend operations.
//!
//! Each operation kind has at most one live ticket. Starting a new operation
//! of the same kind supersedes the previous one: the old ticket's channel
//! fires and its eventual result no longer passes the [`finish`] check, so
//! stale responses can never overwrite newer state.
//!
//! [`finish`]: CancellationController::finish

use std::collections::HashMap;

use tokio::sync::{Mutex, oneshot};
use uuid::Uuid;

/// The backend operations that can be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Upload,
    Parse,
    Compare,
    Analyze,
    Generate,
    Download,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Upload => "upload",
            OpKind::Parse => "parse",
            OpKind::Compare => "compare",
            OpKind::Analyze => "analyze",
            OpKind::Generate => "generate",
            OpKind::Download => "download",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle for one attempt: its identity plus a channel that fires if the
/// attempt is cancelled or superseded.
pub struct OpTicket {
    pub id: Uuid,
    pub kind: OpKind,
    pub cancelled: oneshot::Receiver<()>,
}

struct ActiveTicket {
    id: Uuid,
    cancel: oneshot::Sender<()>,
}

/// Tracks the single live attempt per [`OpKind`].
#[derive(Default)]
pub struct CancellationController {
    active: Mutex<HashMap<OpKind, ActiveTicket>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new attempt, superseding any live attempt of the same
    /// kind.
    pub async fn begin(&self, kind: OpKind) -> OpTicket {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let mut active = self.active.lock().await;
        if let Some(prior) = active.insert(kind, ActiveTicket { id, cancel: tx }) {
            tracing::debug!(op = %kind, "superseding in-flight operation");
            let _ = prior.cancel.send(());
        }
        OpTicket {
            id,
            kind,
            cancelled: rx,
        }
    }

    /// Retires the attempt if it is still the current one. Returns false when
    /// the attempt was superseded or cancelled, in which case its result must
    /// be discarded.
    pub async fn finish(&self, kind: OpKind, id: Uuid) -> bool {
        let mut active = self.active.lock().await;
        match active.get(&kind) {
            Some(ticket) if ticket.id == id => {
                active.remove(&kind);
                true
            }
            _ => false,
        }
    }

    /// Cancels the live attempt of one kind. Returns false when nothing was
    /// in flight.
    pub async fn cancel(&self, kind: OpKind) -> bool {
        let mut active = self.active.lock().await;
        match active.remove(&kind) {
            Some(ticket) => {
                let _ = ticket.cancel.send(());
                true
            }
            None => false,
        }
    }

    /// Cancels every live attempt. Used by pipeline reset and logout.
    pub async fn cancel_all(&self) {
        let mut active = self.active.lock().await;
        for (kind, ticket) in active.drain() {
            tracing::debug!(op = %kind, "cancelling in-flight operation");
            let _ = ticket.cancel.send(());
        }
    }
}
