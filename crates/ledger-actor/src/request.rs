//! Request/response shapes exchanged with a running `UserActor`.

use ledger_types::{GrantMap, JobCompleteMessage, LedgerError, UserCredits};
use tokio::sync::oneshot;

/// A message delivered to one user's actor mailbox.
///
/// Each variant carries a `oneshot::Sender` so the caller can await the
/// actor's reply the same way a synchronous call would return one.
pub enum ActorRequest {
    GetCredits {
        reply: oneshot::Sender<UserCredits>,
    },
    Grant {
        grant: GrantMap,
        reply: oneshot::Sender<Result<UserCredits, LedgerError>>,
    },
    CompleteJob {
        job: JobCompleteMessage,
        reply: oneshot::Sender<Result<(), LedgerError>>,
    },
    /// Sent by the cluster registry when this actor has lost a
    /// name-conflict resolution. The actor terminates without writing.
    Conflict,
}
