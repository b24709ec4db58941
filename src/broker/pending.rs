//! Pending request slot
//!
//! Holds the continuation of the one outstanding directory access request.

use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::oneshot;

use crate::error::BrokerError;
use crate::handle::DirectoryHandle;

pub type AccessOutcome = Result<Option<DirectoryHandle>, BrokerError>;

/// What to do when a request arrives while another is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingPolicy {
    /// Replace the pending continuation; its caller sees `RequestSuperseded`.
    #[default]
    Overwrite,
    /// Fail the new request with `RequestPending` and keep the first.
    Reject,
}

pub struct PendingRequest {
    id: u64,
    issued_at: Instant,
    responder: oneshot::Sender<AccessOutcome>,
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Completes the request. A caller that stopped waiting is ignored.
    pub fn complete(self, outcome: AccessOutcome) {
        if self.responder.send(outcome).is_err() {
            warn!("Access request #{} completed after its caller left", self.id);
        }
    }
}

/// The single continuation slot.
#[derive(Default)]
pub struct PendingSlot {
    inner: Mutex<Option<PendingRequest>>,
}

impl PendingSlot {
    /// Stores a new continuation under `policy`.
    pub fn issue(
        &self,
        id: u64,
        policy: PendingPolicy,
    ) -> Result<oneshot::Receiver<AccessOutcome>, BrokerError> {
        let mut slot = self.lock();

        if let Some(previous) = slot.as_ref() {
            match policy {
                PendingPolicy::Reject => {
                    warn!(
                        "Rejecting access request #{}: request #{} still pending",
                        id,
                        previous.id()
                    );
                    return Err(BrokerError::RequestPending);
                }
                PendingPolicy::Overwrite => {
                    warn!(
                        "Access request #{} overwrites pending request #{} (waited {:?})",
                        id,
                        previous.id(),
                        previous.issued_at.elapsed()
                    );
                }
            }
        }

        let (responder, receiver) = oneshot::channel();
        *slot = Some(PendingRequest {
            id,
            issued_at: Instant::now(),
            responder,
        });
        Ok(receiver)
    }

    /// Empties the slot unconditionally.
    pub fn take(&self) -> Option<PendingRequest> {
        self.lock().take()
    }

    /// Empties the slot only if it still holds request `id`.
    pub fn take_if(&self, id: u64) -> Option<PendingRequest> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(pending) if pending.id() == id => slot.take(),
            _ => None,
        }
    }

    pub fn pending_id(&self) -> Option<u64> {
        self.lock().as_ref().map(PendingRequest::id)
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingRequest>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_drops_previous_continuation() {
        let slot = PendingSlot::default();
        let mut first = slot.issue(1, PendingPolicy::Overwrite).unwrap();
        let _second = slot.issue(2, PendingPolicy::Overwrite).unwrap();

        assert_eq!(slot.pending_id(), Some(2));
        assert!(matches!(
            first.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn test_reject_keeps_first() {
        let slot = PendingSlot::default();
        let _first = slot.issue(1, PendingPolicy::Reject).unwrap();

        assert!(matches!(
            slot.issue(2, PendingPolicy::Reject),
            Err(BrokerError::RequestPending)
        ));
        assert_eq!(slot.pending_id(), Some(1));
    }

    #[test]
    fn test_take_if_ignores_other_ids() {
        let slot = PendingSlot::default();
        let _rx = slot.issue(7, PendingPolicy::Overwrite).unwrap();

        assert!(slot.take_if(3).is_none());
        assert_eq!(slot.take_if(7).map(|p| p.id()), Some(7));
        assert!(slot.take().is_none());
    }
}
