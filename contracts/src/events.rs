//! Events emitted after each committed vault operation.
//!
//! An event is published only once its operation has committed, so a sink
//! never sees an event for something that was rolled back.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use quorum_protocol::Pubkey;

/// Something that happened to a vault or one of its proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    VaultInitialized {
        vault: Pubkey,
        authority: Pubkey,
        owners: Vec<Pubkey>,
        threshold: u8,
    },
    Deposited {
        vault: Pubkey,
        depositor: Pubkey,
        amount: u64,
        /// Vault balance after the deposit.
        balance: u64,
    },
    ProposalCreated {
        vault: Pubkey,
        proposal: Pubkey,
        proposal_id: u64,
        creator: Pubkey,
        recipient: Pubkey,
        amount: u64,
    },
    ProposalApproved {
        vault: Pubkey,
        proposal: Pubkey,
        proposal_id: u64,
        approver: Pubkey,
        total_approvals: usize,
    },
    ProposalExecuted {
        vault: Pubkey,
        proposal: Pubkey,
        proposal_id: u64,
        executor: Pubkey,
        recipient: Pubkey,
        amount: u64,
    },
}

impl VaultEvent {
    /// The vault this event belongs to.
    pub fn vault(&self) -> Pubkey {
        match self {
            VaultEvent::VaultInitialized { vault, .. }
            | VaultEvent::Deposited { vault, .. }
            | VaultEvent::ProposalCreated { vault, .. }
            | VaultEvent::ProposalApproved { vault, .. }
            | VaultEvent::ProposalExecuted { vault, .. } => *vault,
        }
    }
}

/// Receives committed events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &VaultEvent);
}

/// Logs each event at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &VaultEvent) {
        match event {
            VaultEvent::VaultInitialized {
                vault,
                authority,
                owners,
                threshold,
            } => info!(
                vault = %vault,
                authority = %authority,
                owners = owners.len(),
                threshold,
                "vault initialized"
            ),
            VaultEvent::Deposited {
                vault,
                depositor,
                amount,
                balance,
            } => info!(vault = %vault, depositor = %depositor, amount, balance, "deposit"),
            VaultEvent::ProposalCreated {
                vault,
                proposal_id,
                creator,
                recipient,
                amount,
                ..
            } => info!(
                vault = %vault,
                proposal_id,
                creator = %creator,
                recipient = %recipient,
                amount,
                "proposal created"
            ),
            VaultEvent::ProposalApproved {
                vault,
                proposal_id,
                approver,
                total_approvals,
                ..
            } => info!(
                vault = %vault,
                proposal_id,
                approver = %approver,
                total_approvals,
                "proposal approved"
            ),
            VaultEvent::ProposalExecuted {
                vault,
                proposal_id,
                executor,
                recipient,
                amount,
                ..
            } => info!(
                vault = %vault,
                proposal_id,
                executor = %executor,
                recipient = %recipient,
                amount,
                "proposal executed"
            ),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<VaultEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<VaultEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<VaultEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &VaultEvent) {
        self.events.lock().push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: &VaultEvent) {
        (**self).emit(event)
    }
}

/// Sends every event to both sinks, first `A` then `B`.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&self, event: &VaultEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    #[test]
    fn log_records_in_order_and_drains() {
        let log = EventLog::new();
        log.emit(&VaultEvent::Deposited {
            vault: key(1),
            depositor: key(2),
            amount: 10,
            balance: 10,
        });
        log.emit(&VaultEvent::Deposited {
            vault: key(1),
            depositor: key(3),
            amount: 5,
            balance: 15,
        });

        assert_eq!(log.len(), 2);
        let drained = log.drain();
        assert!(matches!(drained[1], VaultEvent::Deposited { balance: 15, .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn pair_feeds_both_sinks() {
        let first = std::sync::Arc::new(EventLog::new());
        let second = std::sync::Arc::new(EventLog::new());
        let both = (first.clone(), second.clone());

        both.emit(&VaultEvent::VaultInitialized {
            vault: key(1),
            authority: key(2),
            owners: vec![key(3)],
            threshold: 1,
        });
        (TracingSink, first.clone()).emit(&VaultEvent::Deposited {
            vault: key(1),
            depositor: key(2),
            amount: 1,
            balance: 1,
        });

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn json_carries_event_tag() {
        let event = VaultEvent::ProposalApproved {
            vault: key(1),
            proposal: key(2),
            proposal_id: 4,
            approver: key(3),
            total_approvals: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "proposal_approved");
        assert_eq!(json["total_approvals"], 2);
        assert_eq!(event.vault(), key(1));
    }
}
