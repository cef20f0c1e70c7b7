//! Integration tests for the vault/proposal lifecycle.
//!
//! These drive the program the way a caller would: create a vault, fund it,
//! open proposals, collect approvals in various orders, and execute.

use std::sync::Arc;

use quorum_contracts::{MemoryStore, VaultError, VaultEvent, VaultProgram};
use quorum_protocol::{Keypair, Ledger, MemoryLedger, Pubkey};

const ONE_UNIT: u64 = 1_000_000_000;

struct Setup {
    program: VaultProgram<MemoryStore>,
    ledger: Arc<MemoryLedger>,
    authority: Pubkey,
    owners: Vec<Pubkey>,
    vault: Pubkey,
}

/// Helper: a 3-owner, threshold-2 vault with `funding` deposited by the
/// authority.
fn setup(funding: u64) -> Setup {
    let ledger = Arc::new(MemoryLedger::new());
    let (program, _events) = VaultProgram::in_memory(ledger.clone());

    let authority = Keypair::generate().pubkey();
    let owners: Vec<Pubkey> = (0..3).map(|_| Keypair::generate().pubkey()).collect();
    let vault = program
        .initialize_vault(&authority, owners.clone(), 2)
        .unwrap();

    if funding > 0 {
        ledger.credit(&authority, funding).unwrap();
        program.deposit(&authority, &vault, funding).unwrap();
    }

    Setup {
        program,
        ledger,
        authority,
        owners,
        vault,
    }
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn quorum_gates_execution() {
    let s = setup(ONE_UNIT);
    let recipient = Keypair::generate().pubkey();

    let id = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &recipient, ONE_UNIT / 2)
        .unwrap();

    // 1. One approval is not enough.
    s.program.approve_proposal(&s.owners[0], &s.vault, id).unwrap();
    let err = s
        .program
        .execute_proposal(&s.owners[0], &s.vault, id, &recipient)
        .unwrap_err();
    assert_eq!(
        err,
        VaultError::InsufficientApprovals {
            approvals: 1,
            threshold: 2
        }
    );
    assert_eq!(s.program.vault(&s.vault).unwrap().balance, ONE_UNIT);

    // 2. Second owner approves, execution goes through.
    s.program.approve_proposal(&s.owners[1], &s.vault, id).unwrap();
    s.program
        .execute_proposal(&s.owners[0], &s.vault, id, &recipient)
        .unwrap();

    assert!(s.program.proposal(&s.vault, id).unwrap().is_executed());
    assert_eq!(s.program.vault(&s.vault).unwrap().balance, 500_000_000);
    assert_eq!(s.ledger.balance(&recipient).unwrap(), 500_000_000);
    assert_eq!(s.ledger.balance(&s.vault).unwrap(), 500_000_000);
}

#[test]
fn outsiders_and_repeat_approvals_are_rejected() {
    let s = setup(ONE_UNIT);
    let recipient = Keypair::generate().pubkey();
    let outsider = Keypair::generate().pubkey();

    let id = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &recipient, 1_000)
        .unwrap();

    assert_eq!(
        s.program
            .approve_proposal(&outsider, &s.vault, id)
            .unwrap_err(),
        VaultError::NotAnOwner(outsider)
    );

    s.program.approve_proposal(&s.owners[2], &s.vault, id).unwrap();
    assert_eq!(
        s.program
            .approve_proposal(&s.owners[2], &s.vault, id)
            .unwrap_err(),
        VaultError::DuplicateApproval(s.owners[2])
    );
    assert_eq!(s.program.proposal(&s.vault, id).unwrap().approval_count(), 1);
}

#[test]
fn underfunded_proposal_stays_unexecuted() {
    let s = setup(100);
    let recipient = Keypair::generate().pubkey();

    let id = s
        .program
        .create_proposal(&s.owners[1], &s.vault, &recipient, 101)
        .unwrap();
    for owner in &s.owners {
        s.program.approve_proposal(owner, &s.vault, id).unwrap();
    }

    let err = s
        .program
        .execute_proposal(&s.owners[2], &s.vault, id, &recipient)
        .unwrap_err();
    assert_eq!(
        err,
        VaultError::InsufficientFunds {
            balance: 100,
            amount: 101
        }
    );
    assert_eq!(s.program.vault(&s.vault).unwrap().balance, 100);
    assert!(!s.program.proposal(&s.vault, id).unwrap().is_executed());
    assert_eq!(s.ledger.balance(&recipient).unwrap(), 0);
}

#[test]
fn underfunded_proposal_executes_after_top_up() {
    let s = setup(100);
    let recipient = Keypair::generate().pubkey();
    let id = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &recipient, 250)
        .unwrap();
    s.program.approve_proposal(&s.owners[0], &s.vault, id).unwrap();
    s.program.approve_proposal(&s.owners[1], &s.vault, id).unwrap();

    assert!(s
        .program
        .execute_proposal(&s.owners[0], &s.vault, id, &recipient)
        .is_err());

    // A third party tops the vault up.
    let donor = Keypair::generate().pubkey();
    s.ledger.credit(&donor, 150).unwrap();
    s.program.deposit(&donor, &s.vault, 150).unwrap();

    s.program
        .execute_proposal(&s.owners[1], &s.vault, id, &recipient)
        .unwrap();
    assert_eq!(s.program.vault(&s.vault).unwrap().balance, 0);
    assert_eq!(s.ledger.balance(&recipient).unwrap(), 250);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn approval_order_does_not_matter() {
    let orders: [[usize; 2]; 6] = [[0, 1], [1, 0], [0, 2], [2, 0], [1, 2], [2, 1]];

    for order in orders {
        let s = setup(1_000);
        let recipient = Keypair::generate().pubkey();
        let id = s
            .program
            .create_proposal(&s.owners[0], &s.vault, &recipient, 10)
            .unwrap();

        for &i in &order {
            s.program.approve_proposal(&s.owners[i], &s.vault, id).unwrap();
        }
        s.program
            .execute_proposal(&s.owners[order[0]], &s.vault, id, &recipient)
            .unwrap();

        assert_eq!(s.program.vault(&s.vault).unwrap().balance, 990);
    }
}

#[test]
fn proposals_are_independent() {
    let s = setup(1_000);
    let alice = Keypair::generate().pubkey();
    let bob = Keypair::generate().pubkey();

    let first = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &alice, 300)
        .unwrap();
    let second = s
        .program
        .create_proposal(&s.owners[1], &s.vault, &bob, 200)
        .unwrap();
    assert_eq!((first, second), (0, 1));

    // Approve and execute the later one first.
    s.program.approve_proposal(&s.owners[1], &s.vault, second).unwrap();
    s.program.approve_proposal(&s.owners[2], &s.vault, second).unwrap();
    s.program
        .execute_proposal(&s.owners[2], &s.vault, second, &bob)
        .unwrap();

    assert!(!s.program.proposal(&s.vault, first).unwrap().is_executed());
    assert_eq!(s.program.proposal(&s.vault, first).unwrap().approval_count(), 0);

    s.program.approve_proposal(&s.owners[0], &s.vault, first).unwrap();
    s.program.approve_proposal(&s.owners[1], &s.vault, first).unwrap();
    s.program
        .execute_proposal(&s.owners[0], &s.vault, first, &alice)
        .unwrap();

    assert_eq!(s.program.vault(&s.vault).unwrap().balance, 500);
    assert_eq!(s.ledger.balance(&alice).unwrap(), 300);
    assert_eq!(s.ledger.balance(&bob).unwrap(), 200);
}

#[test]
fn executed_proposal_refuses_further_approvals() {
    let s = setup(1_000);
    let recipient = Keypair::generate().pubkey();
    let id = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &recipient, 10)
        .unwrap();
    s.program.approve_proposal(&s.owners[0], &s.vault, id).unwrap();
    s.program.approve_proposal(&s.owners[1], &s.vault, id).unwrap();
    s.program
        .execute_proposal(&s.owners[1], &s.vault, id, &recipient)
        .unwrap();

    assert_eq!(
        s.program
            .approve_proposal(&s.owners[2], &s.vault, id)
            .unwrap_err(),
        VaultError::AlreadyExecuted { proposal_id: id }
    );
    assert_eq!(
        s.program
            .execute_proposal(&s.owners[2], &s.vault, id, &recipient)
            .unwrap_err(),
        VaultError::AlreadyExecuted { proposal_id: id }
    );
    assert_eq!(s.program.vault(&s.vault).unwrap().balance, 990);
}

#[test]
fn non_owner_authority_cannot_propose_or_execute() {
    let s = setup(1_000);
    let recipient = Keypair::generate().pubkey();

    assert_eq!(
        s.program
            .create_proposal(&s.authority, &s.vault, &recipient, 10)
            .unwrap_err(),
        VaultError::NotAnOwner(s.authority)
    );

    let id = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &recipient, 10)
        .unwrap();
    s.program.approve_proposal(&s.owners[0], &s.vault, id).unwrap();
    s.program.approve_proposal(&s.owners[1], &s.vault, id).unwrap();
    assert_eq!(
        s.program
            .execute_proposal(&s.authority, &s.vault, id, &recipient)
            .unwrap_err(),
        VaultError::NotAnOwner(s.authority)
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn every_valid_threshold_is_accepted_and_others_rejected() {
    let ledger = Arc::new(MemoryLedger::new());
    let (program, _) = VaultProgram::in_memory(ledger);

    for owner_count in 1..=5usize {
        for threshold in 0..=6u8 {
            let authority = Keypair::generate().pubkey();
            let owners: Vec<Pubkey> =
                (0..owner_count).map(|_| Keypair::generate().pubkey()).collect();
            let result = program.initialize_vault(&authority, owners, threshold);

            if threshold >= 1 && threshold as usize <= owner_count {
                let view = program.vault(&result.unwrap()).unwrap();
                assert!(view.threshold >= 1 && view.threshold as usize <= view.owners.len());
            } else {
                assert!(matches!(result, Err(VaultError::InvalidThreshold { .. })));
            }
        }
    }
}

#[test]
fn approvals_stay_within_owner_set() {
    let s = setup(0);
    let recipient = Keypair::generate().pubkey();
    let id = s
        .program
        .create_proposal(&s.owners[0], &s.vault, &recipient, 1)
        .unwrap();

    let mut callers = s.owners.clone();
    callers.extend((0..3).map(|_| Keypair::generate().pubkey()));
    for caller in callers.iter().chain(callers.iter()) {
        let _ = s.program.approve_proposal(caller, &s.vault, id);
    }

    let proposal = s.program.proposal(&s.vault, id).unwrap();
    assert_eq!(proposal.approval_count(), 3);
    for approver in proposal.approvals() {
        assert!(s.owners.contains(approver));
    }
}

#[test]
fn events_follow_commits_only() {
    let ledger = Arc::new(MemoryLedger::new());
    let (program, events) = VaultProgram::in_memory(ledger.clone());
    let owner = Keypair::generate().pubkey();
    let vault = program.initialize_vault(&owner, vec![owner], 1).unwrap();

    // Rejected: depositor has no funds.
    assert!(program.deposit(&owner, &vault, 5).is_err());
    // Rejected: zero amount.
    assert!(program.create_proposal(&owner, &vault, &owner, 0).is_err());

    ledger.credit(&owner, 5).unwrap();
    program.deposit(&owner, &vault, 5).unwrap();

    let recorded = events.events();
    assert_eq!(recorded.len(), 2);
    assert!(matches!(recorded[0], VaultEvent::VaultInitialized { threshold: 1, .. }));
    assert!(matches!(
        recorded[1],
        VaultEvent::Deposited {
            amount: 5,
            balance: 5,
            ..
        }
    ));
}
