//! Property 8: single-writer. Concurrent `grant`/`complete_job` calls
//! against one user must produce a final state equal to some serial
//! ordering of the same operations — no lost updates, no torn writes.

use std::sync::Arc;

use ledger_actor::LocalSupervisor;
use ledger_core::SystemClock;
use ledger_persistence::testing::InMemoryRelationalStore;
use ledger_persistence::PersistenceGateway;
use ledger_types::{GrantMap, LedgerConfig, UserId};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_grants_to_one_user_all_apply_exactly_once() {
    let relational = Arc::new(InMemoryRelationalStore::new());
    let gateway = Arc::new(PersistenceGateway::relational_only(relational));
    let sup = Arc::new(LocalSupervisor::new(gateway, Arc::new(SystemClock), Arc::new(LedgerConfig::default())));

    let user_id = UserId::new();
    const CONCURRENT_GRANTS: usize = 64;

    let mut handles = Vec::new();
    for _ in 0..CONCURRENT_GRANTS {
        let sup = sup.clone();
        handles.push(tokio::spawn(async move {
            sup.grant(user_id, GrantMap::new().with_trial(1)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let credits = sup.get_credits(user_id).await.unwrap();
    assert_eq!(
        credits.trial, CONCURRENT_GRANTS as i64,
        "every concurrent grant must have applied exactly once, proving single-writer serialization"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn interleaved_grants_and_debits_conserve_total() {
    let relational = Arc::new(InMemoryRelationalStore::new());
    let gateway = Arc::new(PersistenceGateway::relational_only(relational));
    let sup = Arc::new(LocalSupervisor::new(gateway, Arc::new(SystemClock), Arc::new(LedgerConfig::default())));

    let user_id = UserId::new();
    sup.grant(user_id, GrantMap::new().with_permanent(10_000)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let sup = sup.clone();
        handles.push(tokio::spawn(async move {
            sup.grant(user_id, GrantMap::new().with_permanent(100)).await.unwrap();
        }));
    }
    for _ in 0..20 {
        let sup = sup.clone();
        handles.push(tokio::spawn(async move {
            let job = ledger_types::JobCompleteMessage {
                id: ledger_types::JobId("j".to_string()),
                user_id,
                job_type: "t".to_string(),
                charge_credits: Some(true),
                cost: Some(100),
            };
            sup.complete_job(job).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let credits = sup.get_credits(user_id).await.unwrap();
    // 20 grants of +100 and 20 debits of -100 net to zero change, regardless
    // of interleaving order, since every debit here can always be fully
    // covered (no remainder) whichever order the scheduler picks.
    assert_eq!(credits.permanent, 10_000);
}
