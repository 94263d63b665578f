//! End-to-end ledger scenarios through the public API.

use std::thread;

use pension_core::{Ledger, SharedLedger};
use pension_types::{AccountId, ErrorKind, LedgerError, LedgerRules, PeriodId, SECONDS_PER_YEAR};

use crate::common::{GENESIS, at, enrollment, enrollment_aged, identity};

fn ledger() -> Ledger {
    Ledger::new(LedgerRules::default(), GENESIS)
}

#[test]
fn reference_participant_mint_and_deposit() {
    let mut ledger = ledger();
    let owner = identity("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    let id = ledger
        .mint(enrollment(owner.as_str(), 30), at(1))
        .expect("mint");
    assert_eq!(id, AccountId::new(0));
    assert!(ledger.already_registered(&owner));

    let balance = ledger.account_balance(id).expect("balance");
    assert_eq!(balance.total_savings, 7);
    assert_eq!(balance.total_solidary, 23);

    ledger.deposit(id, &owner, 40).expect("deposit");
    let balance = ledger.account_balance(id).expect("balance");
    assert_eq!(balance.cumulative_contribution, 70);
    assert_eq!(balance.total_savings, 16);
    assert_eq!(balance.total_solidary, 54);
}

#[test]
fn minimum_contribution_boundary() {
    let mut ledger = ledger();

    let err = ledger
        .mint(enrollment("0xlow", 24), at(1))
        .expect_err("below minimum");
    assert!(matches!(err, LedgerError::BelowMinimum { amount: 24, minimum: 25 }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!ledger.already_registered(&identity("0xlow")));

    ledger
        .mint(enrollment("0xlow", 25), at(2))
        .expect("minimum is accepted");
}

#[test]
fn admission_failures_leave_no_trace() {
    let mut ledger = ledger();

    let err = ledger
        .mint(enrollment_aged("0xkid", 17, 1_000_000), at(1))
        .expect_err("underage");
    assert_eq!(err.kind(), ErrorKind::Validation);

    ledger.mint(enrollment("0xdup", 30), at(2)).expect("first mint");
    let err = ledger
        .mint(enrollment("0xdup", 500), at(3))
        .expect_err("second mint");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(ledger.accounts().count(), 1);
    assert_eq!(ledger.period_total(ledger.current_cutoff()).expect("total"), 30);
}

#[test]
fn foreign_deposit_is_rejected_without_mutation() {
    let mut ledger = ledger();
    let id = ledger.mint(enrollment("0xowner", 30), at(1)).expect("mint");
    let before = ledger.query_account(id).expect("account").clone();

    let err = ledger
        .deposit(id, &identity("0xintruder"), 40)
        .expect_err("not owner");
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(ledger.query_account(id).expect("account"), &before);
    assert_eq!(
        ledger.period_bucket(ledger.current_cutoff()).expect("bucket").len(),
        1
    );
}

#[test]
fn contributions_land_in_the_period_they_arrive_in() {
    let mut ledger = ledger();
    let owner = identity("0xowner");
    let id = ledger.mint(enrollment("0xowner", 30), at(1)).expect("mint");
    let p1 = ledger.current_cutoff();

    let first = ledger.advance_cutoff(at(100)).expect("advance to P2");
    let p2 = first.opened;
    assert_eq!(first.closed, p1);
    ledger.deposit(id, &owner, 40).expect("deposit");

    let second = ledger.advance_cutoff(at(200)).expect("advance to P3");
    assert!(second.opened > p2 && p2 > p1);

    let p1_bucket = ledger.period_bucket(p1).expect("P1");
    assert_eq!(p1_bucket.len(), 1);
    assert_eq!(p1_bucket[0].amount, 30);
    let p2_bucket = ledger.period_bucket(p2).expect("P2");
    assert_eq!(p2_bucket.len(), 1);
    assert_eq!(p2_bucket[0].amount, 40);
    assert!(ledger.period_bucket(second.opened).expect("P3").is_empty());

    assert!(ledger.query_period(p1).expect("P1").closed_at.is_some());
    assert!(ledger.query_period(second.opened).expect("P3").is_open());
}

#[test]
fn cutoff_must_not_move_backward() {
    let mut ledger = ledger();
    ledger.advance_cutoff(at(100)).expect("advance");

    for requested in [at(99), at(50)] {
        let err = ledger.advance_cutoff(requested).expect_err("not forward");
        assert!(matches!(err, LedgerError::NonMonotonic { .. }));
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }
    assert_eq!(ledger.current_cutoff(), PeriodId::new(at(100)));
    assert_eq!(ledger.periods().count(), 2);

    // Accounts cannot be backdated past the cutoff either.
    let err = ledger
        .mint(enrollment("0xlate", 30), at(99))
        .expect_err("backdated mint");
    assert!(matches!(err, LedgerError::NonMonotonic { .. }));
    assert_eq!(ledger.accounts().count(), 0);
    ledger.mint(enrollment("0xlate", 30), at(100)).expect("mint at cutoff");
}

#[test]
fn successive_advances_in_one_tick_yield_increasing_periods() {
    let mut ledger = ledger();
    let owner = identity("0xowner");
    let id = ledger.mint(enrollment("0xowner", 30), GENESIS).expect("mint");

    let first = ledger.advance_cutoff(GENESIS).expect("first advance");
    ledger.deposit(id, &owner, 40).expect("deposit");
    let second = ledger.advance_cutoff(GENESIS).expect("second advance");
    let third = ledger.advance_cutoff(GENESIS).expect("third advance");

    assert!(first.closed < first.opened);
    assert_eq!(second.closed, first.opened);
    assert!(second.opened > second.closed);
    assert!(third.opened > third.closed);

    // Each closed period holds exactly what arrived while it was open.
    assert_eq!(ledger.period_total(first.closed).expect("P1"), 30);
    assert_eq!(ledger.period_total(second.closed).expect("P2"), 40);
    assert_eq!(ledger.current_cutoff(), third.opened);
    assert_eq!(ledger.periods().count(), 4);
}

#[test]
fn retiree_is_filed_exactly_once() {
    let mut ledger = ledger();
    let elder = ledger
        .mint(enrollment_aged("0xelder", 61, 100), at(1))
        .expect("mint elder");
    let young = ledger.mint(enrollment("0xyoung", 100), at(2)).expect("mint young");
    let p1 = ledger.current_cutoff();

    let report = ledger.advance_cutoff(at(100)).expect("advance");
    assert_eq!(report.retirees, vec![elder]);
    let record = ledger.retirement_record(p1).expect("record");
    assert_eq!(record.len(), 1);
    assert_eq!(record[0].owner, identity("0xelder"));

    let later = ledger.advance_cutoff(at(200)).expect("advance again");
    assert!(later.retirees.is_empty());
    assert!(ledger.retirement_record(later.closed).expect("record").is_empty());

    let filed: usize = ledger.periods().map(|period| period.retirees.len()).sum();
    assert_eq!(filed, 1);
    assert_eq!(
        ledger.account_balance(elder).expect("balance").retired_in,
        Some(p1)
    );
    assert!(!ledger.query_account(young).expect("young").is_retired());
}

#[test]
fn younger_participant_retires_when_threshold_passes() {
    let rules = LedgerRules::new(25, 18, 60).expect("rules");
    let mut ledger = Ledger::new(rules, GENESIS);
    let id = ledger
        .mint(enrollment_aged("0xnear", 59, 100), at(0))
        .expect("mint");
    let retirement_at = ledger.query_account(id).expect("account").retirement_at;
    assert_eq!(retirement_at, at(SECONDS_PER_YEAR));

    let early = ledger
        .advance_cutoff(at(SECONDS_PER_YEAR - 1))
        .expect("advance");
    assert!(early.retirees.is_empty());

    let on_time = ledger.advance_cutoff(retirement_at).expect("advance");
    assert_eq!(on_time.retirees, vec![id]);
}

#[test]
fn shared_ledger_serializes_concurrent_mints() {
    let shared = SharedLedger::new(ledger());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared
                    .mint(enrollment(&format!("0xthread{n}"), 100 + n), at(1))
                    .expect("mint")
            })
        })
        .collect();
    let mut ids: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    ids.sort();

    assert_eq!(ids, (0..8).map(AccountId::new).collect::<Vec<_>>());
    shared.read(|ledger| {
        let bucket = ledger.period_bucket(ledger.current_cutoff()).expect("bucket");
        assert_eq!(bucket.len(), 8);
        assert_eq!(ledger.pool_totals().contributions, (100..108).sum::<u128>());
    });
}
