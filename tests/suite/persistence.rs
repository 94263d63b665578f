//! Ledger state surviving the SQLite store and the JSON export.

use pension_core::Ledger;
use pension_store::{LedgerStore, export_snapshot, read_export};
use pension_types::{LedgerError, LedgerRules};
use tempfile::tempdir;

use crate::common::{GENESIS, at, enrollment, enrollment_aged, identity};

fn populated() -> Ledger {
    let mut ledger = Ledger::new(LedgerRules::default(), GENESIS);
    let owner = identity("0xowner");
    let id = ledger.mint(enrollment("0xowner", 30), at(1)).expect("mint");
    ledger
        .mint(enrollment_aged("0xelder", 61, 500), at(2))
        .expect("mint elder");
    ledger.advance_cutoff(at(100)).expect("advance");
    ledger.deposit(id, &owner, 40).expect("deposit");
    ledger
}

#[test]
fn ledger_continues_after_reopening_the_store() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ledger.db");

    {
        let mut store = LedgerStore::open(&path).expect("open");
        store.save(&populated().snapshot()).expect("save");
    }

    let store = LedgerStore::open(&path).expect("reopen");
    let snapshot = store.load().expect("load").expect("saved ledger");
    let mut ledger = Ledger::restore(LedgerRules::default(), snapshot).expect("restore");

    let owner = identity("0xowner");
    let id = ledger.account_of(&owner).expect("registered");
    assert_eq!(
        ledger.account_balance(id).expect("balance").total_savings,
        16
    );

    // The elder was filed before the save and must not be filed again.
    let report = ledger.advance_cutoff(at(200)).expect("advance");
    assert!(report.retirees.is_empty());
    let filed: usize = ledger.periods().map(|period| period.retirees.len()).sum();
    assert_eq!(filed, 1);

    // Identity uniqueness survives the round trip.
    let err = ledger
        .mint(enrollment("0xowner", 30), at(201))
        .expect_err("duplicate");
    assert!(matches!(err, LedgerError::AlreadyExists { .. }));
}

#[test]
fn export_restores_to_an_identical_ledger() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("export").join("ledger.json");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    let ledger = populated();

    export_snapshot(&path, &ledger.snapshot()).expect("export");
    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
    assert_eq!(json["accounts"].as_array().expect("accounts").len(), 2);

    let restored =
        Ledger::restore(LedgerRules::default(), read_export(&path).expect("read export"))
            .expect("restore");
    assert_eq!(restored.snapshot(), ledger.snapshot());
    assert_eq!(restored.pool_totals(), ledger.pool_totals());
}

#[test]
fn tampered_snapshot_is_rejected() {
    let mut snapshot = populated().snapshot();
    snapshot.accounts[0].cumulative_savings += 1;

    let err = Ledger::restore(LedgerRules::default(), snapshot).expect_err("broken split");
    assert!(matches!(err, LedgerError::CorruptSnapshot(_)));

    let mut snapshot = populated().snapshot();
    let entry = snapshot.periods[0].retirees[0].clone();
    snapshot.periods[1].retirees.push(entry);
    let err = Ledger::restore(LedgerRules::default(), snapshot).expect_err("duplicate retiree");
    assert!(matches!(err, LedgerError::CorruptSnapshot(_)));
}
