//! The `pension` binary, driven as a user would drive it.

use tempfile::tempdir;

use crate::common::{pension, stderr, stdout};

#[test]
fn mint_deposit_advance_across_invocations() {
    let home = tempdir().expect("tempdir");
    let db = home.path().join("data").join("ledger.db");
    let db = db.to_str().expect("utf8 path");

    let out = pension(
        home.path(),
        &[
            "--db", db, "--at", "1000", "mint", "--as", "0xabc", "--sex", "male", "--age", "26",
            "--birth-year", "1996", "--amount", "30",
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("minted account 0 in period 1000"), "{text}");
    assert!(text.contains("savings        7"), "{text}");

    let out = pension(
        home.path(),
        &[
            "--db", db, "deposit", "--as", "0xabc", "--account", "0", "--amount", "40",
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("savings        16"));

    let out = pension(home.path(), &["--db", db, "--at", "2000", "advance"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("opened period 2000"));

    let out = pension(home.path(), &["--db", db, "period", "1000"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("total  70"));

    let out = pension(home.path(), &["--db", db, "periods"]);
    assert_eq!(stdout(&out).lines().count(), 2);
}

#[test]
fn rejected_operation_fails_and_leaves_store_untouched() {
    let home = tempdir().expect("tempdir");
    let db = home.path().join("ledger.db");
    let db = db.to_str().expect("utf8 path");

    let out = pension(
        home.path(),
        &[
            "--db", db, "--at", "1000", "mint", "--as", "0xabc", "--sex", "f", "--age", "26",
            "--birth-year", "1996", "--amount", "24",
        ],
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("does not reach the minimum of 25"));

    let out = pension(home.path(), &["--db", db, "status"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("accounts        0"));
}

#[test]
fn config_rules_apply_and_export_writes_json() {
    let home = tempdir().expect("tempdir");
    let config = home.path().join("pension.toml");
    let db = home.path().join("configured.db");
    std::fs::write(
        &config,
        format!(
            "[rules]\nminimum_contribution = 100\n\n[storage]\npath = \"{}\"\n",
            db.display()
        ),
    )
    .expect("write config");
    let config = config.to_str().expect("utf8 path");

    let out = pension(
        home.path(),
        &[
            "--config", config, "mint", "--as", "0xabc", "--sex", "other", "--age", "30",
            "--birth-year", "1992", "--amount", "99",
        ],
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("minimum of 100"));

    let export = home.path().join("ledger.json");
    let out = pension(
        home.path(),
        &["--config", config, "export", export.to_str().expect("utf8 path")],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(db.exists());

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&export).expect("read export")).expect("json");
    assert_eq!(json["accounts"].as_array().expect("accounts").len(), 0);
    assert_eq!(json["periods"].as_array().expect("periods").len(), 1);
}

#[test]
fn unknown_account_is_reported() {
    let home = tempdir().expect("tempdir");
    let db = home.path().join("ledger.db");

    let out = pension(
        home.path(),
        &["--db", db.to_str().expect("utf8 path"), "account", "7"],
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("pension account 7 not found"));
}

#[test]
fn retiree_is_filed_once_across_invocations() {
    let home = tempdir().expect("tempdir");
    let db = home.path().join("ledger.db");
    let db = db.to_str().expect("utf8 path");

    let out = pension(
        home.path(),
        &[
            "--db", db, "--at", "1000", "mint", "--as", "0xelder", "--sex", "female", "--age",
            "61", "--birth-year", "1961", "--amount", "500",
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));

    let out = pension(home.path(), &["--db", db, "--at", "2000", "advance"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("closed period 1000"), "{text}");
    assert!(text.contains("retired account 0 (0xelder)"), "{text}");

    let out = pension(home.path(), &["--db", db, "retirees", "1000"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "account 0  0xelder");

    let out = pension(home.path(), &["--db", db, "--at", "3000", "advance"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("no new retirees"));

    let out = pension(home.path(), &["--db", db, "retirees", "2000"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("no retirees filed in period 2000"));

    let out = pension(home.path(), &["--db", db, "account", "0"]);
    assert!(stdout(&out).contains("retired in     1000"));
}

#[test]
fn mint_and_advance_within_one_second() {
    let home = tempdir().expect("tempdir");
    let db = home.path().join("ledger.db");
    let db = db.to_str().expect("utf8 path");

    let out = pension(
        home.path(),
        &[
            "--db", db, "--at", "5000", "mint", "--as", "0xabc", "--sex", "male", "--age", "26",
            "--birth-year", "1996", "--amount", "30",
        ],
    );
    assert!(out.status.success(), "{}", stderr(&out));

    let out = pension(home.path(), &["--db", db, "--at", "5000", "advance"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("opened period 5001"));

    let out = pension(home.path(), &["--db", db, "--at", "5000", "advance"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("opened period 5002"));

    let out = pension(home.path(), &["--db", db, "--at", "4999", "advance"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("earlier than the latest cutoff"));

    let out = pension(home.path(), &["--db", db, "periods"]);
    assert_eq!(stdout(&out).lines().count(), 3);
}

#[test]
fn unstorable_amount_is_rejected_before_anything_is_saved() {
    let home = tempdir().expect("tempdir");
    let db = home.path().join("ledger.db");
    let db = db.to_str().expect("utf8 path");

    let out = pension(
        home.path(),
        &[
            "--db", db, "--at", "1000", "mint", "--as", "0xabc", "--sex", "male", "--age", "26",
            "--birth-year", "1996", "--amount", "9223372036854775808",
        ],
    );
    assert!(!out.status.success());
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("overflow"), "{}", stderr(&out));

    let out = pension(home.path(), &["--db", db, "status"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("accounts        0"));
}
