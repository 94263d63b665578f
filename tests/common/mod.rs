//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use pension_core::Enrollment;
use pension_types::{Amount, BiologicalSex, Identity, Timestamp};

/// First period of every fixture ledger.
pub const GENESIS: Timestamp = Timestamp::from_unix_seconds(1_700_000_000);

/// `GENESIS` shifted by `offset` seconds.
pub fn at(offset: i64) -> Timestamp {
    Timestamp::from_unix_seconds(GENESIS.as_unix_seconds() + offset)
}

pub fn identity(value: &str) -> Identity {
    Identity::new(value).expect("fixture identity is non-empty")
}

/// Enrollment matching the reference participant: 26 years old, born 1996.
pub fn enrollment(owner: &str, contribution: Amount) -> Enrollment {
    enrollment_aged(owner, 26, contribution)
}

pub fn enrollment_aged(owner: &str, age: u32, contribution: Amount) -> Enrollment {
    Enrollment {
        identity: identity(owner),
        biological_sex: BiologicalSex::Male,
        age,
        birth_year: 2022 - age as i32,
        contribution,
    }
}

/// Run the `pension` binary against an isolated home directory.
///
/// `HOME` points into `home` so logs and the default config stay inside the
/// test's temp directory.
pub fn pension(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pension"))
        .args(args)
        .env("HOME", home)
        .env_remove("PENSION_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(home)
        .output()
        .expect("spawn pension binary")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
