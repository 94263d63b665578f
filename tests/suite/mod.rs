//! Integration test suite modules

mod cli;
mod persistence;
mod scenarios;
