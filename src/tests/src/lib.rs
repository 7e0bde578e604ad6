//! Integration tests for the currency ledger.

pub mod cli_tests;
pub mod concurrency_tests;
pub mod engine_tests;
pub mod storage_tests;
