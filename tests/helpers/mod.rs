//! Test helpers module
//!
//! In-memory backend doubles, a mock REST server and seed data shared by the
//! integration tests.

#![allow(dead_code)]

pub mod backend_mock;
pub mod memory_store;
pub mod test_data;

pub use backend_mock::*;
pub use memory_store::*;
pub use test_data::*;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}
