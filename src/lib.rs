#![doc(test(attr(deny(warnings))))]

//! Recon Core offers the ledger reconciliation primitives that power
//! project-scoped financial sync workflows: a pure diff over externally
//! sourced candidate entries, an operator approval session, and a
//! best-effort applier with an audit trail.

pub mod adapters;
pub mod audit;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Recon Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
