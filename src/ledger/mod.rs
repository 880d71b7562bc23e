// Ledger module
//
// This module contains the core ledger implementation including:
// - Block structure and canonical hashing
// - Transaction structure
// - Proof of work predicate
// - Pending transaction pool
// - Identity registry
// - Ledger orchestration

pub mod block;
pub mod chain;
pub mod identity;
pub mod pool;
pub mod proof;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{ForgeOutcome, Ledger, LedgerError};
pub use transaction::Transaction;
