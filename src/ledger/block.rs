use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// Index of the genesis block
pub const GENESIS_INDEX: u64 = 1;

/// Previous hash carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof carried by the genesis block
pub const GENESIS_PROOF: u64 = 100;

/// Represents a block in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Position of the block in the chain, starting at 1
    pub index: u64,

    /// Seconds since the Unix epoch when the block was forged
    pub timestamp: f64,

    /// Transactions committed by this block
    pub transactions: Vec<Transaction>,

    /// Proof of work that unlocked this block
    pub proof: u64,

    /// Hash of the previous block
    pub previous_hash: String,
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The list of transactions to include in the block
    /// * `proof` - The proof of work
    /// * `previous_hash` - The hash of the previous block
    pub fn new(index: u64, transactions: Vec<Transaction>, proof: u64, previous_hash: String) -> Self {
        Block {
            index,
            timestamp: now_seconds(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Creates the genesis block
    pub fn genesis() -> Self {
        Block::new(
            GENESIS_INDEX,
            Vec::new(),
            GENESIS_PROOF,
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    /// Renders the block as JSON with keys in lexical order
    ///
    /// This string is both the hash preimage and the reference string a
    /// proof for the next block is checked against.
    pub fn canonical_string(&self) -> String {
        // `Value` objects are BTreeMap-backed, so keys serialize sorted at
        // every nesting level regardless of struct field order.
        let block_data = serde_json::json!({
            "index": self.index,
            "previous_hash": self.previous_hash,
            "proof": self.proof,
            "timestamp": self.timestamp,
            "transactions": self.transactions,
        });

        block_data.to_string()
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the canonical form as a lowercase hexadecimal string
    pub fn calculate_hash(&self) -> String {
        sha256_hex(self.canonical_string().as_bytes())
    }
}

/// SHA-256 of `data`, hex encoded
pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
