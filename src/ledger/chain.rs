use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};
use thiserror::Error;

use super::block::{Block, GENESIS_INDEX, GENESIS_PREVIOUS_HASH};
use super::identity::{IdentityError, IdentityRegistry};
use super::pool::TransactionPool;
use super::proof::{self, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use super::transaction::Transaction;

/// Errors that can occur during ledger operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Chain has no blocks")]
    EmptyChain,
}

/// Result of submitting a proof for the next block
#[derive(Debug, Clone, PartialEq)]
pub enum ForgeOutcome {
    /// The proof solved the puzzle and this block was committed
    Forged(Block),

    /// The proof does not solve the puzzle posed by the current tip
    InvalidProof,
}

/// Single source of truth for committed state
///
/// Cloning is cheap and every clone shares the same chain, pool and
/// identities. Locks are always taken chain first, then pool.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// The chain of blocks
    chain: Arc<RwLock<Vec<Block>>>,

    /// Transactions waiting for the next block
    pool: Arc<TransactionPool>,

    /// Username to identity bindings
    identities: Arc<IdentityRegistry>,

    /// Leading zero hex characters a proof digest needs
    difficulty: usize,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates a ledger holding only the genesis block
    pub fn new() -> Self {
        Self::with_difficulty(DEFAULT_DIFFICULTY)
    }

    /// Creates a ledger whose proofs need `difficulty` leading zeros
    ///
    /// Values above the digest length are clamped to it.
    pub fn with_difficulty(difficulty: usize) -> Self {
        let ledger = Ledger {
            chain: Arc::new(RwLock::new(Vec::new())),
            pool: Arc::new(TransactionPool::new()),
            identities: Arc::new(IdentityRegistry::new()),
            difficulty: difficulty.min(MAX_DIFFICULTY),
        };

        ledger.create_genesis_block();

        ledger
    }

    /// Commits the genesis block (first block in the chain)
    fn create_genesis_block(&self) {
        let genesis = Block::genesis();
        debug!("Created genesis block at {}", genesis.timestamp);
        self.write_chain().push(genesis);
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Queues a transaction for the next forged block
    ///
    /// # Returns
    ///
    /// The index of the block that will include this transaction
    pub fn submit_transaction(&self, sender: &str, recipient: &str, amount: f64) -> u64 {
        let transaction = Transaction::new(
            self.identities.resolve_or_register(sender),
            self.identities.resolve_or_register(recipient),
            amount,
        );

        // Holding the chain lock keeps the predicted index exact.
        let chain = self.read_chain();
        let pending = self.pool.add(transaction);
        let block_index = chain.len() as u64 + 1;

        debug!(
            "Queued transaction {} -> {} ({} pending for block {})",
            sender, recipient, pending, block_index
        );

        block_index
    }

    /// Commits the pending pool as a new block if `proof` solves the tip's puzzle
    ///
    /// An invalid proof leaves the chain and the pool untouched.
    pub fn try_forge_block(&self, proof: u64) -> Result<ForgeOutcome, LedgerError> {
        let mut chain = self.write_chain();
        let tip = chain.last().ok_or(LedgerError::EmptyChain)?;

        if !proof::is_valid(&tip.canonical_string(), proof, self.difficulty) {
            debug!("Rejected proof {} against block {}", proof, tip.index);
            return Ok(ForgeOutcome::InvalidProof);
        }

        let previous_hash = tip.calculate_hash();
        let index = chain.len() as u64 + 1;
        let block = Block::new(index, self.pool.drain_all(), proof, previous_hash);

        chain.push(block.clone());

        info!(
            "Forged block {} with {} transactions",
            block.index,
            block.transactions.len()
        );

        Ok(ForgeOutcome::Forged(block))
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Result<Block, LedgerError> {
        self.read_chain().last().cloned().ok_or(LedgerError::EmptyChain)
    }

    /// Gets the entire chain
    pub fn full_chain(&self) -> Vec<Block> {
        self.read_chain().clone()
    }

    /// Gets all pending transactions
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.snapshot()
    }

    /// Balance of `username`, derived from committed blocks only
    pub fn balance_of(&self, username: &str) -> f64 {
        let id = self.identities.lookup(username);

        self.read_chain()
            .iter()
            .flat_map(|block| block.transactions.iter())
            .map(|transaction| transaction.balance_delta(&id))
            .sum()
    }

    /// Committed transactions sent or received by `username`, in chain order
    pub fn transactions_for(&self, username: &str) -> Vec<Transaction> {
        let id = self.identities.lookup(username);

        self.read_chain()
            .iter()
            .flat_map(|block| block.transactions.iter())
            .filter(|transaction| transaction.involves(&id))
            .cloned()
            .collect()
    }

    /// Lets the identity known as `old_name` go by `new_name` from now on
    ///
    /// Committed blocks keep the identity id, so history and hashes are
    /// unchanged and `old_name` keeps resolving to the same identity.
    pub fn rename_user(&self, old_name: &str, new_name: &str) -> Result<(), LedgerError> {
        match self.identities.rename(old_name, new_name) {
            Ok(id) => {
                info!("Identity {} renamed from {} to {}", id, old_name, new_name);
                Ok(())
            }
            Err(err) => {
                warn!("Rename {} -> {} refused: {}", old_name, new_name, err);
                Err(err.into())
            }
        }
    }

    /// Current display name of the identity stored as `id` in transactions
    pub fn display_name(&self, id: &str) -> String {
        self.identities
            .display_name(id)
            .unwrap_or_else(|| id.to_string())
    }

    /// Validates the chain
    ///
    /// Checks the genesis block, index continuity, hash linkage and that
    /// every proof solves the puzzle posed by its predecessor.
    pub fn is_valid(&self) -> bool {
        self.validate(&self.read_chain())
    }

    /// Gets the entire chain together with its validity
    ///
    /// Both come from the same read of the chain, so the flag always
    /// describes exactly the blocks returned.
    pub fn chain_with_validity(&self) -> (Vec<Block>, bool) {
        let chain = self.read_chain();
        let is_valid = self.validate(&chain);

        (chain.clone(), is_valid)
    }

    fn validate(&self, chain: &[Block]) -> bool {
        match chain.first() {
            Some(genesis)
                if genesis.index == GENESIS_INDEX
                    && genesis.previous_hash == GENESIS_PREVIOUS_HASH => {}
            _ => return false,
        }

        chain.windows(2).all(|pair| {
            let (previous_block, current_block) = (&pair[0], &pair[1]);

            current_block.index == previous_block.index + 1
                && current_block.previous_hash == previous_block.calculate_hash()
                && proof::is_valid(
                    &previous_block.canonical_string(),
                    current_block.proof,
                    self.difficulty,
                )
        })
    }

    fn read_chain(&self) -> RwLockReadGuard<'_, Vec<Block>> {
        // Blocks are pushed only after every fallible step, so a poisoned
        // chain is still consistent.
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_chain(&self) -> RwLockWriteGuard<'_, Vec<Block>> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }
}
