//! Proof of work predicate
//!
//! A proof for the next block is any integer whose decimal form, appended to
//! the canonical string of the current tip, hashes to a digest starting with
//! `difficulty` zero hex characters.

use super::block::sha256_hex;

/// Leading zero hex characters a proof digest needs by default
pub const DEFAULT_DIFFICULTY: usize = 6;

/// Length of a hex encoded SHA-256 digest, the largest usable difficulty
pub const MAX_DIFFICULTY: usize = 64;

/// Digest a proof is judged by
pub fn proof_digest(reference: &str, proof: u64) -> String {
    sha256_hex(format!("{}{}", reference, proof).as_bytes())
}

/// Checks whether `proof` solves the puzzle posed by `reference`
pub fn is_valid(reference: &str, proof: u64, difficulty: usize) -> bool {
    if difficulty > MAX_DIFFICULTY {
        return false;
    }

    proof_digest(reference, proof)
        .bytes()
        .take(difficulty)
        .all(|b| b == b'0')
}

/// Searches for the smallest proof solving the puzzle posed by `reference`
///
/// Expect around `16^difficulty` attempts, so this is only practical for small
/// difficulties. Returns `None` when no `u64` solves the puzzle, which is
/// certain for difficulties above [`MAX_DIFFICULTY`].
pub fn find_proof(reference: &str, difficulty: usize) -> Option<u64> {
    search_from(reference, difficulty, 0)
}

fn search_from(reference: &str, difficulty: usize, start: u64) -> Option<u64> {
    if difficulty > MAX_DIFFICULTY {
        return None;
    }

    let mut proof = start;
    while !is_valid(reference, proof, difficulty) {
        proof = proof.checked_add(1)?;
    }

    Some(proof)
}
