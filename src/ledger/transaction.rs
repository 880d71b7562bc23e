use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A value transfer between two identities
///
/// `sender` and `recipient` hold the stable identity ids handed out by the
/// identity registry, so a rename never has to touch a committed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's identity
    pub sender: String,

    /// Recipient's identity
    pub recipient: String,

    /// Amount being transferred, unchecked
    pub amount: f64,
}

impl Transaction {
    /// Creates a new transaction
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Checks if the given identity sent or received this transaction
    pub fn involves(&self, identity: &str) -> bool {
        self.sender == identity || self.recipient == identity
    }

    /// Net effect of this transaction on the balance of `identity`
    ///
    /// A transaction to oneself nets to zero.
    pub fn balance_delta(&self, identity: &str) -> f64 {
        let mut delta = 0.0;
        if self.sender == identity {
            delta -= self.amount;
        }
        if self.recipient == identity {
            delta += self.amount;
        }
        delta
    }
}
