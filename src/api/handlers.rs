use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::{Block, ForgeOutcome, Ledger, LedgerError, Transaction};

/// Data structure for the ledger state
pub type LedgerData = web::Data<Ledger>;

/// Body carrying only a human readable message
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Response for the last block endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LastBlockResponse {
    pub last_block: Block,
}

/// Response for the pending transactions endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PendingResponse {
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's username
    pub sender: Option<String>,

    /// The recipient's username
    pub recipient: Option<String>,

    /// The amount to transfer
    pub amount: Option<f64>,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The index of the block that will include this transaction
    #[serde(rename = "blockIndex")]
    pub block_index: u64,
}

/// Request for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineRequest {
    /// Candidate proof for the next block
    #[schema(value_type = u64)]
    pub proof: Option<serde_json::Value>,

    /// Identifier of the submitting miner
    #[schema(value_type = String)]
    pub id: Option<serde_json::Value>,
}

/// Response for a forged block
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/// Request for the rename endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RenameRequest {
    #[serde(rename = "lastUsername")]
    pub last_username: Option<String>,

    pub username: Option<String>,
}

/// Response for the rename endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RenameResponse {
    pub success: bool,
}

/// Request naming a single user
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UsernameRequest {
    pub username: Option<String>,
}

/// Response for the balance endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub username: String,
    pub balance: f64,
}

/// Response for the user transactions endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserTransactionsResponse {
    pub transactions: Vec<Transaction>,
}

const MISSING_VALUES: &str = "Missing values";
const INVALID_PROOF: &str = "Proof was invalid or already submitted";

fn missing_values() -> HttpResponse {
    HttpResponse::BadRequest().json(MessageResponse::new(MISSING_VALUES))
}

/// A field that is present and not an empty string
fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Answers undecodable JSON bodies with a 400 and a message
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(MessageResponse::new(format!("Malformed request: {}", err)));
    InternalError::from_response(err, response).into()
}

/// Get the full chain
///
/// Returns every committed block and the chain's validity status. Blocks are
/// hashed content, so transactions carry identity ids, not display names.
#[utoipa::path(
    get,
    path = "/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(ledger: LedgerData) -> impl Responder {
    let (chain, is_valid) = ledger.chain_with_validity();

    let response = ChainResponse {
        length: chain.len(),
        chain,
        is_valid,
    };

    HttpResponse::Ok().json(response)
}

/// Check if the chain is valid
#[utoipa::path(
    get,
    path = "/chain/validate",
    responses(
        (status = 200, description = "Chain validation status", body = bool)
    )
)]
pub async fn validate_chain(ledger: LedgerData) -> impl Responder {
    HttpResponse::Ok().json(ledger.is_valid())
}

/// Get the last block
///
/// Transactions carry identity ids, as committed
#[utoipa::path(
    get,
    path = "/last_block",
    responses(
        (status = 200, description = "Last block retrieved successfully", body = LastBlockResponse),
        (status = 500, description = "Chain has no blocks", body = MessageResponse)
    )
)]
pub async fn get_last_block(ledger: LedgerData) -> impl Responder {
    match ledger.last_block() {
        Ok(last_block) => HttpResponse::Ok().json(LastBlockResponse { last_block }),
        Err(err) => HttpResponse::InternalServerError().json(MessageResponse::new(err.to_string())),
    }
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block, with the
/// identity ids they will be committed under
#[utoipa::path(
    get,
    path = "/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = PendingResponse)
    )
)]
pub async fn get_pending_transactions(ledger: LedgerData) -> impl Responder {
    let transactions = ledger.pending_transactions();

    HttpResponse::Ok().json(PendingResponse {
        count: transactions.len(),
        transactions,
    })
}

/// Create a new transaction
///
/// Adds a new transaction to the pending pool
#[utoipa::path(
    post,
    path = "/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction queued", body = TransactionResponse),
        (status = 400, description = "Missing values", body = MessageResponse)
    )
)]
pub async fn new_transaction(
    ledger: LedgerData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let (sender, recipient, amount) = match (
        transaction_req.sender.as_deref(),
        transaction_req.recipient.as_deref(),
        transaction_req.amount,
    ) {
        (Some(sender), Some(recipient), Some(amount)) => (sender, recipient, amount),
        _ => return missing_values(),
    };

    let block_index = ledger.submit_transaction(sender, recipient, amount);

    HttpResponse::Created().json(TransactionResponse {
        message: format!("Transaction will be added to Block {}", block_index),
        block_index,
    })
}

/// Forge a new block
///
/// Commits the pending transactions if the proof solves the puzzle posed by
/// the last block. The forged block is echoed as committed, with identity ids.
#[utoipa::path(
    post,
    path = "/mine",
    request_body = MineRequest,
    responses(
        (status = 200, description = "Block forged, or the proof was rejected", body = MineResponse),
        (status = 400, description = "Missing values", body = MessageResponse),
        (status = 500, description = "Chain has no blocks", body = MessageResponse)
    )
)]
pub async fn mine_block(ledger: LedgerData, mine_req: web::Json<MineRequest>) -> impl Responder {
    let (proof, miner) = match (&mine_req.proof, &mine_req.id) {
        (Some(proof), Some(miner)) => (proof, miner),
        _ => return missing_values(),
    };

    // Anything but a non-negative integer can never solve the puzzle.
    let Some(proof) = proof.as_u64() else {
        warn!("Miner {} submitted a non-integer proof {}", miner, proof);
        return HttpResponse::Ok().json(MessageResponse::new(INVALID_PROOF));
    };

    match ledger.try_forge_block(proof) {
        Ok(ForgeOutcome::Forged(block)) => {
            info!("Miner {} forged block {}", miner, block.index);

            HttpResponse::Ok().json(MineResponse {
                message: "New Block Forged".to_string(),
                index: block.index,
                transactions: block.transactions,
                proof: block.proof,
                previous_hash: block.previous_hash,
            })
        }
        Ok(ForgeOutcome::InvalidProof) => {
            HttpResponse::Ok().json(MessageResponse::new(INVALID_PROOF))
        }
        Err(err) => HttpResponse::InternalServerError().json(MessageResponse::new(err.to_string())),
    }
}

/// Change a username
///
/// Binds a new name to an existing identity; committed blocks are untouched
#[utoipa::path(
    post,
    path = "/user/change",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Username changed", body = RenameResponse),
        (status = 400, description = "Missing fields or username already taken", body = MessageResponse)
    )
)]
pub async fn change_username(
    ledger: LedgerData,
    rename_req: web::Json<RenameRequest>,
) -> impl Responder {
    let (last_username, username) =
        match (non_empty(&rename_req.last_username), non_empty(&rename_req.username)) {
            (Some(last_username), Some(username)) => (last_username, username),
            _ => return HttpResponse::BadRequest().json(MessageResponse::new("Missing fields")),
        };

    match ledger.rename_user(last_username, username) {
        Ok(()) => HttpResponse::Ok().json(RenameResponse { success: true }),
        Err(LedgerError::Identity(err)) => {
            HttpResponse::BadRequest().json(MessageResponse::new(err.to_string()))
        }
        Err(err) => HttpResponse::InternalServerError().json(MessageResponse::new(err.to_string())),
    }
}

/// Get a user's balance
///
/// Derived from committed blocks; pending transactions do not count
#[utoipa::path(
    post,
    path = "/user/balance",
    request_body = UsernameRequest,
    responses(
        (status = 200, description = "Balance computed", body = BalanceResponse),
        (status = 400, description = "Missing fields", body = MessageResponse)
    )
)]
pub async fn get_user_balance(
    ledger: LedgerData,
    user_req: web::Json<UsernameRequest>,
) -> impl Responder {
    let Some(username) = non_empty(&user_req.username) else {
        return HttpResponse::BadRequest().json(MessageResponse::new("Missing fields"));
    };

    HttpResponse::Ok().json(BalanceResponse {
        username: username.to_string(),
        balance: ledger.balance_of(username),
    })
}

/// Get a user's transactions
///
/// Committed transactions in chain order, with identities shown under their
/// current names. This is the only read route that maps ids to display names;
/// the block routes return what was hashed.
#[utoipa::path(
    post,
    path = "/user/transactions",
    request_body = UsernameRequest,
    responses(
        (status = 200, description = "Transactions retrieved", body = UserTransactionsResponse),
        (status = 400, description = "Missing fields", body = MessageResponse)
    )
)]
pub async fn get_user_transactions(
    ledger: LedgerData,
    user_req: web::Json<UsernameRequest>,
) -> impl Responder {
    let Some(username) = non_empty(&user_req.username) else {
        return HttpResponse::BadRequest().json(MessageResponse::new("Missing fields"));
    };

    let transactions = ledger
        .transactions_for(username)
        .into_iter()
        .map(|tx| {
            Transaction::new(
                ledger.display_name(&tx.sender),
                ledger.display_name(&tx.recipient),
                tx.amount,
            )
        })
        .collect();

    HttpResponse::Ok().json(UserTransactionsResponse { transactions })
}
