use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error_handler))
        .route("/chain", web::get().to(handlers::get_chain))
        .route("/chain/validate", web::get().to(handlers::validate_chain))
        .route("/last_block", web::get().to(handlers::get_last_block))
        .route("/transactions/new", web::post().to(handlers::new_transaction))
        .route("/transactions/pending", web::get().to(handlers::get_pending_transactions))
        .route("/mine", web::post().to(handlers::mine_block))
        .route("/user/change", web::post().to(handlers::change_username))
        .route("/user/balance", web::post().to(handlers::get_user_balance))
        .route("/user/transactions", web::post().to(handlers::get_user_transactions));
}
