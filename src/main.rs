use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod config;
mod ledger;

use config::Config;
use ledger::Ledger;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::validate_chain,
        api::handlers::get_last_block,
        api::handlers::new_transaction,
        api::handlers::get_pending_transactions,
        api::handlers::mine_block,
        api::handlers::change_username,
        api::handlers::get_user_balance,
        api::handlers::get_user_transactions
    ),
    components(
        schemas(
            ledger::Block,
            ledger::Transaction,
            api::handlers::MessageResponse,
            api::handlers::ChainResponse,
            api::handlers::LastBlockResponse,
            api::handlers::PendingResponse,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineRequest,
            api::handlers::MineResponse,
            api::handlers::RenameRequest,
            api::handlers::RenameResponse,
            api::handlers::UsernameRequest,
            api::handlers::BalanceResponse,
            api::handlers::UserTransactionsResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger API endpoints")
    ),
    info(
        title = "Ledger API",
        version = "0.1.0",
        description = "A single-node proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()?;

    // The one ledger for this process, shared by every worker
    let ledger = web::Data::new(Ledger::new());
    info!(
        "Ledger ready with genesis block, proof difficulty {}",
        ledger.difficulty()
    );

    info!("Starting HTTP server at http://{}:{}", config.host, config.port);

    // Start HTTP server
    HttpServer::new(move || {
        // The wallet client is served from another origin
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(ledger.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind(config.bind_address())?
    .run()
    .await?;

    Ok(())
}
