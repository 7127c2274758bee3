use billing_core::{
    config::{admins, database, settings},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load billing configuration
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load billing configuration: {}", e))?;
    info!(
        invoice_prefix = %config.numbering.invoice_prefix,
        quote_prefix = %config.numbering.quote_prefix,
        delete_policy = ?config.documents.delete_policy(),
        default_currency = %config.documents.default_currency,
        "Billing configuration loaded."
    );

    // 4. Connect and create the schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema is up to date."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    let admin_count = admins::get_admin_ids().len();
    info!(admin_count, "Billing core ready.");

    Ok(())
}
