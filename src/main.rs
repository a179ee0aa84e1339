use std::sync::Arc;

use clinicslot_api::config::ApiConfig;
use clinicslot_db::{create_pool, schema::initialize_database, PgStore};
use eyre::Result;
use dotenv::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;
    clinicslot_api::init_tracing(config.log_level)?;

    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;
    initialize_database(&db_pool).await?;

    let store = Arc::new(PgStore::new(db_pool.clone()));
    clinicslot_api::start_server(config, store).await?;

    info!("Closing database pool");
    db_pool.close().await;

    Ok(())
}
