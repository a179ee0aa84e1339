use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use clinicslot_db::schema::initialize_database;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    clinicslot_api::init_tracing(Level::INFO)?;

    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL environment variable must be set")?;

    info!("Connecting to database...");
    let db_pool = clinicslot_db::create_pool(&database_url, 1).await?;

    initialize_database(&db_pool).await?;
    db_pool.close().await;
    info!("Migration complete");
    Ok(())
}
