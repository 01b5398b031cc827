use anyhow::Result;
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use connectkeep::core::Config;
use connectkeep::features::channels;
use connectkeep::{run_daily_sweep, Database, Dispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Running ConnectKeep daily sweep...");

    let database = Arc::new(Database::new(&config.database_path).await?);
    let (push, email) = channels::from_config(&config)?;
    let dispatcher = Dispatcher::new(
        database.clone(),
        database.clone(),
        database.clone(),
        push,
        email,
        Arc::new(channels::capabilities_from_config(&config)),
    )
    .with_ledger(database.clone())
    .with_app_url(config.app_url.clone());

    let report = run_daily_sweep(&dispatcher, database.as_ref(), database.as_ref()).await?;
    if report.failures > 0 {
        warn!("{} user(s) had delivery failures", report.failures);
    }

    Ok(())
}
