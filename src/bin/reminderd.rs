use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use connectkeep::core::{Config, SystemClock};
use connectkeep::features::channels;
use connectkeep::{Database, Dispatcher, ReminderScheduler, SchedulerRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting ConnectKeep reminder daemon...");

    let database = Arc::new(Database::new(&config.database_path).await?);
    let (push, email) = channels::from_config(&config)?;
    let capabilities = Arc::new(channels::capabilities_from_config(&config));
    info!("Platform support: {}", config.platform_support());

    let clock = Arc::new(SystemClock);
    let dispatcher = Dispatcher::new(
        database.clone(),
        database.clone(),
        database.clone(),
        push,
        email,
        capabilities.clone(),
    )
    .with_ledger(database.clone())
    .with_clock(clock.clone())
    .with_app_url(config.app_url.clone());

    let scheduler =
        ReminderScheduler::new(Arc::new(dispatcher), database.clone(), capabilities, clock);
    let registry = SchedulerRegistry::new(scheduler, database.clone());

    match registry.bootstrap().await {
        Ok(count) => info!("⏰ {} reminder scheduler(s) running", count),
        Err(e) => error!("Failed to schedule reminders at start-up: {}", e),
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping schedulers...");
    registry.stop_all().await;

    Ok(())
}
