use crate::cli::{Cli, Commands};
use crate::staticfiles::collect_static;
use airport_api::{start_server, AppState};
use airport_control::{
    connect_pool, run_migrations, wait_for_database, AccountService, PgRegistry, TokenIssuer,
};
use airport_metrics::TracingService;
use airport_models::Config;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load configuration, install logging, then run one management command.
/// Any error makes the process exit non-zero.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;
    TracingService::init(&config.logging);
    if let Some(path) = &config_path {
        info!("Configuration loaded from {}", path.display());
    }

    match cli.command {
        Commands::WaitForDb => {
            wait_for_database(&config.database).await?;
        }
        Commands::Migrate => migrate(&config).await?,
        Commands::Collectstatic { clear } => {
            let root = Path::new(&config.storage.static_root);
            let collected = collect_static(root, clear)
                .with_context(|| format!("failed to collect static files into {}", root.display()))?;
            info!(
                "{} static file(s) copied to {}",
                collected.len(),
                root.display()
            );
        }
        Commands::Createsuperuser { email, password } => {
            let pool = connect_pool(&config.database).await?;
            let accounts = AccountService::new(
                Arc::new(PgRegistry::new(pool)),
                TokenIssuer::new(&config.auth),
            );
            let user = accounts.create_superuser(&email, &password).await?;
            info!(user_id = user.id, "Superuser {} created", user.email);
        }
        Commands::Serve { bind } => serve(config, bind).await?,
    }
    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    let pool = connect_pool(&config.database).await?;
    let applied = run_migrations(&pool).await?;
    if applied.is_empty() {
        info!("No migrations to apply");
    } else {
        info!("Applied migrations: {:?}", applied);
    }
    pool.close().await;
    Ok(())
}

async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    config.validate()?;
    let bind = bind.unwrap_or_else(|| config.bind_address());

    let pool = connect_pool(&config.database).await?;
    let state = AppState::new(config, Arc::new(PgRegistry::new(pool)))?;

    info!("Starting airport service on {}", bind);
    start_server(&bind, state).await.map_err(|e| anyhow!(e))
}
