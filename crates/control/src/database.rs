use airport_models::{AirportError, DatabaseConfig};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgConnection, PgPool};
use std::time::Duration;
use tracing::{info, warn};

pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(&config.password)
        .disable_statement_logging()
}

pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, AirportError> {
    info!("Connecting to database {}", config.redacted_url());
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(config))
        .await?;
    Ok(pool)
}

/// Block until the database accepts a connection, trying at most
/// `wait_attempts` times with `wait_interval_ms` between attempts.
pub async fn wait_for_database(config: &DatabaseConfig) -> Result<u32, AirportError> {
    let attempts = config.wait_attempts.max(1);
    let interval = Duration::from_millis(config.wait_interval_ms);
    let options = connect_options(config);
    let mut last_error = String::new();

    info!("Waiting for database {}...", config.redacted_url());
    for attempt in 1..=attempts {
        match PgConnection::connect_with(&options).await {
            Ok(connection) => {
                let _ = connection.close().await;
                info!("Database available after {} attempt(s)", attempt);
                return Ok(attempt);
            }
            Err(e) => {
                warn!(
                    "Database unavailable (attempt {}/{}): {}",
                    attempt, attempts, e
                );
                last_error = e.to_string();
            }
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(AirportError::DatabaseUnavailable {
        attempts,
        reason: last_error,
    })
}
