use airport_models::AirportError;
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

/// Scripts under `crates/control/migrations`, embedded at build time.
/// Each runs in its own transaction and is recorded in `_sqlx_migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

fn migrate_error(error: MigrateError) -> AirportError {
    AirportError::DatabaseError {
        reason: format!("Migration failed: {}", error),
    }
}

/// Apply every migration not yet recorded. Returns the versions applied by this call.
pub async fn run_migrations(pool: &PgPool) -> Result<Vec<i64>, AirportError> {
    info!("Running database migrations...");

    let mut connection = pool.acquire().await?;
    connection
        .ensure_migrations_table()
        .await
        .map_err(migrate_error)?;
    let already_applied: Vec<i64> = connection
        .list_applied_migrations()
        .await
        .map_err(migrate_error)?
        .into_iter()
        .map(|migration| migration.version)
        .collect();
    drop(connection);

    MIGRATOR.run(pool).await.map_err(migrate_error)?;

    let mut newly_applied = Vec::new();
    for migration in MIGRATOR.iter() {
        if already_applied.contains(&migration.version) {
            continue;
        }
        info!(
            "Applied migration {:04}: {}",
            migration.version, migration.description
        );
        newly_applied.push(migration.version);
    }

    info!(
        "All migrations completed successfully ({} applied)",
        newly_applied.len()
    );
    Ok(newly_applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_are_embedded_in_order() {
        let migrations: Vec<(i64, &str)> = MIGRATOR
            .iter()
            .map(|m| (m.version, m.description.as_ref()))
            .collect();
        assert_eq!(migrations, vec![(1, "users"), (2, "airport")]);
    }

    #[test]
    fn airport_script_enforces_unique_seats() {
        let airport = MIGRATOR
            .iter()
            .find(|m| m.version == 2)
            .unwrap();
        assert!(airport.sql.contains("CREATE TABLE IF NOT EXISTS tickets"));
        assert!(airport.sql.contains("unique_ticket_seat_trip"));
    }
}
