use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(connect_options(database_url)).await?;
    migration::Migrator::up(&db, None).await?;

    tracing::debug!(url = %database_url, "database ready");
    Ok(db)
}

fn connect_options(database_url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    // Every connection to an in-memory database is a separate database, and recycling the
    // only one loses it.
    if database_url.contains(":memory:") {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_database_keeps_one_connection() {
        let options = connect_options("sqlite::memory:");
        assert_eq!(options.get_max_connections(), Some(1));
        assert_eq!(options.get_min_connections(), Some(1));
    }

    #[test]
    fn file_database_uses_pool_defaults() {
        let options = connect_options("sqlite://moviweb.db?mode=rwc");
        assert_eq!(options.get_max_connections(), None);
    }
}
