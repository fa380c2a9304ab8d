use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Opens the store and brings the schema up to date. Safe to run on every start.
pub async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options.sqlx_logging(false);
    if url.contains(":memory:") {
        // every pooled connection would otherwise see its own empty database
        options.max_connections(1);
    }

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to database at {}", url))?;
    init_schema(&db).await?;
    Ok(db)
}

pub async fn init_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    Migrator::up(db, None)
        .await
        .context("failed to migrate database")
}

#[cfg(test)]
pub async fn memory() -> DatabaseConnection {
    connect("sqlite::memory:").await.unwrap()
}
