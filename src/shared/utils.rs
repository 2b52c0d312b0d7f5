use anyhow::{Context, Result};
use diesel::{
    r2d2::{ConnectionManager, Pool},
    Connection, PgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn create_conn() -> Result<DbPool> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://guardian:@localhost:5432/guardian".to_string());
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .context("Failed to build database pool")
}

/// Direct connection to an arbitrary database, used by the CSV import which
/// targets a caller-supplied connection string rather than the app pool.
pub fn establish_pg_connection(database_url: &str) -> Result<PgConnection> {
    PgConnection::establish(database_url)
        .with_context(|| "Failed to connect to target database".to_string())
}

pub fn run_embedded_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().context("Failed to get connection for migrations")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration failure: {e}"))?;
    Ok(())
}
