use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    SqlErr, Statement, TransactionTrait,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{Credentials, UserChanges, UserRepository, UserRow};
pub use repositories::virtual_machine::VirtualMachineRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        prepare_sqlite_path(db_url).await?;

        // SQLite has a single writer (concurrent deferred transactions hit
        // SQLITE_BUSY) and each `sqlite::memory:` connection is its own
        // database: one pooled connection, operations queue on it.
        let max_connections = if is_sqlite(db_url) {
            1
        } else {
            max_connections
        };
        let min_connections = min_connections.min(max_connections);

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Starts a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        Ok(self.conn.begin().await?)
    }

    #[must_use]
    pub const fn users(&self) -> UserRepository<'_, DatabaseConnection> {
        UserRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn virtual_machines(&self) -> VirtualMachineRepository<'_, DatabaseConnection> {
        VirtualMachineRepository::new(&self.conn)
    }
}

/// Whether `err` (or anything in its context chain) is a unique-constraint
/// violation reported by the database.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DbErr>())
        .any(|db_err| matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}

fn is_sqlite(db_url: &str) -> bool {
    db_url.starts_with("sqlite:")
}

fn is_sqlite_memory(db_url: &str) -> bool {
    db_url.starts_with("sqlite::memory:") || db_url.contains("mode=memory")
}

/// Creates the parent directory of a file-backed SQLite database.
async fn prepare_sqlite_path(db_url: &str) -> Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    if is_sqlite_memory(db_url) {
        return Ok(());
    }

    let path_str = rest.trim_start_matches("//");
    let path_str = path_str.split('?').next().unwrap_or(path_str);
    if let Some(parent) = Path::new(path_str).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    Ok(())
}
