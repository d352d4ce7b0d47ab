use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use tracing::debug;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Applies per-connection SQLite pragmas as connections enter the pool
///
/// Foreign keys are off by default in SQLite, so each connection has to opt in.
#[derive(Debug, Clone, Copy)]
pub struct SqlitePragmas {
    /// How long a connection waits on a locked database, in milliseconds
    pub busy_timeout_ms: u32,
}

impl Default for SqlitePragmas {
    fn default() -> Self {
        Self { busy_timeout_ms: 5000 }
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates a connection pool for the given SQLite database URL
///
/// ### Arguments
///
/// * `database_url` - A file path, `:memory:`, or a `file:` URI
///
/// ### Errors
///
/// Returns an error if the pool cannot open its initial connections
pub fn init_pool(database_url: &str) -> anyhow::Result<DbPool> {
    debug!("Opening database pool for {}", database_url);

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas::default()))
        .build(manager)?;

    Ok(pool)
}
