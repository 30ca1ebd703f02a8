mod backend;
mod models;
mod submission_repository;

use crate::errors::Error;
use crate::schema::CREATE_SUBMISSIONS_TABLE;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::RunQueryDsl;
use std::sync::Arc;

pub use backend::SqliteBackend;
pub use models::*;
pub use submission_repository::*;

const DEFAULT_POOL_SIZE: u32 = 8;

/// Pool of SQLite connections
#[derive(Clone, Debug)]
pub struct Database {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

/// Lets concurrent writers wait on each other instead of failing with
/// `database is locked`
#[derive(Debug)]
struct BusyTimeout;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA busy_timeout = 5000")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        Ok(())
    }
}

impl Database {
    /// Opens (or creates) the database and its tables
    pub fn new(db_path: &str) -> Result<Self, Error> {
        Self::with_pool_size(db_path, DEFAULT_POOL_SIZE)
    }

    /// Same as [`Database::new`] with an explicit pool size.
    ///
    /// `:memory:` databases are per connection and need a size of 1.
    pub fn with_pool_size(db_path: &str, max_size: u32) -> Result<Self, Error> {
        let manager = ConnectionManager::<SqliteConnection>::new(db_path);
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(BusyTimeout))
            .build(manager)?;

        let database = Database {
            pool: Arc::new(pool),
        };
        database.ensure_schema()?;
        Ok(database)
    }

    pub fn get_conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, Error> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(&self) -> Result<(), Error> {
        let mut conn = self.get_conn()?;
        diesel::sql_query(CREATE_SUBMISSIONS_TABLE).execute(&mut *conn)?;
        Ok(())
    }
}
