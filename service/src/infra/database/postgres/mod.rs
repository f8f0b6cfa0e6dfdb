//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use refinery::Report;
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;
use tracing as log;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use deadpool_postgres::Config;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

mod embedded {
    //! Schema migrations embedded into the binary.

    refinery::embed_migrations!("../migrations");
}

/// Postgres [`Database`] client.
///
/// Outside a transaction every statement runs on its own pooled connection.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// No connection is established until the first statement.
    ///
    /// # Errors
    ///
    /// If the provided [`Config`] doesn't describe a valid pool.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }

    /// Applies the embedded schema migrations not applied yet.
    ///
    /// # Errors
    ///
    /// If any of the migrations fails to apply.
    pub async fn migrate(&self) -> Result<Report, Traced<database::Error>> {
        let mut conn = self.0.connection().await.map_err(tracerr::wrap!())?;
        let report = embedded::migrations::runner()
            .run_async(&mut **conn)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        for m in report.applied_migrations() {
            log::info!("applied `{m}` migration");
        }
        Ok(report)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Schema migration error.
    #[display("Migration failed: {_0}")]
    Migration(refinery::Error),

    /// Error of creating a new [`connection::Pool`] client.
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        let Some(db) = e.as_db_error() else {
            return false;
        };

        *db.code() == SqlState::UNIQUE_VIOLATION
            && constraint.map_or(true, |c| db.constraint() == Some(c))
    }
}
