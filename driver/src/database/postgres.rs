use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use error_stack::{Report, ResultExt};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::DependOnBookQuery;
use kernel::interface::update::DependOnBookModifier;
use kernel::KernelError;

use crate::error::ConvertError;
use crate::{env, env_parse};

pub use self::book::*;

mod book;

static POSTGRES_URL: &str = "POSTGRES_URL";
static POSTGRES_MAX_CONNECTIONS: &str = "POSTGRES_MAX_CONNECTIONS";
static POSTGRES_MIN_CONNECTIONS: &str = "POSTGRES_MIN_CONNECTIONS";
static POSTGRES_IDLE_TIMEOUT: &str = "POSTGRES_IDLE_TIMEOUT";
static POSTGRES_QUERY_TIMEOUT: &str = "POSTGRES_QUERY_TIMEOUT";

/// SQLSTATE raised when `statement_timeout` cancels a statement.
const QUERY_CANCELED: &str = "57014";

/// Pool and statement settings. `from_env` reads them from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    /// Deadline of every statement issued by a repository.
    pub query_timeout: Duration,
}

impl PostgresConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);
    pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            min_connections: 0,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            query_timeout: Self::DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// `POSTGRES_IDLE_TIMEOUT` is in seconds, `POSTGRES_QUERY_TIMEOUT` in milliseconds.
    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        let mut config = Self::new(env(POSTGRES_URL)?);
        if let Some(max) = env_parse(POSTGRES_MAX_CONNECTIONS)? {
            config.max_connections = max;
        }
        if let Some(min) = env_parse(POSTGRES_MIN_CONNECTIONS)? {
            config.min_connections = min;
        }
        if let Some(secs) = env_parse(POSTGRES_IDLE_TIMEOUT)? {
            config.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = env_parse(POSTGRES_QUERY_TIMEOUT)? {
            config.query_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
    deadline: Duration,
    books: PostgresBookRepository,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        Self::connect(PostgresConfig::from_env()?).await
    }

    pub async fn connect(config: PostgresConfig) -> error_stack::Result<Self, KernelError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.query_timeout)
            .connect(&config.url)
            .await
            .convert_error()
            .attach_printable("Failed to connect postgres")?;
        tracing::debug!(
            max_connections = config.max_connections,
            query_timeout_ms = config.query_timeout.as_millis() as u64,
            "postgres pool ready"
        );
        Ok(Self {
            pool,
            deadline: config.query_timeout,
            books: PostgresBookRepository::new(config.query_timeout),
        })
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresConnection;
    /// Opens a transaction whose statements the server cancels once they run past
    /// the configured deadline.
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let mut transaction = within(self.deadline, self.pool.begin()).await?;
        within(
            self.deadline,
            // language=postgresql
            sqlx::query("SELECT set_config('statement_timeout', $1, true)")
                .bind(self.deadline.as_millis().to_string())
                .execute(&mut *transaction),
        )
        .await?;
        Ok(PostgresConnection {
            transaction,
            deadline: self.deadline,
            abandoned: false,
        })
    }
}

impl DependOnBookQuery for PostgresDatabase {
    type BookQuery = PostgresBookRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &self.books
    }
}

impl DependOnBookModifier for PostgresDatabase {
    type BookModifier = PostgresBookRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &self.books
    }
}

pub struct PostgresConnection {
    transaction: sqlx::Transaction<'static, Postgres>,
    deadline: Duration,
    abandoned: bool,
}

impl PostgresConnection {
    /// Marks the connection abandoned when `result` failed on the client-side deadline.
    ///
    /// The server may still be working on the dropped statement, so an abandoned
    /// connection is never used again. It is released without waiting on it.
    pub(in crate::database) fn track<T>(
        &mut self,
        result: error_stack::Result<T, KernelError>,
    ) -> error_stack::Result<T, KernelError> {
        if let Err(report) = &result {
            if report.contains::<DeadlineExceeded>() {
                self.abandoned = true;
            }
        }
        result
    }
}

#[async_trait::async_trait]
impl Transaction for PostgresConnection {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        if self.abandoned {
            return Err(Report::new(KernelError::Timeout)
                .attach_printable("Cannot commit after a statement deadline was exceeded"));
        }
        within(self.deadline, self.transaction.commit()).await
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        if self.abandoned {
            // Dropping queues the rollback; the pool flushes it off the caller's path.
            tracing::warn!("releasing connection abandoned after statement deadline");
            drop(self.transaction);
            return Ok(());
        }
        within(self.deadline, self.transaction.rollback()).await
    }
}

impl Deref for PostgresConnection {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl DerefMut for PostgresConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.transaction
    }
}

impl<T: 'static> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = match &error {
                Error::PoolTimedOut => KernelError::Timeout,
                Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
                    KernelError::Timeout
                }
                Error::RowNotFound => KernelError::NotFound,
                _ => KernelError::Internal,
            };
            Report::from(error).change_context(context)
        })
    }
}

/// Attached to a `Timeout` report raised by [`within`] itself rather than by the server.
#[derive(Debug)]
pub(in crate::database) struct DeadlineExceeded;

/// Runs one statement under `deadline` on the client side, as a backstop to the
/// server's `statement_timeout`. Expiry leaves the row state unknown and is reported
/// as `Timeout`, never retried here.
pub(in crate::database) async fn within<T, F>(
    deadline: Duration,
    statement: F,
) -> error_stack::Result<T, KernelError>
where
    T: 'static,
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(deadline, statement).await {
        Ok(result) => result.convert_error(),
        Err(elapsed) => {
            tracing::warn!(
                deadline_ms = deadline.as_millis() as u64,
                "statement deadline exceeded"
            );
            Err(Report::new(elapsed)
                .change_context(KernelError::Timeout)
                .attach(DeadlineExceeded)
                .attach_printable(format!("Statement exceeded {deadline:?}")))
        }
    }
}

#[cfg(test)]
pub(in crate::database) mod test_support {
    use std::time::Duration;

    use sqlx::Executor;

    use kernel::KernelError;

    use crate::error::ConvertError;

    use super::{PostgresConfig, PostgresDatabase};

    // Advisory lock keeps concurrently starting tests from racing on the DDL.
    const SCHEMA: &str = concat!(
        "SELECT pg_advisory_xact_lock(8157);\n",
        include_str!("../../migrations/0001_books.sql")
    );

    pub async fn database() -> error_stack::Result<PostgresDatabase, KernelError> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("driver=debug"))
            .with_test_writer()
            .try_init();
        let db = PostgresDatabase::new().await?;
        db.pool.execute(SCHEMA).await.convert_error()?;
        Ok(db)
    }

    /// A second pool on the prepared schema whose statements expire after `deadline`.
    pub async fn database_with_deadline(
        deadline: Duration,
    ) -> error_stack::Result<PostgresDatabase, KernelError> {
        database().await?;
        let mut config = PostgresConfig::from_env()?;
        config.query_timeout = deadline;
        PostgresDatabase::connect(config).await
    }
}
