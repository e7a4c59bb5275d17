//! The record store: one owned PostgreSQL connection and the student operations
//!
//! - One connection, no pool; operations take `&mut self`
//! - Every statement auto-commits (no explicit transactions)
//! - Uniqueness is left to the database; conflicts come back as errors

use futures::future::BoxFuture;
use futures::TryStreamExt;
use sqlx::postgres::PgTypeInfo;
use sqlx::{Column, Connection, Either, Executor, PgConnection, Statement};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::models::{NewStudent, Student};
use crate::result::{ResultSet, SqlParam};
use crate::schema;

/// Student record store backed by a single connection
pub struct RecordStore {
    config: DatabaseConfig,
    conn: Option<PgConnection>,
}

impl RecordStore {
    /// Create a disconnected store.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, conn: None }
    }

    /// Create a store and connect it.
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        let mut store = Self::new(config);
        store.connect().await?;
        Ok(store)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the connection. No retry; on failure the store stays disconnected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            debug!("already connected to {}", self.config.target());
            return Ok(());
        }

        let target = self.config.target();
        match PgConnection::connect_with(&self.config.connect_options()).await {
            Ok(conn) => {
                info!(db = %target, "connected to PostgreSQL");
                self.conn = Some(conn);
                Ok(())
            }
            Err(e) => {
                warn!(db = %target, error = %e, "failed to connect to PostgreSQL");
                Err(StoreError::connection(target, e))
            }
        }
    }

    /// Close the connection if one is open; no-op otherwise.
    ///
    /// The handle is dropped even when the graceful close fails.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        conn.close().await.map_err(|e| {
            warn!(error = %e, "error while closing connection");
            StoreError::connection(self.config.target(), e)
        })?;

        info!("disconnected from PostgreSQL");
        Ok(())
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn.as_mut().ok_or(StoreError::NotConnected)
    }

    /// Execute one statement with positional `$n` parameters.
    ///
    /// Commits immediately. Rows returned by the statement (SELECT, or any
    /// statement with RETURNING) are decoded into the result set; column
    /// names are filled in even when no row matches.
    pub async fn run(&mut self, query: &str, params: &[SqlParam]) -> Result<ResultSet> {
        debug!(sql = query.trim(), params = params.len(), "run");

        let conn = self.conn()?;

        // Same parameter types as the bind below, so execution reuses this
        // cached statement
        let types: Vec<PgTypeInfo> = params.iter().map(SqlParam::type_info).collect();
        let prepared = (&mut *conn)
            .prepare_with(query, &types)
            .await
            .map_err(|e| query_failed("running query", e))?;
        let columns = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut statement = sqlx::query(query);
        for param in params {
            statement = param.bind_to(statement);
        }

        let mut result = ResultSet::with_columns(columns);
        let mut stream = (&mut *conn).fetch_many(statement);
        while let Some(step) = stream
            .try_next()
            .await
            .map_err(|e| query_failed("running query", e))?
        {
            match step {
                Either::Left(done) => result.rows_affected += done.rows_affected(),
                Either::Right(row) => result.push_row(&row),
            }
        }

        Ok(result)
    }

    /// Create the `students` table if it does not exist.
    pub async fn create_schema(&mut self) -> Result<()> {
        schema::create(self.conn()?).await
    }

    /// Insert the demonstration students.
    pub async fn seed_demo(&mut self) -> Result<u64> {
        schema::seed(self.conn()?).await
    }

    /// All students, in whatever order the database returns them.
    pub async fn list_all(&mut self) -> Result<Vec<Student>> {
        debug!("listing all students");

        sqlx::query_as::<_, Student>("SELECT * FROM students")
            .fetch_all(self.conn()?)
            .await
            .map_err(|e| query_failed("listing students", e))
    }

    /// Insert a student and return the stored row with its assigned id.
    ///
    /// A duplicate email fails with a unique violation and inserts nothing.
    pub async fn add(&mut self, student: &NewStudent) -> Result<Student> {
        let stored = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (first_name, last_name, email, enrollment_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(student.enrollment_date)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| query_failed("adding student", e))?;

        info!(
            student_id = stored.student_id,
            "added student {}",
            stored.full_name()
        );
        Ok(stored)
    }

    /// Change one student's email. Returns rows affected (0 when the id is unknown).
    pub async fn update_email(&mut self, student_id: i32, new_email: &str) -> Result<u64> {
        let done = sqlx::query("UPDATE students SET email = $1 WHERE student_id = $2")
            .bind(new_email)
            .bind(student_id)
            .execute(self.conn()?)
            .await
            .map_err(|e| query_failed("updating student email", e))?;

        info!(
            student_id,
            email = new_email,
            rows = done.rows_affected(),
            "updated student email"
        );
        Ok(done.rows_affected())
    }

    /// Delete one student. Returns rows affected (0 when the id is unknown).
    pub async fn remove(&mut self, student_id: i32) -> Result<u64> {
        let done = sqlx::query("DELETE FROM students WHERE student_id = $1")
            .bind(student_id)
            .execute(self.conn()?)
            .await
            .map_err(|e| query_failed("deleting student", e))?;

        info!(student_id, rows = done.rows_affected(), "deleted student");
        Ok(done.rows_affected())
    }
}

fn query_failed(context: &str, e: sqlx::Error) -> StoreError {
    warn!(error = %e, "{} failed", context);
    StoreError::query(context, e)
}

/// Open a store, run `f` against it, and close the connection afterwards
/// whether or not `f` succeeded.
///
/// ```ignore
/// let students = with_store(config, |store| {
///     Box::pin(async move { store.list_all().await })
/// })
/// .await?;
/// ```
pub async fn with_store<T, E, F>(config: DatabaseConfig, f: F) -> std::result::Result<T, E>
where
    E: From<StoreError>,
    F: for<'s> FnOnce(&'s mut RecordStore) -> BoxFuture<'s, std::result::Result<T, E>>,
{
    let mut store = RecordStore::open(config).await?;
    let outcome = f(&mut store).await;
    let closed = store.disconnect().await;

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        // The close error was already logged; the caller cares about the first failure
        (Err(e), _) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn new_store_is_disconnected() {
        let store = RecordStore::new(DatabaseConfig::default());
        assert!(!store.is_connected());
        assert_eq!(store.config().port, 5432);
    }

    #[tokio::test]
    async fn operations_require_connection() {
        let mut store = RecordStore::new(DatabaseConfig::default());

        assert!(matches!(store.list_all().await, Err(StoreError::NotConnected)));
        assert!(matches!(
            store.update_email(1, "x@example.com").await,
            Err(StoreError::NotConnected)
        ));
        assert!(matches!(store.remove(1).await, Err(StoreError::NotConnected)));
        assert!(matches!(
            store.run("SELECT 1", &[]).await,
            Err(StoreError::NotConnected)
        ));
        assert!(matches!(store.create_schema().await, Err(StoreError::NotConnected)));
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_noop() {
        let mut store = RecordStore::new(DatabaseConfig::default());
        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn failed_connect_leaves_store_disconnected() {
        let mut store = RecordStore::new(unreachable_config());

        let err = store.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection { .. }));
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn with_store_reports_connection_failure() {
        let result: Result<()> = with_store(unreachable_config(), |_store| {
            Box::pin(async move { Err(StoreError::config("closure ran without a connection")) })
        })
        .await;

        assert!(matches!(result, Err(StoreError::Connection { .. })));
    }
}
