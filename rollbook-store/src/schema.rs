//! Schema for the `students` table and the demonstration rows

use sqlx::PgConnection;

use crate::error::{Result, StoreError};

pub const CREATE_STUDENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS students (
        student_id SERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        enrollment_date DATE
    )
"#;

pub const SEED_STUDENTS: &str = r#"
    INSERT INTO students (first_name, last_name, email, enrollment_date) VALUES
    ('John', 'Doe', 'john.doe@example.com', '2023-09-01'),
    ('Jane', 'Smith', 'jane.smith@example.com', '2023-09-01'),
    ('Jim', 'Beam', 'jim.beam@example.com', '2023-09-02')
"#;

/// Create the students table if it does not exist yet
pub async fn create(conn: &mut PgConnection) -> Result<()> {
    tracing::info!("ensuring students table exists");

    sqlx::query(CREATE_STUDENTS)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query("creating students table", e))?;

    Ok(())
}

/// Insert the three demonstration students. Returns rows inserted.
///
/// Fails with a unique violation if any of the demo emails is already present;
/// the statement is atomic so nothing is inserted in that case.
pub async fn seed(conn: &mut PgConnection) -> Result<u64> {
    let done = sqlx::query(SEED_STUDENTS)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query("seeding demo students", e))?;

    tracing::info!(rows = done.rows_affected(), "seeded demo students");
    Ok(done.rows_affected())
}
