//! Student commands - init, seed, list, add, update-email, remove
//!
//! Each command opens its own connection through `with_store`, so the
//! connection is closed even when the command fails midway.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rollbook_store::{with_store, DatabaseConfig, NewStudent};
use tracing::warn;

use crate::output;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print a JSON array instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Email address (must be unique)
    pub email: String,

    /// Enrollment date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub enrolled: Option<NaiveDate>,

    /// Print the stored student as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct UpdateEmailArgs {
    /// Student ID
    pub student_id: i32,

    /// New email address
    pub email: String,
}

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Student ID
    pub student_id: i32,
}

pub async fn run_init(config: DatabaseConfig) -> Result<()> {
    with_store(config, |store| {
        Box::pin(async move {
            store
                .create_schema()
                .await
                .context("Failed to create students table")
        })
    })
    .await?;

    println!("students table ready");
    Ok(())
}

pub async fn run_seed(config: DatabaseConfig) -> Result<()> {
    let inserted = with_store(config, |store| {
        Box::pin(async move {
            store
                .seed_demo()
                .await
                .context("Failed to insert demo students")
        })
    })
    .await?;

    println!("inserted {} demo students", inserted);
    Ok(())
}

pub async fn run_list(config: DatabaseConfig, args: ListArgs) -> Result<()> {
    let students = with_store(config, |store| {
        Box::pin(async move { store.list_all().await.context("Failed to list students") })
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&students)?);
    } else {
        print!("{}", output::students_table(&students));
    }
    Ok(())
}

pub async fn run_add(config: DatabaseConfig, args: AddArgs) -> Result<()> {
    let new = NewStudent::new(args.first_name, args.last_name, args.email, args.enrolled);

    let stored = with_store(config, |store| {
        Box::pin(async move {
            store.add(&new).await.map_err(|e| {
                if e.is_unique_violation() {
                    anyhow::Error::new(e)
                        .context(format!("A student with email {} already exists", new.email))
                } else {
                    anyhow::Error::new(e).context("Failed to add student")
                }
            })
        })
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
    } else {
        print!("{}", output::students_table(std::slice::from_ref(&stored)));
    }
    Ok(())
}

pub async fn run_update_email(config: DatabaseConfig, args: UpdateEmailArgs) -> Result<()> {
    let UpdateEmailArgs { student_id, email } = args;

    let rows = with_store(config, |store| {
        Box::pin(async move {
            store
                .update_email(student_id, &email)
                .await
                .with_context(|| format!("Failed to update email for student {}", student_id))
        })
    })
    .await?;

    if rows == 0 {
        warn!(student_id, "no student with that id; nothing updated");
    }
    println!("{} row(s) updated", rows);
    Ok(())
}

pub async fn run_remove(config: DatabaseConfig, args: RemoveArgs) -> Result<()> {
    let student_id = args.student_id;

    let rows = with_store(config, |store| {
        Box::pin(async move {
            store
                .remove(student_id)
                .await
                .with_context(|| format!("Failed to delete student {}", student_id))
        })
    })
    .await?;

    if rows == 0 {
        warn!(student_id, "no student with that id; nothing deleted");
    }
    println!("{} row(s) deleted", rows);
    Ok(())
}
