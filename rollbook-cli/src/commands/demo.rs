//! Demo command - the fixed walkthrough over the students table
//!
//! create table -> seed -> list -> add -> list -> update email -> list
//! -> delete -> list. A failing step is logged and the walkthrough moves on;
//! only a failed connect stops it.

use anyhow::Result;
use chrono::NaiveDate;
use rollbook_store::{with_store, DatabaseConfig, NewStudent, RecordStore};
use tracing::{info, warn};

use crate::output;

const UPDATED_EMAIL: &str = "updated@email.com";

fn demo_student() -> NewStudent {
    NewStudent::new(
        "Joshua",
        "Test",
        "another213@email.com",
        NaiveDate::from_ymd_opt(2024, 3, 15),
    )
}

pub async fn run_demo(config: DatabaseConfig) -> Result<()> {
    with_store(config, |store| {
        Box::pin(async move {
            walkthrough(store).await;
            Ok::<_, anyhow::Error>(())
        })
    })
    .await
}

async fn walkthrough(store: &mut RecordStore) {
    step("create students table", store.create_schema().await);
    step("insert demo students", store.seed_demo().await);
    print_all(store).await;

    let added = step("add student", store.add(&demo_student()).await);
    if let Some(student) = &added {
        println!("Added student: {} (id {})", student.full_name(), student.student_id);
    }
    print_all(store).await;

    let Some(student) = added else {
        warn!("no student was added; skipping email update and delete");
        return;
    };

    if let Some(rows) = step(
        "update email",
        store.update_email(student.student_id, UPDATED_EMAIL).await,
    ) {
        println!(
            "Updated email to {} for student {} ({} row)",
            UPDATED_EMAIL, student.student_id, rows
        );
    }
    print_all(store).await;

    if let Some(rows) = step("delete student", store.remove(student.student_id).await) {
        println!("Deleted student {} ({} row)", student.student_id, rows);
    }
    print_all(store).await;

    info!("demo finished");
}

async fn print_all(store: &mut RecordStore) {
    if let Some(students) = step("list students", store.list_all().await) {
        println!("All students:");
        print!("{}", output::students_table(&students));
        println!();
    }
}

/// Log-and-continue: keep the value on success, warn and drop the error otherwise
fn step<T>(what: &str, outcome: rollbook_store::Result<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} failed: {}", what, e);
            None
        }
    }
}
