//! Plain-text tables for command output

use rollbook_store::{ResultSet, Student};
use serde_json::Value;

const STUDENT_COLUMNS: [&str; 5] = [
    "student_id",
    "first_name",
    "last_name",
    "email",
    "enrollment_date",
];

/// Render students as an aligned table (header + one line per row)
pub fn students_table(students: &[Student]) -> String {
    let rows: Vec<Vec<String>> = students
        .iter()
        .map(|s| {
            vec![
                s.student_id.to_string(),
                s.first_name.clone(),
                s.last_name.clone(),
                s.email.clone(),
                s.enrollment_date.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();

    let header: Vec<String> = STUDENT_COLUMNS.iter().map(|c| c.to_string()).collect();
    render(&header, &rows)
}

/// Render a raw result set. Statements that return no columns report the
/// affected count; a query with columns but no rows prints an empty table.
pub fn result_table(set: &ResultSet) -> String {
    if set.columns.is_empty() {
        return format!("{} row(s) affected\n", set.rows_affected);
    }

    let rows: Vec<Vec<String>> = set
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    render(&set.columns, &rows)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&format!("({} row{})\n", rows.len(), if rows.len() == 1 { "" } else { "s" }));
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}
