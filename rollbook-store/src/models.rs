//! Student records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Student row from the `students` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrollment_date: Option<NaiveDate>,
}

/// Fields supplied by the caller when adding a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrollment_date: Option<NaiveDate>,
}

impl NewStudent {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        enrollment_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            enrollment_date,
        }
    }
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_serializes_date_as_iso() {
        let student = Student {
            student_id: 1,
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@example.com".into(),
            enrollment_date: NaiveDate::from_ymd_opt(2023, 9, 1),
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["enrollment_date"], "2023-09-01");
        assert_eq!(json["student_id"], 1);
        assert_eq!(student.full_name(), "John Doe");
    }

    #[test]
    fn missing_enrollment_date_is_null() {
        let new = NewStudent::new("Jane", "Smith", "jane.smith@example.com", None);
        let json = serde_json::to_value(&new).unwrap();
        assert!(json["enrollment_date"].is_null());
    }
}
