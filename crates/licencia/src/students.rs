//! Student extraction from the `D_{n}` / `D_{n+1}` field pairs

use crate::fields::FieldStore;
use serde::Serialize;
use spanish_text::{split_full_name, PersonName};

/// One student listed on the practice form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    /// National ID or passport number
    pub identifier: String,
    /// Name as written on the form
    pub full_name: String,
}

impl Student {
    pub fn new(identifier: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            full_name: full_name.into(),
        }
    }

    /// Given name and surnames
    pub fn name(&self) -> PersonName {
        split_full_name(&self.full_name)
    }
}

/// Walk the student pairs in order
///
/// Pairs start at `D_1`/`D_2` and advance by two. The walk stops at the first
/// pair with a missing half, so students listed after a gap are not returned.
pub fn extract_students(fields: &FieldStore) -> Vec<Student> {
    let mut students = Vec::new();
    let mut n = 1;

    while let (Some(identifier), Some(full_name)) = (
        fields.get(&format!("D_{n}")),
        fields.get(&format!("D_{}", n + 1)),
    ) {
        students.push(Student::new(identifier, full_name));
        n += 2;
    }

    let next = format!("D_{}", n + 2);
    if fields.contains(&next) {
        tracing::warn!(
            gap = %format!("D_{n}"),
            "Student list has a gap; entries after it are ignored"
        );
    }

    students
}
