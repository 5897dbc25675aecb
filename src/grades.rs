//! Grade lookup and assignment submission tracking over the spreadsheet stores.
//!
//! Both operations re-read their workbook on every call; nothing is cached.
//! The submission update is a whole-file read-modify-write with no
//! serialization against concurrent writers (documented limitation).

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::models::GradeRecord;
use crate::sheet;

/// Outcome of marking an assignment submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The row was updated and the table persisted.
    Updated,
    /// The registration number has no row in the sheet.
    StudentNotFound,
    /// The assignment sheet itself is missing from the library.
    SheetMissing,
}

impl SubmissionOutcome {
    /// User-facing message for the direct registration-intent answer.
    pub fn message(&self) -> &'static str {
        match self {
            SubmissionOutcome::Updated => "Assignment submitted successfully!",
            SubmissionOutcome::StudentNotFound => "Register number not found.",
            SubmissionOutcome::SheetMissing => {
                "assignment.xlsx not found in library folder."
            }
        }
    }
}

fn marksheet_path(config: &Config) -> PathBuf {
    config.library.root.join(&config.library.marksheet)
}

fn assignment_path(config: &Config) -> PathBuf {
    config.library.root.join(&config.library.assignment_sheet)
}

/// Look up a student by roll number in the marksheet.
///
/// Case-insensitive exact match on the `RollNo` column. A missing marksheet
/// or absent row both yield `None`; absence is a valid outcome, not an error.
pub fn lookup_grade(config: &Config, roll_number: &str) -> Result<Option<GradeRecord>> {
    let path = marksheet_path(config);
    if !path.exists() {
        return Ok(None);
    }

    let table = sheet::read_table(&path)?;
    for i in 0..table.rows.len() {
        let Some(roll) = table.get(i, "RollNo") else {
            continue;
        };
        if !roll.eq_ignore_ascii_case(roll_number) {
            continue;
        }
        let cgpa = table
            .get(i, "CGPA")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        return Ok(Some(GradeRecord {
            roll_number: roll.to_string(),
            cgpa,
            name: table.get(i, "Name").map(|s| s.to_string()),
        }));
    }

    Ok(None)
}

/// Set the matching row's `submitted` flag to the literal `"true"` and
/// persist the whole table.
///
/// "Not found" is reported explicitly, never silently ignored.
pub fn mark_submitted(config: &Config, reg_number: &str) -> Result<SubmissionOutcome> {
    let path = assignment_path(config);
    if !path.exists() {
        return Ok(SubmissionOutcome::SheetMissing);
    }

    let mut table = sheet::read_table(&path)?;
    let mut matched = None;
    for i in 0..table.rows.len() {
        if table
            .get(i, "regno")
            .is_some_and(|r| r.eq_ignore_ascii_case(reg_number))
        {
            matched = Some(i);
            break;
        }
    }

    let Some(row) = matched else {
        return Ok(SubmissionOutcome::StudentNotFound);
    };

    table.set(row, "submitted", "true");
    sheet::write_table(&path, &table)?;

    Ok(SubmissionOutcome::Updated)
}
