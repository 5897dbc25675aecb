//! Core data models used throughout studydesk.
//!
//! These types represent the library files, grade rows, extracted subject
//! records, and question/answer payloads that flow through the pipeline.

use serde::{Deserialize, Serialize};

/// Snapshot of one file in the library directory.
///
/// The collection of entries is rebuilt wholesale on every scan; individual
/// entries are never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size_bytes: u64,
    /// Lowercase extension including the leading dot (e.g. `".pdf"`).
    pub extension: String,
}

impl FileEntry {
    /// File name without its extension, for loose matching against questions.
    pub fn stem(&self) -> &str {
        self.name
            .strip_suffix(self.extension.as_str())
            .unwrap_or(&self.name)
    }

    /// Human-readable size, e.g. `"1.00 KB"`.
    pub fn size_kb(&self) -> String {
        format!("{:.2} KB", self.size_bytes as f64 / 1024.0)
    }
}

/// One student row from the marksheet table.
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub roll_number: String,
    pub cgpa: f64,
    pub name: Option<String>,
}

/// A subject parsed out of marksheet text.
///
/// Ephemeral: recomputed per request, never persisted. Accepted records
/// satisfy `|credit * grade_point - credit_point| < 0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRecord {
    pub credit: u32,
    pub grade_point: f64,
    pub credit_point: f64,
}

/// Credit-weighted aggregate over a non-empty set of subject records.
#[derive(Debug, Clone, PartialEq)]
pub struct SgpaSummary {
    pub total_credits: u32,
    pub total_credit_points: f64,
    /// `total_credit_points / total_credits`, rounded to two decimals.
    pub value: f64,
}

/// Internal evidence note produced by the roll-number classifier.
///
/// Not a direct answer: it is folded into the evidence bundle so the
/// generation step can use it.
#[derive(Debug, Clone)]
pub enum RollEvidence {
    Found {
        roll_number: String,
        record: GradeRecord,
    },
    NotFound {
        roll_number: String,
    },
}

/// Incoming question payload for `POST /ask` and `desk ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Answer payload. File fields are present only for specific-file responses.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(rename = "fileAvailable", skip_serializing_if = "Option::is_none")]
    pub file_available: Option<bool>,
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl AskResponse {
    /// Plain text answer with no file attachment.
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            file_available: None,
            file_name: None,
            download_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_entry_stem_strips_extension() {
        let f = FileEntry {
            name: "OS.pdf".to_string(),
            size_bytes: 1024,
            extension: ".pdf".to_string(),
        };
        assert_eq!(f.stem(), "OS");
        assert_eq!(f.size_kb(), "1.00 KB");
    }

    #[test]
    fn file_entry_stem_without_extension() {
        let f = FileEntry {
            name: "README".to_string(),
            size_bytes: 10,
            extension: String::new(),
        };
        assert_eq!(f.stem(), "README");
    }
}
