//! Intent classification for incoming questions.
//!
//! Classifiers are independent predicate+parser functions evaluated by the
//! pipeline in a fixed priority order:
//!
//! 1. registration number — absolute precedence, triggers the submission update
//! 2. file request — specific file, then listing
//! 3. metric (SGPA) query
//! 4. roll number — produces an evidence note, not a direct answer
//!
//! Each classifier operates on the question alone (plus the fresh file index
//! where relevant) so it can be tested in isolation.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::FileEntry;

/// Keywords that signal the user wants a file.
const FILE_KEYWORDS: &[&str] = &[
    "download",
    "download pdf",
    "download file",
    "open file",
    "send file",
    "get pdf",
    "give pdf",
    "show files",
    "list files",
    "available files",
];

/// Sub-keywords that turn an unmatched file request into a listing.
const LISTING_KEYWORDS: &[&str] = &["list", "available", "all files", "what files", "show me"];

fn registration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:reg|register)\s*(?:no|number)?\s*(?:is|:|=)?\s*(\w+)")
            .expect("static regex")
    })
}

fn roll_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:roll\s*(?:no|number)?\s*[:=]?\s*)(\w+)").expect("static regex")
    })
}

/// Registration-number mention, e.g. "my reg no is 21CS042".
///
/// Takes absolute precedence over every other classifier.
pub fn detect_registration(question: &str) -> Option<String> {
    registration_re()
        .captures(question)
        .map(|caps| caps[1].to_string())
}

/// Roll-number mention, e.g. "roll no: 21CS001". Produces the captured token.
pub fn detect_roll_number(question: &str) -> Option<String> {
    roll_re().captures(question).map(|caps| caps[1].to_string())
}

/// True when the question mentions a grade-point-average term.
pub fn is_metric_query(question: &str) -> bool {
    let q = question.to_lowercase();
    q.contains("gpa") || q.contains("sgpa")
}

/// Result of the file-request classifier.
#[derive(Debug, Clone)]
pub enum FileIntent {
    /// A known file's name appeared in the question; first match wins.
    Specific(FileEntry),
    /// The question asks for a listing of everything available.
    ListAll,
}

/// File-request classifier.
///
/// Returns `None` (fall through to later classifiers) unless a file keyword
/// is present. With a keyword, a specific file name match beats a listing
/// request; neither sub-case matching still falls through.
pub fn detect_file_request(question: &str, files: &[FileEntry]) -> Option<FileIntent> {
    let q = question.to_lowercase();

    if !FILE_KEYWORDS.iter().any(|k| q.contains(k)) {
        return None;
    }

    for file in files {
        let name = file.name.to_lowercase();
        let stem = file.stem().to_lowercase();
        if (!stem.is_empty() && q.contains(&stem)) || q.contains(&name) {
            return Some(FileIntent::Specific(file.clone()));
        }
    }

    if LISTING_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Some(FileIntent::ListAll);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, ext: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            size_bytes: 1024,
            extension: ext.to_string(),
        }
    }

    #[test]
    fn registration_variants_match() {
        assert_eq!(
            detect_registration("my reg no is 21CS042").as_deref(),
            Some("21CS042")
        );
        assert_eq!(
            detect_registration("register number: ABC123").as_deref(),
            Some("ABC123")
        );
        assert_eq!(detect_registration("Reg=XYZ9").as_deref(), Some("XYZ9"));
        assert_eq!(detect_registration("what is an operating system?"), None);
    }

    #[test]
    fn roll_number_variants_match() {
        assert_eq!(
            detect_roll_number("cgpa for roll no: 21CS001 please").as_deref(),
            Some("21CS001")
        );
        assert_eq!(detect_roll_number("Roll 42").as_deref(), Some("42"));
        assert_eq!(detect_roll_number("tell me about deadlock"), None);
    }

    #[test]
    fn metric_query_detection() {
        assert!(is_metric_query("what is my SGPA?"));
        assert!(is_metric_query("calculate gpa from my marksheet"));
        assert!(!is_metric_query("explain paging"));
    }

    #[test]
    fn specific_file_matches_without_extension() {
        let files = vec![file("OS.pdf", ".pdf"), file("DBMS.pdf", ".pdf")];
        let intent = detect_file_request("please download os for me", &files);
        match intent {
            Some(FileIntent::Specific(f)) => assert_eq!(f.name, "OS.pdf"),
            other => panic!("expected specific file, got {:?}", other),
        }
    }

    #[test]
    fn first_matching_file_wins() {
        let files = vec![file("AI.pdf", ".pdf"), file("AI-notes.pdf", ".pdf")];
        let intent = detect_file_request("download ai.pdf", &files);
        match intent {
            Some(FileIntent::Specific(f)) => assert_eq!(f.name, "AI.pdf"),
            other => panic!("expected specific file, got {:?}", other),
        }
    }

    #[test]
    fn listing_request_without_specific_file() {
        let files = vec![file("OS.pdf", ".pdf")];
        let intent = detect_file_request("what files are available for download?", &files);
        assert!(matches!(intent, Some(FileIntent::ListAll)));
    }

    #[test]
    fn no_file_keyword_falls_through() {
        let files = vec![file("OS.pdf", ".pdf")];
        assert!(detect_file_request("explain os scheduling", &files).is_none());
    }

    #[test]
    fn keyword_without_subcase_falls_through() {
        let files = vec![file("OS.pdf", ".pdf")];
        // "download" keyword but no known file and no listing keyword
        assert!(detect_file_request("download the moon", &files).is_none());
    }
}
