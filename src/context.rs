//! Evidence-bundle assembly for the generation path.
//!
//! Builds the single bounded context string handed to the generation
//! collaborator. Section order and truncation are fixed: the file listing
//! always leads, then the roll-number note, then the uploaded-document
//! excerpt, then the subject textbook excerpt. No section is reordered or
//! dropped because of its length; the per-source caps alone bound the bundle.

use crate::config::ContextConfig;
use crate::models::{FileEntry, RollEvidence};

/// Inputs gathered by the pipeline before generation.
pub struct EvidenceSources<'a> {
    pub files: &'a [FileEntry],
    pub roll_evidence: Option<&'a RollEvidence>,
    pub document_text: &'a str,
    /// Subject name and corpus text, present only when the question named a
    /// subject whose textbook is loaded.
    pub textbook: Option<(&'a str, &'a str)>,
}

/// Build the evidence bundle. Rebuilt per request, never cached.
pub fn build_context(sources: &EvidenceSources<'_>, caps: &ContextConfig) -> String {
    let mut out = String::new();

    let names: Vec<&str> = sources.files.iter().map(|f| f.name.as_str()).collect();
    out.push_str(&format!(
        "AVAILABLE FILES IN LIBRARY: {}\n\n",
        names.join(", ")
    ));

    if let Some(evidence) = sources.roll_evidence {
        out.push_str(&roll_note(evidence));
        out.push_str("\n\n");
    }

    if !sources.document_text.trim().is_empty() {
        out.push_str(&format!(
            "UPLOADED DOCUMENT CONTENT:\n{}\n\n",
            truncate_chars(sources.document_text, caps.document_excerpt_chars)
        ));
    }

    if let Some((subject, corpus)) = sources.textbook {
        if !corpus.is_empty() {
            out.push_str(&format!(
                "TEXTBOOK CONTENT ({}):\n{}\n\n",
                subject,
                truncate_chars(corpus, caps.textbook_excerpt_chars)
            ));
        }
    }

    out
}

/// Evidence note for a roll-number lookup, phrased for the generation prompt.
pub fn roll_note(evidence: &RollEvidence) -> String {
    match evidence {
        RollEvidence::Found {
            roll_number,
            record,
        } => format!(
            "CRITICAL DATA FOUND: The student with Roll No {} has a CGPA of {}. Name: {}.",
            roll_number,
            record.cgpa,
            record.name.as_deref().unwrap_or("N/A")
        ),
        RollEvidence::NotFound { roll_number } => format!(
            "SYSTEM NOTE: User asked for Roll No {}, but it was not found in the marksheet.",
            roll_number
        ),
    }
}

/// First `max_chars` characters of `text`, safe on multi-byte boundaries.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
