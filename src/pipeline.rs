//! Question-handling pipeline and shared state.
//!
//! Control flow per question, in fixed precedence order:
//! registration intent and file intent short-circuit with direct answers;
//! the metric (SGPA) intent runs extraction over the uploaded document; all
//! other questions go through evidence assembly → generation → grounding
//! verification.
//!
//! The document context is a single process-wide holder with no per-session
//! isolation: an upload from one requester replaces the context every
//! concurrent requester sees. The `RwLock` only satisfies Rust's aliasing
//! rules; it does not add isolation. Single-context overwrite is the
//! intended behavior, not an oversight.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::context::{self, EvidenceSources};
use crate::extract::{self, DocumentFormat};
use crate::generate;
use crate::grades;
use crate::grounding::{self, GroundingStrategy, KeywordOverlap};
use crate::intent::{self, FileIntent};
use crate::library;
use crate::models::{AskRequest, AskResponse, RollEvidence, SgpaSummary};
use crate::sgpa;
use crate::textbook::TextbookLibrary;

/// Shared service state. Textbooks are immutable after startup; the document
/// context is replaced wholesale on each upload.
#[derive(Clone)]
pub struct DeskState {
    pub config: Arc<Config>,
    pub textbooks: Arc<TextbookLibrary>,
    pub document_context: Arc<RwLock<String>>,
    pub verifier: Arc<dyn GroundingStrategy>,
}

impl DeskState {
    pub fn new(config: Config, textbooks: TextbookLibrary) -> Self {
        Self {
            config: Arc::new(config),
            textbooks: Arc::new(textbooks),
            document_context: Arc::new(RwLock::new(String::new())),
            verifier: Arc::new(KeywordOverlap),
        }
    }
}

/// Ingest uploaded document bytes: extract text and replace the context.
pub async fn ingest_document(
    state: &DeskState,
    bytes: &[u8],
    format: DocumentFormat,
) -> Result<()> {
    let text = extract::extract_text(bytes, format, &state.config.ocr)?;
    *state.document_context.write().await = text;
    Ok(())
}

/// Answer one question. Collaborator failures (generation, file I/O) are
/// returned as errors for the boundary to convert into the uniform server
/// error; everything else produces a specific user-facing answer.
pub async fn handle_question(state: &DeskState, request: &AskRequest) -> Result<AskResponse> {
    let question = &request.question;

    // 1. Registration number: absolute precedence, mutates the submission
    //    sheet and answers directly.
    if let Some(reg_no) = intent::detect_registration(question) {
        let outcome = grades::mark_submitted(&state.config, &reg_no)?;
        return Ok(AskResponse::text(outcome.message()));
    }

    // 2. File request, against a fresh scan.
    let files = library::scan_library(&state.config)?;
    match intent::detect_file_request(question, &files) {
        Some(FileIntent::Specific(file)) => {
            let locator = format!(
                "{}/{}",
                state.config.server.download_base_url.trim_end_matches('/'),
                urlencoding::encode(&file.name)
            );
            return Ok(AskResponse {
                answer: format!("Here is the requested file: {}", file.name),
                file_available: Some(true),
                file_name: Some(file.name),
                download_url: Some(locator),
            });
        }
        Some(FileIntent::ListAll) => {
            return Ok(AskResponse::text(listing_message(&files)));
        }
        None => {}
    }

    // 3. Metric query over the uploaded document.
    if intent::is_metric_query(question) {
        let document = state.document_context.read().await;
        if document.trim().is_empty() {
            return Ok(AskResponse::text("Please upload your marksheet PDF first."));
        }

        let subjects = sgpa::extract_subjects(&document);
        return Ok(match sgpa::compute_sgpa(&subjects) {
            Some(summary) => AskResponse::text(sgpa_message(&summary)),
            None => AskResponse::text("Could not detect subjects in uploaded PDF."),
        });
    }

    // 4. Roll-number evidence note (not a direct answer). A failed marksheet
    //    read degrades to "not found" rather than failing the question.
    let roll_evidence = intent::detect_roll_number(question).map(|roll| {
        match grades::lookup_grade(&state.config, &roll) {
            Ok(Some(record)) => RollEvidence::Found {
                roll_number: roll,
                record,
            },
            Ok(None) => RollEvidence::NotFound { roll_number: roll },
            Err(e) => {
                eprintln!("marksheet lookup failed: {}", e);
                RollEvidence::NotFound { roll_number: roll }
            }
        }
    });

    // Evidence bundle → generation → grounding.
    let subject = request.subject.as_deref();
    let textbook = subject.and_then(|s| {
        state
            .textbooks
            .corpus_for(s)
            .map(|corpus| (s, corpus))
    });

    let document = state.document_context.read().await;
    let evidence = EvidenceSources {
        files: &files,
        roll_evidence: roll_evidence.as_ref(),
        document_text: &document,
        textbook,
    };
    let bundle = context::build_context(&evidence, &state.config.context);
    // Release the context lock before the long-latency generation call so a
    // concurrent upload is not blocked behind it.
    drop(document);

    let file_names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let system = generate::system_prompt(subject, &file_names);
    let user = generate::user_prompt(&bundle, question, subject);

    let mut answer = generate::generate_answer(&state.config.generation, &system, &user).await?;

    // Verify only when a textbook excerpt was actually supplied as evidence.
    if let (Some(subject), Some((_, corpus))) = (subject, textbook) {
        let excerpt = truncated_excerpt(corpus, state.config.context.textbook_excerpt_chars);
        answer = state.verifier.verify(&answer, question, excerpt, subject);
    }

    Ok(AskResponse::text(grounding::strip_urls(&answer)))
}

/// The listing answer for "what files are available".
fn listing_message(files: &[crate::models::FileEntry]) -> String {
    if files.is_empty() {
        return "No files are currently available in the library folder.".to_string();
    }

    let listing: Vec<String> = files
        .iter()
        .map(|f| format!("{} ({})", f.name, f.size_kb()))
        .collect();
    format!(
        "Here are the files available in the library:\n\n{}\n\nYou can ask me to download any of these files.",
        listing.join("\n")
    )
}

/// The SGPA answer, echoing the totals behind the final value.
fn sgpa_message(summary: &SgpaSummary) -> String {
    format!(
        "Your SGPA is {value:.2}\n\n\
         Calculation:\n\
         Total Credit Points = {points}\n\
         Total Credits = {credits}\n\
         SGPA = {points} / {credits} = {value:.2}",
        value = summary.value,
        points = summary.total_credit_points,
        credits = summary.total_credits,
    )
}

/// Same excerpt the assembler put in the bundle: first `max_chars` characters.
fn truncated_excerpt(corpus: &str, max_chars: usize) -> &str {
    match corpus.char_indices().nth(max_chars) {
        Some((idx, _)) => &corpus[..idx],
        None => corpus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LibraryConfig, ServerConfig};
    use crate::sheet::{self, Table};
    use std::path::Path;

    fn test_state(root: &Path) -> DeskState {
        let config = Config {
            library: LibraryConfig {
                root: root.to_path_buf(),
                marksheet: "marksheet.xlsx".to_string(),
                assignment_sheet: "assignment.xlsx".to_string(),
            },
            context: Default::default(),
            ocr: Default::default(),
            generation: Default::default(),
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                download_base_url: "/download".to_string(),
            },
            textbooks: Vec::new(),
        };
        DeskState::new(config, TextbookLibrary::empty())
    }

    fn ask(question: &str) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            subject: None,
        }
    }

    #[tokio::test]
    async fn registration_beats_file_request() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut t = Table::new(vec!["regno".to_string(), "submitted".to_string()]);
        t.rows.push(vec!["REG42".to_string(), String::new()]);
        sheet::write_table(&tmp.path().join("assignment.xlsx"), &t).unwrap();

        let state = test_state(tmp.path());
        let response = handle_question(
            &state,
            &ask("my reg no is REG42, also please list files to download"),
        )
        .await
        .unwrap();

        assert_eq!(response.answer, "Assignment submitted successfully!");
        assert!(response.file_available.is_none());
    }

    #[tokio::test]
    async fn specific_file_answer_carries_locator() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("OS.pdf"), vec![0u8; 1024]).unwrap();

        let state = test_state(tmp.path());
        let response = handle_question(&state, &ask("can you send file os.pdf"))
            .await
            .unwrap();

        assert_eq!(response.answer, "Here is the requested file: OS.pdf");
        assert_eq!(response.file_available, Some(true));
        assert_eq!(response.file_name.as_deref(), Some("OS.pdf"));
        assert_eq!(response.download_url.as_deref(), Some("/download/OS.pdf"));
    }

    #[tokio::test]
    async fn listing_answer_includes_sizes() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("OS.pdf"), vec![0u8; 1024]).unwrap();

        let state = test_state(tmp.path());
        let response = handle_question(&state, &ask("list available files"))
            .await
            .unwrap();
        assert!(response.answer.contains("OS.pdf (1.00 KB)"));
    }

    #[tokio::test]
    async fn listing_with_empty_library() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let response = handle_question(&state, &ask("list available files"))
            .await
            .unwrap();
        assert_eq!(
            response.answer,
            "No files are currently available in the library folder."
        );
    }

    #[tokio::test]
    async fn metric_query_without_document_asks_for_upload() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let response = handle_question(&state, &ask("what is my sgpa?")).await.unwrap();
        assert_eq!(response.answer, "Please upload your marksheet PDF first.");
    }

    #[tokio::test]
    async fn metric_query_computes_from_document_context() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        *state.document_context.write().await = "Sub1 48.5034 Sub2 39.0027".to_string();

        let response = handle_question(&state, &ask("calculate my SGPA")).await.unwrap();
        assert!(response.answer.contains("Your SGPA is 8.71"));
        assert!(response.answer.contains("Total Credits = 7"));
        assert!(response.answer.contains("Total Credit Points = 61"));
    }

    #[tokio::test]
    async fn metric_query_with_no_subjects_detected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        *state.document_context.write().await = "nothing numeric matches here".to_string();

        let response = handle_question(&state, &ask("what's my gpa")).await.unwrap();
        assert_eq!(response.answer, "Could not detect subjects in uploaded PDF.");
    }

    #[tokio::test]
    async fn generation_path_with_disabled_provider_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let err = handle_question(&state, &ask("explain deadlock"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[tokio::test]
    async fn upload_replaces_document_context() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());

        ingest_document(&state, b"anything", DocumentFormat::Unsupported)
            .await
            .unwrap();
        assert_eq!(
            state.document_context.read().await.as_str(),
            "Unsupported file type."
        );
    }
}
