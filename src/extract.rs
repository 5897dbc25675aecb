//! Document ingestion: raw bytes + format tag → plain text.
//!
//! PDF extraction is in-process via `pdf-extract`. Image formats go through
//! an OCR collaborator — an external engine invoked over a scratch file —
//! behind a provider abstraction so a different engine can be swapped in.
//! Unsupported formats produce a sentinel value rather than an error, so an
//! odd upload degrades the context instead of failing the request.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;

use crate::config::OcrConfig;

/// Sentinel text stored when an upload has a format we cannot read.
pub const UNSUPPORTED_SENTINEL: &str = "Unsupported file type.";

/// Format tag supplied alongside uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Image,
    Unsupported,
}

impl DocumentFormat {
    /// Classify a file extension (with or without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => DocumentFormat::Pdf,
            "png" | "jpg" | "jpeg" => DocumentFormat::Image,
            _ => DocumentFormat::Unsupported,
        }
    }

    /// Parse the `format` tag used by the upload endpoint.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "pdf" => DocumentFormat::Pdf,
            "image" | "png" | "jpg" | "jpeg" => DocumentFormat::Image,
            _ => DocumentFormat::Unsupported,
        }
    }
}

/// Extract plain text from uploaded bytes.
///
/// The result replaces the document context wholesale. Unsupported formats
/// yield [`UNSUPPORTED_SENTINEL`]; real extraction failures are errors.
pub fn extract_text(bytes: &[u8], format: DocumentFormat, ocr: &OcrConfig) -> Result<String> {
    match format {
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Image => recognize_image(bytes, ocr),
        DocumentFormat::Unsupported => Ok(UNSUPPORTED_SENTINEL.to_string()),
    }
}

/// Extract text from a PDF file on disk (textbook loading, CLI).
pub fn extract_pdf_file(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    extract_pdf(&bytes)
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| anyhow::anyhow!("PDF extraction failed: {}", e))
}

/// Run the configured OCR engine over image bytes.
///
/// The engine is an external process; its stdout is the recognized text.
fn recognize_image(bytes: &[u8], ocr: &OcrConfig) -> Result<String> {
    if !ocr.is_enabled() {
        bail!("OCR provider is disabled; configure [ocr] to accept image uploads");
    }

    let mut scratch = tempfile::NamedTempFile::new()?;
    scratch.write_all(bytes)?;
    scratch.flush()?;

    let output = std::process::Command::new(&ocr.command)
        .arg(scratch.path())
        .arg("stdout")
        .arg("-l")
        .arg(&ocr.language)
        .output()
        .with_context(|| format!("Failed to run OCR engine '{}'", ocr.command))?;

    if !output.status.success() {
        bail!(
            "OCR engine exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
