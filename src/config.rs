use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub server: ServerConfig,
    #[serde(default = "default_textbooks")]
    pub textbooks: Vec<TextbookEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    /// Root directory holding downloadable files, textbooks, and the two
    /// spreadsheet tables. File resolution never escapes this directory.
    pub root: PathBuf,
    #[serde(default = "default_marksheet")]
    pub marksheet: String,
    #[serde(default = "default_assignment_sheet")]
    pub assignment_sheet: String,
}

fn default_marksheet() -> String {
    "marksheet.xlsx".to_string()
}
fn default_assignment_sheet() -> String {
    "assignment.xlsx".to_string()
}

/// Per-source truncation caps for the evidence bundle.
#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_document_excerpt_chars")]
    pub document_excerpt_chars: usize,
    #[serde(default = "default_textbook_excerpt_chars")]
    pub textbook_excerpt_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            document_excerpt_chars: default_document_excerpt_chars(),
            textbook_excerpt_chars: default_textbook_excerpt_chars(),
        }
    }
}

fn default_document_excerpt_chars() -> usize {
    8000
}
fn default_textbook_excerpt_chars() -> usize {
    15000
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    /// `"disabled"` or `"tesseract"` (external CLI engine).
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default = "default_tesseract_command")]
    pub command: String,
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            command: default_tesseract_command(),
            language: default_ocr_language(),
        }
    }
}

fn default_tesseract_command() -> String {
    "tesseract".to_string()
}
fn default_ocr_language() -> String {
    "eng".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// `"disabled"`, `"groq"`, or `"openai"` (any chat-completions endpoint).
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the chat-completions API. Defaults per provider.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key. Defaults per provider.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: default_model(),
            base_url: None,
            api_key_env: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_disabled() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Prefix for constructed download locators. A bare path keeps the
    /// locator relative so any frontend origin works.
    #[serde(default = "default_download_base")]
    pub download_base_url: String,
}

fn default_download_base() -> String {
    "/download".to_string()
}

/// One subject-to-textbook mapping. The file is resolved within the library
/// root and loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct TextbookEntry {
    pub subject: String,
    pub file: String,
}

fn default_textbooks() -> Vec<TextbookEntry> {
    [
        ("Operating Systems", "OS.pdf"),
        ("DBMS", "DBMS.pdf"),
        ("Computer Networks", "CN.pdf"),
        ("AI", "AI.pdf"),
    ]
    .into_iter()
    .map(|(subject, file)| TextbookEntry {
        subject: subject.to_string(),
        file: file.to_string(),
    })
    .collect()
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl OcrConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate context caps
    if config.context.document_excerpt_chars == 0 {
        anyhow::bail!("context.document_excerpt_chars must be > 0");
    }
    if config.context.textbook_excerpt_chars == 0 {
        anyhow::bail!("context.textbook_excerpt_chars must be > 0");
    }

    // Validate providers
    match config.ocr.provider.as_str() {
        "disabled" | "tesseract" => {}
        other => anyhow::bail!(
            "Unknown OCR provider: '{}'. Must be disabled or tesseract.",
            other
        ),
    }
    match config.generation.provider.as_str() {
        "disabled" | "groq" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, groq, or openai.",
            other
        ),
    }

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    // Duplicate subjects would make textbook lookup ambiguous
    let mut seen = std::collections::HashSet::new();
    for entry in &config.textbooks {
        if !seen.insert(entry.subject.to_lowercase()) {
            anyhow::bail!("Duplicate textbook subject: '{}'", entry.subject);
        }
    }

    Ok(config)
}
