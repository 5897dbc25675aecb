//! Subject-scoped textbook corpus.
//!
//! Textbooks are PDFs in the library folder mapped to subject names by
//! configuration. The corpus is loaded once at startup and is immutable
//! afterwards; a missing or unreadable textbook leaves its subject empty
//! rather than failing startup.

use anyhow::Result;
use std::collections::HashMap;

use crate::config::Config;
use crate::extract;

/// Subject name → extracted textbook text. Unloaded subjects map to empty.
pub struct TextbookLibrary {
    corpus: HashMap<String, String>,
    /// Configured order, for stable status listings.
    subjects: Vec<String>,
}

impl TextbookLibrary {
    /// Load every configured textbook from the library folder.
    pub fn load(config: &Config) -> Result<Self> {
        println!("Loading textbooks from library folder...");

        let mut corpus = HashMap::new();
        let mut subjects = Vec::new();

        for entry in &config.textbooks {
            subjects.push(entry.subject.clone());
            let path = config.library.root.join(&entry.file);

            if !path.exists() {
                eprintln!("warning: {} not found in library folder", entry.file);
                corpus.insert(entry.subject.clone(), String::new());
                continue;
            }

            match extract::extract_pdf_file(&path) {
                Ok(text) => {
                    println!("  loaded {} ({} characters)", entry.subject, text.len());
                    corpus.insert(entry.subject.clone(), text);
                }
                Err(e) => {
                    eprintln!("error loading {}: {}", entry.file, e);
                    corpus.insert(entry.subject.clone(), String::new());
                }
            }
        }

        let loaded: Vec<&str> = subjects
            .iter()
            .filter(|s| corpus.get(*s).is_some_and(|t| !t.is_empty()))
            .map(|s| s.as_str())
            .collect();
        println!("Loaded subjects: {}", loaded.join(", "));

        Ok(Self { corpus, subjects })
    }

    /// Empty library (for tests and corpus-free CLI commands).
    pub fn empty() -> Self {
        Self {
            corpus: HashMap::new(),
            subjects: Vec::new(),
        }
    }

    /// Insert a subject directly (tests).
    pub fn with_subject(mut self, subject: &str, text: &str) -> Self {
        if !self.subjects.iter().any(|s| s == subject) {
            self.subjects.push(subject.to_string());
        }
        self.corpus.insert(subject.to_string(), text.to_string());
        self
    }

    /// Non-empty corpus text for a subject, if loaded.
    pub fn corpus_for(&self, subject: &str) -> Option<&str> {
        self.corpus
            .get(subject)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// `(subject, loaded, length)` rows in configured order.
    pub fn status(&self) -> Vec<(String, bool, usize)> {
        self.subjects
            .iter()
            .map(|s| {
                let len = self.corpus.get(s).map(|t| t.len()).unwrap_or(0);
                (s.clone(), len > 0, len)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subject_is_not_served() {
        let lib = TextbookLibrary::empty()
            .with_subject("DBMS", "relational algebra")
            .with_subject("AI", "");
        assert_eq!(lib.corpus_for("DBMS"), Some("relational algebra"));
        assert!(lib.corpus_for("AI").is_none());
        assert!(lib.corpus_for("Unknown").is_none());
    }

    #[test]
    fn status_preserves_order() {
        let lib = TextbookLibrary::empty()
            .with_subject("Operating Systems", "processes")
            .with_subject("DBMS", "");
        let status = lib.status();
        assert_eq!(status[0], ("Operating Systems".to_string(), true, 9));
        assert_eq!(status[1], ("DBMS".to_string(), false, 0));
    }
}
