//! Post-generation grounding verification.
//!
//! A generated answer that was supposed to come from a textbook excerpt is
//! checked against that excerpt before it leaves the pipeline. The check is a
//! keyword-presence heuristic, not semantic entailment — false positives and
//! negatives are expected and acceptable. It lives behind a named strategy
//! trait so a stronger method can be substituted without touching the
//! pipeline.

use regex::Regex;
use std::sync::OnceLock;

/// Answers containing any of these substrings are treated as refusals the
/// model already issued and are never overridden.
const REFUSAL_MARKERS: &[&str] = &["not available in the uploaded textbook", "not found in"];

/// Significant-word filter: words longer than this many characters.
const MIN_KEYWORD_LEN: usize = 4;
/// At most this many significant words are checked, in original order.
const MAX_KEYWORDS: usize = 5;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("static regex"))
}

/// Swappable grounding strategy: decides whether a generated answer is kept
/// or replaced, given the question and the textbook excerpt it was supposed
/// to be grounded in.
pub trait GroundingStrategy: Send + Sync {
    /// Strategy name, for startup logging.
    fn name(&self) -> &str;

    /// Return the final answer text: either `answer` as supplied or a
    /// replacement refusal naming `subject`.
    fn verify(&self, answer: &str, question: &str, textbook_excerpt: &str, subject: &str)
        -> String;
}

/// Default strategy: the question's first few significant words must appear
/// somewhere in the textbook excerpt or the answer is replaced wholesale.
pub struct KeywordOverlap;

impl GroundingStrategy for KeywordOverlap {
    fn name(&self) -> &str {
        "keyword-overlap"
    }

    fn verify(
        &self,
        answer: &str,
        question: &str,
        textbook_excerpt: &str,
        subject: &str,
    ) -> String {
        if is_refusal(answer) {
            return answer.to_string();
        }

        let keywords = significant_keywords(question);
        if keywords.is_empty() {
            return answer.to_string();
        }

        let excerpt_lower = textbook_excerpt.to_lowercase();
        let grounded = keywords.iter().any(|k| excerpt_lower.contains(k.as_str()));
        if grounded {
            answer.to_string()
        } else {
            refusal_message(subject)
        }
    }
}

/// The fixed replacement used when no keyword is found in the excerpt.
pub fn refusal_message(subject: &str) -> String {
    format!(
        "I apologize, but the information you're looking for is not available in the uploaded \
         textbook for {}. Please try uploading a different textbook or consult your course \
         materials.",
        subject
    )
}

/// True when the answer already contains refusal phrasing.
fn is_refusal(answer: &str) -> bool {
    REFUSAL_MARKERS.iter().any(|m| answer.contains(m))
        || answer.to_lowercase().contains("apologize")
}

/// Lowercased words longer than [`MIN_KEYWORD_LEN`], first [`MAX_KEYWORDS`]
/// in original order.
fn significant_keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(' ')
        .filter(|w| w.len() > MIN_KEYWORD_LEN)
        .take(MAX_KEYWORDS)
        .map(|w| w.to_string())
        .collect()
}

/// Strip every URL from the answer. Applied to every generation-path answer
/// regardless of the verification outcome; idempotent.
pub fn strip_urls(text: &str) -> String {
    url_re().replace_all(text, "").into_owned()
}
