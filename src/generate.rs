//! Generation collaborator abstraction and implementations.
//!
//! Defines the [`Generator`] trait and concrete backends:
//! - **[`DisabledGenerator`]** — returns errors; used when generation is not configured.
//! - **chat API** — any OpenAI-compatible chat-completions endpoint (Groq by
//!   default), called with a single attempt and a request timeout.
//!
//! There is deliberately no retry: every generation failure is terminal for
//! its request and surfaces to the caller as a uniform server error.

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::GenerationConfig;

/// Trait for generation backends. The call itself is performed by
/// [`generate_answer`] (kept as a free function, dispatching on config).
pub trait Generator: Send + Sync {
    /// Model identifier (e.g. `"llama-3.1-8b-instant"`).
    fn model_name(&self) -> &str;
}

/// A no-op generator that always errors; used when `generation.provider`
/// is `"disabled"`.
pub struct DisabledGenerator;

impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }
}

/// Generator backed by an OpenAI-compatible chat-completions API.
pub struct ChatApiGenerator {
    model: String,
}

impl Generator for ChatApiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Create the appropriate [`Generator`] for the configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "groq" | "openai" => {
            // Fail at startup rather than on the first question
            let _ = api_key(config)?;
            Ok(Box::new(ChatApiGenerator {
                model: config.model.clone(),
            }))
        }
        other => bail!("Unknown generation provider: {}", other),
    }
}

fn api_key(config: &GenerationConfig) -> Result<String> {
    let env_var = config.api_key_env.clone().unwrap_or_else(|| {
        match config.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GROQ_API_KEY",
        }
        .to_string()
    });
    std::env::var(&env_var)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", env_var))
}

fn base_url(config: &GenerationConfig) -> String {
    config.base_url.clone().unwrap_or_else(|| {
        match config.provider.as_str() {
            "openai" => "https://api.openai.com/v1",
            _ => "https://api.groq.com/openai/v1",
        }
        .to_string()
    })
}

/// Request a single chat completion.
///
/// One attempt, bounded by `generation.timeout_secs`. Errors cover the
/// disabled provider, missing API key, transport failures, non-success
/// statuses, and malformed response bodies.
pub async fn generate_answer(
    config: &GenerationConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String> {
    match config.provider.as_str() {
        "groq" | "openai" => {}
        "disabled" => bail!("Generation provider is disabled"),
        other => bail!("Unknown generation provider: {}", other),
    }

    let key = api_key(config)?;
    let url = format!("{}/chat/completions", base_url(config));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": config.model,
        "temperature": config.temperature,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_prompt },
        ],
    });

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Chat API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    parse_completion(&json)
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat API response: missing message content"))
}

/// System instruction for the academic assistant, including the availability
/// check the grounding verifier backstops.
pub fn system_prompt(subject: Option<&str>, file_names: &[String]) -> String {
    let files = file_names.join(", ");
    let subject = subject.unwrap_or("the requested subject");
    format!(
        "You are an academic assistant with access to files.\n\n\
         INFORMATION AVAILABILITY CHECK:\n\
         1. If textbook content is provided for a subject, answer ONLY from that content.\n\
         2. If the information is not in the provided textbook content, respond that it is \
         not available in the uploaded textbook for {subject}.\n\
         3. Do not answer from general knowledge when textbook content is provided.\n\
         4. If uploaded document content is present, prioritize answering from it.\n\n\
         Capabilities:\n\
         1. You can see all files in the library folder: {files}\n\
         2. If a user asks for a specific file, only confirm it is available. Do not print \
         any URLs; the frontend handles downloads.\n\
         3. Use Excel data if CRITICAL DATA FOUND is present.\n\n\
         Never say you cannot see files. Be professional and encouraging."
    )
}

/// User message combining the evidence bundle and the question.
pub fn user_prompt(context: &str, question: &str, subject: Option<&str>) -> String {
    let mut out = format!("CONTEXT:\n{}\n\nQUESTION: {}", context, question);
    if let Some(subject) = subject {
        out.push_str(&format!(
            "\n\nIMPORTANT: If this is about {} and the answer is not in the provided textbook \
             content, please inform me that the information is not available in my textbook.",
            subject
        ));
    }
    out
}
