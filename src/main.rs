//! # studydesk CLI (`desk`)
//!
//! The `desk` binary runs the studydesk academic Q&A service and offers
//! one-shot commands for inspecting the library and computing an SGPA from a
//! local marksheet PDF.
//!
//! ## Usage
//!
//! ```bash
//! desk --config ./config/desk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `desk serve` | Start the HTTP server |
//! | `desk files` | List files in the library folder |
//! | `desk books` | Show per-subject textbook status |
//! | `desk ask "<question>" [--subject <name>]` | Answer one question through the full pipeline |
//! | `desk sgpa <file.pdf>` | Extract subjects from a marksheet PDF and compute the SGPA |

mod config;
mod context;
mod extract;
mod generate;
mod grades;
mod grounding;
mod intent;
mod library;
mod models;
mod pipeline;
mod server;
mod sgpa;
mod sheet;
mod textbook;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::extract::DocumentFormat;
use crate::generate::Generator as _;
use crate::models::AskRequest;
use crate::pipeline::DeskState;
use crate::textbook::TextbookLibrary;

/// studydesk — a document-grounded academic Q&A service.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/desk.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "desk",
    about = "studydesk — a document-grounded academic Q&A service",
    version,
    long_about = "studydesk answers student questions from a library of files, grade \
    spreadsheets, and per-subject textbooks, verifying generated answers against the \
    textbook evidence before returning them."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/desk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Loads the textbook corpus, binds to `[server].bind`, and serves the
    /// upload/ask/download API until terminated.
    Serve,

    /// List files available in the library folder.
    Files,

    /// Show per-subject textbook status (loaded, text length).
    Books,

    /// Answer one question through the full pipeline.
    ///
    /// Short-circuiting intents (registration, file request, SGPA) answer
    /// locally; anything else calls the configured generation provider.
    Ask {
        /// The question text.
        question: String,

        /// Subject whose textbook should ground the answer.
        #[arg(long)]
        subject: Option<String>,

        /// Marksheet PDF to load as the document context first.
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Extract subjects from a marksheet PDF and compute the SGPA.
    Sgpa {
        /// Path to the marksheet PDF.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            // Fail fast on a misconfigured provider (e.g. missing API key)
            // instead of on the first question.
            let generator = generate::create_generator(&cfg.generation)?;
            if cfg.generation.is_enabled() {
                println!("generation: {} ({})", cfg.generation.provider, generator.model_name());
            } else {
                println!("generation disabled; only direct answers are available");
            }

            let textbooks = TextbookLibrary::load(&cfg)?;
            let state = DeskState::new(cfg, textbooks);
            server::run_server(state).await?;
        }
        Commands::Files => {
            let files = library::scan_library(&cfg)?;
            if files.is_empty() {
                println!("No files are currently available in the library folder.");
            } else {
                for file in &files {
                    println!("{} ({})", file.name, file.size_kb());
                }
                println!("{} file(s)", files.len());
            }
        }
        Commands::Books => {
            let textbooks = TextbookLibrary::load(&cfg)?;
            println!("{:<24} {:<8} LENGTH", "SUBJECT", "LOADED");
            for (subject, loaded, length) in textbooks.status() {
                println!("{:<24} {:<8} {}", subject, loaded, length);
            }
        }
        Commands::Ask {
            question,
            subject,
            document,
        } => {
            let textbooks = TextbookLibrary::load(&cfg)?;
            let state = DeskState::new(cfg, textbooks);

            if let Some(path) = document {
                let bytes = std::fs::read(&path)?;
                let format = path
                    .extension()
                    .map(|e| DocumentFormat::from_extension(&e.to_string_lossy()))
                    .unwrap_or(DocumentFormat::Unsupported);
                pipeline::ingest_document(&state, &bytes, format).await?;
            }

            let request = AskRequest { question, subject };
            let response = pipeline::handle_question(&state, &request).await?;
            println!("{}", response.answer);
            if let Some(name) = response.file_name {
                println!("file: {}", name);
            }
            if let Some(url) = response.download_url {
                println!("download: {}", url);
            }
        }
        Commands::Sgpa { file } => {
            let text = extract::extract_pdf_file(&file)?;
            let subjects = sgpa::extract_subjects(&text);
            match sgpa::compute_sgpa(&subjects) {
                Some(summary) => {
                    println!("subjects detected: {}", subjects.len());
                    println!("total credits: {}", summary.total_credits);
                    println!("total credit points: {}", summary.total_credit_points);
                    println!("SGPA: {:.2}", summary.value);
                }
                None => {
                    println!("Could not detect subjects in {}.", file.display());
                }
            }
        }
    }

    Ok(())
}
