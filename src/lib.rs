//! # studydesk
//!
//! A document-grounded academic Q&A service.
//!
//! studydesk combines several loosely-structured sources — a library of
//! downloadable files, grade spreadsheets, an uploaded marksheet document,
//! and per-subject textbooks — into a single bounded evidence context, then
//! verifies that a generated answer is actually grounded in that context
//! before returning it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │   Library    │──▶│   Intent      │──▶│  Evidence   │
//! │ files+sheets │   │  classifiers  │   │   bundle    │
//! └──────────────┘   └──────┬────────┘   └──────┬──────┘
//!                           │ short-circuits    ▼
//!                           ▼             ┌─────────────┐   ┌───────────┐
//!                     direct answers      │ generation  │──▶│ grounding │
//!                     (reg/file/SGPA)     │ collaborator│   │ verifier  │
//!                                         └─────────────┘   └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`library`] | Directory-backed file index |
//! | [`sheet`] | Whole-file XLSX row table |
//! | [`grades`] | Grade lookup and submission tracking |
//! | [`extract`] | Document ingestion (PDF, OCR, unsupported) |
//! | [`textbook`] | Subject-scoped textbook corpus |
//! | [`sgpa`] | Subject extraction and SGPA aggregation |
//! | [`intent`] | Intent classifier rule chain |
//! | [`context`] | Evidence-bundle assembly |
//! | [`generate`] | Generation collaborator |
//! | [`grounding`] | Grounding verification and URL redaction |
//! | [`pipeline`] | Question-handling orchestration |
//! | [`server`] | HTTP API |

pub mod config;
pub mod context;
pub mod extract;
pub mod generate;
pub mod grades;
pub mod grounding;
pub mod intent;
pub mod library;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod sgpa;
pub mod sheet;
pub mod textbook;
