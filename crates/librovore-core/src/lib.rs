//! # librovore-core
//!
//! The documentation-search engine behind librovore: a polite, deduplicated
//! HTTP/file cache; a processor registry with confidence-ranked detection;
//! format-specific inventory and page-structure processors for Sphinx,
//! Pydoctor, Rustdoc, and MkDocs; a unified exact/regex/fuzzy name-matching
//! search engine; and the five orchestration functions exposed by the CLI
//! and MCP server.
//!
//! ## Architecture
//!
//! ```text
//! source URL ─▶ registry (detection) ─▶ inventory processor ─▶ search engine
//!                                                │                   │
//!                                         cache proxy          structure processor
//!                                                │                   │
//!                                           HTTP / file          cache proxy
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use librovore_core::{Config, registry::{ProcessorContext, ProcessorRegistry}, orchestration};
//!
//! # async fn run() -> librovore_core::Result<()> {
//! let config = Config::load()?;
//! let registry = ProcessorRegistry::with_builtins(&config);
//! let ctx = ProcessorContext::new(&config);
//! let response = orchestration::detect(&registry, &ctx, "https://docs.rs/serde", None).await?;
//! println!("{} detections", response.detections.len());
//! # Ok(())
//! # }
//! ```

/// Configuration: extensions list and cache tuning.
pub mod config;
/// Error types and result alias.
pub mod error;
/// Core data types and structures.
pub mod types;
/// Safe string/UTF-8 helper functions.
pub mod utils;

/// URL normalization and derivation helpers.
pub mod url;

/// HTML parsing and HTML-to-Markdown conversion helpers.
pub mod html;

/// The two-tier HTTP/file cache proxy, robots.txt gate, and request dedup.
pub mod cache;

/// Processor trait definitions, the registry, and the detection cache.
pub mod registry;

/// The unified exact/regex/fuzzy name-matching search engine.
pub mod search;

/// Format-specific inventory processors (Sphinx, Pydoctor, Rustdoc, MkDocs).
pub mod inventory;

/// Format-specific page-structure processors.
pub mod structure;

/// The five orchestration functions exposed to the CLI and MCP server.
pub mod orchestration;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
