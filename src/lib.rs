//! Kubepilot - natural-language Kubernetes commands with a safety net
//!
//! This library provides the core pipeline for Kubepilot, including:
//! - Command generation from natural-language requests via a language model
//! - Normalization of raw commands into validated chains
//! - Policy-based validation (allow patterns, forbidden flags, namespace rules)
//! - Supervised execution with timeouts and `&&` short-circuit semantics
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kubepilot::ai::{GenerationContext, OpenAiModel};
//! use kubepilot::config::RuntimeConfig;
//! use kubepilot::pipeline::Pipeline;
//! use kubepilot::security::PolicyStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(RuntimeConfig::from_env());
//!     let model = OpenAiModel::new(config.model.clone());
//!     let pipeline = Pipeline::new(config, PolicyStore::with_default_rules(), model);
//!
//!     let result = pipeline
//!         .handle_message("show me the pods", &GenerationContext::default())
//!         .await;
//!     println!("{}", serde_json::to_string(&result).unwrap());
//! }
//! ```

pub mod ai;
pub mod command;
pub mod config;
pub mod pipeline;
pub mod security;
pub mod shell;
pub mod utils;

// Re-export commonly used types
pub use command::{AtomicCommand, CommandChain, normalize};
pub use config::RuntimeConfig;
pub use pipeline::{ErrorKind, Pipeline, PipelineError, PipelineResult};
pub use security::{PolicyStore, SecurityMode, Verdict};
pub use shell::{ExecutionResult, ExecutionStatus, Executor};
