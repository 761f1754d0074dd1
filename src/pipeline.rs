//! The end-to-end pipeline: generate, normalize, validate, execute.
//!
//! Every exit path maps to a [`PipelineResult`]; nothing escapes the
//! pipeline boundary as a panic or an untyped error. All failure kinds are
//! terminal for the request: recovery, if any, is the caller's decision.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::ai::{CommandModel, GenerationContext, Generator};
use crate::command;
use crate::config::RuntimeConfig;
use crate::security::{self, PolicyStore, RejectReason, Verdict};
use crate::shell::{ExecutionStatus, Executor};

/// The failure taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Language model unreachable or its reply was unusable.
    GenerationFailed,
    /// Normalization failed: empty, garbled, or disallowed shell syntax.
    Malformed,
    /// Policy rejection, per reason.
    ForbiddenFlag,
    NotAllowed,
    MissingNamespace,
    /// A segment failed during execution; partial output is attached.
    NonZeroExit,
    /// Execution exceeded the wall-clock budget; the child was killed.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub message: String,
    /// The candidate command, when one was derived before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Partial output gathered before an execution failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// The response unit returned to the caller, one per request.
///
/// Serializes to `{"command", "output"}` on success and `{"error": {...}}`
/// on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineResult {
    Success { command: String, output: String },
    Failure { error: PipelineError },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }

    fn failure(
        kind: ErrorKind,
        message: impl Into<String>,
        command: Option<String>,
        output: Option<String>,
    ) -> Self {
        PipelineResult::Failure {
            error: PipelineError {
                kind,
                message: message.into(),
                command,
                output,
            },
        }
    }
}

fn kind_for(reason: RejectReason) -> ErrorKind {
    match reason {
        RejectReason::ForbiddenFlag => ErrorKind::ForbiddenFlag,
        RejectReason::NotAllowed => ErrorKind::NotAllowed,
        RejectReason::MissingNamespace => ErrorKind::MissingNamespace,
    }
}

/// Composes the generator, normalizer, validator, and executor into the
/// request/response contract.
pub struct Pipeline<M> {
    config: Arc<RuntimeConfig>,
    policy: PolicyStore,
    generator: Generator<M>,
    executor: Executor,
}

impl<M: CommandModel> Pipeline<M> {
    pub fn new(config: Arc<RuntimeConfig>, policy: PolicyStore, model: M) -> Self {
        let generator = Generator::new(model, config.default_namespace.clone());
        let executor = Executor::new(config.exec_timeout, config.simulate);
        Self {
            config,
            policy,
            generator,
            executor,
        }
    }

    /// Handle a natural-language request: generate a candidate command,
    /// then validate and execute it.
    pub async fn handle_message(&self, message: &str, ctx: &GenerationContext) -> PipelineResult {
        let raw = match self.generator.generate(message, ctx).await {
            Ok(raw) => raw,
            Err(err) => {
                return PipelineResult::failure(
                    ErrorKind::GenerationFailed,
                    err.to_string(),
                    None,
                    None,
                );
            }
        };
        self.run(&raw).await
    }

    /// Handle a pre-formed command, skipping generation. The command still
    /// goes through normalization and validation unchanged.
    pub async fn handle_command(&self, command: &str) -> PipelineResult {
        self.run(command).await
    }

    async fn run(&self, raw: &str) -> PipelineResult {
        let chain = match command::normalize(raw) {
            Ok(chain) => chain,
            Err(err) => {
                return PipelineResult::failure(
                    ErrorKind::Malformed,
                    err.to_string(),
                    Some(raw.trim().to_string()),
                    None,
                );
            }
        };
        let rendered = chain.to_string();

        match security::validate(&self.policy, &chain, self.config.security_mode) {
            Verdict::Allow => {}
            Verdict::Reject { reason, detail } => {
                return PipelineResult::failure(kind_for(reason), detail, Some(rendered), None);
            }
        }

        let result = self.executor.execute(&chain).await;
        info!(command = %rendered, status = ?result.status, elapsed = ?result.elapsed, "execution finished");
        match result.status {
            ExecutionStatus::Success => PipelineResult::Success {
                command: rendered,
                output: result.output,
            },
            ExecutionStatus::NonZeroExit(code) => PipelineResult::failure(
                ErrorKind::NonZeroExit,
                format!("command exited with code {code}"),
                Some(rendered),
                Some(result.output),
            ),
            ExecutionStatus::TimedOut => PipelineResult::failure(
                ErrorKind::Timeout,
                format!(
                    "execution exceeded {}s and was terminated",
                    self.config.exec_timeout.as_secs()
                ),
                Some(rendered),
                Some(result.output),
            ),
        }
    }
}
