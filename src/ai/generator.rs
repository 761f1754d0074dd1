//! The generator: natural-language request in, candidate command out.
//!
//! Generation is one-shot. A command the validator later rejects is
//! reported to the caller, never silently re-prompted; a re-prompt loop
//! would let a caller probe the policy for a path around it.

use thiserror::Error;
use tracing::{debug, info};

use super::client::CommandModel;
use super::{parser, prompt};

/// One prior request/command pair, oldest first.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: String,
    pub command: String,
}

/// Optional context accompanying a generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub namespace: Option<String>,
    pub history: Vec<Exchange>,
}

/// Ways generation can fail. All of them surface to the caller as a
/// generation failure; none are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("language model request failed: {0}")]
    Model(String),
    #[error("model reply is not a single command line")]
    Unparsable,
    #[error("generated command is not a kubectl or helm command: {0}")]
    NotACliCommand(String),
}

/// Adapter over the language-model capability.
pub struct Generator<M> {
    model: M,
    default_namespace: String,
}

impl<M: CommandModel> Generator<M> {
    pub fn new(model: M, default_namespace: impl Into<String>) -> Self {
        Self {
            model,
            default_namespace: default_namespace.into(),
        }
    }

    /// Produce a raw candidate command for `request`.
    ///
    /// The returned string is untrusted and must pass normalization and
    /// validation before anything executes it.
    pub async fn generate(
        &self,
        request: &str,
        ctx: &GenerationContext,
    ) -> Result<String, GenerationError> {
        let user = prompt::build_prompt(request, ctx);
        debug!(request, "requesting command generation");

        let reply = self
            .model
            .complete(prompt::SYSTEM_PROMPT, &user)
            .await
            .map_err(|err| GenerationError::Model(err.to_string()))?;

        let command = parser::extract_command(&reply).ok_or(GenerationError::Unparsable)?;
        if !command.starts_with("kubectl ") && !command.starts_with("helm ") {
            return Err(GenerationError::NotACliCommand(command));
        }

        let command = self.apply_namespace_default(command, ctx);
        info!(command = %command, "generated candidate command");
        Ok(command)
    }

    /// Append `-n <default>` to a generated `kubectl get` that carries no
    /// namespace scope. Only generated commands are rewritten; direct-mode
    /// input is executed (or rejected) as written.
    fn apply_namespace_default(&self, command: String, ctx: &GenerationContext) -> String {
        if !command.starts_with("kubectl get ") {
            return command;
        }
        let scoped = command.split_whitespace().any(|t| {
            t == "-n" || t == "-A" || t == "--all-namespaces" || t.starts_with("--namespace")
        });
        if scoped {
            return command;
        }
        let namespace = ctx
            .namespace
            .as_deref()
            .unwrap_or(&self.default_namespace);
        format!("{command} -n {namespace}")
    }
}
