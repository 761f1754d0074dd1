//! Prompt building for command generation requests.
//!
//! The instruction template is a replaceable asset: nothing in the
//! validator depends on what it says, since the model's output is checked
//! against the policy regardless.

use super::generator::GenerationContext;

/// System prompt that pins the model to command-only output.
pub const SYSTEM_PROMPT: &str = r#"You are a Kubernetes expert. Convert the user's request into a single kubectl or helm command.

Rules:
1. Output only the command, no explanations and no markdown.
2. Use standard kubectl/helm syntax with all necessary flags.
3. For deployments, always include --image; for services, always include --port.
4. Always include a namespace: -n <namespace> if one is mentioned,
   --all-namespaces if the request spans all namespaces, -n default otherwise.
5. Never use --privileged, --force, or other dangerous flags.
6. To chain diagnostic steps, join commands with &&."#;

/// Build the user message from the request and its context.
pub fn build_prompt(request: &str, ctx: &GenerationContext) -> String {
    let mut prompt = String::new();

    if let Some(namespace) = &ctx.namespace {
        prompt.push_str(&format!("Target namespace: {namespace}\n\n"));
    }

    if !ctx.history.is_empty() {
        prompt.push_str("Previous exchanges:\n");
        for exchange in &ctx.history {
            prompt.push_str(&format!(
                "  request: {}\n  command: {}\n",
                exchange.request, exchange.command
            ));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Request: {request}\n\nCommand:"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Exchange;

    #[test]
    fn test_build_prompt_basic() {
        let ctx = GenerationContext::default();
        let prompt = build_prompt("show me the pods", &ctx);
        assert!(prompt.contains("Request: show me the pods"));
        assert!(prompt.ends_with("Command:"));
        assert!(!prompt.contains("Target namespace"));
    }

    #[test]
    fn test_build_prompt_with_context() {
        let ctx = GenerationContext {
            namespace: Some("staging".to_string()),
            history: vec![Exchange {
                request: "list deployments".to_string(),
                command: "kubectl get deployments -n staging".to_string(),
            }],
        };
        let prompt = build_prompt("scale web to 3", &ctx);
        assert!(prompt.contains("Target namespace: staging"));
        assert!(prompt.contains("kubectl get deployments -n staging"));
        assert!(prompt.contains("Request: scale web to 3"));
    }
}
