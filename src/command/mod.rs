//! Command normalization: raw command strings into validated chains.
//!
//! This module splits a raw command on the `&&` chaining operator, rejects
//! shell syntax the validator cannot reason about, and tokenizes each
//! segment into an atomic command. The token list of an atomic command is
//! exactly what gets passed as argv on execution; no shell ever sees it.

use std::fmt;

use thiserror::Error;

/// The only chaining operator the normalizer accepts.
pub const CHAIN_OPERATOR: &str = "&&";

/// Reasons a raw command fails normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("empty command")]
    Empty,
    #[error("empty segment in command chain")]
    EmptySegment,
    #[error("disallowed shell syntax: {0}")]
    DisallowedSyntax(&'static str),
}

/// A parsed `--flag` / `-f` token. The value is present only for the
/// `=`-attached form (`--grace-period=0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

/// One non-chained CLI invocation, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicCommand {
    tokens: Vec<String>,
}

impl AtomicCommand {
    fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// The full argv, program included.
    pub fn argv(&self) -> &[String] {
        &self.tokens
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Positional tokens immediately following the program, up to the first
    /// flag. Detached flag values (`-n default`) are never mistaken for
    /// positionals because the scan stops at `-n`.
    pub fn positionals(&self) -> impl Iterator<Item = &str> {
        self.tokens[1..]
            .iter()
            .take_while(|t| !is_flag_token(t))
            .map(String::as_str)
    }

    /// The verb (first positional), e.g. `get` in `kubectl get pods`.
    pub fn verb(&self) -> Option<&str> {
        self.positionals().next()
    }

    /// The target resource (second positional), e.g. `pods`.
    pub fn resource(&self) -> Option<&str> {
        self.positionals().nth(1)
    }

    /// The resource name (third positional), e.g. `nginx` in
    /// `kubectl describe pod nginx`.
    pub fn name(&self) -> Option<&str> {
        self.positionals().nth(2)
    }

    /// All flag tokens in the command, in order. The bare `--` separator is
    /// not a flag.
    pub fn flags(&self) -> impl Iterator<Item = Flag<'_>> {
        self.tokens
            .iter()
            .filter(|t| is_flag_token(t))
            .map(|t| match t.split_once('=') {
                Some((name, value)) => Flag {
                    name,
                    value: Some(value),
                },
                None => Flag {
                    name: t.as_str(),
                    value: None,
                },
            })
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// The value of the first flag matching one of `names`, accepting both
    /// the `=`-attached and the detached-token form.
    pub fn flag_value(&self, names: &[&str]) -> Option<&str> {
        for (i, token) in self.tokens.iter().enumerate() {
            if !is_flag_token(token) {
                continue;
            }
            let (name, attached) = match token.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (token.as_str(), None),
            };
            if !names.contains(&name) {
                continue;
            }
            if let Some(v) = attached {
                return Some(v);
            }
            return self
                .tokens
                .get(i + 1)
                .filter(|t| !is_flag_token(t))
                .map(String::as_str);
        }
        None
    }

    /// Whether the command carries an explicit namespace scope: either
    /// `-n <name>` / `--namespace <name>` or the all-namespaces flag.
    pub fn has_namespace_scope(&self) -> bool {
        self.flag_value(&["-n", "--namespace"]).is_some() || self.has_all_namespaces()
    }

    pub fn has_all_namespaces(&self) -> bool {
        self.flags()
            .any(|f| f.name == "-A" || f.name == "--all-namespaces")
    }
}

impl fmt::Display for AtomicCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

/// An ordered, non-empty sequence of atomic commands. Insertion order is
/// execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChain {
    commands: Vec<AtomicCommand>,
}

impl CommandChain {
    pub fn commands(&self) -> &[AtomicCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Display for CommandChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.commands.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(&format!(" {CHAIN_OPERATOR} ")))
    }
}

/// Split a raw command string into an ordered chain of atomic commands.
///
/// Rejects empty input, empty chain segments, and any shell metacharacter
/// outside the `&&` allow-set. These are refused before validation because
/// the validator reasons about single CLI invocations, not shell pipelines.
pub fn normalize(raw: &str) -> Result<CommandChain, NormalizeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Empty);
    }

    if let Some(found) = find_disallowed_syntax(trimmed) {
        return Err(NormalizeError::DisallowedSyntax(found));
    }

    let mut commands = Vec::new();
    for segment in trimmed.split(CHAIN_OPERATOR) {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(NormalizeError::EmptySegment);
        }
        let tokens: Vec<String> = segment.split_whitespace().map(str::to_string).collect();
        commands.push(AtomicCommand::from_tokens(tokens));
    }

    Ok(CommandChain { commands })
}

/// Scan for shell metacharacters outside the allow-set.
fn find_disallowed_syntax(cmd: &str) -> Option<&'static str> {
    if cmd.contains('|') {
        return Some("|");
    }
    if cmd.contains(';') {
        return Some(";");
    }
    if cmd.contains('>') || cmd.contains('<') {
        return Some("redirection");
    }
    if cmd.contains("$(") || cmd.contains('`') {
        return Some("command substitution");
    }
    // A lone & (background execution) is disallowed; && is the chain operator.
    let ampersands = cmd.matches('&').count();
    let chained = cmd.matches(CHAIN_OPERATOR).count();
    if ampersands != chained * 2 {
        return Some("&");
    }
    None
}

fn is_flag_token(token: &str) -> bool {
    token.starts_with('-') && token != "--"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_command() {
        let chain = normalize("kubectl get pods -n default").unwrap();
        assert_eq!(chain.len(), 1);
        let cmd = &chain.commands()[0];
        assert_eq!(cmd.program(), "kubectl");
        assert_eq!(cmd.verb(), Some("get"));
        assert_eq!(cmd.resource(), Some("pods"));
        assert_eq!(cmd.flag_value(&["-n", "--namespace"]), Some("default"));
    }

    #[test]
    fn test_chain_preserves_order() {
        let chain =
            normalize("kubectl describe pod web -n dev && kubectl logs web -n dev").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.commands()[0].verb(), Some("describe"));
        assert_eq!(chain.commands()[1].verb(), Some("logs"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), Err(NormalizeError::Empty));
        assert_eq!(normalize("   "), Err(NormalizeError::Empty));
    }

    #[test]
    fn test_empty_segment() {
        assert_eq!(
            normalize("kubectl get pods &&"),
            Err(NormalizeError::EmptySegment)
        );
        assert_eq!(
            normalize("&& kubectl get pods"),
            Err(NormalizeError::EmptySegment)
        );
        assert_eq!(
            normalize("kubectl get pods && && kubectl get svc"),
            Err(NormalizeError::EmptySegment)
        );
    }

    #[test]
    fn test_disallowed_metacharacters() {
        for raw in [
            "kubectl get pods | grep web",
            "kubectl get pods; rm -rf /",
            "kubectl get pods > out.txt",
            "kubectl get pods < in.txt",
            "kubectl get $(whoami)",
            "kubectl get `whoami`",
            "kubectl get pods &",
            "kubectl get pods || kubectl get svc",
        ] {
            assert!(
                matches!(normalize(raw), Err(NormalizeError::DisallowedSyntax(_))),
                "expected rejection for: {raw}"
            );
        }
    }

    #[test]
    fn test_double_ampersand_is_allowed() {
        assert!(normalize("kubectl get pods -n a && kubectl get svc -n a").is_ok());
    }

    #[test]
    fn test_flag_parsing() {
        let chain = normalize("kubectl delete pod web --grace-period=0 --force").unwrap();
        let cmd = &chain.commands()[0];
        let flags: Vec<_> = cmd.flags().collect();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].name, "--grace-period");
        assert_eq!(flags[0].value, Some("0"));
        assert_eq!(flags[1].name, "--force");
        assert_eq!(flags[1].value, None);
    }

    #[test]
    fn test_detached_flag_value_is_not_positional() {
        let chain = normalize("kubectl get pods -n default extra").unwrap();
        let cmd = &chain.commands()[0];
        // Positional scan stops at the first flag.
        assert_eq!(cmd.positionals().collect::<Vec<_>>(), vec!["get", "pods"]);
    }

    #[test]
    fn test_double_dash_separator_is_not_a_flag() {
        let chain = normalize("kubectl exec web -n default -- ls /tmp").unwrap();
        let cmd = &chain.commands()[0];
        assert!(cmd.has_token("--"));
        assert!(cmd.flags().all(|f| f.name != "--"));
    }

    #[test]
    fn test_namespace_scope_detection() {
        let with_ns = normalize("kubectl get pods -n default").unwrap();
        assert!(with_ns.commands()[0].has_namespace_scope());

        let attached = normalize("kubectl get pods --namespace=kube-public").unwrap();
        assert!(attached.commands()[0].has_namespace_scope());

        let all_ns = normalize("kubectl get pods --all-namespaces").unwrap();
        assert!(all_ns.commands()[0].has_namespace_scope());
        assert!(all_ns.commands()[0].has_all_namespaces());

        let short_all = normalize("kubectl get pods -A").unwrap();
        assert!(short_all.commands()[0].has_all_namespaces());

        let without = normalize("kubectl get pods").unwrap();
        assert!(!without.commands()[0].has_namespace_scope());
    }

    #[test]
    fn test_display_round_trip() {
        let raw = "kubectl get pods -n default && kubectl logs web -n default";
        let chain = normalize(raw).unwrap();
        assert_eq!(chain.to_string(), raw);
    }
}
