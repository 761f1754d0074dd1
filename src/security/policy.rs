//! Policy store: allow patterns and forbidden flag rules.
//!
//! The allow-list is a set of typed command patterns; absence of a match is
//! a rejection. The deny-list is a set of flag rules that always win over
//! the allow-list, so one new rule blocks a dangerous flag without touching
//! any pattern. Both sets are immutable after startup and shared across
//! requests without locking.

use crate::command::{AtomicCommand, Flag};

use super::SecurityMode;

/// Which security modes an allow pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Strict,
    Permissive,
    Both,
}

impl Applicability {
    pub fn covers(self, mode: SecurityMode) -> bool {
        match self {
            Applicability::Both => true,
            Applicability::Strict => mode == SecurityMode::Strict,
            Applicability::Permissive => mode == SecurityMode::Permissive,
        }
    }
}

/// A typed predicate over the shape of an atomic command.
///
/// A command matches when the program and verb agree, the resource (if the
/// pattern constrains it) is in the allowed set, enough positional arguments
/// are present after the verb, and every required token appears somewhere in
/// the argv (used for `exec`'s `--` separator).
#[derive(Debug, Clone)]
pub struct CommandPattern {
    pub program: &'static str,
    /// `None` matches any verb.
    pub verb: Option<&'static str>,
    /// Allowed resource nouns, singular form; plural input is accepted.
    /// `None` leaves the resource unconstrained.
    pub resources: Option<&'static [&'static str]>,
    /// Minimum positional arguments after the verb (resource counts as one).
    pub min_args: usize,
    pub required_tokens: &'static [&'static str],
    pub modes: Applicability,
}

impl CommandPattern {
    pub fn matches(&self, cmd: &AtomicCommand) -> bool {
        if cmd.program() != self.program {
            return false;
        }
        match (self.verb, cmd.verb()) {
            (Some(want), Some(got)) if want != got => return false,
            (Some(_), None) => return false,
            _ => {}
        }
        if let Some(allowed) = self.resources {
            let Some(resource) = cmd.resource() else {
                return false;
            };
            if !resource_in_set(resource, allowed) {
                return false;
            }
        }
        let args = cmd.positionals().count().saturating_sub(1);
        if args < self.min_args {
            return false;
        }
        self.required_tokens.iter().all(|t| cmd.has_token(t))
    }
}

/// Accept the exact entry or its plural (`pods` matches `pod`).
fn resource_in_set(resource: &str, set: &[&str]) -> bool {
    set.iter()
        .any(|r| *r == resource || resource.strip_suffix('s') == Some(*r))
}

/// A deny-list rule over a single flag token.
///
/// Value-carrying rules match the `=`-attached form only, mirroring how the
/// flags are actually written (`--grace-period=0`, `--dry-run=server`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagRule {
    /// The flag is forbidden regardless of value.
    Name(&'static str),
    /// The flag is forbidden only with this value.
    NameValue(&'static str, &'static str),
    /// `-v=<n>` / `--v=<n>` at or above this level exposes API internals.
    Verbosity(u8),
}

impl FlagRule {
    pub fn matches(&self, flag: &Flag<'_>) -> bool {
        match self {
            FlagRule::Name(name) => flag.name == *name,
            FlagRule::NameValue(name, value) => {
                flag.name == *name && flag.value == Some(*value)
            }
            FlagRule::Verbosity(level) => {
                (flag.name == "-v" || flag.name == "--v")
                    && flag
                        .value
                        .and_then(|v| v.parse::<u8>().ok())
                        .is_some_and(|v| v >= *level)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FlagRule::Name(name) => (*name).to_string(),
            FlagRule::NameValue(name, value) => format!("{name}={value}"),
            FlagRule::Verbosity(level) => format!("-v>={level}"),
        }
    }
}

/// The immutable rule sets the validator evaluates against.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    patterns: Vec<CommandPattern>,
    forbidden: Vec<FlagRule>,
    protected_namespaces: Vec<&'static str>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl PolicyStore {
    pub fn new(patterns: Vec<CommandPattern>, forbidden: Vec<FlagRule>) -> Self {
        Self {
            patterns,
            forbidden,
            protected_namespaces: vec!["kube-system", "default"],
        }
    }

    /// The built-in rule set: a narrow kubectl/helm allow-list for both
    /// modes, wildcard patterns that open up permissive mode, and the full
    /// flag deny-list.
    pub fn with_default_rules() -> Self {
        Self::new(default_patterns(), default_forbidden_flags())
    }

    /// The first deny-list rule matched by any flag of `cmd`, rendered for
    /// the rejection detail.
    pub fn forbidden_flag(&self, cmd: &AtomicCommand) -> Option<String> {
        for flag in cmd.flags() {
            for rule in &self.forbidden {
                if rule.matches(&flag) {
                    return Some(rule.describe());
                }
            }
        }
        None
    }

    /// Whether any pattern applicable to `mode` matches `cmd`.
    pub fn matches_any(&self, cmd: &AtomicCommand, mode: SecurityMode) -> bool {
        self.patterns
            .iter()
            .filter(|p| p.modes.covers(mode))
            .any(|p| p.matches(cmd))
    }

    /// Namespaces that must never be deleted.
    pub fn is_protected_namespace(&self, namespace: &str) -> bool {
        self.protected_namespaces.contains(&namespace)
    }
}

const WORKLOAD_RESOURCES: &[&str] = &[
    "pod",
    "deployment",
    "service",
    "namespace",
    "configmap",
    "secret",
];

fn default_patterns() -> Vec<CommandPattern> {
    vec![
        CommandPattern {
            program: "kubectl",
            verb: Some("get"),
            resources: Some(WORKLOAD_RESOURCES),
            min_args: 1,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("describe"),
            resources: Some(WORKLOAD_RESOURCES),
            min_args: 2,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("create"),
            resources: Some(&["deployment", "namespace", "service"]),
            min_args: 2,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("delete"),
            resources: Some(&["pod", "deployment", "service", "namespace"]),
            min_args: 2,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("logs"),
            resources: None,
            min_args: 0,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("scale"),
            resources: Some(&["deployment"]),
            min_args: 2,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("exec"),
            resources: None,
            min_args: 1,
            required_tokens: &["--"],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "kubectl",
            verb: Some("config"),
            resources: Some(&["use-context", "get-contexts", "current-context"]),
            min_args: 1,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "helm",
            verb: Some("list"),
            resources: None,
            min_args: 0,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "helm",
            verb: Some("install"),
            resources: None,
            min_args: 2,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "helm",
            verb: Some("uninstall"),
            resources: None,
            min_args: 1,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        CommandPattern {
            program: "helm",
            verb: Some("upgrade"),
            resources: None,
            min_args: 2,
            required_tokens: &[],
            modes: Applicability::Both,
        },
        // Permissive mode accepts any kubectl or helm invocation with a verb;
        // the deny-list still applies unconditionally.
        CommandPattern {
            program: "kubectl",
            verb: None,
            resources: None,
            min_args: 0,
            required_tokens: &[],
            modes: Applicability::Permissive,
        },
        CommandPattern {
            program: "helm",
            verb: None,
            resources: None,
            min_args: 0,
            required_tokens: &[],
            modes: Applicability::Permissive,
        },
    ]
}

fn default_forbidden_flags() -> Vec<FlagRule> {
    vec![
        // Privilege escalation and host access
        FlagRule::Name("--privileged"),
        FlagRule::Name("--host-network"),
        FlagRule::Name("--host-pid"),
        FlagRule::Name("--host-ipc"),
        FlagRule::NameValue("--as", "root"),
        FlagRule::NameValue("--as", "system:admin"),
        // Raw API access and credential overrides
        FlagRule::Name("--raw"),
        FlagRule::Name("--insecure-skip-tls-verify"),
        FlagRule::Name("--token"),
        FlagRule::Name("--client-certificate"),
        FlagRule::Name("--client-key"),
        FlagRule::Verbosity(4),
        // Forced or mass mutation
        FlagRule::Name("--force"),
        FlagRule::NameValue("--grace-period", "0"),
        FlagRule::Name("--now"),
        FlagRule::NameValue("--cascade", "orphan"),
        FlagRule::Name("--all"),
        FlagRule::Name("--selector"),
        FlagRule::Name("--field-selector"),
        // Server-side operations that bypass client checks
        FlagRule::NameValue("--dry-run", "server"),
        FlagRule::Name("--server-side"),
        FlagRule::Name("--force-conflicts"),
        FlagRule::NameValue("--validate", "false"),
    ]
}
