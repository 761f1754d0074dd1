//! Security module for command policy and validation.
//!
//! This module holds the process-wide security policy (allow patterns,
//! forbidden flag rules, active mode) and the validator that decides
//! whether a normalized command chain may be executed.

pub mod policy;
pub mod validator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use policy::{Applicability, CommandPattern, FlagRule, PolicyStore};
pub use validator::validate;

/// Process-wide validation mode, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Narrow allow-list, namespace flag mandatory.
    Strict,
    /// Broad allow-list, namespace flag optional. Forbidden flags still apply.
    Permissive,
}

impl FromStr for SecurityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unknown security mode: {other}")),
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Permissive => write!(f, "permissive"),
        }
    }
}

/// Why the validator refused a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A flag on the deny-list was present. Unconditional, independent of mode.
    ForbiddenFlag,
    /// The command's shape matched no allow pattern applicable to the mode.
    NotAllowed,
    /// Strict mode requires an explicit namespace or all-namespaces flag.
    MissingNamespace,
}

/// The validator's decision for a command or chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Reject { reason: RejectReason, detail: String },
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub(crate) fn reject(reason: RejectReason, detail: impl Into<String>) -> Self {
        Verdict::Reject {
            reason,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict".parse::<SecurityMode>(), Ok(SecurityMode::Strict));
        assert_eq!("STRICT".parse::<SecurityMode>(), Ok(SecurityMode::Strict));
        assert_eq!(
            "permissive".parse::<SecurityMode>(),
            Ok(SecurityMode::Permissive)
        );
        assert!("lenient".parse::<SecurityMode>().is_err());
    }

    #[test]
    fn test_mode_display_round_trip() {
        for mode in [SecurityMode::Strict, SecurityMode::Permissive] {
            assert_eq!(mode.to_string().parse::<SecurityMode>(), Ok(mode));
        }
    }
}
