//! Chain validation against the active policy.
//!
//! Evaluation order per atomic command, first match wins:
//! 1. any forbidden flag rejects, regardless of mode;
//! 2. no applicable allow pattern rejects;
//! 3. strict mode without an explicit namespace scope rejects;
//! 4. otherwise the command is allowed.
//!
//! The chain verdict is allow iff every command is allowed. The first
//! rejection short-circuits: one unsafe segment invalidates the whole chain
//! and later segments are not evaluated.

use tracing::{debug, warn};

use crate::command::{AtomicCommand, CommandChain};

use super::{PolicyStore, RejectReason, SecurityMode, Verdict};

/// Validate every command of `chain` in order, stopping at the first reject.
pub fn validate(policy: &PolicyStore, chain: &CommandChain, mode: SecurityMode) -> Verdict {
    for cmd in chain.commands() {
        let verdict = validate_atomic(policy, cmd, mode);
        if let Verdict::Reject { reason, detail } = &verdict {
            warn!(command = %cmd, ?reason, detail = %detail, "command rejected");
            return verdict;
        }
    }
    debug!(chain = %chain, "chain allowed");
    Verdict::Allow
}

fn validate_atomic(policy: &PolicyStore, cmd: &AtomicCommand, mode: SecurityMode) -> Verdict {
    // Deny-list wins over everything else, independent of mode.
    if let Some(rule) = policy.forbidden_flag(cmd) {
        return Verdict::reject(
            RejectReason::ForbiddenFlag,
            format!("command uses forbidden flag {rule}"),
        );
    }

    // Deleting across all namespaces is mass deletion by another spelling.
    if cmd.verb() == Some("delete") && cmd.has_all_namespaces() {
        return Verdict::reject(
            RejectReason::ForbiddenFlag,
            "delete may not be combined with --all-namespaces",
        );
    }

    if is_protected_namespace_deletion(policy, cmd) {
        return Verdict::reject(
            RejectReason::NotAllowed,
            format!(
                "deletion of protected namespace {} is not allowed",
                cmd.name().unwrap_or_default()
            ),
        );
    }

    if !policy.matches_any(cmd, mode) {
        return Verdict::reject(
            RejectReason::NotAllowed,
            format!("command does not match any allowed pattern: {cmd}"),
        );
    }

    if mode == SecurityMode::Strict && !cmd.has_namespace_scope() {
        return Verdict::reject(
            RejectReason::MissingNamespace,
            "strict mode requires -n <namespace> or --all-namespaces",
        );
    }

    Verdict::Allow
}

fn is_protected_namespace_deletion(policy: &PolicyStore, cmd: &AtomicCommand) -> bool {
    cmd.program() == "kubectl"
        && cmd.verb() == Some("delete")
        && matches!(cmd.resource(), Some("namespace") | Some("namespaces") | Some("ns"))
        && cmd
            .name()
            .is_some_and(|ns| policy.is_protected_namespace(ns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::normalize;

    fn check(raw: &str, mode: SecurityMode) -> Verdict {
        let policy = PolicyStore::with_default_rules();
        let chain = normalize(raw).unwrap();
        validate(&policy, &chain, mode)
    }

    fn reason_of(verdict: &Verdict) -> Option<RejectReason> {
        match verdict {
            Verdict::Allow => None,
            Verdict::Reject { reason, .. } => Some(*reason),
        }
    }

    #[test]
    fn test_forbidden_flag_rejected_in_both_modes() {
        for mode in [SecurityMode::Strict, SecurityMode::Permissive] {
            let verdict = check("kubectl delete pods --all --force --privileged", mode);
            assert_eq!(reason_of(&verdict), Some(RejectReason::ForbiddenFlag));
        }
    }

    #[test]
    fn test_unmatched_command_not_allowed() {
        let verdict = check("kubectl drain node-1 -n default", SecurityMode::Strict);
        assert_eq!(reason_of(&verdict), Some(RejectReason::NotAllowed));
    }

    #[test]
    fn test_strict_requires_namespace() {
        let verdict = check("kubectl get pods", SecurityMode::Strict);
        assert_eq!(reason_of(&verdict), Some(RejectReason::MissingNamespace));

        assert!(check("kubectl get pods -n default", SecurityMode::Strict).is_allow());
        assert!(check("kubectl get pods --all-namespaces", SecurityMode::Strict).is_allow());
    }

    #[test]
    fn test_permissive_waives_namespace() {
        assert!(check("kubectl get pods", SecurityMode::Permissive).is_allow());
    }

    #[test]
    fn test_chain_short_circuits_on_first_reject() {
        // Second command is forbidden; its reason surfaces even though the
        // third would be rejected for a different reason.
        let verdict = check(
            "kubectl get pods -n dev && kubectl delete pod web --force && kubectl drain node-1",
            SecurityMode::Strict,
        );
        match verdict {
            Verdict::Reject { reason, detail } => {
                assert_eq!(reason, RejectReason::ForbiddenFlag);
                assert!(detail.contains("--force"));
            }
            Verdict::Allow => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_chain_allows_when_every_segment_allows() {
        let verdict = check(
            "kubectl describe pod web -n dev && kubectl logs web -n dev",
            SecurityMode::Strict,
        );
        assert!(verdict.is_allow());
    }

    #[test]
    fn test_protected_namespace_deletion() {
        for ns in ["kube-system", "default"] {
            let verdict = check(
                &format!("kubectl delete namespace {ns}"),
                SecurityMode::Permissive,
            );
            assert_eq!(reason_of(&verdict), Some(RejectReason::NotAllowed));
        }
        // Other namespaces can be deleted when the shape is allowed.
        assert!(
            check("kubectl delete namespace staging", SecurityMode::Permissive).is_allow()
        );
    }

    #[test]
    fn test_delete_across_all_namespaces_rejected() {
        let verdict = check(
            "kubectl delete pod web --all-namespaces",
            SecurityMode::Permissive,
        );
        assert_eq!(reason_of(&verdict), Some(RejectReason::ForbiddenFlag));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let policy = PolicyStore::with_default_rules();
        let chain = normalize("kubectl get pods").unwrap();
        let first = validate(&policy, &chain, SecurityMode::Strict);
        let second = validate(&policy, &chain, SecurityMode::Strict);
        assert_eq!(first, second);
    }

    #[test]
    fn test_exec_with_separator_allowed() {
        assert!(
            check(
                "kubectl exec web -n default -- cat /etc/hostname",
                SecurityMode::Strict
            )
            .is_allow()
        );
    }
}
