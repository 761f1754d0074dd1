//! Extraction of a single command line from a model reply.
//!
//! The prompt asks for command-only output, but models wrap replies in
//! code fences, backticks, or a `Command:` label often enough that a
//! forgiving first pass pays off. A reply that does not reduce to exactly
//! one line of command text is rejected.

/// Extract the command line from `reply`, or `None` if the reply is not a
/// single line of command text.
pub fn extract_command(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(line) = first_fenced_line(trimmed) {
        let cleaned = clean_line(line);
        return (!cleaned.is_empty()).then_some(cleaned);
    }

    let mut lines = trimmed.lines().filter(|l| !l.trim().is_empty());
    let first = lines.next()?;
    if lines.next().is_some() {
        // Multi-line prose; there is no safe way to pick the command.
        return None;
    }
    let cleaned = clean_line(first);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// First non-empty line inside the first ``` fence, if any.
fn first_fenced_line(reply: &str) -> Option<&str> {
    let mut in_fence = false;
    for line in reply.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            if in_fence {
                return None;
            }
            in_fence = true;
            continue;
        }
        if in_fence && !trimmed.is_empty() {
            return Some(trimmed);
        }
    }
    None
}

fn clean_line(line: &str) -> String {
    let line = line.trim();
    let line = line.strip_prefix("Command:").map(str::trim).unwrap_or(line);
    let line = line.strip_prefix('$').map(str::trim).unwrap_or(line);
    line.trim_matches('`').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command() {
        assert_eq!(
            extract_command("kubectl get pods -n default"),
            Some("kubectl get pods -n default".to_string())
        );
    }

    #[test]
    fn test_code_fence() {
        let reply = "```bash\nkubectl get pods -n default\n```";
        assert_eq!(
            extract_command(reply),
            Some("kubectl get pods -n default".to_string())
        );
    }

    #[test]
    fn test_inline_backticks() {
        assert_eq!(
            extract_command("`kubectl get pods -n default`"),
            Some("kubectl get pods -n default".to_string())
        );
    }

    #[test]
    fn test_command_label() {
        assert_eq!(
            extract_command("Command: kubectl get pods -n default"),
            Some("kubectl get pods -n default".to_string())
        );
    }

    #[test]
    fn test_shell_prompt_prefix() {
        assert_eq!(
            extract_command("$ kubectl get pods -n default"),
            Some("kubectl get pods -n default".to_string())
        );
    }

    #[test]
    fn test_multi_line_prose_rejected() {
        let reply = "Sure! Here is what you should run:\nkubectl get pods -n default";
        assert_eq!(extract_command(reply), None);
    }

    #[test]
    fn test_empty_reply_rejected() {
        assert_eq!(extract_command(""), None);
        assert_eq!(extract_command("   \n  "), None);
        assert_eq!(extract_command("``"), None);
    }

    #[test]
    fn test_fence_with_prose_around_it() {
        let reply = "Run this:\n```\nkubectl logs web -n dev\n```\nThat will show the logs.";
        assert_eq!(
            extract_command(reply),
            Some("kubectl logs web -n dev".to_string())
        );
    }
}
