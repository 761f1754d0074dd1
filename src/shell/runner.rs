//! Supervised execution of validated command chains.
//!
//! Each atomic command is spawned directly from its token list - argv in,
//! argv out, no shell in between. Chains run strictly left to right with
//! `&&` semantics: a non-zero exit stops the chain and reports the partial
//! output gathered so far. One wall-clock timeout bounds the whole chain;
//! on expiry the in-flight child is killed.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time;
use tracing::{info, warn};

use crate::command::CommandChain;

/// Terminal classification of a chain execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    /// A segment exited with this code; later segments did not run.
    NonZeroExit(i32),
    /// The wall-clock budget expired; the in-flight child was killed.
    TimedOut,
}

/// Captured outcome of a chain execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// stdout and stderr of each executed segment, concatenated in
    /// execution order.
    pub output: String,
    pub elapsed: Duration,
}

/// Runs command chains under a fixed timeout, or simulates them.
#[derive(Debug, Clone)]
pub struct Executor {
    timeout: Duration,
    simulate: bool,
}

impl Executor {
    pub fn new(timeout: Duration, simulate: bool) -> Self {
        Self { timeout, simulate }
    }

    /// Execute `chain` in order under the configured wall-clock budget.
    pub async fn execute(&self, chain: &CommandChain) -> ExecutionResult {
        if self.simulate {
            return ExecutionResult {
                status: ExecutionStatus::Success,
                output: format!("would run: {chain}"),
                elapsed: Duration::ZERO,
            };
        }

        let started = Instant::now();
        let mut output = String::new();

        for cmd in chain.commands() {
            let Some(remaining) = self.timeout.checked_sub(started.elapsed()) else {
                return timed_out(chain, output, started);
            };

            let argv = cmd.argv();
            let mut child = Command::new(&argv[0]);
            child
                .args(&argv[1..])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // Dropping the future on timeout must not leak the child.
                .kill_on_drop(true);

            info!(command = %cmd, "executing");
            let out = match time::timeout(remaining, child.output()).await {
                Err(_) => return timed_out(chain, output, started),
                Ok(Err(err)) => {
                    warn!(command = %cmd, error = %err, "failed to spawn");
                    output.push_str(&format!("{}: {err}\n", argv[0]));
                    return ExecutionResult {
                        status: ExecutionStatus::NonZeroExit(127),
                        output,
                        elapsed: started.elapsed(),
                    };
                }
                Ok(Ok(out)) => out,
            };

            output.push_str(&String::from_utf8_lossy(&out.stdout));
            output.push_str(&String::from_utf8_lossy(&out.stderr));

            if !out.status.success() {
                let code = out.status.code().unwrap_or(-1);
                warn!(command = %cmd, code, "segment exited non-zero, chain aborted");
                return ExecutionResult {
                    status: ExecutionStatus::NonZeroExit(code),
                    output,
                    elapsed: started.elapsed(),
                };
            }
        }

        ExecutionResult {
            status: ExecutionStatus::Success,
            output,
            elapsed: started.elapsed(),
        }
    }
}

fn timed_out(chain: &CommandChain, output: String, started: Instant) -> ExecutionResult {
    warn!(chain = %chain, "execution timed out");
    ExecutionResult {
        status: ExecutionStatus::TimedOut,
        output,
        elapsed: started.elapsed(),
    }
}
