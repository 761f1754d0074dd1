//! Subprocess execution and supervision module.
//!
//! This module runs validated command chains as supervised OS subprocesses,
//! enforcing a wall-clock timeout and capturing output.

mod runner;

pub use runner::{ExecutionResult, ExecutionStatus, Executor};
