//! Main entry point for the kubepilot CLI.
//!
//! This file initializes logging, loads the runtime configuration, runs a
//! single request through the pipeline, and prints the JSON result to
//! stdout. Transport concerns (HTTP, auth, rate limiting) live elsewhere;
//! this binary is a thin driver over the library.

use std::process::ExitCode;
use std::sync::Arc;

use kubepilot::ai::{GenerationContext, OpenAiModel};
use kubepilot::config::RuntimeConfig;
use kubepilot::pipeline::Pipeline;
use kubepilot::security::PolicyStore;
use kubepilot::utils;

enum Invocation {
    /// Natural-language request, optionally scoped to a namespace.
    Message {
        message: String,
        namespace: Option<String>,
    },
    /// Pre-formed command, skipping generation.
    Command(String),
}

fn parse_args(args: &[String]) -> Option<Invocation> {
    let mut namespace = None;
    let mut command = None;
    let mut words = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-n" | "--namespace" => namespace = Some(iter.next()?.clone()),
            "-c" | "--command" => command = Some(iter.next()?.clone()),
            _ => words.push(arg.clone()),
        }
    }

    if let Some(command) = command {
        if !words.is_empty() {
            return None;
        }
        return Some(Invocation::Command(command));
    }
    if words.is_empty() {
        return None;
    }
    Some(Invocation::Message {
        message: words.join(" "),
        namespace,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging before anything else
    utils::logger::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(invocation) = parse_args(&args) else {
        eprintln!("Usage: kubepilot [-n <namespace>] <request>");
        eprintln!("       kubepilot --command \"<kubectl command>\"");
        return ExitCode::from(2);
    };

    let config = Arc::new(RuntimeConfig::from_env());
    let model = OpenAiModel::new(config.model.clone());
    let pipeline = Pipeline::new(config, PolicyStore::with_default_rules(), model);

    let result = match invocation {
        Invocation::Command(command) => pipeline.handle_command(&command).await,
        Invocation::Message { message, namespace } => {
            let ctx = GenerationContext {
                namespace,
                history: Vec::new(),
            };
            pipeline.handle_message(&message, &ctx).await
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to encode result: {err}");
            return ExitCode::FAILURE;
        }
    }

    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
