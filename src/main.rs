//! Playground CLI
//!
//! Resolve options:
//!   playground resolve <options.json>
//!
//! Print the bootstrap locator of a freshly mounted player:
//!   playground locator <options.json>
//!
//! Run the file set in the sandboxed execution context:
//!   playground run <options.json>
//!
//! Console output goes to stdout, one line per call. A runtime error is
//! printed to stderr and fails the command.

use anyhow::{anyhow, Result};
use playground_frame::{
    logging, normalize, ContextConfig, ExecutionContext, MessageRouter, PublicOptions, RunRequest,
    SharedEnvironment, Transport, Workspace,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use tokio::sync::mpsc::unbounded_channel;

fn print_usage() {
    eprintln!("Playground - options resolver and sandboxed runner");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  playground resolve <options.json>   Print the resolved configuration");
    eprintln!("  playground locator <options.json>   Print a bootstrap locator");
    eprintln!("  playground run <options.json>       Run the file set");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  playground run ./playground.json");
    eprintln!("  RUST_LOG=debug playground run ./playground.json");
}

/// An execution context sharing the process: requests queue up here until
/// the event loop gets to them.
#[derive(Default)]
struct QueuedEnvironment {
    requests: RefCell<VecDeque<RunRequest>>,
}

impl SharedEnvironment for QueuedEnvironment {
    fn receive(&self, request: RunRequest) {
        self.requests.borrow_mut().push_back(request);
    }
}

impl QueuedEnvironment {
    fn next(&self) -> Option<RunRequest> {
        self.requests.borrow_mut().pop_front()
    }
}

fn load(path: &str) -> Result<PublicOptions> {
    PublicOptions::from_path(Path::new(path))
}

fn resolve(path: &str) -> Result<()> {
    let config = normalize(&load(path)?);
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| anyhow!("Failed to serialize configuration: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn locator(path: &str) -> Result<()> {
    let config = normalize(&load(path)?);
    let (frame, _requests) = unbounded_channel();
    let workspace = Workspace::mount(config, Transport::isolated(frame));
    println!("{}", workspace.player().locator()?);
    Ok(())
}

async fn run(path: &str) -> Result<()> {
    let config = normalize(&load(path)?);
    let shared = config.shared_environment;

    let environment = Rc::new(QueuedEnvironment::default());
    let (frame, mut posted) = unbounded_channel::<String>();
    let transport = if shared {
        Transport::shared(environment.clone())
    } else {
        Transport::isolated(frame)
    };

    let workspace = Workspace::mount(config, transport);
    let locator = workspace.player().locator()?;

    let (events, mut inbound) = unbounded_channel::<String>();
    let context = ExecutionContext::from_locator(&locator, events, ContextConfig::default())?;

    // Held until the context reports ready
    workspace.start();
    context.announce_ready();

    let router = MessageRouter::global();
    loop {
        let mut delivered = false;
        while let Ok(text) = inbound.try_recv() {
            router.deliver_raw(&text);
            delivered = true;
        }

        if let Some(request) = environment.next() {
            context.run(&request).await;
            continue;
        }
        if let Ok(text) = posted.try_recv() {
            context.receive_message(&text).await;
            continue;
        }
        if !delivered {
            break;
        }
    }

    for command in workspace.logs() {
        println!("{}", command.render());
    }

    match workspace.runtime_error() {
        Some(error) => {
            eprintln!("[ERROR] {}", error.error_message);
            Err(anyhow!("Run failed: {}", error.summary))
        }
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("info");

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        return Err(anyhow!("Missing required arguments"));
    }

    let path = &args[2];
    match args[1].as_str() {
        "resolve" => resolve(path),
        "locator" => locator(path),
        "run" => run(path).await,
        other => {
            print_usage();
            Err(anyhow!("Unknown command: {}", other))
        }
    }
}
