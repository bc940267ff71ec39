//! The sandboxed execution context.
//!
//! Boots from a bootstrap locator, announces readiness to its player and
//! executes run requests in a V8 isolate:
//! - a fresh isolate per run, so nothing leaks between runs
//! - modules load from the request's file map only
//! - `console` calls and thrown errors are posted back as player events
//! - no fs, net, env, or other system access

use crate::bootstrap::BootstrapParams;
use crate::loader::FileMapLoader;
use crate::messages::RunRequest;
use crate::ops::{playground_runtime, FrameOutbox};
use crate::session::SessionId;
use anyhow::{anyhow, Error};
use deno_core::{JsRuntime, PollEventLoopOptions, RuntimeOptions};
use std::rc::Rc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Resource limits of an execution context
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Maximum heap size in bytes (default: 64MB, None = unlimited)
    pub max_heap_size: Option<usize>,
    /// Maximum time for a single run in milliseconds (default: 30000ms, None = unlimited)
    pub timeout_ms: Option<u64>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_heap_size: Some(64 * 1024 * 1024),
            timeout_ms: Some(30_000),
        }
    }
}

pub struct ExecutionContext {
    params: BootstrapParams,
    outbox: FrameOutbox,
    config: ContextConfig,
}

impl ExecutionContext {
    /// Boot from the locator a player handed out. Events go to `events`.
    pub fn from_locator(
        locator: &str,
        events: UnboundedSender<String>,
        config: ContextConfig,
    ) -> Result<Self, Error> {
        let params = BootstrapParams::from_locator(locator)
            .map_err(|e| anyhow!("Invalid bootstrap locator: {}", e))?;
        let outbox = FrameOutbox::new(params.id.clone(), events);
        debug!(session = %params.id, preset = %params.preset, "execution context booted");
        Ok(Self {
            params,
            outbox,
            config,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.params.id
    }

    pub fn params(&self) -> &BootstrapParams {
        &self.params
    }

    /// Tell the player this context accepts run requests.
    pub fn announce_ready(&self) {
        self.outbox.ready();
    }

    /// Handle an envelope posted across the frame boundary.
    pub async fn receive_message(&self, text: &str) {
        match RunRequest::from_message(text) {
            Ok(request) => self.run(&request).await,
            Err(e) => warn!(session = %self.params.id, error = %e, "rejected inbound message"),
        }
    }

    /// Execute a run request. Failures are reported to the player as `error`
    /// events, never returned.
    pub async fn run(&self, request: &RunRequest) {
        debug!(session = %self.params.id, entry = %request.entry, "executing run request");
        if let Err(e) = self.execute(request).await {
            self.outbox.error(e.to_string());
        }
    }

    /// Execute a run request, returning what went wrong.
    pub async fn execute(&self, request: &RunRequest) -> Result<(), Error> {
        let mut runtime = self.create_runtime(request)?;

        match self.config.timeout_ms {
            Some(ms) => {
                let isolate_handle = runtime.v8_isolate().thread_safe_handle();

                let timeout_handle = tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
                    isolate_handle.terminate_execution();
                });

                let result = self.evaluate(&mut runtime, request).await;
                timeout_handle.abort();

                // Termination surfaces as one of several errors
                match result {
                    Err(e)
                        if e.to_string().contains("terminated")
                            || e.to_string().contains("Uncaught Error: execution terminated") =>
                    {
                        Err(anyhow!("Execution timed out after {}ms", ms))
                    }
                    other => other,
                }
            }
            None => self.evaluate(&mut runtime, request).await,
        }
    }

    fn create_runtime(&self, request: &RunRequest) -> Result<JsRuntime, Error> {
        let loader = FileMapLoader::new(request.file_map.clone());

        let create_params = self
            .config
            .max_heap_size
            .map(|max_bytes| deno_core::v8::Isolate::create_params().heap_limits(0, max_bytes));

        let mut runtime = JsRuntime::new(RuntimeOptions {
            module_loader: Some(Rc::new(loader)),
            extensions: vec![playground_runtime::init_ops_and_esm()],
            create_params,
            ..Default::default()
        });

        if self.config.max_heap_size.is_some() {
            let session = self.params.id.clone();
            runtime.add_near_heap_limit_callback(move |current, initial| {
                warn!(
                    session = %session,
                    current_mb = current / (1024 * 1024),
                    initial_mb = initial / (1024 * 1024),
                    "near heap limit"
                );
                current
            });
        }

        runtime.op_state().borrow_mut().put(self.outbox.clone());
        Ok(runtime)
    }

    async fn evaluate(&self, runtime: &mut JsRuntime, request: &RunRequest) -> Result<(), Error> {
        if !self.params.prelude.is_empty() {
            runtime.execute_script("<prelude>", self.params.prelude.clone())?;
        }

        let entry = FileMapLoader::new(request.file_map.clone()).entry_specifier(&request.entry)?;
        let module_id = runtime.load_main_es_module(&entry).await?;
        let evaluation = runtime.mod_evaluate(module_id);
        runtime
            .run_event_loop(PollEventLoopOptions::default())
            .await?;
        evaluation.await?;
        Ok(())
    }
}
