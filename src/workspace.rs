//! A resolved configuration bound to one player.
//!
//! The workspace owns the current file set and everything the editor pane
//! shows next to it: file tabs, the console log, the last compiler or
//! runtime error and the status line.

use crate::file_map::FileMap;
use crate::messages::ConsoleCommand;
use crate::options::Configuration;
use crate::panes::PaneOptions;
use crate::player::{PlayerCallbacks, PlayerFrame, PlayerProps};
use crate::router::MessageRouter;
use crate::transport::Transport;
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;
use tracing::debug;

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[(:](\d+):(\d+)\)?$").expect("valid location regex"));

/// An error as the editor presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicError {
    /// One line, for the status bar
    pub summary: String,
    pub description: String,
    pub error_message: String,
    pub line_number: Option<u32>,
}

impl PublicError {
    /// Interpret an error payload reported by the execution context.
    pub fn from_payload(payload: &str) -> Self {
        let summary = payload
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Error")
            .to_string();

        let line_number = LOCATION_RE
            .captures(payload)
            .and_then(|captures| captures.get(1))
            .and_then(|m| m.as_str().parse().ok());

        Self {
            description: summary.clone(),
            summary,
            error_message: payload.to_string(),
            line_number,
        }
    }
}

#[derive(Debug)]
struct WorkspaceState {
    files: FileMap,
    entry: String,
    active_file: String,
    logs: Vec<ConsoleCommand>,
    compiler_error: Option<PublicError>,
    runtime_error: Option<PublicError>,
    active_step: Option<usize>,
}

pub struct Workspace {
    config: Configuration,
    state: Rc<RefCell<WorkspaceState>>,
    player: PlayerFrame,
}

impl Workspace {
    pub fn mount(config: Configuration, transport: Transport) -> Self {
        Self::mount_with_router(MessageRouter::global(), config, transport)
    }

    pub fn mount_with_router(
        router: Rc<MessageRouter>,
        config: Configuration,
        transport: Transport,
    ) -> Self {
        let state = Rc::new(RefCell::new(WorkspaceState {
            files: config.files.clone(),
            entry: config.entry.clone(),
            active_file: config.initial_tab.clone(),
            logs: Vec::new(),
            compiler_error: None,
            runtime_error: None,
            active_step: None,
        }));

        let pane = PaneOptions::find_player(&config.panes)
            .cloned()
            .unwrap_or_default();
        let props = PlayerProps::from_configuration(&config, &pane);

        let on_run = state.clone();
        let on_console = state.clone();
        let on_error = state.clone();
        let callbacks = PlayerCallbacks::default()
            .on_run(move || {
                let mut state = on_run.borrow_mut();
                state.logs.clear();
                state.runtime_error = None;
            })
            .on_console(move |command| {
                let mut state = on_console.borrow_mut();
                match command {
                    ConsoleCommand::Log { .. } => state.logs.push(command.clone()),
                    ConsoleCommand::Clear => state.logs.clear(),
                }
            })
            .on_error(move |payload| {
                on_error.borrow_mut().runtime_error = Some(PublicError::from_payload(payload));
            });

        let player = PlayerFrame::mount_with_router(router, props, callbacks, transport);
        debug!(session = %player.id(), files = config.files.len(), "workspace mounted");

        Self {
            config,
            state,
            player,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn player(&self) -> &PlayerFrame {
        &self.player
    }

    /// Run the current file set from the entry file.
    pub fn start(&self) {
        let (files, entry) = {
            let state = self.state.borrow();
            (state.files.clone(), state.entry.clone())
        };
        self.player.run(files, entry);
    }

    /// Replace one file and run the whole set again.
    pub fn update_file(&self, path: &str, contents: &str) {
        self.state.borrow_mut().files.insert(path, contents);
        self.start();
    }

    /// Switch the active editor tab. Unknown paths are ignored.
    pub fn select_file(&self, path: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.files.contains(path) {
            return false;
        }
        state.active_file = path.to_string();
        true
    }

    /// Load the files of a workspace step and run them.
    pub fn select_step(&self, index: usize) -> bool {
        let Some(step) = self.config.workspaces.get(index) else {
            return false;
        };
        {
            let mut state = self.state.borrow_mut();
            let workspace = &step.workspace;
            if !workspace.files.is_empty() {
                state.files = workspace.files.clone();
            }
            if !workspace.entry.is_empty() {
                state.entry = workspace.entry.clone();
            }
            state.active_file = if state.files.contains(&workspace.initial_tab) {
                workspace.initial_tab.clone()
            } else {
                state.entry.clone()
            };
            state.active_step = Some(index);
        }
        self.start();
        true
    }

    pub fn active_step(&self) -> Option<usize> {
        self.state.borrow().active_step
    }

    pub fn files(&self) -> FileMap {
        self.state.borrow().files.clone()
    }

    pub fn active_file(&self) -> String {
        self.state.borrow().active_file.clone()
    }

    /// Contents of the active tab.
    pub fn active_contents(&self) -> Option<String> {
        let state = self.state.borrow();
        state.files.get(&state.active_file).map(str::to_string)
    }

    pub fn set_compiler_error(&self, error: Option<PublicError>) {
        self.state.borrow_mut().compiler_error = error;
    }

    pub fn runtime_error(&self) -> Option<PublicError> {
        self.state.borrow().runtime_error.clone()
    }

    /// The error the editor shows. A compiler error hides a runtime one.
    pub fn error(&self) -> Option<PublicError> {
        let state = self.state.borrow();
        state.compiler_error.clone().or_else(|| state.runtime_error.clone())
    }

    /// Tabs are only shown for multi-file workspaces.
    pub fn file_tabs(&self) -> Vec<String> {
        let state = self.state.borrow();
        if state.files.len() <= 1 {
            return Vec::new();
        }
        state.files.paths().map(str::to_string).collect()
    }

    pub fn status_text(&self) -> String {
        match self.error() {
            Some(error) => error.summary,
            None => self.config.strings.no_errors.clone(),
        }
    }

    pub fn logs(&self) -> Vec<ConsoleCommand> {
        self.state.borrow().logs.clone()
    }

    /// Logs as the editor receives them: only with the playground enabled.
    pub fn editor_logs(&self) -> Option<Vec<ConsoleCommand>> {
        self.config.playground.enabled.then(|| self.logs())
    }
}
