//! # Playground Frame
//!
//! The core of an embeddable code playground: resolves a flexible options
//! surface into a complete configuration, and runs the file set in a
//! sandboxed execution context through a small session protocol.
//!
//! ## Protocol
//!
//! - **Bootstrap**: each player mounts with a fresh session id and hands out
//!   a `player.html#...` locator carrying its render parameters
//! - **Handshake**: runs issued before the execution context reports `ready`
//!   are held, latest only, and flushed once on `ready`
//! - **Dispatch**: `{fileMap, entry, source: "rnwp"}`, by direct call in a
//!   shared environment or as a JSON message otherwise
//! - **Events**: `ready`, `error` and `console` come back in extended JSON and
//!   are routed to the owning player by session id
//!
//! ## Usage
//!
//! ```rust,ignore
//! use playground_frame::{normalize, PublicOptions, Transport, Workspace};
//!
//! let options = PublicOptions::from_path("playground.json".as_ref())?;
//! let (frame, mut requests) = tokio::sync::mpsc::unbounded_channel();
//! let workspace = Workspace::mount(normalize(&options), Transport::isolated(frame));
//!
//! println!("{}", workspace.player().locator()?);
//! workspace.start();
//! ```

mod bootstrap;
mod dependencies;
mod error;
mod extended_json;
mod file_map;
mod loader;
pub mod logging;
mod messages;
mod ops;
mod options;
mod panes;
mod player;
mod presets;
mod router;
mod runtime;
mod session;
mod transport;
mod workspace;

pub use bootstrap::{BootstrapParams, PlayerStyles, BOOTSTRAP_DOCUMENT};
pub use dependencies::detect_modules;
pub use error::ProtocolError;
pub use extended_json::Value;
pub use file_map::FileMap;
pub use loader::FileMapLoader;
pub use messages::{ConsoleCommand, InboundMessage, RunRequest, SourceLocation, SOURCE_TAG};
pub use ops::FrameOutbox;
pub use options::{
    normalize, Configuration, ExternalStyles, PlaygroundOptions, PlaygroundOverrides,
    PublicOptions, PublicResponsivePaneSet, ResponsivePaneSet, StepWorkspace, StringOverrides,
    TypeScriptOptions, TypeScriptOverrides, UserInterfaceStrings, WorkspaceStep,
};
pub use panes::{
    normalize_pane, BasicPaneOptions, ConsoleOptions, CssProperties, EditorPaneOptions,
    ExternalModule, FileList, PaneKind, PaneOptions, PlayerPaneOptions, PublicConsoleOptions,
    PublicPane, PublicPaneOptions, StackPaneOptions,
};
pub use player::{PlayerCallbacks, PlayerFrame, PlayerProps};
pub use presets::{preset_options, DEFAULT_PRESET};
pub use router::{MessageRouter, SessionHandler};
pub use runtime::{ContextConfig, ExecutionContext};
pub use session::{Session, SessionId, SessionStatus};
pub use transport::{SharedEnvironment, Transport};
pub use workspace::{PublicError, Workspace};
