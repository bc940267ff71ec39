//! The player: one live preview bound to one execution context.
//!
//! A [`PlayerFrame`] owns a [`Session`]. Mounting generates the session id,
//! registers with the [`MessageRouter`] and exposes the bootstrap locator
//! the execution context must be started from. Runs issued before the
//! context reports `ready` are held (latest only) and flushed by the
//! handshake; runs after it go straight out through the [`Transport`].

use crate::bootstrap::{BootstrapParams, PlayerStyles};
use crate::dependencies::detect_modules;
use crate::error::ProtocolError;
use crate::file_map::FileMap;
use crate::messages::{ConsoleCommand, InboundMessage};
use crate::options::{Configuration, ExternalStyles};
use crate::panes::{ExternalModule, PlayerPaneOptions};
use crate::router::{MessageRouter, SessionHandler};
use crate::session::{Session, SessionId, SessionStatus};
use crate::transport::Transport;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type RunCallback = Rc<dyn Fn()>;
pub type ErrorCallback = Rc<dyn Fn(&str)>;
pub type ConsoleCallback = Rc<dyn Fn(&ConsoleCommand)>;

/// Hooks the embedding application observes a player through.
#[derive(Clone)]
pub struct PlayerCallbacks {
    /// Every `run` call, held or sent
    pub on_run: RunCallback,
    /// Errors reported by the execution context, verbatim
    pub on_error: ErrorCallback,
    pub on_console: ConsoleCallback,
}

impl Default for PlayerCallbacks {
    fn default() -> Self {
        Self {
            on_run: Rc::new(|| {}),
            on_error: Rc::new(|_| {}),
            on_console: Rc::new(|_| {}),
        }
    }
}

impl PlayerCallbacks {
    pub fn on_run(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_run = Rc::new(callback);
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.on_error = Rc::new(callback);
        self
    }

    pub fn on_console(mut self, callback: impl Fn(&ConsoleCommand) + 'static) -> Self {
        self.on_console = Rc::new(callback);
        self
    }
}

/// Render parameters of a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProps {
    pub preset: String,
    pub platform: String,
    pub width: f64,
    pub scale: f64,
    pub asset_root: String,
    pub status_bar_height: f64,
    pub status_bar_color: String,
    pub shared_environment: bool,
    pub detected_modules: Vec<String>,
    pub modules: Vec<ExternalModule>,
    pub style_sheet: String,
    pub css: String,
    pub prelude: String,
    pub external_styles: ExternalStyles,
}

impl Default for PlayerProps {
    fn default() -> Self {
        let pane = PlayerPaneOptions::default();
        Self {
            preset: crate::presets::DEFAULT_PRESET.to_string(),
            platform: pane.platform,
            width: pane.width,
            scale: pane.scale,
            asset_root: pane.asset_root,
            status_bar_height: pane.status_bar_height,
            status_bar_color: pane.status_bar_color,
            shared_environment: true,
            detected_modules: Vec::new(),
            modules: pane.modules,
            style_sheet: pane.style_sheet,
            css: pane.css,
            prelude: pane.prelude,
            external_styles: ExternalStyles::new(),
        }
    }
}

impl PlayerProps {
    /// Props for `pane` inside a resolved workspace.
    pub fn from_configuration(config: &Configuration, pane: &PlayerPaneOptions) -> Self {
        Self {
            preset: config.preset.clone(),
            platform: pane.platform.clone(),
            width: pane.width,
            scale: pane.scale,
            asset_root: pane.asset_root.clone(),
            status_bar_height: pane.status_bar_height,
            status_bar_color: pane.status_bar_color.clone(),
            shared_environment: config.shared_environment,
            detected_modules: detect_modules(&config.files),
            modules: pane.modules.clone(),
            style_sheet: pane.style_sheet.clone(),
            css: pane.css.clone(),
            prelude: pane.prelude.clone(),
            external_styles: config.styles.clone(),
        }
    }
}

struct PlayerInner {
    id: SessionId,
    session: RefCell<Session>,
    props: PlayerProps,
    callbacks: PlayerCallbacks,
    transport: Transport,
}

impl PlayerInner {
    fn run(&self, file_map: FileMap, entry: String) {
        (self.callbacks.on_run)();

        // The session borrow ends here; the transport may call straight
        // back into this player.
        let request = self.session.borrow_mut().request_run(file_map, entry);
        match request {
            Some(request) => {
                debug!(session = %self.id, entry = %request.entry, "dispatching run request");
                self.transport.post(request);
            }
            None => debug!(session = %self.id, "execution context loading, run request held"),
        }
    }
}

impl SessionHandler for PlayerInner {
    fn session_id(&self) -> &SessionId {
        &self.id
    }

    fn handle(&self, message: InboundMessage) {
        if message.session_id() != &self.id {
            return;
        }

        match message {
            InboundMessage::Ready { .. } => {
                let pending = self.session.borrow_mut().mark_ready();
                debug!(session = %self.id, flushing = pending.is_some(), "execution context ready");
                if let Some((file_map, entry)) = pending {
                    self.run(file_map, entry);
                }
            }
            InboundMessage::Error { payload, .. } => (self.callbacks.on_error)(&payload),
            InboundMessage::Console { payload, .. } => (self.callbacks.on_console)(&payload),
        }
    }
}

/// A mounted player. Dropping it unmounts it.
pub struct PlayerFrame {
    inner: Rc<PlayerInner>,
    router: Rc<MessageRouter>,
}

impl PlayerFrame {
    /// Mount on this thread's router.
    pub fn mount(props: PlayerProps, callbacks: PlayerCallbacks, transport: Transport) -> Self {
        Self::mount_with_router(MessageRouter::global(), props, callbacks, transport)
    }

    pub fn mount_with_router(
        router: Rc<MessageRouter>,
        props: PlayerProps,
        callbacks: PlayerCallbacks,
        transport: Transport,
    ) -> Self {
        let session = Session::new();
        let inner = Rc::new(PlayerInner {
            id: session.id().clone(),
            session: RefCell::new(session),
            props,
            callbacks,
            transport,
        });

        let handler: Weak<dyn SessionHandler> = Rc::downgrade(&inner) as Weak<dyn SessionHandler>;
        router.register(handler);
        debug!(session = %inner.id, "player mounted");

        Self { inner, router }
    }

    /// Unmount and mount again: a fresh session and a fresh id.
    pub fn remount(self) -> Self {
        let router = self.router.clone();
        let props = self.inner.props.clone();
        let callbacks = self.inner.callbacks.clone();
        let transport = self.inner.transport.clone();
        drop(self);
        Self::mount_with_router(router, props, callbacks, transport)
    }

    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.session.borrow().status()
    }

    pub fn props(&self) -> &PlayerProps {
        &self.inner.props
    }

    /// Whether the preview is drawn inside a device frame rather than bare.
    pub fn uses_device_frame(&self) -> bool {
        self.inner.props.platform != "web"
    }

    /// Parameters the execution context boots with.
    pub fn bootstrap_params(&self) -> BootstrapParams {
        let props = &self.inner.props;
        BootstrapParams {
            preset: props.preset.clone(),
            id: self.inner.id.clone(),
            shared_environment: props.shared_environment,
            asset_root: props.asset_root.clone(),
            detected_modules: props.detected_modules.clone(),
            modules: props.modules.clone(),
            style_sheet: props.style_sheet.clone(),
            css: props.css.clone(),
            status_bar_color: props.status_bar_color.clone(),
            status_bar_height: props.status_bar_height,
            prelude: props.prelude.clone(),
            styles: PlayerStyles::from_external(&props.external_styles),
        }
    }

    /// `player.html#...` for this session.
    pub fn locator(&self) -> Result<String, ProtocolError> {
        self.bootstrap_params().locator()
    }

    /// Run `file_map` starting at `entry`.
    pub fn run(&self, file_map: FileMap, entry: impl Into<String>) {
        self.inner.run(file_map, entry.into());
    }

    /// Feed one event directly, bypassing the router.
    pub fn handle_message(&self, message: InboundMessage) {
        self.inner.handle(message);
    }
}

impl Drop for PlayerFrame {
    fn drop(&mut self) {
        self.router.unregister(&self.inner.id);
        debug!(session = %self.inner.id, "player unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extended_json::Value;
    use crate::messages::RunRequest;
    use crate::transport::SharedEnvironment;
    use std::cell::Cell;

    #[derive(Default)]
    struct Sandbox {
        received: RefCell<Vec<RunRequest>>,
    }

    impl SharedEnvironment for Sandbox {
        fn receive(&self, request: RunRequest) {
            self.received.borrow_mut().push(request);
        }
    }

    struct Harness {
        router: Rc<MessageRouter>,
        sandbox: Rc<Sandbox>,
        runs: Rc<Cell<usize>>,
        errors: Rc<RefCell<Vec<String>>>,
        logs: Rc<RefCell<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                router: Rc::new(MessageRouter::new()),
                sandbox: Rc::new(Sandbox::default()),
                runs: Rc::new(Cell::new(0)),
                errors: Rc::new(RefCell::new(Vec::new())),
                logs: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn mount(&self) -> PlayerFrame {
            let runs = self.runs.clone();
            let errors = self.errors.clone();
            let logs = self.logs.clone();
            let callbacks = PlayerCallbacks::default()
                .on_run(move || runs.set(runs.get() + 1))
                .on_error(move |payload| errors.borrow_mut().push(payload.to_string()))
                .on_console(move |command| logs.borrow_mut().push(command.render()));
            PlayerFrame::mount_with_router(
                self.router.clone(),
                PlayerProps::default(),
                callbacks,
                Transport::shared(self.sandbox.clone()),
            )
        }

        fn ready(&self, player: &PlayerFrame) {
            self.router.deliver(InboundMessage::Ready { id: player.id().clone() });
        }
    }

    #[test]
    fn test_latest_run_wins_before_ready() {
        let harness = Harness::new();
        let player = harness.mount();

        player.run(FileMap::single("a.js", "A"), "a.js");
        player.run(FileMap::single("b.js", "B"), "b.js");
        assert!(harness.sandbox.received.borrow().is_empty());

        harness.ready(&player);

        let received = harness.sandbox.received.borrow();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].entry, "b.js");
        assert_eq!(received[0].source, "rnwp");
        assert_eq!(player.status(), SessionStatus::Ready);
    }

    #[test]
    fn test_on_run_fires_for_held_and_flushed_runs() {
        let harness = Harness::new();
        let player = harness.mount();
        player.run(FileMap::single("a.js", "A"), "a.js");
        assert_eq!(harness.runs.get(), 1);
        harness.ready(&player);
        assert_eq!(harness.runs.get(), 2);
    }

    #[test]
    fn test_ready_runs_are_sent_every_time() {
        let harness = Harness::new();
        let player = harness.mount();
        harness.ready(&player);
        assert!(harness.sandbox.received.borrow().is_empty());

        player.run(FileMap::single("a.js", "A"), "a.js");
        player.run(FileMap::single("a.js", "A"), "a.js");
        assert_eq!(harness.sandbox.received.borrow().len(), 2);
    }

    #[test]
    fn test_second_ready_does_not_resend() {
        let harness = Harness::new();
        let player = harness.mount();
        player.run(FileMap::single("a.js", "A"), "a.js");
        harness.ready(&player);
        harness.ready(&player);
        assert_eq!(harness.sandbox.received.borrow().len(), 1);
    }

    #[test]
    fn test_foreign_session_events_are_ignored() {
        let harness = Harness::new();
        let player = harness.mount();
        player.run(FileMap::single("a.js", "A"), "a.js");

        let foreign = SessionId::from("not-this-one");
        harness.router.deliver(InboundMessage::Ready { id: foreign.clone() });
        harness.router.deliver(InboundMessage::Error { id: foreign.clone(), payload: "x".into() });
        player.handle_message(InboundMessage::Console {
            id: foreign,
            payload: ConsoleCommand::log(vec![Value::from("x")]),
        });

        assert_eq!(player.status(), SessionStatus::Loading);
        assert!(harness.errors.borrow().is_empty());
        assert!(harness.logs.borrow().is_empty());
        assert!(harness.sandbox.received.borrow().is_empty());
    }

    #[test]
    fn test_error_and_console_are_relayed() {
        let harness = Harness::new();
        let player = harness.mount();
        let id = player.id().clone();
        harness.router.deliver_raw(&format!(
            r#"{{"type":"console","id":"{}","payload":{{"command":"log","data":[1,{{"$extended":"undefined"}}]}}}}"#,
            id
        ));
        harness.router.deliver_raw(&format!(
            r#"{{"type":"error","id":"{}","payload":"ReferenceError: x is not defined"}}"#,
            id
        ));
        assert_eq!(*harness.logs.borrow(), vec!["1 undefined".to_string()]);
        assert_eq!(*harness.errors.borrow(), vec!["ReferenceError: x is not defined".to_string()]);
    }

    #[test]
    fn test_players_share_the_router_but_not_events() {
        let harness = Harness::new();
        let first = harness.mount();
        let second = harness.mount();
        assert_ne!(first.id(), second.id());

        harness.ready(&second);
        assert_eq!(first.status(), SessionStatus::Loading);
        assert_eq!(second.status(), SessionStatus::Ready);
    }

    #[test]
    fn test_unmount_unregisters() {
        let harness = Harness::new();
        let player = harness.mount();
        let id = player.id().clone();
        assert!(harness.router.is_registered(&id));
        drop(player);
        assert!(!harness.router.is_registered(&id));
    }

    #[test]
    fn test_remount_gets_a_new_session() {
        let harness = Harness::new();
        let player = harness.mount();
        harness.ready(&player);
        let old = player.id().clone();

        let player = player.remount();
        assert_ne!(player.id(), &old);
        assert_eq!(player.status(), SessionStatus::Loading);
        assert!(!harness.router.is_registered(&old));
        assert!(harness.router.is_registered(player.id()));
    }

    #[test]
    fn test_callback_may_run_again() {
        let harness = Harness::new();
        let slot: Rc<RefCell<Option<PlayerFrame>>> = Rc::new(RefCell::new(None));
        let retry = slot.clone();
        let callbacks = PlayerCallbacks::default().on_error(move |_| {
            if let Some(player) = retry.borrow().as_ref() {
                player.run(FileMap::single("fixed.js", "1"), "fixed.js");
            }
        });
        let player = PlayerFrame::mount_with_router(
            harness.router.clone(),
            PlayerProps::default(),
            callbacks,
            Transport::shared(harness.sandbox.clone()),
        );
        let id = player.id().clone();
        *slot.borrow_mut() = Some(player);

        harness.router.deliver(InboundMessage::Ready { id: id.clone() });
        harness.router.deliver(InboundMessage::Error { id, payload: "boom".into() });
        assert_eq!(harness.sandbox.received.borrow()[0].entry, "fixed.js");
        slot.borrow_mut().take();
    }

    #[test]
    fn test_locator_carries_session_and_props() {
        let harness = Harness::new();
        let player = harness.mount();
        let params = BootstrapParams::from_locator(&player.locator().unwrap()).unwrap();
        assert_eq!(&params.id, player.id());
        assert!(params.shared_environment);
        assert_eq!(params.style_sheet, "reset");
        assert!(player.uses_device_frame());
    }
}
