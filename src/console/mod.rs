//! # Console Host
//!
//! A line-oriented host for a navigation hierarchy. It owns the root
//! navigator, drives its lifecycle, and moves a single [`ConsoleView`]
//! to whichever scene the root reports as active.
//!
//! ```text
//!   stdin ──parse──► Command ──execute──► root: CompositeStackNavigator
//!                                           ├── pages: StackNavigator
//!                                           └── onboarding: WizardNavigator
//!   stdout ◄── notices ◄── Presenter ◄── SceneChanged / Finished
//! ```
//!
//! ## Modules
//!
//! - [`command`]: input parsing
//! - [`scene`]: page and onboarding scenes, the view, and the restore factory

pub mod command;
pub mod scene;

use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::core::config::ResolvedConfig;
use crate::core::logger::{LogCrateLogger, Logger};
use crate::core::snapshot::SnapshotStore;
use crate::navigation::{
    BackPressHandler, CompositeStackNavigator, ListenerHandle, Navigator, NavigatorError,
    NavigatorEvent, NavigatorFactory, NavigatorKey, NavigatorRef, SaveableNavigator,
    StackNavigator, WizardNavigator,
};
use crate::presentation::{SceneRef, same_scene};
use crate::state::NavigatorState;

use command::{Command, HELP, ParseError};
use scene::{ConsoleFactory, ConsoleScene, ConsoleView, PAGES};

pub const ROOT: NavigatorKey = NavigatorKey::from_static("root");

/// What the input loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Follows the root's events and keeps the view on the active scene.
#[derive(Default)]
struct Presenter {
    active: RefCell<Option<SceneRef>>,
    spare: RefCell<Option<ConsoleView>>,
    notices: RefCell<Vec<String>>,
    finished: Cell<bool>,
}

impl Presenter {
    fn on_event(&self, event: &NavigatorEvent) {
        match event {
            NavigatorEvent::SceneChanged { scene, transition } => {
                let direction = match transition {
                    Some(t) if t.is_backward() => "back to",
                    Some(_) => "forward to",
                    None => "showing",
                };
                self.show(scene);
                self.notices
                    .borrow_mut()
                    .push(format!("{direction} {}", scene::label(scene)));
            }
            NavigatorEvent::Finished => {
                self.release();
                self.finished.set(true);
                self.notices.borrow_mut().push("nothing left to show".to_string());
            }
        }
    }

    /// Moves the view from the previous scene to `next`. A scene that never
    /// had the view starts with an empty draft.
    fn show(&self, next: &SceneRef) {
        if let Some(active) = self.active.borrow().as_ref() {
            if same_scene(active, next) {
                return;
            }
        }
        self.release();

        let mut view = self.spare.borrow_mut().take().unwrap_or_default();
        view.draft.clear();
        if scene::with_view(next, |basic| basic.attach(view)).is_none() {
            debug!("{} has no view slot", scene::label(next));
        }
        *self.active.borrow_mut() = Some(next.clone());
    }

    /// Detaches the view from the active scene and keeps it for the next one.
    fn release(&self) {
        let Some(previous) = self.active.borrow_mut().take() else {
            return;
        };
        if let Some(view) = scene::with_view(&previous, |basic| basic.detach()).flatten() {
            *self.spare.borrow_mut() = Some(view);
        }
    }

    fn active(&self) -> Option<SceneRef> {
        self.active.borrow().clone()
    }

    fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }
}

/// A started root navigator plus everything needed to drive it.
pub struct Console {
    root: Rc<CompositeStackNavigator>,
    factory: ConsoleFactory,
    presenter: Rc<Presenter>,
    store: Option<SnapshotStore>,
    _subscription: ListenerHandle,
}

impl Console {
    /// Builds and starts the root, restoring it from `saved` when given.
    ///
    /// Fails when `saved` names a scene or navigator this console does not
    /// know.
    pub fn new(
        logger: Rc<dyn Logger>,
        saved: Option<&NavigatorState>,
        store: Option<SnapshotStore>,
    ) -> Result<Console, NavigatorError> {
        let factory = ConsoleFactory::new(logger.clone());
        let root = CompositeStackNavigator::builder(ROOT)
            .restore(saved, &factory)
            .logger(logger)
            .build(|| {
                factory
                    .instantiate_navigator(&PAGES, None)
                    .into_iter()
                    .collect()
            })?;

        let presenter = Rc::new(Presenter::default());
        let listener = presenter.clone();
        let subscription =
            root.add_listener(Rc::new(move |event: &NavigatorEvent| listener.on_event(event)));
        root.on_start();
        info!("Console started with {} navigator(s)", root.children().len());

        Ok(Console {
            root,
            factory,
            presenter,
            store,
            _subscription: subscription,
        })
    }

    pub fn root(&self) -> &Rc<CompositeStackNavigator> {
        &self.root
    }

    /// Label of the scene currently holding the view.
    pub fn active_label(&self) -> Option<String> {
        self.presenter.active().map(|scene| scene::label(&scene))
    }

    /// Draft of the attached view.
    pub fn draft(&self) -> Option<String> {
        let scene = self.presenter.active()?;
        scene::with_view(&scene, |basic| basic.container().map(|v| v.draft.clone())).flatten()
    }

    pub fn is_finished(&self) -> bool {
        self.presenter.finished.get()
    }

    /// Writes pending scene change notices.
    pub fn flush(&self, out: &mut impl Write) -> io::Result<()> {
        for notice in self.presenter.drain() {
            writeln!(out, "{notice}")?;
        }
        Ok(())
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        debug!("Executing {:?}", command);
        if self.is_finished() {
            return Ok(Flow::Quit);
        }

        match command {
            Command::Push(title) => match self.pages() {
                Some(pages) => pages.push(ConsoleScene::page(&title)),
                None => writeln!(out, "not on a page stack; use `open {title}`")?,
            },
            Command::Replace(title) => match self.pages() {
                Some(pages) => pages.replace(ConsoleScene::page(&title)),
                None => writeln!(out, "not on a page stack")?,
            },
            Command::Open(title) => match self.factory.pages(&title) {
                Ok(pages) => self.root.push(pages),
                Err(e) => writeln!(out, "cannot open {title}: {e}")?,
            },
            Command::Wizard => match self.factory.onboarding() {
                Ok(wizard) => self.root.push(wizard),
                Err(e) => writeln!(out, "cannot start onboarding: {e}")?,
            },
            Command::Next => match self.wizard() {
                Some(wizard) => wizard.next(),
                None => writeln!(out, "no wizard is active")?,
            },
            Command::Prev => match self.wizard() {
                Some(wizard) => wizard.previous(),
                None => writeln!(out, "no wizard is active")?,
            },
            Command::Back => {
                self.root.on_back_pressed();
            }
            Command::Type(text) => {
                let typed = self.presenter.active().and_then(|scene| {
                    scene::with_view(&scene, |basic| {
                        basic.container_mut().map(|view| view.draft = text)
                    })
                    .flatten()
                });
                if typed.is_none() {
                    writeln!(out, "nothing to type into")?;
                }
            }
            Command::Show => self.show(out)?,
            Command::Save => self.save(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {
                self.flush(out)?;
                self.save(out)?;
                return Ok(Flow::Quit);
            }
        }

        self.flush(out)?;
        if self.is_finished() {
            self.discard_snapshot();
            return Ok(Flow::Quit);
        }
        Ok(Flow::Continue)
    }

    /// Stops and destroys the root. Nothing is notified.
    pub fn shutdown(&self) {
        self.root.on_stop();
        self.root.on_destroy();
        info!("Console shut down");
    }

    fn active_child(&self) -> Option<NavigatorRef> {
        self.root.active_child()
    }

    fn pages(&self) -> Option<Rc<StackNavigator>> {
        self.active_child()?.downcast_rc::<StackNavigator>().ok()
    }

    fn wizard(&self) -> Option<Rc<WizardNavigator>> {
        self.active_child()?.downcast_rc::<WizardNavigator>().ok()
    }

    fn show(&self, out: &mut impl Write) -> io::Result<()> {
        let active = self.presenter.active();
        let is_active = |scene: &SceneRef| active.as_ref().is_some_and(|a| same_scene(a, scene));

        writeln!(out, "{}", self.root.key())?;
        for child in self.root.children() {
            let scenes = if let Some(pages) = child.downcast_ref::<StackNavigator>() {
                pages.scenes()
            } else if let Some(wizard) = child.downcast_ref::<WizardNavigator>() {
                wizard.scenes()
            } else {
                Vec::new()
            };
            let labels: Vec<String> = scenes
                .iter()
                .map(|scene| {
                    let marker = if is_active(scene) { "*" } else { "" };
                    format!("{}{marker}", scene::label(scene))
                })
                .collect();
            writeln!(out, "  {}: {}", child.key(), labels.join(", "))?;
        }
        if let Some(draft) = self.draft().filter(|d| !d.is_empty()) {
            writeln!(out, "draft: {draft}")?;
        }
        Ok(())
    }

    fn save(&self, out: &mut impl Write) -> io::Result<()> {
        let Some(store) = &self.store else {
            return writeln!(out, "no state directory configured");
        };
        if self.is_finished() {
            return Ok(());
        }
        match store.save(&self.root.save_instance_state()) {
            Ok(snapshot) => writeln!(out, "saved at {}", snapshot.saved_at.to_rfc3339()),
            Err(e) => {
                warn!("Failed to save snapshot: {}", e);
                writeln!(out, "save failed: {e}")
            }
        }
    }

    fn discard_snapshot(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!("Failed to remove snapshot: {}", e);
            }
        }
    }
}

/// Runs the console on stdin/stdout until `quit`, end of input, or the root
/// finishing.
pub fn run(config: ResolvedConfig) -> io::Result<()> {
    let store = SnapshotStore::new(&config.state_dir);
    let snapshot = if config.restore_on_start {
        store.load_or_warn()
    } else {
        info!("Starting fresh, ignoring any snapshot");
        None
    };
    if let Some(snapshot) = &snapshot {
        info!("Restoring snapshot from {}", snapshot.saved_at.to_rfc3339());
    }

    let mut console = Console::new(
        Rc::new(LogCrateLogger),
        snapshot.as_ref().map(|s| &s.state),
        Some(store),
    )
    .map_err(io::Error::other)?;

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    writeln!(out, "waypoint: type `help` for commands")?;
    console.flush(&mut out)?;

    let mut flow = Flow::Continue;
    let mut lines = stdin.lock().lines();
    while flow == Flow::Continue {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        flow = match command::parse(&line?) {
            Ok(command) => console.execute(command, &mut out)?,
            Err(ParseError::Empty) => Flow::Continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                Flow::Continue
            }
        };
    }
    // End of input saves like `quit`.
    if flow == Flow::Continue {
        writeln!(out)?;
        console.execute(Command::Quit, &mut out)?;
    }

    console.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger;
    use crate::state::SavedState;

    fn console() -> Console {
        Console::new(logger::noop(), None, None).unwrap()
    }

    fn run_commands(console: &mut Console, lines: &[&str]) -> (String, Flow) {
        let mut out = Vec::new();
        let mut flow = Flow::Continue;
        for line in lines {
            flow = console
                .execute(command::parse(line).unwrap(), &mut out)
                .unwrap();
        }
        (String::from_utf8(out).unwrap(), flow)
    }

    #[test]
    fn test_starts_on_home_page() {
        let console = console();
        let mut out = Vec::new();
        console.flush(&mut out).unwrap();

        assert_eq!(console.active_label().as_deref(), Some("home"));
        assert_eq!(String::from_utf8(out).unwrap(), "showing home\n");
    }

    #[test]
    fn test_view_follows_active_scene_and_keeps_drafts() {
        let mut console = console();
        let (output, _) = run_commands(
            &mut console,
            &["type hello", "push inbox", "type unsent reply"],
        );
        assert!(output.contains("forward to inbox"));
        assert_eq!(console.draft().as_deref(), Some("unsent reply"));

        let (output, flow) = run_commands(&mut console, &["back"]);

        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("back to home"));
        assert_eq!(console.active_label().as_deref(), Some("home"));
        assert_eq!(console.draft().as_deref(), Some("hello"));
    }

    #[test]
    fn test_only_the_started_scene_holds_the_view() {
        let mut console = console();
        run_commands(&mut console, &["push inbox"]);

        let scenes = console.pages().map(|pages| pages.scenes()).unwrap_or_default();
        let held: Vec<(bool, bool)> = scenes
            .iter()
            .map(|scene| {
                let scene = scene.borrow();
                let page = scene.downcast_ref::<ConsoleScene>().unwrap();
                (page.lifecycle.is_started(), page.view.is_attached())
            })
            .collect();

        assert_eq!(held, vec![(false, false), (true, true)]);
    }

    #[test]
    fn test_new_scene_starts_with_empty_draft() {
        let mut console = console();
        run_commands(&mut console, &["type hello", "replace settings"]);
        assert_eq!(console.draft().as_deref(), Some(""));
    }

    #[test]
    fn test_wizard_runs_to_completion_and_returns_to_pages() {
        let mut console = console();
        let (output, _) = run_commands(&mut console, &["wizard", "next", "prev", "next", "next"]);
        assert!(output.contains("forward to step 1/3"));
        assert!(output.contains("back to step 1/3"));
        assert_eq!(console.active_label().as_deref(), Some("step 3/3"));

        let (output, flow) = run_commands(&mut console, &["next"]);

        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("back to home"));
        assert_eq!(console.root().children().len(), 1);
    }

    #[test]
    fn test_page_commands_need_a_page_stack() {
        let mut console = console();
        let (output, _) = run_commands(&mut console, &["wizard", "push inbox", "show"]);
        assert!(output.contains("not on a page stack"));
        assert!(output.contains("onboarding: step 1/3*"));

        let (output, _) = run_commands(&mut console, &["back", "next"]);
        assert!(output.contains("no wizard is active"));
    }

    #[test]
    fn test_show_prints_hierarchy() {
        let mut console = console();
        let (output, _) = run_commands(
            &mut console,
            &["push inbox", "open settings", "type dark mode", "show"],
        );
        assert!(output.contains("root\n  pages: home, inbox\n  pages: settings*\n"));
        assert!(output.contains("draft: dark mode"));
    }

    #[test]
    fn test_back_on_last_page_quits() {
        let mut console = console();
        let (output, flow) = run_commands(&mut console, &["back"]);

        assert_eq!(flow, Flow::Quit);
        assert!(console.is_finished());
        assert!(output.contains("nothing left to show"));
        assert!(console.active_label().is_none());
    }

    #[test]
    fn test_save_then_restore_resumes_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut first = Console::new(logger::noop(), None, Some(store.clone())).unwrap();
        let (output, flow) = run_commands(
            &mut first,
            &["push inbox", "type unsent", "wizard", "next", "quit"],
        );
        assert_eq!(flow, Flow::Quit);
        assert!(output.contains("saved at"));
        first.shutdown();

        let snapshot = store.load().unwrap().unwrap();
        let mut second = Console::new(logger::noop(), Some(&snapshot.state), Some(store)).unwrap();
        assert_eq!(second.active_label().as_deref(), Some("step 2/3"));

        run_commands(&mut second, &["back", "back"]);
        assert_eq!(second.active_label().as_deref(), Some("inbox"));
        assert_eq!(second.draft().as_deref(), Some("unsent"));
    }

    #[test]
    fn test_finishing_root_discards_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut console = Console::new(logger::noop(), None, Some(store.clone())).unwrap();
        run_commands(&mut console, &["save"]);
        assert!(store.path().exists());

        run_commands(&mut console, &["back"]);

        assert!(!store.path().exists());
    }

    #[test]
    fn test_unknown_navigator_in_snapshot_fails() {
        let saved = SavedState::build(|state| {
            state.set("size", 1);
            state.set("active_index", 0);
            state.set("0_class", "mystery");
        });
        let result = Console::new(logger::noop(), Some(&saved), None);
        assert!(matches!(result, Err(NavigatorError::UnknownNavigator(_))));
    }

    #[test]
    fn test_save_without_store_reports() {
        let mut console = console();
        let (output, _) = run_commands(&mut console, &["save"]);
        assert!(output.contains("no state directory configured"));
    }
}
