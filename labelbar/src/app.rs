//! Central application state for labelbar.
//!
//! This module owns all mutable UI state: the current mode, the bottom-bar
//! cursor, the open panels, the revision browser and the status line. The
//! annotation data itself lives in the shared [`ReviewStore`] and
//! [`SqliteCommentStore`]; render code reads snapshots of them through
//! `AppState`. Store calls that touch the database are spawned as tokio tasks
//! via [`AppState::spawn_command`] and report back as [`AppEvent`]s.

use std::sync::Arc;

use labelbar_core::capability::Capabilities;
use labelbar_core::comments::SqliteCommentStore;
use labelbar_core::context::ReviewContext;
use labelbar_core::controls::{self, ActionId, ActionSpec, Control, Hotkey};
use labelbar_core::dispatch::ActionDispatcher;
use labelbar_core::gate::{CommentGate, GateOutcome};
use labelbar_core::store::ReviewStore;
use labelbar_core::toolbar::{self, Panels, ToolbarItem};
use labelbar_core::types::{Annotation, Revision};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::event::AppEvent;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Bottom-bar navigation (default).
    #[default]
    Normal,
    /// Typing into the comment box.
    Insert,
    /// Typing the label of a new region.
    Label,
    /// Full-screen help overlay is shown above all panels.
    HelpOverlay,
    /// Quit-confirmation dialog shown when a draft comment would be lost.
    ConfirmQuit,
}

/// Work that has to leave the key handler and run against the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run a bottom-bar action through the comment gate.
    Press(ActionId),
    /// Commit the draft comment on its own.
    CommitComment,
    ToggleGroundTruth,
    /// A different annotation was selected: start a comment session and reload history.
    SelectionChanged,
    /// Reload the revision list of the current annotation.
    RefreshRevisions,
}

/// A transient message in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    /// Logic ticks left before the message is cleared.
    pub ticks_left: u8,
}

/// Ticks a status message stays visible (4 Hz tick, so 3 seconds).
const STATUS_TICKS: u8 = 12;

pub struct AppState {
    pub mode: Mode,
    pub store: Arc<ReviewStore>,
    pub comments: Arc<SqliteCommentStore>,
    pub gate: CommentGate,
    pub capabilities: Capabilities,
    pub explore: bool,
    pub enable_tooltips: bool,
    pub viewing_all: bool,
    pub panels: Panels,

    /// Index into [`AppState::buttons`] of the focused button.
    pub bar_cursor: usize,
    /// Label being typed in `Mode::Label`.
    pub label_input: String,

    /// Revisions of the selected annotation, newest first.
    pub revisions: Vec<Revision>,
    /// Index into `revisions` of the revision being viewed; `None` is the live annotation.
    pub revision_cursor: Option<usize>,

    pub status: Option<StatusMessage>,
    pub help_scroll: u16,
}

impl AppState {
    pub fn new(store: Arc<ReviewStore>, comments: Arc<SqliteCommentStore>, config: &Config) -> Self {
        Self {
            mode: Mode::default(),
            store,
            comments,
            gate: CommentGate::default(),
            capabilities: config.capabilities(),
            explore: config.explore,
            enable_tooltips: config.enable_tooltips,
            viewing_all: false,
            panels: Panels::default(),
            bar_cursor: 0,
            label_input: String::new(),
            revisions: Vec::new(),
            revision_cursor: None,
            status: None,
            help_scroll: 0,
        }
    }

    /// Builds the context the resolvers read, from the live store and gate.
    pub fn context(&self) -> ReviewContext {
        ReviewContext {
            capabilities: self.capabilities.clone(),
            history_selected: self.store.history_selected(),
            is_in_progress: self.gate.is_in_progress(),
            is_submitting: self.store.is_submitting(),
            explore: self.explore,
            viewing_all: self.viewing_all,
            enable_tooltips: self.enable_tooltips,
            has_description: self.store.snapshot().description.is_some(),
        }
    }

    pub fn selected(&self) -> Option<Annotation> {
        self.store.selected()
    }

    pub fn controls(&self) -> Vec<Control> {
        match self.selected() {
            Some(annotation) => controls::resolve(&self.context(), &annotation),
            None => Vec::new(),
        }
    }

    /// The buttons of [`AppState::controls`], in bar order.
    pub fn buttons(&self) -> Vec<ActionSpec> {
        self.controls()
            .iter()
            .filter_map(Control::as_button)
            .cloned()
            .collect()
    }

    pub fn toolbar(&self) -> Vec<ToolbarItem> {
        match self.selected() {
            Some(annotation) => toolbar::resolve_toolbar(&self.context(), self.panels, &annotation),
            None => Vec::new(),
        }
    }

    pub fn has_edit_history(&self) -> bool {
        self.toolbar()
            .iter()
            .any(|item| matches!(item, ToolbarItem::EditHistory { .. }))
    }

    pub fn has_instructions(&self) -> bool {
        self.toolbar()
            .iter()
            .any(|item| matches!(item, ToolbarItem::Instructions { .. }))
    }

    pub fn has_ground_truth(&self) -> bool {
        self.toolbar()
            .iter()
            .any(|item| matches!(item, ToolbarItem::GroundTruth { .. }))
    }

    /// Whether the selected annotation accepts edits right now.
    pub fn is_locked(&self) -> bool {
        match self.selected() {
            Some(annotation) => self.context().is_locked(annotation.editable),
            None => true,
        }
    }

    /// The button under the bar cursor, clamped to the current bar.
    pub fn focused_button(&self) -> Option<ActionSpec> {
        let buttons = self.buttons();
        let index = self.bar_cursor.min(buttons.len().saturating_sub(1));
        buttons.into_iter().nth(index)
    }

    pub fn cursor_left(&mut self) {
        let len = self.buttons().len();
        self.bar_cursor = self.bar_cursor.min(len.saturating_sub(1)).saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let len = self.buttons().len();
        self.bar_cursor = (self.bar_cursor + 1).min(len.saturating_sub(1));
    }

    /// The action a hotkey would press, if its button is present and enabled.
    pub fn hotkey(&self, hotkey: Hotkey) -> Option<ActionId> {
        controls::hotkey_target(&self.controls(), hotkey)
    }

    pub fn draft_is_empty(&self) -> bool {
        self.comments.state().current_comment.trim().is_empty()
    }

    /// Moves the selection to the next or previous annotation in the task.
    pub fn switch_entity(&mut self, forward: bool) {
        if forward {
            self.store.select_next();
        } else {
            self.store.select_prev();
        }
        self.bar_cursor = 0;
        self.revisions.clear();
        self.revision_cursor = None;
    }

    /// Steps one revision back in time (`[`).
    pub fn older_revision(&mut self) {
        if self.revisions.is_empty() {
            self.set_status("no revisions yet");
            return;
        }
        let next = match self.revision_cursor {
            None => 0,
            Some(i) => (i + 1).min(self.revisions.len() - 1),
        };
        self.show_revision(Some(next));
    }

    /// Steps one revision forward (`]`); past the newest returns to the live annotation.
    pub fn newer_revision(&mut self) {
        let next = match self.revision_cursor {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
        self.show_revision(next);
    }

    pub fn back_to_live(&mut self) {
        self.show_revision(None);
    }

    fn show_revision(&mut self, cursor: Option<usize>) {
        self.revision_cursor = cursor;
        let revision = cursor.and_then(|i| self.revisions.get(i).cloned());
        self.store.select_revision(revision);
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            ticks_left: STATUS_TICKS,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!(message = %text, "shown in status bar");
        self.status = Some(StatusMessage {
            text,
            is_error: true,
            ticks_left: STATUS_TICKS,
        });
    }

    /// Ages the status message; called on every logic tick.
    pub fn tick(&mut self) {
        if let Some(status) = &mut self.status {
            status.ticks_left = status.ticks_left.saturating_sub(1);
            if status.ticks_left == 0 {
                self.status = None;
            }
        }
    }

    /// Spawns `command` on the runtime. Its result comes back through `tx`.
    pub fn spawn_command(&self, command: Command, tx: UnboundedSender<AppEvent>) {
        let store = Arc::clone(&self.store);
        let comments = Arc::clone(&self.comments);
        match command {
            Command::Press(id) => {
                // The target is fixed at key time; the commit step may yield.
                let Some(target) = self.selected().map(|a| a.id) else {
                    let _ = tx.send(AppEvent::ActionFinished {
                        id,
                        outcome: Err(labelbar_core::Error::NoSelection),
                    });
                    return;
                };
                let gate = self.gate.clone();
                let policy = id.gate_policy(&self.capabilities);
                tokio::spawn(async move {
                    let pinned = store.pin(target);
                    let outcome = gate
                        .run(policy, comments.as_ref(), || id.invoke(&pinned))
                        .await;
                    let _ = tx.send(AppEvent::ActionFinished { id, outcome });
                });
            }
            Command::CommitComment => {
                let gate = self.gate.clone();
                tokio::spawn(async move {
                    let result = gate.commit(comments.as_ref()).await;
                    let _ = tx.send(AppEvent::CommentCommitted(result));
                });
            }
            Command::ToggleGroundTruth => {
                tokio::spawn(async move {
                    let result = store.toggle_ground_truth().await;
                    let _ = tx.send(AppEvent::GroundTruthToggled(result));
                });
            }
            Command::SelectionChanged => {
                tokio::spawn(async move {
                    if let Some(annotation) = store.selected() {
                        if let Err(e) = comments.open_session(&annotation.id).await {
                            tracing::error!(error = %e, "loading comment thread failed");
                        }
                    }
                    let result = store.revisions().await;
                    let _ = tx.send(AppEvent::RevisionsLoaded(result));
                });
            }
            Command::RefreshRevisions => {
                tokio::spawn(async move {
                    let result = store.revisions().await;
                    let _ = tx.send(AppEvent::RevisionsLoaded(result));
                });
            }
        }
    }

    /// Applies the result of a gated action. Returns a follow-up command, if any.
    pub fn action_finished(
        &mut self,
        id: ActionId,
        outcome: labelbar_core::Result<GateOutcome>,
    ) -> Option<Command> {
        match outcome {
            Ok(GateOutcome::Invoked) => {
                self.set_status(format!("{} done", id.aria_label()));
                Some(Command::RefreshRevisions)
            }
            Ok(GateOutcome::Blocked) => {
                // The gate left its message on the comment box.
                self.mode = Mode::Insert;
                None
            }
            Ok(GateOutcome::Busy) => {
                self.set_status("another action is running");
                None
            }
            Err(e) => {
                self.set_error(format!("{}: {e}", id.aria_label()));
                None
            }
        }
    }

    pub fn comment_committed(&mut self, result: labelbar_core::Result<GateOutcome>) {
        match result {
            Ok(GateOutcome::Busy) => self.set_status("another action is running"),
            Ok(_) => self.set_status("comment saved"),
            Err(e) => self.set_error(format!("comment not saved: {e}")),
        }
    }

    pub fn ground_truth_toggled(&mut self, result: labelbar_core::Result<Option<bool>>) {
        match result {
            Ok(Some(true)) => self.set_status("marked as ground truth"),
            Ok(Some(false)) => self.set_status("ground truth unset"),
            Ok(None) => {}
            Err(e) => self.set_error(format!("ground truth not saved: {e}")),
        }
    }

    pub fn revisions_loaded(&mut self, result: labelbar_core::Result<Vec<Revision>>) {
        match result {
            Ok(revisions) => {
                self.revisions = revisions;
                if self.revision_cursor.is_some_and(|i| i >= self.revisions.len()) {
                    self.back_to_live();
                }
            }
            Err(e) => self.set_error(format!("history unavailable: {e}")),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use labelbar_core::db;
    use labelbar_core::types::TaskSeed;

    /// Builds an `AppState` over an in-memory database seeded from TOML.
    pub async fn state_from_seed(seed: &str, config: &Config) -> AppState {
        let conn = db::open_in_memory().await.unwrap();
        let seed: TaskSeed = toml::from_str(seed).unwrap();
        db::import_task(&conn, &seed).await.unwrap();
        let store = Arc::new(ReviewStore::open(conn.clone(), &seed.id).await.unwrap());
        let comments = Arc::new(SqliteCommentStore::new(conn));
        let id = store.selected().unwrap().id;
        comments.open_session(&id).await.unwrap();
        AppState::new(store, comments, config)
    }

    pub const TWO_ANNOTATIONS: &str = r#"
        id = "task"
        description = "Label every animal."
        [[annotations]]
        id = "draft"
        [[annotations]]
        id = "model"
        user_generate = false
        regions = ["cat"]
    "#;
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn cursor_stays_on_the_bar() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        // skip, submit
        assert_eq!(state.buttons().len(), 2);
        state.cursor_left();
        assert_eq!(state.bar_cursor, 0);
        state.cursor_right();
        state.cursor_right();
        assert_eq!(state.bar_cursor, 1);
        assert_eq!(state.focused_button().unwrap().id, ActionId::Submit);
    }

    #[tokio::test]
    async fn switching_entity_resets_bar_and_history() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        state.bar_cursor = 1;
        state.revision_cursor = Some(0);
        state.switch_entity(true);
        assert_eq!(state.selected().unwrap().id, "model");
        assert_eq!(state.bar_cursor, 0);
        assert!(state.revision_cursor.is_none());
        let ids: Vec<ActionId> = state.buttons().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![ActionId::Skip, ActionId::Update]);
    }

    #[tokio::test]
    async fn browsing_revisions_locks_the_bar() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        state.spawn_command(Command::Press(ActionId::Submit), tx.clone());
        match rx.recv().await.unwrap() {
            AppEvent::ActionFinished { id, outcome } => {
                assert_eq!(id, ActionId::Submit);
                assert_eq!(state.action_finished(id, outcome), Some(Command::RefreshRevisions));
            }
            other => panic!("unexpected event {other:?}"),
        }
        state.spawn_command(Command::RefreshRevisions, tx);
        match rx.recv().await.unwrap() {
            AppEvent::RevisionsLoaded(result) => state.revisions_loaded(result),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(state.revisions.len(), 1);

        state.older_revision();
        assert_eq!(state.revision_cursor, Some(0));
        assert!(state.is_locked());
        assert!(state.buttons().iter().all(|b| !b.enabled));

        state.newer_revision();
        assert!(state.revision_cursor.is_none());
        assert!(!state.is_locked());
    }

    #[tokio::test]
    async fn blocked_action_opens_the_comment_box() {
        let config = Config {
            review: true,
            ..Config::default()
        };
        let mut state = state_from_seed(TWO_ANNOTATIONS, &config).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.spawn_command(Command::Press(ActionId::Reject), tx);
        let AppEvent::ActionFinished { id, outcome } = rx.recv().await.unwrap() else {
            panic!("expected ActionFinished");
        };
        assert_eq!(state.action_finished(id, outcome), None);
        assert_eq!(state.mode, Mode::Insert);
        assert_eq!(
            state.comments.state().tooltip_message.as_deref(),
            Some(controls::REJECT_COMMENT_REQUIRED)
        );
    }

    #[tokio::test]
    async fn status_expires_after_ticks() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        state.set_status("hello");
        for _ in 0..STATUS_TICKS {
            assert!(state.status.is_some());
            state.tick();
        }
        assert!(state.status.is_none());
    }

    #[tokio::test]
    async fn press_acts_on_the_annotation_selected_at_key_time() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        state.switch_entity(true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.spawn_command(Command::Press(ActionId::Accept), tx);
        // The spawned task has not run yet on the test's single thread.
        state.switch_entity(false);

        let AppEvent::ActionFinished { outcome, .. } = rx.recv().await.unwrap() else {
            panic!("expected ActionFinished");
        };
        assert_eq!(outcome.unwrap(), GateOutcome::Invoked);
        let task = state.store.snapshot();
        let states: Vec<_> = task.annotations.iter().map(|a| (a.id.as_str(), a.state)).collect();
        assert_eq!(
            states,
            [
                ("draft", labelbar_core::types::AnnotationState::Pending),
                ("model", labelbar_core::types::AnnotationState::Accepted),
            ]
        );
    }

    #[tokio::test]
    async fn comment_commit_waits_for_a_running_action() {
        let mut state = state_from_seed(TWO_ANNOTATIONS, &Config::default()).await;
        state.comments.set_current_comment("later");
        let running = state.gate.latch().try_acquire().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.spawn_command(Command::CommitComment, tx);

        let AppEvent::CommentCommitted(result) = rx.recv().await.unwrap() else {
            panic!("expected CommentCommitted");
        };
        assert_eq!(result.unwrap(), GateOutcome::Busy);
        state.comment_committed(Ok(GateOutcome::Busy));
        assert_eq!(state.status.as_ref().unwrap().text, "another action is running");
        assert_eq!(state.comments.state().current_comment, "later");
        drop(running);
    }
}

