//! SQLite-backed annotation store: the host side of the bottom bar.
//!
//! The store owns the loaded [`Task`] behind a mutex. Readers take cloned
//! snapshots; transitions clone the target annotation, apply the change to the
//! clone, persist it, and only then write it back. A failed write leaves the
//! in-memory task untouched. The mutex is never held across an `.await`.
//!
//! `ReviewStore` itself dispatches to whatever is selected when a call starts.
//! [`ReviewStore::pin`] returns a dispatcher fixed to one annotation id, for
//! actions that suspend (comment commit) before they reach the store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_rusqlite::Connection;

use crate::context::InFlightLatch;
use crate::db;
use crate::dispatch::{ActionDispatcher, TaskPayload};
use crate::error::{Error, Result};
use crate::ground_truth;
use crate::types::{Annotation, AnnotationState, Revision, RevisionAction, Task, Versions};

pub struct ReviewStore {
    conn: Connection,
    task: Mutex<Task>,
    selected_revision: Mutex<Option<Revision>>,
    submitting: InFlightLatch,
}

impl ReviewStore {
    /// Loads `task_id` from `conn` and wraps it in a store.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` if the task was never imported.
    pub async fn open(conn: Connection, task_id: &str) -> Result<Self> {
        let task = db::load_task(&conn, task_id).await?;
        tracing::info!(task = %task.id, annotations = task.annotations.len(), "task loaded");
        Ok(Self {
            conn,
            task: Mutex::new(task),
            selected_revision: Mutex::new(None),
            submitting: InFlightLatch::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn task(&self) -> MutexGuard<'_, Task> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn revision(&self) -> MutexGuard<'_, Option<Revision>> {
        self.selected_revision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the whole task for rendering.
    pub fn snapshot(&self) -> Task {
        self.task().clone()
    }

    /// A copy of the selected annotation.
    pub fn selected(&self) -> Option<Annotation> {
        self.task().selected().cloned()
    }

    pub fn select_next(&self) {
        self.task().select_next();
        self.revision().take();
    }

    pub fn select_prev(&self) {
        self.task().select_prev();
        self.revision().take();
    }

    /// Shows a historical revision read-only; `None` returns to the live annotation.
    pub fn select_revision(&self, revision: Option<Revision>) {
        *self.revision() = revision;
    }

    pub fn selected_revision(&self) -> Option<Revision> {
        self.revision().clone()
    }

    pub fn history_selected(&self) -> bool {
        self.revision().is_some()
    }

    /// Applies an in-memory edit to the selected annotation.
    fn edit<R>(&self, f: impl FnOnce(&mut Annotation) -> Result<R>) -> Result<R> {
        if self.history_selected() {
            return Err(Error::ReadOnlyRevision);
        }
        let mut task = self.task();
        let annotation = task.selected_mut().ok_or(Error::NoSelection)?;
        f(annotation)
    }

    /// Appends a region to the selected annotation's draft results.
    ///
    /// # Errors
    ///
    /// `Error::ReadOnlyRevision` while a revision is shown, `Error::NotEditable`
    /// for read-only entities.
    pub fn add_region(&self, label: &str) -> Result<()> {
        self.edit(|a| a.add_region(label))
    }

    /// Removes the last region of the selected annotation, if any.
    ///
    /// # Errors
    ///
    /// As [`ReviewStore::add_region`].
    pub fn remove_last_region(&self) -> Result<bool> {
        self.edit(|a| match a.results.len() {
            0 => Ok(false),
            n => a.remove_region(n - 1),
        })
    }

    pub fn undo(&self) -> Result<bool> {
        self.edit(|a| Ok(a.editable && a.undo()))
    }

    pub fn redo(&self) -> Result<bool> {
        self.edit(|a| Ok(a.editable && a.redo()))
    }

    pub fn reset_history(&self) -> Result<bool> {
        self.edit(|a| Ok(a.editable && a.reset_history()))
    }

    /// Flips and persists the ground-truth flag on the selected annotation.
    ///
    /// Returns the new value, or `None` when the star is hidden for this entity.
    ///
    /// # Errors
    ///
    /// `Error::ReadOnlyRevision` while a revision is shown, `Error::Db` if the
    /// flag cannot be written.
    pub async fn toggle_ground_truth(&self) -> Result<Option<bool>> {
        if self.history_selected() {
            return Err(Error::ReadOnlyRevision);
        }
        let mut annotation = self.selected().ok_or(Error::NoSelection)?;
        let Some(value) = ground_truth::toggle(&mut annotation) else {
            return Ok(None);
        };
        db::set_ground_truth(&self.conn, &annotation.id, value).await?;
        self.write_back(&annotation.id, |a| a.ground_truth = value);
        Ok(Some(value))
    }

    /// Revisions of the selected annotation, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Db` if the query fails.
    pub async fn revisions(&self) -> Result<Vec<Revision>> {
        let id = self.selected().ok_or(Error::NoSelection)?.id;
        db::load_revisions(&self.conn, &id).await
    }

    fn write_back(&self, id: &str, f: impl FnOnce(&mut Annotation)) {
        let mut task = self.task();
        if let Some(a) = task.annotations.iter_mut().find(|a| a.id == id) {
            f(a);
        }
    }

    fn annotation(&self, id: &str) -> Result<Annotation> {
        self.task()
            .annotations
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::UnknownAnnotation(id.to_owned()))
    }

    fn selected_id(&self) -> Result<String> {
        Ok(self.selected().ok_or(Error::NoSelection)?.id)
    }

    /// A dispatcher bound to `annotation_id`. Its actions land on that
    /// annotation even if the selection moves while they are in flight.
    pub fn pin(&self, annotation_id: impl Into<String>) -> Pinned<'_> {
        Pinned {
            store: self,
            annotation_id: annotation_id.into(),
        }
    }

    /// [`ReviewStore::pin`] on the current selection.
    pub fn pin_selected(&self) -> Option<Pinned<'_>> {
        self.selected().map(|a| self.pin(a.id))
    }

    /// Clones annotation `id`, applies `change`, persists it, then writes it back.
    async fn transition(
        &self,
        id: &str,
        action: RevisionAction,
        reason: Option<String>,
        change: impl FnOnce(&mut Annotation) -> bool,
    ) -> Result<()> {
        let mut annotation = self.annotation(id)?;
        let write_results = change(&mut annotation);
        db::record_transition(&self.conn, &annotation, action, reason, write_results).await?;
        tracing::info!(annotation = %annotation.id, action = action.as_str(), "transition recorded");

        self.write_back(id, move |a| *a = annotation);
        Ok(())
    }

    /// Runs a submit/update transition with the submitting flag raised.
    async fn saving(&self, id: &str, action: RevisionAction) -> Result<()> {
        let Some(_submitting) = self.submitting.try_acquire() else {
            tracing::warn!(action = action.as_str(), "save already underway, ignored");
            return Ok(());
        };
        self.transition(id, action, None, |a| {
            a.sent_user_generate = a.user_generate;
            a.state = AnnotationState::Submitted;
            a.versions = Versions {
                result: Some(a.results.clone()),
            };
            a.history.clear();
            true
        })
        .await
    }

    async fn accept(&self, id: &str) -> Result<()> {
        self.transition(id, RevisionAction::Accepted, None, |a| {
            a.state = AnnotationState::Accepted;
            // Accepting after edits keeps the reviewer's fixes.
            let fixed = a.history.can_undo();
            if fixed {
                a.versions.result = Some(a.results.clone());
            }
            a.history.clear();
            fixed
        })
        .await
    }

    async fn reject(&self, id: &str, payload: TaskPayload) -> Result<()> {
        self.transition(id, RevisionAction::Rejected, payload.reason, |a| {
            a.state = AnnotationState::Rejected;
            false
        })
        .await
    }

    async fn set_skipped(&self, id: &str, skipped: bool, reason: Option<String>) -> Result<()> {
        let action = if skipped {
            RevisionAction::Skipped
        } else {
            RevisionAction::Unskipped
        };
        self.transition(id, action, reason, |a| {
            a.skipped = skipped;
            false
        })
        .await
    }
}

/// Acts on the annotation selected when each call starts.
impl ActionDispatcher for ReviewStore {
    fn is_submitting(&self) -> bool {
        self.submitting.is_set()
    }

    async fn accept_annotation(&self) -> Result<()> {
        self.accept(&self.selected_id()?).await
    }

    async fn reject_annotation(&self, payload: TaskPayload) -> Result<()> {
        self.reject(&self.selected_id()?, payload).await
    }

    async fn skip_task(&self, payload: TaskPayload) -> Result<()> {
        self.set_skipped(&self.selected_id()?, true, payload.reason).await
    }

    async fn unskip_task(&self) -> Result<()> {
        self.set_skipped(&self.selected_id()?, false, None).await
    }

    async fn submit_annotation(&self) -> Result<()> {
        self.saving(&self.selected_id()?, RevisionAction::Submitted).await
    }

    async fn update_annotation(&self) -> Result<()> {
        self.saving(&self.selected_id()?, RevisionAction::Updated).await
    }
}

/// A [`ReviewStore`] dispatcher fixed to one annotation.
pub struct Pinned<'a> {
    store: &'a ReviewStore,
    annotation_id: String,
}

impl Pinned<'_> {
    pub fn annotation_id(&self) -> &str {
        &self.annotation_id
    }
}

impl ActionDispatcher for Pinned<'_> {
    fn is_submitting(&self) -> bool {
        self.store.is_submitting()
    }

    async fn accept_annotation(&self) -> Result<()> {
        self.store.accept(&self.annotation_id).await
    }

    async fn reject_annotation(&self, payload: TaskPayload) -> Result<()> {
        self.store.reject(&self.annotation_id, payload).await
    }

    async fn skip_task(&self, payload: TaskPayload) -> Result<()> {
        self.store.set_skipped(&self.annotation_id, true, payload.reason).await
    }

    async fn unskip_task(&self) -> Result<()> {
        self.store.set_skipped(&self.annotation_id, false, None).await
    }

    async fn submit_annotation(&self) -> Result<()> {
        self.store.saving(&self.annotation_id, RevisionAction::Submitted).await
    }

    async fn update_annotation(&self) -> Result<()> {
        self.store.saving(&self.annotation_id, RevisionAction::Updated).await
    }
}
