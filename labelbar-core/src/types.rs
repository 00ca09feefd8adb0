use serde::Deserialize;

use crate::error::Error;

/// Whether an entity was produced by a human annotator or by a model.
///
/// Predictions are read-only references; they can never be marked as ground truth.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Annotation,
    Prediction,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Annotation => "annotation",
            EntityKind::Prediction => "prediction",
        }
    }

    /// Parses the TEXT column value. Unknown values are treated as annotations.
    pub fn parse(value: &str) -> Self {
        match value {
            "prediction" => EntityKind::Prediction,
            _ => EntityKind::Annotation,
        }
    }
}

/// Review outcome recorded on an annotation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationState {
    #[default]
    Pending,
    Submitted,
    Accepted,
    Rejected,
}

impl AnnotationState {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationState::Pending => "pending",
            AnnotationState::Submitted => "submitted",
            AnnotationState::Accepted => "accepted",
            AnnotationState::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "submitted" => AnnotationState::Submitted,
            "accepted" => AnnotationState::Accepted,
            "rejected" => AnnotationState::Rejected,
            _ => AnnotationState::Pending,
        }
    }
}

/// One labelled result item inside an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String, // UUID v4 text
    pub label: String,
}

impl Region {
    /// Creates a region with a fresh id. Line breaks in `label` are folded into
    /// spaces so labels stay single-line in revisions and in the entity panel.
    pub fn new(label: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.replace(['\r', '\n'], " ").trim().to_owned(),
        }
    }
}

/// Persisted versions of an annotation's result.
///
/// `result` is `Some` once the result has been written by a submit or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions {
    pub result: Option<Vec<Region>>,
}

/// In-memory undo/redo stack over an annotation's results.
///
/// Each entry is the full result list as it was *before* an edit. The stack is
/// session-only and is never persisted.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<Vec<Region>>,
    redo: Vec<Vec<Region>>,
}

impl History {
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Records `before` as an undo point and drops the redo branch.
    pub fn record(&mut self, before: &[Region]) {
        self.undo.push(before.to_vec());
        self.redo.clear();
    }

    /// Restores the previous result snapshot into `current`.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, current: &mut Vec<Region>) -> bool {
        match self.undo.pop() {
            Some(previous) => {
                self.redo.push(std::mem::replace(current, previous));
                true
            }
            None => false,
        }
    }

    /// Re-applies the most recently undone snapshot into `current`.
    pub fn redo(&mut self, current: &mut Vec<Region>) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push(std::mem::replace(current, next));
                true
            }
            None => false,
        }
    }

    /// Rolls `current` back to the oldest recorded snapshot and clears both stacks.
    pub fn reset(&mut self, current: &mut Vec<Region>) -> bool {
        if self.undo.is_empty() {
            return false;
        }
        *current = self.undo.swap_remove(0);
        self.undo.clear();
        self.redo.clear();
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// One annotation (or prediction) of a task, as held by the annotation store.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: String,
    pub kind: EntityKind,
    pub editable: bool,
    pub skipped: bool,
    pub user_generate: bool,
    pub sent_user_generate: bool,
    pub ground_truth: bool,
    pub state: AnnotationState,
    pub versions: Versions,
    pub results: Vec<Region>,
    pub history: History,
}

impl Annotation {
    /// A fresh, editable, user-generated annotation with no results.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: EntityKind::Annotation,
            editable: true,
            skipped: false,
            user_generate: true,
            sent_user_generate: false,
            ground_truth: false,
            state: AnnotationState::Pending,
            versions: Versions::default(),
            results: Vec::new(),
            history: History::default(),
        }
    }

    pub fn is_prediction(&self) -> bool {
        self.kind == EntityKind::Prediction
    }

    fn ensure_editable(&self) -> Result<(), Error> {
        if self.editable && !self.is_prediction() {
            Ok(())
        } else {
            Err(Error::NotEditable(self.id.clone()))
        }
    }

    /// Appends a region labelled `label`, recording an undo point.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotEditable` for read-only annotations and predictions.
    pub fn add_region(&mut self, label: &str) -> Result<(), Error> {
        self.ensure_editable()?;
        self.history.record(&self.results);
        self.results.push(Region::new(label));
        Ok(())
    }

    /// Removes the region at `index`. Out-of-range indices are a no-op (`Ok(false)`).
    ///
    /// # Errors
    ///
    /// Returns `Error::NotEditable` for read-only annotations and predictions.
    pub fn remove_region(&mut self, index: usize) -> Result<bool, Error> {
        self.ensure_editable()?;
        if index >= self.results.len() {
            return Ok(false);
        }
        self.history.record(&self.results);
        self.results.remove(index);
        Ok(true)
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.results)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.results)
    }

    pub fn reset_history(&mut self) -> bool {
        self.history.reset(&mut self.results)
    }
}

/// A task being reviewed: its annotations and predictions, with one selected.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub description: Option<String>,
    pub annotations: Vec<Annotation>,
    pub selected: usize,
}

impl Task {
    pub fn selected(&self) -> Option<&Annotation> {
        self.annotations.get(self.selected)
    }

    pub fn selected_mut(&mut self) -> Option<&mut Annotation> {
        self.annotations.get_mut(self.selected)
    }

    /// Moves the selection to the next entity, wrapping around.
    pub fn select_next(&mut self) {
        if !self.annotations.is_empty() {
            self.selected = (self.selected + 1) % self.annotations.len();
        }
    }

    /// Moves the selection to the previous entity, wrapping around.
    pub fn select_prev(&mut self) {
        if !self.annotations.is_empty() {
            self.selected = (self.selected + self.annotations.len() - 1) % self.annotations.len();
        }
    }
}

/// A committed review comment attached to an annotation.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: String,           // UUID v4 text
    pub annotation_id: String,
    pub body: String,
    pub created_at: i64,      // Unix timestamp seconds
}

/// The store operation a revision was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionAction {
    Submitted,
    Updated,
    Accepted,
    Rejected,
    Skipped,
    Unskipped,
}

impl RevisionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RevisionAction::Submitted => "submitted",
            RevisionAction::Updated => "updated",
            RevisionAction::Accepted => "accepted",
            RevisionAction::Rejected => "rejected",
            RevisionAction::Skipped => "skipped",
            RevisionAction::Unskipped => "unskipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "submitted" => RevisionAction::Submitted,
            "updated" => RevisionAction::Updated,
            "accepted" => RevisionAction::Accepted,
            "rejected" => RevisionAction::Rejected,
            "skipped" => RevisionAction::Skipped,
            "unskipped" => RevisionAction::Unskipped,
            _ => return None,
        })
    }
}

/// A read-only historical snapshot of an annotation, written on every transition.
#[derive(Debug, Clone)]
pub struct Revision {
    pub id: String,
    pub annotation_id: String,
    pub action: RevisionAction,
    pub reason: Option<String>,
    pub labels: Vec<String>,
    pub created_at: i64,
}

/// Task file format accepted by `db::import_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSeed {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub annotations: Vec<AnnotationSeed>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationSeed {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default = "default_true")]
    pub user_generate: bool,
    #[serde(default)]
    pub sent_user_generate: bool,
    #[serde(default)]
    pub ground_truth: bool,
    #[serde(default)]
    pub regions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(regions: &[Region]) -> Vec<&str> {
        regions.iter().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn undo_redo_walks_snapshots() {
        let mut a = Annotation::new("a1");
        a.add_region("cat").unwrap();
        a.add_region("dog").unwrap();
        assert!(a.history.can_undo());
        assert!(!a.history.can_redo());

        assert!(a.undo());
        assert_eq!(labels(&a.results), ["cat"]);
        assert!(a.history.can_redo());

        assert!(a.redo());
        assert_eq!(labels(&a.results), ["cat", "dog"]);
    }

    #[test]
    fn new_edit_drops_redo_branch() {
        let mut a = Annotation::new("a1");
        a.add_region("cat").unwrap();
        a.undo();
        a.add_region("bird").unwrap();
        assert!(!a.history.can_redo());
        assert_eq!(labels(&a.results), ["bird"]);
    }

    #[test]
    fn reset_restores_oldest_snapshot() {
        let mut a = Annotation::new("a1");
        a.add_region("cat").unwrap();
        a.add_region("dog").unwrap();
        a.remove_region(0).unwrap();
        assert!(a.reset_history());
        assert!(a.results.is_empty());
        assert!(!a.history.can_undo());
        assert!(!a.reset_history());
    }

    #[test]
    fn predictions_reject_edits() {
        let mut a = Annotation::new("p1");
        a.kind = EntityKind::Prediction;
        assert!(matches!(a.add_region("x"), Err(Error::NotEditable(_))));
        assert!(a.results.is_empty());
    }

    #[test]
    fn region_labels_are_single_line() {
        assert_eq!(Region::new(" a\nb ").label, "a b");
    }

    #[test]
    fn selection_wraps() {
        let mut task = Task {
            id: "t".into(),
            description: None,
            annotations: vec![Annotation::new("a"), Annotation::new("b")],
            selected: 0,
        };
        task.select_prev();
        assert_eq!(task.selected().map(|a| a.id.as_str()), Some("b"));
        task.select_next();
        assert_eq!(task.selected().map(|a| a.id.as_str()), Some("a"));
    }
}
