//! Comment-Gate: the precondition in front of every state-changing action.
//!
//! The gate owns the [`InFlightLatch`]. A call that finds the latch held
//! returns [`GateOutcome::Busy`] without touching the comment store or running
//! the action; a second press while an action is in flight is dropped, never
//! queued.

use std::future::Future;

use crate::context::InFlightLatch;
use crate::error::Result;

/// The comment subsystem as seen by the gate.
///
/// Implementations keep their own draft state; the gate only reads it and asks
/// for a commit or a tooltip.
pub trait CommentStore: Send + Sync {
    /// The draft comment currently typed by the user (may be empty).
    fn current_comment(&self) -> String;

    /// Whether a comment has already been committed in this session.
    fn added_comment_this_session(&self) -> bool;

    /// Commits the current draft. Committing an empty draft is a no-op.
    fn comment_form_submit(&self) -> impl Future<Output = Result<()>> + Send;

    /// Publishes an advisory message next to the comment box.
    fn set_tooltip_message(&self, text: &str);
}

/// How the gate treats the comment draft before running an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolicy {
    /// A comment must exist (committed this session or drafted) or the action
    /// is blocked and `message` is shown.
    RequireComment { message: &'static str },
    /// Commit whatever draft exists, then run the action.
    CommitFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The action ran.
    Invoked,
    /// A required comment was missing; the message was published instead.
    Blocked,
    /// Another gated action was already in flight.
    Busy,
}

/// Runs actions behind the comment precondition and the in-flight latch.
#[derive(Debug, Clone, Default)]
pub struct CommentGate {
    latch: InFlightLatch,
}

impl CommentGate {
    pub fn new(latch: InFlightLatch) -> Self {
        Self { latch }
    }

    pub fn latch(&self) -> &InFlightLatch {
        &self.latch
    }

    pub fn is_in_progress(&self) -> bool {
        self.latch.is_set()
    }

    /// Commits the draft on its own, under the same latch as gated actions.
    ///
    /// # Errors
    ///
    /// Propagates errors from `comment_form_submit`.
    pub async fn commit<C: CommentStore>(&self, comments: &C) -> Result<GateOutcome> {
        let Some(_guard) = self.latch.try_acquire() else {
            tracing::debug!("gate busy, comment commit dropped");
            return Ok(GateOutcome::Busy);
        };
        comments.comment_form_submit().await?;
        Ok(GateOutcome::Invoked)
    }

    /// Evaluates `policy` against `comments` and runs `action` if allowed.
    ///
    /// The latch is held from entry until this future completes, on the success,
    /// blocked and error paths alike. If the comment commit fails the action is
    /// not run and the error is returned.
    ///
    /// # Errors
    ///
    /// Propagates errors from `comment_form_submit` and from `action`.
    pub async fn run<C, F, Fut>(&self, policy: GatePolicy, comments: &C, action: F) -> Result<GateOutcome>
    where
        C: CommentStore,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let Some(_guard) = self.latch.try_acquire() else {
            tracing::debug!("gate busy, ignoring action");
            return Ok(GateOutcome::Busy);
        };

        match policy {
            GatePolicy::RequireComment { message } => {
                if comments.added_comment_this_session() {
                    action().await?;
                } else if !comments.current_comment().trim().is_empty() {
                    comments.comment_form_submit().await?;
                    action().await?;
                } else {
                    tracing::debug!(message, "comment required, action blocked");
                    comments.set_tooltip_message(message);
                    return Ok(GateOutcome::Blocked);
                }
            }
            GatePolicy::CommitFirst => {
                comments.comment_form_submit().await?;
                action().await?;
            }
        }
        Ok(GateOutcome::Invoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    /// Records every call so tests can check ordering.
    #[derive(Default)]
    struct FakeComments {
        draft: Mutex<String>,
        added: Mutex<bool>,
        fail_commit: bool,
        yield_on_commit: bool,
        log: Mutex<Vec<String>>,
    }

    impl FakeComments {
        fn with_draft(text: &str) -> Self {
            Self { draft: Mutex::new(text.to_owned()), ..Default::default() }
        }

        fn push(&self, entry: impl Into<String>) {
            self.log.lock().unwrap().push(entry.into());
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl CommentStore for FakeComments {
        fn current_comment(&self) -> String {
            self.draft.lock().unwrap().clone()
        }

        fn added_comment_this_session(&self) -> bool {
            *self.added.lock().unwrap()
        }

        async fn comment_form_submit(&self) -> Result<()> {
            if self.yield_on_commit {
                tokio::task::yield_now().await;
            }
            if self.fail_commit {
                return Err(Error::NoSelection);
            }
            self.push("commit");
            let mut draft = self.draft.lock().unwrap();
            if !draft.trim().is_empty() {
                draft.clear();
                *self.added.lock().unwrap() = true;
            }
            Ok(())
        }

        fn set_tooltip_message(&self, text: &str) {
            self.push(format!("tooltip:{text}"));
        }
    }

    const REQUIRED: GatePolicy = GatePolicy::RequireComment { message: "need comment" };

    #[tokio::test]
    async fn draft_is_committed_once_before_action() {
        let comments = FakeComments::with_draft("looks off");
        let gate = CommentGate::default();

        let outcome = gate
            .run(REQUIRED, &comments, || async {
                comments.push("action");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, GateOutcome::Invoked);
        assert_eq!(comments.log(), ["commit", "action"]);
        assert!(!gate.is_in_progress());
    }

    #[tokio::test]
    async fn missing_comment_blocks_and_publishes_message() {
        let comments = FakeComments::with_draft("   ");
        let gate = CommentGate::default();

        let outcome = gate
            .run(REQUIRED, &comments, || async {
                comments.push("action");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, GateOutcome::Blocked);
        assert_eq!(comments.log(), ["tooltip:need comment"]);
        assert!(!gate.is_in_progress());
    }

    #[tokio::test]
    async fn comment_added_this_session_skips_commit() {
        let comments = FakeComments::default();
        *comments.added.lock().unwrap() = true;
        let gate = CommentGate::default();

        gate.run(REQUIRED, &comments, || async {
            comments.push("action");
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(comments.log(), ["action"]);
    }

    #[tokio::test]
    async fn commit_first_runs_without_comment() {
        let comments = FakeComments::default();
        let gate = CommentGate::default();

        let outcome = gate
            .run(GatePolicy::CommitFirst, &comments, || async {
                comments.push("action");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, GateOutcome::Invoked);
        assert_eq!(comments.log(), ["commit", "action"]);
    }

    #[tokio::test]
    async fn reentry_while_in_flight_is_a_noop() {
        let comments = FakeComments {
            yield_on_commit: true,
            ..FakeComments::with_draft("reason")
        };
        let gate = CommentGate::default();

        let first = gate.run(REQUIRED, &comments, || async {
            comments.push("action");
            Ok(())
        });
        let second = gate.run(REQUIRED, &comments, || async {
            comments.push("action");
            Ok(())
        });
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), GateOutcome::Invoked);
        assert_eq!(second.unwrap(), GateOutcome::Busy);
        assert_eq!(comments.log(), ["commit", "action"]);
        assert!(!gate.is_in_progress());
    }

    #[tokio::test]
    async fn failed_commit_skips_action_and_releases_latch() {
        let comments = FakeComments {
            fail_commit: true,
            ..FakeComments::with_draft("reason")
        };
        let gate = CommentGate::default();

        let result = gate
            .run(REQUIRED, &comments, || async {
                comments.push("action");
                Ok(())
            })
            .await;

        assert!(result.is_err());
        assert!(comments.log().is_empty());
        assert!(!gate.is_in_progress());
    }

    #[tokio::test]
    async fn standalone_commit_shares_the_latch() {
        let comments = FakeComments {
            yield_on_commit: true,
            ..FakeComments::with_draft("same text")
        };
        let gate = CommentGate::default();

        let action = gate.run(GatePolicy::CommitFirst, &comments, || async {
            comments.push("action");
            Ok(())
        });
        let (action, commit) = tokio::join!(action, gate.commit(&comments));

        assert_eq!(action.unwrap(), GateOutcome::Invoked);
        assert_eq!(commit.unwrap(), GateOutcome::Busy);
        assert_eq!(comments.log(), ["commit", "action"]);
        assert_eq!(gate.commit(&comments).await.unwrap(), GateOutcome::Invoked);
    }
}
