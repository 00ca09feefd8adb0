//! Comment store over the `comments` table.
//!
//! Holds the draft the user is typing, the "comment added this session" flag
//! and the advisory tooltip message, for whichever annotation is selected.
//! Switching annotations starts a new session.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_rusqlite::Connection;

use crate::db;
use crate::error::Result;
use crate::gate::CommentStore;
use crate::types::Comment;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentState {
    pub current_comment: String,
    pub added_comment_this_session: bool,
    pub tooltip_message: Option<String>,
}

#[derive(Debug, Default)]
struct Session {
    annotation_id: String,
    state: CommentState,
    committed: Vec<Comment>,
}

pub struct SqliteCommentStore {
    conn: Connection,
    session: Mutex<Session>,
}

impl SqliteCommentStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            session: Mutex::new(Session::default()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new session for `annotation_id` and loads its comment thread.
    ///
    /// # Errors
    ///
    /// Returns `Error::Db` if the thread cannot be loaded; the session is still
    /// switched, with an empty thread.
    pub async fn open_session(&self, annotation_id: &str) -> Result<()> {
        {
            let mut session = self.session();
            *session = Session {
                annotation_id: annotation_id.to_owned(),
                ..Session::default()
            };
        }
        let thread = db::load_comments(&self.conn, annotation_id).await?;
        let mut session = self.session();
        if session.annotation_id == annotation_id {
            session.committed = thread;
        }
        Ok(())
    }

    pub fn state(&self) -> CommentState {
        self.session().state.clone()
    }

    /// Committed comments of the current annotation, oldest first.
    pub fn thread(&self) -> Vec<Comment> {
        self.session().committed.clone()
    }

    pub fn push_char(&self, c: char) {
        let mut session = self.session();
        session.state.current_comment.push(c);
        session.state.tooltip_message = None;
    }

    pub fn pop_char(&self) {
        self.session().state.current_comment.pop();
    }

    pub fn set_current_comment(&self, text: &str) {
        text.clone_into(&mut self.session().state.current_comment);
    }

    pub fn clear_tooltip(&self) {
        self.session().state.tooltip_message = None;
    }
}

impl CommentStore for SqliteCommentStore {
    fn current_comment(&self) -> String {
        self.session().state.current_comment.clone()
    }

    fn added_comment_this_session(&self) -> bool {
        self.session().state.added_comment_this_session
    }

    async fn comment_form_submit(&self) -> Result<()> {
        // The draft leaves the session before the await, so a concurrent commit
        // finds it empty and text typed meanwhile starts a new draft.
        let (annotation_id, draft) = {
            let mut session = self.session();
            if session.state.current_comment.trim().is_empty() {
                return Ok(());
            }
            (
                session.annotation_id.clone(),
                std::mem::take(&mut session.state.current_comment),
            )
        };

        let comment = match db::insert_comment(&self.conn, &annotation_id, draft.trim()).await {
            Ok(comment) => comment,
            Err(e) => {
                let mut session = self.session();
                if session.annotation_id == annotation_id {
                    let typed = std::mem::replace(&mut session.state.current_comment, draft);
                    session.state.current_comment.push_str(&typed);
                }
                return Err(e);
            }
        };
        tracing::info!(annotation = %annotation_id, comment = %comment.id, "comment committed");

        let mut session = self.session();
        if session.annotation_id == annotation_id {
            session.state.added_comment_this_session = true;
            session.state.tooltip_message = None;
            session.committed.push(comment);
        }
        Ok(())
    }

    fn set_tooltip_message(&self, text: &str) {
        self.session().state.tooltip_message = Some(text.to_owned());
    }
}
