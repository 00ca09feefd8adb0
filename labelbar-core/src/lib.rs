//! labelbar-core: review-bar decision logic and its SQLite-backed host store.
//!
//! The pure parts ([`controls`], [`toolbar`], [`ground_truth`]) take a
//! [`context::ReviewContext`] snapshot and return what the bar should show.
//! [`gate`] runs state-changing actions behind the comment precondition and
//! the in-flight latch. [`store`] and [`comments`] implement the
//! [`dispatch::ActionDispatcher`] and [`gate::CommentStore`] seams over the
//! WAL-mode database opened by [`db::open_db`].

pub mod capability;
pub mod comments;
pub mod context;
pub mod controls;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod ground_truth;
pub mod schema;
pub mod store;
pub mod toolbar;
pub mod types;

pub use error::{Error, Result};
