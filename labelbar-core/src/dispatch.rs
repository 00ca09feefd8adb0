//! The host store operations behind the bottom-bar controls.

use std::future::Future;

use crate::controls::ActionId;
use crate::error::Result;

/// Free-form data recorded alongside a reject or skip.
///
/// The bottom bar always sends the default (no reason); the committed comment
/// carries the reviewer's explanation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPayload {
    pub reason: Option<String>,
}

/// State-changing operations of the annotation store.
///
/// Each method acts on the currently selected annotation of the current task.
pub trait ActionDispatcher: Send + Sync {
    /// True while a submit or update write is underway.
    fn is_submitting(&self) -> bool;

    fn accept_annotation(&self) -> impl Future<Output = Result<()>> + Send;
    fn reject_annotation(&self, payload: TaskPayload) -> impl Future<Output = Result<()>> + Send;
    fn skip_task(&self, payload: TaskPayload) -> impl Future<Output = Result<()>> + Send;
    fn unskip_task(&self) -> impl Future<Output = Result<()>> + Send;
    fn submit_annotation(&self) -> impl Future<Output = Result<()>> + Send;
    fn update_annotation(&self) -> impl Future<Output = Result<()>> + Send;
}

impl ActionId {
    /// Calls the dispatcher operation this control stands for.
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's error.
    pub async fn invoke<D: ActionDispatcher>(self, dispatcher: &D) -> Result<()> {
        tracing::debug!(action = ?self, "dispatching");
        match self {
            ActionId::Reject => dispatcher.reject_annotation(TaskPayload::default()).await,
            ActionId::Accept => dispatcher.accept_annotation().await,
            ActionId::CancelSkip => dispatcher.unskip_task().await,
            ActionId::Skip => dispatcher.skip_task(TaskPayload::default()).await,
            ActionId::Submit => dispatcher.submit_annotation().await,
            ActionId::Update => dispatcher.update_annotation().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
    }

    impl Recorder {
        fn record(&self, name: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(name);
            Ok(())
        }
    }

    impl ActionDispatcher for Recorder {
        fn is_submitting(&self) -> bool {
            false
        }
        async fn accept_annotation(&self) -> Result<()> {
            self.record("accept")
        }
        async fn reject_annotation(&self, payload: TaskPayload) -> Result<()> {
            assert_eq!(payload, TaskPayload::default());
            self.record("reject")
        }
        async fn skip_task(&self, payload: TaskPayload) -> Result<()> {
            assert_eq!(payload, TaskPayload::default());
            self.record("skip")
        }
        async fn unskip_task(&self) -> Result<()> {
            self.record("unskip")
        }
        async fn submit_annotation(&self) -> Result<()> {
            self.record("submit")
        }
        async fn update_annotation(&self) -> Result<()> {
            self.record("update")
        }
    }

    #[tokio::test]
    async fn each_action_calls_exactly_one_operation() {
        let recorder = Recorder::default();
        for id in [
            ActionId::Reject,
            ActionId::Accept,
            ActionId::CancelSkip,
            ActionId::Skip,
            ActionId::Submit,
            ActionId::Update,
        ] {
            id.invoke(&recorder).await.unwrap();
        }
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["reject", "accept", "unskip", "skip", "submit", "update"]
        );
    }
}
