//! Action Visibility Resolver for the bottom-bar controls.
//!
//! [`resolve`] is a pure function of a [`ReviewContext`] snapshot and the
//! selected [`Annotation`]: it returns the ordered controls the bar shows and
//! whether each one can be pressed. Nothing here performs the action; see
//! [`crate::gate`] and [`crate::dispatch`].

use crate::capability::{self, Capabilities};
use crate::context::ReviewContext;
use crate::gate::GatePolicy;
use crate::types::Annotation;

pub const REJECT_COMMENT_REQUIRED: &str = "Please enter a comment before rejecting";
pub const SKIP_COMMENT_REQUIRED: &str = "Please enter a comment before skipping";
pub const EMPTY_DENIED: &str = "Empty annotations denied in this project";

/// Identifies a pressable control and the store operation behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    Reject,
    Accept,
    CancelSkip,
    Skip,
    Submit,
    Update,
}

impl ActionId {
    /// How the comment gate treats this action under `caps`.
    ///
    /// Reject and Skip require a comment unless the deployment turns the
    /// matching `comments:*` capability off explicitly.
    pub fn gate_policy(self, caps: &Capabilities) -> GatePolicy {
        match self {
            ActionId::Reject if caps.flag_or(capability::COMMENTS_REJECT, true) => {
                GatePolicy::RequireComment {
                    message: REJECT_COMMENT_REQUIRED,
                }
            }
            ActionId::Skip if caps.flag_or(capability::COMMENTS_SKIP, true) => {
                GatePolicy::RequireComment {
                    message: SKIP_COMMENT_REQUIRED,
                }
            }
            _ => GatePolicy::CommitFirst,
        }
    }

    /// Accessible name, stable across label changes.
    pub fn aria_label(self) -> &'static str {
        match self {
            ActionId::Reject => "reject-annotation",
            ActionId::Accept => "accept-annotation",
            ActionId::CancelSkip => "cancel-skip",
            ActionId::Skip => "skip-task",
            ActionId::Submit | ActionId::Update => "submit",
        }
    }
}

/// Visual emphasis of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Look {
    Default,
    Primary,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub id: ActionId,
    pub label: &'static str,
    pub tooltip: &'static str,
    pub enabled: bool,
    pub look: Look,
}

/// One entry of the controls section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Non-interactive "was skipped" marker.
    SkippedNotice,
    Button(ActionSpec),
}

impl Control {
    pub fn as_button(&self) -> Option<&ActionSpec> {
        match self {
            Control::Button(spec) => Some(spec),
            Control::SkippedNotice => None,
        }
    }
}

/// Keyboard shortcuts bound to the controls section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    /// Ctrl+Space: reject in review mode, skip otherwise.
    CtrlSpace,
    /// Ctrl+Enter: accept in review mode, submit otherwise.
    CtrlEnter,
    /// Alt+Enter: update.
    AltEnter,
}

/// Computes the ordered controls for `annotation` under `ctx`.
pub fn resolve(ctx: &ReviewContext, annotation: &Annotation) -> Vec<Control> {
    let caps = &ctx.capabilities;
    let disabled = ctx.is_locked(annotation.editable);
    let submit_disabled = caps.has(capability::DENY_EMPTY) && annotation.results.is_empty();
    let mut controls = Vec::with_capacity(3);

    let button = |id: ActionId, label: &'static str, tooltip: &'static str, enabled: bool, look: Look| {
        Control::Button(ActionSpec {
            id,
            label,
            tooltip,
            enabled,
            look,
        })
    };

    if ctx.is_review() {
        controls.push(button(
            ActionId::Reject,
            "Reject",
            "Reject annotation: [ Ctrl+Space ]",
            !disabled,
            Look::Default,
        ));
        let accept_label = if annotation.history.can_undo() {
            "Fix + Accept"
        } else {
            "Accept"
        };
        controls.push(button(
            ActionId::Accept,
            accept_label,
            "Accept annotation: [ Ctrl+Enter ]",
            !disabled,
            Look::Primary,
        ));
    } else if annotation.skipped {
        controls.push(Control::SkippedNotice);
        controls.push(button(
            ActionId::CancelSkip,
            "Cancel skip",
            "Cancel skip",
            !disabled,
            Look::Primary,
        ));
    } else {
        if caps.has(capability::SKIP) {
            controls.push(button(
                ActionId::Skip,
                "Skip",
                "Cancel (skip) task: [ Ctrl+Space ]",
                !disabled,
                Look::Default,
            ));
        }

        let save_enabled = !(disabled || submit_disabled);
        let look = if save_enabled { Look::Primary } else { Look::Disabled };
        let user_generate = annotation.user_generate;
        let sent = annotation.sent_user_generate;

        if (user_generate && !sent) || (ctx.explore && !user_generate && caps.has(capability::SUBMIT)) {
            let tooltip = if submit_disabled {
                EMPTY_DENIED
            } else {
                "Save results: [ Ctrl+Enter ]"
            };
            controls.push(button(ActionId::Submit, "Submit", tooltip, save_enabled, look));
        }

        if (user_generate && sent) || (!user_generate && caps.has(capability::UPDATE)) {
            let is_update = sent || annotation.versions.result.is_some();
            let tooltip = if submit_disabled {
                EMPTY_DENIED
            } else {
                "Update this task: [ Alt+Enter ]"
            };
            let label = if is_update { "Update" } else { "Submit" };
            controls.push(button(ActionId::Update, label, tooltip, save_enabled, look));
        }
    }

    tracing::debug!(
        annotation = %annotation.id,
        disabled,
        submit_disabled,
        count = controls.len(),
        "resolved controls"
    );
    controls
}

/// The enabled button `hotkey` would press among `controls`, if any.
pub fn hotkey_target(controls: &[Control], hotkey: Hotkey) -> Option<ActionId> {
    let wanted: &[ActionId] = match hotkey {
        Hotkey::CtrlSpace => &[ActionId::Reject, ActionId::Skip],
        Hotkey::CtrlEnter => &[ActionId::Accept, ActionId::Submit],
        Hotkey::AltEnter => &[ActionId::Update],
    };
    controls
        .iter()
        .filter_map(Control::as_button)
        .find(|spec| spec.enabled && wanted.contains(&spec.id))
        .map(|spec| spec.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;

    fn ctx(caps: &[&str]) -> ReviewContext {
        ReviewContext {
            capabilities: Capabilities::enabled(caps.iter().copied()),
            ..Default::default()
        }
    }

    fn ids(controls: &[Control]) -> Vec<Option<ActionId>> {
        controls.iter().map(|c| c.as_button().map(|s| s.id)).collect()
    }

    fn spec(controls: &[Control], id: ActionId) -> &ActionSpec {
        controls
            .iter()
            .filter_map(Control::as_button)
            .find(|s| s.id == id)
            .unwrap()
    }

    #[test]
    fn review_mode_shows_reject_then_accept() {
        let a = Annotation::new("a");
        let controls = resolve(&ctx(&["review", "skip", "submit"]), &a);
        assert_eq!(ids(&controls), [Some(ActionId::Reject), Some(ActionId::Accept)]);
        assert_eq!(spec(&controls, ActionId::Accept).label, "Accept");
    }

    #[test]
    fn review_accept_becomes_fix_accept_after_edits() {
        let mut a = Annotation::new("a");
        a.add_region("cat").unwrap();
        let controls = resolve(&ctx(&["review"]), &a);
        assert_eq!(spec(&controls, ActionId::Accept).label, "Fix + Accept");
    }

    #[test]
    fn review_wins_over_skipped() {
        let mut a = Annotation::new("a");
        a.skipped = true;
        let controls = resolve(&ctx(&["review"]), &a);
        assert_eq!(ids(&controls), [Some(ActionId::Reject), Some(ActionId::Accept)]);
    }

    #[test]
    fn skipped_shows_only_notice_and_cancel() {
        let mut a = Annotation::new("a");
        a.skipped = true;
        let controls = resolve(&ctx(&["skip", "submit", "update"]), &a);
        assert_eq!(controls[0], Control::SkippedNotice);
        assert_eq!(ids(&controls), [None, Some(ActionId::CancelSkip)]);
    }

    #[test]
    fn fresh_user_annotation_gets_skip_and_submit() {
        let a = Annotation::new("a");
        let controls = resolve(&ctx(&["skip"]), &a);
        assert_eq!(ids(&controls), [Some(ActionId::Skip), Some(ActionId::Submit)]);
        assert!(spec(&controls, ActionId::Submit).enabled);
        assert_eq!(spec(&controls, ActionId::Submit).look, Look::Primary);
    }

    #[test]
    fn sent_user_annotation_gets_update() {
        let mut a = Annotation::new("a");
        a.sent_user_generate = true;
        let controls = resolve(&ctx(&[]), &a);
        assert_eq!(ids(&controls), [Some(ActionId::Update)]);
        assert_eq!(spec(&controls, ActionId::Update).label, "Update");
    }

    #[test]
    fn foreign_annotation_update_label_follows_saved_version() {
        let mut a = Annotation::new("a");
        a.user_generate = false;
        let controls = resolve(&ctx(&["update"]), &a);
        assert_eq!(spec(&controls, ActionId::Update).label, "Submit");

        a.versions.result = Some(vec![Region::new("cat")]);
        let controls = resolve(&ctx(&["update"]), &a);
        assert_eq!(spec(&controls, ActionId::Update).label, "Update");
    }

    #[test]
    fn explore_mode_submit_needs_capability() {
        let mut a = Annotation::new("a");
        a.user_generate = false;
        let mut c = ctx(&[]);
        c.explore = true;
        assert!(resolve(&c, &a).is_empty());

        c.capabilities.set("submit", true);
        assert_eq!(ids(&resolve(&c, &a)), [Some(ActionId::Submit)]);
    }

    #[test]
    fn deny_empty_disables_save_buttons_with_message() {
        let mut a = Annotation::new("a");
        let controls = resolve(&ctx(&["annotations:deny-empty"]), &a);
        let submit = spec(&controls, ActionId::Submit);
        assert!(!submit.enabled);
        assert_eq!(submit.look, Look::Disabled);
        assert_eq!(submit.tooltip, EMPTY_DENIED);

        a.sent_user_generate = true;
        let controls = resolve(&ctx(&["annotations:deny-empty"]), &a);
        let update = spec(&controls, ActionId::Update);
        assert!(!update.enabled);
        assert_eq!(update.tooltip, EMPTY_DENIED);

        a.add_region("cat").unwrap();
        let controls = resolve(&ctx(&["annotations:deny-empty"]), &a);
        assert!(spec(&controls, ActionId::Update).enabled);
    }

    #[test]
    fn deny_empty_does_not_disable_skip() {
        let a = Annotation::new("a");
        let controls = resolve(&ctx(&["skip", "annotations:deny-empty"]), &a);
        assert!(spec(&controls, ActionId::Skip).enabled);
    }

    #[test]
    fn every_button_disabled_while_locked() {
        let mut a = Annotation::new("a");
        a.add_region("cat").unwrap();
        let cases = [
            ReviewContext { is_submitting: true, ..ctx(&["skip"]) },
            ReviewContext { history_selected: true, ..ctx(&["skip"]) },
            ReviewContext { is_in_progress: true, ..ctx(&["skip"]) },
        ];
        for c in &cases {
            let controls = resolve(c, &a);
            assert!(controls.iter().filter_map(Control::as_button).all(|s| !s.enabled));
        }

        a.editable = false;
        let controls = resolve(&ctx(&["review"]), &a);
        assert!(controls.iter().filter_map(Control::as_button).all(|s| !s.enabled));
    }

    #[test]
    fn hotkeys_pick_enabled_buttons() {
        let a = Annotation::new("a");
        let controls = resolve(&ctx(&["review"]), &a);
        assert_eq!(hotkey_target(&controls, Hotkey::CtrlSpace), Some(ActionId::Reject));
        assert_eq!(hotkey_target(&controls, Hotkey::CtrlEnter), Some(ActionId::Accept));
        assert_eq!(hotkey_target(&controls, Hotkey::AltEnter), None);

        let controls = resolve(&ctx(&["skip", "annotations:deny-empty"]), &a);
        assert_eq!(hotkey_target(&controls, Hotkey::CtrlSpace), Some(ActionId::Skip));
        assert_eq!(hotkey_target(&controls, Hotkey::CtrlEnter), None);
    }

    #[test]
    fn comment_policy_defaults_to_required() {
        let caps = Capabilities::default();
        assert_eq!(
            ActionId::Reject.gate_policy(&caps),
            GatePolicy::RequireComment { message: REJECT_COMMENT_REQUIRED }
        );
        assert_eq!(
            ActionId::Skip.gate_policy(&caps),
            GatePolicy::RequireComment { message: SKIP_COMMENT_REQUIRED }
        );
        assert_eq!(ActionId::Accept.gate_policy(&caps), GatePolicy::CommitFirst);

        let caps = caps.with("comments:reject", false);
        assert_eq!(ActionId::Reject.gate_policy(&caps), GatePolicy::CommitFirst);
    }
}
