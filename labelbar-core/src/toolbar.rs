//! The actions section on the left of the bottom bar.

use crate::capability;
use crate::context::ReviewContext;
use crate::ground_truth;
use crate::types::Annotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarItem {
    /// Undo / redo / reset over the entity's edit history.
    EditHistory { can_undo: bool, can_redo: bool },
    /// Shows or hides the task instructions; `active` while they are shown.
    Instructions { active: bool },
    Settings,
    GroundTruth { active: bool },
}

/// UI-owned toggles the toolbar reflects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panels {
    pub showing_description: bool,
    pub showing_settings: bool,
}

impl Panels {
    pub fn toggle_description(&mut self) {
        self.showing_description = !self.showing_description;
    }

    pub fn toggle_settings(&mut self) {
        self.showing_settings = !self.showing_settings;
    }
}

pub fn resolve_toolbar(ctx: &ReviewContext, panels: Panels, entity: &Annotation) -> Vec<ToolbarItem> {
    let caps = &ctx.capabilities;
    let mut items = Vec::with_capacity(4);

    if !entity.is_prediction() && !ctx.viewing_all && caps.has(capability::EDIT_HISTORY) {
        items.push(ToolbarItem::EditHistory {
            can_undo: entity.editable && entity.history.can_undo(),
            can_redo: entity.editable && entity.history.can_redo(),
        });
    }
    if ctx.has_description && caps.has(capability::INSTRUCTION) {
        items.push(ToolbarItem::Instructions {
            active: panels.showing_description,
        });
    }
    items.push(ToolbarItem::Settings);
    if caps.has(capability::GROUND_TRUTH) && ground_truth::is_visible(entity) {
        items.push(ToolbarItem::GroundTruth {
            active: entity.ground_truth,
        });
    }
    items
}
