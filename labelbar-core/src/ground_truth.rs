//! Ground-truth star on the current entity.

use crate::types::Annotation;

/// The star is shown for submitted human annotations only: never for skipped
/// entities, drafts generated by the current user, or predictions.
pub fn is_visible(entity: &Annotation) -> bool {
    !entity.skipped && !entity.user_generate && !entity.is_prediction()
}

/// Flips `ground_truth` on a visible entity and returns the new value.
///
/// Entities the star is hidden for are left untouched and yield `None`.
pub fn toggle(entity: &mut Annotation) -> Option<bool> {
    if !is_visible(entity) {
        return None;
    }
    entity.ground_truth = !entity.ground_truth;
    tracing::debug!(annotation = %entity.id, ground_truth = entity.ground_truth, "ground truth toggled");
    Some(entity.ground_truth)
}

pub fn tooltip(entity: &Annotation) -> &'static str {
    if entity.ground_truth {
        "Unset this result as a ground truth"
    } else {
        "Set this result as a ground truth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    fn submitted() -> Annotation {
        let mut a = Annotation::new("a");
        a.user_generate = false;
        a
    }

    #[test]
    fn hidden_for_skipped_user_generated_and_predictions() {
        let mut skipped = submitted();
        skipped.skipped = true;
        let draft = Annotation::new("d");
        let mut prediction = submitted();
        prediction.kind = EntityKind::Prediction;

        for mut entity in [skipped, draft, prediction] {
            assert!(!is_visible(&entity));
            let before = entity.clone();
            assert_eq!(toggle(&mut entity), None);
            assert_eq!(entity.ground_truth, before.ground_truth);
        }
    }

    #[test]
    fn toggle_flips_only_ground_truth() {
        let mut entity = submitted();
        let before = entity.clone();
        assert_eq!(toggle(&mut entity), Some(true));
        assert_eq!(tooltip(&entity), "Unset this result as a ground truth");
        assert_eq!(entity.skipped, before.skipped);
        assert_eq!(entity.editable, before.editable);
        assert_eq!(entity.results, before.results);
        assert_eq!(toggle(&mut entity), Some(false));
    }
}
