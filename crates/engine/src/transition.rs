//! Side-effecting half of the visibility engine.
//!
//! A transition re-applies the full visibility state for the new
//! ownership type rather than diffing against the old one, so repeated
//! or cyclic transitions always converge on the same store state.

use landform_core::types::{FieldValue, OwnershipType, ALL_SECTIONS};
use landform_core::visibility::{fields_in, fields_to_clear, visibility_for, VisibilityMap};
use landform_core::FieldId;

use crate::error::StoreError;
use crate::store::FieldStore;

/// What one transition did to the store.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub visibility: VisibilityMap,
    pub cleared: Vec<FieldId>,
    /// Per-field store failures; the transition continues past them.
    pub failures: Vec<(FieldId, StoreError)>,
}

/// Apply the visibility state for `ty` to the store: enable/disable every
/// field by section, drop invalid markers in hidden sections, and clear
/// every field of the disallowed groups.
pub fn apply_transition<S: FieldStore>(ty: OwnershipType, store: &mut S) -> TransitionOutcome {
    let visibility = visibility_for(ty);
    let mut failures = Vec::new();

    for section in ALL_SECTIONS {
        let visible = visibility[&section];
        for field in fields_in(section) {
            if let Err(error) = store.set_enabled(field, visible) {
                failures.push((field, error));
            }
            if !visible {
                if let Err(error) = store.set_invalid(field, false, None) {
                    failures.push((field, error));
                }
            }
        }
    }

    let cleared = fields_to_clear(ty);
    for field in &cleared {
        if let Err(error) = store.set(*field, FieldValue::Empty) {
            failures.push((*field, error));
        }
    }

    tracing::debug!(
        ownership_type = ty.as_str(),
        cleared = cleared.len(),
        failures = failures.len(),
        "Applied visibility transition"
    );

    TransitionOutcome {
        visibility,
        cleared,
        failures,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
