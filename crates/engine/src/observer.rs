//! Typed observer interface for engine events.
//!
//! One trait method per event, so payload shapes are checked at compile
//! time. All methods default to no-ops; observers implement what they
//! care about.

use landform_core::validation::FieldMessage;
use landform_core::visibility::VisibilityMap;
use landform_core::{FieldId, OwnershipType};

/// Receives engine notifications in emission order.
///
/// `transitioning` fires before any field-store mutation of a visibility
/// transition; `transitioned` fires after all of them.
pub trait FormObserver {
    fn transitioning(&mut self, _old: Option<OwnershipType>, _new: OwnershipType) {}

    fn transitioned(&mut self, _ty: OwnershipType, _visibility: &VisibilityMap) {}

    fn field_validated(&mut self, _field: FieldId, _messages: &[FieldMessage]) {}
}
