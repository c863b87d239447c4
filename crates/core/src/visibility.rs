//! Section visibility rules and clearing groups.
//!
//! The mapping from ownership type to visible sections is a static table,
//! immutable for the process lifetime. Nothing but the current ownership
//! type influences visibility.

use std::collections::BTreeMap;

use crate::types::{
    FieldGroup, FieldId, OwnershipType, SectionId, ALL_FIELDS, ALL_FIELD_GROUPS, ALL_SECTIONS,
};

/// Map from section to its visibility under the current ownership type.
pub type VisibilityMap = BTreeMap<SectionId, bool>;

// ---------------------------------------------------------------------------
// Static rule table
// ---------------------------------------------------------------------------

/// Ownership types under which a section is shown.
pub fn allowed_types(section: SectionId) -> &'static [OwnershipType] {
    match section {
        SectionId::OwnedDetails => &[OwnershipType::Owned, OwnershipType::OwnedAndLeased],
        SectionId::LeasedDetails => &[OwnershipType::Leased, OwnershipType::OwnedAndLeased],
        SectionId::ManagementCompany => &[OwnershipType::Leased],
        SectionId::OwnerContact => &[OwnershipType::Leased],
        SectionId::FileAttachments => &[
            OwnershipType::Owned,
            OwnershipType::Leased,
            OwnershipType::OwnedAndLeased,
        ],
    }
}

/// Whether a clearing group's fields are allowed under `ty`.
pub fn group_allowed(group: FieldGroup, ty: OwnershipType) -> bool {
    match group {
        FieldGroup::Owned => ty.implies_owned(),
        FieldGroup::Leased => ty.implies_leased(),
        FieldGroup::Management | FieldGroup::Owner => ty == OwnershipType::Leased,
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Whether a single section is visible under `ty`.
pub fn is_visible(section: SectionId, ty: OwnershipType) -> bool {
    allowed_types(section).contains(&ty)
}

/// The full section-visibility map for `ty`. Total: every section has an
/// entry.
pub fn visibility_for(ty: OwnershipType) -> VisibilityMap {
    ALL_SECTIONS
        .iter()
        .map(|section| (*section, is_visible(*section, ty)))
        .collect()
}

/// Fields that must be cleared when transitioning to `ty`: the union of
/// every clearing group not allowed under the new type, in form order.
pub fn fields_to_clear(ty: OwnershipType) -> Vec<FieldId> {
    let disallowed: Vec<FieldGroup> = ALL_FIELD_GROUPS
        .iter()
        .copied()
        .filter(|group| !group_allowed(*group, ty))
        .collect();
    ALL_FIELDS
        .iter()
        .copied()
        .filter(|field| field.group().is_some_and(|g| disallowed.contains(&g)))
        .collect()
}

/// Fields rendered in `section`, in form order.
pub fn fields_in(section: SectionId) -> Vec<FieldId> {
    ALL_FIELDS
        .iter()
        .copied()
        .filter(|field| field.section() == section)
        .collect()
}

/// Fields belonging to `group`, in form order.
pub fn group_fields(group: FieldGroup) -> Vec<FieldId> {
    ALL_FIELDS
        .iter()
        .copied()
        .filter(|field| field.group() == Some(group))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
