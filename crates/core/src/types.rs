//! Ownership type, section, and field identifiers for the asset form.
//!
//! These are the closed vocabularies everything else keys on: which
//! sections exist, which fields they contain, and which clearing group a
//! field belongs to. The ownership type is the single discriminator the
//! whole engine pivots on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FormError;

// ---------------------------------------------------------------------------
// OwnershipType
// ---------------------------------------------------------------------------

/// How the asset's land is held. Selected once per form session by the
/// user; every visibility rule, conditional validation rule, and derived
/// calculation keys on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipType {
    Owned,
    Leased,
    OwnedAndLeased,
}

/// All ownership types, in display order.
pub const ALL_OWNERSHIP_TYPES: [OwnershipType; 3] = [
    OwnershipType::Owned,
    OwnershipType::Leased,
    OwnershipType::OwnedAndLeased,
];

impl OwnershipType {
    /// Parse a form-submitted discriminator string.
    pub fn from_str_form(s: &str) -> Result<Self, FormError> {
        match s {
            "owned" => Ok(Self::Owned),
            "leased" => Ok(Self::Leased),
            "owned_and_leased" => Ok(Self::OwnedAndLeased),
            _ => Err(FormError::State(format!(
                "Invalid ownership type '{s}'. Must be one of: owned, leased, owned_and_leased"
            ))),
        }
    }

    /// String representation used in payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::Leased => "leased",
            Self::OwnedAndLeased => "owned_and_leased",
        }
    }

    /// Human-readable label for display in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Owned => "Owned",
            Self::Leased => "Leased",
            Self::OwnedAndLeased => "Owned and leased",
        }
    }

    /// Whether this type includes an owned-land component.
    pub fn implies_owned(&self) -> bool {
        matches!(self, Self::Owned | Self::OwnedAndLeased)
    }

    /// Whether this type includes a leased-land component.
    pub fn implies_leased(&self) -> bool {
        matches!(self, Self::Leased | Self::OwnedAndLeased)
    }
}

// ---------------------------------------------------------------------------
// SectionId
// ---------------------------------------------------------------------------

/// A named, independently show/hide-able group of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    OwnedDetails,
    LeasedDetails,
    ManagementCompany,
    OwnerContact,
    FileAttachments,
}

/// All sections, in form order.
pub const ALL_SECTIONS: [SectionId; 5] = [
    SectionId::OwnedDetails,
    SectionId::LeasedDetails,
    SectionId::ManagementCompany,
    SectionId::OwnerContact,
    SectionId::FileAttachments,
];

impl SectionId {
    /// String representation used in payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnedDetails => "owned_details",
            Self::LeasedDetails => "leased_details",
            Self::ManagementCompany => "management_company",
            Self::OwnerContact => "owner_contact",
            Self::FileAttachments => "file_attachments",
        }
    }
}

// ---------------------------------------------------------------------------
// FieldGroup
// ---------------------------------------------------------------------------

/// A category of fields cleared together when its governing section is
/// hidden. A field belongs to at most one group; fields outside every
/// group are never cleared by a visibility transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Owned,
    Leased,
    Management,
    Owner,
}

/// All clearing groups.
pub const ALL_FIELD_GROUPS: [FieldGroup; 4] = [
    FieldGroup::Owned,
    FieldGroup::Leased,
    FieldGroup::Management,
    FieldGroup::Owner,
];

// ---------------------------------------------------------------------------
// FieldId
// ---------------------------------------------------------------------------

/// Identifier for one concrete form field.
///
/// `unit_price` and `contract_period` are derived display fields: the
/// engine writes them and never validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    // Owned details
    PurchasePrice,
    SiteAreaTsubo,
    SiteAreaSqm,
    LandRegistryNumber,
    UnitPrice,
    // Leased details
    MonthlyRent,
    LeaseDeposit,
    ContractStartDate,
    ContractEndDate,
    ContractPeriod,
    // Management company
    ManagementCompanyName,
    ManagementCompanyPhone,
    ManagementCompanyUrl,
    // Owner contact
    OwnerName,
    OwnerEmail,
    OwnerPhone,
    OwnerPostalCode,
    // File attachments
    AttachmentNote,
}

/// All fields, in form order. Section and group lookups iterate this, so
/// derived orderings are stable.
pub const ALL_FIELDS: [FieldId; 18] = [
    FieldId::PurchasePrice,
    FieldId::SiteAreaTsubo,
    FieldId::SiteAreaSqm,
    FieldId::LandRegistryNumber,
    FieldId::UnitPrice,
    FieldId::MonthlyRent,
    FieldId::LeaseDeposit,
    FieldId::ContractStartDate,
    FieldId::ContractEndDate,
    FieldId::ContractPeriod,
    FieldId::ManagementCompanyName,
    FieldId::ManagementCompanyPhone,
    FieldId::ManagementCompanyUrl,
    FieldId::OwnerName,
    FieldId::OwnerEmail,
    FieldId::OwnerPhone,
    FieldId::OwnerPostalCode,
    FieldId::AttachmentNote,
];

impl FieldId {
    /// String representation used in payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchasePrice => "purchase_price",
            Self::SiteAreaTsubo => "site_area_tsubo",
            Self::SiteAreaSqm => "site_area_sqm",
            Self::LandRegistryNumber => "land_registry_number",
            Self::UnitPrice => "unit_price",
            Self::MonthlyRent => "monthly_rent",
            Self::LeaseDeposit => "lease_deposit",
            Self::ContractStartDate => "contract_start_date",
            Self::ContractEndDate => "contract_end_date",
            Self::ContractPeriod => "contract_period",
            Self::ManagementCompanyName => "management_company_name",
            Self::ManagementCompanyPhone => "management_company_phone",
            Self::ManagementCompanyUrl => "management_company_url",
            Self::OwnerName => "owner_name",
            Self::OwnerEmail => "owner_email",
            Self::OwnerPhone => "owner_phone",
            Self::OwnerPostalCode => "owner_postal_code",
            Self::AttachmentNote => "attachment_note",
        }
    }

    /// Human-readable label used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PurchasePrice => "Purchase price",
            Self::SiteAreaTsubo => "Site area (tsubo)",
            Self::SiteAreaSqm => "Site area (sqm)",
            Self::LandRegistryNumber => "Land registry number",
            Self::UnitPrice => "Unit price",
            Self::MonthlyRent => "Monthly rent",
            Self::LeaseDeposit => "Lease deposit",
            Self::ContractStartDate => "Contract start date",
            Self::ContractEndDate => "Contract end date",
            Self::ContractPeriod => "Contract period",
            Self::ManagementCompanyName => "Management company name",
            Self::ManagementCompanyPhone => "Management company phone",
            Self::ManagementCompanyUrl => "Management company URL",
            Self::OwnerName => "Owner name",
            Self::OwnerEmail => "Owner email",
            Self::OwnerPhone => "Owner phone",
            Self::OwnerPostalCode => "Owner postal code",
            Self::AttachmentNote => "Attachment note",
        }
    }

    /// The section this field is rendered in.
    pub fn section(&self) -> SectionId {
        match self {
            Self::PurchasePrice
            | Self::SiteAreaTsubo
            | Self::SiteAreaSqm
            | Self::LandRegistryNumber
            | Self::UnitPrice => SectionId::OwnedDetails,
            Self::MonthlyRent
            | Self::LeaseDeposit
            | Self::ContractStartDate
            | Self::ContractEndDate
            | Self::ContractPeriod => SectionId::LeasedDetails,
            Self::ManagementCompanyName
            | Self::ManagementCompanyPhone
            | Self::ManagementCompanyUrl => SectionId::ManagementCompany,
            Self::OwnerName | Self::OwnerEmail | Self::OwnerPhone | Self::OwnerPostalCode => {
                SectionId::OwnerContact
            }
            Self::AttachmentNote => SectionId::FileAttachments,
        }
    }

    /// The clearing group this field belongs to, if any.
    ///
    /// Attachment fields belong to no group and survive every transition.
    pub fn group(&self) -> Option<FieldGroup> {
        match self.section() {
            SectionId::OwnedDetails => Some(FieldGroup::Owned),
            SectionId::LeasedDetails => Some(FieldGroup::Leased),
            SectionId::ManagementCompany => Some(FieldGroup::Management),
            SectionId::OwnerContact => Some(FieldGroup::Owner),
            SectionId::FileAttachments => None,
        }
    }

    /// Whether the engine computes this field instead of the user.
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::UnitPrice | Self::ContractPeriod)
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A field's current value as held by the field store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl FieldValue {
    /// Whether the value counts as "not filled in" for validation.
    ///
    /// Whitespace-only text is empty; a number or date is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Date(_) => false,
        }
    }

    /// The date carried by this value, if it is one.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The raw text carried by this value, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Empty
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_type_from_str_valid() {
        assert_eq!(
            OwnershipType::from_str_form("owned").unwrap(),
            OwnershipType::Owned
        );
        assert_eq!(
            OwnershipType::from_str_form("leased").unwrap(),
            OwnershipType::Leased
        );
        assert_eq!(
            OwnershipType::from_str_form("owned_and_leased").unwrap(),
            OwnershipType::OwnedAndLeased
        );
    }

    #[test]
    fn ownership_type_from_str_invalid() {
        assert!(OwnershipType::from_str_form("rented").is_err());
        assert!(OwnershipType::from_str_form("").is_err());
    }

    #[test]
    fn ownership_type_as_str_roundtrip() {
        for ty in ALL_OWNERSHIP_TYPES {
            assert_eq!(OwnershipType::from_str_form(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn ownership_type_components() {
        assert!(OwnershipType::Owned.implies_owned());
        assert!(!OwnershipType::Owned.implies_leased());
        assert!(!OwnershipType::Leased.implies_owned());
        assert!(OwnershipType::Leased.implies_leased());
        assert!(OwnershipType::OwnedAndLeased.implies_owned());
        assert!(OwnershipType::OwnedAndLeased.implies_leased());
    }

    #[test]
    fn every_field_has_a_section() {
        for field in ALL_FIELDS {
            // Total match; this is a smoke test that the roster stays wired.
            let _ = field.section();
        }
    }

    #[test]
    fn field_group_follows_section() {
        assert_eq!(FieldId::PurchasePrice.group(), Some(FieldGroup::Owned));
        assert_eq!(FieldId::MonthlyRent.group(), Some(FieldGroup::Leased));
        assert_eq!(
            FieldId::ManagementCompanyName.group(),
            Some(FieldGroup::Management)
        );
        assert_eq!(FieldId::OwnerEmail.group(), Some(FieldGroup::Owner));
        assert_eq!(FieldId::AttachmentNote.group(), None);
    }

    #[test]
    fn fields_belong_to_at_most_one_group() {
        // Group membership is derived from the section, so the invariant
        // holds by construction; assert it anyway over the full roster.
        for field in ALL_FIELDS {
            let groups: Vec<_> = ALL_FIELD_GROUPS
                .iter()
                .filter(|g| field.group() == Some(**g))
                .collect();
            assert!(groups.len() <= 1, "{:?} is in {} groups", field, groups.len());
        }
    }

    #[test]
    fn derived_fields() {
        assert!(FieldId::UnitPrice.is_derived());
        assert!(FieldId::ContractPeriod.is_derived());
        assert!(!FieldId::PurchasePrice.is_derived());
    }

    #[test]
    fn field_value_emptiness() {
        assert!(FieldValue::Empty.is_empty());
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(FieldValue::Text("   ".to_string()).is_empty());
        assert!(!FieldValue::Text("x".to_string()).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).is_empty());
    }

    #[test]
    fn field_value_accessors() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 31).unwrap();
        assert_eq!(FieldValue::Date(d).as_date(), Some(d));
        assert_eq!(FieldValue::Text("hi".into()).as_date(), None);
        assert_eq!(FieldValue::Text("hi".into()).as_text(), Some("hi"));
        assert_eq!(FieldValue::Number(1.0).as_text(), None);
    }
}
