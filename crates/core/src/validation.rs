//! Conditional validation rules and field checks.
//!
//! The effective rule set is recomputed from the static tables on every
//! call: a fixed base table merged with the conditional table for the
//! active ownership type, conditional entries winning on collision. That
//! keeps re-validation after an ownership change consistent with the new
//! type without any per-session mutable rule state.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{ValidateEmail, ValidateUrl};

use crate::calculation::parse_amount;
use crate::config::EngineConfig;
use crate::types::{FieldId, FieldValue, OwnershipType};
use crate::visibility::VisibilityMap;

/// Hard upper bound on any value's length, checked before every other
/// rule so pathological input never reaches the pattern checks.
pub const MAX_VALUE_LENGTH: usize = 1000;

/// Snapshot of field values a validation pass runs against.
pub type FieldValues = BTreeMap<FieldId, FieldValue>;

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Kind-specific validation, each variant carrying only what its check
/// needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RuleKind {
    Number { min: Option<f64>, max: Option<f64> },
    Currency { min: Option<f64>, max: Option<f64> },
    Email,
    Url,
    Phone,
    PostalCode,
    Text { max_len: Option<usize> },
}

/// One field's validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub required: bool,
    /// Required only when the paired field is also empty. The both-empty
    /// error itself is emitted by the cross-field pass, once.
    pub required_without: Option<FieldId>,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            required: false,
            required_without: None,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn required_without(mut self, pair: FieldId) -> Self {
        self.required_without = Some(pair);
        self
    }
}

/// Effective rules for one validation pass.
pub type ValidationRuleSet = BTreeMap<FieldId, Rule>;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One human-readable validation message, attributable to a field. A
/// cross-field message also names the paired field so both inputs can be
/// marked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub field: FieldId,
    pub paired: Option<FieldId>,
    pub message: String,
}

impl FieldMessage {
    fn new(field: FieldId, message: String) -> Self {
        Self {
            field,
            paired: None,
            message,
        }
    }
}

/// Aggregated outcome of a full-form validation pass. Re-derived on every
/// call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub messages: Vec<FieldMessage>,
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

fn amount() -> RuleKind {
    RuleKind::Currency {
        min: Some(0.0),
        max: None,
    }
}

fn area() -> RuleKind {
    RuleKind::Number {
        min: Some(0.0),
        max: None,
    }
}

fn text(max_len: usize) -> RuleKind {
    RuleKind::Text {
        max_len: Some(max_len),
    }
}

fn date_text() -> RuleKind {
    RuleKind::Text { max_len: None }
}

/// Base rules applying regardless of ownership type. Derived display
/// fields carry no rule.
pub fn base_rules() -> ValidationRuleSet {
    let mut rules = ValidationRuleSet::new();
    rules.insert(FieldId::PurchasePrice, Rule::new(amount()));
    rules.insert(FieldId::SiteAreaTsubo, Rule::new(area()));
    rules.insert(FieldId::SiteAreaSqm, Rule::new(area()));
    rules.insert(FieldId::LandRegistryNumber, Rule::new(text(100)));
    rules.insert(FieldId::MonthlyRent, Rule::new(amount()));
    rules.insert(FieldId::LeaseDeposit, Rule::new(amount()));
    rules.insert(FieldId::ContractStartDate, Rule::new(date_text()));
    rules.insert(FieldId::ContractEndDate, Rule::new(date_text()));
    rules.insert(FieldId::ManagementCompanyName, Rule::new(text(200)));
    rules.insert(FieldId::ManagementCompanyPhone, Rule::new(RuleKind::Phone));
    rules.insert(FieldId::ManagementCompanyUrl, Rule::new(RuleKind::Url));
    rules.insert(FieldId::OwnerName, Rule::new(text(200)));
    rules.insert(FieldId::OwnerEmail, Rule::new(RuleKind::Email));
    rules.insert(FieldId::OwnerPhone, Rule::new(RuleKind::Phone));
    rules.insert(FieldId::OwnerPostalCode, Rule::new(RuleKind::PostalCode));
    rules.insert(FieldId::AttachmentNote, Rule::new(text(MAX_VALUE_LENGTH)));
    rules
}

/// Conditional rules for one ownership type. Entries override base rules
/// with the same field on merge.
pub fn conditional_rules(ty: OwnershipType) -> ValidationRuleSet {
    let mut rules = ValidationRuleSet::new();
    if ty.implies_owned() {
        rules.insert(FieldId::PurchasePrice, Rule::new(amount()).required());
        rules.insert(
            FieldId::SiteAreaTsubo,
            Rule::new(area()).required_without(FieldId::SiteAreaSqm),
        );
        rules.insert(
            FieldId::SiteAreaSqm,
            Rule::new(area()).required_without(FieldId::SiteAreaTsubo),
        );
    }
    if ty.implies_leased() {
        rules.insert(FieldId::MonthlyRent, Rule::new(amount()).required());
        rules.insert(FieldId::ContractStartDate, Rule::new(date_text()).required());
        rules.insert(FieldId::ContractEndDate, Rule::new(date_text()).required());
    }
    if ty == OwnershipType::Leased {
        rules.insert(FieldId::ManagementCompanyName, Rule::new(text(200)).required());
        rules.insert(FieldId::OwnerName, Rule::new(text(200)).required());
        rules.insert(FieldId::OwnerEmail, Rule::new(RuleKind::Email).required());
    }
    rules
}

/// The effective rule set for `ty`: base merged with conditional,
/// conditional winning.
pub fn rules_for(ty: OwnershipType) -> ValidationRuleSet {
    let mut rules = base_rules();
    rules.extend(conditional_rules(ty));
    rules
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2,4}-\d{2,4}-\d{4}$").expect("static pattern"))
}

fn postal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{3}-\d{4}$").expect("static pattern"))
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        format!("{bound}")
    }
}

/// Validate one field against its rule. Empty result means valid.
///
/// Check order: length bound, `required`, `required_without` deferral,
/// then the kind-specific check.
pub fn validate_field(field: FieldId, rule: &Rule, values: &FieldValues) -> Vec<FieldMessage> {
    let value = values.get(&field).cloned().unwrap_or_default();
    let label = field.label();

    if let Some(text) = value.as_text() {
        if text.chars().count() > MAX_VALUE_LENGTH {
            return vec![FieldMessage::new(
                field,
                format!("{label} must be {MAX_VALUE_LENGTH} characters or fewer"),
            )];
        }
    }

    if value.is_empty() {
        if rule.required {
            return vec![FieldMessage::new(field, format!("{label} is required"))];
        }
        // A required_without pair with both sides empty is reported once
        // by the cross-field pass, not here.
        return Vec::new();
    }

    let message = match &rule.kind {
        RuleKind::Number { min, max } => check_numeric(&value, *min, *max, label, "a number"),
        RuleKind::Currency { min, max } => check_numeric(&value, *min, *max, label, "an amount"),
        RuleKind::Email => match value.as_text() {
            Some(text) if text.validate_email() => None,
            _ => Some(format!("{label} must be a valid email address")),
        },
        RuleKind::Url => match value.as_text() {
            Some(text) if text.validate_url() => None,
            _ => Some(format!("{label} must be a valid URL")),
        },
        RuleKind::Phone => match value.as_text() {
            Some(text) if phone_regex().is_match(text.trim()) => None,
            _ => Some(format!("{label} must be a phone number like 03-1234-5678")),
        },
        RuleKind::PostalCode => match value.as_text() {
            Some(text) if postal_regex().is_match(text.trim()) => None,
            _ => Some(format!("{label} must be a postal code like 123-4567")),
        },
        RuleKind::Text { max_len } => match (value.as_text(), max_len) {
            (Some(text), Some(max)) if text.chars().count() > *max => {
                Some(format!("{label} must be {max} characters or fewer"))
            }
            _ => None,
        },
    };

    message.map(|m| FieldMessage::new(field, m)).into_iter().collect()
}

fn check_numeric(
    value: &FieldValue,
    min: Option<f64>,
    max: Option<f64>,
    label: &str,
    noun: &str,
) -> Option<String> {
    let number = match parse_amount(value) {
        Some(n) if n.is_finite() => n,
        _ => return Some(format!("{label} must be {noun}")),
    };
    if let Some(min) = min {
        if number < min {
            return Some(format!("{label} must be at least {}", format_bound(min)));
        }
    }
    if let Some(max) = max {
        if number > max {
            return Some(format!("{label} must be at most {}", format_bound(max)));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Cross-field checks
// ---------------------------------------------------------------------------

/// Rules spanning two fields, evaluated once per pass.
pub fn validate_cross_field(
    ty: OwnershipType,
    values: &FieldValues,
    config: &EngineConfig,
) -> Vec<FieldMessage> {
    let mut messages = Vec::new();

    if ty.implies_leased() {
        let start = values
            .get(&FieldId::ContractStartDate)
            .and_then(FieldValue::as_date);
        let end = values
            .get(&FieldId::ContractEndDate)
            .and_then(FieldValue::as_date);
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                messages.push(FieldMessage::new(
                    FieldId::ContractEndDate,
                    "Contract end date must be after the contract start date".to_string(),
                ));
            }
        }
    }

    if ty.implies_owned() && config.require_either_area {
        let tsubo_empty = values
            .get(&FieldId::SiteAreaTsubo)
            .map_or(true, FieldValue::is_empty);
        let sqm_empty = values
            .get(&FieldId::SiteAreaSqm)
            .map_or(true, FieldValue::is_empty);
        if tsubo_empty && sqm_empty {
            messages.push(FieldMessage {
                field: FieldId::SiteAreaTsubo,
                paired: Some(FieldId::SiteAreaSqm),
                message: "Enter the site area in tsubo or in square meters".to_string(),
            });
        }
    }

    messages
}

// ---------------------------------------------------------------------------
// Form validation
// ---------------------------------------------------------------------------

/// Validate every ruled field in a currently visible section, then append
/// the cross-field checks.
pub fn validate_form(
    ty: OwnershipType,
    values: &FieldValues,
    visibility: &VisibilityMap,
    config: &EngineConfig,
) -> ValidationReport {
    let mut messages = Vec::new();
    for (field, rule) in rules_for(ty) {
        let visible = visibility.get(&field.section()).copied().unwrap_or(false);
        if !visible {
            continue;
        }
        messages.extend(validate_field(field, &rule, values));
    }
    messages.extend(validate_cross_field(ty, values, config));
    ValidationReport {
        is_valid: messages.is_empty(),
        messages,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::visibility_for;
    use chrono::NaiveDate;

    fn values(pairs: &[(FieldId, FieldValue)]) -> FieldValues {
        pairs.iter().cloned().collect()
    }

    fn date(y: i32, m: u32, d: u32) -> FieldValue {
        FieldValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    // -- rule tables --

    #[test]
    fn conditional_overrides_base_on_collision() {
        let base = base_rules();
        assert!(!base[&FieldId::PurchasePrice].required);
        let owned = rules_for(OwnershipType::Owned);
        assert!(owned[&FieldId::PurchasePrice].required);
        // Untouched base entries survive the merge.
        assert_eq!(owned[&FieldId::OwnerPhone], base[&FieldId::OwnerPhone]);
    }

    #[test]
    fn rules_are_recomputed_identically_per_call() {
        for ty in crate::types::ALL_OWNERSHIP_TYPES {
            assert_eq!(rules_for(ty), rules_for(ty));
        }
    }

    #[test]
    fn leased_requires_management_and_owner_contact() {
        let rules = rules_for(OwnershipType::Leased);
        assert!(rules[&FieldId::ManagementCompanyName].required);
        assert!(rules[&FieldId::OwnerName].required);
        assert!(rules[&FieldId::OwnerEmail].required);
        assert!(rules[&FieldId::MonthlyRent].required);
    }

    #[test]
    fn owned_and_leased_skips_management_requirements() {
        let rules = rules_for(OwnershipType::OwnedAndLeased);
        assert!(!rules[&FieldId::ManagementCompanyName].required);
        assert!(rules[&FieldId::PurchasePrice].required);
        assert!(rules[&FieldId::MonthlyRent].required);
    }

    #[test]
    fn derived_fields_have_no_rule() {
        let rules = rules_for(OwnershipType::OwnedAndLeased);
        assert!(!rules.contains_key(&FieldId::UnitPrice));
        assert!(!rules.contains_key(&FieldId::ContractPeriod));
    }

    // -- validate_field --

    #[test]
    fn required_field_empty_is_an_error() {
        let rule = Rule::new(amount()).required();
        let msgs = validate_field(FieldId::PurchasePrice, &rule, &values(&[]));
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].field, FieldId::PurchasePrice);
        assert!(msgs[0].message.contains("required"));
    }

    #[test]
    fn optional_field_empty_is_valid() {
        let rule = Rule::new(RuleKind::Phone);
        assert!(validate_field(FieldId::OwnerPhone, &rule, &values(&[])).is_empty());
    }

    #[test]
    fn required_without_defers_both_empty_to_cross_field() {
        let rule = Rule::new(area()).required_without(FieldId::SiteAreaSqm);
        let msgs = validate_field(FieldId::SiteAreaTsubo, &rule, &values(&[]));
        assert!(msgs.is_empty());
    }

    #[test]
    fn length_bound_precedes_other_checks() {
        let rule = Rule::new(RuleKind::Email).required();
        let long = "x".repeat(MAX_VALUE_LENGTH + 1);
        let msgs = validate_field(
            FieldId::OwnerEmail,
            &rule,
            &values(&[(FieldId::OwnerEmail, FieldValue::Text(long))]),
        );
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].message.contains("characters"));
    }

    #[test]
    fn numeric_checks() {
        let rule = Rule::new(amount());
        let ok = values(&[(FieldId::MonthlyRent, FieldValue::Text("120,000".into()))]);
        assert!(validate_field(FieldId::MonthlyRent, &rule, &ok).is_empty());

        let garbage = values(&[(FieldId::MonthlyRent, FieldValue::Text("abc".into()))]);
        let msgs = validate_field(FieldId::MonthlyRent, &rule, &garbage);
        assert_eq!(msgs.len(), 1);

        let negative = values(&[(FieldId::MonthlyRent, FieldValue::Number(-5.0))]);
        let msgs = validate_field(FieldId::MonthlyRent, &rule, &negative);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].message.contains("at least"));
    }

    #[test]
    fn email_shape() {
        let rule = Rule::new(RuleKind::Email);
        let good = values(&[(FieldId::OwnerEmail, FieldValue::Text("a@example.com".into()))]);
        assert!(validate_field(FieldId::OwnerEmail, &rule, &good).is_empty());
        let bad = values(&[(FieldId::OwnerEmail, FieldValue::Text("not-an-email".into()))]);
        assert_eq!(validate_field(FieldId::OwnerEmail, &rule, &bad).len(), 1);
    }

    #[test]
    fn url_shape() {
        let rule = Rule::new(RuleKind::Url);
        let good = values(&[(
            FieldId::ManagementCompanyUrl,
            FieldValue::Text("https://example.com".into()),
        )]);
        assert!(validate_field(FieldId::ManagementCompanyUrl, &rule, &good).is_empty());
        let bad = values(&[(
            FieldId::ManagementCompanyUrl,
            FieldValue::Text("nope".into()),
        )]);
        assert_eq!(
            validate_field(FieldId::ManagementCompanyUrl, &rule, &bad).len(),
            1
        );
    }

    #[test]
    fn phone_pattern() {
        let rule = Rule::new(RuleKind::Phone);
        for good in ["03-1234-5678", "090-1234-5678", "0120-12-3456"] {
            let vals = values(&[(FieldId::OwnerPhone, FieldValue::Text(good.into()))]);
            assert!(
                validate_field(FieldId::OwnerPhone, &rule, &vals).is_empty(),
                "{good} should be accepted"
            );
        }
        for bad in ["1-2-3", "03 1234 5678", "0312345678", "ab-cdef-ghij"] {
            let vals = values(&[(FieldId::OwnerPhone, FieldValue::Text(bad.into()))]);
            assert_eq!(
                validate_field(FieldId::OwnerPhone, &rule, &vals).len(),
                1,
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn postal_pattern() {
        let rule = Rule::new(RuleKind::PostalCode);
        let good = values(&[(FieldId::OwnerPostalCode, FieldValue::Text("123-4567".into()))]);
        assert!(validate_field(FieldId::OwnerPostalCode, &rule, &good).is_empty());
        for bad in ["1234567", "12-34567", "123-456", "abc-defg"] {
            let vals = values(&[(FieldId::OwnerPostalCode, FieldValue::Text(bad.into()))]);
            assert_eq!(validate_field(FieldId::OwnerPostalCode, &rule, &vals).len(), 1);
        }
    }

    #[test]
    fn text_max_len() {
        let rule = Rule::new(text(5));
        let ok = values(&[(FieldId::OwnerName, FieldValue::Text("short".into()))]);
        assert!(validate_field(FieldId::OwnerName, &rule, &ok).is_empty());
        let long = values(&[(FieldId::OwnerName, FieldValue::Text("toolong".into()))]);
        assert_eq!(validate_field(FieldId::OwnerName, &rule, &long).len(), 1);
    }

    // -- cross-field --

    #[test]
    fn both_areas_empty_yields_one_error_attributed_to_both() {
        let config = EngineConfig::default();
        let msgs = validate_cross_field(OwnershipType::Owned, &values(&[]), &config);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].field, FieldId::SiteAreaTsubo);
        assert_eq!(msgs[0].paired, Some(FieldId::SiteAreaSqm));
    }

    #[test]
    fn one_area_filled_satisfies_the_pair() {
        let config = EngineConfig::default();
        let vals = values(&[(FieldId::SiteAreaSqm, FieldValue::Number(330.0))]);
        assert!(validate_cross_field(OwnershipType::Owned, &vals, &config).is_empty());
    }

    #[test]
    fn either_area_rule_can_be_disabled() {
        let config = EngineConfig {
            require_either_area: false,
            ..EngineConfig::default()
        };
        assert!(validate_cross_field(OwnershipType::Owned, &values(&[]), &config).is_empty());
    }

    #[test]
    fn area_rule_not_applied_to_leased() {
        let config = EngineConfig::default();
        assert!(validate_cross_field(OwnershipType::Leased, &values(&[]), &config).is_empty());
    }

    #[test]
    fn date_order_checked_for_leased_types() {
        let config = EngineConfig::default();
        let vals = values(&[
            (FieldId::ContractStartDate, date(2023, 5, 1)),
            (FieldId::ContractEndDate, date(2023, 4, 1)),
        ]);
        let msgs = validate_cross_field(OwnershipType::Leased, &vals, &config);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].field, FieldId::ContractEndDate);

        let msgs = validate_cross_field(OwnershipType::OwnedAndLeased, &vals, &config);
        assert!(msgs.iter().any(|m| m.field == FieldId::ContractEndDate));
    }

    #[test]
    fn date_order_ignored_when_a_date_is_missing() {
        let config = EngineConfig::default();
        let vals = values(&[(FieldId::ContractStartDate, date(2023, 5, 1))]);
        assert!(validate_cross_field(OwnershipType::Leased, &vals, &config)
            .iter()
            .all(|m| m.field != FieldId::ContractEndDate));
    }

    // -- validate_form --

    #[test]
    fn owned_form_with_areas_empty_has_exactly_one_area_error() {
        let config = EngineConfig::default();
        let vals = values(&[(FieldId::PurchasePrice, FieldValue::Text("1,000,000".into()))]);
        let report = validate_form(
            OwnershipType::Owned,
            &vals,
            &visibility_for(OwnershipType::Owned),
            &config,
        );
        assert!(!report.is_valid);
        let area_msgs: Vec<_> = report
            .messages
            .iter()
            .filter(|m| {
                m.field == FieldId::SiteAreaTsubo || m.field == FieldId::SiteAreaSqm
            })
            .collect();
        assert_eq!(area_msgs.len(), 1, "no duplicate per-field required error");
    }

    #[test]
    fn hidden_sections_are_not_validated() {
        let config = EngineConfig::default();
        // Invalid owner email, but under Owned the owner section is hidden.
        let vals = values(&[
            (FieldId::PurchasePrice, FieldValue::Number(1000.0)),
            (FieldId::SiteAreaTsubo, FieldValue::Number(10.0)),
            (FieldId::OwnerEmail, FieldValue::Text("garbage".into())),
        ]);
        let report = validate_form(
            OwnershipType::Owned,
            &vals,
            &visibility_for(OwnershipType::Owned),
            &config,
        );
        assert!(report.is_valid, "{:?}", report.messages);
    }

    #[test]
    fn complete_leased_form_is_valid() {
        let config = EngineConfig::default();
        let vals = values(&[
            (FieldId::MonthlyRent, FieldValue::Text("250,000".into())),
            (FieldId::ContractStartDate, date(2023, 4, 1)),
            (FieldId::ContractEndDate, date(2025, 3, 31)),
            (FieldId::ManagementCompanyName, FieldValue::Text("Acme PM".into())),
            (FieldId::OwnerName, FieldValue::Text("Yamada".into())),
            (FieldId::OwnerEmail, FieldValue::Text("yamada@example.com".into())),
        ]);
        let report = validate_form(
            OwnershipType::Leased,
            &vals,
            &visibility_for(OwnershipType::Leased),
            &config,
        );
        assert!(report.is_valid, "{:?}", report.messages);
    }

    #[test]
    fn incomplete_leased_form_lists_each_missing_field_once() {
        let config = EngineConfig::default();
        let report = validate_form(
            OwnershipType::Leased,
            &values(&[]),
            &visibility_for(OwnershipType::Leased),
            &config,
        );
        assert!(!report.is_valid);
        let required: Vec<_> = report
            .messages
            .iter()
            .filter(|m| m.message.contains("required"))
            .map(|m| m.field)
            .collect();
        let mut deduped = required.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(required.len(), deduped.len());
        assert!(required.contains(&FieldId::MonthlyRent));
        assert!(required.contains(&FieldId::ManagementCompanyName));
    }
}
