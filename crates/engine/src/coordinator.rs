//! The form engine's single point of entry.
//!
//! Owns the current ownership type, the last-known visibility snapshot,
//! the calculation engine, and the debounce timer map. The host wires
//! its change events to [`Coordinator::on_field_changed`] and
//! [`Coordinator::on_ownership_type_changed`], pumps timers with
//! [`Coordinator::tick`], and gates submission on
//! [`Coordinator::on_submit`].
//!
//! Within one ownership-type change the sequence is strict and
//! synchronous: visibility transition, validation reset for hidden
//! sections, then a scheduled recompute of both derived values. A
//! collaborator failure in an earlier step is reported and does not stop
//! the later steps.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use landform_core::calculation::{
    Calculation, CalculationEngine, CalculationResult, ALL_CALCULATIONS,
};
use landform_core::types::{FieldId, FieldValue, OwnershipType, ALL_FIELDS, ALL_SECTIONS};
use landform_core::validation::{rules_for, validate_field, validate_form, FieldValues};
use landform_core::visibility::VisibilityMap;
use landform_core::{EngineConfig, FormError};

use crate::debounce::{DebounceTimers, TimerKey};
use crate::error::EngineError;
use crate::observer::FormObserver;
use crate::store::{FieldStore, Reporter};
use crate::transition::apply_transition;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters exposed to the host for diagnostics dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineMetrics {
    pub calculation_count: u64,
    pub cache_hit_rate: f64,
    pub validation_count: u64,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Sequences the visibility, validation, and calculation engines in
/// response to host events.
pub struct Coordinator<S: FieldStore, R: Reporter> {
    session_id: Uuid,
    calc: CalculationEngine,
    config: EngineConfig,
    store: S,
    reporter: R,
    timers: DebounceTimers,
    observers: Vec<Box<dyn FormObserver>>,
    current_type: Option<OwnershipType>,
    visibility: VisibilityMap,
    validation_count: u64,
    destroyed: bool,
}

impl<S: FieldStore, R: Reporter> Coordinator<S, R> {
    /// Build a coordinator over the host's collaborators.
    ///
    /// Before any ownership type is selected every section is considered
    /// hidden. Calculation inputs that already carry values (a restored
    /// session) get one settle-delayed calculation pass each; a failing
    /// initial read is reported and the engine continues with that
    /// calculation skipped.
    pub fn new(store: S, reporter: R, config: EngineConfig, now: Instant) -> Self {
        let mut coordinator = Self {
            session_id: Uuid::new_v4(),
            calc: CalculationEngine::new(&config),
            config,
            store,
            reporter,
            timers: DebounceTimers::new(),
            observers: Vec::new(),
            current_type: None,
            visibility: ALL_SECTIONS.iter().map(|section| (*section, false)).collect(),
            validation_count: 0,
            destroyed: false,
        };

        let settle = coordinator.config.settle_delay();
        for calculation in ALL_CALCULATIONS {
            let mut populated = true;
            for input in calculation.inputs() {
                match coordinator.store.get(*input) {
                    Ok(value) => {
                        if value.is_empty() {
                            populated = false;
                        }
                    }
                    Err(error) => {
                        populated = false;
                        coordinator.report(
                            FormError::Initialization(format!(
                                "Cannot read {}: {error}",
                                input.as_str()
                            ))
                            .into(),
                            "initialization",
                        );
                    }
                }
            }
            if populated {
                coordinator
                    .timers
                    .arm(TimerKey::Recalculate(calculation), now, settle);
            }
        }

        tracing::debug!(session = %coordinator.session_id, "Form engine initialized");
        coordinator
    }

    pub fn add_observer(&mut self, observer: Box<dyn FormObserver>) {
        self.observers.push(observer);
    }

    // -- entry points -------------------------------------------------------

    /// React to the user selecting an ownership type.
    pub fn on_ownership_type_changed(&mut self, new_type: OwnershipType, now: Instant) {
        if self.destroyed {
            return;
        }
        let old = self.current_type;
        tracing::debug!(
            session = %self.session_id,
            old = ?old.map(|ty| ty.as_str()),
            new = new_type.as_str(),
            "Ownership type changed"
        );

        // Stale timers from the previous type must never fire against
        // the new one.
        self.timers.cancel_all();

        for observer in &mut self.observers {
            observer.transitioning(old, new_type);
        }

        let outcome = apply_transition(new_type, &mut self.store);
        self.current_type = Some(new_type);
        self.visibility = outcome.visibility;
        for (field, error) in outcome.failures {
            let context = format!("visibility_transition:{}", field.as_str());
            self.report(error.into(), &context);
        }

        for observer in &mut self.observers {
            observer.transitioned(new_type, &self.visibility);
        }

        // Best-effort recompute even when the transition reported
        // failures; cleared inputs simply blank the derived values.
        let settle = self.config.settle_delay();
        for calculation in ALL_CALCULATIONS {
            self.timers
                .arm(TimerKey::Recalculate(calculation), now, settle);
        }
    }

    /// React to a single field edit (called from the host's change hook,
    /// after the store already holds the new value).
    pub fn on_field_changed(&mut self, field: FieldId, now: Instant) {
        if self.destroyed {
            return;
        }
        let debounce = self.config.debounce_delay();
        for calculation in ALL_CALCULATIONS {
            if calculation.inputs().contains(&field) {
                self.timers
                    .arm(TimerKey::Recalculate(calculation), now, debounce);
            }
        }
        if !field.is_derived() {
            self.timers.arm(TimerKey::Validate(field), now, debounce);
        }
    }

    /// Fire every due timer. Values are read from the store at fire
    /// time, never captured when the timer was armed.
    pub fn tick(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        for key in self.timers.fire_due(now) {
            match key {
                TimerKey::Recalculate(calculation) => self.run_calculation(calculation),
                TimerKey::Validate(field) => self.validate_field_now(field),
            }
        }
    }

    /// Full-form validation gate. Returns `false` when submission must
    /// be blocked; every message is also pushed to the store as an
    /// invalid marker on its field.
    pub fn on_submit(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(ty) = self.current_type else {
            self.report(
                FormError::State("No ownership type selected".to_string()).into(),
                "submit",
            );
            return false;
        };

        let values = self.snapshot_values();
        let report = validate_form(ty, &values, &self.visibility, &self.config);
        self.validation_count += 1;

        // Reset markers on every ruled visible field, then re-apply.
        for (field, _) in rules_for(ty) {
            if self.is_section_visible(field) {
                self.mark_invalid(field, false, None, "submit");
            }
        }
        for message in &report.messages {
            self.mark_invalid(message.field, true, Some(&message.message), "submit");
            if let Some(paired) = message.paired {
                self.mark_invalid(paired, true, Some(&message.message), "submit");
            }
        }

        tracing::debug!(
            session = %self.session_id,
            valid = report.is_valid,
            messages = report.messages.len(),
            "Form validated for submission"
        );
        report.is_valid
    }

    /// Cancel all pending timers and drop the memo cache. The only
    /// explicit cancellation surface; after this every entry point
    /// no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.timers.cancel_all();
        self.calc.clear_cache();
        self.observers.clear();
        self.destroyed = true;
        tracing::debug!(session = %self.session_id, "Form engine destroyed");
    }

    pub fn metrics(&self) -> EngineMetrics {
        EngineMetrics {
            calculation_count: self.calc.calculation_count(),
            cache_hit_rate: self.calc.cache_hit_rate(),
            validation_count: self.validation_count,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_type(&self) -> Option<OwnershipType> {
        self.current_type
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // -- internals ----------------------------------------------------------

    fn is_section_visible(&self, field: FieldId) -> bool {
        self.visibility
            .get(&field.section())
            .copied()
            .unwrap_or(false)
    }

    fn run_calculation(&mut self, calculation: Calculation) {
        match calculation {
            Calculation::UnitPrice => {
                let price = self.read_field(FieldId::PurchasePrice, "unit_price_inputs");
                let area = self.read_field(FieldId::SiteAreaTsubo, "unit_price_inputs");
                if price.is_empty() && area.is_empty() {
                    // Untouched or cleared inputs: blank the derived
                    // field instead of flagging an error the user has
                    // not caused.
                    self.write_field(FieldId::UnitPrice, FieldValue::Empty, "unit_price");
                    self.mark_invalid(FieldId::UnitPrice, false, None, "unit_price");
                    return;
                }
                let result = self.calc.unit_price(&price, &area);
                self.apply_result(FieldId::UnitPrice, result);
            }
            Calculation::ContractPeriod => {
                let start = self
                    .read_field(FieldId::ContractStartDate, "contract_period_inputs")
                    .as_date();
                let end = self
                    .read_field(FieldId::ContractEndDate, "contract_period_inputs")
                    .as_date();
                match self.calc.contract_period(start, end) {
                    None => {
                        self.write_field(
                            FieldId::ContractPeriod,
                            FieldValue::Empty,
                            "contract_period",
                        );
                        self.mark_invalid(FieldId::ContractPeriod, false, None, "contract_period");
                    }
                    Some(result) => self.apply_result(FieldId::ContractPeriod, result),
                }
            }
        }
    }

    fn apply_result(&mut self, derived: FieldId, result: CalculationResult) {
        match result {
            CalculationResult::Ok {
                formatted, warning, ..
            } => {
                self.write_field(derived, FieldValue::Text(formatted), "calculation_result");
                self.mark_invalid(derived, false, None, "calculation_result");
                if let Some(warning) = warning {
                    tracing::warn!(
                        session = %self.session_id,
                        field = derived.as_str(),
                        %warning,
                        "Calculation warning"
                    );
                }
            }
            CalculationResult::Error { message } => {
                self.write_field(derived, FieldValue::Empty, "calculation_result");
                self.mark_invalid(derived, true, Some(&message), "calculation_result");
            }
        }
    }

    fn validate_field_now(&mut self, field: FieldId) {
        let Some(ty) = self.current_type else {
            return;
        };
        if !self.is_section_visible(field) {
            return;
        }
        let rules = rules_for(ty);
        let Some(rule) = rules.get(&field) else {
            return;
        };
        let values = self.snapshot_values();
        let messages = validate_field(field, rule, &values);
        self.validation_count += 1;

        match messages.first() {
            None => self.mark_invalid(field, false, None, "field_validation"),
            Some(first) => {
                let message = first.message.clone();
                self.mark_invalid(field, true, Some(&message), "field_validation");
            }
        }
        for observer in &mut self.observers {
            observer.field_validated(field, &messages);
        }
    }

    fn snapshot_values(&mut self) -> FieldValues {
        let mut values = FieldValues::new();
        for field in ALL_FIELDS {
            let value = self.read_field(field, "snapshot");
            if !matches!(value, FieldValue::Empty) {
                values.insert(field, value);
            }
        }
        values
    }

    fn read_field(&mut self, field: FieldId, context: &str) -> FieldValue {
        match self.store.get(field) {
            Ok(value) => value,
            Err(error) => {
                self.report(error.into(), context);
                FieldValue::Empty
            }
        }
    }

    fn write_field(&mut self, field: FieldId, value: FieldValue, context: &str) {
        if let Err(error) = self.store.set(field, value) {
            self.report(error.into(), context);
        }
    }

    fn mark_invalid(&mut self, field: FieldId, invalid: bool, message: Option<&str>, context: &str) {
        if let Err(error) = self.store.set_invalid(field, invalid, message) {
            self.report(error.into(), context);
        }
    }

    fn report(&mut self, error: EngineError, context: &str) {
        tracing::warn!(
            session = %self.session_id,
            context,
            error = %error,
            "Engine error reported"
        );
        let metadata = serde_json::json!({
            "session_id": self.session_id.to_string(),
            "ownership_type": self.current_type.map(|ty| ty.as_str()),
        });
        self.reporter.report(&error, context, metadata);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
