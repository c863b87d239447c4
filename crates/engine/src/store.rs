//! Field-store and reporter collaborator traits.
//!
//! The engine never touches markup or storage; everything it does to the
//! form goes through [`FieldStore`]. Change notification is inverted:
//! the host calls [`Coordinator::on_field_changed`] from its own change
//! hook rather than registering callbacks here.
//!
//! [`Coordinator::on_field_changed`]: crate::coordinator::Coordinator::on_field_changed

use std::collections::{BTreeMap, BTreeSet};

use landform_core::{FieldId, FieldValue};

use crate::error::{EngineError, StoreError};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Minimal surface the engine needs from the host's form state.
///
/// Implementations may fail (a detached widget, a missing binding); the
/// coordinator reports such failures and continues best-effort.
pub trait FieldStore {
    fn get(&self, field: FieldId) -> Result<FieldValue, StoreError>;

    fn set(&mut self, field: FieldId, value: FieldValue) -> Result<(), StoreError>;

    fn set_enabled(&mut self, field: FieldId, enabled: bool) -> Result<(), StoreError>;

    /// Mark or clear a field's invalid state, with an optional inline
    /// message shown next to the field.
    fn set_invalid(
        &mut self,
        field: FieldId,
        invalid: bool,
        message: Option<&str>,
    ) -> Result<(), StoreError>;
}

/// Error sink collaborator. The engine never aborts on a collaborator
/// failure; it hands the error here and carries on.
pub trait Reporter {
    fn report(&mut self, error: &EngineError, context: &str, metadata: serde_json::Value);
}

/// Reporter that forwards everything to the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, error: &EngineError, context: &str, metadata: serde_json::Value) {
        tracing::error!(context, %metadata, error = %error, "Form engine error");
    }
}

// ---------------------------------------------------------------------------
// MemoryFieldStore
// ---------------------------------------------------------------------------

/// In-memory [`FieldStore`] for tests and headless hosts.
///
/// Every field starts empty and enabled.
#[derive(Debug, Default)]
pub struct MemoryFieldStore {
    values: BTreeMap<FieldId, FieldValue>,
    disabled: BTreeSet<FieldId>,
    invalid: BTreeMap<FieldId, String>,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infallible value accessor for assertions.
    pub fn value(&self, field: FieldId) -> FieldValue {
        self.values.get(&field).cloned().unwrap_or_default()
    }

    pub fn is_enabled(&self, field: FieldId) -> bool {
        !self.disabled.contains(&field)
    }

    pub fn is_invalid(&self, field: FieldId) -> bool {
        self.invalid.contains_key(&field)
    }

    pub fn invalid_message(&self, field: FieldId) -> Option<&str> {
        self.invalid.get(&field).map(String::as_str)
    }

    /// The submission payload: enabled, non-empty fields only. Disabled
    /// fields never appear here, whatever value they still hold.
    pub fn payload(&self) -> Vec<(FieldId, FieldValue)> {
        self.values
            .iter()
            .filter(|(field, value)| self.is_enabled(**field) && !value.is_empty())
            .map(|(field, value)| (*field, value.clone()))
            .collect()
    }
}

impl FieldStore for MemoryFieldStore {
    fn get(&self, field: FieldId) -> Result<FieldValue, StoreError> {
        Ok(self.value(field))
    }

    fn set(&mut self, field: FieldId, value: FieldValue) -> Result<(), StoreError> {
        if value == FieldValue::Empty {
            self.values.remove(&field);
        } else {
            self.values.insert(field, value);
        }
        Ok(())
    }

    fn set_enabled(&mut self, field: FieldId, enabled: bool) -> Result<(), StoreError> {
        if enabled {
            self.disabled.remove(&field);
        } else {
            self.disabled.insert(field);
        }
        Ok(())
    }

    fn set_invalid(
        &mut self,
        field: FieldId,
        invalid: bool,
        message: Option<&str>,
    ) -> Result<(), StoreError> {
        if invalid {
            self.invalid
                .insert(field, message.unwrap_or("Invalid value").to_string());
        } else {
            self.invalid.remove(&field);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
