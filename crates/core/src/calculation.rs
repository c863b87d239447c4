//! Derived-value calculations: unit price and contract period.
//!
//! Both calculations are pure functions over sanitized inputs, wrapped by
//! [`CalculationEngine`] which owns the shared memo cache and the
//! calculation counters. Domain failures (bad amounts, inverted dates)
//! are returned as tagged [`CalculationResult::Error`] values, never as
//! `Err` across the component boundary.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cache::MemoCache;
use crate::config::EngineConfig;
use crate::types::{FieldId, FieldValue};

/// Largest amount either calculation input may carry. Amounts above this
/// lose integer precision in the host's number representation, so they
/// are rejected rather than silently rounded.
pub const MAX_SAFE_AMOUNT: f64 = 9_007_199_254_740_991.0;

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// The two derived calculations the form maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calculation {
    UnitPrice,
    ContractPeriod,
}

/// Both calculations, in recompute order.
pub const ALL_CALCULATIONS: [Calculation; 2] = [Calculation::UnitPrice, Calculation::ContractPeriod];

impl Calculation {
    /// The input fields feeding this calculation.
    pub fn inputs(&self) -> &'static [FieldId] {
        match self {
            Self::UnitPrice => &[FieldId::PurchasePrice, FieldId::SiteAreaTsubo],
            Self::ContractPeriod => &[FieldId::ContractStartDate, FieldId::ContractEndDate],
        }
    }

    /// The display field this calculation writes.
    pub fn derived_field(&self) -> FieldId {
        match self {
            Self::UnitPrice => FieldId::UnitPrice,
            Self::ContractPeriod => FieldId::ContractPeriod,
        }
    }
}

// ---------------------------------------------------------------------------
// CalculationResult
// ---------------------------------------------------------------------------

/// Outcome of one calculation. Never partially populated: an `Ok` always
/// carries both the numeric value and its display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CalculationResult {
    Ok {
        value: i64,
        formatted: String,
        /// Advisory only; an `Ok` with a warning is still a success.
        warning: Option<String>,
    },
    Error {
        message: String,
    },
}

impl CalculationResult {
    fn ok(value: i64, formatted: String) -> Self {
        Self::Ok {
            value,
            formatted,
            warning: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The display text, if the calculation succeeded.
    pub fn formatted(&self) -> Option<&str> {
        match self {
            Self::Ok { formatted, .. } => Some(formatted),
            Self::Error { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Input sanitization
// ---------------------------------------------------------------------------

/// Parse an amount from a field value, tolerating grouping separators,
/// whitespace, and currency glyphs in text input.
///
/// Returns `None` when the remaining text is not a number.
pub fn parse_amount(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '，' | '¥' | '￥' | '$' | '円'))
                .collect();
            if stripped.is_empty() {
                None
            } else {
                stripped.parse::<f64>().ok()
            }
        }
        FieldValue::Empty | FieldValue::Date(_) => None,
    }
}

/// Sanitize an amount for calculation: unparsable input degrades to 0.
pub fn sanitize_amount(value: &FieldValue) -> f64 {
    parse_amount(value).unwrap_or(0.0)
}

/// Format an integer with comma grouping separators.
pub fn format_grouped(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// ---------------------------------------------------------------------------
// Unit price
// ---------------------------------------------------------------------------

/// Price per tsubo, rounded to the nearest whole currency unit.
///
/// Inputs must be finite, positive, and within [`MAX_SAFE_AMOUNT`].
/// Results above `warning_threshold` carry an advisory warning.
pub fn compute_unit_price(price: f64, area_tsubo: f64, warning_threshold: i64) -> CalculationResult {
    if !price.is_finite() || !area_tsubo.is_finite() {
        return CalculationResult::error("Purchase price and site area must be numbers");
    }
    if price <= 0.0 {
        return CalculationResult::error("Purchase price must be greater than zero");
    }
    if area_tsubo <= 0.0 {
        return CalculationResult::error("Site area must be greater than zero");
    }
    if price > MAX_SAFE_AMOUNT || area_tsubo > MAX_SAFE_AMOUNT {
        return CalculationResult::error(format!(
            "Amounts above {} are not supported",
            format_grouped(MAX_SAFE_AMOUNT as i64)
        ));
    }

    let value = (price / area_tsubo).round() as i64;
    let formatted = format_grouped(value);
    let warning = (value > warning_threshold).then(|| {
        format!(
            "Unit price is over {} per tsubo. Check the purchase price and site area.",
            format_grouped(warning_threshold)
        )
    });
    CalculationResult::Ok {
        value,
        formatted,
        warning,
    }
}

// ---------------------------------------------------------------------------
// Contract period
// ---------------------------------------------------------------------------

/// Duration of the lease contract in whole months, with a day-granularity
/// fallback for contracts shorter than one month.
///
/// Returns `None` when either date is absent: no calculation is attempted
/// and the derived field stays blank. An end date on or before the start
/// date is an error, surfaced immediately rather than at submission.
pub fn compute_contract_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Option<CalculationResult> {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => return None,
    };

    if end <= start {
        return Some(CalculationResult::error(
            "Contract end date must be after the contract start date",
        ));
    }

    let mut months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    if end.day() < start.day() {
        months -= 1;
    }
    let months = i64::from(months.max(0));

    let formatted = if months == 0 {
        let days = (end - start).num_days();
        if days <= 0 {
            // Unreachable once end > start; kept as a fallback.
            "0 day(s)".to_string()
        } else {
            format!("{days} day(s)")
        }
    } else {
        let years = months / 12;
        let remainder = months % 12;
        let mut text = String::new();
        if years > 0 {
            text.push_str(&format!("{years} year(s)"));
        }
        if remainder > 0 {
            text.push_str(&format!("{remainder} month(s)"));
        }
        if text.is_empty() {
            text.push_str("0 month(s)");
        }
        text
    };

    Some(CalculationResult::ok(months, formatted))
}

// ---------------------------------------------------------------------------
// CalculationEngine
// ---------------------------------------------------------------------------

/// Memoizing front end over the two pure calculations.
///
/// Owns the shared [`MemoCache`] exclusively; both `Ok` and `Error`
/// results are cached under sanitized-input keys.
#[derive(Debug)]
pub struct CalculationEngine {
    cache: MemoCache,
    warning_threshold: i64,
    calculation_count: u64,
}

impl CalculationEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            cache: MemoCache::new(config.cache_capacity),
            warning_threshold: config.unit_price_warning_threshold,
            calculation_count: 0,
        }
    }

    /// Unit price from raw field values.
    pub fn unit_price(&mut self, price: &FieldValue, area: &FieldValue) -> CalculationResult {
        let price = sanitize_amount(price);
        let area = sanitize_amount(area);
        self.calculation_count += 1;

        let key = format!("unit_price:{price}:{area}");
        if let Some(result) = self.cache.get(&key) {
            return result;
        }
        let result = compute_unit_price(price, area, self.warning_threshold);
        self.cache.insert(key, result.clone());
        result
    }

    /// Contract period from raw date values. Absent dates yield `None`
    /// without touching the cache or the calculation counter.
    pub fn contract_period(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<CalculationResult> {
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            _ => return None,
        };
        self.calculation_count += 1;

        let key = format!("period:{start}:{end}");
        if let Some(result) = self.cache.get(&key) {
            return Some(result);
        }
        let result = compute_contract_period(Some(start), Some(end))
            .unwrap_or_else(|| CalculationResult::error("Contract period unavailable"));
        self.cache.insert(key, result.clone());
        Some(result)
    }

    /// Drop all memoized results and reset the cache counters.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn calculation_count(&self) -> u64 {
        self.calculation_count
    }

    pub fn cache_hit_rate(&self) -> f64 {
        self.cache.hit_rate()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
