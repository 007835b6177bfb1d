//! Closing-form fields.
//!
//! The closing form arrives from the outside as loose key/value data. The
//! typed model is a fixed set of named optional fields plus an explicit
//! `answers` map for everything else, so the precedence rule on close is
//! type-checked instead of keyed on whatever happens to be present.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Typed closing-form input for `Shift::close`.
///
/// `cash`/`card` are minor currency units. A `None` means "derive from the
/// order ledger"; a `Some` always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingFields {
    pub cash: Option<i64>,
    pub card: Option<i64>,
    pub guests: Option<u32>,
    pub note: Option<String>,
    /// Free-form closing answers (form question → answer).
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

impl ClosingFields {
    /// Build from a loose JSON object.
    ///
    /// Malformed numeric fields coerce to zero with a warning instead of
    /// rejecting the close: an employee must always be able to go home.
    /// Unknown keys land in `answers`, stringified.
    pub fn from_loose(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            if !value.is_null() {
                warn!(kind = %json_kind(value), "ignoring non-object closing fields");
            }
            return Self::default();
        };

        let mut fields = Self::default();
        for (key, raw) in map {
            match key.as_str() {
                "cash" => fields.cash = Some(coerce_amount(raw, "cash")),
                "card" => fields.card = Some(coerce_amount(raw, "card")),
                "guests" => fields.guests = Some(coerce_count(raw, "guests")),
                "note" => fields.note = raw.as_str().map(str::to_string),
                _ => {
                    fields.answers.insert(key.clone(), stringify(raw));
                }
            }
        }
        fields
    }
}

fn coerce_amount(value: &Value, field: &str) -> i64 {
    if let Some(n) = value.as_i64() {
        return n;
    }
    if let Some(f) = value.as_f64() {
        return f.round() as i64;
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse::<i64>() {
            return n;
        }
        if let Ok(f) = s.trim().parse::<f64>() {
            return f.round() as i64;
        }
    }
    warn!(field, value = %json_kind(value), "non-numeric closing amount, coerced to 0");
    0
}

fn coerce_count(value: &Value, field: &str) -> u32 {
    let n = coerce_amount(value, field);
    if n < 0 {
        warn!(field, n, "negative closing count, coerced to 0");
        return 0;
    }
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_numbers_pass_through() {
        let fields = ClosingFields::from_loose(&json!({
            "cash": 500,
            "card": 300,
            "guests": 4,
        }));
        assert_eq!(fields.cash, Some(500));
        assert_eq!(fields.card, Some(300));
        assert_eq!(fields.guests, Some(4));
    }

    #[test]
    fn numeric_strings_parse() {
        let fields = ClosingFields::from_loose(&json!({"cash": "1250", "guests": "3"}));
        assert_eq!(fields.cash, Some(1250));
        assert_eq!(fields.guests, Some(3));
    }

    #[test]
    fn malformed_numbers_coerce_to_zero_instead_of_failing() {
        let fields = ClosingFields::from_loose(&json!({
            "cash": "a handful",
            "card": true,
            "guests": -2,
        }));
        assert_eq!(fields.cash, Some(0));
        assert_eq!(fields.card, Some(0));
        assert_eq!(fields.guests, Some(0));
    }

    #[test]
    fn unknown_keys_become_answers() {
        let fields = ClosingFields::from_loose(&json!({
            "cash": 100,
            "note": "all good",
            "fridge_temp": "4C",
            "till_counted": true,
        }));
        assert_eq!(fields.note.as_deref(), Some("all good"));
        assert_eq!(fields.answers["fridge_temp"], "4C");
        assert_eq!(fields.answers["till_counted"], "true");
        assert!(!fields.answers.contains_key("cash"));
    }

    #[test]
    fn non_object_input_yields_defaults() {
        assert_eq!(ClosingFields::from_loose(&json!(null)), ClosingFields::default());
        assert_eq!(ClosingFields::from_loose(&json!([1, 2])), ClosingFields::default());
    }
}
