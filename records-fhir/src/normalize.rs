//! Shape resolution for `category`, value and `referenceRange` fields.
//!
//! `category` has been seen in four layouts across exports:
//!
//! ```text
//! "category": "Vital Signs"
//! "category": { "text": "Vital Signs" }
//! "category": ["Vital Signs", "Laboratory"]
//! "category": [{ "text": "Vital Signs" }]
//! ```
//!
//! Measured values are either a top-level `valueQuantity` or a `component`
//! list whose entries each carry their own `valueQuantity` and `code.text`.
//! Any other layout is reported as a [`SchemaError`] rather than ignored.

use records_core::{convert, ReferenceRange, SchemaError, Tally, ValueQuantity};
use serde_json::Value;

/// Weight of a bare top-level string category, a legacy layout kept out of
/// the top of ranked output.
pub const BARE_CATEGORY_WEIGHT: f64 = 0.1;
/// Weight of every structured or list-shaped category entry.
pub const STRUCTURED_CATEGORY_WEIGHT: f64 = 1.0;

/// Counting weights for every category label in `raw`.
///
/// With `only_first`, list-shaped categories contribute their first entry
/// only. Repeated labels count once per occurrence.
pub fn resolve_categories(raw: &Value, only_first: bool) -> Result<Tally, SchemaError> {
    let mut tally = Tally::new();
    for (label, weight) in category_labels(raw, only_first)? {
        tally.add(label, weight);
    }
    Ok(tally)
}

/// True when `target` is one of the labels in `raw`, whatever its layout.
pub fn matches_category(raw: &Value, target: &str) -> Result<bool, SchemaError> {
    Ok(category_labels(raw, false)?
        .into_iter()
        .any(|(label, _)| label == target))
}

fn category_labels(raw: &Value, only_first: bool) -> Result<Vec<(&str, f64)>, SchemaError> {
    match raw {
        Value::String(label) => Ok(vec![(label.as_str(), BARE_CATEGORY_WEIGHT)]),
        Value::Object(_) => {
            let label = category_text(raw, "category")?;
            Ok(vec![(label, STRUCTURED_CATEGORY_WEIGHT)])
        }
        Value::Array(entries) => {
            let limit = if only_first { 1 } else { entries.len() };
            entries
                .iter()
                .take(limit)
                .enumerate()
                .map(|(index, entry)| {
                    let field = format!("category[{index}]");
                    match entry {
                        Value::String(label) => Ok((label.as_str(), STRUCTURED_CATEGORY_WEIGHT)),
                        Value::Object(_) => {
                            category_text(entry, &field).map(|label| (label, STRUCTURED_CATEGORY_WEIGHT))
                        }
                        other => Err(SchemaError::shape(
                            field,
                            "string or object with `text`",
                            json_kind(other),
                        )),
                    }
                })
                .collect()
        }
        other => Err(SchemaError::shape(
            "category",
            "string, object or array",
            json_kind(other),
        )),
    }
}

fn category_text<'a>(entry: &'a Value, field: &str) -> Result<&'a str, SchemaError> {
    required_str(entry, "text", &format!("{field}.text"))
}

/// The document's primary `code.text`.
pub fn code_text(document: &Value) -> Result<&str, SchemaError> {
    let code = document
        .get("code")
        .ok_or_else(|| SchemaError::missing("code"))?;
    required_str(code, "text", "code.text")
}

/// Builds a converted [`ValueQuantity`] from a raw `valueQuantity` object.
///
/// `code` and `system` are ignored; `name` is always `fallback_name`, since
/// the raw object carries no name of its own.
pub fn get_value_quantity(raw: &Value, fallback_name: &str) -> Result<ValueQuantity, SchemaError> {
    quantity_at(raw, fallback_name, "valueQuantity")
}

fn quantity_at(raw: &Value, name: &str, field: &str) -> Result<ValueQuantity, SchemaError> {
    if !raw.is_object() {
        return Err(SchemaError::shape(field, "object", json_kind(raw)));
    }
    let value = match raw.get("value") {
        Some(value) => value.as_f64().ok_or_else(|| {
            SchemaError::shape(format!("{field}.value"), "number", json_kind(value))
        })?,
        None => return Err(SchemaError::missing(format!("{field}.value"))),
    };
    let unit = required_str(raw, "unit", &format!("{field}.unit"))?;
    let (value, unit) = convert(value, unit);
    Ok(ValueQuantity::new(value, unit, name))
}

/// Measured values of a document, in document order.
///
/// `Ok(None)` when the document has neither a `valueQuantity` nor a
/// non-empty `component` list (textual results, for instance).
pub fn resolve_values(document: &Value, code: &str) -> Result<Option<Vec<ValueQuantity>>, SchemaError> {
    if let Some(quantity) = document.get("valueQuantity") {
        return quantity_at(quantity, code, "valueQuantity").map(|quantity| Some(vec![quantity]));
    }

    let Some(components) = document.get("component") else {
        return Ok(None);
    };
    let components = components
        .as_array()
        .ok_or_else(|| SchemaError::shape("component", "array", json_kind(components)))?;
    if components.is_empty() {
        return Ok(None);
    }

    components
        .iter()
        .enumerate()
        .map(|(index, component)| {
            let field = format!("component[{index}]");
            let name = component
                .get("code")
                .ok_or_else(|| SchemaError::missing(format!("{field}.code")))
                .and_then(|code| required_str(code, "text", &format!("{field}.code.text")))?;
            let quantity = component
                .get("valueQuantity")
                .ok_or_else(|| SchemaError::missing(format!("{field}.valueQuantity")))?;
            quantity_at(quantity, name, &format!("{field}.valueQuantity"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Resolves the first entry of a `referenceRange` list.
///
/// Structured `low`/`high` bounds are taken as they are and the text is
/// rebuilt from them; a text-only entry is kept unparsed until
/// [`ReferenceRange::range`] is called.
pub fn get_reference_range(raw: &Value) -> Result<ReferenceRange, SchemaError> {
    let entries = raw
        .as_array()
        .ok_or_else(|| SchemaError::shape("referenceRange", "array", json_kind(raw)))?;
    let entry = entries
        .first()
        .ok_or_else(|| SchemaError::missing("referenceRange[0]"))?;

    let low = entry
        .get("low")
        .map(|bound| quantity_at(bound, "low", "referenceRange[0].low"))
        .transpose()?;
    let high = entry
        .get("high")
        .map(|bound| quantity_at(bound, "high", "referenceRange[0].high"))
        .transpose()?;
    let stated = match entry.get("text") {
        Some(Value::String(text)) => Some(text.as_str()),
        Some(other) => {
            return Err(SchemaError::shape(
                "referenceRange[0].text",
                "string",
                json_kind(other),
            ))
        }
        None => None,
    };

    let text = match (&low, &high, stated) {
        (Some(low), Some(high), _) => bounded_text(
            &format!("{} - {}", bound_text(low.value), bound_text(high.value)),
            &low.unit,
        ),
        (_, _, Some(text)) => text.to_string(),
        (Some(low), None, None) => bounded_text(&format!(">= {}", bound_text(low.value)), &low.unit),
        (None, Some(high), None) => bounded_text(&format!("<= {}", bound_text(high.value)), &high.unit),
        (None, None, None) => return Err(SchemaError::missing("referenceRange[0].text")),
    };

    Ok(ReferenceRange { low, high, text })
}

fn bounded_text(bounds: &str, unit: &str) -> String {
    if unit.is_empty() {
        bounds.to_string()
    } else {
        format!("{bounds} {unit}")
    }
}

/// Two decimals at most, trailing zeros dropped, so converted bounds such as
/// `50 kg` read `110` rather than `110.00000000000001`.
fn bound_text(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn required_str<'a>(object: &'a Value, key: &str, field: &str) -> Result<&'a str, SchemaError> {
    match object.get(key) {
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(other) => Err(SchemaError::shape(field, "string", json_kind(other))),
        None => Err(SchemaError::missing(field)),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
