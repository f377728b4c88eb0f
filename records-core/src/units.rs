//! Fixed US-locale display units.

pub const KG_TO_LB: f64 = 2.2;

/// Converts a raw `(value, unit)` pair into display units.
///
/// `kg` becomes `lb` and `Cel` becomes `Fah`; every other unit passes through.
pub fn convert(value: f64, unit: &str) -> (f64, String) {
    match unit {
        "kg" => (value * KG_TO_LB, "lb".to_string()),
        "Cel" => (value * 9.0 / 5.0 + 32.0, "Fah".to_string()),
        other => (value, other.to_string()),
    }
}
