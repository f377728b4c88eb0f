//! Parser for free-form reference-range text such as `"<7.5"` or `"140 - 400 K/uL"`.

use crate::RangeParseError;

/// Lower bound of a range that is open below.
pub const NEG_INF: f64 = f64::NEG_INFINITY;
/// Upper bound of a range that is open above.
pub const POS_INF: f64 = f64::INFINITY;

/// Parses reference-range text into `(low, high)`.
///
/// Accepted forms, each optionally followed by a unit word:
///
/// - `<X`, `<=X` give `(NEG_INF, X)`
/// - `>X`, `>=X` give `(X, POS_INF)`
/// - `=X` gives `(X, X)`
/// - `L - H` gives `(L, H)`
pub fn parse_range_text(text: &str) -> Result<(f64, f64), RangeParseError> {
    let unrecognized = || RangeParseError::Unrecognized {
        text: text.to_string(),
    };
    let trimmed = text.trim();

    if let Some(rest) = trimmed
        .strip_prefix("<=")
        .or_else(|| trimmed.strip_prefix('<'))
    {
        let high = parse_bound(rest).ok_or_else(unrecognized)?;
        return Ok((NEG_INF, high));
    }

    if let Some(rest) = trimmed
        .strip_prefix(">=")
        .or_else(|| trimmed.strip_prefix('>'))
    {
        let low = parse_bound(rest).ok_or_else(unrecognized)?;
        return Ok((low, POS_INF));
    }

    if let Some(rest) = trimmed.strip_prefix('=') {
        let exact = parse_bound(rest).ok_or_else(unrecognized)?;
        return Ok((exact, exact));
    }

    let (low, rest) = leading_number(trimmed).ok_or_else(unrecognized)?;
    let rest = rest
        .trim_start()
        .strip_prefix('-')
        .ok_or_else(unrecognized)?;
    let high = parse_bound(rest).ok_or_else(unrecognized)?;
    Ok((low, high))
}

/// A number followed by nothing or by a unit word.
fn parse_bound(text: &str) -> Option<f64> {
    let (value, rest) = leading_number(text.trim_start())?;
    let unit = rest.trim();
    if unit.is_empty() {
        return Some(value);
    }
    let separated = rest.starts_with(char::is_whitespace);
    let numeric_tail = unit.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    (separated && !numeric_tail).then_some(value)
}

fn leading_number(text: &str) -> Option<(f64, &str)> {
    let sign_len = usize::from(text.starts_with(['-', '+']));
    let end = text[sign_len..]
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map_or(text.len(), |offset| offset + sign_len);
    let (number, rest) = text.split_at(end);
    number.parse().ok().map(|value| (value, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_prefixes() {
        assert_eq!(parse_range_text("<7.5"), Ok((NEG_INF, 7.5)));
        assert_eq!(parse_range_text("<=7.6"), Ok((NEG_INF, 7.6)));
        assert_eq!(parse_range_text(">7.7"), Ok((7.7, POS_INF)));
        assert_eq!(parse_range_text(">=7.8"), Ok((7.8, POS_INF)));
        assert_eq!(parse_range_text("=7.9"), Ok((7.9, 7.9)));
    }

    #[test]
    fn two_sided_range_discards_unit() {
        assert_eq!(parse_range_text("140 - 400 K/uL"), Ok((140.0, 400.0)));
        assert_eq!(parse_range_text("3.5-5.0"), Ok((3.5, 5.0)));
        assert_eq!(parse_range_text(" 0.6 - 1.3 mg/dL "), Ok((0.6, 1.3)));
    }

    #[test]
    fn tolerates_spacing_and_trailing_units() {
        assert_eq!(parse_range_text("< 200 mg/dL"), Ok((NEG_INF, 200.0)));
        assert_eq!(parse_range_text(">= 60 mL/min"), Ok((60.0, POS_INF)));
        assert_eq!(parse_range_text("<-1"), Ok((NEG_INF, -1.0)));
    }

    #[test]
    fn rejects_unrecognized_text() {
        for text in ["", "negative", "<", "140 -", "140 400", "<7.5 - 8", "7.5mmol", "1.2.3 - 4"] {
            assert_eq!(
                parse_range_text(text),
                Err(RangeParseError::Unrecognized {
                    text: text.to_string()
                }),
                "{text:?} should not parse"
            );
        }
    }
}
