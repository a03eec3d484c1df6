//! Free-text quantity parsing and unit normalization.
//!
//! Quantities in recipes and in the pantry are plain strings such as
//! `"2.4 dl"`, `"500g"` or `"2 green chilies"`. They are parsed into a value and
//! a unit symbol, converted to one of three base families (grams, milliliters,
//! pieces) for arithmetic, and formatted back into the most readable unit.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParsedQuantity {
    pub value: f64,
    pub unit: String,
}

impl ParsedQuantity {
    pub fn new(value: f64, unit: &str) -> Self {
        Self { value, unit: unit.to_string() }
    }
}

/// The three measurement families quantities are normalized into.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "pcs")]
    Piece,
}

impl BaseUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            BaseUnit::Gram => "g",
            BaseUnit::Milliliter => "ml",
            BaseUnit::Piece => "pcs",
        }
    }
}

impl fmt::Display for BaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BaseQuantity {
    pub value: f64,
    pub unit: BaseUnit,
}

/// Unit symbol, base family, and rate to the base unit.
const CONVERSIONS: &[(&str, BaseUnit, f64)] = &[
    // Volume
    ("ml", BaseUnit::Milliliter, 1.0),
    ("cl", BaseUnit::Milliliter, 10.0),
    ("dl", BaseUnit::Milliliter, 100.0),
    ("l", BaseUnit::Milliliter, 1000.0),
    ("tsp", BaseUnit::Milliliter, 5.0),
    ("tsk", BaseUnit::Milliliter, 5.0), // Swedish teaspoon
    ("tbsp", BaseUnit::Milliliter, 15.0),
    ("msk", BaseUnit::Milliliter, 15.0), // Swedish tablespoon
    // Mass
    ("g", BaseUnit::Gram, 1.0),
    ("hg", BaseUnit::Gram, 100.0),
    ("kg", BaseUnit::Gram, 1000.0),
    // Counted
    ("pcs", BaseUnit::Piece, 1.0),
    ("st", BaseUnit::Piece, 1.0), // Swedish "styck"
    ("can", BaseUnit::Piece, 1.0),
];

fn lookup(unit: &str) -> Option<(BaseUnit, f64)> {
    CONVERSIONS
        .iter()
        .find(|(symbol, _, _)| *symbol == unit)
        .map(|(_, base, rate)| (*base, *rate))
}

fn quantity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d*[.,]?\d+)\s*(\p{Alphabetic}*)").expect("quantity pattern is valid")
    })
}

/// Parses a quantity string such as `"2.4 dl"` into value and unit.
///
/// A word after the number that is not a known unit (`"2 green chilies"`) is
/// treated as a description: the number is kept and the unit becomes `pcs`.
/// Returns `None` only when no leading number can be found.
pub fn parse(text: &str) -> Option<ParsedQuantity> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let captures = quantity_pattern().captures(&normalized)?;
    let value: f64 = captures.get(1)?.as_str().replace(',', ".").parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let token = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    let unit = if !token.is_empty() && lookup(token).is_some() {
        token
    } else {
        BaseUnit::Piece.symbol()
    };

    Some(ParsedQuantity::new(value, unit))
}

/// Converts to the base unit of the quantity's family. Unknown units become pieces.
pub fn to_base_unit(parsed: &ParsedQuantity) -> BaseQuantity {
    match lookup(&parsed.unit.to_lowercase()) {
        Some((unit, rate)) => BaseQuantity { value: parsed.value * rate, unit },
        None => BaseQuantity { value: parsed.value, unit: BaseUnit::Piece },
    }
}

/// Parses and converts in one step.
pub fn parse_base(text: &str) -> Option<BaseQuantity> {
    parse(text).map(|parsed| to_base_unit(&parsed))
}

/// Rounds to the two decimals used for display.
pub(crate) fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // avoid printing "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Formats a base-unit value using the most readable unit:
/// 1500 g becomes `"1.5 kg"`, 400 ml becomes `"4 dl"`, pieces are a bare number.
pub fn format(value: f64, unit: BaseUnit) -> String {
    match unit {
        BaseUnit::Gram if value >= 1000.0 => format!("{} kg", round2(value / 1000.0)),
        BaseUnit::Milliliter if value >= 1000.0 => format!("{} l", round2(value / 1000.0)),
        BaseUnit::Milliliter if value >= 100.0 => format!("{} dl", round2(value / 100.0)),
        BaseUnit::Piece => format!("{}", round2(value)),
        _ => format!("{} {}", round2(value), unit.symbol()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_with_unit() {
        assert_eq!(parse("2.4 dl"), Some(ParsedQuantity::new(2.4, "dl")));
        assert_eq!(parse("2,5dl"), Some(ParsedQuantity::new(2.5, "dl")));
        assert_eq!(parse("  500 G "), Some(ParsedQuantity::new(500.0, "g")));
        assert_eq!(parse(".5 l"), Some(ParsedQuantity::new(0.5, "l")));
    }

    #[test]
    fn test_parse_descriptive_words_become_pieces() {
        assert_eq!(parse("2 green chilies"), Some(ParsedQuantity::new(2.0, "pcs")));
        assert_eq!(parse("3"), Some(ParsedQuantity::new(3.0, "pcs")));
        assert_eq!(parse("1 can crushed tomatoes"), Some(ParsedQuantity::new(1.0, "can")));
        assert_eq!(parse("2 msk"), Some(ParsedQuantity::new(2.0, "msk")));
    }

    #[test]
    fn test_parse_without_number_fails() {
        assert_eq!(parse("abc"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("a pinch"), None);
    }

    #[test]
    fn test_to_base_unit() {
        let base = to_base_unit(&ParsedQuantity::new(1.0, "kg"));
        assert_eq!(base, BaseQuantity { value: 1000.0, unit: BaseUnit::Gram });

        let base = to_base_unit(&ParsedQuantity::new(2.0, "tbsp"));
        assert_eq!(base, BaseQuantity { value: 30.0, unit: BaseUnit::Milliliter });

        let base = to_base_unit(&ParsedQuantity::new(4.0, "cloves"));
        assert_eq!(base, BaseQuantity { value: 4.0, unit: BaseUnit::Piece });
    }

    #[test]
    fn test_format_promotes_units() {
        assert_eq!(format(1000.0, BaseUnit::Gram), "1 kg");
        assert_eq!(format(1500.0, BaseUnit::Gram), "1.5 kg");
        assert_eq!(format(250.0, BaseUnit::Gram), "250 g");
        assert_eq!(format(400.0, BaseUnit::Milliliter), "4 dl");
        assert_eq!(format(2500.0, BaseUnit::Milliliter), "2.5 l");
        assert_eq!(format(30.0, BaseUnit::Milliliter), "30 ml");
        assert_eq!(format(2.0, BaseUnit::Piece), "2");
        assert_eq!(format(1.0 / 3.0, BaseUnit::Piece), "0.33");
    }

    #[test]
    fn test_kilogram_round_trip() {
        let base = to_base_unit(&parse("1 kg").unwrap());
        assert_eq!(format(base.value, base.unit), "1 kg");
    }
}
