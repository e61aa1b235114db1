//! Property tests for stored-value conversion.
//!
//! Conversion never fails: any raw text either parses with invariant
//! dot-decimal rules or converts to `None`.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use typesync_schema::{default_converters, DeclaredType, TypedValue};

fn convert(target: &DeclaredType, raw: &str) -> Option<TypedValue> {
    default_converters().convert(None, &DeclaredType::string(), target, &Value::String(raw.to_string()))
}

/// Comma decimals are locale syntax and must not parse.
#[test]
fn test_comma_decimal_rejected() {
    assert_eq!(convert(&DeclaredType::float64(), "3,14"), None);
    assert_eq!(convert(&DeclaredType::decimal(), "1.000,5"), None);
}

/// Special float spellings are not part of the invariant syntax.
#[test]
fn test_non_numeric_spellings_rejected() {
    for raw in ["NaN", "inf", "-Infinity", "", " ", ".", "1e", "--1"] {
        assert_eq!(convert(&DeclaredType::float64(), raw), None, "raw: {:?}", raw);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    /// Arbitrary text never panics, for every numeric target.
    #[test]
    fn test_any_text_never_panics(raw in ".{0,64}") {
        let _ = convert(&DeclaredType::float32(), &raw);
        let _ = convert(&DeclaredType::float64(), &raw);
        let _ = convert(&DeclaredType::decimal(), &raw);
        let _ = convert(&DeclaredType::decimal().or_none(), &raw);
    }

    /// Text containing letters other than an exponent marker never converts.
    #[test]
    fn test_letters_convert_to_none(raw in "[0-9]{0,4}[a-df-zA-DF-Z]{1,8}[0-9]{0,4}") {
        prop_assert_eq!(convert(&DeclaredType::float64(), &raw), None);
        prop_assert_eq!(convert(&DeclaredType::decimal(), &raw), None);
    }

    /// Any finite f64 written with `{}` parses back to itself, padded or not.
    #[test]
    fn test_formatted_f64_parses(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let raw = format!("  {}  ", value);
        prop_assert_eq!(convert(&DeclaredType::float64(), &raw), Some(TypedValue::Float64(value)));
    }

    /// Fixed-point decimal text round-trips exactly.
    #[test]
    fn test_fixed_point_decimal_parses(int_part in 0u32..1_000_000, frac in 0u32..10_000, negative in any::<bool>()) {
        let raw = format!("{}{}.{:04}", if negative { "-" } else { "" }, int_part, frac);
        let expected = Decimal::from_str(&raw).unwrap();
        prop_assert_eq!(convert(&DeclaredType::decimal(), &raw), Some(TypedValue::Decimal(expected)));
    }
}
