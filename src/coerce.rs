//! Numeric coercion of extracted text.
//!
//! Both coercions are total: a value that does not parse is kept verbatim as
//! [`Coerced::Text`], never turned into a null or a different number type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A text value after numeric coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coerced {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Coerced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coerced::Int(v) => write!(f, "{}", v),
            Coerced::Float(v) => write!(f, "{}", v),
            Coerced::Text(s) => f.write_str(s),
        }
    }
}

/// Parses `text` as an integer, keeping the original text when it does not parse.
///
/// Surrounding whitespace is ignored for the parse but preserved in the fallback.
pub fn coerce_int(text: &str) -> Coerced {
    match text.trim().parse::<i64>() {
        Ok(v) => Coerced::Int(v),
        Err(_) => Coerced::Text(text.to_string()),
    }
}

/// Parses `text` as a float, keeping the original text when it does not parse.
///
/// Non-finite results (`inf`, `nan`) have no JSON form and fall back to text.
pub fn coerce_float(text: &str) -> Coerced {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Coerced::Float(v),
        _ => Coerced::Text(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recoerce_int(value: Coerced) -> Coerced {
        match value {
            Coerced::Text(s) => coerce_int(&s),
            other => other,
        }
    }

    fn recoerce_float(value: Coerced) -> Coerced {
        match value {
            Coerced::Text(s) => coerce_float(&s),
            other => other,
        }
    }

    const SAMPLES: &[&str] = &[
        "42", " 7 ", "-3", "4.29999999999", "1200円", "", "abc", "1e3", "12,345", "inf", "ＮＡ",
    ];

    #[test]
    fn int_parses_or_keeps_text() {
        assert_eq!(coerce_int("42"), Coerced::Int(42));
        assert_eq!(coerce_int(" 7 "), Coerced::Int(7));
        assert_eq!(coerce_int("4.3"), Coerced::Text("4.3".into()));
        assert_eq!(coerce_int("1200円"), Coerced::Text("1200円".into()));
    }

    #[test]
    fn float_parses_or_keeps_text() {
        assert_eq!(coerce_float("4.5"), Coerced::Float(4.5));
        assert_eq!(coerce_float("12"), Coerced::Float(12.0));
        assert_eq!(coerce_float("-"), Coerced::Text("-".into()));
        assert_eq!(coerce_float("inf"), Coerced::Text("inf".into()));
    }

    #[test]
    fn coercion_is_idempotent() {
        for sample in SAMPLES {
            let once = coerce_int(sample);
            assert_eq!(recoerce_int(once.clone()), once, "int: {sample:?}");

            let once = coerce_float(sample);
            assert_eq!(recoerce_float(once.clone()), once, "float: {sample:?}");
        }
    }

    #[test]
    fn serializes_untagged() {
        let values = vec![
            Coerced::Int(3),
            Coerced::Float(4.5),
            Coerced::Text("不明".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[3,4.5,"不明"]"#);
    }
}
