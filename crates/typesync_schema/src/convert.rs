//! Value Converter Registry
//!
//! Turns a raw value persisted by the backend back into a typed runtime value.
//!
//! Converters are grouped by target type. Within a group the first converter
//! whose [`ValueConverter::can_convert`] accepts the request wins, so
//! registration order is significant: register custom converters before
//! [`ValueConverterRegistry::register_defaults`] to override the built-ins,
//! after it to act as a fallback.
//!
//! Conversion is tolerant. A null or unparsable raw value converts to `None`
//! instead of failing, because backend records are often partially populated.

use crate::definition::{DeclaredType, ValueType};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// UI hints that mark a string as rich text.
pub const RICH_TEXT_HINTS: &[&str] = &["rte", "Richtext editor", "Umbraco.TinyMCEv3"];

/// A converted runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    String(String),
    Html(String),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) | TypedValue::Html(s) => write!(f, "{}", s),
            TypedValue::Float32(v) => write!(f, "{}", v),
            TypedValue::Float64(v) => write!(f, "{}", v),
            TypedValue::Decimal(v) => write!(f, "{}", v),
        }
    }
}

/// Converts raw stored values to one or more target types.
pub trait ValueConverter: Send + Sync {
    /// Whether this converter handles `stored` -> `target` under `ui_hint`.
    fn can_convert(&self, ui_hint: Option<&str>, stored: &DeclaredType, target: &DeclaredType) -> bool;

    /// Convert `raw`; `None` for null or unparsable input.
    fn convert(&self, raw: &Value, target: &DeclaredType) -> Option<TypedValue>;
}

/// Text form of a raw value, `None` for null.
fn raw_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Accepts invariant, dot-decimal float syntax only: optional sign, digits
/// with at most one `.`, optional exponent. Surrounding whitespace is allowed.
fn invariant_float_text(raw: &Value) -> Option<String> {
    let text = raw_text(raw)?;
    let trimmed = text.trim();

    let (mantissa, exponent) = match trimmed.find(['e', 'E']) {
        Some(pos) => (&trimmed[..pos], Some(&trimmed[pos + 1..])),
        None => (trimmed, None),
    };

    let digits = mantissa.strip_prefix(['+', '-']).unwrap_or(mantissa);
    let mut seen_digit = false;
    let mut seen_point = false;
    for ch in digits.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }

    if let Some(exponent) = exponent {
        let exp_digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if exp_digits.is_empty() || !exp_digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    Some(trimmed.to_string())
}

fn is_string(declared: &DeclaredType) -> bool {
    declared.value_type == ValueType::String
}

/// Plain string passthrough for string targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValueConverter;

impl ValueConverter for StringValueConverter {
    fn can_convert(&self, _ui_hint: Option<&str>, _stored: &DeclaredType, target: &DeclaredType) -> bool {
        is_string(target)
    }

    fn convert(&self, raw: &Value, _target: &DeclaredType) -> Option<TypedValue> {
        raw_text(raw).map(TypedValue::String)
    }
}

/// Stored strings rendered as markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextValueConverter;

impl ValueConverter for RichTextValueConverter {
    fn can_convert(&self, _ui_hint: Option<&str>, stored: &DeclaredType, target: &DeclaredType) -> bool {
        is_string(stored) && target.value_type == ValueType::Html
    }

    fn convert(&self, raw: &Value, _target: &DeclaredType) -> Option<TypedValue> {
        raw_text(raw).map(TypedValue::Html)
    }
}

/// Rich-text editor values read into a string target become markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextHintConverter;

impl ValueConverter for RichTextHintConverter {
    fn can_convert(&self, ui_hint: Option<&str>, stored: &DeclaredType, target: &DeclaredType) -> bool {
        let rich = ui_hint.map_or(false, |hint| RICH_TEXT_HINTS.contains(&hint.trim()));
        rich && is_string(stored) && is_string(target)
    }

    fn convert(&self, raw: &Value, _target: &DeclaredType) -> Option<TypedValue> {
        raw_text(raw).map(TypedValue::Html)
    }
}

/// Text-stored `f32`/`f64` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatingBinaryPointConverter;

impl ValueConverter for FloatingBinaryPointConverter {
    fn can_convert(&self, _ui_hint: Option<&str>, stored: &DeclaredType, target: &DeclaredType) -> bool {
        is_string(stored) && matches!(target.value_type, ValueType::Float32 | ValueType::Float64)
    }

    fn convert(&self, raw: &Value, target: &DeclaredType) -> Option<TypedValue> {
        let text = invariant_float_text(raw)?;
        match target.value_type {
            ValueType::Float32 => text.parse::<f32>().ok().map(TypedValue::Float32),
            ValueType::Float64 => text.parse::<f64>().ok().map(TypedValue::Float64),
            _ => None,
        }
    }
}

/// Text-stored `decimal` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatingDecimalPointConverter;

impl ValueConverter for FloatingDecimalPointConverter {
    fn can_convert(&self, _ui_hint: Option<&str>, stored: &DeclaredType, target: &DeclaredType) -> bool {
        is_string(stored) && target.value_type == ValueType::Decimal
    }

    fn convert(&self, raw: &Value, target: &DeclaredType) -> Option<TypedValue> {
        if target.value_type != ValueType::Decimal {
            return None;
        }
        let text = invariant_float_text(raw)?;
        let text = text.strip_prefix('+').unwrap_or(&text);
        let parsed = if text.contains(['e', 'E']) {
            Decimal::from_scientific(text)
        } else {
            Decimal::from_str(text)
        };
        parsed.ok().map(TypedValue::Decimal)
    }
}

/// Registry resolving `(ui hint, stored type, target type)` to a converter.
#[derive(Default)]
pub struct ValueConverterRegistry {
    converters: HashMap<DeclaredType, Vec<Arc<dyn ValueConverter>>>,
}

impl ValueConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the built-in converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Append the built-in converters to their target groups.
    pub fn register_defaults(&mut self) {
        let rich_hint: Arc<dyn ValueConverter> = Arc::new(RichTextHintConverter);
        let string: Arc<dyn ValueConverter> = Arc::new(StringValueConverter);
        let rich_text: Arc<dyn ValueConverter> = Arc::new(RichTextValueConverter);
        let binary: Arc<dyn ValueConverter> = Arc::new(FloatingBinaryPointConverter);
        let decimal: Arc<dyn ValueConverter> = Arc::new(FloatingDecimalPointConverter);

        self.register(DeclaredType::string(), Arc::clone(&rich_hint));
        self.register(DeclaredType::string(), string);
        self.register(DeclaredType::html(), rich_text);

        for value_type in [ValueType::Float32, ValueType::Float64] {
            self.register(DeclaredType::new(value_type.clone()), Arc::clone(&binary));
            self.register(DeclaredType::optional(value_type), Arc::clone(&binary));
        }
        self.register(DeclaredType::decimal(), Arc::clone(&decimal));
        self.register(DeclaredType::decimal().or_none(), decimal);
    }

    /// Append a converter to the `target` group.
    pub fn register(&mut self, target: DeclaredType, converter: Arc<dyn ValueConverter>) {
        self.converters.entry(target).or_default().push(converter);
    }

    /// Number of converters registered for `target`.
    pub fn group_len(&self, target: &DeclaredType) -> usize {
        self.converters.get(target).map_or(0, Vec::len)
    }

    /// First converter in the `target` group that accepts the request.
    pub fn resolve(
        &self,
        ui_hint: Option<&str>,
        stored: &DeclaredType,
        target: &DeclaredType,
    ) -> Option<&dyn ValueConverter> {
        self.converters
            .get(target)?
            .iter()
            .map(|c| c.as_ref())
            .find(|c| c.can_convert(ui_hint, stored, target))
    }

    /// Resolve and convert in one step. `None` if no converter applies or
    /// the raw value does not convert.
    pub fn convert(
        &self,
        ui_hint: Option<&str>,
        stored: &DeclaredType,
        target: &DeclaredType,
        raw: &Value,
    ) -> Option<TypedValue> {
        self.resolve(ui_hint, stored, target)?.convert(raw, target)
    }
}

impl fmt::Debug for ValueConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups: Vec<_> = self
            .converters
            .iter()
            .map(|(target, group)| (target.to_string(), group.len()))
            .collect();
        groups.sort();
        f.debug_struct("ValueConverterRegistry")
            .field("groups", &groups)
            .finish()
    }
}

static DEFAULT_CONVERTERS: Lazy<ValueConverterRegistry> = Lazy::new(ValueConverterRegistry::with_defaults);

/// The process-wide built-in registry.
pub fn default_converters() -> &'static ValueConverterRegistry {
    &DEFAULT_CONVERTERS
}
