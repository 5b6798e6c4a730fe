//! Value converters and the built-in coercion rules.

use std::{borrow::Cow, fmt, rc::Rc};

use crate::{
    error::ConversionError,
    value::{Value, ValueType},
};

/// Culture handed to converters. The invariant culture has an empty name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Culture {
    name: Cow<'static, str>,
}

impl Culture {
    pub const fn invariant() -> Self {
        Self {
            name: Cow::Borrowed(""),
        }
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_invariant(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invariant() {
            f.write_str("invariant")
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Two-way value transformation between source and target.
///
/// Either direction may return [`Value::Deferred`] to deliver its result
/// later. Returning [`ConversionError::Unsupported`] is surfaced to the
/// caller of the update as an error; any other error rejects the update.
pub trait ValueConverter {
    fn convert(
        &self,
        value: Value,
        target: ValueType,
        parameter: Option<&Value>,
        culture: &Culture,
    ) -> Result<Value, ConversionError>;

    fn convert_back(
        &self,
        value: Value,
        target: ValueType,
        parameter: Option<&Value>,
        culture: &Culture,
    ) -> Result<Value, ConversionError> {
        let _ = (value, target, parameter, culture);
        Err(ConversionError::Unsupported)
    }
}

type ConvertFn = Rc<dyn Fn(Value, ValueType) -> Result<Value, ConversionError>>;

/// A converter built from closures.
#[derive(Clone)]
pub struct FnConverter {
    forward: ConvertFn,
    back: Option<ConvertFn>,
}

impl FnConverter {
    pub fn new(
        forward: impl Fn(Value, ValueType) -> Result<Value, ConversionError> + 'static,
    ) -> Self {
        Self {
            forward: Rc::new(forward),
            back: None,
        }
    }

    pub fn with_back(
        mut self,
        back: impl Fn(Value, ValueType) -> Result<Value, ConversionError> + 'static,
    ) -> Self {
        self.back = Some(Rc::new(back));
        self
    }
}

impl ValueConverter for FnConverter {
    fn convert(
        &self,
        value: Value,
        target: ValueType,
        _parameter: Option<&Value>,
        _culture: &Culture,
    ) -> Result<Value, ConversionError> {
        (self.forward)(value, target)
    }

    fn convert_back(
        &self,
        value: Value,
        target: ValueType,
        _parameter: Option<&Value>,
        _culture: &Culture,
    ) -> Result<Value, ConversionError> {
        match &self.back {
            Some(back) => back(value, target),
            None => Err(ConversionError::Unsupported),
        }
    }
}

/// Negates booleans in both directions.
#[derive(Clone, Copy, Debug, Default)]
pub struct InvertBool;

impl InvertBool {
    fn invert(value: Value) -> Result<Value, ConversionError> {
        match coerce(value, ValueType::Bool)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(ConversionError::mismatch(other.type_name(), "bool")),
        }
    }
}

impl ValueConverter for InvertBool {
    fn convert(
        &self,
        value: Value,
        _target: ValueType,
        _parameter: Option<&Value>,
        _culture: &Culture,
    ) -> Result<Value, ConversionError> {
        Self::invert(value)
    }

    fn convert_back(
        &self,
        value: Value,
        _target: ValueType,
        _parameter: Option<&Value>,
        _culture: &Culture,
    ) -> Result<Value, ConversionError> {
        Self::invert(value)
    }
}

/// What a null becomes when written to a property of type `target`.
pub fn null_substitute(target: ValueType) -> Value {
    match target {
        ValueType::Str => Value::Str(String::new()),
        other => other.default_value(),
    }
}

/// Convert `value` to `target` with the built-in rules.
///
/// - Values already assignable pass through unchanged.
/// - Numbers convert between each other when the value fits; floats round
///   half to even when narrowed to integers.
/// - Booleans become `1`/`0`, numbers become `true` when non-zero.
/// - Primitives format as strings; strings parse into primitives after
///   trimming, booleans case-insensitively.
/// - Objects only convert to their own types and base types.
pub fn coerce(value: Value, target: ValueType) -> Result<Value, ConversionError> {
    if target.is_assignable_from(&value) {
        return Ok(value);
    }
    let converted = match (&value, target) {
        (Value::Null, target) => Some(null_substitute(target)),
        (_, ValueType::Str) => format_primitive(&value).map(Value::Str),
        (Value::Str(text), target) => parse_primitive(text.trim(), target),
        (_, target) => Number::of(&value).and_then(|n| n.to(target)),
    };
    converted.ok_or_else(|| ConversionError::mismatch(value.type_name(), target.name()))
}

fn format_primitive(value: &Value) -> Option<String> {
    Some(match value {
        Value::Bool(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Str(v) => v.clone(),
        Value::Null | Value::Object(_) | Value::Deferred(_) => return None,
    })
}

fn parse_primitive(text: &str, target: ValueType) -> Option<Value> {
    match target {
        ValueType::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        ValueType::I32 => text.parse().ok().map(Value::I32),
        ValueType::I64 => text.parse().ok().map(Value::I64),
        ValueType::F32 => text.parse().ok().map(Value::F32),
        ValueType::F64 => text.parse().ok().map(Value::F64),
        ValueType::Any | ValueType::Str | ValueType::Object(_) => None,
    }
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Number> {
        match value {
            Value::Bool(v) => Some(Number::Int(i64::from(*v))),
            Value::I32(v) => Some(Number::Int(i64::from(*v))),
            Value::I64(v) => Some(Number::Int(*v)),
            Value::F32(v) => Some(Number::Float(f64::from(*v))),
            Value::F64(v) => Some(Number::Float(*v)),
            _ => None,
        }
    }

    fn to(self, target: ValueType) -> Option<Value> {
        match (self, target) {
            (Number::Int(v), ValueType::Bool) => Some(Value::Bool(v != 0)),
            (Number::Float(v), ValueType::Bool) => Some(Value::Bool(v != 0.0)),
            (Number::Int(v), ValueType::I32) => i32::try_from(v).ok().map(Value::I32),
            (Number::Int(v), ValueType::I64) => Some(Value::I64(v)),
            (Number::Int(v), ValueType::F32) => Some(Value::F32(v as f32)),
            (Number::Int(v), ValueType::F64) => Some(Value::F64(v as f64)),
            (Number::Float(v), ValueType::I32) => {
                round_to_int(v, f64::from(i32::MIN), f64::from(i32::MAX))
                    .map(|r| Value::I32(r as i32))
            }
            (Number::Float(v), ValueType::I64) => {
                // i64::MAX is not representable; 2^63 is the first value past it.
                round_to_int(v, -9_223_372_036_854_775_808.0, 9_223_372_036_854_774_784.0)
                    .map(|r| Value::I64(r as i64))
            }
            (Number::Float(v), ValueType::F32) => {
                let narrowed = v as f32;
                (v.is_nan() || narrowed.is_finite() == v.is_finite()).then_some(Value::F32(narrowed))
            }
            (Number::Float(v), ValueType::F64) => Some(Value::F64(v)),
            _ => None,
        }
    }
}

fn round_to_int(value: f64, min: f64, max: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round_ties_even();
    (min..=max).contains(&rounded).then_some(rounded)
}
