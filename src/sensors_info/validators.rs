//! Declarative checks for flat string-keyed request records.
//!
//! A [`RecordSpec`] is an ordered list of [`FieldSpec`]s plus the cross-field
//! [`RangeCheck`]s; [`check`] interprets it against a [`RawReq`] and yields
//! either the coerced values or every error it detected.

use super::range::Range;
use crate::shared::errors::{AppError, AppErrors, ErrorType};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Untyped request as received from a query string, form post or JSON body.
pub type RawReq = HashMap<String, String>;

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+(\.\d*)?$").expect("numeric pattern"));
static NON_NEG_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("integer pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Num(f64),
    Int(u64),
}

impl FieldValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Num(n) => Some(*n),
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Str(_) => None,
        }
    }

    fn display(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Num(n) => n.to_string(),
            FieldValue::Int(i) => i.to_string(),
        }
    }

    /// `Some(true)` when `self > other`. Integers compare exactly; a string
    /// on either side is not comparable.
    fn exceeds(&self, other: &FieldValue) -> Option<bool> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a > b),
            _ => Some(self.as_f64()? > other.as_f64()?),
        }
    }
}

/// Value substituted for an absent optional field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Num(f64),
    Int(u64),
}

impl From<FieldDefault> for FieldValue {
    fn from(d: FieldDefault) -> Self {
        match d {
            FieldDefault::Num(n) => FieldValue::Num(n),
            FieldDefault::Int(i) => FieldValue::Int(i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldCheck {
    /// Optional sign and decimal point, coerced to `f64`.
    Numeric,
    /// Digits only, coerced to `u64`.
    NonNegInt,
    /// Like `NonNegInt` but zero is rejected.
    PositiveInt,
}

/// Parses `raw` if it is all digits and fits in a `u64`.
pub(crate) fn non_neg_int(raw: &str) -> Option<u64> {
    if !NON_NEG_INT.is_match(raw) {
        return None;
    }
    raw.parse().ok()
}

impl FieldCheck {
    fn coerce(&self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldCheck::Numeric => {
                if !NUMERIC.is_match(raw) {
                    return None;
                }
                raw.parse::<f64>().ok().map(FieldValue::Num)
            }
            FieldCheck::NonNegInt | FieldCheck::PositiveInt => {
                let v = non_neg_int(raw)?;
                if *self == FieldCheck::PositiveInt && v == 0 {
                    return None;
                }
                Some(FieldValue::Int(v))
            }
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldCheck::Numeric => "a number",
            FieldCheck::NonNegInt => "a non-negative integer",
            FieldCheck::PositiveInt => "a positive integer",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub check: Option<FieldCheck>,
    pub default: Option<FieldDefault>,
}

impl FieldSpec {
    pub const fn required(name: &'static str) -> FieldSpec {
        FieldSpec {
            name,
            required: true,
            check: None,
            default: None,
        }
    }

    pub const fn optional(name: &'static str) -> FieldSpec {
        FieldSpec {
            name,
            required: false,
            check: None,
            default: None,
        }
    }

    pub const fn with_check(mut self, check: FieldCheck) -> FieldSpec {
        self.check = Some(check);
        self
    }

    pub const fn with_default(mut self, default: FieldDefault) -> FieldSpec {
        self.default = Some(default);
        self
    }

    fn resolve(&self, raw: &str) -> Result<FieldValue, AppError> {
        match self.check {
            None => Ok(FieldValue::Str(raw.to_string())),
            Some(check) => check.coerce(raw).ok_or_else(|| AppError {
                err_type: ErrorType::BadVal,
                message: format!(
                    "bad value \"{}\" for field \"{}\": expected {}",
                    raw,
                    self.name,
                    check.describe()
                ),
            }),
        }
    }
}

/// `min <= max` across two fields.
#[derive(Debug, Clone, Copy)]
pub struct RangeCheck {
    pub min: &'static str,
    pub max: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordSpec {
    pub fields: &'static [FieldSpec],
    pub ranges: &'static [RangeCheck],
}

/// Coerced values of a request that passed [`check`].
#[derive(Debug, Clone, Default)]
pub struct Checked {
    values: HashMap<&'static str, FieldValue>,
}

impl Checked {
    pub fn opt_string(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(FieldValue::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn opt_number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(FieldValue::as_f64)
    }

    pub fn opt_integer(&self, name: &str) -> Option<u64> {
        match self.values.get(name) {
            Some(FieldValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Result<String, AppError> {
        self.opt_string(name).ok_or_else(|| missing(name))
    }

    pub fn number(&self, name: &str) -> Result<f64, AppError> {
        self.opt_number(name).ok_or_else(|| missing(name))
    }

    pub fn integer(&self, name: &str) -> Result<u64, AppError> {
        self.opt_integer(name).ok_or_else(|| missing(name))
    }

    pub fn range(&self, min: &str, max: &str) -> Result<Range, AppError> {
        Ok(Range::new(self.number(min)?, self.number(max)?))
    }
}

fn missing(name: &str) -> AppError {
    AppError {
        err_type: ErrorType::Internal,
        message: format!("no checked value for field \"{}\"", name),
    }
}

/// Flattens a JSON object into a [`RawReq`]. Scalars are stringified, `null`
/// counts as absent, nested values are rejected with `BAD_REQ`.
pub fn raw_req_from_json(value: &serde_json::Value) -> Result<RawReq, AppErrors> {
    use serde_json::Value;

    let obj = value.as_object().ok_or_else(|| {
        AppError::new("request body must be a flat JSON object", ErrorType::BadReq)
    })?;
    let mut req = RawReq::new();
    let mut errors = Vec::new();
    for (name, v) in obj {
        match v {
            Value::Null => {}
            Value::String(s) => {
                req.insert(name.clone(), s.clone());
            }
            Value::Number(n) => {
                req.insert(name.clone(), n.to_string());
            }
            Value::Bool(b) => {
                req.insert(name.clone(), b.to_string());
            }
            Value::Array(_) | Value::Object(_) => errors.push(AppError {
                err_type: ErrorType::BadReq,
                message: format!("field \"{}\" must be a scalar value", name),
            }),
        }
    }
    if errors.is_empty() {
        Ok(req)
    } else {
        Err(AppErrors(errors))
    }
}

/// Runs every field check in declaration order, then the cross-field checks
/// whose fields both resolved. Returns all errors found.
pub fn check(req: &RawReq, spec: &RecordSpec) -> Result<Checked, AppErrors> {
    let mut checked = Checked::default();
    let mut errors = Vec::new();

    for field in spec.fields {
        // whitespace only marks a value as blank; it is never stripped
        let raw = req
            .get(field.name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty());
        match raw {
            Some(raw) => match field.resolve(raw) {
                Ok(v) => {
                    checked.values.insert(field.name, v);
                }
                Err(e) => errors.push(e),
            },
            None => {
                if let Some(default) = field.default {
                    checked.values.insert(field.name, default.into());
                } else if field.required {
                    errors.push(AppError {
                        err_type: ErrorType::Required,
                        message: format!("missing value for required field \"{}\"", field.name),
                    });
                }
            }
        }
    }

    for range in spec.ranges {
        let (Some(min), Some(max)) = (checked.values.get(range.min), checked.values.get(range.max))
        else {
            continue;
        };
        if min.exceeds(max) == Some(true) {
            errors.push(AppError {
                err_type: ErrorType::BadRange,
                message: format!(
                    "\"{}\" value {} is greater than \"{}\" value {}",
                    range.min,
                    min.display(),
                    range.max,
                    max.display()
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(checked)
    } else {
        Err(AppErrors(errors))
    }
}
