//! Input validation seam and the default field schema.
//!
//! The pipeline treats a validator as a black box with two async steps:
//! `filter` (may coerce or fill in values) then `validate`. An expected
//! rejection is a value, [`Verdict::Invalid`], and reaches the client as a
//! 400 with the payload as the message. An `Err` is something the validator
//! did not expect; it is logged and the client sees a 500.
//!
//! # Field schema
//!
//! [`FieldSchema`] is the validator built from a declarative spec:
//!
//! ```json
//! {
//!   "id":    { "type": "number", "required": true },
//!   "name":  { "type": "string", "defaultValue": "anonymous" },
//!   "admin": { "type": "boolean" }
//! }
//! ```
//!
//! Rule keys are `type` (`string`, `number`, `integer`, `boolean`, `object`,
//! `array`, `any`; case-insensitive, default `any`), `required` (default
//! `false`) and `defaultValue`. Anything else makes the spec malformed.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::BoxError;
use crate::handler::BoxFuture;

/// Result of a successful validation run.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Valid,
    /// Rejected; the payload is sent to the client as-is.
    Invalid(Value),
}

/// Filters and validates an action's merged input.
pub trait Validator: Send + Sync + 'static {
    /// Normalizes the input before validation.
    fn filter(&self, data: Map<String, Value>) -> BoxFuture<'_, Result<Map<String, Value>, BoxError>>;

    fn validate<'a>(&'a self, data: &'a Map<String, Value>) -> BoxFuture<'a, Result<Verdict, BoxError>>;

    /// JSON description listed by the `OPTIONS` discovery endpoint.
    fn describe(&self) -> Value {
        Value::Null
    }
}

/// A schema spec that cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema must be an object mapping field names to rules")]
    NotAnObject,

    #[error("rule for `{field}` must be an object")]
    RuleNotAnObject { field: String },

    #[error("unknown type `{kind}` for `{field}`")]
    UnknownType { field: String, kind: String },

    #[error("`{key}` of `{field}` must be {expected}")]
    InvalidKey { field: String, key: &'static str, expected: &'static str },

    #[error("unknown key `{key}` in rule for `{field}`")]
    UnknownKey { field: String, key: String },
}

/// Accepted field types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    Any,
    Array,
    Boolean,
    Integer,
    Number,
    Object,
    String,
}

impl FieldType {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "any"     => Some(Self::Any),
            "array"   => Some(Self::Array),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number"  => Some(Self::Number),
            "object"  => Some(Self::Object),
            "string"  => Some(Self::String),
            _         => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Any     => true,
            Self::Array   => value.is_array(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number  => value.is_number(),
            Self::Object  => value.is_object(),
            Self::String  => value.is_string(),
        }
    }

    /// Converts a value to this type when no information is lost.
    fn coerce(self, value: Value) -> Value {
        match (self, value) {
            (Self::Number, Value::String(s)) => parse_number(&s).unwrap_or(Value::String(s)),
            (Self::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (Self::Boolean, Value::String(s)) => match s.as_str() {
                "true"  => Value::Bool(true),
                "false" => Value::Bool(false),
                _       => Value::String(s),
            },
            (Self::String, Value::Number(n)) => Value::String(n.to_string()),
            (Self::String, Value::Bool(b)) => Value::String(b.to_string()),
            (_, value) => value,
        }
    }

    fn with_article(self) -> &'static str {
        match self {
            Self::Any     => "a value",
            Self::Array   => "an array",
            Self::Boolean => "a boolean",
            Self::Integer => "an integer",
            Self::Number  => "a number",
            Self::Object  => "an object",
            Self::String  => "a string",
        }
    }
}

/// Integral strings become integers so `"123"` round-trips as `123`, not `123.0`.
fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Value::from(n));
    }
    let f = s.parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}

#[derive(Clone, Debug)]
struct FieldRule {
    kind: FieldType,
    required: bool,
    default: Option<Value>,
}

/// The default [`Validator`], compiled from a JSON field spec.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    fields: IndexMap<String, FieldRule>,
    spec: Value,
}

impl FieldSchema {
    pub fn compile(spec: &Value) -> Result<Self, SchemaError> {
        let object = spec.as_object().ok_or(SchemaError::NotAnObject)?;

        let mut fields = IndexMap::with_capacity(object.len());
        for (field, rule) in object {
            let rule = rule
                .as_object()
                .ok_or_else(|| SchemaError::RuleNotAnObject { field: field.clone() })?;
            fields.insert(field.clone(), compile_rule(field, rule)?);
        }

        Ok(Self { fields, spec: spec.clone() })
    }
}

fn compile_rule(field: &str, rule: &Map<String, Value>) -> Result<FieldRule, SchemaError> {
    let mut compiled = FieldRule { kind: FieldType::Any, required: false, default: None };

    for (key, value) in rule {
        match key.as_str() {
            "type" => {
                let name = value.as_str().ok_or_else(|| SchemaError::InvalidKey {
                    field: field.to_owned(),
                    key: "type",
                    expected: "a string",
                })?;
                compiled.kind = FieldType::parse(name).ok_or_else(|| SchemaError::UnknownType {
                    field: field.to_owned(),
                    kind: name.to_owned(),
                })?;
            }
            "required" => {
                compiled.required = value.as_bool().ok_or_else(|| SchemaError::InvalidKey {
                    field: field.to_owned(),
                    key: "required",
                    expected: "a boolean",
                })?;
            }
            // A null default is the same as no default.
            "defaultValue" => compiled.default = (!value.is_null()).then(|| value.clone()),
            other => {
                return Err(SchemaError::UnknownKey { field: field.to_owned(), key: other.to_owned() });
            }
        }
    }

    Ok(compiled)
}

impl FieldSchema {
    fn filter_now(&self, mut data: Map<String, Value>) -> Map<String, Value> {
        for (name, rule) in &self.fields {
            let current = data.remove(name).filter(|v| !v.is_null());
            let value = match (current, &rule.default) {
                (Some(value), _) => Some(rule.kind.coerce(value)),
                (None, Some(default)) => Some(default.clone()),
                (None, None) => None,
            };
            if let Some(value) = value {
                data.insert(name.clone(), value);
            }
        }
        data
    }

    fn validate_now(&self, data: &Map<String, Value>) -> Verdict {
        let mut errors = Map::new();

        for (name, rule) in &self.fields {
            let message = match data.get(name).filter(|v| !v.is_null()) {
                None if rule.required => format!("{name} is required"),
                None => continue,
                Some(value) if !rule.kind.matches(value) => {
                    format!("{name} must be {}", rule.kind.with_article())
                }
                Some(_) => continue,
            };
            errors.insert(name.clone(), Value::Array(vec![Value::String(message)]));
        }

        if errors.is_empty() {
            Verdict::Valid
        } else {
            Verdict::Invalid(Value::Object(errors))
        }
    }
}

impl Validator for FieldSchema {
    fn filter(&self, data: Map<String, Value>) -> BoxFuture<'_, Result<Map<String, Value>, BoxError>> {
        Box::pin(async move { Ok::<_, BoxError>(self.filter_now(data)) })
    }

    fn validate<'a>(&'a self, data: &'a Map<String, Value>) -> BoxFuture<'a, Result<Verdict, BoxError>> {
        Box::pin(async move { Ok::<_, BoxError>(self.validate_now(data)) })
    }

    fn describe(&self) -> Value {
        self.spec.clone()
    }
}
