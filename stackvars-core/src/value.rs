//! Value - Values bound to declared parameters
//!
//! Defaults, overrides and resolved results all share this representation.

use std::collections::HashMap;
use std::fmt;

/// Value of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Build a list of strings (e.g., security group or subnet IDs)
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Kind of this value as reported in type errors
    ///
    /// Lists report the kind shared by their elements (`list(string)`),
    /// `list(mixed)` when the elements disagree, and plain `list` when empty.
    pub fn type_name(&self) -> String {
        match self {
            Value::String(_) => "string".to_string(),
            Value::Int(_) => "integer".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::List(items) => {
                let mut kinds = items.iter().map(Value::type_name);
                match kinds.next() {
                    None => "list".to_string(),
                    Some(first) => {
                        if kinds.all(|k| k == first) {
                            format!("list({})", first)
                        } else {
                            "list(mixed)".to_string()
                        }
                    }
                }
            }
            Value::Map(_) => "map".to_string(),
        }
    }

    /// Convert to a JSON value for handing to a provisioning engine
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                let obj: serde_json::Map<_, _> = keys
                    .into_iter()
                    .map(|k| (k.clone(), map[k].to_json()))
                    .collect();
                serde_json::Value::Object(obj)
            }
        }
    }

    /// Convert a JSON value (e.g., from a `.json` variable file)
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ConversionError> {
        match json {
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_f64()
                    && let Some(f) = n.as_f64()
                {
                    Ok(Value::Float(f))
                } else {
                    Err(ConversionError::UnsupportedNumber(n.to_string()))
                }
            }
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            serde_json::Value::Object(map) => {
                let mut converted = HashMap::new();
                for (k, v) in map {
                    converted.insert(k.clone(), Value::from_json(v)?);
                }
                Ok(Value::Map(converted))
            }
            serde_json::Value::Null => Err(ConversionError::Null),
        }
    }
}

/// Error converting a foreign value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("null is only allowed as a top-level value")]
    Null,

    #[error("Unsupported number {0}: out of range for an integer")]
    UnsupportedNumber(String),
}

/// Renders the value as a literal in declaration/assignment syntax
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", escape(s)),
            Value::Int(n) => write!(f, "{}", n),
            // Whole floats keep their fraction so they read back as floats
            Value::Float(n) if n.fract() == 0.0 => write!(f, "{:.1}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                let strs: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", strs.join(", "))
            }
            Value::Map(map) => {
                if map.is_empty() {
                    return write!(f, "{{}}");
                }
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                let strs: Vec<_> = keys
                    .into_iter()
                    .map(|k| format!("{} = {}", format_key(k), map[k]))
                    .collect();
                write!(f, "{{ {} }}", strs.join(", "))
            }
        }
    }
}

/// Map keys are bare when they are identifiers, quoted otherwise
fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if is_identifier {
        key.to_string()
    } else {
        format!("\"{}\"", escape(key))
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
