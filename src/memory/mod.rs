//! Resource Memory
//!
//! Typed, kind-partitioned resource store and the controllers that build it
//! from the agent configuration. Each value kind has its own map, so the same
//! resource name may exist under several kinds independently.

mod basic;

pub use basic::parse_value;

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Initialization table from the configuration: kind name -> resource -> values.
pub type MemoryItems = HashMap<String, HashMap<String, InitValues>>;

/// Value kinds a resource can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    Text,
    Time,
}

impl ValueKind {
    /// Resolve a configuration kind name, accepting the long-form aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" | "boolean" => Some(ValueKind::Bool),
            "integer" | "int" => Some(ValueKind::Integer),
            "float" | "floating-point" => Some(ValueKind::Float),
            "text" | "string" => Some(ValueKind::Text),
            "time" | "timestamp" => Some(ValueKind::Time),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Time => "time",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resource value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Time(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S UTC")),
        }
    }
}

/// Initialization entry for one resource.
///
/// Accepts either a single string or a list holding at most one string; an
/// empty string or an empty list selects the kind default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitValues {
    Text(String),
    List(Vec<String>),
}

impl InitValues {
    /// The initialization text, or `None` when the default applies.
    ///
    /// Returns `Err(count)` when more than one value was supplied.
    pub fn single(&self) -> Result<Option<&str>, usize> {
        match self {
            InitValues::Text(text) if text.is_empty() => Ok(None),
            InitValues::Text(text) => Ok(Some(text.as_str())),
            InitValues::List(values) => match values.as_slice() {
                [] => Ok(None),
                [text] if text.is_empty() => Ok(None),
                [text] => Ok(Some(text.as_str())),
                _ => Err(values.len()),
            },
        }
    }
}

impl From<&str> for InitValues {
    fn from(text: &str) -> Self {
        InitValues::Text(text.to_string())
    }
}

/// Kind-partitioned resource store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStore {
    #[serde(default)]
    pub bool: HashMap<String, bool>,
    #[serde(default)]
    pub integer: HashMap<String, i64>,
    #[serde(default)]
    pub float: HashMap<String, f64>,
    #[serde(default)]
    pub text: HashMap<String, String>,
    #[serde(default)]
    pub time: HashMap<String, DateTime<Utc>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a resource in the map matching the value kind.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match value {
            Value::Bool(v) => {
                self.bool.insert(name, v);
            }
            Value::Integer(v) => {
                self.integer.insert(name, v);
            }
            Value::Float(v) => {
                self.float.insert(name, v);
            }
            Value::Text(v) => {
                self.text.insert(name, v);
            }
            Value::Time(v) => {
                self.time.insert(name, v);
            }
        }
    }

    /// Kind of the first map (in kind order) holding `name`.
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        if self.bool.contains_key(name) {
            Some(ValueKind::Bool)
        } else if self.integer.contains_key(name) {
            Some(ValueKind::Integer)
        } else if self.float.contains_key(name) {
            Some(ValueKind::Float)
        } else if self.text.contains_key(name) {
            Some(ValueKind::Text)
        } else if self.time.contains_key(name) {
            Some(ValueKind::Time)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.bool.len() + self.integer.len() + self.float.len() + self.text.len() + self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strategy used to build the initial store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryController {
    Basic,
}

impl MemoryController {
    pub fn from_name(name: &str) -> Result<Self, MemoryError> {
        match name {
            "basic" => Ok(MemoryController::Basic),
            other => Err(MemoryError::UnknownController(other.to_string())),
        }
    }
}

/// Build the initial resource store for `controller` from `items`.
pub fn build(controller: &str, items: &MemoryItems) -> Result<ResourceStore, MemoryError> {
    match MemoryController::from_name(controller)? {
        MemoryController::Basic => basic::build_basic(items),
    }
}
