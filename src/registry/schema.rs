//! Parameter specifications and argument validation.
//!
//! Prompts and tools describe their parameters with [`ParamSpec`]. Tools
//! group them into a [`ToolSchema`], which serialises to the JSON-Schema-like
//! object advertised by `tools.list` and validates `tools.call` arguments
//! before a handler ever sees them.
//!
//! Validation is strict: required keys must be present, declared keys must
//! match their type and enum, and array items are checked against `items`.
//! Absent optional keys with a default are filled in. Undeclared keys pass
//! through untouched.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::RegistryError;
use crate::registry::tool::ToolError;

/// The value type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// A JSON string.
    String,
    /// A JSON number without a fractional part.
    Integer,
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    Array,
}

impl ParamType {
    /// Returns `true` if `value` is of this type.
    ///
    /// Integers must fit in an `i64`, the width [`ValidatedArgs::i64`] reads.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }

    /// Returns the schema name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the JSON type name of a value, for error messages.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Description of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Accepted value type.
    #[serde(rename = "type")]
    pub kind: ParamType,

    /// Ordered set of allowed literal values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Value used when the parameter is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Spec for array elements (arrays only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParamSpec>>,
}

impl ParamSpec {
    fn new(kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            kind,
            allowed: None,
            description: description.into(),
            default: None,
            items: None,
        }
    }

    /// A string parameter.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParamType::String, description)
    }

    /// An integer parameter.
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(ParamType::Integer, description)
    }

    /// A boolean parameter.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ParamType::Boolean, description)
    }

    /// An array parameter whose elements satisfy `items`.
    #[must_use]
    pub fn array(description: impl Into<String>, items: Self) -> Self {
        let mut spec = Self::new(ParamType::Array, description);
        spec.items = Some(Box::new(items));
        spec
    }

    /// Restricts the parameter to the given literals.
    #[must_use]
    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the value used when the parameter is omitted.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Checks a value against this spec.
    ///
    /// The returned message does not include the parameter name; callers
    /// add it.
    fn check(&self, value: &Value) -> Result<(), String> {
        if !self.kind.matches(value) {
            return Err(format!(
                "expected {}, found {}",
                self.kind,
                json_type_name(value)
            ));
        }

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
                return Err(format!(
                    "{value} is not one of [{}]",
                    options.join(", ")
                ));
            }
        }

        if let (Some(items), Value::Array(elements)) = (&self.items, value) {
            for (index, element) in elements.iter().enumerate() {
                items
                    .check(element)
                    .map_err(|reason| format!("item {index}: {reason}"))?;
            }
        }

        Ok(())
    }

    /// Checks that the declared default (if any) satisfies the spec.
    pub(crate) fn check_default(&self, owner: &str, param: &str) -> Result<(), RegistryError> {
        match &self.default {
            Some(default) => self
                .check(default)
                .map_err(|reason| RegistryError::InvalidDefault {
                    owner: owner.to_string(),
                    param: param.to_string(),
                    reason,
                }),
            None => Ok(()),
        }
    }
}

/// Reasons a `tools.call` argument object is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// `arguments` was present but not a JSON object.
    #[error("arguments must be an object, found {found}")]
    NotAnObject {
        /// JSON type that was received.
        found: &'static str,
    },

    /// A required key is absent.
    #[error("missing required argument '{param}'")]
    MissingRequired {
        /// The missing key.
        param: String,
    },

    /// A declared key has the wrong type, is outside its enum, or has bad items.
    #[error("invalid argument '{param}': {reason}")]
    Invalid {
        /// The offending key.
        param: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Argument schema of a tool: declared properties plus the required subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    /// Declared parameters in declaration order.
    pub properties: IndexMap<String, ParamSpec>,
    /// Keys that must be present in every call.
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an optional parameter.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    /// Declares a required parameter.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, spec);
        self
    }

    /// Checks the schema's own consistency before the tool is registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is undeclared or a default does
    /// not satisfy its spec.
    pub fn check_declaration(&self, tool: &str) -> Result<(), RegistryError> {
        if let Some(param) = self
            .required
            .iter()
            .find(|name| !self.properties.contains_key(*name))
        {
            return Err(RegistryError::UndeclaredRequired {
                tool: tool.to_string(),
                param: param.clone(),
            });
        }

        self.properties
            .iter()
            .try_for_each(|(name, spec)| spec.check_default(tool, name))
    }

    /// Validates call arguments against the schema.
    ///
    /// `None` and `null` are treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: non-object arguments, then missing
    /// required keys in declaration order, then invalid declared values.
    pub fn validate(&self, arguments: Option<&Value>) -> Result<ValidatedArgs, SchemaError> {
        let mut args = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(SchemaError::NotAnObject {
                    found: json_type_name(other),
                })
            }
        };

        if let Some(param) = self.required.iter().find(|name| !args.contains_key(*name)) {
            return Err(SchemaError::MissingRequired {
                param: param.clone(),
            });
        }

        for (name, spec) in &self.properties {
            match args.get(name) {
                Some(value) => spec.check(value).map_err(|reason| SchemaError::Invalid {
                    param: name.clone(),
                    reason,
                })?,
                None => {
                    if let Some(default) = &spec.default {
                        args.insert(name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(ValidatedArgs(args))
    }
}

impl Serialize for ToolSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolSchema", 3)?;
        state.serialize_field("type", "object")?;
        state.serialize_field("properties", &self.properties)?;
        state.serialize_field("required", &self.required)?;
        state.end()
    }
}

/// Tool arguments that passed schema validation.
///
/// Only [`ToolSchema::validate`] constructs this, so a handler can rely on
/// required keys being present with their declared types.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `key` as a string slice, if present and a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `key` as an integer, if present and integral.
    #[must_use]
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Returns `key` as a boolean, if present and boolean.
    #[must_use]
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Returns `key` as a string, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the key is missing or not a
    /// string.
    pub fn require_str(&self, key: &str) -> Result<&str, ToolError> {
        self.str(key)
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' must be a string")))
    }

    /// Returns the underlying argument map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
