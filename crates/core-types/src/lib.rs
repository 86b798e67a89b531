use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

/// Failure classes shared by every runtime crate.
///
/// Crate-level error enums map onto one of these through their `class()`
/// accessor so drivers can apply policy without knowing the concrete error.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorClass {
    /// An argument resolved while unconfigured, or a component placed in an
    /// invalid position.
    Configuration,
    /// A control could not be located within its retry budget.
    Lookup,
    /// Compilation or execution failure reported by the script engine.
    Script,
    /// The tree shape does not allow the requested operation.
    Structural,
    Io,
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Configuration => "configuration",
            ErrorClass::Lookup => "lookup",
            ErrorClass::Script => "script",
            ErrorClass::Structural => "structural",
            ErrorClass::Io => "io",
            ErrorClass::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static type tag carried by arguments and loop sources.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ValueType {
    #[default]
    Any,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Object,
    Control,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Object => "object",
            ValueType::Control => "control",
        }
    }

    /// Value types always have a usable default and never resolve to null.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            ValueType::Boolean | ValueType::Integer | ValueType::Float
        )
    }

    /// Infer the tag of a concrete JSON value.
    #[cfg(feature = "serde-full")]
    pub fn of(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ValueType::Any,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Integer,
            Value::Number(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::List,
            Value::Object(map) if map.contains_key("handle_id") => ValueType::Control,
            Value::Object(_) => ValueType::Object,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.width && y <= self.y + self.height
    }
}

/// Opaque handle to a control resolved by a platform backend.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ControlHandle {
    pub handle_id: String,
    pub control_type: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub bounding_box: Option<BoundingBox>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub properties: BTreeMap<String, String>,
}

impl ControlHandle {
    pub fn new(handle_id: impl Into<String>, control_type: impl Into<String>) -> Self {
        Self {
            handle_id: handle_id.into(),
            control_type: control_type.into(),
            name: None,
            bounding_box: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounding_box = Some(bounds);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types_are_flagged() {
        assert!(ValueType::Integer.is_value_type());
        assert!(ValueType::Boolean.is_value_type());
        assert!(!ValueType::String.is_value_type());
        assert!(!ValueType::Control.is_value_type());
    }

    #[test]
    fn component_ids_are_unique() {
        assert_ne!(ComponentId::new(), ComponentId::new());
    }

    #[test]
    fn error_classes_display_as_snake_case() {
        assert_eq!(ErrorClass::Configuration.to_string(), "configuration");
        assert_eq!(ErrorClass::Lookup.as_str(), "lookup");
        assert_eq!(format!("{}", ErrorClass::Internal), "internal");
    }

    #[test]
    fn bounding_box_contains_edges() {
        let bounds = BoundingBox::new(10.0, 10.0, 20.0, 5.0);
        assert!(bounds.contains(10.0, 10.0));
        assert!(bounds.contains(30.0, 15.0));
        assert!(!bounds.contains(31.0, 15.0));
    }

    #[cfg(feature = "serde-full")]
    #[test]
    fn infers_value_type_from_json() {
        use serde_json::json;
        assert_eq!(ValueType::of(&json!(3)), ValueType::Integer);
        assert_eq!(ValueType::of(&json!(3.5)), ValueType::Float);
        assert_eq!(ValueType::of(&json!([1])), ValueType::List);
        assert_eq!(
            ValueType::of(&json!({"handle_id": "h", "control_type": "uia"})),
            ValueType::Control
        );
    }
}
