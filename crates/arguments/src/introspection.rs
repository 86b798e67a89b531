//! Property listings for registered data-model types

use autoflow_core_types::ValueType;
use dashmap::DashMap;
use schemars::schema::{InstanceType, Schema, SingleOrVec};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub value_type: ValueType,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Named types whose public properties can be offered as binding targets.
#[derive(Default)]
pub struct TypeRegistry {
    types: DashMap<String, Vec<PropertyDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name` using its JSON schema.
    pub fn register<T: JsonSchema>(&self, name: impl Into<String>) {
        let root = schema_for!(T);
        let properties = root
            .schema
            .object
            .as_ref()
            .map(|object| {
                object
                    .properties
                    .iter()
                    .map(|(name, schema)| PropertyDescriptor::new(name, schema_value_type(schema)))
                    .collect()
            })
            .unwrap_or_default();
        self.types.insert(name.into(), properties);
    }

    /// Register a type from a sample instance.
    pub fn register_sample(&self, name: impl Into<String>, sample: &Value) {
        let properties = match sample {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| PropertyDescriptor::new(key, ValueType::of(value)))
                .collect(),
            _ => Vec::new(),
        };
        self.types.insert(name.into(), properties);
    }

    pub fn properties_of(&self, name: &str) -> Option<Vec<PropertyDescriptor>> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

fn schema_value_type(schema: &Schema) -> ValueType {
    let Schema::Object(object) = schema else {
        return ValueType::Any;
    };
    if object.reference.is_some() {
        return ValueType::Object;
    }
    let primary = match &object.instance_type {
        Some(SingleOrVec::Single(single)) => Some(**single),
        Some(SingleOrVec::Vec(types)) => types
            .iter()
            .copied()
            .find(|kind| *kind != InstanceType::Null),
        None => None,
    };
    match primary {
        Some(InstanceType::Boolean) => ValueType::Boolean,
        Some(InstanceType::Integer) => ValueType::Integer,
        Some(InstanceType::Number) => ValueType::Float,
        Some(InstanceType::String) => ValueType::String,
        Some(InstanceType::Array) => ValueType::List,
        Some(InstanceType::Object) => ValueType::Object,
        _ => ValueType::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Invoice {
        number: String,
        total: f64,
        paid: bool,
        lines: Vec<String>,
        retries: Option<u32>,
    }

    #[test]
    fn schema_properties_are_typed() {
        let registry = TypeRegistry::new();
        registry.register::<Invoice>("Invoice");
        let props = registry.properties_of("Invoice").unwrap();
        let lookup = |name: &str| {
            props
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.value_type)
                .unwrap()
        };
        assert_eq!(lookup("number"), ValueType::String);
        assert_eq!(lookup("total"), ValueType::Float);
        assert_eq!(lookup("paid"), ValueType::Boolean);
        assert_eq!(lookup("lines"), ValueType::List);
        assert_eq!(lookup("retries"), ValueType::Integer);
        assert!(registry.properties_of("Unknown").is_none());
    }

    #[test]
    fn sample_registration_infers_types() {
        let registry = TypeRegistry::new();
        registry.register_sample("Order", &json!({"id": 7, "items": []}));
        assert_eq!(registry.type_names(), vec!["Order"]);
        assert_eq!(registry.properties_of("Order").unwrap().len(), 2);
    }
}
