//! Untyped argument model

use std::fmt;

use autoflow_core_types::ValueType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ArgumentError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentDirection {
    In,
    Out,
    Predicate,
}

impl ArgumentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentDirection::In => "in",
            ArgumentDirection::Out => "out",
            ArgumentDirection::Predicate => "predicate",
        }
    }

    /// Modes a direction may take, first entry is the initial one.
    pub fn allowed_modes(&self) -> &'static [ArgumentMode] {
        match self {
            ArgumentDirection::In => &[
                ArgumentMode::Default,
                ArgumentMode::DataBound,
                ArgumentMode::Scripted,
            ],
            ArgumentDirection::Out => &[ArgumentMode::DataBound, ArgumentMode::Scripted],
            ArgumentDirection::Predicate => &[ArgumentMode::Scripted],
        }
    }

    pub fn allows(&self, mode: ArgumentMode) -> bool {
        self.allowed_modes().contains(&mode)
    }

    fn initial_mode(&self) -> ArgumentMode {
        self.allowed_modes()[0]
    }
}

impl fmt::Display for ArgumentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentMode {
    Default,
    DataBound,
    Scripted,
}

impl ArgumentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentMode::Default => "default",
            ArgumentMode::DataBound => "data_bound",
            ArgumentMode::Scripted => "scripted",
        }
    }
}

impl fmt::Display for ArgumentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an argument's value comes from. Each mode carries only its own data,
/// so switching modes drops whatever the previous mode held.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Binding {
    Default {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    DataBound {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property_path: Option<String>,
    },
    Scripted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        script_file: Option<String>,
    },
}

impl Binding {
    pub fn empty(mode: ArgumentMode) -> Self {
        match mode {
            ArgumentMode::Default => Binding::Default { value: None },
            ArgumentMode::DataBound => Binding::DataBound {
                property_path: None,
            },
            ArgumentMode::Scripted => Binding::Scripted { script_file: None },
        }
    }

    pub fn mode(&self) -> ArgumentMode {
        match self {
            Binding::Default { .. } => ArgumentMode::Default,
            Binding::DataBound { .. } => ArgumentMode::DataBound,
            Binding::Scripted { .. } => ArgumentMode::Scripted,
        }
    }
}

fn enabled() -> bool {
    true
}

/// A declared input, output or predicate of an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    direction: ArgumentDirection,
    #[serde(flatten)]
    binding: Binding,
    #[serde(default)]
    value_type: ValueType,
    #[serde(default = "enabled")]
    can_change_mode: bool,
    #[serde(default)]
    can_change_type: bool,
}

impl Argument {
    pub fn new(direction: ArgumentDirection, value_type: ValueType) -> Self {
        Self {
            direction,
            binding: Binding::empty(direction.initial_mode()),
            value_type,
            can_change_mode: true,
            can_change_type: false,
        }
    }

    pub fn input(value_type: ValueType) -> Self {
        Self::new(ArgumentDirection::In, value_type)
    }

    pub fn output(value_type: ValueType) -> Self {
        Self::new(ArgumentDirection::Out, value_type)
    }

    pub fn predicate(value_type: ValueType) -> Self {
        Self::new(ArgumentDirection::Predicate, value_type)
    }

    /// Default-mode literal. Only meaningful for inputs.
    pub fn with_default(mut self, value: Value) -> Self {
        self.binding = Binding::Default {
            value: Some(value).filter(|value| !value.is_null()),
        };
        self
    }

    pub fn bound_to(mut self, property_path: impl Into<String>) -> Self {
        self.binding = Binding::DataBound {
            property_path: Some(property_path.into()),
        };
        self
    }

    pub fn scripted(mut self, script_file: impl Into<String>) -> Self {
        self.binding = Binding::Scripted {
            script_file: Some(script_file.into()),
        };
        self
    }

    pub fn with_mode_locked(mut self) -> Self {
        self.can_change_mode = false;
        self
    }

    pub fn with_type_changeable(mut self) -> Self {
        self.can_change_type = true;
        self
    }

    pub fn direction(&self) -> ArgumentDirection {
        self.direction
    }

    pub fn mode(&self) -> ArgumentMode {
        self.binding.mode()
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn can_change_mode(&self) -> bool {
        self.can_change_mode
    }

    pub fn can_change_type(&self) -> bool {
        self.can_change_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        match &self.binding {
            Binding::Default { value } => value.as_ref(),
            _ => None,
        }
    }

    pub fn property_path(&self) -> Option<&str> {
        match &self.binding {
            Binding::DataBound { property_path } => property_path.as_deref(),
            _ => None,
        }
    }

    pub fn script_file(&self) -> Option<&str> {
        match &self.binding {
            Binding::Scripted { script_file } => script_file.as_deref(),
            _ => None,
        }
    }

    /// Switch binding mode. Data held by the previous mode is discarded.
    pub fn set_mode(&mut self, mode: ArgumentMode) -> Result<(), ArgumentError> {
        if mode == self.mode() {
            return Ok(());
        }
        if !self.can_change_mode {
            return Err(ArgumentError::ModeLocked);
        }
        if !self.direction.allows(mode) {
            return Err(ArgumentError::InvalidMode {
                direction: self.direction,
                mode,
            });
        }
        self.binding = Binding::empty(mode);
        Ok(())
    }

    pub fn set_default_value(&mut self, value: Option<Value>) -> Result<(), ArgumentError> {
        match &mut self.binding {
            Binding::Default { value: slot } => {
                *slot = value.filter(|value| !value.is_null());
                Ok(())
            }
            other => Err(ArgumentError::InvalidMode {
                direction: self.direction,
                mode: other.mode(),
            }),
        }
    }

    pub fn set_property_path(&mut self, path: Option<String>) -> Result<(), ArgumentError> {
        match &mut self.binding {
            Binding::DataBound { property_path } => {
                *property_path = path;
                Ok(())
            }
            other => Err(ArgumentError::InvalidMode {
                direction: self.direction,
                mode: other.mode(),
            }),
        }
    }

    pub fn set_script_file(&mut self, file: Option<String>) -> Result<(), ArgumentError> {
        match &mut self.binding {
            Binding::Scripted { script_file } => {
                *script_file = file;
                Ok(())
            }
            other => Err(ArgumentError::InvalidMode {
                direction: self.direction,
                mode: other.mode(),
            }),
        }
    }

    pub fn set_value_type(&mut self, value_type: ValueType) -> Result<(), ArgumentError> {
        if value_type == self.value_type {
            return Ok(());
        }
        if !self.can_change_type {
            return Err(ArgumentError::TypeLocked);
        }
        self.value_type = value_type;
        Ok(())
    }

    /// Whether the argument carries everything its mode needs.
    ///
    /// Default-mode inputs of a value type are always configured since they
    /// fall back to the type's zero value.
    pub fn is_configured(&self) -> bool {
        match &self.binding {
            Binding::Default { value } => {
                self.direction == ArgumentDirection::In
                    && (value.is_some() || self.value_type.is_value_type())
            }
            Binding::DataBound { property_path } => {
                property_path.as_deref().is_some_and(|path| !path.trim().is_empty())
            }
            Binding::Scripted { script_file } => {
                script_file.as_deref().is_some_and(|file| !file.trim().is_empty())
            }
        }
    }

    pub(crate) fn force_value_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
    }
}
