//! Typed views over [`Argument`]

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use autoflow_core_types::{ControlHandle, ValueType};
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::argument::{Argument, ArgumentDirection};
use crate::errors::ArgumentError;

/// Types an argument can carry.
pub trait ArgumentValue: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn value_type() -> ValueType;

    /// Value used when a Default-mode input has no literal.
    fn synthesize() -> Option<Self> {
        None
    }

    fn is_value_type() -> bool {
        Self::value_type().is_value_type()
    }

    fn from_json(value: Value) -> Result<Self, ArgumentError> {
        serde_json::from_value(value).map_err(|err| ArgumentError::TypeMismatch {
            expected: Self::value_type(),
            detail: err.to_string(),
        })
    }

    fn to_json(&self) -> Result<Value, ArgumentError> {
        serde_json::to_value(self).map_err(|err| ArgumentError::TypeMismatch {
            expected: Self::value_type(),
            detail: err.to_string(),
        })
    }
}

macro_rules! value_type_argument {
    ($value_type:expr => $($ty:ty),+) => {
        $(
            impl ArgumentValue for $ty {
                fn value_type() -> ValueType {
                    $value_type
                }

                fn synthesize() -> Option<Self> {
                    Some(<$ty>::default())
                }
            }
        )+
    };
}

value_type_argument!(ValueType::Integer => i32, i64, u32, u64, usize);
value_type_argument!(ValueType::Float => f32, f64);
value_type_argument!(ValueType::Boolean => bool);

impl ArgumentValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn synthesize() -> Option<Self> {
        Some(String::new())
    }
}

impl<T: ArgumentValue> ArgumentValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::List
    }

    fn synthesize() -> Option<Self> {
        Some(Vec::new())
    }
}

impl ArgumentValue for BTreeMap<String, Value> {
    fn value_type() -> ValueType {
        ValueType::Object
    }
}

impl ArgumentValue for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }
}

impl ArgumentValue for ControlHandle {
    fn value_type() -> ValueType {
        ValueType::Control
    }
}

macro_rules! typed_argument {
    ($(#[$meta:meta])* $name:ident, $direction:expr) => {
        $(#[$meta])*
        pub struct $name<T> {
            inner: Argument,
            marker: PhantomData<fn() -> T>,
        }

        impl<T: ArgumentValue> $name<T> {
            pub fn new() -> Self {
                Self::wrap(Argument::new($direction, T::value_type()))
            }

            fn wrap(inner: Argument) -> Self {
                Self {
                    inner,
                    marker: PhantomData,
                }
            }

            pub fn scripted(script_file: impl Into<String>) -> Self {
                Self::wrap(Argument::new($direction, T::value_type()).scripted(script_file))
            }

            pub fn argument(&self) -> &Argument {
                &self.inner
            }

            pub fn argument_mut(&mut self) -> &mut Argument {
                &mut self.inner
            }

            pub fn into_argument(self) -> Argument {
                self.inner
            }

            pub fn is_configured(&self) -> bool {
                self.inner.is_configured()
            }
        }

        impl<T: ArgumentValue> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T: ArgumentValue> TryFrom<Argument> for $name<T> {
            type Error = ArgumentError;

            fn try_from(mut inner: Argument) -> Result<Self, Self::Error> {
                if inner.direction() != $direction {
                    return Err(ArgumentError::DirectionMismatch {
                        expected: $direction,
                        actual: inner.direction(),
                    });
                }
                if !inner.can_change_type() && T::value_type() != ValueType::Any {
                    inner.force_value_type(T::value_type());
                }
                Ok(Self::wrap(inner))
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self {
                    inner: self.inner.clone(),
                    marker: PhantomData,
                }
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.inner == other.inner
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.inner).finish()
            }
        }

        impl<T> Serialize for $name<T> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.inner.serialize(serializer)
            }
        }

        impl<'de, T: ArgumentValue> Deserialize<'de> for $name<T> {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let inner = Argument::deserialize(deserializer)?;
                Self::try_from(inner).map_err(D::Error::custom)
            }
        }
    };
}

typed_argument!(
    /// Input read through [`crate::ArgumentProcessor::get_value`].
    InArgument,
    ArgumentDirection::In
);

typed_argument!(
    /// Output written through [`crate::ArgumentProcessor::set_value`].
    OutArgument,
    ArgumentDirection::Out
);

typed_argument!(
    /// Scripted `(component, value: T) -> bool`.
    PredicateArgument,
    ArgumentDirection::Predicate
);

impl<T: ArgumentValue> InArgument<T> {
    pub fn with_default(value: T) -> Result<Self, ArgumentError> {
        let literal = value.to_json()?;
        Ok(Self::wrap(Argument::input(T::value_type()).with_default(literal)))
    }

    pub fn bound_to(property_path: impl Into<String>) -> Self {
        Self::wrap(Argument::input(T::value_type()).bound_to(property_path))
    }

    /// Literal held in Default mode, decoded as `T`.
    pub fn default_value(&self) -> Option<T> {
        self.inner
            .default_value()
            .cloned()
            .and_then(|value| T::from_json(value).ok())
    }
}

impl<T: ArgumentValue> OutArgument<T> {
    pub fn bound_to(property_path: impl Into<String>) -> Self {
        Self::wrap(Argument::output(T::value_type()).bound_to(property_path))
    }
}
