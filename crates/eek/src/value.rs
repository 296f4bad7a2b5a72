//! Values exchanged with callers: variable defaults, overrides and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared type of an evaluator variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VarType {
    Int,
    Float,
    String,
    Bool,
}

impl VarType {
    pub fn as_str(self) -> &'static str {
        match self {
            VarType::Int => "int",
            VarType::Float => "float64",
            VarType::String => "string",
            VarType::Bool => "bool",
        }
    }

    /// Value a variable of this type holds when neither an override nor a
    /// default is given.
    pub fn zero_value(self) -> Value {
        match self {
            VarType::Int => Value::Int(0),
            VarType::Float => Value::Float(0.0),
            VarType::String => Value::String(String::new()),
            VarType::Bool => Value::Bool(false),
        }
    }

    /// Parses command line text as a value of this type.
    pub fn parse_value(self, text: &str) -> Result<Value, ParseValueError> {
        let invalid = || ParseValueError {
            text: text.to_string(),
            ty: self,
        };
        match self {
            VarType::Int => text.trim().parse().map(Value::Int).map_err(|_| invalid()),
            VarType::Float => text.trim().parse().map(Value::Float).map_err(|_| invalid()),
            VarType::Bool => text.trim().parse().map(Value::Bool).map_err(|_| invalid()),
            VarType::String => Ok(Value::String(text.to_string())),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown variable type `{0}`")]
pub struct UnknownVarType(pub String);

impl FromStr for VarType {
    type Err = UnknownVarType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "int" | "int64" | "i64" => Ok(VarType::Int),
            "float64" | "float" | "f64" => Ok(VarType::Float),
            "string" | "str" => Ok(VarType::String),
            "bool" => Ok(VarType::Bool),
            other => Err(UnknownVarType(other.to_string())),
        }
    }
}

impl TryFrom<String> for VarType {
    type Error = UnknownVarType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VarType> for String {
    fn from(ty: VarType) -> Self {
        ty.as_str().to_string()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot parse `{text}` as {ty}")]
pub struct ParseValueError {
    pub text: String,
    pub ty: VarType,
}

/// A dynamically typed scalar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn var_type(&self) -> VarType {
        match self {
            Value::Int(_) => VarType::Int,
            Value::Float(_) => VarType::Float,
            Value::String(_) => VarType::String,
            Value::Bool(_) => VarType::Bool,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.var_type().as_str()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    i64 => Int,
    i32 => Int,
    u32 => Int,
    i16 => Int,
    u16 => Int,
    i8 => Int,
    u8 => Int,
    f64 => Float,
    f32 => Float,
    bool => Bool,
    String => String,
    &str => String,
}

/// Formats a float the way Go's `%v` verb does: shortest round-trip digits,
/// in exponent notation when the decimal exponent is below -4 or at least 6.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exp: i32 = exponent.parse().unwrap_or(0);
    if value != 0.0 && (exp < -4 || exp >= 6) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.unsigned_abs());
    }
    format!("{value}")
}
