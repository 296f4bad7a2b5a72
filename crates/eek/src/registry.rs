//! Declarations collected before a build.

use crate::value::{Value, VarType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named, typed input of the formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: VarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The value the variable holds when a call does not override it.
    pub fn initial_value(&self) -> Value {
        self.default.clone().unwrap_or_else(|| self.ty.zero_value())
    }
}

/// A helper callable from the formula; `body` is a function literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Func {
    pub name: String,
    pub body: String,
}

impl Func {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum EvaluationKind {
    #[default]
    Simple,
    /// Reserved. Builds with this kind are rejected.
    Complex,
    Invalid(u8),
}

impl EvaluationKind {
    pub fn is_known(self) -> bool {
        !matches!(self, EvaluationKind::Invalid(_))
    }
}

impl From<u8> for EvaluationKind {
    fn from(code: u8) -> Self {
        match code {
            0 => EvaluationKind::Simple,
            1 => EvaluationKind::Complex,
            other => EvaluationKind::Invalid(other),
        }
    }
}

impl From<EvaluationKind> for u8 {
    fn from(kind: EvaluationKind) -> Self {
        match kind {
            EvaluationKind::Simple => 0,
            EvaluationKind::Complex => 1,
            EvaluationKind::Invalid(code) => code,
        }
    }
}

/// Everything declared on an evaluator. Mutations never fail; problems are
/// reported when building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    pub name: String,
    pub kind: EvaluationKind,
    pub formula: String,
    pub imports: Vec<String>,
    pub variables: Vec<Var>,
    pub functions: Vec<Func>,
    pub base_build_path: Option<PathBuf>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable, replacing an earlier one with the same name in place.
    pub fn define_variable(&mut self, var: Var) {
        match self.variables.iter_mut().find(|v| v.name == var.name) {
            Some(existing) => *existing = var,
            None => self.variables.push(var),
        }
    }

    /// Adds a function, replacing an earlier one with the same name in place.
    pub fn define_function(&mut self, func: Func) {
        match self.functions.iter_mut().find(|f| f.name == func.name) {
            Some(existing) => *existing = func,
            None => self.functions.push(func),
        }
    }

    pub fn import_package(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.imports.contains(&path) {
            self.imports.push(path);
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Var> {
        self.variables.iter().find(|v| v.name == name)
    }
}
