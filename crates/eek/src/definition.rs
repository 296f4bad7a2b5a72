//! Evaluator definitions stored as JSON.
//!
//! ```json
//! {
//!   "name": "simple operation",
//!   "variables": [
//!     { "name": "A", "type": "int" },
//!     { "name": "B", "type": "float64", "default": 10.5 }
//!   ],
//!   "formula": "return float64(A) + B"
//! }
//! ```

use crate::registry::{EvaluationKind, Func, Registry, Var};
use crate::value::{Value, VarType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: EvaluationKind,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub variables: Vec<Var>,
    #[serde(default)]
    pub functions: Vec<Func>,
    #[serde(default)]
    pub formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_build_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid definition {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Definition {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| DefinitionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Registry holding these declarations. JSON has a single number type,
    /// so whole-number defaults of float64 variables are read as floats.
    pub fn to_registry(&self) -> Registry {
        let mut registry = Registry {
            name: self.name.clone(),
            kind: self.kind,
            formula: self.formula.clone(),
            base_build_path: self.base_build_path.clone(),
            ..Registry::default()
        };
        for path in &self.imports {
            registry.import_package(path.clone());
        }
        for var in &self.variables {
            let mut var = var.clone();
            if let (VarType::Float, Some(Value::Int(v))) = (var.ty, &var.default) {
                var.default = Some(Value::Float(*v as f64));
            }
            registry.define_variable(var);
        }
        for func in &self.functions {
            registry.define_function(func.clone());
        }
        registry
    }
}
