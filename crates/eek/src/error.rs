//! Errors returned by [`Evaluator`](crate::Evaluator).

use crate::diagnostics::CompileError;
use crate::runtime::ExecutionError;
use crate::value::{Value, VarType};
use std::path::PathBuf;
use thiserror::Error;

/// A precondition of `build()` that does not hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is mandatory")]
    MissingName,
    #[error("evaluationType is invalid")]
    InvalidKind,
    #[error("evaluation formula cannot be empty")]
    EmptyFormula,
    #[error("currently complex evaluation is still not supported")]
    ComplexUnsupported,
    #[error("default value of variable {name} (type {declared}) has type {found}")]
    DefaultMismatch {
        name: String,
        declared: VarType,
        found: VarType,
    },
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// The assembled program was rejected; the diagnostic is passed through
    /// untouched.
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode compiled program: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Error on setting value of variable {name} (type {declared}) with value {value} (type {})", value.type_name())]
pub struct TypeMismatchError {
    pub name: String,
    pub declared: VarType,
    pub value: Value,
}

/// The program ran but its result cannot be handed back as a [`Value`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("evaluation produced no value")]
    MissingOutput,
    #[error("evaluation result of type {0} cannot be returned")]
    Unsupported(String),
    #[error("evaluation result has type {found}, expected {expected}")]
    Mismatch { expected: String, found: String },
}

#[derive(Debug, Error)]
pub enum EekError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatchError),
    #[error("unknown variable {0}")]
    UnknownVariable(String),
    #[error("evaluator is not built")]
    NotBuilt,
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<CompileError> for EekError {
    fn from(err: CompileError) -> Self {
        EekError::Build(BuildError::Compile(err))
    }
}

pub type Result<T, E = EekError> = std::result::Result<T, E>;
