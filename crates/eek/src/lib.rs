//! Formula evaluators for host applications.
//!
//! An [`Evaluator`] collects typed input variables, helper functions and a
//! formula written in a small Go-flavoured language. [`Evaluator::build`]
//! assembles them into one program, type-checks it and keeps the result;
//! [`Evaluator::evaluate`] then runs that program as often as needed with
//! per-call overrides, checking each override against its declared type.
//!
//! The language toolchain (lexer, parser, type checker and tree-walking
//! interpreter) lives in the lower modules and can be used on its own through
//! [`Compiler`] and [`Vm`].

pub mod artifact;
pub mod assemble;
pub mod ast;
pub mod compiler;
pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod registry;
pub mod runtime;
pub mod source;
pub mod stdlib;
pub mod tokens;
pub mod typeck;
pub mod types;
pub mod validate;
pub mod value;

pub use artifact::Artifact;
pub use compiler::{Compilation, CompilationOptions, Compiler};
pub use definition::{Definition, DefinitionError};
pub use diagnostics::{CompileError, Diagnostic};
pub use error::{BuildError, DecodeError, EekError, TypeMismatchError, ValidationError};
pub use evaluator::{Evaluator, ExecVar};
pub use registry::{EvaluationKind, Func, Var};
pub use runtime::{ExecutionConfig, ExecutionError, RuntimeValue, Vm};
pub use source::{SourceFile, SourceId, SourceMap};
pub use types::Type;
pub use value::{Value, VarType};

/// Version of the eek crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
