use crate::ast::TypeExpr;
use crate::diagnostics::{CompileError, CompileResult};
use crate::position::Span;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Predeclared functions that are not values of an ordinary function type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    /// `int(x)` conversion from int or float64.
    Int,
    /// `float64(x)` conversion from int or float64.
    Float64,
    /// `string(s)` identity conversion.
    String,
    /// `len(s)` byte length of a string.
    Len,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [Builtin::Int, Builtin::Float64, Builtin::String, Builtin::Len];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Int => "int",
            Builtin::Float64 => "float64",
            Builtin::String => "string",
            Builtin::Len => "len",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    /// Result of calling a function without a result.
    Void,
    Function(Box<Signature>),
    /// An imported package, identified by its import path.
    Package(SmolStr),
    Builtin(Builtin),
    /// Accepts a value of any type. Only appears as a variadic parameter.
    Any,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Type>,
    pub variadic: Option<Type>,
    pub ret: Type,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            variadic: None,
            ret,
        }
    }

    pub fn variadic(params: Vec<Type>, rest: Type, ret: Type) -> Self {
        Self {
            params,
            variadic: Some(rest),
            ret,
        }
    }
}

impl Type {
    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(Box::new(Signature::new(params, ret)))
    }

    pub fn is_assignable_from(&self, other: &Type) -> bool {
        match self {
            Type::Any => !matches!(other, Type::Void | Type::Package(_) | Type::Builtin(_)),
            _ => self == other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::String)
    }

    pub fn is_comparable(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::String | Type::Bool)
    }

    /// Whether a value of this type can be stored in a variable.
    pub fn is_value(&self) -> bool {
        !matches!(self, Type::Void | Type::Package(_) | Type::Builtin(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float64"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "no value"),
            Type::Function(sig) => {
                write!(f, "func(")?;
                for (index, param) in sig.params.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                if let Some(rest) = &sig.variadic {
                    if !sig.params.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...{rest}")?;
                }
                write!(f, ")")?;
                if sig.ret != Type::Void {
                    write!(f, " {}", sig.ret)?;
                }
                Ok(())
            }
            Type::Package(path) => write!(f, "package {path}"),
            Type::Builtin(builtin) => write!(f, "builtin {}", builtin.name()),
            Type::Any => write!(f, "any"),
        }
    }
}

/// Lexically scoped mapping from names to their static types.
#[derive(Clone, Default)]
pub struct TypeEnvironment {
    scopes: Vec<HashMap<SmolStr, Type>>,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        let mut env = Self { scopes: Vec::new() };
        env.push_scope();
        env
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn insert(&mut self, name: SmolStr, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, ty);
        }
    }

    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map_or(false, |scope| scope.contains_key(name))
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

pub fn resolve_type_expr(expr: &TypeExpr) -> CompileResult<Type> {
    match expr {
        TypeExpr::Named(name, span) => match name.as_str() {
            "int" | "int64" => Ok(Type::Int),
            "float64" | "float" => Ok(Type::Float),
            "bool" => Ok(Type::Bool),
            "string" => Ok(Type::String),
            other => Err(CompileError::at(*span, format!("undefined type: {other}"))),
        },
        TypeExpr::Function { params, ret, .. } => {
            let params = params
                .iter()
                .map(resolve_type_expr)
                .collect::<CompileResult<Vec<_>>>()?;
            let ret = match ret {
                Some(ret) => resolve_type_expr(ret)?,
                None => Type::Void,
            };
            Ok(Type::function(params, ret))
        }
    }
}

/// Facts established by the type checker that the interpreter relies on.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Result type of the entry point, inferred from its `return` statements.
    pub entry_return: Option<Type>,
    /// Integer literals, and integer `/` or `%` of constants, that appear in
    /// a float context and evaluate as float64.
    pub float_literals: HashSet<Span>,
}

impl TypeInfo {
    pub fn mark_float_literal(&mut self, span: Span) {
        self.float_literals.insert(span);
    }

    pub fn is_float_literal(&self, span: &Span) -> bool {
        self.float_literals.contains(span)
    }
}
