use crate::artifact::{self, Artifact, TempBuildDir};
use crate::assemble::{assemble, ENTRY_POINT};
use crate::definition::Definition;
use crate::error::{DecodeError, EekError, Result, TypeMismatchError};
use crate::registry::{EvaluationKind, Func, Registry, Var};
use crate::runtime::{ExecutionConfig, RuntimeValue, Vm};
use crate::types::Type;
use crate::validate::validate;
use crate::value::Value;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Per-call variable overrides.
pub type ExecVar = BTreeMap<String, Value>;

/// Declares a formula and its inputs, builds it once and evaluates it many
/// times.
///
/// ```
/// use eek::{Evaluator, Var, VarType, Value};
///
/// let mut eval = Evaluator::named("simple operation");
/// eval.define_variable(Var::new("A", VarType::Int));
/// eval.define_variable(Var::new("B", VarType::Float).with_default(10.5));
/// eval.prepare_evaluation("C := float64(A) + B\nreturn C");
/// eval.build()?;
///
/// assert_eq!(eval.evaluate([("A", 9)])?, Value::Float(19.5));
/// # Ok::<(), eek::EekError>(())
/// ```
#[derive(Debug, Default)]
pub struct Evaluator {
    registry: Registry,
    config: ExecutionConfig,
    artifact: Option<Arc<Artifact>>,
    temp_dir: Option<TempBuildDir>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        let mut evaluator = Self::new();
        evaluator.set_name(name);
        evaluator
    }

    pub fn from_definition(definition: &Definition) -> Self {
        Self {
            registry: definition.to_registry(),
            ..Self::default()
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.registry.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.registry.name
    }

    pub fn define_variable(&mut self, var: Var) {
        self.registry.define_variable(var);
    }

    pub fn define_function(&mut self, func: Func) {
        self.registry.define_function(func);
    }

    /// Sets the formula: the body of a function whose `return` values are
    /// the evaluation result.
    pub fn prepare_evaluation(&mut self, formula: impl Into<String>) {
        self.registry.formula = formula.into();
    }

    /// Directory the assembled source and compiled program are written to.
    /// Without one, builds go to a temporary directory removed on drop.
    pub fn set_base_build_path(&mut self, path: impl Into<PathBuf>) {
        self.registry.base_build_path = Some(path.into());
    }

    pub fn import_package(&mut self, path: impl Into<String>) {
        self.registry.import_package(path);
    }

    pub fn set_evaluation_kind(&mut self, kind: impl Into<EvaluationKind>) {
        self.registry.kind = kind.into();
    }

    /// Budgets for each [`Evaluator::evaluate`] call. The entry point is
    /// always the wrapped formula.
    pub fn set_execution_config(&mut self, config: ExecutionConfig) {
        self.config = ExecutionConfig {
            entry_point: ENTRY_POINT.into(),
            ..config
        };
    }

    pub fn execution_config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_built(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        self.artifact.as_ref()
    }

    /// Validates the declarations, assembles them into a program and
    /// compiles it. A failed build leaves the previous artifact in place.
    pub fn build(&mut self) -> Result<()> {
        validate(&self.registry)?;
        debug!("building evaluator `{}`", self.registry.name);

        let source = assemble(&self.registry);
        trace!("assembled source:\n{source}");

        let dir = match &self.registry.base_build_path {
            Some(path) => path.clone(),
            None => self.temp_dir.get_or_insert_with(TempBuildDir::new).path().to_path_buf(),
        };
        let artifact = artifact::build(
            &self.registry.name,
            source,
            self.registry.variables.clone(),
            &dir,
        )?;
        debug!(
            "evaluator `{}` built, result type {}",
            self.registry.name,
            artifact
                .result_type()
                .map_or_else(|| "unknown".to_string(), Type::to_string)
        );
        self.artifact = Some(Arc::new(artifact));
        Ok(())
    }

    /// Runs the built formula with `overrides` replacing declared defaults.
    pub fn evaluate<I, K, V>(&self, overrides: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let artifact = self.artifact.as_ref().ok_or(EekError::NotBuilt)?;
        let bindings = bind(artifact, overrides)?;

        let started = Instant::now();
        let vm = Vm::new(self.config.clone());
        let output = vm.execute(
            artifact.compilation(),
            bindings.iter().map(|(name, value)| (name.as_str(), value)),
        )?;
        let value = decode(&output, artifact.result_type())?;
        trace!(
            "evaluator `{}` returned {value} in {:?}",
            self.registry.name,
            started.elapsed()
        );
        Ok(value)
    }
}

/// Checks overrides against the artifact's variables and merges them with
/// the declared defaults.
fn bind<I, K, V>(artifact: &Artifact, overrides: I) -> Result<BTreeMap<String, Value>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut bindings: BTreeMap<String, Value> = artifact
        .variables()
        .iter()
        .map(|var| (var.name.clone(), var.initial_value()))
        .collect();

    for (name, value) in overrides {
        let name = name.into();
        let value = value.into();
        let Some(var) = artifact.variable(&name) else {
            return Err(EekError::UnknownVariable(name));
        };
        if value.var_type() != var.ty {
            return Err(TypeMismatchError {
                name,
                declared: var.ty,
                value,
            }
            .into());
        }
        bindings.insert(name, value);
    }
    Ok(bindings)
}

fn decode(output: &RuntimeValue<'_>, expected: Option<&Type>) -> Result<Value, DecodeError> {
    if let RuntimeValue::Void = output {
        return Err(DecodeError::MissingOutput);
    }
    let value = output
        .to_value()
        .ok_or_else(|| DecodeError::Unsupported(output.type_name().to_string()))?;
    match expected {
        Some(ty) if ty.to_string() != value.type_name() => Err(DecodeError::Mismatch {
            expected: ty.to_string(),
            found: value.type_name().to_string(),
        }),
        _ => Ok(value),
    }
}
