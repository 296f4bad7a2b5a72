use crate::error::ValidationError;
use crate::registry::{EvaluationKind, Registry};

/// Checks the preconditions of a build, stopping at the first failure.
pub fn validate(registry: &Registry) -> Result<(), ValidationError> {
    if registry.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if !registry.kind.is_known() {
        return Err(ValidationError::InvalidKind);
    }
    if registry.formula.trim().is_empty() {
        return Err(ValidationError::EmptyFormula);
    }
    if registry.kind != EvaluationKind::Simple {
        return Err(ValidationError::ComplexUnsupported);
    }
    for var in &registry.variables {
        if let Some(default) = &var.default {
            if default.var_type() != var.ty {
                return Err(ValidationError::DefaultMismatch {
                    name: var.name.clone(),
                    declared: var.ty,
                    found: default.var_type(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Var;
    use crate::value::{Value, VarType};

    fn registry(name: &str, formula: &str) -> Registry {
        Registry {
            name: name.into(),
            formula: formula.into(),
            ..Registry::default()
        }
    }

    #[test]
    fn checks_run_in_order() {
        let mut reg = registry("", "");
        reg.kind = EvaluationKind::Invalid(3);
        assert_eq!(validate(&reg), Err(ValidationError::MissingName));

        reg.name = "test".into();
        assert_eq!(validate(&reg), Err(ValidationError::InvalidKind));

        reg.kind = EvaluationKind::Complex;
        assert_eq!(validate(&reg), Err(ValidationError::EmptyFormula));

        reg.formula = "return 1 + 2".into();
        assert_eq!(validate(&reg), Err(ValidationError::ComplexUnsupported));

        reg.kind = EvaluationKind::Simple;
        assert_eq!(validate(&reg), Ok(()));
    }

    #[test]
    fn whitespace_only_name_and_formula_are_empty() {
        assert_eq!(validate(&registry("  ", "return 1")), Err(ValidationError::MissingName));
        assert_eq!(validate(&registry("x", "\n\t ")), Err(ValidationError::EmptyFormula));
    }

    #[test]
    fn default_must_match_declared_type() {
        let mut reg = registry("x", "return N");
        reg.define_variable(Var {
            name: "N".into(),
            ty: VarType::Int,
            default: Some(Value::Float(1.0)),
        });
        assert_eq!(
            validate(&reg),
            Err(ValidationError::DefaultMismatch {
                name: "N".into(),
                declared: VarType::Int,
                found: VarType::Float,
            })
        );
    }
}
