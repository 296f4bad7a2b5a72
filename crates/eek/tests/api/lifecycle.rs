use crate::helper::{built, simple_operation};
use eek::{EekError, ExecVar, Value, Var, VarType};

#[test]
fn evaluate_before_build_reports_not_built() {
    let evaluator = simple_operation();
    assert!(!evaluator.is_built());
    let err = evaluator.evaluate([("A", 1)]).expect_err("not built");
    assert!(matches!(err, EekError::NotBuilt));
}

#[test]
fn unknown_override_is_rejected() {
    let evaluator = built(simple_operation());
    let err = evaluator.evaluate([("Z", 1)]).expect_err("unknown variable");
    match err {
        EekError::UnknownVariable(name) => assert_eq!(name, "Z"),
        other => panic!("expected unknown variable, got {other:?}"),
    }
}

#[test]
fn redeclared_variable_uses_the_last_declaration() {
    let mut evaluator = simple_operation();
    evaluator.define_variable(Var::new("B", VarType::Float).with_default(0.5));
    let evaluator = built(evaluator);
    assert_eq!(evaluator.evaluate([("A", 2)]).expect("evaluate"), Value::Float(2.5));
    let names: Vec<_> = evaluator
        .registry()
        .variables
        .iter()
        .map(|var| var.name.as_str())
        .collect();
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn rebuild_picks_up_new_declarations() {
    let mut evaluator = built(simple_operation());
    evaluator.prepare_evaluation("return float64(A) * B");
    evaluator.build().expect("rebuild");
    assert_eq!(evaluator.evaluate([("A", 2)]).expect("evaluate"), Value::Float(21.0));
}

#[test]
fn failed_rebuild_keeps_the_previous_artifact() {
    let mut evaluator = built(simple_operation());
    let digest = evaluator.artifact().map(|a| a.digest().to_string());

    evaluator.prepare_evaluation("return A +");
    assert!(matches!(evaluator.build(), Err(EekError::Build(_))));
    evaluator.prepare_evaluation("");
    assert!(matches!(evaluator.build(), Err(EekError::Validation(_))));

    assert!(evaluator.is_built());
    assert_eq!(evaluator.artifact().map(|a| a.digest().to_string()), digest);
    assert_eq!(evaluator.evaluate([("A", 9)]).expect("evaluate"), Value::Float(19.5));
}

#[test]
fn overrides_are_checked_against_the_built_variables() {
    let mut evaluator = built(simple_operation());
    evaluator.define_variable(Var::new("Extra", VarType::Int));
    let err = evaluator.evaluate([("Extra", 1)]).expect_err("not built yet");
    assert!(matches!(err, EekError::UnknownVariable(_)));
}

#[test]
fn unset_variables_take_their_zero_value() {
    let mut evaluator = eek::Evaluator::named("zeros");
    evaluator.define_variable(Var::new("I", VarType::Int));
    evaluator.define_variable(Var::new("F", VarType::Float));
    evaluator.define_variable(Var::new("S", VarType::String));
    evaluator.define_variable(Var::new("B", VarType::Bool));
    evaluator.prepare_evaluation(r#"return fmt.Sprintf("%d|%v|%q|%t", I, F, S, B)"#);
    evaluator.import_package("fmt");
    let evaluator = built(evaluator);
    assert_eq!(
        evaluator.evaluate(ExecVar::new()).expect("evaluate"),
        Value::from(r#"0|0|""|false"#)
    );
}

#[test]
fn artifact_reports_the_inferred_result_type() {
    let evaluator = built(simple_operation());
    let artifact = evaluator.artifact().expect("built");
    assert_eq!(artifact.result_type(), Some(&eek::Type::Float));
    assert_eq!(artifact.variables().len(), 2);
    assert!(artifact.source().contains("var B float64 = 10.5\n"));
}
