use eek::{EekError, EvaluationKind, Evaluator, ValidationError, Var, VarType};

fn build_error(mut evaluator: Evaluator) -> EekError {
    evaluator.build().expect_err("build should fail")
}

#[test]
fn name_is_mandatory() {
    let err = build_error(Evaluator::new());
    assert!(matches!(err, EekError::Validation(ValidationError::MissingName)));
    assert_eq!(err.to_string(), "name is mandatory");
}

#[test]
fn evaluation_kind_must_be_known() {
    let mut evaluator = Evaluator::named("test");
    evaluator.set_evaluation_kind(3u8);
    assert_eq!(build_error(evaluator).to_string(), "evaluationType is invalid");
}

#[test]
fn formula_cannot_be_empty() {
    let err = build_error(Evaluator::named("test"));
    assert_eq!(err.to_string(), "evaluation formula cannot be empty");
}

#[test]
fn complex_evaluation_is_rejected() {
    let mut evaluator = Evaluator::named("test");
    evaluator.prepare_evaluation("return 1 + 2");
    evaluator.set_evaluation_kind(EvaluationKind::Complex);
    assert_eq!(
        build_error(evaluator).to_string(),
        "currently complex evaluation is still not supported"
    );
}

#[test]
fn name_set_later_wins() {
    let mut evaluator = Evaluator::new();
    evaluator.set_name("first");
    evaluator.set_name("second");
    evaluator.prepare_evaluation("return 1");
    evaluator.build().expect("build");
    assert_eq!(evaluator.name(), "second");
    assert!(evaluator.artifact().is_some_and(|a| a.source().starts_with("// evaluator: second\n")));
}

#[test]
fn default_of_the_wrong_type_fails_the_build() {
    let mut evaluator = Evaluator::named("test");
    evaluator.define_variable(Var::new("Count", VarType::Int).with_default("three"));
    evaluator.prepare_evaluation("return Count");
    assert_eq!(
        build_error(evaluator).to_string(),
        "default value of variable Count (type int) has type string"
    );
}

#[test]
fn compile_errors_carry_the_diagnostic() {
    let mut evaluator = Evaluator::named("test");
    evaluator.prepare_evaluation("return missing + 1");
    let err = build_error(evaluator);
    match err {
        EekError::Build(eek::BuildError::Compile(compile)) => {
            assert_eq!(compile.message(), "undefined: missing");
            let diagnostic = compile.diagnostic().expect("diagnostic");
            assert_eq!(diagnostic.code.as_deref(), Some("E0200"));
        }
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[test]
fn missing_return_is_a_build_error() {
    let mut evaluator = Evaluator::named("test");
    evaluator.define_variable(Var::new("N", VarType::Int));
    evaluator.prepare_evaluation("if N > 1 {\n    return \"big\"\n}");
    let err = build_error(evaluator);
    assert!(err.to_string().contains("missing return"), "got {err}");
}

#[test]
fn unknown_packages_are_build_errors() {
    let mut evaluator = Evaluator::named("test");
    evaluator.import_package("github.com/novalagung/gubrak");
    evaluator.prepare_evaluation("return 1");
    let err = build_error(evaluator);
    assert!(
        err.to_string().contains("package github.com/novalagung/gubrak is not in std"),
        "got {err}"
    );
}
