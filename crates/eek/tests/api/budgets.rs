use std::time::Duration;

use eek::{EekError, Evaluator, ExecVar, ExecutionConfig, ExecutionError, Value};

fn spinning(config: ExecutionConfig) -> Evaluator {
    let mut evaluator = Evaluator::named("spin");
    evaluator.prepare_evaluation("i := 0\nfor {\n    i++\n}\nreturn i");
    evaluator.set_execution_config(config);
    evaluator.build().expect("build");
    evaluator
}

#[test]
fn infinite_loop_times_out() {
    let config = ExecutionConfig::default().with_timeout(Some(Duration::from_millis(100)));
    let err = spinning(config).evaluate(ExecVar::new()).expect_err("timeout");
    assert!(
        matches!(err, EekError::Execution(ExecutionError::Timeout(_))),
        "got {err:?}"
    );
}

#[test]
fn infinite_loop_hits_the_step_limit() {
    let config = ExecutionConfig::default().with_max_steps(Some(5_000));
    let err = spinning(config).evaluate(ExecVar::new()).expect_err("step limit");
    assert_eq!(err.to_string(), "evaluation exceeded the step limit of 5000");
}

#[test]
fn runaway_recursion_hits_the_call_depth() {
    let mut evaluator = Evaluator::named("recursion");
    evaluator.define_function(eek::Func::new(
        "Count",
        "func(n int) int {\n    return n\n}",
    ));
    evaluator.prepare_evaluation(
        "var down func(int) int\ndown = func(n int) int {\n    return down(Count(n) + 1)\n}\nreturn down(0)",
    );
    evaluator.set_execution_config(ExecutionConfig::default().with_max_call_depth(32));
    evaluator.build().expect("build");
    let err = evaluator.evaluate(ExecVar::new()).expect_err("overflow");
    assert!(matches!(err, EekError::Execution(ExecutionError::CallDepth(32))));
}

#[test]
fn runtime_errors_leave_the_evaluator_usable() {
    let mut evaluator = Evaluator::named("division");
    evaluator.define_variable(eek::Var::new("D", eek::VarType::Int).with_default(2));
    evaluator.prepare_evaluation("return 10 / D");
    evaluator.build().expect("build");

    let err = evaluator.evaluate([("D", 0)]).expect_err("divide by zero");
    assert_eq!(err.to_string(), "runtime error: integer divide by zero");
    assert_eq!(evaluator.evaluate(ExecVar::new()).expect("evaluate"), Value::Int(5));
}

#[test]
fn oversized_strings_fail_the_evaluation() {
    let mut evaluator = Evaluator::named("repeat");
    evaluator.import_package("strings");
    evaluator.define_variable(eek::Var::new("Times", eek::VarType::Int).with_default(2));
    evaluator.prepare_evaluation("return strings.Repeat(\"ab\", Times)");
    evaluator.build().expect("build");

    assert_eq!(evaluator.evaluate(ExecVar::new()).expect("evaluate"), Value::from("abab"));
    let err = evaluator.evaluate([("Times", i64::MAX)]).expect_err("too long");
    assert!(
        matches!(err, EekError::Execution(ExecutionError::Runtime(_))),
        "got {err:?}"
    );
}

#[test]
fn deeply_nested_formulas_are_rejected_at_build() {
    let mut evaluator = Evaluator::named("nested");
    let depth = 5_000;
    evaluator.prepare_evaluation(format!("return {}1{}", "(".repeat(depth), ")".repeat(depth)));
    let err = evaluator.build().expect_err("too deep");
    assert!(matches!(err, EekError::Build(eek::BuildError::Compile(_))), "got {err:?}");
    assert!(err.to_string().contains("expression nesting too deep"), "got {err}");
    assert!(!evaluator.is_built());
}
