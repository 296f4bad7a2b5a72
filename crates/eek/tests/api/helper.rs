use std::path::PathBuf;

use eek::{Definition, Evaluator, Func, Value, Var, VarType};

pub fn demo_path(file: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // eek
    path.pop(); // crates
    path.push("demos");
    path.push(file);
    path
}

pub fn load_demo(file: &str) -> Evaluator {
    let definition = Definition::load(demo_path(file)).expect("failed to load definition");
    Evaluator::from_definition(&definition)
}

pub fn built(mut evaluator: Evaluator) -> Evaluator {
    evaluator.build().expect("failed to build evaluator");
    evaluator
}

/// Builds an evaluator with no variables around `formula` and runs it once.
pub fn eval_formula(formula: &str) -> Value {
    let mut evaluator = Evaluator::named("formula");
    evaluator.prepare_evaluation(formula);
    built(evaluator)
        .evaluate(Vec::<(String, Value)>::new())
        .expect("failed to evaluate formula")
}

pub fn simple_operation() -> Evaluator {
    let mut evaluator = Evaluator::named("simple operation");
    evaluator.define_variable(Var::new("A", VarType::Int));
    evaluator.define_variable(Var::new("B", VarType::Float).with_default(10.5));
    evaluator.prepare_evaluation(
        r#"
            ACasted := float64(A)
            C := ACasted + B
            return C
        "#,
    );
    evaluator
}

pub fn grading() -> Evaluator {
    let mut evaluator = Evaluator::named("aritmethic expressions");
    evaluator.define_variable(Var::new("N", VarType::Int).with_default(34));
    evaluator.define_function(Func::new(
        "IF",
        r#"
            func(cond bool, ok, nok string) string {
                if cond {
                    return ok
                } else {
                    return nok
                }
            }
        "#,
    ));
    evaluator.define_function(Func::new(
        "OR",
        r#"
            func(cond1, cond2 bool) bool {
                return cond1 || cond2
            }
        "#,
    ));
    evaluator.define_function(Func::new("NOT", "func(cond bool) bool { return !cond }"));
    evaluator.prepare_evaluation(
        r#"
            result := IF (N>20,IF(OR(N>40,N==40),IF(N>60,IF(NOT(N>80),"good",IF(N==90,"perfect","terrific")),"ok"),"ok, but still bad"),"bad")

            return result
        "#,
    );
    evaluator
}
