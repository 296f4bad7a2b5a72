use std::sync::OnceLock;

use proptest::prelude::*;

use crate::helper::{built, simple_operation};
use eek::{EekError, Evaluator, ExecVar, Value, Var, VarType};

fn simple() -> &'static Evaluator {
    static EVALUATOR: OnceLock<Evaluator> = OnceLock::new();
    EVALUATOR.get_or_init(|| built(simple_operation()))
}

/// Echoes its string input so arbitrary text crosses the call boundary.
fn echo() -> &'static Evaluator {
    static EVALUATOR: OnceLock<Evaluator> = OnceLock::new();
    EVALUATOR.get_or_init(|| {
        let mut evaluator = Evaluator::named("echo");
        evaluator.define_variable(Var::new("S", VarType::String).with_default("start"));
        evaluator.prepare_evaluation("return S");
        built(evaluator)
    })
}

fn small_i64() -> impl Strategy<Value = i64> {
    -1_000_000i64..1_000_000i64
}

fn finite_f64() -> impl Strategy<Value = f64> {
    -1.0e9f64..1.0e9f64
}

fn non_float_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        ".{0,12}".prop_map(Value::String),
    ]
}

proptest! {
    #[test]
    fn default_is_used_when_not_overridden(a in small_i64()) {
        let value = simple().evaluate([("A", a)]).expect("evaluate");
        prop_assert_eq!(value, Value::Float(a as f64 + 10.5));
    }

    #[test]
    fn matching_overrides_replace_defaults(a in small_i64(), b in finite_f64()) {
        let mut overrides = ExecVar::new();
        overrides.insert("A".into(), Value::Int(a));
        overrides.insert("B".into(), Value::Float(b));
        let value = simple().evaluate(overrides).expect("evaluate");
        prop_assert_eq!(value, Value::Float(a as f64 + b));
    }

    #[test]
    fn mismatched_overrides_report_exact_message(value in non_float_value()) {
        let err = simple().evaluate([("B", value.clone())]).expect_err("type mismatch");
        prop_assert!(matches!(err, EekError::TypeMismatch(_)));
        prop_assert_eq!(
            err.to_string(),
            format!(
                "Error on setting value of variable B (type float64) with value {} (type {})",
                value,
                value.type_name()
            )
        );
    }

    #[test]
    fn repeated_calls_give_the_same_result(a in small_i64()) {
        let first = simple().evaluate([("A", a)]).expect("evaluate");
        let second = simple().evaluate([("A", a)]).expect("evaluate");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn strings_pass_through_unchanged(s in "\\PC{0,40}") {
        let value = echo().evaluate([("S", s.clone())]).expect("evaluate");
        prop_assert_eq!(value, Value::String(s));
    }
}
