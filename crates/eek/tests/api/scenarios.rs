use crate::helper::{built, grading, load_demo, simple_operation};
use eek::{EekError, ExecVar, Value};

#[test]
fn float_sum_uses_default_for_missing_override() {
    let evaluator = built(simple_operation());
    let value = evaluator.evaluate([("A", 9)]).expect("evaluate");
    assert_eq!(value, Value::Float(19.5));
}

#[test]
fn float_sum_uses_every_override() {
    let evaluator = built(simple_operation());
    let mut overrides = ExecVar::new();
    overrides.insert("A".into(), Value::Int(1));
    overrides.insert("B".into(), Value::Float(2.1));
    let value = evaluator.evaluate(overrides).expect("evaluate");
    match value {
        Value::Float(sum) => assert!((sum - 3.1).abs() < 1e-12, "expected 3.1, got {sum}"),
        other => panic!("expected float result, got {other:?}"),
    }
}

#[test]
fn float_sum_rejects_integer_for_float_variable() {
    let evaluator = built(simple_operation());
    let err = evaluator.evaluate([("B", 2)]).expect_err("int is not float64");
    assert!(matches!(err, EekError::TypeMismatch(_)));
    assert_eq!(
        err.to_string(),
        "Error on setting value of variable B (type float64) with value 2 (type int)"
    );
}

#[test]
fn nested_helper_calls_pick_the_matching_branch() {
    let evaluator = built(grading());
    assert_eq!(
        evaluator.evaluate([("N", 76)]).expect("evaluate"),
        Value::from("good")
    );
}

#[test]
fn nested_helper_calls_cover_every_branch() {
    let evaluator = built(grading());
    let cases = [
        (10, "bad"),
        (34, "ok, but still bad"),
        (40, "ok"),
        (50, "ok"),
        (85, "terrific"),
        (90, "perfect"),
    ];
    for (n, expected) in cases {
        let value = evaluator.evaluate([("N", n)]).expect("evaluate");
        assert_eq!(value, Value::from(expected), "N = {n}");
    }
    let default = evaluator.evaluate(ExecVar::new()).expect("evaluate");
    assert_eq!(default, Value::from("ok, but still bad"));
}

#[test]
fn lottery_returns_a_message() {
    let evaluator = built(load_demo("lottery.json"));
    for overrides in [
        vec![("YourLotteryCode", 5)],
        vec![("YourLotteryCode", 3), ("RepeatUntil", 10)],
    ] {
        let value = evaluator.evaluate(overrides).expect("evaluate");
        let message = value.as_str().expect("string result").to_string();
        assert!(
            message == "You lose" || message.starts_with("Congrats! You win the lottery! after "),
            "unexpected message {message:?}"
        );
    }
}

#[test]
fn lottery_always_wins_when_every_draw_matches() {
    let mut evaluator = load_demo("lottery.json");
    evaluator.define_variable(eek::Var::new("YourLotteryCode", eek::VarType::Int).with_default(4));
    evaluator.prepare_evaluation(
        r#"
            draw := func() int {
                return rand.RandomInt(4, 5)
            }
            for i := 0; i < RepeatUntil; i++ {
                if draw() == YourLotteryCode {
                    return fmt.Sprintf("%s after %d tried", MessageWin, i + 1)
                }
            }
            return MessageLose
        "#,
    );
    let evaluator = built(evaluator);
    let value = evaluator.evaluate(ExecVar::new()).expect("evaluate");
    assert_eq!(value, Value::from("Congrats! You win the lottery! after 1 tried"));
}

#[test]
fn demo_definitions_match_the_programmatic_ones() {
    let from_json = built(load_demo("simple_operation.json"));
    assert_eq!(from_json.evaluate([("A", 9)]).expect("evaluate"), Value::Float(19.5));

    let from_json = built(load_demo("grading.json"));
    assert_eq!(from_json.evaluate([("N", 76)]).expect("evaluate"), Value::from("good"));
}
