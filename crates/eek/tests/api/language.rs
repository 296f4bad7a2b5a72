use crate::helper::eval_formula;
use eek::Value;

#[test]
fn closures_see_later_assignments() {
    let value = eval_formula(
        r#"
            base := 1
            add := func(n int) int {
                return base + n
            }
            base = 10
            return add(5)
        "#,
    );
    assert_eq!(value, Value::Int(15));
}

#[test]
fn counters_survive_between_closure_calls() {
    let value = eval_formula(
        r#"
            makeCounter := func() func() int {
                count := 0
                return func() int {
                    count++
                    return count
                }
            }
            next := makeCounter()
            next()
            next()
            return next()
        "#,
    );
    assert_eq!(value, Value::Int(3));
}

#[test]
fn loops_break_and_continue() {
    let value = eval_formula(
        r#"
            total := 0
            for i := 0; i < 100; i++ {
                if i % 2 == 0 {
                    continue
                }
                if i > 9 {
                    break
                }
                total += i
            }
            return total
        "#,
    );
    assert_eq!(value, Value::Int(25));
}

#[test]
fn untyped_constants_take_the_float_result_type() {
    assert_eq!(eval_formula("x := 1.5\nif x > 1 {\n    return x\n}\nreturn 0"), Value::Float(1.5));
    assert_eq!(eval_formula("return 7 / 2"), Value::Int(3));
    assert_eq!(eval_formula("return 7 % 3 * -1"), Value::Int(-1));
}

#[test]
fn string_helpers_are_importable() {
    let mut evaluator = eek::Evaluator::named("strings");
    evaluator.import_package("strings");
    evaluator.import_package("fmt");
    evaluator.prepare_evaluation(
        r#"
            name := strings.TrimSpace("  ada lovelace ")
            shout := strings.ToUpper(strings.ReplaceAll(name, " ", "_"))
            return fmt.Sprintf("%s has %d bytes", shout, len(shout))
        "#,
    );
    evaluator.build().expect("build");
    let value = evaluator
        .evaluate(Vec::<(String, Value)>::new())
        .expect("evaluate");
    assert_eq!(value, Value::from("ADA_LOVELACE has 12 bytes"));
}

#[test]
fn math_package_returns_floats() {
    let mut evaluator = eek::Evaluator::named("math");
    evaluator.import_package("math");
    evaluator.define_variable(eek::Var::new("X", eek::VarType::Float).with_default(2.0));
    evaluator.prepare_evaluation("return math.Sqrt(math.Pow(X, 2) + 5) + math.Floor(-0.5)");
    evaluator.build().expect("build");
    assert_eq!(
        evaluator.evaluate(Vec::<(String, Value)>::new()).expect("evaluate"),
        Value::Float(2.0)
    );
}
