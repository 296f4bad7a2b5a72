use std::sync::Arc;
use std::thread;

use crate::helper::{built, grading, simple_operation};
use eek::Value;

#[test]
fn concurrent_calls_are_independent() {
    let evaluator = Arc::new(built(simple_operation()));
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let evaluator = Arc::clone(&evaluator);
            thread::spawn(move || {
                (0..25)
                    .map(|round| {
                        let a = worker * 100 + round;
                        let value = evaluator.evaluate([("A", a)]).expect("evaluate");
                        (a, value)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for (a, value) in handle.join().expect("worker panicked") {
            assert_eq!(value, Value::Float(f64::from(a) + 10.5));
        }
    }
}

#[test]
fn scoped_threads_share_a_borrowed_evaluator() {
    let evaluator = built(grading());
    let evaluator = &evaluator;
    let results: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = [10, 34, 76, 90]
            .into_iter()
            .map(|n| scope.spawn(move || evaluator.evaluate([("N", n)])))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker panicked").expect("evaluate"))
            .collect()
    });
    assert_eq!(
        results,
        ["bad", "ok, but still bad", "good", "perfect"].map(Value::from)
    );
}
