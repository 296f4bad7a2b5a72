use std::fs;

use crate::helper::simple_operation;
use eek::artifact::TempBuildDir;
use eek::Value;

#[test]
fn identical_source_under_same_base_path_is_reused() {
    let dir = TempBuildDir::new();

    let mut first = simple_operation();
    first.set_base_build_path(dir.path());
    first.build().expect("first build");
    let first_artifact = first.artifact().cloned().expect("built");
    assert!(!first_artifact.was_cached());
    assert!(first_artifact.source_path().starts_with(dir.path()));
    assert_eq!(
        fs::read_to_string(first_artifact.source_path()).expect("source written"),
        first_artifact.source()
    );

    let mut second = simple_operation();
    second.set_base_build_path(dir.path());
    second.build().expect("second build");
    let second_artifact = second.artifact().cloned().expect("built");
    assert!(second_artifact.was_cached());
    assert_eq!(second_artifact.digest(), first_artifact.digest());
    assert_eq!(second_artifact.program_path(), first_artifact.program_path());
    assert_eq!(second.evaluate([("A", 9)]).expect("evaluate"), Value::Float(19.5));
}

#[test]
fn different_source_gets_its_own_files() {
    let dir = TempBuildDir::new();

    let mut evaluator = simple_operation();
    evaluator.set_base_build_path(dir.path());
    evaluator.build().expect("build");
    let before = evaluator.artifact().cloned().expect("built");

    evaluator.prepare_evaluation("return float64(A) - B");
    evaluator.build().expect("rebuild");
    let after = evaluator.artifact().cloned().expect("built");

    assert_ne!(before.digest(), after.digest());
    assert_ne!(before.program_path(), after.program_path());
    assert!(before.program_path().exists(), "explicit base paths keep old artifacts");
    assert!(!after.was_cached());
}

#[test]
fn temporary_build_directory_is_removed_with_the_evaluator() {
    let mut evaluator = simple_operation();
    evaluator.build().expect("build");
    let dir = evaluator
        .artifact()
        .and_then(|artifact| artifact.source_path().parent().map(|p| p.to_path_buf()))
        .expect("artifact directory");
    assert!(dir.exists());
    drop(evaluator);
    assert!(!dir.exists());
}
