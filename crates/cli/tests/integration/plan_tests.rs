//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_on_fresh_checkout() {
  let env = TestEnv::new();

  env
    .mkpipe()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("3rd (pending)"))
    .stdout(predicate::str::contains("build (prerequisite runs)"))
    .stdout(predicate::str::contains("4 target(s) would run"));

  assert!(env.calls().is_empty());
  assert!(!env.project().join(".mkpipe").exists());
}

#[test]
fn plan_after_run_shows_up_to_date() {
  let env = TestEnv::new();
  env.mkpipe().arg("run").assert().success();

  env
    .mkpipe()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("3rd (up to date)"))
    .stdout(predicate::str::contains("2 target(s) would run, 2 up to date"));
}

#[test]
fn plan_json_lists_targets_in_order() {
  let env = TestEnv::new();

  let output = env.mkpipe().args(["--output", "json", "plan", "ut-foo"]).output().unwrap();
  assert!(output.status.success());

  let planned: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let names: Vec<&str> = planned
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["3rd", "build", "configure-inplace-use", "ut-foo"]);
  assert_eq!(planned[3]["kind"], "unit_test");
}
