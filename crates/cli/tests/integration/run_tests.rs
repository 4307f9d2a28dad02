//! Run command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const SVMC: &str = "mvpa/clfs/libsvmc/_svmc.so";
const SMLRC: &str = "mvpa/clfs/libsmlrc/smlrc.so";

#[test]
fn run_all_builds_and_places_modules() {
  let env = TestEnv::new();

  env.mkpipe().arg("run").arg("all").assert().success();

  let include = env.python_root().join("include");
  assert_eq!(
    env.calls(),
    vec!["make".to_string(), format!("build_ext {}", include.display())]
  );
  assert_eq!(
    std::fs::read_to_string(env.project().join(SVMC)).unwrap(),
    "svmc module\n"
  );
  assert!(env.project().join(SMLRC).is_file());
}

#[test]
fn run_defaults_to_all() {
  let env = TestEnv::new();

  env
    .mkpipe()
    .arg("run")
    .assert()
    .success()
    .stdout(predicate::str::contains("configure-inplace-use"));

  assert!(env.project().join(SVMC).is_file());
}

#[test]
fn second_run_does_not_recompile() {
  let env = TestEnv::new();
  env.mkpipe().arg("run").assert().success();

  env
    .mkpipe()
    .arg("run")
    .assert()
    .success()
    .stdout(predicate::str::contains("3rd is up to date"))
    .stdout(predicate::str::contains("build is up to date"))
    .stdout(predicate::str::contains("Rebuilt: 0"));

  assert_eq!(env.calls().len(), 2);
}

#[test]
fn source_change_rebuilds_extensions() {
  let env = TestEnv::new();
  env.mkpipe().arg("run").assert().success();

  env.write_file("mvpa/clfs/libsvmc/svmc.i", "%module svmc\n// tweak\n");
  env.mkpipe().arg("run").assert().success();

  let calls = env.calls();
  assert_eq!(calls.len(), 3);
  assert!(calls[2].starts_with("build_ext"));
}

#[test]
fn third_party_failure_propagates_exit_code() {
  let env = TestEnv::new();
  env.write_file("3rd/libsvm/build.sh", "echo make >> ../../calls.log\nexit 7\n");

  env
    .mkpipe()
    .arg("run")
    .assert()
    .code(7)
    .stderr(predicate::str::contains("target '3rd' failed"));

  assert_eq!(env.calls(), vec!["make"]);
  assert!(!env.project().join(SVMC).exists());
}

#[test]
fn missing_third_party_component_fails() {
  let env = TestEnv::new();
  std::fs::remove_dir_all(env.project().join("3rd/libsvm")).unwrap();

  env
    .mkpipe()
    .arg("run")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("third-party component 'libsvm' not found"));

  assert!(env.calls().is_empty());
}

#[test]
fn missing_configuration_fails_before_any_process() {
  let env = TestEnv::new();

  env
    .bare_cmd()
    .arg("run")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("interpreter version is not set"));

  assert!(env.calls().is_empty());
}

#[test]
fn configuration_from_environment() {
  let env = TestEnv::new();

  env
    .bare_cmd()
    .env("MKPIPE_PYTHON_VERSION", "2.6")
    .env("MKPIPE_PYTHON_ROOT", env.python_root())
    .env("MKPIPE_PLATFORM", "linux-test")
    .arg("run")
    .assert()
    .success();

  assert!(env.project().join(SVMC).is_file());
}

#[test]
fn relative_python_root_resolves_from_invoking_dir() {
  let env = TestEnv::new();

  env
    .bare_cmd()
    .current_dir(env.temp.path())
    .args(["--python-version", "2.6", "--python-root", "python26", "--platform", "linux-test"])
    .args(["run", "ut-foo"])
    .assert()
    .success();

  let calls = env.calls();
  assert_eq!(calls.len(), 3);
  let include = calls[1].strip_prefix("build_ext ").unwrap();
  assert!(include.starts_with('/'), "{include}");
  assert!(include.ends_with("python26/include"), "{include}");
  assert!(calls[2].starts_with("test_foo "));
}

#[test]
fn wrong_interpreter_version_reports_missing_artifact() {
  let env = TestEnv::new();
  // Interpreter for 2.5 writes modules under lib.linux-test-2.6 (see setup.py)
  let bin = env.python_root().join("bin");
  std::fs::copy(bin.join("python2.6"), bin.join("python2.5")).unwrap();

  env
    .bare_cmd()
    .arg("--python-version")
    .arg("2.5")
    .arg("--python-root")
    .arg(env.python_root())
    .arg("--platform")
    .arg("linux-test")
    .arg("run")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("artifact 'smlrc' not found"))
    .stderr(predicate::str::contains("lib.linux-test-2.5"));
}

#[test]
fn single_test_runs_with_search_path() {
  let env = TestEnv::new();

  env.mkpipe().arg("run").arg("ut-foo").assert().success();

  let calls = env.calls();
  assert_eq!(calls.last().unwrap(), &format!("test_foo {}", env.project().display()));
  assert!(env.project().join(SVMC).is_file());
}

#[test]
fn failing_test_propagates_exit_code() {
  let env = TestEnv::new();

  env.mkpipe().arg("run").arg("ut-fail").assert().code(4);
  assert_eq!(env.calls().last().unwrap(), "test_fail");
}

#[test]
fn missing_test_script_fails() {
  let env = TestEnv::new();

  env
    .mkpipe()
    .arg("run")
    .arg("ut-nonexistent")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("test script for 'nonexistent' not found"));
}

#[test]
fn unittest_runs_suite() {
  let env = TestEnv::new();

  env.mkpipe().arg("run").arg("unittest").assert().success();
  assert_eq!(env.calls().last().unwrap(), "suite");
}

#[test]
fn repeated_test_runs_leave_build_up_to_date() {
  let env = TestEnv::new();
  env.write_file(
    "tests/main.py",
    "echo suite >> ../calls.log\nmkdir -p ../mvpa/clfs/libsmlrc/__pycache__\necho bc > ../mvpa/clfs/libsvmc/svmc.pyc\necho bc > ../mvpa/clfs/libsmlrc/__pycache__/smlr.pyc\n",
  );

  env.mkpipe().arg("run").arg("unittest").assert().success();
  env
    .mkpipe()
    .arg("run")
    .arg("unittest")
    .assert()
    .success()
    .stdout(predicate::str::contains("build is up to date"))
    .stdout(predicate::str::contains("Rebuilt: 0"));

  assert_eq!(env.calls().iter().filter(|c| c.starts_with("build_ext")).count(), 1);
}

#[test]
fn installer_runs_packaging_command() {
  let env = TestEnv::new();

  env.mkpipe().arg("run").arg("installer").assert().success();
  assert_eq!(
    env.calls().last().unwrap(),
    "installer bdist_wininst --bitmap doc/misc/logo/pymvpa_logo_win_installer.bmp"
  );
}

#[test]
fn clean_removes_output_and_forces_rebuild() {
  let env = TestEnv::new();
  env.mkpipe().arg("run").assert().success();

  env.bare_cmd().arg("run").arg("clean").assert().success();

  assert!(!env.project().join("build").exists());
  assert!(!env.project().join(SVMC).exists());
  assert!(!env.project().join("3rd/libsvm/libsvm.a").exists());
  assert!(env.project().join("3rd/libsvm/svm.cpp").exists());

  env.mkpipe().arg("run").assert().success();
  assert_eq!(env.calls().iter().filter(|c| c.as_str() == "make").count(), 2);
  assert_eq!(
    std::fs::read_to_string(env.project().join(SVMC)).unwrap(),
    "svmc module\n"
  );
}

#[test]
fn unknown_target_fails() {
  let env = TestEnv::new();

  env
    .mkpipe()
    .arg("run")
    .arg("deploy")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("unknown target: deploy"));
}

#[test]
fn json_report() {
  let env = TestEnv::new();

  let output = env.mkpipe().args(["--output", "json", "run"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["success"], true);
  assert_eq!(report["rebuilt"], 2);
  assert_eq!(report["outcomes"][0]["target"], "3rd");
  assert_eq!(report["outcomes"][0]["status"], "executed");
  assert!(report["failed"].is_null());
}
