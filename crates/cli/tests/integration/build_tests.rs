//! `pinfold build` tests.

use predicates::prelude::*;
use serde_json::Value;

use super::common::{BERPF_DECL, TestEnv};

fn build_json(env: &TestEnv, extra: &[&str]) -> Value {
  let output = env
    .pinfold_cmd()
    .args(["build", "--system", "x86_64-linux", "--json"])
    .args(extra)
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "build failed: {}",
    String::from_utf8_lossy(&output.stderr)
  );
  serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn builds_against_the_shell_runtime_by_default() {
  let env = TestEnv::project(BERPF_DECL);
  let artifact = build_json(&env, &["--no-check"]);

  assert_eq!(artifact["kind"], "package");
  assert_eq!(artifact["name"], "berpf");
  assert_eq!(artifact["target"], "x86_64-linux");
  assert_eq!(artifact["runtime"]["id"], "python310");
}

#[test]
fn same_package_builds_against_an_older_runtime() {
  let env = TestEnv::project(BERPF_DECL);
  let on_310 = build_json(&env, &["--no-check"]);
  let on_39 = build_json(&env, &["--no-check", "--runtime", "python39"]);

  assert_eq!(on_39["runtime"]["id"], "python39");
  assert_eq!(on_39["runtime"]["version"], "3.9.18");
  assert_ne!(on_310["hash"], on_39["hash"]);
}

#[test]
fn repeated_builds_are_identical() {
  let env = TestEnv::project(BERPF_DECL);
  let first = build_json(&env, &["--no-check"]);
  let second = build_json(&env, &["--no-check"]);
  assert_eq!(first["hash"], second["hash"]);
}

#[test]
fn runtime_below_minimum_is_rejected() {
  let env = TestEnv::project(&BERPF_DECL.replace(r#"min_runtime = "3.9""#, r#"min_runtime = "3.10""#));

  env
    .pinfold_cmd()
    .args(["build", "--system", "x86_64-linux", "--no-check", "--runtime", "python39"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("requires runtime"));
}

#[test]
fn unresolved_dependency_is_named() {
  let env = TestEnv::project(&BERPF_DECL.replace(r#"check_deps = { "pytest" }"#, r#"check_deps = { "pytest", "hypothesis" }"#));

  env
    .pinfold_cmd()
    .args(["build", "--system", "x86_64-linux", "--no-check"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("hypothesis"));
}

#[test]
fn unsupported_system_is_rejected() {
  let env = TestEnv::project(BERPF_DECL);

  env
    .pinfold_cmd()
    .args(["build", "--system", "riscv64-linux", "--no-check"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("riscv64-linux"));
}

#[cfg(unix)]
#[test]
fn failing_check_fails_the_build() {
  let env = TestEnv::project(&BERPF_DECL.replace(r#"check = "true""#, r#"check = "echo broken >&2; exit 3""#));

  env
    .pinfold_cmd()
    .args(["build", "--system", "x86_64-linux"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("check failed for 'berpf'"));
}

#[cfg(unix)]
#[test]
fn passing_check_produces_an_artifact() {
  let env = TestEnv::project(BERPF_DECL);
  let artifact = build_json(&env, &[]);
  assert_eq!(artifact["name"], "berpf");
}
