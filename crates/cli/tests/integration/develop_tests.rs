//! `pinfold develop` tests.

use predicates::prelude::*;
use serde_json::Value;

use super::common::{BERPF_DECL, TestEnv};

#[test]
fn shell_contains_the_package_itself() {
  let env = TestEnv::project(BERPF_DECL);
  let output = env
    .pinfold_cmd()
    .args(["develop", "--system", "x86_64-linux", "--no-check", "--json"])
    .output()
    .unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let shell: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(shell["kind"], "shell");
  assert_eq!(shell["name"], "berpf-shell");
  assert_eq!(shell["runtime_closure"]["berpf"], "0.0.1");
  assert_eq!(shell["runtime_closure"]["ipython"], "8.18.1");
  assert_eq!(shell["tools"]["pyright"], "1.1.350");
}

#[test]
fn text_output_names_the_shell() {
  let env = TestEnv::project(BERPF_DECL);
  env
    .pinfold_cmd()
    .args(["develop", "--system", "aarch64-darwin", "--no-check"])
    .assert()
    .success()
    .stdout(predicate::str::contains("berpf-shell"))
    .stdout(predicate::str::contains("python310"));
}

#[test]
fn missing_declaration_fails() {
  let env = TestEnv::empty();
  env
    .pinfold_cmd()
    .args(["develop", "--system", "x86_64-linux"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Declaration not found"));
}

#[test]
fn unknown_extension_fails() {
  let env = TestEnv::project(&BERPF_DECL.replace(r#"extensions = { "ipython" }"#, r#"extensions = { "jupyterlab" }"#));
  env
    .pinfold_cmd()
    .args(["develop", "--system", "x86_64-linux", "--no-check"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("jupyterlab"));
}
