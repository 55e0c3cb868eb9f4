//! `pinfold show` tests.

use predicates::prelude::*;
use serde_json::Value;

use super::common::{BERPF_DECL, TestEnv};

fn show_json(env: &TestEnv, parallel: bool) -> (bool, Value) {
  let mut cmd = env.pinfold_cmd();
  cmd.args(["show", "--no-check", "--json"]);
  if parallel {
    cmd.arg("--parallel");
  }
  let output = cmd.output().unwrap();
  (output.status.success(), serde_json::from_slice(&output.stdout).unwrap())
}

#[test]
fn every_supported_target_is_reported() {
  let env = TestEnv::project(BERPF_DECL);
  let (ok, report) = show_json(&env, false);
  assert!(ok);

  let systems = report["systems"].as_object().unwrap();
  let mut targets: Vec<&str> = systems.keys().map(String::as_str).collect();
  targets.sort();
  assert_eq!(targets, ["aarch64-darwin", "x86_64-linux"]);
  for slot in systems.values() {
    assert_eq!(slot["package"]["name"], "berpf");
    assert_eq!(slot["shell"]["name"], "berpf-shell");
  }
  assert!(report["inputs"]["pkgs"].is_string());
}

#[test]
fn parallel_matches_sequential() {
  let env = TestEnv::project(BERPF_DECL);
  let (_, sequential) = show_json(&env, false);
  let (_, parallel) = show_json(&env, true);
  assert_eq!(sequential, parallel);
}

#[test]
fn failure_on_one_target_leaves_the_others() {
  let env = TestEnv::project(&BERPF_DECL.replace(r#"extensions = { "ipython" }"#, r#"extensions = { "ipython", "numpy" }"#));
  let (ok, report) = show_json(&env, false);
  assert!(!ok);

  assert_eq!(report["systems"]["x86_64-linux"]["shell"]["name"], "berpf-shell");
  let err = report["systems"]["aarch64-darwin"]["shell"]["error"].as_str().unwrap();
  assert!(err.contains("numpy"), "{err}");
}

#[test]
fn text_output_lists_targets() {
  let env = TestEnv::project(BERPF_DECL);
  env
    .pinfold_cmd()
    .args(["show", "--no-check"])
    .assert()
    .success()
    .stdout(predicate::str::contains("2 supported target(s)"))
    .stdout(predicate::str::contains("aarch64-darwin"));
}
