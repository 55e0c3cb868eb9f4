//! `pinfold update` tests.

use predicates::prelude::*;

use super::common::{BERPF_DECL, TestEnv};

#[test]
fn evaluation_writes_the_lock_file() {
  let env = TestEnv::project(BERPF_DECL);
  env.pinfold_cmd().args(["show", "--no-check"]).assert().success();

  let lock = std::fs::read_to_string(env.lock_path()).unwrap();
  assert!(lock.contains("pkgs"));
}

#[test]
fn update_with_unchanged_inputs_reports_up_to_date() {
  let env = TestEnv::project(BERPF_DECL);
  env.pinfold_cmd().args(["show", "--no-check"]).assert().success();

  env
    .pinfold_cmd()
    .arg("update")
    .assert()
    .success()
    .stdout(predicate::str::contains("up to date"));
}

#[test]
fn update_picks_up_changed_path_input() {
  let env = TestEnv::project(BERPF_DECL);
  env.pinfold_cmd().args(["show", "--no-check"]).assert().success();
  let before = std::fs::read_to_string(env.lock_path()).unwrap();

  env.write_file("pkgs/README", "changed");
  env
    .pinfold_cmd()
    .args(["update", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Would update"));
  assert_eq!(std::fs::read_to_string(env.lock_path()).unwrap(), before);

  env
    .pinfold_cmd()
    .args(["update", "pkgs"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Updated"));
  assert_ne!(std::fs::read_to_string(env.lock_path()).unwrap(), before);
}

#[test]
fn update_of_undeclared_input_fails() {
  let env = TestEnv::project(BERPF_DECL);
  env
    .pinfold_cmd()
    .args(["update", "nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("nope"));
}
