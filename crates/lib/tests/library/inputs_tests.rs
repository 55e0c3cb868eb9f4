//! Input pinning and systems sources through a full evaluation.

use std::collections::HashSet;

use pinfold_lib::consts::LOCK_FILENAME;
use pinfold_lib::eval::{EvalError, EvalOptions, evaluate_with};
use pinfold_lib::inputs::InputError;
use pinfold_lib::inputs::lock::LockFile;

use super::common::{BERPF_DECL, FakeRemote, Project, t};

const GIT_DECL: &str = r#"
return {
  inputs = {
    pkgs = "git:https://example.invalid/pkg-index.git",
  },
  systems = { "x86_64-linux" },
  shell = { runtime = "3.10" },
}
"#;

fn lock(project: &Project) -> LockFile {
  LockFile::load(&project.root().join(LOCK_FILENAME)).unwrap().unwrap()
}

#[test]
fn first_evaluation_pins_git_inputs() {
  let project = Project::new(GIT_DECL);
  let remote = FakeRemote::default();
  remote.serve("https://example.invalid/pkg-index.git", &project.root().join("pkgs"), "aaaa1111");

  let eval = project.evaluate(&remote).unwrap();
  assert_eq!(eval.registry.get("pkgs").unwrap().rev, "aaaa1111");
  assert_eq!(lock(&project).get("pkgs").unwrap().rev, "aaaa1111");
}

#[test]
fn later_evaluations_reuse_the_pin() {
  let project = Project::new(GIT_DECL);
  let remote = FakeRemote::default();
  remote.serve("https://example.invalid/pkg-index.git", &project.root().join("pkgs"), "aaaa1111");
  project.evaluate(&remote).unwrap();

  remote.serve("https://example.invalid/pkg-index.git", &project.root().join("pkgs"), "bbbb2222");
  let eval = project.evaluate(&remote).unwrap();

  assert_eq!(eval.registry.get("pkgs").unwrap().rev, "aaaa1111");
  let requests = remote.requests.borrow();
  assert_eq!(requests.last().unwrap().1.as_deref(), Some("aaaa1111"));
}

#[test]
fn forced_update_moves_the_pin() {
  let project = Project::new(GIT_DECL);
  let remote = FakeRemote::default();
  remote.serve("https://example.invalid/pkg-index.git", &project.root().join("pkgs"), "aaaa1111");
  project.evaluate(&remote).unwrap();

  remote.serve("https://example.invalid/pkg-index.git", &project.root().join("pkgs"), "bbbb2222");
  let options = EvalOptions {
    force_update: Some(HashSet::from(["pkgs".to_string()])),
    ..EvalOptions::default()
  };
  let eval = evaluate_with(&project.decl_path(), &remote, &options).unwrap();

  assert_eq!(eval.registry.get("pkgs").unwrap().rev, "bbbb2222");
  assert_eq!(lock(&project).get("pkgs").unwrap().rev, "bbbb2222");
}

#[test]
fn changed_url_requires_an_update() {
  let project = Project::new(GIT_DECL);
  let remote = FakeRemote::default();
  remote.serve("https://example.invalid/pkg-index.git", &project.root().join("pkgs"), "aaaa1111");
  project.evaluate(&remote).unwrap();

  project.write("pinfold.lua", &GIT_DECL.replace("pkg-index.git", "other-index.git"));
  remote.serve("https://example.invalid/other-index.git", &project.root().join("pkgs"), "cccc3333");

  assert!(matches!(project.evaluate(&remote), Err(EvalError::Resolve(_))));
}

#[test]
fn non_evaluable_input_cannot_supply_a_declaration() {
  let project = Project::new(&BERPF_DECL.replace(
    r#"systems = { "x86_64-linux", "aarch64-linux", "x86_64-darwin", "aarch64-darwin" }"#,
    r#"systems = { input = "pkgs" }"#,
  ));

  let err = project.evaluate(&FakeRemote::default()).unwrap_err();
  assert!(
    matches!(err, EvalError::Input(InputError::NotEvaluable { ref name }) if name == "pkgs"),
    "{err}"
  );
}

#[test]
fn non_evaluable_input_still_serves_raw_files() {
  let project = Project::new(&BERPF_DECL.replace(
    r#"systems = { "x86_64-linux", "aarch64-linux", "x86_64-darwin", "aarch64-darwin" }"#,
    r#"systems = { input = "pkgs", file = "systems.json" }"#,
  ));
  project.write("pkgs/systems.json", r#"["x86_64-linux", "aarch64-darwin"]"#);

  let eval = project.evaluate(&FakeRemote::default()).unwrap();
  assert_eq!(eval.systems.len(), 2);
  assert!(eval.systems.contains(&t("aarch64-darwin")));
}

#[test]
fn systems_from_an_evaluable_input() {
  let project = Project::new(
    r#"
    return {
      inputs = {
        pkgs = "path:./pkgs",
        systems = "path:./systems",
      },
      systems = { input = "systems" },
      shell = { runtime = "3.10" },
    }
  "#,
  );
  project.write("systems/pinfold.lua", r#"return { systems = { "aarch64-linux" } }"#);

  let eval = project.evaluate(&FakeRemote::default()).unwrap();
  let targets: Vec<_> = eval.systems.iter().map(|t| t.as_str().to_string()).collect();
  assert_eq!(targets, ["aarch64-linux"]);
}

#[test]
fn evaluable_input_without_declaration_fails() {
  let project = Project::new(
    r#"
    return {
      inputs = { pkgs = "path:./pkgs" },
      systems = { input = "pkgs" },
      shell = { runtime = "3.10" },
    }
  "#,
  );

  assert!(matches!(
    project.evaluate(&FakeRemote::default()),
    Err(EvalError::Input(InputError::MissingDeclaration { .. }))
  ));
}

#[test]
fn undeclared_index_input_fails() {
  let project = Project::new(
    r#"
    return {
      inputs = {},
      systems = { "x86_64-linux" },
      shell = { runtime = "3.10" },
    }
  "#,
  );

  assert!(matches!(
    project.evaluate(&FakeRemote::default()),
    Err(EvalError::Resolve(_))
  ));
}
