//! Expansion of a whole evaluation across its supported targets.

use pinfold_lib::eval::TargetError;

use super::common::{BERPF_DECL, FakeRemote, PassCheck, Project, t};

#[test]
fn every_supported_target_has_one_slot() {
  let project = Project::new(BERPF_DECL);
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let matrix = eval.expand(&PassCheck);
  assert_eq!(matrix.len(), 4);
  for target in eval.systems.iter() {
    let outputs = matrix.get(target).unwrap();
    assert_eq!(&outputs.package.as_ref().unwrap().target, target);
    assert_eq!(&outputs.shell.as_ref().unwrap().target, target);
  }
}

#[test]
fn parallel_expansion_matches_sequential() {
  let project = Project::new(BERPF_DECL);
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let sequential = eval.expand(&PassCheck);
  let parallel = eval.expand_parallel(&PassCheck);
  assert_eq!(sequential.len(), parallel.len());
  for (target, outputs) in sequential.iter() {
    let other = parallel.get(target).unwrap();
    assert_eq!(outputs.shell.as_ref().unwrap().hash, other.shell.as_ref().unwrap().hash);
    assert_eq!(outputs.package.as_ref().unwrap().hash, other.package.as_ref().unwrap().hash);
  }
}

#[test]
fn artifacts_differ_only_by_target() {
  let project = Project::new(BERPF_DECL);
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let linux = eval.shell(&t("x86_64-linux"), &PassCheck).unwrap();
  let darwin = eval.shell(&t("aarch64-darwin"), &PassCheck).unwrap();
  assert_eq!(linux.runtime_closure, darwin.runtime_closure);
  assert_ne!(linux.hash, darwin.hash);
}

#[test]
fn failing_target_does_not_affect_others() {
  let project = Project::new(&BERPF_DECL.replace(r#"tools = { "pyright" }"#, r#"tools = { "pyright", "valgrind" }"#));
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let matrix = eval.expand_parallel(&PassCheck);
  assert_eq!(matrix.len(), 4);
  let failed: Vec<_> = matrix
    .iter()
    .filter(|(_, outputs)| outputs.shell.is_err())
    .map(|(target, _)| target.as_str().to_string())
    .collect();
  assert_eq!(failed.len(), 3);
  assert!(!failed.contains(&"x86_64-linux".to_string()));
  assert!(matrix.iter().all(|(_, outputs)| outputs.package.is_ok()));
  assert!(matches!(
    matrix.get(&t("aarch64-darwin")).unwrap().shell,
    Err(TargetError::Assemble(_))
  ));
}
