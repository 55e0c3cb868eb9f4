//! Package builds and shell assembly through a full evaluation.

use pinfold_lib::artifact::ArtifactKind;
use pinfold_lib::eval::TargetError;
use pinfold_lib::package::BuildError;
use pinfold_lib::shell::{AssembleError, assemble};

use super::common::{BERPF_DECL, FakeRemote, PassCheck, Project, t};

#[test]
fn package_builds_against_both_supported_runtimes() {
  let project = Project::new(BERPF_DECL);
  let eval = project.evaluate(&FakeRemote::default()).unwrap();
  let linux = t("x86_64-linux");

  let on_310 = eval.package(&linux, &PassCheck).unwrap();
  let on_39 = eval.package_with_runtime(&linux, "python39", &PassCheck).unwrap();

  assert_eq!(on_310.kind, ArtifactKind::Package);
  assert_eq!(on_310.runtime.id, "python310");
  assert_eq!(on_39.runtime.id, "python39");
  assert_eq!(on_310.runtime_closure["numpy"], "1.26.4");
  assert_eq!(on_39.runtime_closure["numpy"], "1.24.4");
  assert_eq!(on_310.source_hash, on_39.source_hash);
  assert_ne!(on_310.hash, on_39.hash);
}

#[test]
fn runtime_below_the_floor_is_unsupported() {
  let project = Project::new(&BERPF_DECL.replace(r#"min_runtime = "3.9""#, r#"min_runtime = "3.10""#));
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let err = eval
    .package_with_runtime(&t("x86_64-linux"), "python39", &PassCheck)
    .unwrap_err();
  assert!(matches!(
    err,
    TargetError::Build(BuildError::UnsupportedRuntime { .. })
  ));
}

#[test]
fn shell_includes_the_package_and_its_closure() {
  let project = Project::new(BERPF_DECL);
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let shell = eval.shell(&t("aarch64-darwin"), &PassCheck).unwrap();
  assert_eq!(shell.kind, ArtifactKind::Shell);
  assert_eq!(shell.name, "berpf-shell");
  assert_eq!(shell.runtime_closure["berpf"], "0.0.1");
  assert_eq!(shell.runtime_closure["numpy"], "1.26.4");
  assert_eq!(shell.runtime_closure["ipython"], "8.18.1");
  assert_eq!(shell.tools["pyright"], "1.1.350");
  assert!(!shell.runtime_closure.contains_key("pytest"));
}

#[test]
fn package_from_another_runtime_conflicts_in_the_shell() {
  let project = Project::new(&BERPF_DECL.replace(r#"extensions = { "ipython" }"#, r#"extensions = { "ipython", "numpy" }"#));
  let eval = project.evaluate(&FakeRemote::default()).unwrap();
  let linux = t("x86_64-linux");

  let on_39 = eval.package_with_runtime(&linux, "python39", &PassCheck).unwrap();
  let runtime = eval.runtime_for(&linux).unwrap();
  let spec = eval.declaration.shell.as_ref().unwrap();

  match assemble(spec, &runtime, &eval.index, Some(&on_39)).unwrap_err() {
    AssembleError::Conflict { left, right } => {
      assert_eq!(left.name, "numpy");
      assert_eq!(left.version, "1.26.4");
      assert_eq!(left.origin, "extension 'numpy'");
      assert_eq!(right.version, "1.24.4");
      assert_eq!(right.origin, "package 'berpf'");
    }
    other => panic!("expected conflict, got {other}"),
  }
}

#[test]
fn declared_conflicts_are_rejected() {
  let project = Project::new(&BERPF_DECL.replace(r#"extensions = { "ipython" }"#, r#"extensions = { "pillow", "pil" }"#));
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let err = eval.shell(&t("x86_64-linux"), &PassCheck).unwrap_err();
  assert!(matches!(err, TargetError::Assemble(AssembleError::Conflict { .. })), "{err}");
}

#[test]
fn missing_extension_is_unresolved() {
  let project = Project::new(&BERPF_DECL.replace(r#"extensions = { "ipython" }"#, r#"extensions = { "ipython", "jupyterlab" }"#));
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let err = eval.shell(&t("x86_64-linux"), &PassCheck).unwrap_err();
  match err {
    TargetError::Assemble(AssembleError::UnresolvedDependency { names, .. }) => {
      assert!(names.0.contains("jupyterlab"));
      assert_eq!(names.0.len(), 1);
    }
    other => panic!("expected unresolved dependency, got {other}"),
  }
}

#[test]
fn tier_overlap_is_an_invalid_input() {
  let project = Project::new(&BERPF_DECL.replace(r#"check_deps = { "pytest" }"#, r#"check_deps = { "pytest", "numpy" }"#));
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let err = eval.package(&t("x86_64-linux"), &PassCheck).unwrap_err();
  assert!(matches!(err, TargetError::Build(BuildError::OverlappingTiers { .. })), "{err}");
}

#[test]
fn platform_limited_dependency_fails_only_where_unavailable() {
  let project = Project::new(
    &BERPF_DECL
      .replace(r#"runtime_deps = { "numpy" }"#, r#"runtime_deps = { "numpy", "tensorflow" }"#),
  );
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let linux = eval.outputs(&t("x86_64-linux"), &PassCheck);
  assert!(linux.package.is_ok());
  assert!(linux.shell.is_ok());

  let darwin = eval.outputs(&t("aarch64-darwin"), &PassCheck);
  assert!(matches!(
    darwin.package,
    Err(TargetError::Build(BuildError::UnresolvedDependency { .. }))
  ));
  assert!(matches!(darwin.shell, Err(TargetError::PackageUnavailable { .. })));
}

#[test]
fn shell_only_declaration_assembles_without_a_package() {
  let project = Project::new(
    r#"
    return {
      inputs = { pkgs = "path:./pkgs" },
      systems = { "x86_64-linux" },
      shell = { runtime = "3.9", extensions = { "pytest" } },
    }
  "#,
  );
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  let shell = eval.shell(&t("x86_64-linux"), &PassCheck).unwrap();
  assert_eq!(shell.name, "shell");
  assert_eq!(shell.runtime.id, "python39");
  assert!(shell.runtime_closure.contains_key("pluggy"));
  assert!(matches!(
    eval.package(&t("x86_64-linux"), &PassCheck),
    Err(TargetError::NoPackage)
  ));
}

#[test]
fn unsupported_target_is_refused() {
  let project = Project::new(BERPF_DECL);
  let eval = project.evaluate(&FakeRemote::default()).unwrap();

  assert!(matches!(
    eval.shell(&t("riscv64-linux"), &PassCheck),
    Err(TargetError::UnsupportedTarget(_))
  ));
}
