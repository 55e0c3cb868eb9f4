//! Replication of one pure function across the supported target set.
//!
//! Each branch receives only its own [`Target`]. Nothing computed for one
//! target is visible to another, so branches can run in any order, lazily, or
//! in parallel without coordination. A failing branch stays in its own slot.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use super::{SystemSet, Target};

/// A total mapping from every supported target to one result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<R> {
  entries: BTreeMap<Target, R>,
}

impl<R> Matrix<R> {
  pub fn get(&self, target: &Target) -> Option<&R> {
    self.entries.get(target)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Target, &R)> {
    self.entries.iter()
  }

  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.entries.keys()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn into_inner(self) -> BTreeMap<Target, R> {
    self.entries
  }

  pub fn map<T>(self, mut f: impl FnMut(&Target, R) -> T) -> Matrix<T> {
    let entries = self.entries.into_iter().map(|(t, r)| {
      let mapped = f(&t, r);
      (t, mapped)
    });
    Matrix {
      entries: entries.collect(),
    }
  }
}

impl<T, E> Matrix<Result<T, E>> {
  /// Targets whose branch failed.
  pub fn failures(&self) -> impl Iterator<Item = (&Target, &E)> {
    self.entries.iter().filter_map(|(t, r)| r.as_ref().err().map(|e| (t, e)))
  }
}

impl<R> IntoIterator for Matrix<R> {
  type Item = (Target, R);
  type IntoIter = std::collections::btree_map::IntoIter<Target, R>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

/// Evaluate `f` once per target, sequentially.
pub fn expand<R, F>(systems: &SystemSet, f: F) -> Matrix<R>
where
  F: Fn(&Target) -> R,
{
  let entries = systems
    .iter()
    .map(|target| {
      debug!(%target, "expanding target");
      (target.clone(), f(target))
    })
    .collect();
  Matrix { entries }
}

/// Evaluate `f` once per target on the rayon pool.
///
/// The result is identical to [`expand`] for any pure `f`.
pub fn expand_parallel<R, F>(systems: &SystemSet, f: F) -> Matrix<R>
where
  R: Send,
  F: Fn(&Target) -> R + Sync,
{
  let targets: Vec<&Target> = systems.iter().collect();
  let entries = targets
    .into_par_iter()
    .map(|target| {
      debug!(%target, "expanding target");
      (target.clone(), f(target))
    })
    .collect::<Vec<_>>()
    .into_iter()
    .collect();
  Matrix { entries }
}
