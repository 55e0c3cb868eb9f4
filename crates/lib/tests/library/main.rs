//! End-to-end evaluation tests against on-disk projects.

mod common;
mod evaluation_tests;
mod inputs_tests;
mod matrix_tests;
