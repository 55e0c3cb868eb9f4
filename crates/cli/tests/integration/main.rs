//! CLI integration tests against throwaway projects with `path:` inputs.

mod build_tests;
mod common;
mod develop_tests;
mod show_tests;
mod update_tests;
