//! Cross-module test suite
//!
//! Unit tests live beside their code; the suites here exercise the document,
//! placement rules and the full generation pipeline together.

#[cfg(test)]
mod core_tests;
