//! Read-only passes over a program: tree walking and block analysis.
pub mod analyzer;
pub mod visitor;

pub use analyzer::{Analysis, Diagnostic, DiagnosticKind, Severity, analyze_block, analyze_program};
