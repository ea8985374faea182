//! Block analysis: walks a statement tree against the language definition
//! and collects structural errors and warnings per statement `uuid`.
//!
//! Checks per statement, in order:
//!
//! 1. the id has a descriptor (`UnknownStatement`, remaining checks skipped)
//! 2. `predecessors` / `avoidPredecessors` against the previous sibling
//! 3. `parents` / `avoidParents` against the enclosing statement
//! 4. the enclosing statement's `nestedStatements` / `avoidNestedStatements`,
//!    applied to every direct child whatever its shape (unit children of a
//!    `switch` are rejected the same way as compound ones)
//! 5. boolean-expression arguments (operators, missing operands, including
//!    bare operands grouped directly under `&&` / `||` / `!`)
//!
//! Nested blocks are visited through the shared pre-order walk. Procedure
//! bodies are analyzed once per pass, the first time an instance is met; an
//! instance reached while its own body is being expanded is reported as
//! `CyclicProcedure` instead of being followed.
//!
//! The analyzer never fails. Its output is a pure function of the tree, so
//! running it twice on the same program yields the same [`Analysis`].

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::visitor::{NodeContext, walk, walk_mut};
use crate::language::LanguageDefinition;
use crate::model::expression::{is_group_operator, is_leaf_operator, operator_is_unary};
use crate::model::{Block, DanglingReference, Expression, Operand, Program, Statement, Uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UnknownStatement,
    MissingPredecessor,
    ForbiddenPredecessor,
    InvalidParent,
    ForbiddenParent,
    DisallowedNesting,
    InvalidOperator,
    CyclicProcedure,
    IncompleteExpression,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnknownStatement => "UnknownStatement",
            DiagnosticKind::MissingPredecessor => "MissingPredecessor",
            DiagnosticKind::ForbiddenPredecessor => "ForbiddenPredecessor",
            DiagnosticKind::InvalidParent => "InvalidParent",
            DiagnosticKind::ForbiddenParent => "ForbiddenParent",
            DiagnosticKind::DisallowedNesting => "DisallowedNesting",
            DiagnosticKind::InvalidOperator => "InvalidOperator",
            DiagnosticKind::CyclicProcedure => "CyclicProcedure",
            DiagnosticKind::IncompleteExpression => "IncompleteExpression",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::IncompleteExpression => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Result of one analysis pass. Maps are keyed by statement `uuid` and keep
/// the order in which statements were visited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub errors: IndexMap<Uuid, Vec<Diagnostic>>,
    pub warnings: IndexMap<Uuid, Vec<Diagnostic>>,
    pub dangling: Vec<DanglingReference>,
}

impl Analysis {
    /// A statement is valid when it has no error entry.
    pub fn is_valid(&self, uuid: Uuid) -> bool {
        !self.errors.contains_key(&uuid)
    }

    pub fn errors_for(&self, uuid: Uuid) -> &[Diagnostic] {
        self.errors.get(&uuid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn warnings_for(&self, uuid: Uuid) -> &[Diagnostic] {
        self.warnings.get(&uuid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.dangling.is_empty()
    }

    fn push(&mut self, uuid: Uuid, kind: DiagnosticKind, message: String) {
        let map = match kind.severity() {
            Severity::Error => &mut self.errors,
            Severity::Warning => &mut self.warnings,
        };
        map.entry(uuid)
            .or_default()
            .push(Diagnostic { kind, message });
    }
}

fn one_of(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("`{id}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

struct Analyzer<'a> {
    lang: &'a LanguageDefinition,
    procedures: &'a IndexMap<String, Block>,
    analysis: Analysis,
    /// Procedures whose bodies are being walked right now.
    expanding: Vec<&'a str>,
    done: HashSet<&'a str>,
}

impl<'a> Analyzer<'a> {
    fn new(lang: &'a LanguageDefinition, procedures: &'a IndexMap<String, Block>) -> Self {
        Self {
            lang,
            procedures,
            analysis: Analysis::default(),
            expanding: Vec::new(),
            done: HashSet::new(),
        }
    }

    fn block(&mut self, block: &'a Block, parent: Option<&'a Statement>) {
        walk(block, parent, &mut |ctx| self.statement(ctx));
    }

    fn statement(&mut self, ctx: &NodeContext<'a>) {
        let lang = self.lang;
        let stmt = ctx.statement;
        let Some(desc) = lang.statement(&stmt.id) else {
            self.analysis.push(
                stmt.uuid,
                DiagnosticKind::UnknownStatement,
                format!("unknown statement `{}`", stmt.id),
            );
            return;
        };

        if !desc.predecessors.is_empty() {
            match ctx.previous {
                Some(prev) if desc.predecessors.contains(&prev.id) => {}
                Some(prev) => self.analysis.push(
                    stmt.uuid,
                    DiagnosticKind::MissingPredecessor,
                    format!(
                        "`{}` must follow {}, not `{}`",
                        stmt.id,
                        one_of(&desc.predecessors),
                        prev.id
                    ),
                ),
                None => self.analysis.push(
                    stmt.uuid,
                    DiagnosticKind::MissingPredecessor,
                    format!(
                        "`{}` must follow {}",
                        stmt.id,
                        one_of(&desc.predecessors)
                    ),
                ),
            }
        }
        if let Some(prev) = ctx.previous {
            if desc.avoid_predecessors.contains(&prev.id) {
                self.analysis.push(
                    stmt.uuid,
                    DiagnosticKind::ForbiddenPredecessor,
                    format!("`{}` cannot follow `{}`", stmt.id, prev.id),
                );
            }
        }

        match ctx.parent {
            Some(parent) => {
                if !desc.parents.is_empty() && !desc.parents.contains(&parent.id) {
                    self.analysis.push(
                        stmt.uuid,
                        DiagnosticKind::InvalidParent,
                        format!(
                            "`{}` must be inside {}, not `{}`",
                            stmt.id,
                            one_of(&desc.parents),
                            parent.id
                        ),
                    );
                }
                if desc.avoid_parents.contains(&parent.id) {
                    self.analysis.push(
                        stmt.uuid,
                        DiagnosticKind::ForbiddenParent,
                        format!("`{}` cannot be inside `{}`", stmt.id, parent.id),
                    );
                }
            }
            None if !desc.parents.is_empty() => self.analysis.push(
                stmt.uuid,
                DiagnosticKind::InvalidParent,
                format!("`{}` must be inside {}", stmt.id, one_of(&desc.parents)),
            ),
            None => {}
        }

        if let Some(parent) = ctx.parent {
            if let Some(parent_desc) = lang.statement(&parent.id) {
                let allowed = parent_desc.nested_statements.is_empty()
                    || parent_desc.nested_statements.contains(&stmt.id);
                let forbidden = parent_desc.avoid_nested_statements.contains(&stmt.id);
                if !allowed || forbidden {
                    self.analysis.push(
                        stmt.uuid,
                        DiagnosticKind::DisallowedNesting,
                        format!("`{}` does not accept `{}`", parent.id, stmt.id),
                    );
                }
            }
        }

        for arg in stmt.arguments() {
            if let Some(list) = arg.expression_list() {
                for expr in list {
                    self.expression(stmt.uuid, expr);
                }
            }
        }

        if desc.is_user_procedure {
            self.procedure_instance(stmt);
        }
    }

    fn expression(&mut self, owner: Uuid, expr: &Expression) {
        match expr {
            Expression::Leaf {
                operator,
                opd1,
                opd2,
                ..
            } => {
                if !is_leaf_operator(operator) {
                    self.analysis.push(
                        owner,
                        DiagnosticKind::InvalidOperator,
                        format!("`{operator}` is not a comparison operator"),
                    );
                }
                let incomplete = opd1.is_empty()
                    || (!operator_is_unary(operator)
                        && opd2.as_ref().is_none_or(Operand::is_empty));
                if incomplete {
                    self.analysis.push(
                        owner,
                        DiagnosticKind::IncompleteExpression,
                        format!("`{}` has an empty operand", expr.render()),
                    );
                }
            }
            Expression::Group {
                operator, operands, ..
            } => {
                if !is_group_operator(operator) {
                    self.analysis.push(
                        owner,
                        DiagnosticKind::InvalidOperator,
                        format!("`{operator}` cannot combine expressions"),
                    );
                }
                for child in operands {
                    self.expression(owner, child);
                }
            }
            Expression::Operand(opd) => {
                if opd.is_empty() {
                    self.analysis.push(
                        owner,
                        DiagnosticKind::IncompleteExpression,
                        "a grouped operand has no value".to_string(),
                    );
                }
            }
        }
    }

    fn procedure_instance(&mut self, stmt: &'a Statement) {
        let id = stmt.id.as_str();
        if self.expanding.contains(&id) {
            self.analysis.push(
                stmt.uuid,
                DiagnosticKind::CyclicProcedure,
                format!("procedure `{id}` ends up calling itself"),
            );
            return;
        }
        self.procedure_body(id);
    }

    fn procedure_body(&mut self, id: &'a str) {
        if self.done.contains(id) {
            return;
        }
        let Some(body) = self.procedures.get(id) else {
            return;
        };
        self.expanding.push(id);
        self.block(body, None);
        self.expanding.pop();
        self.done.insert(id);
    }
}

/// Analyzes one block without touching the tree. `parent` is the compound
/// statement that owns `block`, if any.
pub fn analyze_block(
    block: &Block,
    parent: Option<&Statement>,
    lang: &LanguageDefinition,
    procedures: &IndexMap<String, Block>,
) -> Analysis {
    let mut analyzer = Analyzer::new(lang, procedures);
    analyzer.block(block, parent);
    analyzer.analysis
}

/// Full pass over the root block and every procedure body. Refreshes the
/// `is_invalid` flag of every statement and reports dangling metadata.
pub fn analyze_program(program: &mut Program, lang: &LanguageDefinition) -> Analysis {
    let mut analysis = {
        let procedures = &program.header.user_procedures;
        let mut analyzer = Analyzer::new(lang, procedures);
        analyzer.block(&program.block, None);
        for id in procedures.keys() {
            analyzer.procedure_body(id);
        }
        analyzer.analysis
    };

    analysis.dangling = program.dangling_references();
    for dangling in &analysis.dangling {
        warn!(
            uuid = %dangling.uuid,
            source = ?dangling.source,
            "metadata references a removed statement"
        );
    }

    let mut mark = |stmt: &mut Statement, _depth: usize| {
        stmt.is_invalid = analysis.errors.contains_key(&stmt.uuid);
    };
    walk_mut(&mut program.block, &mut mark);
    for body in program.header.user_procedures.values_mut() {
        walk_mut(body, &mut mark);
    }

    debug!(
        errors = analysis.error_count(),
        warnings = analysis.warning_count(),
        dangling = analysis.dangling.len(),
        "analysis finished"
    );
    analysis
}
