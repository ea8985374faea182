//! Editing session: one program, the language it is checked against, and
//! the analysis that goes with it.
//!
//! Every edit runs as mutate, then full re-analysis, then observer
//! notification, all synchronously. `analysis()` is therefore always
//! current for `program()`.

use tracing::{info, warn};

use crate::error::{EditError, ImportError, RegisterError, VariableError};
use crate::language::LanguageDefinition;
use crate::model::{Block, BlockId, Program, Statement, Uuid, ValueType};
use crate::parser;
use crate::processor::analyzer::{Analysis, analyze_program};
use crate::writer::json::to_json_pretty;

pub type Observer = Box<dyn FnMut(&Program, &Analysis)>;

pub struct Editor {
    lang: LanguageDefinition,
    program: Program,
    analysis: Analysis,
    observers: Vec<Observer>,
}

impl Editor {
    pub fn new(lang: LanguageDefinition) -> Self {
        Self::with_program(lang, Program::new())
    }

    /// Starts a session on an existing program, registering its procedures
    /// and user variables in `lang`.
    pub fn with_program(lang: LanguageDefinition, program: Program) -> Self {
        let mut editor = Self {
            lang,
            program: Program::new(),
            analysis: Analysis::default(),
            observers: Vec::new(),
        };
        editor.replace_program(program);
        editor
    }

    pub fn language(&self) -> &LanguageDefinition {
        &self.lang
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&Program, &Analysis) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn refresh(&mut self) {
        self.analysis = analyze_program(&mut self.program, &self.lang);
        for observer in &mut self.observers {
            observer(&self.program, &self.analysis);
        }
    }

    /// Arbitrary edit on the program (expression edits, argument values...)
    /// followed by re-analysis.
    pub fn edit<T>(&mut self, f: impl FnOnce(&mut Program) -> T) -> T {
        let out = f(&mut self.program);
        self.refresh();
        out
    }

    /// Appends a fresh instance of statement `id` to the block `at`.
    /// Returns `None` when `id` is not in the language.
    pub fn add_statement(&mut self, at: &BlockId, id: &str) -> Option<Result<Uuid, EditError>> {
        let template = self.lang.instantiate(id)?;
        Some(self.add_template(at, template))
    }

    pub fn add_template(&mut self, at: &BlockId, template: Statement) -> Result<Uuid, EditError> {
        let uuid = self.program.add_statement(at, template)?.uuid;
        self.refresh();
        Ok(uuid)
    }

    pub fn remove_statement(&mut self, at: &BlockId, index: usize) -> Result<Statement, EditError> {
        let removed = self.program.remove_statement(at, index)?;
        self.refresh();
        Ok(removed)
    }

    pub fn move_statement(
        &mut self,
        at: &BlockId,
        from: usize,
        to: usize,
    ) -> Result<(), EditError> {
        self.program.move_statement(at, from, to)?;
        self.refresh();
        Ok(())
    }

    pub fn transfer_statement(
        &mut self,
        from: &BlockId,
        from_index: usize,
        to: &BlockId,
        to_index: usize,
    ) -> Result<(), EditError> {
        self.program.transfer_statement(from, from_index, to, to_index)?;
        self.refresh();
        Ok(())
    }

    pub fn add_user_variable(
        &mut self,
        name: &str,
        ty: ValueType,
        value: impl Into<serde_json::Value>,
    ) -> Result<(), VariableError> {
        self.program.add_user_variable(name, ty, value)?;
        self.lang.register_user_variable(name, ty);
        self.refresh();
        Ok(())
    }

    pub fn remove_user_variable(&mut self, name: &str) {
        if self.program.remove_user_variable(name).is_some() {
            self.lang.unregister_user_variable(name);
            self.refresh();
        }
    }

    /// Registers a procedure in the language and stores its body.
    pub fn register_procedure(
        &mut self,
        id: &str,
        label: &str,
        icon: Option<&str>,
        colors: &[&str],
        body: Block,
    ) -> Result<(), RegisterError> {
        self.lang.register_user_procedure(id, label, icon, colors)?;
        if self.program.add_user_procedure(id, body).is_err() {
            self.lang.unregister_user_procedure(id);
            return Err(RegisterError::NameTaken(id.to_string()));
        }
        self.refresh();
        Ok(())
    }

    /// Drops a procedure; instances left in the tree show up as unknown
    /// statements.
    pub fn unregister_procedure(&mut self, id: &str) {
        self.lang.unregister_user_procedure(id);
        self.program.remove_user_procedure(id);
        self.refresh();
    }

    /// Replaces the program with a parsed document. On failure the current
    /// program is kept as is.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let program = parser::load_program(json)?;
        self.replace_program(program);
        Ok(())
    }

    /// Merges the procedures of another document. If any procedure id is
    /// already taken nothing is merged and every colliding id is reported.
    pub fn import_procedures(&mut self, json: &str) -> Result<(), ImportError> {
        let procedures = parser::load_procedures(json)?;
        let taken: Vec<String> = procedures
            .keys()
            .filter(|id| {
                self.program.header.user_procedures.contains_key(*id)
                    || self.lang.statement(id).is_some()
            })
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(ImportError::DuplicateProcedures(taken));
        }

        let count = procedures.len();
        for (id, body) in procedures {
            let taken = || ImportError::DuplicateProcedures(vec![id.clone()]);
            self.lang
                .register_user_procedure(&id, &id, None, &[])
                .map_err(|_| taken())?;
            self.program
                .add_user_procedure(&id, body)
                .map_err(|_| taken())?;
        }
        info!(count, "procedures imported");
        self.refresh();
        Ok(())
    }

    pub fn export_json(&self) -> String {
        to_json_pretty(&self.program)
    }

    fn replace_program(&mut self, program: Program) {
        let old_procs: Vec<String> =
            self.program.header.user_procedures.keys().cloned().collect();
        for id in &old_procs {
            self.lang.unregister_user_procedure(id);
        }
        let old_vars: Vec<String> =
            self.program.header.user_variables.keys().cloned().collect();
        for name in &old_vars {
            self.lang.unregister_user_variable(name);
        }

        for id in program.header.user_procedures.keys() {
            if let Err(e) = self.lang.register_user_procedure(id, id, None, &[]) {
                warn!(%id, error = %e, "procedure shadows an existing statement");
            }
        }
        for (name, var) in &program.header.user_variables {
            self.lang.register_user_variable(name, var.ty);
        }

        self.program = program;
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::analyzer::DiagnosticKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_every_edit_reanalyzes_and_notifies() {
        let mut editor = Editor::new(LanguageDefinition::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.subscribe(move |_, analysis| sink.borrow_mut().push(analysis.error_count()));

        let else_uuid = editor
            .add_statement(&BlockId::Root, "else")
            .unwrap()
            .unwrap();
        assert_eq!(
            editor.analysis().errors_for(else_uuid)[0].kind,
            DiagnosticKind::MissingPredecessor
        );

        editor
            .add_statement(&BlockId::Root, "if")
            .unwrap()
            .unwrap();
        editor.move_statement(&BlockId::Root, 1, 0).unwrap();

        assert!(editor.analysis().errors.is_empty());
        assert_eq!(*seen.borrow(), vec![1, 1, 0]);
    }

    #[test]
    fn test_unknown_statement_id_is_not_added() {
        let mut editor = Editor::new(LanguageDefinition::new());
        assert!(editor.add_statement(&BlockId::Root, "teleport").is_none());
        assert!(editor.program().block.is_empty());
    }

    #[test]
    fn test_failed_import_keeps_program() {
        let mut editor = Editor::new(LanguageDefinition::new());
        editor.add_statement(&BlockId::Root, "if").unwrap().unwrap();
        let before = editor.export_json();

        assert!(editor.import_json("{ not json").is_err());
        assert!(editor.import_json(r#"{ "header": {} }"#).is_err());
        assert_eq!(editor.export_json(), before);
    }

    #[test]
    fn test_import_registers_procedures_and_variables() {
        let mut editor = Editor::new(LanguageDefinition::new());
        editor
            .import_json(
                r#"{
                    "header": {
                        "userVariables": { "x": { "type": "number", "value": 3 } },
                        "userProcedures": { "blink": [] }
                    },
                    "block": [ { "id": "blink" } ]
                }"#,
            )
            .unwrap();

        assert!(editor.language().is_user_procedure("blink"));
        assert!(editor.language().variable("x").is_some());
        assert!(editor.analysis().errors.is_empty());

        editor.import_json(r#"{ "block": [] }"#).unwrap();
        assert!(editor.language().statement("blink").is_none());
        assert!(editor.language().variable("x").is_none());
    }

    #[test]
    fn test_import_procedures_rejects_duplicates() {
        let mut editor = Editor::new(LanguageDefinition::new());
        editor
            .register_procedure("blink", "Blink", None, &[], vec![])
            .unwrap();

        let err = editor
            .import_procedures(r#"{ "userProcedures": { "blink": [], "if": [], "fade": [] } }"#)
            .unwrap_err();
        match err {
            ImportError::DuplicateProcedures(ids) => assert_eq!(ids, vec!["blink", "if"]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(editor.language().statement("fade").is_none());

        editor
            .import_procedures(r#"{ "userProcedures": { "fade": [ { "id": "else" } ] } }"#)
            .unwrap();
        assert!(editor.language().is_user_procedure("fade"));
        assert_eq!(editor.analysis().error_count(), 1);
    }

    #[test]
    fn test_register_and_unregister_procedure() {
        let mut editor = Editor::new(LanguageDefinition::new());
        editor
            .register_procedure("blink", "Blink", Some("bulb"), &["#ff0"], vec![])
            .unwrap();
        assert_eq!(
            editor.register_procedure("blink", "Blink", None, &[], vec![]),
            Err(RegisterError::NameTaken("blink".into()))
        );

        let instance = editor
            .add_statement(&BlockId::Root, "blink")
            .unwrap()
            .unwrap();
        assert!(editor.analysis().is_valid(instance));

        editor.unregister_procedure("blink");
        assert_eq!(
            editor.analysis().errors_for(instance)[0].kind,
            DiagnosticKind::UnknownStatement
        );
    }

    #[test]
    fn test_user_variables_are_mirrored() {
        let mut editor = Editor::new(LanguageDefinition::new());
        editor
            .add_user_variable("x", ValueType::Number, "5")
            .unwrap();
        assert_eq!(
            editor.add_user_variable("x", ValueType::String, "a"),
            Err(VariableError::NameExists("x".into()))
        );
        assert_eq!(editor.language().variable("x").unwrap().ty, ValueType::Number);

        editor.remove_user_variable("x");
        editor.remove_user_variable("x");
        assert!(editor.language().variable("x").is_none());
    }

    #[test]
    fn test_edit_closure_reanalyzes() {
        let mut editor = Editor::new(LanguageDefinition::new());
        let uuid = editor
            .add_statement(&BlockId::Root, "if")
            .unwrap()
            .unwrap();
        assert!(editor.analysis().is_valid(uuid));

        editor.edit(|program| program.block[0].id = "elseif".into());
        assert!(!editor.analysis().is_valid(uuid));
        assert!(editor.program().block[0].is_invalid);
    }
}
