use std::fs;

use iotblocks_rust::editor::Editor;
use iotblocks_rust::error::ImportError;
use iotblocks_rust::language::LanguageDefinition;
use iotblocks_rust::language::devices::parse_devices;
use iotblocks_rust::model::expression::parse_grouped_expressions;
use iotblocks_rust::model::{BlockId, ValueType};
use iotblocks_rust::parser::load_program;
use iotblocks_rust::processor::{DiagnosticKind, analyze_program};
use iotblocks_rust::writer::json::to_json_pretty;
use iotblocks_rust::writer::text;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}")).unwrap()
}

fn language() -> LanguageDefinition {
    let devices = parse_devices(&fixture("devices.json")).expect("valid device list");
    LanguageDefinition::build(&devices)
}

fn kinds(analysis: &iotblocks_rust::processor::Analysis) -> Vec<DiagnosticKind> {
    analysis
        .errors
        .values()
        .flatten()
        .map(|d| d.kind)
        .collect()
}

#[test]
fn loads_fixture_program() {
    let program = load_program(&fixture("program.json")).expect("valid program");

    assert_eq!(program.block.len(), 3);
    assert_eq!(
        program.header.user_variables["threshold"].ty,
        ValueType::Number
    );
    assert_eq!(program.header.user_procedures["lightsOn"].len(), 2);

    let condition = program.block[0].arguments()[0].expression_list().unwrap();
    assert_eq!(
        parse_grouped_expressions(condition),
        "($thermo.temperature > $threshold && !$lamp.on)"
    );
}

#[test]
fn device_catalog_drives_analysis() {
    let devices = parse_devices(&fixture("devices.json")).unwrap();
    assert_eq!(devices.len(), 2);

    let mut editor = Editor::new(language());
    editor.import_json(&fixture("program.json")).unwrap();
    assert!(editor.analysis().is_clean(), "{:?}", editor.analysis());
    assert!(editor.language().variable("lamp.on").is_some());
    assert!(editor.language().variable("threshold").is_some());

    let mut bare = Editor::new(LanguageDefinition::new());
    bare.import_json(&fixture("program.json")).unwrap();
    assert_eq!(
        kinds(bare.analysis()),
        vec![DiagnosticKind::UnknownStatement, DiagnosticKind::UnknownStatement]
    );
    let lights_on = &bare.program().header.user_procedures["lightsOn"];
    assert!(lights_on.iter().all(|s| s.is_invalid));
    assert!(!bare.program().block[0].is_invalid);
}

#[test]
fn reports_structural_errors() {
    let mut program = load_program(&fixture("invalid.json")).unwrap();
    let analysis = analyze_program(&mut program, &language());

    assert_eq!(
        kinds(&analysis),
        vec![
            DiagnosticKind::MissingPredecessor,
            DiagnosticKind::InvalidParent,
            DiagnosticKind::UnknownStatement,
            DiagnosticKind::DisallowedNesting,
            DiagnosticKind::InvalidOperator,
        ]
    );
    assert_eq!(analysis.warning_count(), 1);

    let nested_wait = program.block[3].block().unwrap()[0].uuid;
    assert!(!analysis.is_valid(nested_wait));
    assert!(program.block[3].block().unwrap()[0].is_invalid);
    assert!(!program.block[3].is_invalid);

    let while_uuid = program.block[4].uuid;
    assert_eq!(
        analysis.warnings_for(while_uuid)[0].kind,
        DiagnosticKind::IncompleteExpression
    );

    let again = analyze_program(&mut program, &language());
    assert_eq!(again, analysis);
}

#[test]
fn export_then_import_is_identity() {
    let program = load_program(&fixture("program.json")).unwrap();
    let exported = to_json_pretty(&program);
    let reloaded = load_program(&exported).unwrap();

    assert_eq!(reloaded, program);
    assert_eq!(to_json_pretty(&reloaded), exported);
    assert_ne!(reloaded.block[0].uuid, program.block[0].uuid);
}

#[test]
fn edits_survive_export() {
    let mut editor = Editor::new(language());
    editor.import_json(&fixture("program.json")).unwrap();

    let else_uuid = editor.program().block[1].uuid;
    editor
        .add_statement(&BlockId::Statement(else_uuid), "lamp.turnOn")
        .unwrap()
        .unwrap();
    editor.remove_statement(&BlockId::Root, 2).unwrap();
    editor
        .add_user_variable("label", ValueType::String, "kitchen")
        .unwrap();

    let exported = editor.export_json();
    let mut reloaded = Editor::new(language());
    reloaded.import_json(&exported).unwrap();

    assert_eq!(reloaded.program(), editor.program());
    assert_eq!(reloaded.program().block[1].block().unwrap().len(), 2);
    assert!(reloaded.analysis().is_clean());
}

#[test]
fn merges_procedures_once() {
    let mut editor = Editor::new(language());
    editor.import_json(&fixture("program.json")).unwrap();

    editor.import_procedures(&fixture("procedures.json")).unwrap();
    assert!(editor.language().is_user_procedure("nightMode"));
    assert_eq!(editor.program().header.user_procedures.len(), 2);

    match editor.import_procedures(&fixture("procedures.json")) {
        Err(ImportError::DuplicateProcedures(ids)) => assert_eq!(ids, vec!["nightMode"]),
        other => panic!("expected duplicate procedures, got {other:?}"),
    }
    assert_eq!(editor.program().header.user_procedures.len(), 2);
}

#[test]
fn renders_tree_listing() {
    let mut editor = Editor::new(language());
    editor.import_json(&fixture("program.json")).unwrap();

    let listing = text::render(editor.program(), editor.analysis());
    let expected = "\
procedure lightsOn:
  lamp.turnOn
  lamp.dim 80
block:
  if ($thermo.temperature > $threshold && !$lamp.on)
    lightsOn
  else
    wait 5
  switch $threshold
    case 1
      log \"one\"
";
    assert_eq!(listing, expected);
}

#[test]
fn procedure_order_and_cycles_survive_export() {
    let json = r#"{
        "header": {
            "userVariables": {
                "zeta": { "type": "number", "value": 1 },
                "alpha": { "type": "number", "value": 2 }
            },
            "userProcedures": {
                "pong": [ { "id": "ping" } ],
                "ping": [ { "id": "pong" } ]
            }
        },
        "block": []
    }"#;

    let cyclic_ids = |editor: &Editor| -> Vec<String> {
        editor
            .analysis()
            .errors
            .iter()
            .filter(|(_, diags)| diags.iter().any(|d| d.kind == DiagnosticKind::CyclicProcedure))
            .filter_map(|(uuid, _)| editor.program().find_statement(*uuid))
            .map(|s| s.id.clone())
            .collect()
    };

    let mut editor = Editor::new(LanguageDefinition::new());
    editor.import_json(json).unwrap();
    let before = cyclic_ids(&editor);
    assert_eq!(before.len(), 1);

    let mut reloaded = Editor::new(LanguageDefinition::new());
    reloaded.import_json(&editor.export_json()).unwrap();

    let procs: Vec<&String> = reloaded.program().header.user_procedures.keys().collect();
    assert_eq!(procs, vec!["pong", "ping"]);
    let vars: Vec<&String> = reloaded.program().header.user_variables.keys().collect();
    assert_eq!(vars, vec!["zeta", "alpha"]);
    assert_eq!(cyclic_ids(&reloaded), before);
}
