//! Export of the program tree to the plain JSON document form.
//!
//! Inverse of [`crate::parser::load_program`] for every field the model
//! keeps; `uuid` and `is_invalid` are never written.

use serde_json::{Map, Value, json};

use crate::model::{
    Argument, ArgumentValue, Block, Expression, Header, Operand, Program, Statement,
};

pub fn export_program(program: &Program) -> Value {
    json!({
        "header": export_header(&program.header),
        "block": export_block(&program.block),
    })
}

pub fn export_header(header: &Header) -> Value {
    let variables: Map<String, Value> = header
        .user_variables
        .iter()
        .map(|(name, var)| {
            (
                name.clone(),
                json!({ "type": var.ty.as_str(), "value": var.value }),
            )
        })
        .collect();
    let procedures: Map<String, Value> = header
        .user_procedures
        .iter()
        .map(|(id, body)| (id.clone(), export_block(body)))
        .collect();

    json!({
        "userVariables": variables,
        "userProcedures": procedures,
    })
}

pub fn export_block(block: &Block) -> Value {
    Value::Array(block.iter().map(export_statement).collect())
}

fn export_statement(stmt: &Statement) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), Value::String(stmt.id.clone()));
    if stmt.shape().has_arguments() {
        obj.insert(
            "arguments".into(),
            Value::Array(stmt.arguments().iter().map(export_argument).collect()),
        );
    }
    if let Some(block) = stmt.block() {
        obj.insert("block".into(), export_block(block));
    }
    Value::Object(obj)
}

fn export_argument(arg: &Argument) -> Value {
    let value = match &arg.value {
        ArgumentValue::Literal(v) => v.clone(),
        ArgumentValue::Expressions(list) => {
            Value::Array(list.iter().map(export_expression).collect())
        }
    };
    json!({ "type": arg.ty.as_str(), "value": value })
}

fn export_expression(expr: &Expression) -> Value {
    match expr {
        Expression::Leaf {
            operator,
            opd1,
            opd2,
            ..
        } => {
            let mut obj = Map::new();
            obj.insert("operator".into(), Value::String(operator.clone()));
            obj.insert("opd1".into(), export_operand(opd1));
            if let Some(opd2) = opd2 {
                obj.insert("opd2".into(), export_operand(opd2));
            }
            Value::Object(obj)
        }
        Expression::Group {
            operator, operands, ..
        } => json!({
            "operator": operator,
            "operands": operands.iter().map(export_expression).collect::<Vec<_>>(),
        }),
        Expression::Operand(opd) => export_operand(opd),
    }
}

fn export_operand(opd: &Operand) -> Value {
    json!({ "type": opd.ty.as_str(), "value": opd.value })
}

/// Pretty-printed document, as shown in the textual view.
pub fn to_json_pretty(program: &Program) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(&export_program(program)).unwrap_or_default()
}
