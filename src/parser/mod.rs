use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::ImportError;
use crate::model::{
    Argument, ArgumentValue, Block, Expression, Header, Operand, Program, Statement,
    StatementBody, UserVariable, ValueType,
};

type Result<T> = std::result::Result<T, ImportError>;

/// Parse a whole program document.
///
/// The document is expected to look like
///
/// ```json
/// { "header": { "userVariables": {..}, "userProcedures": {..} }, "block": [..] }
/// ```
///
/// `header` may be omitted. Every statement and expression gets a fresh
/// `uuid`; nothing is validated against the language definition.
pub fn load_program(json: &str) -> Result<Program> {
    let root: Value = serde_json::from_str(json)?;
    let root = as_object(&root, "$")?;

    let header = match root.get("header") {
        Some(header) => parse_header(header, "$.header")?,
        None => Header::default(),
    };
    let block = root
        .get("block")
        .ok_or_else(|| ImportError::malformed("$", "document has no `block` array"))
        .and_then(|v| parse_block(v, "$.block"))?;

    info!(
        statements = block.len(),
        variables = header.user_variables.len(),
        procedures = header.user_procedures.len(),
        "program loaded"
    );
    Ok(Program { header, block })
}

/// Parse only the user procedures of a document. Accepts either a full
/// program document or a bare header object.
pub fn load_procedures(json: &str) -> Result<IndexMap<String, Block>> {
    let root: Value = serde_json::from_str(json)?;
    let (header, path) = match root.get("header") {
        Some(header) => (header, "$.header"),
        None => (&root, "$"),
    };
    let header = as_object(header, path)?;
    match header.get("userProcedures") {
        Some(procs) => parse_procedures(procs, &format!("{path}.userProcedures")),
        None => Err(ImportError::malformed(path, "no `userProcedures` object")),
    }
}

fn as_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ImportError::malformed(path, "expected an object"))
}

fn as_array<'v>(value: &'v Value, path: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ImportError::malformed(path, "expected an array"))
}

fn parse_type(value: Option<&Value>, path: &str) -> Result<ValueType> {
    let name = value
        .and_then(|v| v.as_str())
        .ok_or_else(|| ImportError::malformed(path, "missing `type`"))?;
    ValueType::parse(name)
        .ok_or_else(|| ImportError::malformed(path, format!("unknown type `{name}`")))
}

fn parse_header(value: &Value, path: &str) -> Result<Header> {
    let obj = as_object(value, path)?;
    let mut header = Header::default();

    if let Some(vars) = obj.get("userVariables") {
        let vars_path = format!("{path}.userVariables");
        for (name, var) in as_object(vars, &vars_path)? {
            let var_path = format!("{vars_path}.{name}");
            let var_obj = as_object(var, &var_path)?;
            let ty = parse_type(var_obj.get("type"), &var_path)?;
            let value = var_obj.get("value").cloned().unwrap_or(Value::Null);
            header
                .user_variables
                .insert(name.clone(), UserVariable { ty, value });
        }
    }

    if let Some(procs) = obj.get("userProcedures") {
        header.user_procedures = parse_procedures(procs, &format!("{path}.userProcedures"))?;
    }

    Ok(header)
}

fn parse_procedures(value: &Value, path: &str) -> Result<IndexMap<String, Block>> {
    let mut procedures = IndexMap::new();
    for (id, body) in as_object(value, path)? {
        let block = parse_block(body, &format!("{path}.{id}"))?;
        debug!(%id, statements = block.len(), "procedure parsed");
        procedures.insert(id.clone(), block);
    }
    Ok(procedures)
}

fn parse_block(value: &Value, path: &str) -> Result<Block> {
    as_array(value, path)?
        .iter()
        .enumerate()
        .map(|(i, stmt)| parse_statement(stmt, &format!("{path}[{i}]")))
        .collect()
}

fn parse_statement(value: &Value, path: &str) -> Result<Statement> {
    let obj = as_object(value, path)?;
    let id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ImportError::malformed(path, "statement has no `id`"))?;

    let arguments = match obj.get("arguments") {
        Some(args) => {
            let args_path = format!("{path}.arguments");
            let parsed = as_array(args, &args_path)?
                .iter()
                .enumerate()
                .map(|(i, arg)| parse_argument(arg, &format!("{args_path}[{i}]")))
                .collect::<Result<Vec<_>>>()?;
            Some(parsed)
        }
        None => None,
    };
    let block = match obj.get("block") {
        Some(block) => Some(parse_block(block, &format!("{path}.block"))?),
        None => None,
    };

    let body = match (arguments, block) {
        (None, None) => StatementBody::Unit,
        (Some(arguments), None) => StatementBody::UnitWithArgs { arguments },
        (None, Some(block)) => StatementBody::Compound { block },
        (Some(arguments), Some(block)) => StatementBody::CompoundWithArgs { arguments, block },
    };
    Ok(Statement::new(id, body))
}

fn parse_argument(value: &Value, path: &str) -> Result<Argument> {
    let obj = as_object(value, path)?;
    let ty = parse_type(obj.get("type"), path)?;
    let raw = obj.get("value");

    let value = match ty {
        ValueType::BooleanExpression => {
            let list_path = format!("{path}.value");
            let list = match raw {
                None | Some(Value::Null) => Vec::new(),
                Some(other) => as_array(other, &list_path)?
                    .iter()
                    .enumerate()
                    .map(|(i, e)| parse_expression(e, &format!("{list_path}[{i}]")))
                    .collect::<Result<Vec<_>>>()?,
            };
            ArgumentValue::Expressions(list)
        }
        _ => ArgumentValue::Literal(raw.cloned().unwrap_or(Value::Null)),
    };
    Ok(Argument { ty, value })
}

fn parse_expression(value: &Value, path: &str) -> Result<Expression> {
    let obj = as_object(value, path)?;
    let Some(operator) = obj.get("operator").and_then(|v| v.as_str()) else {
        // `{ "type", "value" }` without an operator is a bare operand.
        if obj.contains_key("type") {
            return parse_operand(value, path).map(Expression::Operand);
        }
        return Err(ImportError::malformed(path, "expression has no `operator`"));
    };

    if let Some(operands) = obj.get("operands") {
        let ops_path = format!("{path}.operands");
        let operands = as_array(operands, &ops_path)?
            .iter()
            .enumerate()
            .map(|(i, e)| parse_expression(e, &format!("{ops_path}[{i}]")))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Expression::group(operator, operands));
    }

    let opd1 = obj
        .get("opd1")
        .ok_or_else(|| {
            ImportError::malformed(path, "expression has neither `operands` nor `opd1`")
        })
        .and_then(|v| parse_operand(v, &format!("{path}.opd1")))?;
    let opd2 = match obj.get("opd2") {
        Some(v) => Some(parse_operand(v, &format!("{path}.opd2"))?),
        None => None,
    };
    Ok(Expression::leaf(operator, opd1, opd2))
}

fn parse_operand(value: &Value, path: &str) -> Result<Operand> {
    let obj = as_object(value, path)?;
    let ty = parse_type(obj.get("type"), path)?;
    let value = obj.get("value").cloned().unwrap_or(Value::Null);
    Ok(Operand::new(ty, value))
}
