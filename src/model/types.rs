//! Closed catalog of value types and statement shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an argument, operand or variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    BooleanExpression,
    /// Reference to a user or device variable, stored by name.
    Variable,
    /// Reference to a set of devices, stored as a list of device names.
    MultiDevice,
    StringOption,
    NumberOption,
    /// Placeholder until a concrete type is chosen (e.g. `setvar` before a
    /// variable is picked).
    Unknown,
}

impl ValueType {
    pub const ALL: &'static [ValueType] = &[
        ValueType::String,
        ValueType::Number,
        ValueType::Boolean,
        ValueType::BooleanExpression,
        ValueType::Variable,
        ValueType::MultiDevice,
        ValueType::StringOption,
        ValueType::NumberOption,
        ValueType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::BooleanExpression => "boolean_expression",
            ValueType::Variable => "variable",
            ValueType::MultiDevice => "multi_device",
            ValueType::StringOption => "string_option",
            ValueType::NumberOption => "number_option",
            ValueType::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<ValueType> {
        ValueType::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit unit/compound × with/without-arguments discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementShape {
    Unit,
    UnitWithArgs,
    Compound,
    CompoundWithArgs,
}

impl StatementShape {
    pub fn from_parts(has_block: bool, has_arguments: bool) -> Self {
        match (has_block, has_arguments) {
            (false, false) => StatementShape::Unit,
            (false, true) => StatementShape::UnitWithArgs,
            (true, false) => StatementShape::Compound,
            (true, true) => StatementShape::CompoundWithArgs,
        }
    }

    pub fn has_block(self) -> bool {
        matches!(
            self,
            StatementShape::Compound | StatementShape::CompoundWithArgs
        )
    }

    pub fn has_arguments(self) -> bool {
        matches!(
            self,
            StatementShape::UnitWithArgs | StatementShape::CompoundWithArgs
        )
    }
}

/// Palette group a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementGroup {
    Logic,
    Loop,
    Iot,
    Variable,
    Misc,
    /// Not offered in the palette; user procedures live here.
    Internal,
}

/// One selectable value of a `string_option` / `number_option` argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgOption {
    pub label: String,
    pub value: serde_json::Value,
}

/// Declared argument at a fixed position of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    #[serde(rename = "type")]
    pub ty: ValueType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<ArgOption>>,
}

impl ArgumentSpec {
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty,
            label: None,
            options: None,
        }
    }

    pub fn labeled(ty: ValueType, label: &str) -> Self {
        Self {
            ty,
            label: Some(label.to_string()),
            options: None,
        }
    }
}
