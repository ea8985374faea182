//! Built-in statements available regardless of the device list.

use super::StatementDescriptor;
use crate::model::{ArgumentSpec, StatementGroup, StatementShape, ValueType};

pub fn base_statements() -> Vec<(&'static str, StatementDescriptor)> {
    use StatementGroup::*;
    use StatementShape::*;

    vec![
        (
            "if",
            StatementDescriptor::new(CompoundWithArgs, Logic, "If")
                .with_arguments(vec![ArgumentSpec::new(ValueType::BooleanExpression)]),
        ),
        (
            "elseif",
            StatementDescriptor::new(CompoundWithArgs, Logic, "Else if")
                .with_arguments(vec![ArgumentSpec::new(ValueType::BooleanExpression)])
                .with_predecessors(&["if", "elseif"]),
        ),
        (
            "else",
            StatementDescriptor::new(Compound, Logic, "Else").with_predecessors(&["if", "elseif"]),
        ),
        (
            "switch",
            StatementDescriptor::new(CompoundWithArgs, Logic, "Switch")
                .with_arguments(vec![ArgumentSpec::new(ValueType::Variable)])
                .with_nested_statements(&["case"]),
        ),
        (
            "case",
            StatementDescriptor::new(CompoundWithArgs, Logic, "Case")
                .with_arguments(vec![ArgumentSpec::new(ValueType::Unknown)])
                .with_parents(&["switch"]),
        ),
        (
            "while",
            StatementDescriptor::new(CompoundWithArgs, Loop, "While")
                .with_arguments(vec![ArgumentSpec::new(ValueType::BooleanExpression)]),
        ),
        (
            "repeat",
            StatementDescriptor::new(CompoundWithArgs, Loop, "Repeat")
                .with_arguments(vec![ArgumentSpec::labeled(ValueType::Number, "times")]),
        ),
        (
            "foreach",
            StatementDescriptor::new(CompoundWithArgs, Iot, "For each device")
                .with_arguments(vec![ArgumentSpec::new(ValueType::MultiDevice)]),
        ),
        (
            "setvar",
            StatementDescriptor::new(UnitWithArgs, Variable, "Set variable").with_arguments(vec![
                ArgumentSpec::labeled(ValueType::Variable, "variable"),
                ArgumentSpec::labeled(ValueType::Unknown, "value"),
            ]),
        ),
        (
            "wait",
            StatementDescriptor::new(UnitWithArgs, Misc, "Wait")
                .with_arguments(vec![ArgumentSpec::labeled(ValueType::Number, "seconds")]),
        ),
        (
            "alert",
            StatementDescriptor::new(UnitWithArgs, Misc, "Alert")
                .with_arguments(vec![ArgumentSpec::labeled(ValueType::String, "message")]),
        ),
        (
            "log",
            StatementDescriptor::new(UnitWithArgs, Misc, "Log")
                .with_arguments(vec![ArgumentSpec::labeled(ValueType::String, "message")]),
        ),
    ]
}
