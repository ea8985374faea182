//! Statements, their arguments and nested blocks.

use serde_json::Value;

use super::Uuid;
use super::expression::Expression;
use super::types::{StatementShape, ValueType};

/// Ordered sequence of sibling statements.
pub type Block = Vec<Statement>;

#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// String, number, boolean, option, variable name or device list.
    /// `Null` while unset.
    Literal(Value),
    /// Root list of a `boolean_expression` argument.
    Expressions(Vec<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub ty: ValueType,
    pub value: ArgumentValue,
}

impl Argument {
    /// Unset argument of the given type.
    pub fn empty(ty: ValueType) -> Self {
        let value = match ty {
            ValueType::BooleanExpression => ArgumentValue::Expressions(Vec::new()),
            _ => ArgumentValue::Literal(Value::Null),
        };
        Self { ty, value }
    }

    pub fn literal(ty: ValueType, value: impl Into<Value>) -> Self {
        Self {
            ty,
            value: ArgumentValue::Literal(value.into()),
        }
    }

    pub fn expressions(list: Vec<Expression>) -> Self {
        Self {
            ty: ValueType::BooleanExpression,
            value: ArgumentValue::Expressions(list),
        }
    }

    pub fn expression_list(&self) -> Option<&[Expression]> {
        match &self.value {
            ArgumentValue::Expressions(list) => Some(list),
            ArgumentValue::Literal(_) => None,
        }
    }

    pub fn expression_list_mut(&mut self) -> Option<&mut Vec<Expression>> {
        match &mut self.value {
            ArgumentValue::Expressions(list) => Some(list),
            ArgumentValue::Literal(_) => None,
        }
    }

    /// Changes the type and resets the value (e.g. `setvar` once the target
    /// variable is known).
    pub fn retype(&mut self, ty: ValueType) {
        *self = Argument::empty(ty);
    }
}

/// Shape-specific payload of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementBody {
    Unit,
    UnitWithArgs { arguments: Vec<Argument> },
    Compound { block: Block },
    CompoundWithArgs { arguments: Vec<Argument>, block: Block },
}

/// One node of the program tree.
#[derive(Debug, Clone)]
pub struct Statement {
    /// Key into the language definition.
    pub id: String,
    pub uuid: Uuid,
    pub body: StatementBody,
    /// Set by the analyzer; recomputed on every pass.
    pub is_invalid: bool,
}

impl Statement {
    pub fn new(id: &str, body: StatementBody) -> Self {
        Self {
            id: id.to_string(),
            uuid: Uuid::fresh(),
            body,
            is_invalid: false,
        }
    }

    pub fn unit(id: &str) -> Self {
        Self::new(id, StatementBody::Unit)
    }

    pub fn with_arguments(id: &str, arguments: Vec<Argument>) -> Self {
        Self::new(id, StatementBody::UnitWithArgs { arguments })
    }

    pub fn compound(id: &str, block: Block) -> Self {
        Self::new(id, StatementBody::Compound { block })
    }

    pub fn compound_with_arguments(id: &str, arguments: Vec<Argument>, block: Block) -> Self {
        Self::new(id, StatementBody::CompoundWithArgs { arguments, block })
    }

    pub fn shape(&self) -> StatementShape {
        match self.body {
            StatementBody::Unit => StatementShape::Unit,
            StatementBody::UnitWithArgs { .. } => StatementShape::UnitWithArgs,
            StatementBody::Compound { .. } => StatementShape::Compound,
            StatementBody::CompoundWithArgs { .. } => StatementShape::CompoundWithArgs,
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        match &self.body {
            StatementBody::UnitWithArgs { arguments }
            | StatementBody::CompoundWithArgs { arguments, .. } => arguments,
            _ => &[],
        }
    }

    pub fn arguments_mut(&mut self) -> &mut [Argument] {
        match &mut self.body {
            StatementBody::UnitWithArgs { arguments }
            | StatementBody::CompoundWithArgs { arguments, .. } => arguments,
            _ => &mut [],
        }
    }

    pub fn block(&self) -> Option<&Block> {
        match &self.body {
            StatementBody::Compound { block } | StatementBody::CompoundWithArgs { block, .. } => {
                Some(block)
            }
            _ => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut Block> {
        match &mut self.body {
            StatementBody::Compound { block } | StatementBody::CompoundWithArgs { block, .. } => {
                Some(block)
            }
            _ => None,
        }
    }

    /// Assigns fresh identifiers to the statement, its expressions and its
    /// nested statements.
    pub fn renew_uuids(&mut self) {
        self.uuid = Uuid::fresh();
        for arg in self.arguments_mut() {
            if let Some(list) = arg.expression_list_mut() {
                list.iter_mut().for_each(Expression::renew_uuids);
            }
        }
        if let Some(block) = self.block_mut() {
            block.iter_mut().for_each(Statement::renew_uuids);
        }
    }
}

// Structural: `uuid` and `is_invalid` are ignored.
impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.body == other.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::expression::Operand;

    #[test]
    fn test_shape_follows_body() {
        assert_eq!(Statement::unit("break").shape(), StatementShape::Unit);
        assert_eq!(
            Statement::with_arguments("wait", vec![Argument::literal(ValueType::Number, 5)])
                .shape(),
            StatementShape::UnitWithArgs
        );
        assert_eq!(
            Statement::compound("else", vec![]).shape(),
            StatementShape::Compound
        );
        assert_eq!(
            Statement::compound_with_arguments("if", vec![Argument::expressions(vec![])], vec![])
                .shape(),
            StatementShape::CompoundWithArgs
        );
    }

    #[test]
    fn test_accessors_on_unit() {
        let mut stmt = Statement::unit("break");
        assert!(stmt.arguments().is_empty());
        assert!(stmt.arguments_mut().is_empty());
        assert!(stmt.block().is_none());
        assert!(stmt.block_mut().is_none());
    }

    #[test]
    fn test_renew_uuids_reaches_everything() {
        let leaf = Expression::leaf("!", Operand::variable("x"), None);
        let mut stmt = Statement::compound_with_arguments(
            "if",
            vec![Argument::expressions(vec![leaf])],
            vec![Statement::unit("break")],
        );
        let original = stmt.clone();

        stmt.renew_uuids();

        assert_ne!(stmt.uuid, original.uuid);
        assert_ne!(stmt.block().unwrap()[0].uuid, original.block().unwrap()[0].uuid);
        assert_ne!(
            stmt.arguments()[0].expression_list().unwrap()[0].uuid(),
            original.arguments()[0].expression_list().unwrap()[0].uuid()
        );
        assert_eq!(stmt, original);
    }

    #[test]
    fn test_retype_resets_value() {
        let mut arg = Argument::literal(ValueType::Unknown, "x");
        arg.retype(ValueType::BooleanExpression);
        assert_eq!(arg, Argument::expressions(vec![]));
        arg.retype(ValueType::Number);
        assert_eq!(arg.value, ArgumentValue::Literal(Value::Null));
    }
}
