//! Boolean / comparison expression trees embedded as statement arguments.
//!
//! A `boolean_expression` argument holds a root list of [`Expression`]s.
//! Leaves compare two operands (or negate one); groups combine children
//! under `&&`, `||` or `!`. A group child is either a nested expression or
//! a bare operand, e.g. `!($door.open)` or `($lamp.on && true)`.

use serde_json::Value;
use tracing::debug;

use super::Uuid;
use super::types::ValueType;

pub const LEAF_OPERATORS: &[&str] = &["==", "!=", "<", ">", "<=", ">=", "&&", "||", "!"];
pub const GROUP_OPERATORS: &[&str] = &["&&", "||", "!"];

/// `!` is the only unary operator.
pub fn operator_is_unary(op: &str) -> bool {
    op == "!"
}

pub fn is_leaf_operator(op: &str) -> bool {
    LEAF_OPERATORS.contains(&op)
}

pub fn is_group_operator(op: &str) -> bool {
    GROUP_OPERATORS.contains(&op)
}

/// Typed literal or variable leaf inside an expression.
#[derive(Debug, Clone)]
pub struct Operand {
    pub uuid: Uuid,
    pub ty: ValueType,
    pub value: Value,
}

impl Operand {
    pub fn new(ty: ValueType, value: impl Into<Value>) -> Self {
        Self {
            uuid: Uuid::fresh(),
            ty,
            value: value.into(),
        }
    }

    /// Fresh `unknown` operand without a value.
    pub fn empty() -> Self {
        Self::new(ValueType::Unknown, Value::Null)
    }

    pub fn variable(name: &str) -> Self {
        Self::new(ValueType::Variable, name)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_null()
    }

    pub fn render(&self) -> String {
        let text = match &self.value {
            Value::Null => return "?".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match self.ty {
            ValueType::Variable => format!("${text}"),
            _ => text,
        }
    }
}

// Structural: identity (`uuid`) is ignored.
impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.value == other.value
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    /// `opd1 OP opd2`, or `OP opd1` when the operator is unary.
    Leaf {
        uuid: Uuid,
        operator: String,
        opd1: Operand,
        opd2: Option<Operand>,
    },
    /// `(e1 OP e2 OP ...)`; a `!` group wraps exactly one child.
    Group {
        uuid: Uuid,
        operator: String,
        operands: Vec<Expression>,
    },
    /// Bare operand used directly as a group child.
    Operand(Operand),
}

impl Expression {
    /// Builds a leaf, dropping `opd2` for unary operators and allocating an
    /// empty one for binary operators when it is missing.
    pub fn leaf(operator: &str, opd1: Operand, opd2: Option<Operand>) -> Self {
        let opd2 = if operator_is_unary(operator) {
            None
        } else {
            Some(opd2.unwrap_or_else(Operand::empty))
        };
        Expression::Leaf {
            uuid: Uuid::fresh(),
            operator: operator.to_string(),
            opd1,
            opd2,
        }
    }

    pub fn group(operator: &str, operands: Vec<Expression>) -> Self {
        Expression::Group {
            uuid: Uuid::fresh(),
            operator: operator.to_string(),
            operands,
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            Expression::Leaf { uuid, .. } | Expression::Group { uuid, .. } => *uuid,
            Expression::Operand(opd) => opd.uuid,
        }
    }

    pub fn operator(&self) -> &str {
        match self {
            Expression::Leaf { operator, .. } | Expression::Group { operator, .. } => operator,
            Expression::Operand(_) => "",
        }
    }

    /// Changes the operator, keeping the leaf operand slots consistent:
    /// switching to unary drops `opd2`, switching from unary allocates an
    /// empty `opd2`. Bare operands have no operator and are left alone.
    pub fn set_operator(&mut self, op: &str) {
        match self {
            Expression::Leaf { operator, opd2, .. } => {
                if operator_is_unary(op) {
                    *opd2 = None;
                } else if opd2.is_none() {
                    *opd2 = Some(Operand::empty());
                }
                *operator = op.to_string();
            }
            Expression::Group { operator, .. } => *operator = op.to_string(),
            Expression::Operand(_) => {}
        }
    }

    /// Assigns fresh identifiers to this node and everything below it.
    pub fn renew_uuids(&mut self) {
        match self {
            Expression::Leaf {
                uuid, opd1, opd2, ..
            } => {
                *uuid = Uuid::fresh();
                opd1.uuid = Uuid::fresh();
                if let Some(opd2) = opd2 {
                    opd2.uuid = Uuid::fresh();
                }
            }
            Expression::Group { uuid, operands, .. } => {
                *uuid = Uuid::fresh();
                operands.iter_mut().for_each(Expression::renew_uuids);
            }
            Expression::Operand(opd) => opd.uuid = Uuid::fresh(),
        }
    }

    /// Human-readable, deterministic rendering.
    pub fn render(&self) -> String {
        match self {
            Expression::Leaf {
                operator,
                opd1,
                opd2,
                ..
            } => match opd2 {
                Some(opd2) if !operator_is_unary(operator) => {
                    format!("{} {} {}", opd1.render(), operator, opd2.render())
                }
                _ => format!("{}{}", operator, opd1.render()),
            },
            Expression::Group {
                operator, operands, ..
            } => {
                let children: Vec<String> = operands.iter().map(Expression::render).collect();
                if operator_is_unary(operator) {
                    format!("{}({})", operator, children.join(", "))
                } else {
                    format!("({})", children.join(format!(" {operator} ").as_str()))
                }
            }
            Expression::Operand(opd) => opd.render(),
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Expression::Leaf {
                    operator: a_op,
                    opd1: a1,
                    opd2: a2,
                    ..
                },
                Expression::Leaf {
                    operator: b_op,
                    opd1: b1,
                    opd2: b2,
                    ..
                },
            ) => a_op == b_op && a1 == b1 && a2 == b2,
            (
                Expression::Group {
                    operator: a_op,
                    operands: a,
                    ..
                },
                Expression::Group {
                    operator: b_op,
                    operands: b,
                    ..
                },
            ) => a_op == b_op && a == b,
            (Expression::Operand(a), Expression::Operand(b)) => a == b,
            _ => false,
        }
    }
}

/// Renders a root expression list; multiple roots are separated by `, `.
pub fn parse_grouped_expressions(list: &[Expression]) -> String {
    list.iter()
        .map(Expression::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Finds the list (root or nested group) that directly contains `uuid`.
fn list_containing_mut(list: &mut Vec<Expression>, uuid: Uuid) -> Option<&mut Vec<Expression>> {
    if list.iter().any(|e| e.uuid() == uuid) {
        return Some(list);
    }
    for expr in list.iter_mut() {
        if let Expression::Group { operands, .. } = expr {
            if let Some(found) = list_containing_mut(operands, uuid) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_expression_mut(list: &mut [Expression], uuid: Uuid) -> Option<&mut Expression> {
    for expr in list.iter_mut() {
        if expr.uuid() == uuid {
            return Some(expr);
        }
        if let Expression::Group { operands, .. } = expr {
            if let Some(found) = find_expression_mut(operands, uuid) {
                return Some(found);
            }
        }
    }
    None
}

/// Wraps the selected sibling expressions into a new group placed where the
/// first selected one was. Selected ids that are not siblings of the first
/// one are ignored.
///
/// Returns `None` without touching the tree when nothing matches, or when
/// more than one operand is selected for the unary operator.
pub fn group_expressions(
    list: &mut Vec<Expression>,
    selected: &[Uuid],
    operator: &str,
) -> Option<Uuid> {
    let first = *selected.first()?;
    let siblings = list_containing_mut(list, first)?;

    let positions: Vec<usize> = siblings
        .iter()
        .enumerate()
        .filter(|(_, e)| selected.contains(&e.uuid()))
        .map(|(i, _)| i)
        .collect();

    if operator_is_unary(operator) && positions.len() > 1 {
        debug!(
            count = positions.len(),
            "refusing to group several operands under `!`"
        );
        return None;
    }

    let insert_at = positions[0];
    let mut grouped = Vec::with_capacity(positions.len());
    for &pos in positions.iter().rev() {
        grouped.push(siblings.remove(pos));
    }
    grouped.reverse();

    let group = Expression::group(operator, grouped);
    let uuid = group.uuid();
    siblings.insert(insert_at, group);
    Some(uuid)
}

/// Replaces the group `uuid` with its children. Returns `false` if `uuid`
/// is absent or names a leaf or a bare operand.
pub fn ungroup_expression(list: &mut Vec<Expression>, uuid: Uuid) -> bool {
    let Some(siblings) = list_containing_mut(list, uuid) else {
        return false;
    };
    let Some(pos) = siblings.iter().position(|e| e.uuid() == uuid) else {
        return false;
    };
    if !matches!(siblings[pos], Expression::Group { .. }) {
        return false;
    }
    if let Expression::Group { operands, .. } = siblings.remove(pos) {
        for (offset, child) in operands.into_iter().enumerate() {
            siblings.insert(pos + offset, child);
        }
    }
    true
}

/// Removes the expression or bare operand `uuid` (and its subtree)
/// wherever it is.
pub fn delete_expression(list: &mut Vec<Expression>, uuid: Uuid) -> bool {
    let Some(siblings) = list_containing_mut(list, uuid) else {
        return false;
    };
    match siblings.iter().position(|e| e.uuid() == uuid) {
        Some(pos) => {
            siblings.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(var: &str, op: &str, n: i64) -> Expression {
        Expression::leaf(
            op,
            Operand::variable(var),
            Some(Operand::new(ValueType::Number, n)),
        )
    }

    #[test]
    fn test_operator_is_unary() {
        assert!(operator_is_unary("!"));
        for op in ["==", "!=", "&&", "||", "<", ""] {
            assert!(!operator_is_unary(op), "{op} is not unary");
        }
    }

    #[test]
    fn test_unary_binary_switch_restores_shape() {
        let mut expr = cmp("temp", ">", 20);
        let original_opd1 = match &expr {
            Expression::Leaf { opd1, .. } => opd1.clone(),
            _ => unreachable!(),
        };

        expr.set_operator("!");
        match &expr {
            Expression::Leaf { opd2, .. } => assert!(opd2.is_none()),
            _ => panic!("expected leaf"),
        }

        expr.set_operator("==");
        match &expr {
            Expression::Leaf { opd1, opd2, operator, .. } => {
                assert_eq!(operator, "==");
                assert_eq!(opd1.uuid, original_opd1.uuid);
                assert_eq!(opd1, &original_opd1);
                let opd2 = opd2.as_ref().expect("second operand allocated");
                assert_eq!(opd2.ty, ValueType::Unknown);
                assert!(opd2.is_empty());
            }
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn test_binary_to_binary_keeps_second_operand() {
        let mut expr = cmp("temp", ">", 20);
        expr.set_operator("<=");
        assert_eq!(expr.render(), "$temp <= 20");
    }

    #[test]
    fn test_render_nested_groups() {
        let test_cases = vec![
            (vec![cmp("a", "==", 1)], "$a == 1"),
            (
                vec![Expression::group("&&", vec![cmp("a", "==", 1), cmp("b", "<", 2)])],
                "($a == 1 && $b < 2)",
            ),
            (
                vec![Expression::group(
                    "||",
                    vec![
                        Expression::group("!", vec![cmp("a", "==", 1)]),
                        Expression::leaf("!", Operand::variable("door.open"), None),
                    ],
                )],
                "(!($a == 1) || !$door.open)",
            ),
            (
                vec![Expression::leaf("==", Operand::variable("x"), None)],
                "$x == ?",
            ),
            (vec![cmp("a", "==", 1), cmp("b", "==", 2)], "$a == 1, $b == 2"),
        ];

        for (input, expected) in test_cases {
            assert_eq!(parse_grouped_expressions(&input), expected);
            // stable
            assert_eq!(parse_grouped_expressions(&input), expected);
        }
    }

    #[test]
    fn test_group_selected_siblings() {
        let a = cmp("a", "==", 1);
        let b = cmp("b", "==", 2);
        let c = cmp("c", "==", 3);
        let (ua, uc) = (a.uuid(), c.uuid());
        let mut list = vec![a, b, c];

        let group = group_expressions(&mut list, &[ua, uc], "||").expect("grouped");

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].uuid(), group);
        assert_eq!(parse_grouped_expressions(&list), "($a == 1 || $c == 3), $b == 2");
    }

    #[test]
    fn test_group_inside_nested_group() {
        let a = cmp("a", "==", 1);
        let b = cmp("b", "==", 2);
        let (ua, ub) = (a.uuid(), b.uuid());
        let mut list = vec![Expression::group("&&", vec![a, b, cmp("c", "==", 3)])];

        group_expressions(&mut list, &[ua, ub], "||").expect("grouped");
        assert_eq!(
            parse_grouped_expressions(&list),
            "(($a == 1 || $b == 2) && $c == 3)"
        );
    }

    #[test]
    fn test_group_unary_with_many_operands_is_noop() {
        let a = cmp("a", "==", 1);
        let b = cmp("b", "==", 2);
        let (ua, ub) = (a.uuid(), b.uuid());
        let mut list = vec![a, b];
        let before = list.clone();

        assert_eq!(group_expressions(&mut list, &[ua, ub], "!"), None);
        assert_eq!(list, before);

        assert!(group_expressions(&mut list, &[ua], "!").is_some());
        assert_eq!(parse_grouped_expressions(&list), "!($a == 1), $b == 2");
    }

    #[test]
    fn test_group_unknown_selection_is_noop() {
        let mut list = vec![cmp("a", "==", 1)];
        assert_eq!(group_expressions(&mut list, &[Uuid::fresh()], "&&"), None);
        assert_eq!(group_expressions(&mut list, &[], "&&"), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_ungroup_and_delete() {
        let inner = Expression::group("&&", vec![cmp("a", "==", 1), cmp("b", "==", 2)]);
        let inner_id = inner.uuid();
        let c = cmp("c", "==", 3);
        let c_id = c.uuid();
        let mut list = vec![Expression::group("||", vec![inner, c])];

        assert!(ungroup_expression(&mut list, inner_id));
        assert_eq!(
            parse_grouped_expressions(&list),
            "($a == 1 || $b == 2 || $c == 3)"
        );

        // leaves cannot be ungrouped
        assert!(!ungroup_expression(&mut list, c_id));

        assert!(delete_expression(&mut list, c_id));
        assert_eq!(parse_grouped_expressions(&list), "($a == 1 || $b == 2)");
        assert!(!delete_expression(&mut list, c_id));
    }

    #[test]
    fn test_find_and_edit_nested() {
        let leaf = cmp("a", "==", 1);
        let id = leaf.uuid();
        let mut list = vec![Expression::group("&&", vec![leaf])];

        find_expression_mut(&mut list, id)
            .expect("found")
            .set_operator("!=");
        assert_eq!(parse_grouped_expressions(&list), "($a != 1)");
    }

    #[test]
    fn test_groups_of_bare_operands() {
        let door = Operand::variable("door.open");
        let door_id = door.uuid;
        let not_door = Expression::group("!", vec![Expression::Operand(door)]);
        let both = Expression::group(
            "&&",
            vec![
                Expression::Operand(Operand::variable("lamp.on")),
                Expression::Operand(Operand::new(ValueType::Boolean, true)),
                Expression::Operand(Operand::empty()),
            ],
        );
        let mut list = vec![not_door, both];
        assert_eq!(
            parse_grouped_expressions(&list),
            "!($door.open), ($lamp.on && true && ?)"
        );

        let on_id = match &list[1] {
            Expression::Group { operands, .. } => operands[0].uuid(),
            _ => unreachable!(),
        };
        assert!(!ungroup_expression(&mut list, door_id));
        assert!(delete_expression(&mut list, door_id));
        assert!(group_expressions(&mut list, &[on_id], "!").is_some());
        assert_eq!(
            parse_grouped_expressions(&list),
            "!(), (!($lamp.on) && true && ?)"
        );

        find_expression_mut(&mut list, on_id)
            .expect("operand found")
            .set_operator("==");
        assert_eq!(find_expression_mut(&mut list, on_id).unwrap().operator(), "");
    }

    #[test]
    fn test_equality_ignores_identity() {
        let a = cmp("a", "==", 1);
        let mut b = a.clone();
        b.renew_uuids();
        assert_ne!(a.uuid(), b.uuid());
        assert_eq!(a, b);

        let opd = Expression::Operand(Operand::variable("x"));
        let mut copy = opd.clone();
        copy.renew_uuids();
        assert_ne!(opd.uuid(), copy.uuid());
        assert_eq!(opd, copy);
        assert_ne!(opd, a);
    }
}
