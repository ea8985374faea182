//! Pre-order traversal shared by the analyzer and the tree edits.

use crate::model::{Block, Statement, Uuid};

/// Where a statement sits while it is being visited.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub statement: &'a Statement,
    /// Enclosing compound statement, `None` at the top of a block walk.
    pub parent: Option<&'a Statement>,
    /// Sibling immediately before `statement`.
    pub previous: Option<&'a Statement>,
    pub index: usize,
    pub depth: usize,
}

/// Visits every statement of `block` and of all nested blocks, parents
/// before children.
pub fn walk<'a, F>(block: &'a Block, parent: Option<&'a Statement>, visit: &mut F)
where
    F: FnMut(&NodeContext<'a>),
{
    walk_at(block, parent, 0, visit);
}

fn walk_at<'a, F>(block: &'a Block, parent: Option<&'a Statement>, depth: usize, visit: &mut F)
where
    F: FnMut(&NodeContext<'a>),
{
    for (index, statement) in block.iter().enumerate() {
        let ctx = NodeContext {
            statement,
            parent,
            previous: index.checked_sub(1).map(|i| &block[i]),
            index,
            depth,
        };
        visit(&ctx);
        if let Some(nested) = statement.block() {
            walk_at(nested, Some(statement), depth + 1, visit);
        }
    }
}

/// Mutable pre-order walk; the callback gets the statement and its depth.
pub fn walk_mut<F>(block: &mut Block, visit: &mut F)
where
    F: FnMut(&mut Statement, usize),
{
    walk_mut_at(block, 0, visit);
}

fn walk_mut_at<F>(block: &mut Block, depth: usize, visit: &mut F)
where
    F: FnMut(&mut Statement, usize),
{
    for statement in block.iter_mut() {
        visit(statement, depth);
        if let Some(nested) = statement.block_mut() {
            walk_mut_at(nested, depth + 1, visit);
        }
    }
}

/// `uuid` of `statement` and of everything nested below it.
pub fn subtree_uuids(statement: &Statement) -> Vec<Uuid> {
    let mut uuids = vec![statement.uuid];
    if let Some(block) = statement.block() {
        walk(block, Some(statement), &mut |ctx| uuids.push(ctx.statement.uuid));
    }
    uuids
}

/// Whether any statement in `block` (at any depth) has `uuid`.
pub fn contains_uuid(block: &Block, uuid: Uuid) -> bool {
    let mut found = false;
    walk(block, None, &mut |ctx| found |= ctx.statement.uuid == uuid);
    found
}
