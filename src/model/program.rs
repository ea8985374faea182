//! The editable program: header plus root block, and the tree edits on it.
//!
//! Every edit is atomic: it either applies completely or returns an error
//! and leaves the tree as it was. Edits keep the tree well-formed but do not
//! validate it; that is the analyzer's job.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::Uuid;
use super::statement::{Block, Statement};
use super::types::ValueType;
use crate::error::{EditError, VariableError};
use crate::processor::visitor::{subtree_uuids, walk};

#[derive(Debug, Clone, PartialEq)]
pub struct UserVariable {
    pub ty: ValueType,
    pub value: Value,
}

/// Procedure-templating bookkeeping: a statement instance whose procedure
/// body has been initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializedProcedure {
    pub uuid: Uuid,
    pub procedure: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub user_variables: IndexMap<String, UserVariable>,
    pub user_procedures: IndexMap<String, Block>,
    pub skeletonize_uuid: Vec<Uuid>,
    pub initialized_procedures: Vec<InitializedProcedure>,
}

/// Addresses a block without borrowing into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Root,
    Procedure(String),
    /// Nested block of the compound statement with this uuid.
    Statement(Uuid),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Root => f.write_str("root"),
            BlockId::Procedure(id) => write!(f, "procedure `{id}`"),
            BlockId::Statement(uuid) => write!(f, "of statement {uuid}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    Skeleton,
    InitializedProcedure,
}

/// Header metadata pointing at a statement that is no longer in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReference {
    pub uuid: Uuid,
    pub source: MetadataSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub header: Header,
    pub block: Block,
}

fn find_in_mut(block: &mut Block, uuid: Uuid) -> Option<&mut Statement> {
    for stmt in block.iter_mut() {
        if stmt.uuid == uuid {
            return Some(stmt);
        }
        if let Some(nested) = stmt.block_mut() {
            if let Some(found) = find_in_mut(nested, uuid) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in(block: &Block, uuid: Uuid) -> Option<&Statement> {
    for stmt in block {
        if stmt.uuid == uuid {
            return Some(stmt);
        }
        if let Some(found) = stmt.block().and_then(|nested| find_in(nested, uuid)) {
            return Some(found);
        }
    }
    None
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root block followed by every procedure body.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        std::iter::once(&self.block).chain(self.header.user_procedures.values())
    }

    pub fn find_statement(&self, uuid: Uuid) -> Option<&Statement> {
        self.blocks().find_map(|block| find_in(block, uuid))
    }

    pub fn find_statement_mut(&mut self, uuid: Uuid) -> Option<&mut Statement> {
        if let Some(found) = find_in_mut(&mut self.block, uuid) {
            return Some(found);
        }
        self.header
            .user_procedures
            .values_mut()
            .find_map(|block| find_in_mut(block, uuid))
    }

    pub fn block(&self, at: &BlockId) -> Option<&Block> {
        match at {
            BlockId::Root => Some(&self.block),
            BlockId::Procedure(id) => self.header.user_procedures.get(id),
            BlockId::Statement(uuid) => self.find_statement(*uuid)?.block(),
        }
    }

    pub fn block_mut(&mut self, at: &BlockId) -> Option<&mut Block> {
        match at {
            BlockId::Root => Some(&mut self.block),
            BlockId::Procedure(id) => self.header.user_procedures.get_mut(id),
            BlockId::Statement(uuid) => self.find_statement_mut(*uuid)?.block_mut(),
        }
    }

    /// Appends `template` to the block `at`, giving it (and everything
    /// inside it) fresh identifiers.
    pub fn add_statement(
        &mut self,
        at: &BlockId,
        template: Statement,
    ) -> Result<&Statement, EditError> {
        let len = self
            .block(at)
            .ok_or_else(|| EditError::BlockNotFound(at.clone()))?
            .len();
        self.insert_statement(at, len, template)
    }

    /// Inserts `template` at `index` (`index == len` appends).
    pub fn insert_statement(
        &mut self,
        at: &BlockId,
        index: usize,
        mut template: Statement,
    ) -> Result<&Statement, EditError> {
        let block = self
            .block_mut(at)
            .ok_or_else(|| EditError::BlockNotFound(at.clone()))?;
        if index > block.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: block.len(),
            });
        }
        template.renew_uuids();
        debug!(id = %template.id, uuid = %template.uuid, block = %at, index, "statement added");
        block.insert(index, template);
        Ok(&block[index])
    }

    /// Removes the statement at `index` together with every header metadata
    /// entry that references it or anything nested in it.
    pub fn remove_statement(&mut self, at: &BlockId, index: usize) -> Result<Statement, EditError> {
        let block = self
            .block_mut(at)
            .ok_or_else(|| EditError::BlockNotFound(at.clone()))?;
        if index >= block.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: block.len(),
            });
        }
        let removed = block.remove(index);
        let gone = subtree_uuids(&removed);
        self.prune_metadata(&gone);
        debug!(id = %removed.id, uuid = %removed.uuid, block = %at, "statement removed");
        Ok(removed)
    }

    /// Relocates a statement inside one block. Identifiers are kept.
    pub fn move_statement(
        &mut self,
        at: &BlockId,
        from: usize,
        to: usize,
    ) -> Result<(), EditError> {
        let block = self
            .block_mut(at)
            .ok_or_else(|| EditError::BlockNotFound(at.clone()))?;
        let len = block.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditError::IndexOutOfRange { index, len });
            }
        }
        let stmt = block.remove(from);
        block.insert(to, stmt);
        Ok(())
    }

    /// Moves a statement to another block. Identifiers are kept; moving a
    /// statement into its own nested block is refused.
    pub fn transfer_statement(
        &mut self,
        from: &BlockId,
        from_index: usize,
        to: &BlockId,
        to_index: usize,
    ) -> Result<(), EditError> {
        if from == to {
            return self.move_statement(from, from_index, to_index);
        }

        let source = self
            .block(from)
            .ok_or_else(|| EditError::BlockNotFound(from.clone()))?;
        let moved = source.get(from_index).ok_or(EditError::IndexOutOfRange {
            index: from_index,
            len: source.len(),
        })?;
        if let BlockId::Statement(target) = to {
            if subtree_uuids(moved).contains(target) {
                return Err(EditError::CyclicMove(moved.uuid));
            }
        }
        let dest_len = self
            .block(to)
            .ok_or_else(|| EditError::BlockNotFound(to.clone()))?
            .len();
        if to_index > dest_len {
            return Err(EditError::IndexOutOfRange {
                index: to_index,
                len: dest_len,
            });
        }

        let stmt = self
            .block_mut(from)
            .ok_or_else(|| EditError::BlockNotFound(from.clone()))?
            .remove(from_index);
        self.block_mut(to)
            .ok_or_else(|| EditError::BlockNotFound(to.clone()))?
            .insert(to_index, stmt);
        Ok(())
    }

    pub fn add_user_variable(
        &mut self,
        name: &str,
        ty: ValueType,
        value: impl Into<Value>,
    ) -> Result<(), VariableError> {
        let value = value.into();
        if name.is_empty() {
            return Err(VariableError::NameMissing);
        }
        if self.header.user_variables.contains_key(name) {
            return Err(VariableError::NameExists(name.to_string()));
        }
        if !matches!(
            ty,
            ValueType::String | ValueType::Number | ValueType::Boolean
        ) {
            return Err(VariableError::UnsupportedType(ty));
        }
        let missing = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if missing {
            return Err(VariableError::ValueMissing);
        }

        self.header
            .user_variables
            .insert(name.to_string(), UserVariable { ty, value });
        Ok(())
    }

    /// Returns the removed variable; removing an absent name is a no-op.
    pub fn remove_user_variable(&mut self, name: &str) -> Option<UserVariable> {
        self.header.user_variables.shift_remove(name)
    }

    pub fn add_user_procedure(&mut self, id: &str, mut body: Block) -> Result<(), EditError> {
        if self.header.user_procedures.contains_key(id) {
            return Err(EditError::ProcedureExists(id.to_string()));
        }
        body.iter_mut().for_each(Statement::renew_uuids);
        self.header.user_procedures.insert(id.to_string(), body);
        Ok(())
    }

    /// Drops the procedure body and the metadata of its instances.
    pub fn remove_user_procedure(&mut self, id: &str) -> Option<Block> {
        let body = self.header.user_procedures.shift_remove(id)?;
        let gone: Vec<Uuid> = body.iter().flat_map(subtree_uuids).collect();
        self.prune_metadata(&gone);
        self.header
            .initialized_procedures
            .retain(|entry| entry.procedure != id);
        Some(body)
    }

    pub fn mark_initialized(&mut self, uuid: Uuid, procedure: &str) {
        self.header
            .initialized_procedures
            .push(InitializedProcedure {
                uuid,
                procedure: procedure.to_string(),
            });
    }

    fn prune_metadata(&mut self, gone: &[Uuid]) {
        let header = &mut self.header;
        header.skeletonize_uuid.retain(|uuid| !gone.contains(uuid));
        header
            .initialized_procedures
            .retain(|entry| !gone.contains(&entry.uuid));
    }

    /// Metadata entries whose statement is no longer anywhere in the tree.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut present = HashSet::new();
        for block in self.blocks() {
            walk(block, None, &mut |ctx| {
                present.insert(ctx.statement.uuid);
            });
        }

        let skeletons = self
            .header
            .skeletonize_uuid
            .iter()
            .map(|uuid| (*uuid, MetadataSource::Skeleton));
        let initialized = self
            .header
            .initialized_procedures
            .iter()
            .map(|entry| (entry.uuid, MetadataSource::InitializedProcedure));

        skeletons
            .chain(initialized)
            .filter(|(uuid, _)| !present.contains(uuid))
            .map(|(uuid, source)| DanglingReference { uuid, source })
            .collect()
    }
}
