//! In-memory program document: statements, expressions and the header.

pub mod expression;
pub mod program;
pub mod statement;
pub mod types;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use expression::{Expression, Operand};
pub use program::{
    BlockId, DanglingReference, Header, InitializedProcedure, MetadataSource, Program,
    UserVariable,
};
pub use statement::{Argument, ArgumentValue, Block, Statement, StatementBody};
pub use types::{ArgOption, ArgumentSpec, StatementGroup, StatementShape, ValueType};

static NEXT_UUID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identifier. Never reused, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid(u64);

impl Uuid {
    pub fn fresh() -> Self {
        Uuid(NEXT_UUID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}
