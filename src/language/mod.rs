//! Language definition: the registry of statement descriptors and known
//! variables a program is validated against.
//!
//! Built once from the base table plus a device list. Afterwards only user
//! procedures (and user variables) are added or removed. The registry is an
//! ordinary value handed to whoever needs it; there is no global instance.

pub mod base;
pub mod devices;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::RegisterError;
use crate::model::{
    Argument, ArgumentSpec, Statement, StatementBody, StatementGroup, StatementShape, ValueType,
};
use devices::Device;

/// Declarative description of one statement id.
///
/// An empty constraint list means "not declared".
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDescriptor {
    pub shape: StatementShape,
    pub group: StatementGroup,
    pub label: String,
    pub icon: Option<String>,
    pub colors: Vec<String>,
    pub arguments: Vec<ArgumentSpec>,
    /// The previous sibling must be one of these.
    pub predecessors: Vec<String>,
    /// The previous sibling must not be one of these.
    pub avoid_predecessors: Vec<String>,
    /// The enclosing statement must be one of these.
    pub parents: Vec<String>,
    pub avoid_parents: Vec<String>,
    /// Direct children must be one of these.
    pub nested_statements: Vec<String>,
    pub avoid_nested_statements: Vec<String>,
    pub is_user_procedure: bool,
}

fn owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

impl StatementDescriptor {
    pub fn new(shape: StatementShape, group: StatementGroup, label: &str) -> Self {
        Self {
            shape,
            group,
            label: label.to_string(),
            icon: None,
            colors: Vec::new(),
            arguments: Vec::new(),
            predecessors: Vec::new(),
            avoid_predecessors: Vec::new(),
            parents: Vec::new(),
            avoid_parents: Vec::new(),
            nested_statements: Vec::new(),
            avoid_nested_statements: Vec::new(),
            is_user_procedure: false,
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<ArgumentSpec>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_predecessors(mut self, ids: &[&str]) -> Self {
        self.predecessors = owned(ids);
        self
    }

    pub fn with_avoid_predecessors(mut self, ids: &[&str]) -> Self {
        self.avoid_predecessors = owned(ids);
        self
    }

    pub fn with_parents(mut self, ids: &[&str]) -> Self {
        self.parents = owned(ids);
        self
    }

    pub fn with_avoid_parents(mut self, ids: &[&str]) -> Self {
        self.avoid_parents = owned(ids);
        self
    }

    pub fn with_nested_statements(mut self, ids: &[&str]) -> Self {
        self.nested_statements = owned(ids);
        self
    }

    pub fn with_avoid_nested_statements(mut self, ids: &[&str]) -> Self {
        self.avoid_nested_statements = owned(ids);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableOrigin {
    User,
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub ty: ValueType,
    pub origin: VariableOrigin,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageDefinition {
    statements: IndexMap<String, StatementDescriptor>,
    variables: IndexMap<String, VariableDescriptor>,
}

impl LanguageDefinition {
    /// Base statements only, no devices.
    pub fn new() -> Self {
        Self::build(&[])
    }

    /// Base table plus one statement per device function
    /// (`<device>.<function>`) and one variable per device attribute
    /// (`<device>.<attribute>`).
    pub fn build(devices: &[Device]) -> Self {
        let mut lang = LanguageDefinition::default();
        for (id, descriptor) in base::base_statements() {
            lang.statements.insert(id.to_string(), descriptor);
        }

        for device in devices {
            if device.device_name.is_empty() {
                warn!("skipping device without a name");
                continue;
            }
            for function in &device.functions {
                let id = format!("{}.{}", device.device_name, function.name);
                let shape = if function.arguments.is_empty() {
                    StatementShape::Unit
                } else {
                    StatementShape::UnitWithArgs
                };
                let label = function.label.clone().unwrap_or_else(|| id.clone());
                let descriptor = StatementDescriptor::new(shape, StatementGroup::Iot, &label)
                    .with_arguments(function.arguments.clone());
                if lang.statements.insert(id.clone(), descriptor).is_some() {
                    warn!(%id, "device statement declared twice, keeping the last one");
                }
            }
            for attribute in &device.attributes {
                lang.variables.insert(
                    format!("{}.{}", device.device_name, attribute.name),
                    VariableDescriptor {
                        ty: attribute.ty,
                        origin: VariableOrigin::Device(device.device_name.clone()),
                    },
                );
            }
        }

        info!(
            statements = lang.statements.len(),
            variables = lang.variables.len(),
            devices = devices.len(),
            "language definition built"
        );
        lang
    }

    pub fn statement(&self, id: &str) -> Option<&StatementDescriptor> {
        self.statements.get(id)
    }

    pub fn statements(&self) -> impl Iterator<Item = (&str, &StatementDescriptor)> {
        self.statements.iter().map(|(id, d)| (id.as_str(), d))
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &VariableDescriptor)> {
        self.variables.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Adds or replaces a statement descriptor, returning the previous one.
    pub fn define_statement(
        &mut self,
        id: &str,
        descriptor: StatementDescriptor,
    ) -> Option<StatementDescriptor> {
        self.statements.insert(id.to_string(), descriptor)
    }

    pub fn is_user_procedure(&self, id: &str) -> bool {
        self.statement(id).is_some_and(|d| d.is_user_procedure)
    }

    /// Adds a unit statement for a user procedure. Fails if `id` is already
    /// a statement of any kind.
    pub fn register_user_procedure(
        &mut self,
        id: &str,
        label: &str,
        icon: Option<&str>,
        colors: &[&str],
    ) -> Result<(), RegisterError> {
        if self.statements.contains_key(id) {
            return Err(RegisterError::NameTaken(id.to_string()));
        }
        let mut descriptor =
            StatementDescriptor::new(StatementShape::Unit, StatementGroup::Internal, label);
        descriptor.icon = icon.map(str::to_string);
        descriptor.colors = owned(colors);
        descriptor.is_user_procedure = true;
        self.statements.insert(id.to_string(), descriptor);
        debug!(%id, "user procedure registered");
        Ok(())
    }

    /// Removes a user procedure entry; absent ids and built-in statements
    /// are left alone.
    pub fn unregister_user_procedure(&mut self, id: &str) {
        if self.is_user_procedure(id) {
            self.statements.shift_remove(id);
            debug!(%id, "user procedure unregistered");
        }
    }

    pub fn register_user_variable(&mut self, name: &str, ty: ValueType) {
        self.variables.insert(
            name.to_string(),
            VariableDescriptor {
                ty,
                origin: VariableOrigin::User,
            },
        );
    }

    /// Device variables are never removed this way.
    pub fn unregister_user_variable(&mut self, name: &str) {
        if self
            .variables
            .get(name)
            .is_some_and(|v| v.origin == VariableOrigin::User)
        {
            self.variables.shift_remove(name);
        }
    }

    /// New statement of kind `id` with empty arguments and an empty block,
    /// shaped after its descriptor.
    pub fn instantiate(&self, id: &str) -> Option<Statement> {
        let descriptor = self.statement(id)?;
        let arguments = || {
            descriptor
                .arguments
                .iter()
                .map(|spec| Argument::empty(spec.ty))
                .collect::<Vec<_>>()
        };
        let body = match descriptor.shape {
            StatementShape::Unit => StatementBody::Unit,
            StatementShape::UnitWithArgs => StatementBody::UnitWithArgs {
                arguments: arguments(),
            },
            StatementShape::Compound => StatementBody::Compound { block: Vec::new() },
            StatementShape::CompoundWithArgs => StatementBody::CompoundWithArgs {
                arguments: arguments(),
                block: Vec::new(),
            },
        };
        Some(Statement::new(id, body))
    }
}
