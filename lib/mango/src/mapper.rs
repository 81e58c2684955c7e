//! Mapper registry: bind-time resolution and caching of operators.
//!
//! - `MapperInterface`: A set of method descriptors, usually generated by `#[mapper]`
//! - `Mapper`: The immutable, bound operators of one mapper interface

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Arguments, MangoError, MethodDescriptor, Operator, OperatorExecutor, Outcome, get_operator,
};

/// A mapper interface: a named set of method descriptors.
///
/// Implemented by the `<Trait>Mapper` struct that `#[mapper]` generates.
pub trait MapperInterface {
    /// Interface name, used in logs and errors.
    const NAME: &'static str;

    /// Descriptors of every method on the interface, in declaration order.
    fn descriptors() -> Vec<MethodDescriptor>;
}

/// JSON mapper definition.
///
/// ```text
/// {
///   "name": "UserDao",
///   "methods": [
///     { "name": "insert", "sql": "insert into users(name) values($1)",
///       "returnGeneratedId": true, "parameterTypes": [{ "name": "String" }] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperDefinition {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

/// A method together with its resolved operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundMethod {
    pub descriptor: MethodDescriptor,
    pub operator: Operator,
}

/// The bound operators of one mapper interface.
///
/// Every method is resolved when the mapper is bound, so a misconfigured
/// method fails here instead of on first call. Once bound the mapper is
/// immutable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Mapper {
    name: String,
    methods: BTreeMap<String, BoundMethod>,
}

impl Mapper {
    /// Resolve every descriptor and bind the results under `name`.
    ///
    /// Fails with the first resolution error; no partially-bound mapper is
    /// ever returned. A later descriptor with a duplicate name replaces the
    /// earlier one.
    pub fn bind(
        name: impl Into<String>,
        descriptors: impl IntoIterator<Item = MethodDescriptor>,
    ) -> Result<Self, MangoError> {
        let name = name.into();
        let mut methods = BTreeMap::new();

        for descriptor in descriptors {
            let operator = get_operator(&descriptor)?;
            let method_name = descriptor.name.clone();
            let bound = BoundMethod {
                descriptor,
                operator,
            };
            if methods.insert(method_name.clone(), bound).is_some() {
                tracing::warn!(
                    mapper = %name,
                    method = %method_name,
                    "duplicate mapper method, keeping the later declaration"
                );
            }
        }

        tracing::info!(mapper = %name, methods = methods.len(), "mapper bound");
        Ok(Self { name, methods })
    }

    /// Bind a `#[mapper]` interface.
    pub fn for_interface<I: MapperInterface>() -> Result<Self, MangoError> {
        Self::bind(I::NAME, I::descriptors())
    }

    /// Bind a parsed mapper definition.
    pub fn from_definition(definition: MapperDefinition) -> Result<Self, MangoError> {
        Self::bind(definition.name, definition.methods)
    }

    /// Parse and bind a JSON mapper definition.
    pub fn from_json(json: &str) -> Result<Self, MangoError> {
        let definition: MapperDefinition = serde_json::from_str(json)?;
        Self::from_definition(definition)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Bound methods ordered by name.
    pub fn methods(&self) -> impl Iterator<Item = &BoundMethod> {
        self.methods.values()
    }

    /// Get the bound method called `method`.
    pub fn method(&self, method: &str) -> Result<&BoundMethod, MangoError> {
        self.methods
            .get(method)
            .ok_or_else(|| MangoError::UnknownMethod(format!("{}::{}", self.name, method)))
    }

    /// Get the cached operator for `method`.
    pub fn operator(&self, method: &str) -> Result<&Operator, MangoError> {
        Ok(&self.method(method)?.operator)
    }

    /// Execute `method` through `executor` with its cached operator.
    pub async fn invoke<E: OperatorExecutor + ?Sized>(
        &self,
        executor: &E,
        method: &str,
        args: Arguments,
    ) -> Result<Outcome, MangoError> {
        let operator = self.operator(method)?;
        tracing::debug!(mapper = %self.name, method, kind = ?operator.kind(), "invoking");
        operator.execute(executor, args).await
    }
}
