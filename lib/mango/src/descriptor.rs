//! Method and type descriptors consumed by the operator factory.
//!
//! A [`MethodDescriptor`] is the declarative metadata of one mapped method:
//! its SQL text, the generated-id marker, and the types it declares. It is
//! produced by `#[mapper]`, built by hand, or deserialized from a JSON
//! mapper definition.

use serde::{Deserialize, Serialize};

/// Structural shape of a declared type.
///
/// Only the shape matters to classification; the type name is carried
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeShape {
    /// Scalars, structs, maps, options and anything else.
    #[default]
    Plain,
    /// Sequence collections such as `Vec<T>` or `HashSet<T>`.
    Collection,
    /// Fixed arrays and slices.
    Array,
}

impl TypeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeShape::Plain => "plain",
            TypeShape::Collection => "collection",
            TypeShape::Array => "array",
        }
    }
}

/// A declared type: its textual name and structural shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub shape: TypeShape,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, TypeShape::Plain)
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self::new(name, TypeShape::Collection)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, TypeShape::Array)
    }

    /// The unit type, used for methods that declare no return type.
    pub fn unit() -> Self {
        Self::plain("()")
    }

    /// True for collection and array shapes.
    pub fn is_sequence(&self) -> bool {
        matches!(self.shape, TypeShape::Collection | TypeShape::Array)
    }
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        Self::unit()
    }
}

/// Metadata for one mapped method.
///
/// `sql` is `None` when the method carries no SQL declaration; an empty or
/// blank string is kept as-is so the two conditions stay distinguishable.
///
/// `return_type` is the declared (generic-erased) type, e.g. `Vec`, while
/// `generic_return_type` is the full type, e.g. `Vec<User>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub return_generated_id: bool,
    #[serde(default)]
    pub return_type: TypeDescriptor,
    #[serde(default)]
    pub generic_return_type: TypeDescriptor,
    #[serde(default)]
    pub parameter_types: Vec<TypeDescriptor>,
}

impl MethodDescriptor {
    /// Create a descriptor with no SQL, no marker, unit return and no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: None,
            return_generated_id: false,
            return_type: TypeDescriptor::unit(),
            generic_return_type: TypeDescriptor::unit(),
            parameter_types: Vec::new(),
        }
    }

    /// Attach SQL text.
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Mark the method as wanting the database-generated id.
    pub fn return_generated_id(mut self) -> Self {
        self.return_generated_id = true;
        self
    }

    /// Set a non-generic return type (declared and generic are the same).
    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.generic_return_type = ty.clone();
        self.return_type = ty;
        self
    }

    /// Set distinct declared and generic return types.
    pub fn returns_generic(mut self, declared: TypeDescriptor, generic: TypeDescriptor) -> Self {
        self.return_type = declared;
        self.generic_return_type = generic;
        self
    }

    /// Append a parameter type.
    pub fn param(mut self, ty: TypeDescriptor) -> Self {
        self.parameter_types.push(ty);
        self
    }
}
