//! Schema - Declare the typed input parameters of a template
//!
//! A schema is an ordered list of parameter declarations. Each declaration
//! names a value slot, its type and an optional default; a declaration
//! without a default must be supplied by the caller.

use std::fmt;

use crate::value::Value;

/// Type expression for declared parameters
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    String,
    Number,
    Bool,
    List(Box<TypeExpr>),
    Map(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn list_of(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    pub fn map_of(inner: TypeExpr) -> Self {
        TypeExpr::Map(Box::new(inner))
    }

    /// Check if a value conforms to this type
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeExpr::String, Value::String(_)) => true,
            (TypeExpr::Number, Value::Int(_) | Value::Float(_)) => true,
            (TypeExpr::Bool, Value::Bool(_)) => true,
            (TypeExpr::List(inner), Value::List(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (TypeExpr::Map(inner), Value::Map(map)) => map.values().all(|v| inner.accepts(v)),
            _ => false,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::String => write!(f, "string"),
            TypeExpr::Number => write!(f, "number"),
            TypeExpr::Bool => write!(f, "bool"),
            TypeExpr::List(inner) => write!(f, "list({})", inner),
            TypeExpr::Map(inner) => write!(f, "map({})", inner),
        }
    }
}

/// Schema error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    #[error("Default for '{name}' does not match its type: expected {expected}, got {actual}")]
    InvalidDefault {
        name: String,
        expected: String,
        actual: String,
    },
}

/// Parameter declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDeclaration {
    pub name: String,
    pub description: String,
    /// Declared type; `string` when the declaration omits it
    pub type_expr: TypeExpr,
    pub default: Option<Value>,
}

impl ParameterDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            type_expr: TypeExpr::String,
            default: None,
        }
    }

    pub fn with_type(mut self, type_expr: TypeExpr) -> Self {
        self.type_expr = type_expr;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Returns true if the caller must supply this parameter
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    fn check_default(&self) -> Result<(), SchemaError> {
        match &self.default {
            Some(default) if !self.type_expr.accepts(default) => Err(SchemaError::InvalidDefault {
                name: self.name.clone(),
                expected: self.type_expr.to_string(),
                actual: default.type_name(),
            }),
            _ => Ok(()),
        }
    }
}

/// Ordered set of parameter declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSchema {
    pub(crate) parameters: Vec<ParameterDeclaration>,
}

impl VariableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema, checking name uniqueness and default types
    pub fn from_declarations(
        declarations: impl IntoIterator<Item = ParameterDeclaration>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        for declaration in declarations {
            schema.declare(declaration)?;
        }
        Ok(schema)
    }

    /// Add a declaration to the end of the schema
    pub fn declare(&mut self, declaration: ParameterDeclaration) -> Result<(), SchemaError> {
        if self.get(&declaration.name).is_some() {
            return Err(SchemaError::DuplicateParameter(declaration.name));
        }
        declaration.check_default()?;
        self.parameters.push(declaration);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Declarations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.parameters.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Declarations the caller must supply
    pub fn required(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.parameters.iter().filter(|p| p.is_required())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
