//! Stackvars Core
//!
//! Typed input parameters for infrastructure templates: declarations with
//! defaults, overrides collected from the environment, variable files and
//! the command line, and resolution into validated values.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use stackvars_core::{Value, builtin};
//!
//! let schema = builtin::database_schema();
//!
//! let mut overrides = HashMap::new();
//! overrides.insert("vpc_id".to_string(), Value::String("vpc-0abc".to_string()));
//! overrides.insert("security_group_ids".to_string(), Value::string_list(["sg-1"]));
//!
//! let resolved = schema.resolve(&overrides).unwrap();
//! assert_eq!(resolved.get("region"), Some(&Value::String("us-east-1".to_string())));
//! ```

pub mod builtin;
pub mod parser;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod signature;
pub mod sources;
pub mod value;

pub use resolver::{ResolveError, ResolvedValues};
pub use schema::{ParameterDeclaration, SchemaError, TypeExpr, VariableSchema};
pub use sources::{LoadOptions, OverrideSet, SourceError};
pub use value::Value;
