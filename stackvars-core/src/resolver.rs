//! Resolver - Merge caller overrides with declared defaults
//!
//! For each declared parameter: an override wins after type checking,
//! otherwise the default is used, otherwise resolution fails.
//! Resolution never mutates the schema, so resolving the same overrides
//! twice gives the same result.

use std::collections::HashMap;

use log::{debug, warn};

use crate::schema::{ParameterDeclaration, VariableSchema};
use crate::value::Value;

/// Resolution error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Missing required parameter '{name}'")]
    MissingRequiredParameter { name: String },

    #[error("Type mismatch for '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

impl ResolveError {
    /// Name of the parameter that failed
    pub fn parameter(&self) -> &str {
        match self {
            ResolveError::MissingRequiredParameter { name } => name,
            ResolveError::TypeMismatch { name, .. } => name,
        }
    }
}

/// Final parameter values, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValues {
    values: Vec<(String, Value)>,
}

impl ResolvedValues {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> HashMap<String, Value> {
        self.values.into_iter().collect()
    }

    /// JSON object of all values, for handing to a provisioning engine
    pub fn to_json(&self) -> serde_json::Value {
        let obj: serde_json::Map<_, _> = self
            .values
            .iter()
            .map(|(n, v)| (n.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(obj)
    }
}

impl ParameterDeclaration {
    /// Resolve this parameter against caller overrides
    pub fn resolve(&self, overrides: &HashMap<String, Value>) -> Result<Value, ResolveError> {
        if let Some(value) = overrides.get(&self.name) {
            if !self.type_expr.accepts(value) {
                return Err(ResolveError::TypeMismatch {
                    name: self.name.clone(),
                    expected: self.type_expr.to_string(),
                    actual: value.type_name(),
                });
            }
            debug!("{}: using override", self.name);
            return Ok(value.clone());
        }

        match &self.default {
            Some(default) => {
                debug!("{}: using default {}", self.name, default);
                Ok(default.clone())
            }
            None => Err(ResolveError::MissingRequiredParameter {
                name: self.name.clone(),
            }),
        }
    }
}

impl VariableSchema {
    /// Resolve every declared parameter, failing on the first error in
    /// declaration order
    pub fn resolve(
        &self,
        overrides: &HashMap<String, Value>,
    ) -> Result<ResolvedValues, ResolveError> {
        self.warn_undeclared(overrides);

        let mut values = Vec::with_capacity(self.len());
        for declaration in self.iter() {
            let value = declaration.resolve(overrides)?;
            values.push((declaration.name.clone(), value));
        }
        Ok(ResolvedValues { values })
    }

    /// Check every declared parameter and report all failures
    pub fn check(&self, overrides: &HashMap<String, Value>) -> Result<(), Vec<ResolveError>> {
        self.warn_undeclared(overrides);

        let errors: Vec<ResolveError> = self
            .iter()
            .filter_map(|declaration| declaration.resolve(overrides).err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn warn_undeclared(&self, overrides: &HashMap<String, Value>) {
        let mut undeclared: Vec<_> = overrides
            .keys()
            .filter(|name| self.get(name).is_none())
            .collect();
        undeclared.sort();
        for name in undeclared {
            warn!("Ignoring override for undeclared parameter '{}'", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeExpr;

    fn create_test_schema() -> VariableSchema {
        VariableSchema::from_declarations([
            ParameterDeclaration::new("region")
                .with_default(Value::String("us-east-1".to_string())),
            ParameterDeclaration::new("vpc_id"),
            ParameterDeclaration::new("subnet_ids")
                .with_type(TypeExpr::list_of(TypeExpr::String))
                .with_default(Value::List(vec![])),
        ])
        .unwrap()
    }

    fn overrides(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_resolve_uses_defaults_and_overrides() {
        let schema = create_test_schema();
        let resolved = schema
            .resolve(&overrides(&[(
                "vpc_id",
                Value::String("vpc-123".to_string()),
            )]))
            .unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(
            resolved.get("region"),
            Some(&Value::String("us-east-1".to_string()))
        );
        assert_eq!(
            resolved.get("vpc_id"),
            Some(&Value::String("vpc-123".to_string()))
        );
        assert_eq!(resolved.get("subnet_ids"), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_resolve_preserves_declaration_order() {
        let schema = create_test_schema();
        let resolved = schema
            .resolve(&overrides(&[(
                "vpc_id",
                Value::String("vpc-123".to_string()),
            )]))
            .unwrap();

        let names: Vec<_> = resolved.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["region", "vpc_id", "subnet_ids"]);
    }

    #[test]
    fn test_missing_required_parameter() {
        let schema = create_test_schema();
        let result = schema.resolve(&HashMap::new());
        assert_eq!(
            result,
            Err(ResolveError::MissingRequiredParameter {
                name: "vpc_id".to_string()
            })
        );
    }

    #[test]
    fn test_scalar_for_list_is_type_mismatch() {
        let schema = create_test_schema();
        let decl = schema.get("subnet_ids").unwrap();
        let result = decl.resolve(&overrides(&[(
            "subnet_ids",
            Value::String("subnet-a".to_string()),
        )]));
        assert_eq!(
            result,
            Err(ResolveError::TypeMismatch {
                name: "subnet_ids".to_string(),
                expected: "list(string)".to_string(),
                actual: "string".to_string(),
            })
        );
    }

    #[test]
    fn test_undeclared_overrides_are_ignored() {
        let schema = create_test_schema();
        let resolved = schema
            .resolve(&overrides(&[
                ("vpc_id", Value::String("vpc-1".to_string())),
                ("unknown", Value::Int(1)),
            ]))
            .unwrap();
        assert_eq!(resolved.get("unknown"), None);
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_check_reports_all_errors() {
        let schema = create_test_schema();
        let errors = schema
            .check(&overrides(&[("subnet_ids", Value::Bool(true))]))
            .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].parameter(), "vpc_id");
        assert!(matches!(errors[1], ResolveError::TypeMismatch { .. }));
    }

    #[test]
    fn test_resolved_values_to_json() {
        let schema = create_test_schema();
        let resolved = schema
            .resolve(&overrides(&[(
                "vpc_id",
                Value::String("vpc-123".to_string()),
            )]))
            .unwrap();

        assert_eq!(
            resolved.to_json(),
            serde_json::json!({
                "region": "us-east-1",
                "vpc_id": "vpc-123",
                "subnet_ids": [],
            })
        );
    }
}
