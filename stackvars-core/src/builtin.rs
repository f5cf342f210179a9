//! Built-in schema for the database stack
//!
//! Inputs of the template that provisions the database and its
//! networking context.

use crate::schema::{ParameterDeclaration, TypeExpr, VariableSchema};
use crate::value::Value;

/// Declarations file shipped with the crate, equivalent to [`database_schema`]
pub const DATABASE_TF: &str = include_str!("../schemas/database.tf");

/// Name shown for the built-in schema
pub const DATABASE_SCHEMA_NAME: &str = "database";

/// Parameters of the database stack
///
/// `security_group_ids` has no default, so it must be supplied along with
/// `vpc_id`.
pub fn database_schema() -> VariableSchema {
    VariableSchema {
        parameters: vec![
            ParameterDeclaration::new("region")
                .with_description("AWS region to deploy the database into")
                .with_default(Value::String("us-east-1".to_string())),
            ParameterDeclaration::new("db_instance_class")
                .with_description("Instance class of the database")
                .with_default(Value::String("db.t3.micro".to_string())),
            ParameterDeclaration::new("db_username")
                .with_description("Master username for the database")
                .with_default(Value::String("tracer_user".to_string())),
            ParameterDeclaration::new("db_name")
                .with_description("Name of the initial database")
                .with_default(Value::String("tracer_db".to_string())),
            ParameterDeclaration::new("security_group_ids")
                .with_description("Security groups attached to the database")
                .with_type(TypeExpr::list_of(TypeExpr::String)),
            ParameterDeclaration::new("vpc_id")
                .with_description("VPC hosting the database"),
            ParameterDeclaration::new("subnet_ids")
                .with_description("Subnets for the database subnet group")
                .with_type(TypeExpr::list_of(TypeExpr::String))
                .with_default(Value::List(vec![])),
        ],
    }
}
