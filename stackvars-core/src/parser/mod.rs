//! Parser - Parse variable declarations, assignment files and raw values
//!
//! Convert HCL-style text to schema declarations and values using pest

use std::collections::{HashMap, HashSet};

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;

use crate::schema::{ParameterDeclaration, SchemaError, TypeExpr, VariableSchema};
use crate::value::Value;

#[derive(Parser)]
#[grammar = "parser/stackvars.pest"]
struct VarsParser;

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] pest::error::Error<Rule>),

    #[error("Invalid expression at line {line}: {message}")]
    InvalidExpression { line: usize, message: String },

    #[error("Unknown attribute '{attribute}' in variable '{variable}'")]
    UnknownAttribute { variable: String, attribute: String },

    #[error("Attribute '{attribute}' is set more than once in variable '{variable}'")]
    DuplicateAttribute { variable: String, attribute: String },

    #[error("'{0}' is assigned more than once")]
    DuplicateAssignment(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Parse a declarations file into a schema
pub fn parse_schema(input: &str) -> Result<VariableSchema, ParseError> {
    let pairs = VarsParser::parse(Rule::schema_file, input)?;

    let mut schema = VariableSchema::new();
    for pair in pairs {
        if pair.as_rule() == Rule::schema_file {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::variable_block {
                    schema.declare(parse_variable_block(inner)?)?;
                }
            }
        }
    }

    Ok(schema)
}

/// Parse an assignments file (`name = value` per line), keeping file order
pub fn parse_assignments(input: &str) -> Result<Vec<(String, Value)>, ParseError> {
    let pairs = VarsParser::parse(Rule::assignments_file, input)?;

    let mut seen = HashSet::new();
    let mut assignments = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::assignments_file {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::assignment {
                    let line = line_of(&inner);
                    let mut parts = inner.into_inner();
                    let name = next_pair(&mut parts, line, "variable name")?
                        .as_str()
                        .to_string();
                    let value = parse_expression(next_pair(&mut parts, line, "value")?)?;

                    if !seen.insert(name.clone()) {
                        return Err(ParseError::DuplicateAssignment(name));
                    }
                    assignments.push((name, value));
                }
            }
        }
    }

    Ok(assignments)
}

/// Parse a single value literal (e.g., `["subnet-a", "subnet-b"]`)
pub fn parse_value(input: &str) -> Result<Value, ParseError> {
    let pairs = VarsParser::parse(Rule::value_input, input)?;

    for pair in pairs {
        if pair.as_rule() == Rule::value_input {
            for inner in pair.into_inner() {
                if inner.as_rule() != Rule::EOI {
                    return parse_expression(inner);
                }
            }
        }
    }

    Err(ParseError::InvalidExpression {
        line: 1,
        message: "expected a value".to_string(),
    })
}

/// Parse a variable block
fn parse_variable_block(pair: Pair<Rule>) -> Result<ParameterDeclaration, ParseError> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let name = parse_string(next_pair(&mut inner, line, "variable name")?);

    let mut declaration = ParameterDeclaration::new(name.clone());
    let mut seen = HashSet::new();

    for attr in inner {
        let attr_line = line_of(&attr);
        let mut attr_inner = attr.into_inner();
        let key = next_pair(&mut attr_inner, attr_line, "attribute name")?
            .as_str()
            .to_string();
        let value = next_pair(&mut attr_inner, attr_line, "attribute value")?;

        if !seen.insert(key.clone()) {
            return Err(ParseError::DuplicateAttribute {
                variable: name,
                attribute: key,
            });
        }

        match key.as_str() {
            "description" => match parse_expression(value)? {
                Value::String(s) => declaration.description = s,
                other => {
                    return Err(ParseError::InvalidExpression {
                        line: attr_line,
                        message: format!(
                            "description of '{}' must be a string, got {}",
                            name,
                            other.type_name()
                        ),
                    });
                }
            },
            "type" => declaration.type_expr = parse_type_expr(value)?,
            "default" => declaration.default = Some(parse_expression(value)?),
            _ => {
                return Err(ParseError::UnknownAttribute {
                    variable: name,
                    attribute: key,
                });
            }
        }
    }

    Ok(declaration)
}

/// Parse type expression
fn parse_type_expr(pair: Pair<Rule>) -> Result<TypeExpr, ParseError> {
    let line = line_of(&pair);
    match pair.as_rule() {
        Rule::type_expr => {
            let mut inner = pair.into_inner();
            parse_type_expr(next_pair(&mut inner, line, "type")?)
        }
        Rule::type_simple => match pair.as_str() {
            "string" => Ok(TypeExpr::String),
            "number" => Ok(TypeExpr::Number),
            "bool" => Ok(TypeExpr::Bool),
            other => Err(ParseError::InvalidExpression {
                line,
                message: format!("unknown type '{}'", other),
            }),
        },
        Rule::type_generic => {
            let mut inner = pair.into_inner();
            let keyword = next_pair(&mut inner, line, "type constructor")?;
            let inner_type = parse_type_expr(next_pair(&mut inner, line, "element type")?)?;

            if keyword.as_str() == "list" {
                Ok(TypeExpr::List(Box::new(inner_type)))
            } else {
                Ok(TypeExpr::Map(Box::new(inner_type)))
            }
        }
        _ => Err(ParseError::InvalidExpression {
            line,
            message: format!("expected a type, found '{}'", pair.as_str()),
        }),
    }
}

/// Integers without a fraction, floats with one
fn parse_number(text: &str, line: usize) -> Result<Value, ParseError> {
    let invalid = |reason: String| ParseError::InvalidExpression {
        line,
        message: format!("invalid number '{}': {}", text, reason),
    };

    if text.contains('.') {
        let n = text.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
        if !n.is_finite() {
            return Err(invalid("out of range".to_string()));
        }
        Ok(Value::Float(n))
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|e| invalid(e.to_string()))
    }
}

fn parse_expression(pair: Pair<Rule>) -> Result<Value, ParseError> {
    let line = line_of(&pair);
    match pair.as_rule() {
        Rule::string => Ok(Value::String(parse_string(pair))),
        Rule::number => parse_number(pair.as_str(), line),
        Rule::boolean => Ok(Value::Bool(pair.as_str() == "true")),
        Rule::list => {
            let items: Result<Vec<Value>, ParseError> =
                pair.into_inner().map(parse_expression).collect();
            Ok(Value::List(items?))
        }
        Rule::map => {
            let mut map = HashMap::new();
            for entry in pair.into_inner() {
                let entry_line = line_of(&entry);
                let mut entry_inner = entry.into_inner();
                let key_pair = next_pair(&mut entry_inner, entry_line, "map key")?;
                let key = if key_pair.as_rule() == Rule::string {
                    parse_string(key_pair)
                } else {
                    key_pair.as_str().to_string()
                };
                let value_pair = next_pair(&mut entry_inner, entry_line, "map value")?;
                let value = parse_expression(value_pair)?;

                if map.insert(key.clone(), value).is_some() {
                    return Err(ParseError::InvalidExpression {
                        line: entry_line,
                        message: format!("duplicate map key '{}'", key),
                    });
                }
            }
            Ok(Value::Map(map))
        }
        _ => Err(ParseError::InvalidExpression {
            line,
            message: format!("expected a value, found '{}'", pair.as_str()),
        }),
    }
}

fn parse_string(pair: Pair<Rule>) -> String {
    let s = pair.as_str();
    // Remove quotes
    let inner = &s[1..s.len() - 1];

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn next_pair<'a>(
    pairs: &mut Pairs<'a, Rule>,
    line: usize,
    what: &str,
) -> Result<Pair<'a, Rule>, ParseError> {
    pairs.next().ok_or_else(|| ParseError::InvalidExpression {
        line,
        message: format!("missing {}", what),
    })
}

fn line_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variable_blocks() {
        let input = r#"
            variable "region" {
              description = "AWS region"
              type        = string
              default     = "us-east-1"
            }

            variable "vpc_id" {
              description = "VPC to deploy into"
            }
        "#;

        let schema = parse_schema(input).unwrap();
        assert_eq!(schema.len(), 2);

        let region = schema.get("region").unwrap();
        assert_eq!(region.description, "AWS region");
        assert_eq!(region.type_expr, TypeExpr::String);
        assert_eq!(
            region.default,
            Some(Value::String("us-east-1".to_string()))
        );

        let vpc = schema.get("vpc_id").unwrap();
        assert_eq!(vpc.type_expr, TypeExpr::String);
        assert!(vpc.is_required());
    }

    #[test]
    fn commented_out_default_is_absent() {
        let input = r#"
            variable "security_group_ids" {
              type = list(string)
              # default = ["sg-0123"]
              // default = ["sg-0123"]
              /* default = ["sg-0123"] */
            }
        "#;

        let schema = parse_schema(input).unwrap();
        let sg = schema.get("security_group_ids").unwrap();
        assert_eq!(sg.type_expr, TypeExpr::list_of(TypeExpr::String));
        assert!(sg.default.is_none());
    }

    #[test]
    fn parse_generic_type_expressions() {
        let input = r#"
            variable "ports" { type = list(number) }
            variable "tags" {
              type    = map(string)
              default = { Name = "db", "cost-center" = "42" }
            }
            variable "matrix" { type = list(list(bool)) }
        "#;

        let schema = parse_schema(input).unwrap();
        assert_eq!(
            schema.get("ports").unwrap().type_expr,
            TypeExpr::list_of(TypeExpr::Number)
        );
        assert_eq!(
            schema.get("matrix").unwrap().type_expr,
            TypeExpr::list_of(TypeExpr::list_of(TypeExpr::Bool))
        );

        let tags = schema.get("tags").unwrap();
        assert_eq!(tags.type_expr, TypeExpr::map_of(TypeExpr::String));
        match &tags.default {
            Some(Value::Map(map)) => {
                assert_eq!(map.get("Name"), Some(&Value::String("db".to_string())));
                assert_eq!(
                    map.get("cost-center"),
                    Some(&Value::String("42".to_string()))
                );
            }
            other => panic!("Expected map default, got {:?}", other),
        }
    }

    #[test]
    fn empty_list_default() {
        let schema = parse_schema(
            r#"variable "subnet_ids" {
                 type    = list(string)
                 default = []
               }"#,
        )
        .unwrap();
        assert_eq!(
            schema.get("subnet_ids").unwrap().default,
            Some(Value::List(vec![]))
        );
    }

    #[test]
    fn unknown_attribute_fails() {
        let result = parse_schema(r#"variable "region" { sensitive = true }"#);
        assert!(matches!(
            result,
            Err(ParseError::UnknownAttribute { ref attribute, .. }) if attribute == "sensitive"
        ));
    }

    #[test]
    fn duplicate_attribute_fails() {
        let result = parse_schema(r#"variable "region" { default = "a" default = "b" }"#);
        assert!(matches!(result, Err(ParseError::DuplicateAttribute { .. })));
    }

    #[test]
    fn duplicate_variable_fails() {
        let result = parse_schema(
            r#"
            variable "region" {}
            variable "region" {}
            "#,
        );
        assert!(matches!(
            result,
            Err(ParseError::Schema(SchemaError::DuplicateParameter(ref name))) if name == "region"
        ));
    }

    #[test]
    fn default_type_mismatch_fails() {
        let result = parse_schema(
            r#"variable "subnet_ids" {
                 type    = list(string)
                 default = "subnet-a"
               }"#,
        );
        assert!(matches!(
            result,
            Err(ParseError::Schema(SchemaError::InvalidDefault { .. }))
        ));
    }

    #[test]
    fn quoted_type_fails() {
        let result = parse_schema(r#"variable "region" { type = "string" }"#);
        assert!(matches!(result, Err(ParseError::InvalidExpression { .. })));
    }

    #[test]
    fn syntax_error_reported() {
        let result = parse_schema(r#"variable "region" { default = }"#);
        assert!(matches!(result, Err(ParseError::Syntax(_))));
    }

    #[test]
    fn parse_assignments_file() {
        let input = r#"
            # production overrides
            vpc_id             = "vpc-0abc"
            security_group_ids = ["sg-1", "sg-2",]
            db_instance_class  = "db.r6g.large"
        "#;

        let assignments = parse_assignments(input).unwrap();
        assert_eq!(assignments.len(), 3);
        assert_eq!(assignments[0].0, "vpc_id");
        assert_eq!(assignments[1].1, Value::string_list(["sg-1", "sg-2"]));
        assert_eq!(assignments[2].0, "db_instance_class");
    }

    #[test]
    fn duplicate_assignment_fails() {
        let result = parse_assignments("region = \"a\"\nregion = \"b\"\n");
        assert!(matches!(
            result,
            Err(ParseError::DuplicateAssignment(ref name)) if name == "region"
        ));
    }

    #[test]
    fn parse_single_values() {
        assert_eq!(
            parse_value(r#"["subnet-a", "subnet-b"]"#).unwrap(),
            Value::string_list(["subnet-a", "subnet-b"])
        );
        assert_eq!(parse_value("42").unwrap(), Value::Int(42));
        assert_eq!(parse_value("-7").unwrap(), Value::Int(-7));
        assert_eq!(parse_value("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse_value("-0.25").unwrap(), Value::Float(-0.25));
        assert_eq!(parse_value("false").unwrap(), Value::Bool(false));
        assert!(parse_value("subnet-a").is_err());
        assert!(parse_value("1.").is_err());
        assert!(parse_value(".5").is_err());
    }

    #[test]
    fn number_type_accepts_integers_and_fractions() {
        let input = r#"
            variable "ratio" {
              type    = number
              default = 0.75
            }
            variable "port" {
              type    = number
              default = 5432
            }
            variable "weights" {
              type    = list(number)
              default = [1, 2.5]
            }
        "#;

        let schema = parse_schema(input).unwrap();
        assert_eq!(
            schema.get("ratio").unwrap().default,
            Some(Value::Float(0.75))
        );
        assert_eq!(schema.get("port").unwrap().default, Some(Value::Int(5432)));
        assert_eq!(
            schema.get("weights").unwrap().default,
            Some(Value::List(vec![Value::Int(1), Value::Float(2.5)]))
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            parse_value(r#""line\nnext \"quoted\" back\\slash""#).unwrap(),
            Value::String("line\nnext \"quoted\" back\\slash".to_string())
        );
    }

    #[test]
    fn number_out_of_range_fails() {
        let result = parse_value("99999999999999999999");
        assert!(matches!(result, Err(ParseError::InvalidExpression { .. })));
    }
}
