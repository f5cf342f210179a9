//! Signature - Summarize the input surface of a schema
//!
//! Lists each parameter with its type, default and whether the caller must
//! supply it.

use crate::schema::{TypeExpr, VariableSchema};

/// Parameter entry in a schema signature
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: String,
    pub type_expr: TypeExpr,
    /// Whether this parameter is required (no default)
    pub required: bool,
    /// Default value as a display string
    pub default: Option<String>,
    pub description: String,
}

/// Signature of a schema
#[derive(Debug, Clone)]
pub struct SchemaSignature {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
}

/// ANSI color codes for terminal output
struct Colors {
    bold: &'static str,
    reset: &'static str,
    dim: &'static str,
    red: &'static str,
    yellow: &'static str,
    cyan: &'static str,
    white: &'static str,
}

impl Colors {
    fn new(use_color: bool) -> Self {
        if use_color {
            Self {
                bold: "\x1b[1m",
                reset: "\x1b[0m",
                dim: "\x1b[2m",
                red: "\x1b[31m",
                yellow: "\x1b[33m",
                cyan: "\x1b[36m",
                white: "\x1b[97m",
            }
        } else {
            Self {
                bold: "",
                reset: "",
                dim: "",
                red: "",
                yellow: "",
                cyan: "",
                white: "",
            }
        }
    }
}

impl SchemaSignature {
    pub fn from_schema(schema: &VariableSchema, name: &str) -> Self {
        let parameters = schema
            .iter()
            .map(|p| ParameterInfo {
                name: p.name.clone(),
                type_expr: p.type_expr.clone(),
                required: p.is_required(),
                default: p.default.as_ref().map(|v| v.to_string()),
                description: p.description.clone(),
            })
            .collect();

        Self {
            name: name.to_string(),
            parameters,
        }
    }

    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.required).count()
    }

    /// Display the signature as a formatted string
    pub fn display(&self) -> String {
        self.display_with_color(true)
    }

    /// Display with optional color support
    pub fn display_with_color(&self, use_color: bool) -> String {
        let c = Colors::new(use_color);
        let mut output = String::new();

        output.push_str(&format!(
            "{}Schema:{} {}{}{}\n\n",
            c.bold, c.reset, c.cyan, self.name, c.reset
        ));

        output.push_str(&format!("{}=== PARAMETERS ==={}\n\n", c.bold, c.reset));
        if self.parameters.is_empty() {
            output.push_str(&format!("  {}(none){}\n", c.dim, c.reset));
        } else {
            let width = self
                .parameters
                .iter()
                .map(|p| p.name.len())
                .max()
                .unwrap_or(0);

            for param in &self.parameters {
                let padding = " ".repeat(width - param.name.len());
                let tail = match &param.default {
                    Some(default) => format!("{}= {}{}", c.dim, default, c.reset),
                    None => format!("{}(required){}", c.red, c.reset),
                };
                output.push_str(&format!(
                    "  {}{}{}{}  {}{}{}  {}\n",
                    c.white, param.name, c.reset, padding, c.yellow, param.type_expr, c.reset, tail
                ));
                if !param.description.is_empty() {
                    output.push_str(&format!(
                        "  {}{}  {}{}\n",
                        " ".repeat(width),
                        c.dim,
                        param.description,
                        c.reset
                    ));
                }
            }
        }
        output.push('\n');

        output.push_str(&format!(
            "{} parameters, {} required\n",
            self.parameters.len(),
            self.required_count()
        ));

        output
    }
}
