//! Sources - Collect overrides from the environment, variable files and the command line
//!
//! Precedence (lowest to highest):
//! 1. Environment variables (`TF_VAR_<name>` by default)
//! 2. Variable files, in the order given
//! 3. Command-line `name=value` assignments, in the order given

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::parser::{self, ParseError};
use crate::schema::{TypeExpr, VariableSchema};
use crate::value::{ConversionError, Value};

/// Default prefix for environment variable overrides
pub const DEFAULT_ENV_PREFIX: &str = "TF_VAR_";

/// Source error
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must contain a JSON object", .0.display())]
    NotAnObject(PathBuf),

    #[error("Invalid value for '{name}' in {}: {source}", path.display())]
    Conversion {
        name: String,
        path: PathBuf,
        #[source]
        source: ConversionError,
    },

    #[error("Invalid assignment '{0}': expected NAME=VALUE")]
    InvalidAssignment(String),
}

/// Options controlling where overrides are collected from
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Prefix for environment variable overrides (default: TF_VAR_)
    pub env_prefix: String,

    /// Read overrides from the environment
    pub use_env: bool,

    /// Variable files, lowest precedence first
    pub var_files: Vec<PathBuf>,

    /// Raw `name=value` assignments, lowest precedence first
    pub assignments: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            use_env: true,
            var_files: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

/// Where an override came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Environment variable name
    Environment(String),
    File(PathBuf),
    CommandLine,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Environment(var) => write!(f, "environment variable {}", var),
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::CommandLine => write!(f, "command line"),
        }
    }
}

/// Overrides merged across all layers
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    values: HashMap<String, Value>,
    origins: HashMap<String, Origin>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an override, replacing any value from a lower layer
    pub fn insert(&mut self, name: impl Into<String>, value: Value, origin: Origin) {
        let name = name.into();
        if let Some(previous) = self.origins.get(&name) {
            debug!("{}: {} overrides {}", name, origin, previous);
        }
        self.values.insert(name.clone(), value);
        self.origins.insert(name, origin);
    }

    /// Values keyed by parameter name, ready for resolution
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub fn origin(&self, name: &str) -> Option<&Origin> {
        self.origins.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge `<prefix><name>` variables for declared parameters
    pub fn merge_env<I>(&mut self, schema: &VariableSchema, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut found: Vec<(String, String, String)> = vars
            .into_iter()
            .filter_map(|(key, raw)| {
                let name = key.strip_prefix(prefix)?.to_string();
                schema.get(&name)?;
                Some((name, key, raw))
            })
            .collect();
        // Environment iteration order is unspecified
        found.sort();

        debug!("{} override(s) from environment", found.len());
        for (name, key, raw) in found {
            let value = parse_raw(schema, &name, &raw);
            self.insert(name, value, Origin::Environment(key));
        }
    }

    /// Merge a variable file: JSON object for `*.json`, assignments otherwise
    pub fn merge_var_file(&mut self, path: impl AsRef<Path>) -> Result<(), SourceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let assignments = if is_json {
            json_assignments(path, &content)?
        } else {
            parser::parse_assignments(&content).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };

        debug!("{} override(s) from {}", assignments.len(), path.display());
        for (name, value) in assignments {
            self.insert(name, value, Origin::File(path.to_path_buf()));
        }
        Ok(())
    }

    /// Merge a raw `name=value` assignment
    pub fn merge_assignment(
        &mut self,
        schema: &VariableSchema,
        assignment: &str,
    ) -> Result<(), SourceError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| SourceError::InvalidAssignment(assignment.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SourceError::InvalidAssignment(assignment.to_string()));
        }

        let value = parse_raw(schema, name, raw);
        self.insert(name, value, Origin::CommandLine);
        Ok(())
    }
}

/// Environment of the current process
///
/// Entries whose name or value is not valid UTF-8 are skipped.
pub fn process_env() -> Vec<(String, String)> {
    utf8_env(std::env::vars_os())
}

/// Keep only environment entries that are valid UTF-8
pub fn utf8_env<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, raw)| match (key.into_string(), raw.into_string()) {
            (Ok(key), Ok(raw)) => Some((key, raw)),
            (Ok(key), Err(_)) => {
                debug!(
                    "Skipping environment variable {} with non UTF-8 value",
                    key
                );
                None
            }
            (Err(key), _) => {
                debug!(
                    "Skipping environment variable with non UTF-8 name {:?}",
                    key
                );
                None
            }
        })
        .collect()
}

/// Collect overrides from every configured layer
///
/// `env` is the environment to read; callers normally pass [`process_env`].
pub fn load_overrides<I>(
    schema: &VariableSchema,
    options: &LoadOptions,
    env: I,
) -> Result<OverrideSet, SourceError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut overrides = OverrideSet::new();

    if options.use_env {
        overrides.merge_env(schema, &options.env_prefix, env);
    }

    for path in &options.var_files {
        overrides.merge_var_file(path)?;
    }

    for assignment in &options.assignments {
        overrides.merge_assignment(schema, assignment)?;
    }

    Ok(overrides)
}

/// Load a declarations file
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<VariableSchema, SourceError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parser::parse_schema(&content).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Interpret a raw string for a parameter
///
/// Strings (and undeclared names) are taken literally. Other types are
/// parsed as a value literal; text that does not parse stays a string so
/// that resolution reports the type mismatch.
pub fn parse_raw(schema: &VariableSchema, name: &str, raw: &str) -> Value {
    match schema.get(name).map(|p| &p.type_expr) {
        None | Some(TypeExpr::String) => Value::String(raw.to_string()),
        Some(_) => parser::parse_value(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn json_assignments(path: &Path, content: &str) -> Result<Vec<(String, Value)>, SourceError> {
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let serde_json::Value::Object(members) = json else {
        return Err(SourceError::NotAnObject(path.to_path_buf()));
    };

    let mut assignments = Vec::new();
    for (name, member) in &members {
        if member.is_null() {
            debug!("{}: null in {}, treated as unset", name, path.display());
            continue;
        }
        let value = Value::from_json(member).map_err(|source| SourceError::Conversion {
            name: name.clone(),
            path: path.to_path_buf(),
            source,
        })?;
        assignments.push((name.clone(), value));
    }
    Ok(assignments)
}
