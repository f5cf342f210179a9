//! Render - Print resolved values for a provisioning engine

use crate::resolver::ResolvedValues;

/// Output format for resolved values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON object
    #[default]
    Json,
    /// `name = value` assignments, one per line
    Tfvars,
}

/// Render resolved values in the given format
pub fn render(values: &ResolvedValues, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&values.to_json()),
        OutputFormat::Tfvars => Ok(render_assignments(values)),
    }
}

/// Render values as an assignments file, aligning the `=` signs
pub fn render_assignments(values: &ResolvedValues) -> String {
    let width = values.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut output = String::new();
    for (name, value) in values.iter() {
        output.push_str(&format!("{:<width$} = {}\n", name, value, width = width));
    }
    output
}
