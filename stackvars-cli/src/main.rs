use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use log::debug;

use stackvars_core::VariableSchema;
use stackvars_core::builtin;
use stackvars_core::render::{self, OutputFormat};
use stackvars_core::resolver::ResolveError;
use stackvars_core::signature::SchemaSignature;
use stackvars_core::sources::{self, DEFAULT_ENV_PREFIX, LoadOptions, OverrideSet};

#[derive(Parser)]
#[command(name = "stackvars")]
#[command(about = "Resolve typed input variables for infrastructure templates", long_about = None)]
struct Cli {
    /// Show debug logs (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SchemaArgs {
    /// Variable declarations file (default: built-in database schema)
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
}

#[derive(Args)]
struct OverrideArgs {
    #[command(flatten)]
    schema: SchemaArgs,

    /// Variable file (.json or name = value lines); later files win
    #[arg(long = "var-file", value_name = "FILE")]
    var_files: Vec<PathBuf>,

    /// Set a single variable; later assignments win
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Prefix of environment variable overrides
    #[arg(long, default_value = DEFAULT_ENV_PREFIX)]
    env_prefix: String,

    /// Ignore environment variable overrides
    #[arg(long)]
    no_env: bool,
}

impl OverrideArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            env_prefix: self.env_prefix.clone(),
            use_env: !self.no_env,
            var_files: self.var_files.clone(),
            assignments: self.vars.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show declared parameters, their types and defaults
    Describe {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Resolve variables and print the final values
    Resolve {
        #[command(flatten)]
        inputs: OverrideArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Check that every variable resolves, reporting all problems
    Validate {
        #[command(flatten)]
        inputs: OverrideArgs,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Tfvars,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Tfvars => OutputFormat::Tfvars,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Describe { schema, no_color } => run_describe(&schema, no_color),
        Commands::Resolve { inputs, format } => run_resolve(&inputs, format.into()),
        Commands::Validate { inputs } => run_validate(&inputs),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "stackvars", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    env_logger::Builder::from_env(env).init();
}

/// Load the schema named on the command line, or the built-in one
fn load_schema(args: &SchemaArgs) -> Result<(VariableSchema, String), String> {
    match &args.schema {
        Some(path) => {
            let schema = sources::load_schema_file(path).map_err(|e| e.to_string())?;
            debug!(
                "Loaded {} parameter(s) from {}",
                schema.len(),
                path.display()
            );
            Ok((schema, derive_schema_name(path)))
        }
        None => Ok((
            builtin::database_schema(),
            builtin::DATABASE_SCHEMA_NAME.to_string(),
        )),
    }
}

/// Derive the schema name from its file
/// Examples:
/// - stacks/database/variables.tf -> database
/// - database.tf -> database
fn derive_schema_name(path: &Path) -> String {
    let file_stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    // variables.tf is named after its directory
    if file_stem == "variables"
        && let Some(parent) = path.parent()
        && let Some(parent_name) = parent.file_name()
        && let Some(name) = parent_name.to_str()
    {
        return name.to_string();
    }

    file_stem.to_string()
}

fn load_overrides(schema: &VariableSchema, inputs: &OverrideArgs) -> Result<OverrideSet, String> {
    sources::load_overrides(schema, &inputs.load_options(), sources::process_env())
        .map_err(|e| e.to_string())
}

/// Describe an error, naming where the offending override came from
fn format_resolve_error(error: &ResolveError, overrides: &OverrideSet) -> String {
    match overrides.origin(error.parameter()) {
        Some(origin) => format!("{} (from {})", error, origin),
        None => error.to_string(),
    }
}

fn run_describe(args: &SchemaArgs, no_color: bool) -> Result<(), String> {
    let (schema, name) = load_schema(args)?;
    let signature = SchemaSignature::from_schema(&schema, &name);
    let use_color = !no_color && io::stdout().is_terminal();
    print!("{}", signature.display_with_color(use_color));
    Ok(())
}

fn run_resolve(inputs: &OverrideArgs, format: OutputFormat) -> Result<(), String> {
    let (schema, _) = load_schema(&inputs.schema)?;
    let overrides = load_overrides(&schema, inputs)?;

    let resolved = schema
        .resolve(overrides.values())
        .map_err(|e| format_resolve_error(&e, &overrides))?;

    let output = render::render(&resolved, format)
        .map_err(|e| format!("Failed to render values: {}", e))?;
    if output.ends_with('\n') {
        print!("{}", output);
    } else {
        println!("{}", output);
    }
    Ok(())
}

fn run_validate(inputs: &OverrideArgs) -> Result<(), String> {
    let (schema, name) = load_schema(&inputs.schema)?;
    let overrides = load_overrides(&schema, inputs)?;

    println!("{}", format!("Validating {}...", name).cyan());

    if let Err(errors) = schema.check(overrides.values()) {
        for error in &errors {
            println!("  {} {}", "✗".red(), format_resolve_error(error, &overrides));
        }
        return Err(format!("{} parameter(s) failed validation", errors.len()));
    }

    println!(
        "{}",
        format!("✓ {} parameters resolved successfully.", schema.len())
            .green()
            .bold()
    );

    for declaration in schema.iter() {
        let source = match overrides.origin(&declaration.name) {
            Some(origin) => origin.to_string(),
            None => "default".to_string(),
        };
        println!(
            "  • {} {}",
            declaration.name,
            format!("({})", source).dimmed()
        );
    }

    Ok(())
}
