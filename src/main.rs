use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use throwcheck::config::{self, CheckConfig, Config, Coverage};
use throwcheck::diagnostics::{self, CompileError, Diagnostic, JsonDiagnostic};

#[derive(Parser)]
#[command(name = "throwcheck", version, about = "Check exception-propagation markers")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Short,
    Json,
}

/// Options shared by every subcommand that reads configuration.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Path to throwcheck.toml (otherwise searched upward from the first input)
    #[arg(long)]
    config: Option<PathBuf>,
    /// How far a statement marker reaches: "nested" or "header-only"
    #[arg(long)]
    coverage: Option<Coverage>,
    /// Marker attribute name, e.g. `maybe_unhandled` or `acme::may_throw`
    #[arg(long)]
    marker: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check source files and report marker mismatches
    Check {
        /// Source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        config: ConfigArgs,
        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: Format,
    },
    /// Print the resolved tree of one file with the checker's verdicts
    Tree {
        /// Source file
        file: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

const EXIT_CLEAN: i32 = 0;
const EXIT_DIAGNOSTICS: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "throwcheck=debug",
        _ => "throwcheck=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}

/// Load the configuration file, then apply command-line overrides on top.
fn resolve_config(args: &ConfigArgs, first_input: &Path) -> Result<CheckConfig, CompileError> {
    let file_config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            let dir = first_input.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let (config, found) = Config::discover(dir)?;
            if let Some(path) = found {
                info!(config = %path.display(), "using configuration file");
            }
            config
        }
    };
    let mut check = file_config.check;
    if let Some(marker) = &args.marker {
        config::validate_marker(marker, Path::new("--marker"))?;
        check.marker = marker.clone();
    }
    if let Some(coverage) = args.coverage {
        check.coverage = coverage;
    }
    Ok(check)
}

struct FileReport {
    path: PathBuf,
    source: String,
    outcome: Result<Vec<Diagnostic>, CompileError>,
}

fn check_file(path: &Path, config: &CheckConfig) -> FileReport {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return FileReport {
                path: path.to_path_buf(),
                source: String::new(),
                outcome: Err(CompileError::io(format!("failed to read source: {e}"), path.to_path_buf())),
            };
        }
    };
    let outcome = throwcheck::check_source(&source, config);
    match &outcome {
        Ok(diags) => info!(file = %path.display(), diagnostics = diags.len(), "checked"),
        Err(err) => warn!(file = %path.display(), %err, "front-end failed"),
    }
    FileReport { path: path.to_path_buf(), source, outcome }
}

fn run_check(files: &[PathBuf], args: &ConfigArgs, format: Format) -> i32 {
    let Some(first) = files.first() else { return EXIT_CLEAN };
    let config = match resolve_config(args, first) {
        Ok(config) => config,
        Err(err) => {
            diagnostics::render_error("", &first.display().to_string(), &err);
            return EXIT_ERROR;
        }
    };

    // Reports come back in input order.
    let reports: Vec<FileReport> = files.par_iter().map(|path| check_file(path, &config)).collect();

    let names: Vec<String> = reports.iter().map(|r| r.path.display().to_string()).collect();
    let color = std::io::stdout().is_terminal();
    let mut stdout = std::io::stdout().lock();
    let mut json = Vec::new();
    let mut total = 0;
    let mut failed = false;

    for (report, name) in reports.iter().zip(&names) {
        let diags = match &report.outcome {
            Ok(diags) => diags,
            Err(err) => {
                diagnostics::render_error(&report.source, name, err);
                failed = true;
                continue;
            }
        };
        total += diags.len();
        let written = match format {
            Format::Human => diagnostics::render_diagnostics(name, &report.source, diags, color, &mut stdout),
            Format::Short => stdout.write_all(diagnostics::format_short(name, &report.source, diags).as_bytes()),
            Format::Json => {
                json.extend(diags.iter().map(|d| JsonDiagnostic::from_diagnostic(name, &report.source, d)));
                Ok(())
            }
        };
        if let Err(e) = written {
            eprintln!("error: failed to write output: {e}");
            return EXIT_ERROR;
        }
    }

    if format == Format::Json {
        let written = serde_json::to_string_pretty(&json)
            .map_err(std::io::Error::from)
            .and_then(|text| writeln!(stdout, "{text}"));
        if let Err(e) = written {
            eprintln!("error: failed to write output: {e}");
            return EXIT_ERROR;
        }
    } else if format == Format::Human && total > 0 {
        eprintln!("{total} diagnostic(s) in {} file(s)", reports.len());
    }

    if failed {
        EXIT_ERROR
    } else if total > 0 {
        EXIT_DIAGNOSTICS
    } else {
        EXIT_CLEAN
    }
}

fn run_tree(file: &Path, args: &ConfigArgs) -> i32 {
    let name = file.display().to_string();
    let config = match resolve_config(args, file) {
        Ok(config) => config,
        Err(err) => {
            diagnostics::render_error("", &name, &err);
            return EXIT_ERROR;
        }
    };
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            let err = CompileError::io(format!("failed to read source: {e}"), file.to_path_buf());
            diagnostics::render_error("", &name, &err);
            return EXIT_ERROR;
        }
    };
    match throwcheck::parse_source(&source, &config) {
        Ok(tree) => {
            print!("{}", throwcheck::pretty::pretty_tree(&tree, &config));
            EXIT_CLEAN
        }
        Err(err) => {
            diagnostics::render_error(&source, &name, &err);
            EXIT_ERROR
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match &cli.command {
        Commands::Check { files, config, format } => run_check(files, config, *format),
        Commands::Tree { file, config } => run_tree(file, config),
    };
    std::process::exit(code);
}
