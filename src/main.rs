use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use gen_matrix::config::{self, MatrixConfig};
use gen_matrix::matrix;
use gen_matrix::output;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process;

/// Generate the CI build matrix of SDK images.
///
/// Prints a single `matrix=<json>` line for a GitHub Actions step output.
/// Each entry is one SDK / language version / architecture combination.
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(
    name = "gen-matrix",
    version,
    about,
    after_help = "Examples:\n  gen-matrix\n  gen-matrix --no-arch\n  gen-matrix --config matrix.toml --github-output"
)]
struct Cli {
    /// Leave the `arch` field out of every entry (used when building multi-arch manifests).
    #[arg(long)]
    no_arch: bool,

    /// TOML file with the SDK tables to use instead of the built-in ones.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also append the matrix line to the file named by $GITHUB_OUTPUT.
    #[arg(long)]
    github_output: bool,

    /// Print each generated entry to stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Interpretation used when the arguments don't parse: architecture is
    /// suppressed only if the very first argument is `--no-arch`.
    fn fallback(args: &[OsString]) -> Self {
        Self {
            no_arch: args.get(1).map(OsString::as_os_str) == Some(OsStr::new("--no-arch")),
            ..Self::default()
        }
    }
}

const HELP_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];

/// Whether the first argument asks for help or version output.
fn leads_with_help(args: &[OsString]) -> bool {
    args.get(1)
        .and_then(|arg| arg.to_str())
        .is_some_and(|arg| HELP_FLAGS.contains(&arg))
}

/// Parse arguments without ever failing on unexpected input.
///
/// `--help` and `--version` print and exit only as the first argument;
/// anywhere else they are ignored like any other unrecognized argument.
fn parse_args(args: Vec<OsString>) -> Cli {
    match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e)
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
                && leads_with_help(&args) =>
        {
            e.exit()
        }
        Err(_) => {
            let ignored: Vec<String> = args
                .iter()
                .skip(1)
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect();
            output::note(&format!(
                "ignoring unrecognized arguments: {}",
                ignored.join(" ")
            ));
            Cli::fallback(&args)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    output::set_verbose(cli.verbose);

    // Resolve before printing anything so a misconfigured step fails cleanly.
    let github_output = if cli.github_output {
        Some(config::github_output_path().ok_or_else(|| {
            anyhow!(
                "--github-output requires ${} to be set",
                config::GITHUB_OUTPUT_ENV_VAR
            )
        })?)
    } else {
        None
    };

    let tables = MatrixConfig::load(cli.config.as_deref())?;
    let matrix = matrix::generate(&tables, !cli.no_arch);

    output::detail(&format!(
        "{} entries from {} table row(s), arch {}",
        matrix.include.len(),
        tables.row_count(),
        if cli.no_arch { "omitted" } else { "included" }
    ));
    for entry in &matrix.include {
        output::detail(&matrix::describe_entry(entry));
    }
    for dup in matrix::find_duplicates(&matrix) {
        output::note(&format!(
            "duplicate matrix entry: {}",
            matrix::describe_entry(dup)
        ));
    }

    let line = matrix::render_output_line(&matrix)?;
    output::write_matrix_line(&mut io::stdout().lock(), &line)?;

    if let Some(path) = github_output {
        output::append_matrix_line(&path, &line)?;
    }

    Ok(())
}

fn main() {
    let cli = parse_args(std::env::args_os().collect());

    if let Err(e) = run(cli) {
        output::fail(&format!("{e:#}"));
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
