//! CLI tool to substitute environment variables in text files.

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser as _;
use envsubst_rs::{ListEnv, Mode, Restrictions};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
#[command(
    name = "envsubst",
    version,
    about = "Substitute environment variables in text",
    after_help = "Examples:\n  envsubst -i config.tmpl -o config.yaml\n  envsubst --no-unset < \
                  app.env.tmpl\n  envsubst -w --only HOST --only PORT nginx.conf"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input file. Defaults to the positional INPUT, then stdin.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Input file, when `-i` is not given.
    #[arg(value_name = "INPUT", conflicts_with = "input")]
    positional: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the result back to the input file.
    #[arg(short = 'w', long, conflicts_with = "output")]
    in_place: bool,

    /// Fail if a variable is not set.
    #[arg(long)]
    no_unset: bool,

    /// Fail if a variable is set but empty.
    #[arg(long)]
    no_empty: bool,

    /// Leave `$1`, `${2}` and other digit-leading references untouched.
    #[arg(long)]
    no_digit: bool,

    /// Report every failing variable instead of stopping at the first.
    #[arg(long)]
    all_errors: bool,

    /// Only substitute this variable. May be repeated.
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(&'static str),
    #[error("{}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("error writing output to {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("error creating backup of {}: {source}", path.display())]
    Backup { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Substitute(#[from] envsubst_rs::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ CliError::Usage(_)) => {
            eprintln!("envsubst: {err}");
            eprintln!("Try 'envsubst --help' for more information.");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("envsubst: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let input = cli.input.as_deref().or(cli.positional.as_deref());
    if cli.in_place && input.is_none() {
        return Err(CliError::Usage("--in-place requires an input file"));
    }

    let data = match input {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?,
        None => read_stdin()?,
    };

    let name = input.map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    let env = ListEnv::os();
    let mode = if cli.all_errors {
        Mode::AllErrors
    } else {
        Mode::Quick
    };
    let output = envsubst_rs::Parser::new(name, &env)
        .restrictions(Restrictions::new(cli.no_unset, cli.no_empty))
        .mode(mode)
        .select(cli.only.iter().cloned())
        .no_digit(cli.no_digit)
        .parse(&data)?;

    match (input, cli.output.as_deref()) {
        (Some(path), _) if cli.in_place => write_in_place(path, &data, &output),
        (_, Some(path)) => fs::write(path, &output).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        }),
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| CliError::Write {
                    path: PathBuf::from("STDOUT"),
                    source,
                })
        }
    }
}

fn read_stdin() -> Result<String, CliError> {
    let mut stdin = io::stdin().lock();
    if stdin.is_terminal() {
        return Err(CliError::Usage("no input: pass a file or pipe data on stdin"));
    }
    let mut data = String::new();
    stdin
        .read_to_string(&mut data)
        .map_err(|source| CliError::Read {
            path: PathBuf::from("STDIN"),
            source,
        })?;
    Ok(data)
}

/// Replace `path` with `output`, keeping a backup of `original` until
/// the write has succeeded.
fn write_in_place(path: &Path, original: &str, output: &str) -> Result<(), CliError> {
    let backup = backup_file(path, original)?;
    tracing::debug!(backup = %backup.display(), "wrote backup");

    if let Err(source) = fs::write(path, output) {
        if let Err(err) = fs::rename(&backup, path) {
            tracing::error!(backup = %backup.display(), %err, "failed to recover backup file");
        }
        return Err(CliError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    if let Err(err) = fs::remove_file(&backup) {
        tracing::warn!(backup = %backup.display(), %err, "failed to remove backup file");
    }
    Ok(())
}

/// Write `data` to a uniquely named `<file>_XXXXXX` next to `path`.
fn backup_file(path: &Path, data: &str) -> Result<PathBuf, CliError> {
    let backup_err = |source| CliError::Backup {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = format!(
        "{}_",
        path.file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    );

    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(dir)
        .map_err(backup_err)?;
    file.write_all(data.as_bytes()).map_err(backup_err)?;
    let (_, backup) = file.keep().map_err(|err| backup_err(err.error))?;
    Ok(backup)
}
