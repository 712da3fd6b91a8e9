//! Report whether TiRex weights are reachable for offline use

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tirex_weights::WeightsDiagnostic;
use tirex_weights::cli::{LogFormat, init_tracing, parse_args};
use tirex_weights::config::{WEIGHTS_PATH_VAR, default_cache_dir};
use tirex_weights::offline::{is_offline_ready, prepare_weights_dir, weights_path_from_env};

#[derive(Parser, Debug)]
#[command(name = "tirex-check-weights")]
#[command(about = "Check whether TiRex weights are accessible", long_about = None)]
#[command(version)]
struct Args {
    /// Print the diagnostic as JSON
    #[arg(long)]
    json: bool,

    /// Create the default weights directory if it does not exist
    #[arg(long)]
    create_missing: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() -> ExitCode {
    let args = match parse_args::<Args, _, _>(std::env::args_os()).into_parsed() {
        Ok(args) => args,
        Err(code) => return code,
    };
    init_tracing(&args.log_level, args.log_format);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("✗ {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let default_dir = default_cache_dir();
    if args.create_missing {
        let dir = default_dir
            .as_deref()
            .context("Cannot create default weights directory: home directory unknown")?;
        prepare_weights_dir(dir, true)?;
    }

    let env_value = weights_path_from_env(std::env::var(WEIGHTS_PATH_VAR).ok());
    if let Some(path) = &env_value
        && !is_offline_ready(path)
    {
        tracing::warn!(
            path = ?path,
            "{} points at a missing path; run: tirex-setup-weights --cache-dir {}",
            WEIGHTS_PATH_VAR,
            path.display()
        );
    }
    let diagnostic = WeightsDiagnostic::collect(default_dir.as_deref(), env_value);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &diagnostic)
            .context("Failed to write diagnostic JSON")?;
        writeln!(out).context("Failed to write diagnostic JSON")?;
    } else {
        diagnostic
            .render(&mut out)
            .context("Failed to write diagnostic")?;
    }

    Ok(diagnostic.ready)
}
