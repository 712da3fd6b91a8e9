//! Command-line surface shared by the binaries

use crate::config::DEFAULT_MODEL_ID;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::process::ExitCode;

const EXAMPLES: &str = "\
Examples:
    # Download to default location
    tirex-setup-weights

    # Download to custom location
    tirex-setup-weights --cache-dir /path/to/weights

    # Create .env file
    tirex-setup-weights --env-file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tirex-setup-weights")]
#[command(about = "Setup TiRex weights for offline use", long_about = None)]
#[command(version)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Directory to store weights (default: ~/.cache/tirex/weights/)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<String>,

    /// HuggingFace model ID
    #[arg(long, value_name = "ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Create .env file with TIREX_WEIGHTS_PATH
    #[arg(long)]
    pub env_file: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Result of parsing the command line
#[derive(Debug)]
pub enum CliOutcome<C = Cli> {
    /// Proceed with the parsed arguments
    Run(C),
    /// Stop before doing anything and exit with `code`
    Exit {
        code: u8,
        message: String,
        to_stderr: bool,
    },
}

impl<C> CliOutcome<C> {
    /// Hand back the parsed arguments, or print the parser message and
    /// return the exit code to stop with
    pub fn into_parsed(self) -> Result<C, ExitCode> {
        match self {
            Self::Run(parsed) => Ok(parsed),
            Self::Exit {
                code,
                message,
                to_stderr,
            } => {
                if to_stderr {
                    eprintln!("{}", message.trim_end());
                } else {
                    println!("{}", message.trim_end());
                }
                Err(ExitCode::from(code))
            }
        }
    }
}

/// Parse arguments, mapping every parser exit onto the tool's exit codes
///
/// Help and version exit 0. Unknown options exit 1 with
/// `Unknown option: <flag>`; any other argument error exits 1 with the
/// parser's message.
pub fn parse_args<C, I, T>(args: I) -> CliOutcome<C>
where
    C: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let err = match C::try_parse_from(args) {
        Ok(cli) => return CliOutcome::Run(cli),
        Err(err) => err,
    };

    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => CliOutcome::Exit {
            code: 0,
            message: err.to_string(),
            to_stderr: false,
        },
        ErrorKind::UnknownArgument => {
            let flag = match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(flag)) => flag.clone(),
                _ => "<unknown>".to_string(),
            };
            CliOutcome::Exit {
                code: 1,
                message: format!("Unknown option: {}", flag),
                to_stderr: true,
            }
        }
        _ => CliOutcome::Exit {
            code: 1,
            message: err.to_string(),
            to_stderr: true,
        },
    }
}

/// Install the global tracing subscriber, writing to stderr
pub fn init_tracing(log_level: &str, format: LogFormat) {
    match format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(log_level)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(log_level)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
    }
}
