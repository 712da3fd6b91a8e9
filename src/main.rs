//! TiRex weights setup - Main entry point

use anyhow::Result;
use std::process::ExitCode;
use tirex_weights::cli::{Cli, init_tracing, parse_args};
use tirex_weights::{HfHubClient, RegistrySettings, SetupConfig, run_setup};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args::<Cli, _, _>(std::env::args_os()).into_parsed() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    init_tracing(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let home = dirs::home_dir();
    let config = SetupConfig::resolve(
        cli.cache_dir.as_deref(),
        Some(cli.model_id.as_str()),
        cli.env_file,
        home.as_deref(),
    )?
    .with_registry(RegistrySettings::from_env());

    tracing::info!(
        model_id = %config.model_id,
        cache_dir = ?config.cache_dir,
        create_env_file = config.create_env_file,
        endpoint = ?config.registry.endpoint,
        "Configuration loaded"
    );

    let client = HfHubClient::new(config.registry.clone());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    run_setup(&config, &client, &mut out).await.map_err(|e| {
        let step = e.step();
        anyhow::Error::new(e).context(format!("setup failed at {} step", step))
    })?;

    Ok(())
}
