use anyhow::Context;
use clap::Parser;
use screen_reader::cli::{Cli, Command, ReadArgs};
use screen_reader::config::{Config, EngineConfig, ServerConfig};
use screen_reader::{server, CaptureResult, ScreenReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `read` can print JSON on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.global.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from(&cli.global);
    let engines = EngineConfig::from(&cli.global);

    match cli.command {
        Command::Serve(args) => {
            let server_config = ServerConfig::from(&args);
            tracing::info!("Starting screen-reader v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}:{}", server_config.host, server_config.port);
            server::run(server_config, config, engines).await
        }
        Command::Read(args) => {
            let compact = args.compact;
            let result = tokio::task::spawn_blocking(move || read_once(&config, &engines, &args))
                .await
                .context("Read task panicked")??;

            let json = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{}", json);
            Ok(())
        }
    }
}

fn read_once(
    config: &Config,
    engines: &EngineConfig,
    args: &ReadArgs,
) -> anyhow::Result<CaptureResult> {
    let reader = ScreenReader::with_engines(engines, config);

    let result = match &args.file {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
            reader.read_upload(&bytes)?
        }
        None => reader.read_screen(args.region)?,
    };

    Ok(result)
}
