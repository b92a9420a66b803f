use clap::Parser;
use goodns::cli::Cli;
use goodns::logging::initialize_logging;
use goodns::runner::Runner;
use goodns::suggest::SuggestionClient;
use goodns::tlds::{fetch_supported, TldSet, SUPPORTED_DOMAINS_URL};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logging(&cli.log_level);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let opt = cli.to_options();

    let supported = if cli.offline {
        info!("using built-in supported domains");
        TldSet::builtin()
    } else {
        let bootstrap = SuggestionClient::new(opt.timeout)?;
        fetch_supported(bootstrap.http(), SUPPORTED_DOMAINS_URL).await
    };
    if opt.tlds.is_empty() {
        info!(count = supported.len(), "scanning all supported TLDs");
    }

    let runner = Runner::new(opt, &supported)?;
    let outcome = runner.run().await?;
    Ok(outcome.exit_code())
}
