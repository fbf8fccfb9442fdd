use std::path::PathBuf;

use clap::Parser;

use cotacao_relay::config::load_or_default;
use cotacao_relay::config::validation::validate_config;
use cotacao_relay::observability::logging;
use cotacao_relay::Requester;

#[derive(Parser)]
#[command(name = "cotacao-client")]
#[command(about = "Fetch the USD/BRL bid from the relay and save it to a file", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay endpoint, overriding `client.server_url`.
    #[arg(short, long)]
    url: Option<String>,

    /// Output file, overriding `client.output_path`.
    #[arg(short, long)]
    output: Option<String>,

    /// End-to-end budget in milliseconds, overriding `timeouts.request_ms`.
    #[arg(short, long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    if let Some(url) = cli.url {
        config.client.server_url = url;
    }
    if let Some(output) = cli.output {
        config.client.output_path = output;
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeouts.request_ms = ms;
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init_logging(&format!("cotacao_relay={}", config.observability.log_level));

    let requester = Requester::new(&config)?;
    match requester.fetch_and_store().await {
        Ok(bid) => {
            println!("Cotação do Dólar: {}", bid);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
