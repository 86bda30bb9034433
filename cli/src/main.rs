//! creditline: entry point for running an income verification flow.

mod config;

use config::AppConfig;

use creditline_chain::VerifierGateway;
use creditline_dispatch::RedirectDispatcher;
use creditline_flow::{FlowEngine, FlowEvent, PollOutcome};
use creditline_types::{ChainAddress, Provider};
use creditline_webproof::{BuilderConfig, RequestBuilder, VouchClient};

use clap::Parser;

#[derive(Parser)]
#[command(name = "creditline", about = "Web-Proof income verification flow")]
struct Cli {
    /// Customer/tenant id issued by the Web Proof provider.
    #[arg(long, env = "CREDITLINE_CUSTOMER_ID")]
    customer_id: Option<String>,

    /// The application's own base URL (https enables webhook delivery).
    #[arg(long, env = "CREDITLINE_APP_URL")]
    app_url: Option<String>,

    /// Submission gateway URL.
    #[arg(long, env = "CREDITLINE_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "CREDITLINE_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run a verification flow end to end.
    Verify {
        /// Provider to verify with: "binance" or "wise".
        #[arg(long)]
        provider: String,

        /// Currency code for balance proofs (Binance only).
        #[arg(long, default_value = "USDT")]
        currency: String,

        /// Wallet address the income commitment is recorded for.
        #[arg(long)]
        wallet: String,
    },
    /// Print the effective configuration as TOML.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", &cli.log_level);
    }
    creditline_utils::init_tracing();

    let mut config = match cli.config.as_deref() {
        Some(path) => {
            let cfg = AppConfig::from_toml_file(path)?;
            tracing::info!("loaded config from {path}");
            cfg
        }
        None => AppConfig::default(),
    };

    if let Some(customer_id) = cli.customer_id {
        config.customer_id = customer_id;
    }
    if let Some(app_url) = cli.app_url {
        config.app_url = app_url;
    }
    if let Some(gateway_url) = cli.gateway_url {
        config.network.gateway_url = gateway_url;
    }

    match cli.command {
        Command::PrintConfig => {
            println!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Verify {
            provider,
            currency,
            wallet,
        } => cmd_verify(config, &provider, &currency, &wallet).await,
    }
}

async fn cmd_verify(
    config: AppConfig,
    provider: &str,
    currency: &str,
    wallet: &str,
) -> anyhow::Result<()> {
    let provider = Provider::from_tag(provider)
        .ok_or_else(|| anyhow::anyhow!("unknown provider {provider:?} (binance or wise)"))?;
    let wallet = ChainAddress::parse(wallet)?;

    let mut builder_config = BuilderConfig::new(&config.customer_id, &config.app_url);
    if let Some(start_url) = &config.start_url {
        builder_config.start_url = start_url.clone();
    }

    let source = match &config.proof_api_base {
        Some(base) => VouchClient::with_base_url(base),
        None => VouchClient::new(),
    };
    let gateway = VerifierGateway::new(&config.network)?;

    let mut engine = FlowEngine::new(
        RequestBuilder::new(builder_config),
        RedirectDispatcher::system_only(),
        source,
        gateway,
        config.params.clone(),
    );

    // Ctrl-C cancels cooperatively: the flag is honored at the next poll
    // boundary, never mid-lookup.
    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("cancellation requested, stopping at the next poll boundary");
            cancel.cancel();
        }
    });

    let currency = provider.requires_currency().then_some(currency);
    engine.start(provider, currency)?;
    report_events(&mut engine, &config);

    if let Some(url) = engine.verification_url() {
        println!("Complete the verification in your browser:\n  {url}\n");
    }

    let mut outcome = engine.poll().await?;
    loop {
        report_events(&mut engine, &config);
        match outcome {
            PollOutcome::Proof(_) => break,
            PollOutcome::TimedOut => {
                if prompt_keep_waiting().await? {
                    outcome = engine.resume_polling().await?;
                } else {
                    engine.abandon()?;
                    report_events(&mut engine, &config);
                    println!("Verification abandoned.");
                    return Ok(());
                }
            }
            PollOutcome::Cancelled => {
                println!("Verification cancelled.");
                return Ok(());
            }
        }
    }

    let receipt = engine.complete(&wallet).await?;
    report_events(&mut engine, &config);

    println!(
        "Income verified on {}:\n  {}",
        config.network.chain_name,
        config.network.tx_url(&receipt.transaction_hash)
    );
    Ok(())
}

/// Ask the user whether to keep waiting after the poll budget ran out.
async fn prompt_keep_waiting() -> anyhow::Result<bool> {
    println!(
        "The verification is taking longer than expected. Keep waiting? [y/N] "
    );
    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Render drained flow events to the log.
fn report_events<S, G>(engine: &mut FlowEngine<S, G>, config: &AppConfig)
where
    S: creditline_webproof::ProofSource,
    G: creditline_chain::ChainGateway + Sync,
{
    for event in engine.drain_events() {
        match event {
            FlowEvent::RequestCreated { id, provider } => {
                tracing::info!(%id, %provider, "verification request created");
            }
            FlowEvent::RedirectLaunched { id, strategy } => {
                tracing::info!(%id, strategy, "redirect launched");
            }
            FlowEvent::PollingStarted { id } => {
                tracing::info!(%id, "polling for proof");
            }
            FlowEvent::ProofReceived { id } => {
                tracing::info!(%id, "proof received");
            }
            FlowEvent::TimedOut { id, attempts } => {
                tracing::warn!(%id, attempts, "polling timed out");
            }
            FlowEvent::PollingResumed { id } => {
                tracing::info!(%id, "polling resumed");
            }
            FlowEvent::Cancelled { id } => {
                tracing::info!(%id, "request cancelled");
            }
            FlowEvent::Submitted { id, tx_hash } => {
                tracing::info!(%id, %tx_hash, "commitment submitted");
            }
            FlowEvent::Confirmed { id, tx_hash } => {
                tracing::info!(%id, tx_url = %config.network.tx_url(&tx_hash), "transaction confirmed");
            }
            FlowEvent::Failed { id, reason } => {
                tracing::error!(%id, %reason, "submission failed");
            }
        }
    }
}
