//! Privacy Backends - Launcher
//!
//! Builds the backend registry from environment configuration and drives it
//! from the command line.
//!
//! Run modes:
//!   cargo run                                          - Show usage
//!   cargo run -- status                                - Probe every backend
//!   cargo run -- quote <token> <amount>                - Quote on every available backend
//!   cargo run -- transfer <token> <amount> <recipient> - Run one transfer
//!   cargo run -- demo                                  - Walk through a mock transfer

use privacy_backends::common::logging::{init_from_config, log_system_event};
use privacy_backends::registry::{create_default_registry, BackendSelector};
use privacy_backends::types::{format_base_units, to_base_units};
use privacy_backends::{
    BackendRegistry, PrivacyConfig, ProbeOutcome, QuoteParams, SharedBackend, TokenInfo,
    TransferContext, TransferEvent, TransferParams,
};
use std::env;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let config = match PrivacyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_from_config(&config) {
        eprintln!("Warning: logging not initialized: {}", e);
    }

    let registry = match create_default_registry(&config).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to build registry [{}]: {}", e.error_code(), e);
            std::process::exit(1);
        }
    };

    match args[1].as_str() {
        "status" => run_status(&registry).await,
        "quote" => run_quote(&registry, &args[2..]).await,
        "transfer" => run_transfer(&registry, &config, &args[2..]).await,
        "demo" => run_demo(&registry, &config).await,
        "config" => config.print_summary(),
        "help" | "--help" | "-h" => print_usage(),
        _ => print_usage(),
    }
}

fn print_usage() {
    println!("Privacy Backends - Transfer Orchestration");
    println!();
    println!("Usage:");
    println!("  privacy-backends status                                   Probe every backend");
    println!("  privacy-backends quote <token> <amount>                   Quote on available backends");
    println!("  privacy-backends transfer <token> <amount> <recipient>    Run one transfer");
    println!("      [--backend <name>] [--sender <addr>] [--viewing-key <key>]");
    println!("  privacy-backends config                                   Print loaded configuration");
    println!("  privacy-backends demo                                     Walk through a mock transfer");
    println!();
    println!("Amounts are in display units (e.g. 1.5 SOL), tokens: SOL, USDC, USDT");
    println!();
    println!("Environment Variables:");
    println!("  PRIVACY_NETWORK            mainnet | testnet | devnet | localnet (default: devnet)");
    println!("  PRIVACY_DEFAULT_BACKEND    Default backend name");
    println!("  PRIVACY_BACKEND_PRIORITY   Comma-separated selection order");
    println!("  PRIVACY_PROBE_TIMEOUT_MS   Status probe timeout (default: 5000)");
    println!("  PRIVACY_EVENT_BUFFER       Transfer event channel capacity (default: 64)");
    println!("  PRIVACY_PHASE_DELAY_MS     Simulated phase delay (default: 500)");
    println!("  PRIVACY_MOCK_LATENCY_MS    Mock transfer latency (default: 1000)");
    println!("  PRIVACY_MOCK_FAILURE_RATE  Mock failure probability in [0, 1]");
    println!("  PRIVACY_MPC_ROUNDS         MPC computation rounds (default: 3)");
    println!("  PRIVACY_ENFORCE_QUOTE_EXPIRY  Reject expired quotes (default: true)");
    println!("  PRIVACY_LOG_LEVEL          trace | debug | info | warn | error");
}

/// Parse `<token> <amount>` from the front of `args`
fn parse_token_amount(args: &[String]) -> Option<(TokenInfo, u128)> {
    let token = TokenInfo::from_symbol(args.first()?)?;
    let amount = to_base_units(args.get(1)?, token.decimals)?;
    Some((token, amount))
}

/// Value following `flag`, if present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

async fn run_status(registry: &BackendRegistry) {
    println!("\n=== Backend Status ===\n");

    let default = registry.default_name().await;
    for (backend, outcome) in registry.get_statuses().await {
        let marker = if default.as_deref() == Some(backend.name()) { "*" } else { " " };
        let features = backend.features();
        match outcome {
            ProbeOutcome::Status(status) => println!(
                "{} {:<16} {:<11} {:>5} ms  model={} viewing_keys={}",
                marker,
                backend.name(),
                if status.available { "available" } else { "unavailable" },
                status.latency_ms,
                features.privacy_model,
                features.viewing_keys,
            ),
            ProbeOutcome::Error(e) => println!("{} {:<16} error: {}", marker, backend.name(), e),
            ProbeOutcome::TimedOut => println!("{} {:<16} timed out", marker, backend.name()),
            ProbeOutcome::Panicked => println!("{} {:<16} probe panicked", marker, backend.name()),
        }
    }
    println!();
}

async fn run_quote(registry: &BackendRegistry, args: &[String]) {
    let Some((token, amount)) = parse_token_amount(args) else {
        eprintln!("Usage: privacy-backends quote <token> <amount>");
        return;
    };

    println!(
        "\n=== Quotes for {} {} ===\n",
        format_base_units(amount, token.decimals),
        token.symbol
    );

    let params = QuoteParams::new(token.clone(), amount);
    for backend in registry.get_available().await {
        match backend.get_quote(&params).await {
            Ok(quote) => {
                println!(
                    "{:<16} out={} fee={} ({:.2}%) ~{}s",
                    backend.name(),
                    format_base_units(quote.output_amount, token.decimals),
                    format_base_units(quote.fee_amount, token.decimals),
                    quote.fee_percent,
                    quote.estimated_time_seconds,
                );
                for warning in &quote.warnings {
                    println!("{:<16}   warning: {}", "", warning);
                }
            }
            Err(e) => println!("{:<16} rejected: {}", backend.name(), e),
        }
    }
    println!();
}

/// Print events as they arrive until the sender side is dropped
fn spawn_event_printer(mut rx: mpsc::Receiver<TransferEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                TransferEvent::StatusChange { status, data, .. } => {
                    let message = data.message.as_deref().unwrap_or("");
                    match (data.mpc_round, data.total_rounds) {
                        (Some(round), Some(total)) => {
                            println!("  [{}] {} ({}/{})", status, message, round, total)
                        }
                        _ => println!("  [{}] {}", status, message),
                    }
                }
                TransferEvent::TxSubmitted { tx_hash, .. } => println!("  submitted {}", tx_hash),
                TransferEvent::TxConfirmed { tx_hash, .. } => println!("  confirmed {}", tx_hash),
                TransferEvent::ProofGenerated { kind, .. } => println!("  proof generated ({})", kind),
                TransferEvent::Error { error, .. } => println!("  error: {}", error),
            }
        }
    })
}

async fn pick_backend(
    registry: &BackendRegistry,
    config: &PrivacyConfig,
    requested: Option<&str>,
    require_viewing_keys: bool,
) -> Option<SharedBackend> {
    let picked = match requested {
        Some(name) => registry.get(name).await,
        None => {
            BackendSelector::from_config(config)
                .get_best_backend(registry, require_viewing_keys)
                .await
        }
    };
    match picked {
        Ok(backend) => Some(backend),
        Err(e) => {
            eprintln!("No backend: {}", e);
            None
        }
    }
}

async fn run_transfer(registry: &BackendRegistry, config: &PrivacyConfig, args: &[String]) {
    let (Some((token, amount)), Some(recipient)) = (parse_token_amount(args), args.get(2)) else {
        eprintln!("Usage: privacy-backends transfer <token> <amount> <recipient> [--backend <name>]");
        return;
    };
    let viewing_key = flag_value(args, "--viewing-key");
    let sender = flag_value(args, "--sender").unwrap_or("cli-sender");

    let Some(backend) =
        pick_backend(registry, config, flag_value(args, "--backend"), viewing_key.is_some()).await
    else {
        return;
    };

    println!("\n=== Transfer via {} ===\n", backend.name());

    let mut params = TransferParams::new(token, amount, sender, recipient.as_str());
    if let Some(key) = viewing_key {
        params = params.with_viewing_key(key);
    }

    match backend.get_quote(&params.quote_params()).await {
        Ok(quote) => params = params.with_quote(quote),
        Err(e) => {
            eprintln!("Quote rejected: {}", e);
            return;
        }
    }

    let (ctx, rx) = TransferContext::with_events(config.event_buffer);
    let printer = spawn_event_printer(rx);
    let result = backend.transfer(&params, &ctx).await;
    drop(ctx);
    printer.await.ok();

    println!();
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render result: {}", e),
    }
}

async fn run_demo(registry: &BackendRegistry, config: &PrivacyConfig) {
    println!("\n=== Privacy Backends Demo ===\n");
    println!("Network: {}", config.network);
    println!("Registered: {}", registry.names().await.join(", "));
    println!();

    run_status(registry).await;

    let amount = 250_000_000u128;
    println!("Quoting {} SOL on every available backend", format_base_units(amount, 9));
    run_quote(registry, &["SOL".to_string(), "0.25".to_string()]).await;

    let Some(backend) = pick_backend(registry, config, None, true).await else {
        return;
    };

    let params = TransferParams::new(TokenInfo::sol(), amount, "demo-sender", "demo-recipient")
        .with_viewing_key("demo-viewing-key");
    let (ctx, rx) = TransferContext::with_events(config.event_buffer);
    let printer = spawn_event_printer(rx);

    println!("Transferring through {} (viewing keys required)", backend.name());
    let result = backend.transfer(&params, &ctx).await;
    drop(ctx);
    printer.await.ok();

    log_system_event(
        "demo_complete",
        serde_json::json!({ "backend": backend.name(), "status": result.status.to_string() }),
        result.error.as_deref(),
    );

    if let Ok(payments) = backend.scan_payments("demo-viewing-key", None).await {
        println!("\nPayments visible to the viewing key: {}", payments.len());
    }

    println!("\n=== Demo Complete ===");
}
