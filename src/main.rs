//! Persona Trader CLI
//!
//! Chat with a trading personality and paper-trade its proposals.

use clap::{Parser, Subcommand};
use persona_trader::agent::{GenerationOptions, OpenAiBackend};
use persona_trader::config::Endpoints;
use persona_trader::execution::{ActionPolicy, ExecutionAuditLog};
use persona_trader::market::{PriceSource, QuickNodePriceSource, UnavailablePriceSource, WhaleTracker};
use persona_trader::paper::PaperChain;
use persona_trader::tokens::TokenRegistry;
use persona_trader::{
    Config, DecisionEngine, MarketDataFeed, Outcome, Personality, Result, TradeExecutor,
    TradingSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "persona-trader")]
#[command(about = "Personality-driven trading agent for Fuel (paper mode)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively with a personality
    Chat {
        /// fomo, degen, diamond-hands or whale-watcher
        #[arg(short, long)]
        personality: Personality,

        /// Token to discuss
        #[arg(short, long, default_value = "FUEL")]
        token: String,

        /// Seed for the simulated responder and fallback market data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run one market analysis and print the decision as JSON
    Analyze {
        #[arg(short, long)]
        personality: Personality,

        #[arg(short, long, default_value = "FUEL")]
        token: String,

        /// Free-text command, e.g. "buy 0.05 FUEL"
        #[arg(long)]
        command: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let (config, config_dir) = match &cli.config {
        Some(path) => (
            Config::from_file(path)?,
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
        ),
        None => (Config::default(), PathBuf::from(".")),
    };

    match cli.command {
        Commands::Chat {
            personality,
            token,
            seed,
        } => {
            let session = build_session(&config, &config_dir, personality, &token, seed).await?;
            run_chat(session).await?;
        }
        Commands::Analyze {
            personality,
            token,
            command,
        } => {
            let mut session = build_session(&config, &config_dir, personality, &token, None).await?;
            let decision = session.analyze(command.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Config => {
            let endpoints = Endpoints::from_env(config.network);
            tracing::info!(
                network = config.network.name(),
                fuel_url = %endpoints.fuel_url,
                generative_backend = endpoints.has_generative_backend(),
                price_source = endpoints.price_url.is_some(),
                "Resolved endpoints"
            );
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn build_session(
    config: &Config,
    config_dir: &Path,
    personality: Personality,
    token: &str,
    seed: Option<u64>,
) -> Result<TradingSession> {
    let endpoints = Endpoints::from_env(config.network);
    let tokens = TokenRegistry::new(config.network);

    let source: Arc<dyn PriceSource> = match &endpoints.price_url {
        Some(url) => Arc::new(QuickNodePriceSource::new(url)?),
        None => Arc::new(UnavailablePriceSource),
    };
    let mut market = MarketDataFeed::new(source, config.network, config.market.clone());
    if let Some(seed) = seed {
        market = market.with_seed(seed);
    }
    let market = Arc::new(market);

    let chain = PaperChain::demo(&tokens).await;
    let policy = ActionPolicy::load_from_dir(config_dir, &config.policy).await?;
    let mut executor = TradeExecutor::new(
        Arc::new(chain.clone()),
        Arc::new(chain),
        tokens.clone(),
        market.clone(),
        config.trading.clone(),
    )
    .with_policy(policy);
    if let Some(path) = &config.audit_log_path {
        executor = executor.with_audit_log(ExecutionAuditLog::new(path));
    }

    let mut engine = DecisionEngine::new(personality, tokens)
        .with_options(GenerationOptions::from(&config.agent))
        .with_history_capacity(config.agent.history_capacity);
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }
    if let Some(backend) = OpenAiBackend::from_endpoints(&endpoints, &config.agent)? {
        tracing::info!(model = %config.agent.model, "Using generative backend");
        engine = engine.with_backend(Arc::new(backend));
    }
    if personality == Personality::WhaleWatcher {
        let whales = WhaleTracker::new();
        whales.spawn_simulation(Duration::from_secs(10), seed);
        engine = engine.with_whale_tracker(whales);
    }

    let mut session = TradingSession::new(engine, Arc::new(executor), market, token);
    session.set_symbol(token)?;
    tracing::info!(
        personality = %personality,
        network = config.network.name(),
        symbol = session.symbol(),
        "Session started"
    );
    Ok(session)
}

async fn run_chat(mut session: TradingSession) -> Result<()> {
    let mut notifications = session.executor().notifier().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{}", session.personality().introduction());
    println!("(type 'metrics' for performance, 'quit' to exit)");

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        match message {
            "" => continue,
            "quit" | "exit" => break,
            "metrics" => {
                println!("{}", serde_json::to_string_pretty(&session.metrics())?);
                continue;
            }
            _ => {}
        }

        let reply = session.chat(message).await;
        println!("{}", reply.response);

        let Some(pending) = session.pending() else {
            continue;
        };
        println!(
            "Execute {} {} {}? [y/N]",
            pending.action(),
            pending.amount(),
            pending.token().symbol
        );
        stdout.flush().await?;
        let answer = lines.next_line().await?.unwrap_or_default();
        if !answer.trim().eq_ignore_ascii_case("y") {
            session.decline();
            println!("Trade declined.");
            continue;
        }

        match session.confirm().await {
            Some(Outcome::Settled(details)) => println!("{}", details.summary()),
            Some(Outcome::Skipped(reason)) => println!("Nothing to execute: {}", reason),
            Some(Outcome::Cancelled) | Some(Outcome::Failed(_)) | None => {}
        }
        while let Ok(note) = notifications.try_recv() {
            println!("[{:?}] {}: {}", note.level, note.title, note.message);
        }
    }

    Ok(())
}
