use clap::{Parser, Subcommand};
use points_tracker::{
    analytics::{format_compact, project_tokens, time_remaining, MetricsCalculator},
    api::{self, AppState},
    client::{HttpBackend, RequestCoordinator, SearchOutcome, SkipReason},
    config::{SeasonSettings, Settings},
    models::{SnapshotSubmission, WalletStats},
    price::{CoinGeckoSource, PriceService},
    store::SqliteSnapshotStore,
    verification::WalletAddress,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "points-tracker")]
#[clap(about = "Track wallet points standing and projected airdrop value", long_about = None)]
struct Cli {
    /// Settings file layered over the defaults
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the tracking API server
    Serve {
        /// Port to listen on (overrides configuration)
        #[clap(short, long)]
        port: Option<u16>,
    },

    /// Load a wallet from the server and print its dashboard
    Track {
        /// Wallet address (0x + 40 hex characters)
        address: String,

        /// Tokens per 1M points for the projection
        #[clap(long)]
        conversion_rate: Option<f64>,
    },

    /// Submit a points snapshot for a wallet
    Store {
        /// Wallet address
        address: String,

        #[clap(long)]
        total_points: f64,

        #[clap(long)]
        rank: Option<u64>,

        #[clap(long)]
        total_wallets: Option<u64>,

        /// Percentile label, e.g. "Top 1.5%"
        #[clap(long)]
        percentile: Option<String>,

        #[clap(long)]
        total_points_pool: Option<f64>,
    },

    /// Fetch the current token price from the configured provider
    Price,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, loaded) = match &cli.config {
        Some(path) => (Settings::from_file(path)?, true),
        None => match Settings::new() {
            Ok(settings) => (settings, true),
            Err(_) => (Settings::default(), false),
        },
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !loaded {
        info!("Using default settings");
    }

    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    match cli.command {
        Commands::Serve { port } => {
            let mut settings = settings;
            if let Some(port) = port {
                settings.api.port = port;
            }

            let store = SqliteSnapshotStore::connect(&settings.database).await?;
            let source = CoinGeckoSource::new(&settings.price)?;
            let prices = PriceService::new(
                Arc::new(source),
                &settings.price,
                settings.calculation.fallback_token_price,
            );

            info!("Starting {} v{}", settings.app.name, settings.app.version);
            let state = Arc::new(AppState::new(settings, Arc::new(store), prices));
            api::serve(state).await?;
        }

        Commands::Track { address, conversion_rate } => {
            let backend = HttpBackend::new(&settings.client)?;
            let calculator = MetricsCalculator::new(settings.calculation.clone());
            let mut coordinator = RequestCoordinator::new(
                backend,
                calculator,
                Duration::from_secs(settings.client.min_refresh_seconds),
            );

            match coordinator.search(&address).await? {
                SearchOutcome::Loaded { stats, history } => {
                    let rate = conversion_rate.unwrap_or(settings.season.default_conversion_rate);
                    print_dashboard(&stats, history.len(), &settings.season, rate);
                }
                SearchOutcome::NoData => {
                    println!("No data found for this wallet yet. Submit a snapshot to start tracking.");
                }
                SearchOutcome::Skipped(SkipReason::RateLimited { retry_in }) => {
                    warn!("Rate limited, retry in {}s", retry_in.as_secs());
                }
                SearchOutcome::Skipped(SkipReason::Duplicate) => {
                    info!("Wallet was refreshed moments ago");
                }
            }
        }

        Commands::Store {
            address,
            total_points,
            rank,
            total_wallets,
            percentile,
            total_points_pool,
        } => {
            let wallet = WalletAddress::parse(&address)?;
            let backend = HttpBackend::new(&settings.client)?;
            let submission = SnapshotSubmission {
                total_points: Some(total_points),
                rank: rank.map(|r| r as f64),
                total_wallets: total_wallets.map(|w| w as f64),
                percentile,
                total_points_pool,
            };

            let response = backend.store_snapshot(&wallet, &submission).await?;
            for snapshot in response.data {
                println!(
                    "Stored {} points for {} at {}",
                    snapshot.total_points, snapshot.wallet_address, snapshot.created_at
                );
            }
        }

        Commands::Price => {
            let source = CoinGeckoSource::new(&settings.price)?;
            let prices = PriceService::new(
                Arc::new(source),
                &settings.price,
                settings.calculation.fallback_token_price,
            );

            let quote = prices.current_quote().await;
            println!("Token price: ${:.4} ({:+.2}% 24h, source: {})", quote.price, quote.change_24h, quote.source);
        }
    }

    Ok(())
}

fn print_dashboard(stats: &WalletStats, history_len: usize, season: &SeasonSettings, conversion_rate: f64) {
    let m = &stats.metrics;

    println!("\n=== Wallet {} ===", stats.wallet_address);
    println!("Last updated: {} ({} snapshots in window)", stats.last_updated, history_len);
    println!("\nStanding:");
    println!("  Total points:  {:>18}  {} ({})", stats.total_points, m.points_change, m.points_growth);
    println!("  Rank:          {:>18}  {} {}", stats.rank, m.rank_change.direction.arrow(), m.rank_change.value);
    println!(
        "  Percentile:    {:>18}  {} {}",
        stats.percentile,
        m.percentile_change.direction.arrow(),
        m.percentile_change.value
    );
    println!("  Total wallets: {:>18}  {}", stats.total_wallets, m.total_wallets_change);
    println!("  Points pool:   {:>18}  {}", stats.total_points_pool, m.total_points_pool_change);
    println!("  Global avg:    {:>18}", format_compact(stats.global_average));

    println!("\nPool share: {} ({})", m.pool_share, m.pool_share_change);
    println!("{}", m.pace_status.message());

    let price_label = match m.token_price {
        Some(price) => format!("${:.4}", price),
        None => format!("${:.4} fallback", m.effective_price),
    };
    println!("\nAirdrop estimates at {}:", price_label);
    for estimate in m.airdrop_estimates.iter() {
        println!("  {:>5} supply: {}", estimate.scenario, estimate.value);
    }

    let projection = project_tokens(stats.total_points_raw, conversion_rate, m.token_price, season);
    print!(
        "\nProjection: {} tokens at {} per 1M points",
        format_compact(projection.tokens),
        projection.conversion_rate
    );
    match projection.dollar_value {
        Some(value) => println!(" (~${})", format_compact(value)),
        None => println!(),
    }

    let remaining = time_remaining(season.ends_at, Utc::now());
    if remaining.is_over() {
        println!("{} has ended", season.name);
    } else {
        println!(
            "{} ends in {}d {}h {}m {}s",
            season.name, remaining.days, remaining.hours, remaining.minutes, remaining.seconds
        );
    }
}
