mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use engagement_sim::config::EngineConfig;
use engagement_sim::engagement::{advance_views, GrowthPlan};
use engagement_sim::revenue::RevenueCalculator;
use engagement_sim::{format_count, format_currency, MediaKind};

#[derive(Parser)]
#[command(
    name = "engagement-sim",
    about = "Content engagement and monetization engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Simulate(SimulateArgs),
    Serve(ServeArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value = "none")]
    media: String,
    #[arg(long, default_value_t = 12)]
    steps: u32,
    #[arg(long)]
    monetized: bool,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            seed: 42,
            media: "none".to_string(),
            steps: 12,
            monetized: false,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/engine.toml")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or(Command::Simulate(SimulateArgs::default()));

    match command {
        Command::Simulate(args) => run_simulate(args),
        Command::Serve(args) => server::serve(args).await,
        Command::InitConfig(args) => run_init_config(args),
    }
}

// Deterministic preview of one post's growth plan: which stage a seed lands
// in, the sampled view timeline, the one-time dead-phase boost, and the
// revenue the finished trajectory would earn.
fn run_simulate(args: SimulateArgs) -> Result<(), String> {
    let media = MediaKind::from_str(&args.media)
        .ok_or_else(|| format!("invalid media type: {}", args.media))?;
    let steps = args.steps.max(1);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let plan = GrowthPlan::assign(&mut rng, 0);

    println!(
        "Stage {}: target {} views over {} hour(s)",
        plan.view_stage.label(),
        format_count(plan.target_views),
        plan.target_completed_in
    );

    let duration = plan.duration_ms();
    let mut views = 0u64;
    for step in 0..=steps {
        let now = duration * step as i64 / steps as i64;
        if let Some(advance) = advance_views(&plan, views, now, &mut rng) {
            views = advance.views;
        }
        let hours = now as f64 / 3_600_000.0;
        println!("  t+{:>5.1}h  {} views", hours, format_count(views));
    }

    // One tick past the duration applies the final boost.
    if let Some(advance) = advance_views(&plan, views, duration + 5_000, &mut rng) {
        views = advance.views;
        if advance.boost_applied {
            println!("  dead-phase boost -> {} views", format_count(views));
        }
    }

    let revenue = RevenueCalculator::new(EngineConfig::default().revenue);
    let earned = revenue.post_revenue(views, media, false, args.monetized);
    println!(
        "Final: {} views as {} -> revenue {}",
        format_count(views),
        media.label(),
        format_currency(earned)
    );
    if !args.monetized {
        println!("  (pass --monetized to preview earnings)");
    }

    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    let config = EngineConfig::default();
    config.write(&args.path)?;
    println!("Wrote default config to {}", args.path.display());
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
