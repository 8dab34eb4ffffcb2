use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nightfall::app::{Autopilot, GameApp, TICK_DT};
use nightfall::config::GameConfig;
use nightfall::events::LogPresenter;
use nightfall::logging;

/// Headless night-forest arena driven by a scripted player
#[derive(Parser)]
#[command(name = "nightfall", author, version, about, long_about = None)]
struct Args {
    /// World seed. Same seed, same run.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Simulated seconds to run before stopping
    #[arg(long, default_value_t = 60.0)]
    seconds: f64,

    /// Tick length in seconds
    #[arg(long, default_value_t = TICK_DT)]
    dt: f32,

    /// JSON tuning file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    anyhow::ensure!(args.dt > 0.0, "--dt must be positive, got {}", args.dt);

    log::info!("seed {}, running {:.1}s at dt {:.4}", args.seed, args.seconds, args.dt);
    let mut app = GameApp::new(config, args.seed).with_autopilot(Autopilot::default());
    let summary = app.run(args.dt, args.seconds, &mut LogPresenter);

    log::info!(
        "{} ticks, {:.1}s: {} kills, score {}, health {}{}",
        summary.ticks,
        summary.elapsed,
        summary.kills,
        summary.score,
        summary.player_health,
        if summary.game_over { " (defeated)" } else { "" },
    );
    Ok(())
}
