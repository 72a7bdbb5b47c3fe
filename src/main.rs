//! cat-pairs - find the pairs of cat pictures from your terminal.
//!
//! This is the binary entry point. Game logic lives in the library.

mod terminal;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use cat_pairs::core::logging;
use cat_pairs::{CatApiClient, GameConfig, GameController, Result};

use terminal::Viewport;

/// cat-pairs - a memory game with cats
#[derive(Parser, Debug)]
#[command(name = "cat-pairs")]
#[command(about = "Turn over cards two at a time and find every pair of cats", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH", default_value = "cat-pairs.toml")]
    config: PathBuf,

    /// Number of pairs to deal
    #[arg(long, value_name = "N")]
    pairs: Option<usize>,

    /// Shuffle seed, for reproducible deals
    #[arg(long, value_name = "S")]
    seed: Option<u64>,

    /// Width of the area the grid is sized for
    #[arg(long, value_name = "W", default_value_t = 360.0)]
    width: f32,

    /// Height of the area the grid is sized for
    #[arg(long, value_name = "H", default_value_t = 640.0)]
    height: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init()?;

    let mut config = GameConfig::load(&args.config)?.with_env_overrides();
    if let Some(pairs) = args.pairs {
        config = config.with_pair_count(pairs);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;

    let viewport = Viewport {
        width: args.width,
        height: args.height,
        spacing: config.card_spacing,
    };
    let win_reveal_delay = config.win_reveal_delay();

    let source = CatApiClient::new(&config.image_source)?;
    info!("Fetching images from {}", source.endpoint());
    let game = GameController::spawn(source, config);

    let result = terminal::run(&game, viewport, win_reveal_delay).await;
    // Already stopped is fine.
    let _ = game.shutdown().await;
    result
}
