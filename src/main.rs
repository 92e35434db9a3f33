use clap::Parser;
use core::error::Error;
use gymkhana::{
    config::Config,
    gym::{Gym, Progress},
    random::{default_rng, WyRng},
    store::FileStore,
    track::TrackVariant,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "gymkhana",
    version,
    about = "Evolve neural network drivers on checkpoint tracks"
)]
struct Cli {
    /// JSON config file; defaults fill anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many generations, overriding the config's epoch limit
    #[arg(short, long)]
    generations: Option<u32>,

    /// Generations per training batch; progress is logged between batches
    #[arg(short, long, default_value_t = 10)]
    batch: u32,

    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory to resume from and persist the best network to
    #[arg(long)]
    store: Option<PathBuf>,

    /// Track to race on: circle, sine, park or tiles
    #[arg(short, long)]
    track: Option<String>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(generations) = cli.generations {
        config.gym.epoch_limit = generations;
    }
    if let Some(name) = &cli.track {
        config.track.variant =
            TrackVariant::named(name).ok_or_else(|| format!("unknown track {name:?}"))?;
    }

    if cli.dump_config {
        println!("{}", config.to_string()?);
        return Ok(());
    }

    let rng = cli.seed.map(WyRng::seeded).unwrap_or_else(default_rng);
    let mut gym = match cli.store {
        Some(dir) => Gym::resume(config, rng, Box::new(FileStore::new(dir))),
        None => Gym::new(config, rng),
    };

    while gym.train_batch(cli.batch.max(1)) == Progress::Training {
        info!(
            "generation {}: best {:.2}, epsilon {:.3}",
            gym.epoch(),
            gym.best_score_ever(),
            gym.epsilon()
        );
    }

    // one full replay; the showcase race stops at showcase_steps at the latest
    while gym.showcase().is_some() && gym.showcase_best().is_none() {
        gym.step_showcase();
    }
    if let Some(fitness) = gym.showcase_best() {
        println!(
            "trained {} generations, best fitness {:.2}, showcase best {:.2}",
            gym.epoch(),
            gym.best_score_ever(),
            fitness
        );
    }

    Ok(())
}
