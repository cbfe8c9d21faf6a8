use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use headsup_engine::trainer::{train, TrainerConfig};
use headsup_engine::EngineConfig;

#[derive(Parser)]
#[command(name = "train", version, about = "Train the DCFR blueprint strategy")]
struct Cli {
    /// Number of training iterations.
    #[arg(long, default_value_t = 20_000)]
    iterations: u64,

    /// RNG seed for reproducible runs.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Checkpoint/evaluate every N iterations.
    #[arg(long, default_value_t = 500)]
    checkpoint_every: u64,

    /// Minimum iterations before plateau-based early stopping kicks in.
    #[arg(long, default_value_t = 2_000)]
    min_iters_before_stop: u64,

    /// Hands per opponent profile at each evaluation checkpoint.
    #[arg(long, default_value_t = 200)]
    eval_hands_per_profile: u32,

    /// Where to write the resulting strategy file.
    #[arg(long, default_value = "blueprint.json")]
    out: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = EngineConfig::default().with_env_overrides();
    let trainer_config = TrainerConfig {
        target_iterations: cli.iterations,
        seed: cli.seed,
        checkpoint_every: cli.checkpoint_every,
        min_iters_before_stop: cli.min_iters_before_stop,
        eval_hands_per_profile: cli.eval_hands_per_profile,
    };

    let outcome = train(&config, &trainer_config);
    match outcome.strategy_file.save(&cli.out) {
        Ok(()) => println!(
            "{} {} infosets, stopped: {} -> {}",
            "wrote blueprint:".green().bold(),
            outcome.strategy_file.policy.len(),
            outcome.stopping_reason,
            cli.out.display()
        ),
        Err(err) => eprintln!("{} {err}", "failed to write blueprint:".red().bold()),
    }
}
