use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use headsup_engine::blueprint::{BlueprintPolicy, StrategyFile};
use headsup_engine::display::{legal_actions_line, score_line, snapshot_line, styled_action};
use headsup_engine::session::{ApplyResult, Engine};
use headsup_engine::EngineConfig;

#[derive(Parser)]
#[command(name = "play", version, about = "Play heads-up against the engine from a terminal")]
struct Cli {
    /// Path to a trained blueprint strategy file; falls back to the
    /// heuristic-only pipeline if omitted or missing.
    #[arg(long)]
    blueprint: Option<PathBuf>,

    /// Seat the human sits in (0 = small blind, 1 = big blind).
    #[arg(long, default_value_t = 0)]
    seat: usize,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = EngineConfig::default().with_env_overrides();

    let mut engine = match &cli.blueprint {
        Some(path) => match StrategyFile::load(path) {
            Ok(file) => {
                println!("{} {}", "loaded blueprint:".green(), path.display());
                Engine::with_blueprint(config, BlueprintPolicy::from_strategy_file(&file))
            }
            Err(err) => {
                eprintln!(
                    "{} {err}, falling back to heuristic pipeline",
                    "could not load blueprint:".yellow()
                );
                Engine::new(config)
            }
        },
        None => Engine::new(config),
    };

    let (mut session_id, mut result) = engine.new_hand(cli.seat);
    let stdin = io::stdin();

    loop {
        print_result(&result);
        if let Some(terminal) = &result.terminal {
            println!(
                "{} human payoff: {:.1} bb",
                "hand over.".bold(),
                terminal.human_payoff
            );
            if let Some(score) = engine.score(session_id) {
                println!("{}", score_line(&score));
            }
            print!("{}", "another hand? [y/n] ".bold());
            io::stdout().flush().ok();
            let mut line = String::new();
            if stdin.read_line(&mut line).is_err() || !line.trim().eq_ignore_ascii_case("y") {
                break;
            }
            result = match engine.next_hand(session_id) {
                Ok(r) => r,
                Err(err) => {
                    eprintln!("{} {err}", "could not continue session:".red());
                    let (id, r) = engine.new_hand(cli.seat);
                    session_id = id;
                    r
                }
            };
            continue;
        }

        print!("{}", "your action index: ".bold());
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line).is_err() {
            break;
        }
        let Ok(index) = line.trim().parse::<usize>() else {
            println!("{}", "not a number".red());
            continue;
        };

        match engine.apply_human_action(session_id, index) {
            Ok(r) => result = r,
            Err(err) => println!("{} {err}", "rejected:".red()),
        }
    }

    let diag = engine.diag();
    println!(
        "{} prior hits/misses {}/{}, realtime hits/fallbacks {}/{}",
        "diagnostics:".dimmed(),
        diag.prior_hits,
        diag.prior_misses,
        diag.realtime_hits,
        diag.realtime_fallbacks,
    );
}

fn print_result(result: &ApplyResult) {
    for action in &result.bot_actions {
        println!("  bot: {}", styled_action(*action));
    }
    println!("{}", snapshot_line(&result.snapshot));
    if result.terminal.is_none() {
        println!("legal: {}", legal_actions_line(&result.snapshot.legal_actions));
    }
}
