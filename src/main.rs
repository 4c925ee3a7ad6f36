//! Resistance Go command line.
//!
//! ## Usage
//!
//! - `resistance-go play` - Text protocol on stdin/stdout
//! - `resistance-go selfplay` - AI plays both sides and prints each turn

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use resistance_go::ai::{AiOptions, decide};
use resistance_go::config::{Difficulty, GameConfig};
use resistance_go::game::{commit_turn, new_game, play_turn};
use resistance_go::protocol::{Engine, format_coord};

/// Resistance Go: rules engine and AI opponent
#[derive(Parser)]
#[command(name = "resistance-go")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    game: GameArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GameArgs {
    /// JSON config file; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Board size
    #[arg(long, global = true)]
    size: Option<usize>,

    /// AI strength
    #[arg(long, value_enum, global = true)]
    difficulty: Option<Difficulty>,

    /// Attacker turns the resistance must survive
    #[arg(long, global = true)]
    turn_limit: Option<u32>,

    /// Seed for reproducible games
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play through the text protocol on stdin/stdout
    Play,
    /// Let the AI play both sides
    Selfplay {
        /// Stop after this many turns
        #[arg(long, default_value_t = 60)]
        max_turns: u32,
    },
}

impl GameArgs {
    fn config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GameConfig::default(),
        };
        if let Some(size) = self.size {
            config.board_size = size;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if self.turn_limit.is_some() {
            config.turn_limit = self.turn_limit;
        }
        config.validate()?;
        Ok(config)
    }

    fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.game.config()?;
    let rng = cli.game.rng();

    match cli.command {
        Some(Commands::Play) | None => {
            let mut engine = Engine::new(config, rng);
            engine.run(io::stdin().lock(), io::stdout())?;
        }
        Some(Commands::Selfplay { max_turns }) => selfplay(&config, rng, max_turns),
    }
    Ok(())
}

fn selfplay(config: &GameConfig, mut rng: fastrand::Rng, max_turns: u32) {
    let options = AiOptions::from(config);
    let mut state = new_game(config, &mut rng);
    println!("{}", state.board);

    while !state.game_over && state.turn_count < max_turns {
        let side = state.turn;
        let next = match decide(&state, options, &mut rng) {
            Some(mv) => play_turn(&state, &mv, &mut rng).map(|s| (format_coord(mv.point), mv.ability, s)),
            None => commit_turn(&state, &mut rng).map(|s| ("pass".to_string(), None, s)),
        };
        match next {
            Ok((at, ability, s)) => {
                let tag = ability.map(|a| format!(" {a}")).unwrap_or_default();
                println!("turn {}: {side} {at}{tag}", state.turn_count);
                println!("{}", s.board);
                state = s;
            }
            Err(e) => {
                println!("turn {}: {side} stuck: {e}", state.turn_count);
                break;
            }
        }
    }

    let result = match state.winner {
        Some(w) => format!("{w} wins"),
        None => "no result".to_string(),
    };
    info!("{result} after {} turns", state.turn_count);
    println!("{result}");
}
