//! Line-based text protocol for local play.
//!
//! Modeled on GTP: each line is an optional numeric id, a command, and its
//! arguments; each reply is `=` or `?`, the id, and a message, followed by a
//! blank line.
//!
//! ## Commands
//!
//! - `name`, `version`, `list_commands`, `known_command <cmd>`, `quit`
//! - `new [size]` - start a new game with freshly seeded reinforcements
//! - `place <coord> [ability]` - primary placement for the side to move
//! - `swap <a> <b>` - exchange two stones next to the pending swap stone
//! - `undo` - step back within the current turn
//! - `commit` - resolve the turn
//! - `genmove` - let the AI play a whole turn for the side to move
//! - `showboard` - print the board
//! - `save <id>`, `load <id>` - keep and restore states in memory
//!
//! Coordinates are a column letter and a 1-based row counted from the top,
//! so `A1` is the top-left corner.

use std::io::{self, BufRead, Write};

use crate::ai::{AiOptions, decide};
use crate::board::{Ability, Point};
use crate::config::GameConfig;
use crate::error::MoveError;
use crate::game::{GameState, Move, apply_move, apply_swap, commit_turn, new_game, play_turn, undo};
use crate::rng::entropy;
use crate::store::{GameStore, MemoryStore};

const KNOWN_COMMANDS: &[&str] = &[
    "commit",
    "genmove",
    "known_command",
    "list_commands",
    "load",
    "name",
    "new",
    "place",
    "quit",
    "save",
    "showboard",
    "swap",
    "undo",
    "version",
];

/// Parse `B3` style coordinates on a board of `size`.
pub fn parse_coord(text: &str, size: usize) -> Option<Point> {
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() {
        return None;
    }
    let col = (letter as u8 - b'A') as usize;
    let row = chars.as_str().parse::<usize>().ok()?.checked_sub(1)?;
    (row < size && col < size).then_some((row, col))
}

pub fn format_coord((r, c): Point) -> String {
    format!("{}{}", (b'A' + c as u8) as char, r + 1)
}

fn format_move(mv: &Move) -> String {
    let mut text = format_coord(mv.point);
    if let Some(a) = mv.ability {
        text.push(' ');
        text.push_str(&a.to_string());
    }
    if let Some(partner) = mv.swap_with {
        text.push(' ');
        text.push_str(&format_coord(partner));
    }
    text
}

fn outcome(state: &GameState) -> String {
    match state.winner {
        Some(w) if state.game_over => format!("game over: {w} wins"),
        _ => String::new(),
    }
}

pub struct Engine {
    config: GameConfig,
    state: GameState,
    store: MemoryStore,
    rng: fastrand::Rng,
}

impl Engine {
    pub fn new(config: GameConfig, mut rng: fastrand::Rng) -> Self {
        let state = new_game(&config, &mut rng);
        Self {
            config,
            state,
            store: MemoryStore::new(),
            rng,
        }
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::new(config, entropy())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Read commands from `input` and write replies to `output` until `quit`
    /// or end of input.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            // Skip blank lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Optional numeric id, echoed back in the reply
            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            // Execute and reply
            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            // Quit if requested
            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric command id off the front of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn coord(&self, text: &str) -> Result<Point, String> {
        parse_coord(text, self.state.board.size()).ok_or_else(|| format!("invalid coordinate {text}"))
    }

    fn update(&mut self, result: Result<GameState, MoveError>) -> (bool, String) {
        match result {
            Ok(next) => {
                self.state = next;
                (true, outcome(&self.state))
            }
            Err(e) => (false, e.to_string()),
        }
    }

    /// Execute one command and return (success, reply).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    (true, known.to_string())
                }
                None => (false, "missing argument".to_string()),
            },

            "quit" => (true, String::new()),

            "new" => {
                // Optional size overrides the engine config for this and later games
                let mut config = self.config.clone();
                if let Some(arg) = args.first() {
                    match arg.parse::<usize>() {
                        Ok(size) => config.board_size = size,
                        Err(_) => return (false, "invalid size".to_string()),
                    }
                }
                if let Err(e) = config.validate() {
                    return (false, e.to_string());
                }
                self.state = new_game(&config, &mut self.rng);
                self.config = config;
                (true, String::new())
            }

            "place" => {
                let Some(text) = args.first() else {
                    return (false, "missing arguments".to_string());
                };
                let point = match self.coord(text) {
                    Ok(p) => p,
                    Err(e) => return (false, e),
                };
                // Second argument names an ability
                let mv = match args.get(1).map(|a| a.parse::<Ability>()) {
                    None => Move::plain(point),
                    Some(Ok(ability)) => Move::with_ability(point, ability),
                    Some(Err(e)) => return (false, e.to_string()),
                };
                let result = apply_move(&self.state, &mv);
                self.update(result)
            }

            "swap" => {
                if args.len() < 2 {
                    return (false, "missing arguments".to_string());
                }
                let (a, b) = match (self.coord(args[0]), self.coord(args[1])) {
                    (Ok(a), Ok(b)) => (a, b),
                    (Err(e), _) | (_, Err(e)) => return (false, e),
                };
                let result = apply_swap(&self.state, a, b);
                self.update(result)
            }

            "undo" => {
                let result = undo(&self.state);
                self.update(result)
            }

            "commit" => {
                let result = commit_turn(&self.state, &mut self.rng);
                self.update(result)
            }

            "genmove" => {
                if self.state.game_over {
                    return (false, MoveError::GameOver.to_string());
                }
                if self.state.move_confirmed {
                    return (false, MoveError::AlreadyPlaced.to_string());
                }
                // The AI plays the whole turn, commit included
                let options = AiOptions::from(&self.config);
                let mv = decide(&self.state, options, &mut self.rng);
                // No move at all means a forced pass.
                let result = match &mv {
                    Some(mv) => play_turn(&self.state, mv, &mut self.rng),
                    None => commit_turn(&self.state, &mut self.rng),
                };
                let (ok, status) = self.update(result);
                if !ok {
                    return (false, status);
                }
                // Reply with the move, then the result if the game just ended
                let played = mv.as_ref().map_or_else(|| "pass".to_string(), format_move);
                if status.is_empty() {
                    (true, played)
                } else {
                    (true, format!("{played}\n{status}"))
                }
            }

            "showboard" => {
                // Board first, then whose turn it is
                let s = &self.state;
                let mut text = format!(
                    "\n{}turn {} ({} to move)",
                    s.board, s.turn_count, s.turn
                );
                let status = outcome(s);
                if !status.is_empty() {
                    text.push('\n');
                    text.push_str(&status);
                }
                (true, text)
            }

            "save" => {
                let Some(id) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match self.store.set(id, &self.state, None) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "load" => {
                let Some(id) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match self.store.get(id) {
                    Ok(Some(state)) => {
                        self.state = state;
                        (true, String::new())
                    }
                    Ok(None) => (false, format!("no saved game {id}")),
                    Err(e) => (false, e.to_string()),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Occupant, Side};

    fn engine() -> Engine {
        Engine::new(GameConfig::default(), fastrand::Rng::with_seed(7))
    }

    fn empty_cell(engine: &Engine) -> String {
        let p = engine.state().board.empty_points()[0];
        format_coord(p)
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = Engine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = Engine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_coords() {
        assert_eq!(parse_coord("A1", 5), Some((0, 0)));
        assert_eq!(parse_coord("c4", 5), Some((3, 2)));
        assert_eq!(parse_coord("F1", 5), None);
        assert_eq!(parse_coord("A0", 5), None);
        assert_eq!(parse_coord("A", 5), None);
        assert_eq!(format_coord((3, 2)), "C4");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();
        assert_eq!(engine.execute("known_command", &["place"]), (true, "true".to_string()));
        assert_eq!(engine.execute("known_command", &["komi"]), (true, "false".to_string()));
        assert!(!engine.execute("known_command", &[]).0);
    }

    #[test]
    fn test_place_commit_undo() {
        let mut engine = engine();
        let coord = empty_cell(&engine);
        assert!(engine.execute("place", &[&coord, "beam"]).0);
        assert!(!engine.execute("place", &[&coord]).0, "second placement rejected");
        assert!(engine.execute("undo", &[]).0);
        assert!(engine.execute("place", &[&coord, "b"]).0);
        assert!(engine.execute("commit", &[]).0);
        assert_eq!(engine.state().turn, Side::Defender);
        assert_eq!(engine.state().turn_count, 1);
    }

    #[test]
    fn test_place_rejects_bad_input() {
        let mut engine = engine();
        assert!(!engine.execute("place", &["Z9"]).0);
        assert!(!engine.execute("place", &["A1", "laser"]).0);
        assert!(!engine.execute("commit", &[]).0);
    }

    #[test]
    fn test_new_with_size() {
        let mut engine = engine();
        assert!(engine.execute("new", &["7"]).0);
        assert_eq!(engine.state().board.size(), 7);
        assert!(!engine.execute("new", &["12"]).0);
        assert_eq!(engine.state().board.size(), 7);
    }

    #[test]
    fn test_save_and_load() {
        let mut engine = engine();
        let before = engine.state().clone();
        assert!(engine.execute("save", &["start"]).0);
        assert!(engine.execute("genmove", &[]).0);
        assert_ne!(engine.state(), &before);
        assert!(engine.execute("load", &["start"]).0);
        assert_eq!(engine.state(), &before);
        assert!(!engine.execute("load", &["nope"]).0);
    }

    #[test]
    fn test_run_loop_replies() {
        let mut engine = engine();
        let input = b"1 name\nbogus\n2 quit\nname\n";
        let mut output = Vec::new();
        engine.run(&input[..], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("=1 resistance-go\n\n"));
        assert!(text.contains("? unknown command: bogus"));
        assert!(text.ends_with("=2 \n\n"), "stops at quit: {text:?}");
    }

    #[test]
    fn test_showboard_mentions_side() {
        let mut engine = engine();
        let (ok, text) = engine.execute("showboard", &[]);
        assert!(ok);
        assert!(text.contains("attacker to move"));
        assert!(engine.state().board.count(Occupant::Resistance) >= 1);
    }
}
