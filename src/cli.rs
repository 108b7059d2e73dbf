/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::Parser;
use uci_parser::UciCommand;

use crate::Square;

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND> | <UCI COMMAND>")
)]
pub enum EngineCommand {
    /// Run a fixed search on a set of benchmark positions.
    Bench {
        /// Override the default benchmark depth.
        #[arg(short, long, required = false)]
        depth: Option<u8>,
    },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position.
    Eval,

    /// Quit the engine.
    Exit {
        /// If set, the engine will await any running search before exiting.
        #[arg(short, long, default_value = "false")]
        cleanup: bool,
    },

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Flip the side to move.
    Flip,

    /// Show all legal moves in the current position, or from a square.
    Moves { square: Option<Square> },

    /// Perform a perft on the current position at the supplied depth.
    Perft { depth: usize },

    /// Perform a split perft on the current position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Wrapper over UCI commands sent to the engine.
    #[command(skip)]
    Uci { cmd: UciCommand },
}

impl FromStr for EngineCommand {
    type Err = clap::Error;
    /// Attempts to parse an [`EngineCommand`], falling back to a
    /// [`UciCommand`] if that fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::try_parse_from(s.split_ascii_whitespace()) {
            Ok(cmd) => Ok(cmd),
            Err(e) => {
                if let Ok(cmd) = UciCommand::new(s) {
                    Ok(Self::Uci { cmd })
                } else {
                    Err(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_engine_commands() {
        assert!(matches!(
            "perft 3".parse::<EngineCommand>().unwrap(),
            EngineCommand::Perft { depth: 3 }
        ));

        assert!(matches!(
            "moves e2".parse::<EngineCommand>().unwrap(),
            EngineCommand::Moves { square: Some(Square::E2) }
        ));

        assert!(matches!(
            "d".parse::<EngineCommand>().unwrap(),
            EngineCommand::Display
        ));
    }

    #[test]
    fn test_unknown_input_falls_back_to_uci() {
        assert!(matches!(
            "isready".parse::<EngineCommand>().unwrap(),
            EngineCommand::Uci { .. }
        ));
    }
}
