/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use super::Game;

/// Counts all positions reachable from `game` in exactly `depth` plies.
///
/// Descends with make/unmake rather than copying, so this also exercises the
/// exact-restoration guarantee of the move application code.
pub fn perft(game: &mut Game, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = game.get_legal_moves();

    // Counting the moves of the final ply is free.
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        let undo = game.make_move(mv);
        nodes += perft(game, depth - 1);
        game.unmake_move(mv, undo);
    }

    nodes
}

/// Like [`perft`], but prints the node count below each root move, then the
/// total. The standard tool for hunting move generation bugs.
pub fn splitperft(game: &mut Game, depth: usize) -> u64 {
    let now = Instant::now();
    let mut nodes = 0;

    for mv in game.get_legal_moves() {
        let undo = game.make_move(mv);
        let count = perft(game, depth.saturating_sub(1));
        game.unmake_move(mv, undo);

        println!("{mv}\t{count}");
        nodes += count;
    }

    let elapsed = now.elapsed();
    let nps = nodes as f64 / elapsed.as_secs_f64();
    println!("\n{nodes} nodes in {elapsed:?} ({nps:.0} nps)");

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perft_counts_startpos_shallow() {
        let mut game = Game::default();
        assert_eq!(perft(&mut game, 0), 1);
        assert_eq!(perft(&mut game, 1), 20);
        assert_eq!(perft(&mut game, 2), 400);
    }
}
