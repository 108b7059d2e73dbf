/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref, str::FromStr};

use anyhow::Result;

use super::{
    bishop_attacks, bishop_rays, king_attacks, knight_attacks, pawn_attacks, pawn_pushes,
    ray_between, ray_containing, rook_attacks, rook_rays, Bitboard, Color, Move, MoveKind,
    MoveList, MoveUndo, Position, Rank, Square,
};

/// The state a game can be in, as far as the rules are concerned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    /// The side to move has at least one legal move.
    Ongoing,

    /// The side to move has no legal moves and is in check.
    Checkmate,

    /// The side to move has no legal moves and is not in check.
    Stalemate,

    /// Fifty moves have passed without a capture or pawn move.
    DrawByFiftyMoves,
}

impl GameState {
    /// Returns `true` if the game is over in a drawn state.
    #[inline(always)]
    pub const fn is_draw(&self) -> bool {
        matches!(self, Self::Stalemate | Self::DrawByFiftyMoves)
    }
}

/// A playable chess game: a [`Position`] plus the legality metadata needed to
/// generate moves — checkers, the check/pin masks, and both attack maps.
///
/// The metadata is recomputed from scratch after every make/unmake. The
/// full-board rescan is what makes double checks delivered by a single move
/// (such as a capturing promotion next to the enemy King that also uncovers a
/// slider) impossible to miss.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Game {
    /// The underlying position.
    position: Position,

    /// Squares whose pieces give check to the side-to-move's King.
    checkers: Bitboard,

    /// The squares a non-King piece may move to.
    ///
    /// When not in check this is everything not occupied by a friendly piece.
    /// With a single checker it shrinks to the checker and the ray between
    /// checker and King, since the check must be captured or blocked.
    checkmask: Bitboard,

    /// Friendly pieces that are the sole blocker between the King and an
    /// enemy slider. They may only move along the pin line.
    pinned: Bitboard,

    /// All squares attacked by each color.
    attacks_by_color: [Bitboard; Color::COUNT],

    /// Cached location of the side-to-move's King.
    king_square: Square,
}

impl Game {
    /// Creates a new [`Game`] from the provided [`Position`].
    #[inline(always)]
    pub fn new(position: Position) -> Self {
        let mut game = Self {
            position,
            checkers: Bitboard::EMPTY_BOARD,
            checkmask: Bitboard::EMPTY_BOARD,
            pinned: Bitboard::EMPTY_BOARD,
            attacks_by_color: [Bitboard::EMPTY_BOARD; Color::COUNT],
            king_square: Square::default(),
        };

        game.recompute_legal_masks();
        game
    }

    /// Creates a new [`Game`] from a FEN string.
    #[inline(always)]
    pub fn from_fen(fen: &str) -> Result<Self> {
        Ok(Self::new(Position::from_fen(fen)?))
    }

    /// Fetches the internal [`Position`].
    #[inline(always)]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub const fn is_in_check(&self) -> bool {
        self.checkers.population() > 0
    }

    /// Returns `true` if the side to move is checked by two or more pieces.
    #[inline(always)]
    pub const fn is_in_double_check(&self) -> bool {
        self.checkers.population() > 1
    }

    /// Squares whose pieces are checking the side-to-move's King.
    #[inline(always)]
    pub const fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// All squares occupied by pinned friendly pieces.
    #[inline(always)]
    pub const fn pinned(&self) -> Bitboard {
        self.pinned
    }

    /// All squares attacked by `color`.
    #[inline(always)]
    pub const fn attacks_by(&self, color: Color) -> Bitboard {
        self.attacks_by_color[color.index()]
    }

    /// The square of the side-to-move's King.
    #[inline(always)]
    pub const fn king_square(&self) -> Square {
        self.king_square
    }

    /// Applies `mv` and refreshes the legality metadata.
    ///
    /// Legality of `mv` itself is not enforced.
    #[inline(always)]
    pub fn make_move(&mut self, mv: Move) -> MoveUndo {
        let undo = self.position.make_move(mv);
        self.recompute_legal_masks();
        undo
    }

    /// Reverses `mv` and refreshes the legality metadata.
    ///
    /// The metadata is a pure function of the position, so recomputing it
    /// preserves the exact-restoration guarantee of
    /// [`Position::unmake_move`].
    #[inline(always)]
    pub fn unmake_move(&mut self, mv: Move, undo: MoveUndo) {
        self.position.unmake_move(mv, undo);
        self.recompute_legal_masks();
    }

    /// Parses and applies a move given in either notation accepted by
    /// [`Move::from_text`].
    #[inline(always)]
    pub fn make_move_text(&mut self, text: &str) -> Result<Move> {
        let mv = Move::from_text(&self.position, text)?;
        self.make_move(mv);
        Ok(mv)
    }

    /// Passes the turn without moving, refreshing the metadata.
    #[inline(always)]
    pub fn toggle_side_to_move(&mut self) {
        self.position.toggle_side_to_move();
        self.recompute_legal_masks();
    }

    /// Classifies the current position per the rules of chess.
    pub fn game_state(&self) -> GameState {
        if self.get_legal_moves().is_empty() {
            if self.is_in_check() {
                GameState::Checkmate
            } else {
                GameState::Stalemate
            }
        } else if self.can_draw_by_fifty() {
            GameState::DrawByFiftyMoves
        } else {
            GameState::Ongoing
        }
    }

    /// Generates all legal moves for the side to move.
    ///
    /// # Example
    /// ```
    /// # use eft::Game;
    /// let game = Game::default();
    /// assert_eq!(game.get_legal_moves().len(), 20);
    /// ```
    #[inline(always)]
    pub fn get_legal_moves(&self) -> MoveList {
        let mut moves = MoveList::default();
        match self.checkers.population() {
            0 => self.generate_all_moves::<false>(&mut moves),
            1 => self.generate_all_moves::<true>(&mut moves),
            // In double check only the King may move.
            _ => self.generate_king_moves::<true>(&mut moves),
        }
        moves
    }

    /// Generates only the legal captures, for quiescence search.
    #[inline(always)]
    pub fn get_legal_captures(&self) -> MoveList {
        let mut moves = self.get_legal_moves();
        moves.retain(|mv| mv.is_capture());
        moves
    }

    /// Recomputes checkers, the check/pin masks, the King square, and both
    /// attack maps from the current position.
    fn recompute_legal_masks(&mut self) {
        let color = self.side_to_move();
        let opponent = color.opponent();
        let occupied = self.occupied();

        self.king_square = self.king(color).to_square_unchecked();

        self.pinned = Bitboard::EMPTY_BOARD;
        // No move may capture the enemy King, so exclude his square.
        self.checkmask = self.enemy_or_empty(color) ^ self.king(opponent);

        // Knights and Pawns check wherever their attacks from the King's
        // square overlap with themselves.
        self.checkers = self.knights(opponent) & knight_attacks(self.king_square)
            | self.pawns(opponent) & pawn_attacks(self.king_square, color);

        // Pretend a Rook/Bishop stands on the King's square: every enemy
        // slider on those unblocked rays either checks or pins something.
        let enemy_sliding_attackers = rook_rays(self.king_square)
            & self.orthogonal_sliders(opponent)
            | bishop_rays(self.king_square) & self.diagonal_sliders(opponent);

        for attacker in enemy_sliding_attackers {
            let blockers = ray_between(self.king_square, attacker) & occupied;

            match blockers.population() {
                // Nothing in between: the slider is a checker.
                0 => self.checkers |= attacker,

                // One friendly piece in between is pinned to the King.
                // (Two or more blockers pin nothing, and an enemy blocker
                // shields the King instead.)
                1 => self.pinned |= blockers & self.color(color),

                _ => {}
            }
        }

        if self.checkers.is_nonempty() {
            // Start with the checkers themselves, since a Knight check has no
            // ray to block.
            self.checkmask = self.checkers;

            // Usually a single checker, so this rarely loops.
            for checker in self.checkers {
                self.checkmask |= ray_between(self.king_square, checker);
            }
        }

        for color in Color::all() {
            self.attacks_by_color[color] = self.board().compute_attacks_by(color);
        }
    }

    /// Generates moves for every piece kind.
    #[inline(always)]
    fn generate_all_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        self.generate_pawn_moves::<IN_CHECK>(moves);
        self.generate_knight_moves::<IN_CHECK>(moves);
        self.generate_bishop_moves::<IN_CHECK>(moves);
        self.generate_rook_moves::<IN_CHECK>(moves);
        self.generate_king_moves::<IN_CHECK>(moves);
    }

    /// Appends a move that is either a quiet or a capture, depending on the
    /// destination square.
    #[inline(always)]
    fn serialize_normal_move(&self, from: Square, to: Square, moves: &mut MoveList) {
        let kind = if self.has(to) {
            MoveKind::Capture
        } else {
            MoveKind::Quiet
        };

        moves.push(Move::new(from, to, kind));
    }

    /// Generates all legal Pawn moves.
    fn generate_pawn_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        let color = self.side_to_move();

        for from in self.pawns(color) {
            let mobility = self.generate_legal_pawn_mobility::<IN_CHECK>(color, from);

            for to in mobility {
                let mut kind = if self.has(to) {
                    MoveKind::Capture
                } else {
                    MoveKind::Quiet
                };

                if to.rank() == Rank::eighth(color) {
                    // Push all four promotions, with the Queen last so it
                    // remains in `kind` for the final push below.
                    if kind == MoveKind::Capture {
                        moves.push(Move::new(from, to, MoveKind::CaptureAndPromoteKnight));
                        moves.push(Move::new(from, to, MoveKind::CaptureAndPromoteBishop));
                        moves.push(Move::new(from, to, MoveKind::CaptureAndPromoteRook));
                        kind = MoveKind::CaptureAndPromoteQueen;
                    } else {
                        moves.push(Move::new(from, to, MoveKind::PromoteKnight));
                        moves.push(Move::new(from, to, MoveKind::PromoteBishop));
                        moves.push(Move::new(from, to, MoveKind::PromoteRook));
                        kind = MoveKind::PromoteQueen;
                    }
                } else if Some(to) == self.ep_square() {
                    kind = MoveKind::EnPassantCapture;
                } else if from.distance_ranks(to) == 2 {
                    kind = MoveKind::PawnDoublePush;
                }

                moves.push(Move::new(from, to, kind));
            }
        }
    }

    /// Generates all legal Knight moves.
    fn generate_knight_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        for from in self.knights(self.side_to_move()) {
            let attacks = knight_attacks(from);
            let mobility = self.generate_legal_normal_piece_mobility::<IN_CHECK>(from, attacks);

            for to in mobility {
                self.serialize_normal_move(from, to, moves);
            }
        }
    }

    /// Generates all legal moves for diagonal sliders (Bishops, Queens).
    fn generate_bishop_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        let blockers = self.occupied();

        for from in self.diagonal_sliders(self.side_to_move()) {
            let attacks = bishop_attacks(from, blockers);
            let mobility = self.generate_legal_normal_piece_mobility::<IN_CHECK>(from, attacks);

            for to in mobility {
                self.serialize_normal_move(from, to, moves);
            }
        }
    }

    /// Generates all legal moves for orthogonal sliders (Rooks, Queens).
    fn generate_rook_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        let blockers = self.occupied();

        for from in self.orthogonal_sliders(self.side_to_move()) {
            let attacks = rook_attacks(from, blockers);
            let mobility = self.generate_legal_normal_piece_mobility::<IN_CHECK>(from, attacks);

            for to in mobility {
                self.serialize_normal_move(from, to, moves);
            }
        }
    }

    /// Generates all legal King moves, castling included.
    fn generate_king_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        let from = self.king_square;
        let color = self.side_to_move();

        for to in self.generate_legal_king_mobility::<IN_CHECK>(color, from) {
            let kind = if from.distance_files(to) == 2 {
                if to.file() > from.file() {
                    MoveKind::ShortCastle
                } else {
                    MoveKind::LongCastle
                }
            } else if self.has(to) {
                MoveKind::Capture
            } else {
                MoveKind::Quiet
            };

            moves.push(Move::new(from, to, kind));
        }
    }

    /// Computes the squares a Pawn on `square` may legally move to.
    fn generate_legal_pawn_mobility<const IN_CHECK: bool>(
        &self,
        color: Color,
        square: Square,
    ) -> Bitboard {
        let blockers = self.occupied();

        // Pinned pawns are restricted to the pin line, which covers all
        // three cases: horizontally pinned pawns cannot move at all,
        // vertically pinned pawns may only push, and diagonally pinned pawns
        // may only capture their pinner.
        let pinmask = if self.pinned.intersects(square) {
            ray_containing(square, self.king_square)
        } else {
            Bitboard::FULL_BOARD
        };

        // En passant legality needs its own discovered-check analysis.
        let ep_bb = self
            .ep_square()
            .map(|ep_square| self.generate_ep_bitboard(color, square, ep_square))
            .unwrap_or_default();

        // The double push requires both squares in front to be empty.
        let all_but_this_pawn = blockers ^ square;
        let double_push_blockers = all_but_this_pawn | all_but_this_pawn.forward_by(color, 1);
        let pushes = pawn_pushes(square, color) & !double_push_blockers & !blockers;

        let enemies = self.color(color.opponent());
        let attacks = pawn_attacks(square, color) & (enemies | ep_bb);

        // An en passant capture of a checking pawn resolves the check even
        // though the destination square lies outside the checkmask.
        (pushes | attacks) & (self.checkmask | ep_bb) & pinmask
    }

    /// Computes the legality of an en passant capture by the Pawn on `square`.
    ///
    /// Removing both pawns from the board can expose the King to a slider on
    /// the shared rank (or on the capturing pawn's diagonal), so the check
    /// test must run on the occupancy *after* the capture. Returns the en
    /// passant square as a one-bit board if the capture is safe, otherwise an
    /// empty board.
    #[inline(always)]
    fn generate_ep_bitboard(&self, color: Color, square: Square, ep_square: Square) -> Bitboard {
        // The pawn must sit diagonally adjacent to the en passant square.
        if square.distance_ranks(ep_square) != 1 || square.distance_files(ep_square) != 1 {
            return Bitboard::EMPTY_BOARD;
        }

        // Occupancy as it would be after performing the capture.
        let ep_bb = ep_square.bitboard();
        let victim_bb = ep_bb.backward_by(color, 1);
        let blockers_after_ep = (self.occupied() ^ victim_bb ^ square) | ep_bb;

        let opponent = color.opponent();
        if (rook_attacks(self.king_square, blockers_after_ep) & self.orthogonal_sliders(opponent))
            .is_nonempty()
        {
            return Bitboard::EMPTY_BOARD;
        }

        if (bishop_attacks(self.king_square, blockers_after_ep) & self.diagonal_sliders(opponent))
            .is_nonempty()
        {
            return Bitboard::EMPTY_BOARD;
        }

        ep_bb
    }

    /// Computes the squares the King on `square` may legally move to.
    fn generate_legal_king_mobility<const IN_CHECK: bool>(
        &self,
        color: Color,
        square: Square,
    ) -> Bitboard {
        let enemy_attacks = self.attacks_by(color.opponent());

        // Castling is unavailable while in check.
        let castling = if IN_CHECK {
            Bitboard::EMPTY_BOARD
        } else {
            let mut castling = Bitboard::EMPTY_BOARD;

            if self.castling().allows_short(color) {
                castling |= self.castle_destination_bitboard(
                    Square::rook_short_start(color),
                    Square::king_short_castle(color),
                    enemy_attacks,
                );
            }

            if self.castling().allows_long(color) {
                castling |= self.castle_destination_bitboard(
                    Square::rook_long_start(color),
                    Square::king_long_castle(color),
                    enemy_attacks,
                );
            }

            castling
        };

        // The King may not step onto an attacked square, nor retreat along
        // the line of a slider that is currently checking him.
        let unsafe_squares = enemy_attacks | self.generate_discoverable_checks_bitboard(color);

        (king_attacks(square) & self.enemy_or_empty(color) & !unsafe_squares) | castling
    }

    /// Computes whether castling towards the Rook on `rook_start` is legal,
    /// returning the King's destination as a one-bit board if it is.
    ///
    /// Every square between King and Rook must be empty, and no square on the
    /// King's path (origin included, which "not in check" has already
    /// covered) may be enemy-attacked.
    #[inline(always)]
    fn castle_destination_bitboard(
        &self,
        rook_start: Square,
        king_destination: Square,
        enemy_attacks: Bitboard,
    ) -> Bitboard {
        let occupied = self.occupied();

        let squares_between = ray_between(self.king_square, rook_start);
        let king_path = ray_between(self.king_square, king_destination) | king_destination;

        let is_clear = (squares_between & occupied).is_empty();
        let is_safe = (king_path & enemy_attacks).is_empty();

        Bitboard::from_square(king_destination) & Bitboard::from_bool(is_clear && is_safe)
    }

    /// Rays through the King and any sliding checker, minus the checker.
    ///
    /// The King cannot escape a slider by retreating along the checking line,
    /// but capturing the checker itself is legal. Pawn and Knight checks
    /// cannot be escaped into, so they contribute nothing here.
    #[inline(always)]
    fn generate_discoverable_checks_bitboard(&self, color: Color) -> Bitboard {
        let mut discoverable = Bitboard::EMPTY_BOARD;

        for checker in self.checkers & self.sliders(color.opponent()) {
            discoverable |= ray_containing(self.king_square, checker) ^ checker;
        }

        discoverable
    }

    /// Computes the squares a non-Pawn, non-King piece on `square` may
    /// legally move to, given its pseudo-legal `attacks`.
    #[inline(always)]
    fn generate_legal_normal_piece_mobility<const IN_CHECK: bool>(
        &self,
        square: Square,
        attacks: Bitboard,
    ) -> Bitboard {
        let mut legal_squares = self.checkmask;

        // Pinned pieces may not leave the ray they are pinned on.
        if self.pinned.intersects(square) {
            legal_squares &= ray_containing(square, self.king_square);
        }

        attacks & legal_squares
    }
}

impl Deref for Game {
    type Target = Position;
    /// A [`Game`] dereferences to its [`Position`] for convenience.
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl FromStr for Game {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self> {
        Self::from_fen(s)
    }
}

impl Default for Game {
    /// The standard starting position.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Position::default())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checkers = self
            .checkers
            .into_iter()
            .map(|sq| sq.to_uci())
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "{}\nFEN: {}\nKey: {}\nCheckers: {checkers}",
            self.board(),
            self.position,
            self.key()
        )
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{self}\nCheckmask:\n{:?}\nPinned:\n{:?}",
            self.checkmask, self.pinned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal_move_strings(game: &Game) -> Vec<String> {
        let mut moves = game
            .get_legal_moves()
            .into_iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>();
        moves.sort();
        moves
    }

    #[test]
    fn test_startpos_has_twenty_moves() {
        let game = Game::default();
        assert_eq!(game.get_legal_moves().len(), 20);
    }

    #[test]
    fn test_double_check_only_king_moves() {
        // Knight on f6 and rook on e1 both give check; only the King moves.
        let game = Game::from_fen("4k3/8/5N2/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        assert!(game.is_in_double_check());

        let moves = game.get_legal_moves();
        assert!(moves.iter().all(|mv| mv.from() == Square::E8));
        assert_eq!(legal_move_strings(&game), vec!["e8d8", "e8f7", "e8f8"]);
    }

    #[test]
    fn test_single_check_capture_block_or_evade() {
        // The rook on e1 checks the King on e8. The knight may block on e5
        // or e7; the King may step off the e-file.
        let game = Game::from_fen("4k3/8/2n5/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        assert!(game.is_in_check());
        assert!(!game.is_in_double_check());

        let moves = legal_move_strings(&game);
        assert_eq!(
            moves,
            vec!["c6e5", "c6e7", "e8d7", "e8d8", "e8f7", "e8f8"]
        );
    }

    #[test]
    fn test_pinned_piece_moves_along_pin_only() {
        // The bishop on d2 is pinned by the rook on d8 and cannot move;
        // the bishop on g5 is free.
        let game = Game::from_fen("3r2k1/8/8/6B1/8/8/3B4/3K4 w - - 0 1").unwrap();
        assert!(game.pinned().intersects(Square::D2));

        let moves = game.get_legal_moves();
        assert!(moves.iter().all(|mv| mv.from() != Square::D2));
    }

    #[test]
    fn test_rook_pinned_on_file_may_slide_on_it() {
        let game = Game::from_fen("3r2k1/8/8/8/8/8/3R4/3K4 w - - 0 1").unwrap();
        assert!(game.pinned().intersects(Square::D2));

        let rook_moves = game
            .get_legal_moves()
            .into_iter()
            .filter(|mv| mv.from() == Square::D2)
            .collect::<Vec<_>>();

        // The pinned rook may slide along the d-file, including capturing
        // the pinner, but never leave it.
        assert!(!rook_moves.is_empty());
        assert!(rook_moves.iter().all(|mv| mv.to().file() == crate::File::D));
        assert!(rook_moves.iter().any(|mv| mv.to() == Square::D8));
    }

    #[test]
    fn test_en_passant_discovered_check_is_illegal() {
        // Capturing en passant would lift both pawns off the fourth rank and
        // expose the Black King to the queen on h4.
        let game = Game::from_fen("8/8/8/8/k2Pp2Q/8/8/3K4 b - d3 0 1").unwrap();
        let moves = legal_move_strings(&game);
        assert!(
            !moves.contains(&String::from("e4d3")),
            "en passant must be rejected here, got {moves:?}"
        );
    }

    #[test]
    fn test_en_passant_out_of_check() {
        // The pawn on d4 just double-pushed and gives check; capturing it en
        // passant resolves the check even though the destination square lies
        // outside the checkmask.
        let game = Game::from_fen("8/8/8/2k5/3Pp3/8/8/4K3 b - d3 0 2").unwrap();
        assert!(game.is_in_check());

        let moves = legal_move_strings(&game);
        assert!(
            moves.contains(&String::from("e4d3")),
            "en passant capture of the checker must be legal, got {moves:?}"
        );
    }

    #[test]
    fn test_castling_through_attack_is_illegal() {
        // The rook on f8 attacks f1, so White may not castle short, but
        // long castling is unaffected.
        let game = Game::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = legal_move_strings(&game);
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_castling_long_b_file_attack_is_legal() {
        // An attack on b1 does not prevent long castling; the King never
        // crosses b1.
        let game = Game::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        let moves = legal_move_strings(&game);
        assert!(moves.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_castling_blocked_by_piece() {
        let game = Game::from_fen("4k3/8/8/8/8/8/8/R2QK2R w KQ - 0 1").unwrap();
        let moves = legal_move_strings(&game);
        assert!(moves.contains(&String::from("e1g1")));
        assert!(!moves.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_checkmate_and_stalemate_detection() {
        let mated = Game::from_fen("k7/1Q6/2K5/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(mated.game_state(), GameState::Checkmate);

        let stalemated = Game::from_fen("k7/8/KQ6/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(stalemated.game_state(), GameState::Stalemate);
        assert!(stalemated.game_state().is_draw());

        let ongoing = Game::default();
        assert_eq!(ongoing.game_state(), GameState::Ongoing);
    }

    #[test]
    fn test_captures_only_generation() {
        let game = Game::from_fen(crate::FEN_KIWIPETE).unwrap();
        let captures = game.get_legal_captures();

        assert!(!captures.is_empty());
        assert!(captures.iter().all(|mv| mv.is_capture()));

        let all_captures = game
            .get_legal_moves()
            .into_iter()
            .filter(|mv| mv.is_capture())
            .count();
        assert_eq!(captures.len(), all_captures);
    }

    #[test]
    fn test_promotion_discovered_double_check_is_detected() {
        // The capture-promotion on a8 checks along the eighth rank with the
        // new queen while vacating b7 unmasks the bishop on a6. The full
        // rescan must see both checkers, leaving Black only King moves.
        let mut game = Game::from_fen("r1k5/1P6/B7/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = Move::from_text(game.position(), "b7a8q").unwrap();
        game.make_move(mv);

        assert!(game.is_in_double_check());
        let moves = game.get_legal_moves();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|mv| mv.from() == game.king_square()));
    }

    #[test]
    fn test_round_trip_every_legal_move_through_notation() {
        for fen in [
            crate::FEN_STARTPOS,
            crate::FEN_KIWIPETE,
            "r3k2r/pP4pp/8/3pP3/8/8/PPP3PP/R3K2R w KQkq d6 0 2",
        ] {
            let game = Game::from_fen(fen).unwrap();
            for mv in game.get_legal_moves() {
                let reparsed = Move::from_text(game.position(), &mv.to_string()).unwrap();
                assert_eq!(
                    reparsed, mv,
                    "{mv} did not survive a notation round trip on {fen}"
                );
            }
        }
    }
}
